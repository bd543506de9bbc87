//! Driver errors
use std::fmt;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
}

impl std::error::Error for AppError {}

#[derive(Debug)]
pub enum ErrorKind {
    Jack(jack::JackError),
    Io(std::io::Error),
    Utf8(std::string::FromUtf8Error),
    Conf(serde_yaml::Error),
    /// Path is neither a `.jack` file nor a directory.
    NotJack(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jack(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "source is not valid UTF-8: {err}"),
            Self::Conf(err) => write!(f, "invalid configuration: {err}"),
            Self::NotJack(path) => write!(f, "not a .jack file or directory: {path}"),
        }
    }
}

impl From<jack::JackError> for AppError {
    fn from(err: jack::JackError) -> Self {
        Self {
            kind: ErrorKind::Jack(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<std::string::FromUtf8Error> for AppError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self {
            kind: ErrorKind::Utf8(err),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self {
            kind: ErrorKind::Conf(err),
        }
    }
}

//! Entrypoint for CLI
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use log::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

mod conf;
mod error;

use self::{
    conf::BuildConf,
    error::{AppError, AppResult, ErrorKind},
};

static USAGE: &str = r#"
usage: jackc CMD PATH [CONF]

commands:
    build   Compile a .jack file, or every .jack file under a directory
    tokens  Print the token listing of a .jack file

examples:
    jackc build Pong/
    jackc build Pong/ build.yaml
    jackc tokens Pong/Main.jack
"#;

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
        eprintln!("failed to initialise logger: {err}");
    }

    let result = match parse_args(env::args().skip(1)) {
        Some(Cmd::Build { path, conf }) => run_build(&path, conf.as_deref()),
        Some(Cmd::Tokens { filepath }) => run_tokens(&filepath),
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    };

    if let Err(err) = result {
        error!("{err}");
        std::process::exit(1)
    }
}

fn run_build(path: &str, conf_path: Option<&str>) -> AppResult<()> {
    let conf = match conf_path {
        Some(conf_path) => BuildConf::from_file(conf_path)?,
        None => BuildConf::default(),
    };

    let sources = discover_sources(Path::new(path))?;
    if sources.is_empty() {
        warn!("no .jack files found in {path}");
    }

    let mut failed = 0;
    for source in &sources {
        // A failing unit does not stop the others.
        match compile_file(source, &conf) {
            Ok(outpath) => info!("{} -> {}", source.display(), outpath.display()),
            Err(err) => {
                error!("{}: {err}", source.display());
                failed += 1;
                if conf.fail_fast {
                    break;
                }
            }
        }
    }

    info!("compiled {} of {} files", sources.len() - failed, sources.len());
    if failed > 0 {
        std::process::exit(1)
    }

    Ok(())
}

/// Compile one unit and write its output next to the source.
///
/// Returns the path of the written file. Nothing is written when
/// compilation fails.
fn compile_file(source: &Path, conf: &BuildConf) -> AppResult<PathBuf> {
    let source_code = read_source(source)?;

    if conf.dump_tokens {
        let stem = source.file_stem().unwrap_or_default().to_string_lossy();
        let dumppath = source.with_file_name(format!("{stem}Tokens.txt"));
        fs::write(&dumppath, jack::dump_tokens(&source_code))?;
    }

    let output = jack::compile_str(&source_code)?;

    let outpath = source.with_extension(&conf.extension);
    fs::write(&outpath, output)?;

    Ok(outpath)
}

fn run_tokens(filepath: &str) -> AppResult<()> {
    let source_code = read_source(Path::new(filepath))?;
    print!("{}", jack::dump_tokens(&source_code));
    Ok(())
}

fn read_source(filepath: &Path) -> AppResult<String> {
    let file_bytes = fs::read(filepath)?;
    let source_code = String::from_utf8(file_bytes)?;
    Ok(source_code)
}

/// Collect `.jack` files in file name order.
///
/// A directory is searched recursively without following symbolic
/// links. A file path is accepted as long as it carries the `.jack`
/// extension.
fn discover_sources(path: &Path) -> AppResult<Vec<PathBuf>> {
    if !path.is_dir() && !(path.is_file() && has_jack_extension(path)) {
        return Err(AppError {
            kind: ErrorKind::NotJack(path.display().to_string()),
        });
    }

    let sources = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_jack_extension(entry.path()))
        .map(DirEntry::into_path)
        .collect();

    Ok(sources)
}

#[inline]
fn has_jack_extension(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "jack")
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Cmd> {
    match args.next()?.as_str() {
        "build" => Some(Cmd::Build {
            path: args.next()?,
            conf: args.next(),
        }),
        "tokens" => Some(Cmd::Tokens {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("jackc v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Compile a file or directory tree
    Build { path: String, conf: Option<String> },
    /// Dump tokens
    Tokens { filepath: String },
}

//! Build configuration
use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::AppResult;

/// Options for a build, loaded from an optional YAML file.
///
/// ```yaml
/// extension: vm
/// dump_tokens: true
/// fail_fast: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConf {
    /// Extension of the generated files, without the dot.
    pub extension: String,
    /// Also write the token listing of each unit to `<Name>Tokens.txt`.
    pub dump_tokens: bool,
    /// Stop at the first unit that fails to compile.
    pub fail_fast: bool,
}

impl Default for BuildConf {
    fn default() -> Self {
        Self {
            extension: "vm".to_owned(),
            dump_tokens: false,
            fail_fast: false,
        }
    }
}

impl BuildConf {
    pub fn from_file(filepath: impl AsRef<Path>) -> AppResult<Self> {
        let file = fs::File::open(filepath)?;
        let conf: BuildConf = serde_yaml::from_reader(file)?;
        log::debug!("loaded build configuration: {:#?}", conf);
        Ok(conf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_conf_uses_defaults() {
        let conf: BuildConf = serde_yaml::from_str("dump_tokens: true\n").unwrap();
        assert_eq!(
            conf,
            BuildConf {
                extension: "vm".to_owned(),
                dump_tokens: true,
                fail_fast: false,
            }
        );
    }

    #[test]
    fn test_full_conf() {
        let conf: BuildConf = serde_yaml::from_str("extension: out\ndump_tokens: false\nfail_fast: true\n").unwrap();
        assert_eq!(conf.extension, "out");
        assert!(conf.fail_fast);
    }

    #[test]
    fn test_bad_conf() {
        assert!(serde_yaml::from_str::<BuildConf>("fail_fast: sometimes\n").is_err());
    }
}

//! Session configuration, read from an optional TOML file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "berlin-ems.toml";
pub const DEFAULT_TOP_N: usize = 15;

/// What the loader does with a cell it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParsePolicy {
    /// Keep the row, null the field, count it in the load report.
    #[default]
    NullField,
    /// Abort the whole load with a parse error.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub missions_path: PathBuf,
    pub regional_path: PathBuf,
    pub parse_policy: ParsePolicy,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            missions_path: PathBuf::from("Berlin_Missions_2020_2025.csv"),
            regional_path: PathBuf::from("Berlin_Regional_2020_2025.csv"),
            parse_policy: ParsePolicy::NullField,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        Self::from_toml(path, &text)
    }

    fn from_toml(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the explicit config file if one was given, otherwise the
    /// default file when present, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    log::debug!("Using config file {}", default.display());
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_toml(
            Path::new("test.toml"),
            "missions_path = \"m.csv\"\nparse_policy = \"reject\"\n",
        )
        .unwrap();
        assert_eq!(cfg.missions_path, PathBuf::from("m.csv"));
        assert_eq!(cfg.parse_policy, ParsePolicy::Reject);
        assert_eq!(cfg.top_n, DEFAULT_TOP_N);
        assert_eq!(cfg.regional_path, Config::default().regional_path);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml(Path::new("test.toml"), "colour = \"blue\"\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn missing_explicit_file_is_not_found() {
        let err = Config::resolve(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}

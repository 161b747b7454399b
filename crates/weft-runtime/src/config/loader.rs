//! Configuration loader using figment.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults ([`WeftConfig::default`]).
//! 2. Config file: an explicit path, or `weft.toml` searched in the
//!    current directory and then the user config directory
//!    (`<config dir>/weft/`). With the `yaml-config` feature, `weft.yaml`
//!    is searched alongside.
//! 3. Environment variables, `WEFT_` prefix with `__` as the section
//!    separator: `WEFT_COMMAND__PREFIX=/` → `command.prefix = "/"`.
//!
//! Missing files are simply skipped; a file that exists but fails to parse
//! is a [`ConfigError`].

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;

use super::schema::WeftConfig;
use crate::error::{ConfigError, ConfigResult};

/// File name stem searched in each config directory.
const CONFIG_STEM: &str = "weft";

/// Layered configuration loader.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// A loader with the default search path and env overrides enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads from a specific file instead of searching.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Disables the `WEFT_*` environment layer.
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Resolves the layered configuration.
    pub fn load(self) -> ConfigResult<WeftConfig> {
        let mut figment = Figment::from(Serialized::defaults(WeftConfig::default()));

        match &self.file {
            Some(path) => {
                figment = merge_file(figment, path.clone());
            }
            None => {
                for dir in search_dirs() {
                    figment = figment.merge(Toml::file(dir.join(format!("{CONFIG_STEM}.toml"))));
                    #[cfg(feature = "yaml-config")]
                    {
                        figment =
                            figment.merge(Yaml::file(dir.join(format!("{CONFIG_STEM}.yaml"))));
                    }
                }
            }
        }

        if !self.skip_env {
            figment = figment.merge(Env::prefixed("WEFT_").split("__"));
        }

        figment.extract().map_err(ConfigError::from)
    }
}

fn merge_file(figment: Figment, path: PathBuf) -> Figment {
    #[cfg(feature = "yaml-config")]
    if matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    ) {
        return figment.merge(Yaml::file(path));
    }
    figment.merge(Toml::file(path))
}

/// Directories searched for a config file, nearest first.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join(CONFIG_STEM));
    }
    dirs
}

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

pub use config::{BootSection, Config, ManifestSection, PackSection};

mod config;

pub const CONFIG_ENV: &str = "THAW_CONFIG";
pub const CONFIG_FILE: &str = "thaw.toml";

#[derive(Debug, Clone)]
pub struct ThawEnv {
    config_path: PathBuf,
    explicit: bool,
}

impl ThawEnv {
    /// Resolve the config file: `--config`, then `$THAW_CONFIG`, then
    /// `./thaw.toml`.
    pub fn new(config: Option<PathBuf>) -> Result<Self> {
        let pwd = env::current_dir().context("Failed to get current directory")?;
        let (config_path, explicit) = match config {
            Some(path) => (path, true),
            None => match env::var_os(CONFIG_ENV) {
                Some(path) => (PathBuf::from(path), true),
                None => (pwd.join(CONFIG_FILE), false),
            },
        };

        Ok(Self {
            config_path,
            explicit,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config file. A missing default file yields defaults; a
    /// missing file that was asked for explicitly is an error.
    pub fn config(&self) -> Result<Config> {
        if !self.explicit && !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Config::load(&self.config_path)
    }
}

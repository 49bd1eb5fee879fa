//! Config module - optional TOML file with the same settings as the flags.
//!
//! Flags always win over the file. Default location is
//! `~/.config/mrpassword2keepass/config.toml`, read only if it exists.

use crate::error::MigrateError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// `[mrpassword]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the MrPassword instance
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `[keepass]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeePassConfig {
    /// Destination database file
    pub path: Option<PathBuf>,
    pub password: Option<String>,
    pub keyfile: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mrpassword: SourceConfig,
    #[serde(default)]
    pub keepass: KeePassConfig,
}

/// Default config directory (~/.config/mrpassword2keepass/)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("mrpassword2keepass"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the default config file, or an empty config if there is none.
    pub fn load_default() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Layer `overrides` on top of `self`; set values in `overrides` win.
    pub fn merge(self, overrides: Config) -> Config {
        Config {
            mrpassword: SourceConfig {
                url: overrides.mrpassword.url.or(self.mrpassword.url),
                username: overrides.mrpassword.username.or(self.mrpassword.username),
                password: overrides.mrpassword.password.or(self.mrpassword.password),
            },
            keepass: KeePassConfig {
                path: overrides.keepass.path.or(self.keepass.path),
                password: overrides.keepass.password.or(self.keepass.password),
                keyfile: overrides.keepass.keyfile.or(self.keepass.keyfile),
            },
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub username: String,
    /// `None` means ask on the terminal
    pub password: Option<String>,
    pub keepass_path: PathBuf,
    pub keepass_password: Option<String>,
    pub keepass_keyfile: Option<PathBuf>,
}

impl TryFrom<Config> for Settings {
    type Error = MigrateError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        let Config {
            mrpassword,
            keepass,
        } = config;

        Ok(Settings {
            url: mrpassword
                .url
                .ok_or(MigrateError::MissingSetting("mrpassword-url"))?,
            username: mrpassword
                .username
                .ok_or(MigrateError::MissingSetting("mrpassword-username"))?,
            password: mrpassword.password,
            keepass_path: keepass
                .path
                .ok_or(MigrateError::MissingSetting("keepass-path"))?,
            keepass_password: keepass.password,
            keepass_keyfile: keepass.keyfile,
        })
    }
}

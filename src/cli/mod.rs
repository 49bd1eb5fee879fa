//! CLI definitions for mrpassword2keepass.

pub mod commands;

use clap::Parser;
use mrpassword2keepass::config::{Config, KeePassConfig, SourceConfig};
use std::path::PathBuf;

/// Copy every personal and global password from MrPassword into KeePass
#[derive(Parser)]
#[command(name = "mrpassword2keepass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the MrPassword instance
    #[arg(long)]
    pub mrpassword_url: Option<String>,

    /// MrPassword login name
    #[arg(long)]
    pub mrpassword_username: Option<String>,

    /// MrPassword password (asked on the terminal if not given anywhere)
    #[arg(long)]
    pub mrpassword_password: Option<String>,

    /// KeePass database file to add entries to
    #[arg(long)]
    pub keepass_path: Option<PathBuf>,

    /// KeePass database password
    #[arg(long)]
    pub keepass_password: Option<String>,

    /// KeePass key file
    #[arg(long)]
    pub keepass_keyfile: Option<PathBuf>,

    /// TOML file providing any of the settings above
    /// (default: ~/.config/mrpassword2keepass/config.toml, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Create the KeePass database if it does not exist
    #[arg(long)]
    pub create: bool,

    /// Scrape everything but do not save the KeePass database
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Settings given as flags, in config-file shape.
    pub fn overrides(&self) -> Config {
        Config {
            mrpassword: SourceConfig {
                url: self.mrpassword_url.clone(),
                username: self.mrpassword_username.clone(),
                password: self.mrpassword_password.clone(),
            },
            keepass: KeePassConfig {
                path: self.keepass_path.clone(),
                password: self.keepass_password.clone(),
                keyfile: self.keepass_keyfile.clone(),
            },
        }
    }
}

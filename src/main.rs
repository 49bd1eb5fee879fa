//! mrpassword2keepass - one-shot migration from MrPassword to KeePass.
//!
//! Logs into a MrPassword instance, scrapes every personal and global
//! password and appends them to a KeePass database.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::filter::{Directive, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let directive: Directive = format!("mrpassword2keepass={}", log_level).parse()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_target(false)
        .init();

    cli::commands::migrate(&cli)
}

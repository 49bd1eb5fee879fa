//! The migrate command: resolve settings, log in, open KeePass, run.

use super::Cli;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use mrpassword2keepass::config::{Config, Settings};
use mrpassword2keepass::migrate::{self, MigrateOptions, MigrationSummary};
use mrpassword2keepass::sink::KeePassSink;
use mrpassword2keepass::source::MrPasswordClient;
use std::io::{self, Write};
use tracing::info;

/// Prompt for a password (input not echoed)
fn prompt_password(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let password = rpassword::read_password().context("Cannot read password")?;

    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    Ok(password)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let file = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    Ok(Settings::try_from(file.merge(cli.overrides()))?)
}

fn open_sink(settings: &Settings, create: bool) -> Result<KeePassSink> {
    let path = settings.keepass_path.as_path();
    let password = settings.keepass_password.as_deref();
    let keyfile = settings.keepass_keyfile.as_deref();

    if create && !path.exists() {
        info!("{} does not exist, creating it", path.display());
        KeePassSink::create(path, password, keyfile)
    } else {
        KeePassSink::open(path, password, keyfile)
    }
}

/// Run the whole migration.
pub fn migrate(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;

    // Unlock KeePass first so bad credentials fail before any scraping
    let mut sink = open_sink(&settings, cli.create)?;

    let password = match &settings.password {
        Some(password) => password.clone(),
        None => prompt_password("MrPassword password: ")?,
    };

    info!("Logging in to {}", settings.url);
    let client = MrPasswordClient::authenticate(&settings.url, &settings.username, &password)?;

    let options = MigrateOptions {
        dry_run: cli.dry_run,
        progress: true,
    };
    let summary = migrate::run(&client, &mut sink, &options)?;

    print_summary(&summary, &sink);
    Ok(())
}

fn print_summary(summary: &MigrationSummary, sink: &KeePassSink) {
    println!(
        "{} {} personal + {} global password(s) listed, {} skipped",
        "✓".green(),
        summary.personal_ids,
        summary.global_ids,
        summary.skipped
    );

    if summary.saved {
        println!(
            "{} Added {} entries to {}",
            "✓".green(),
            summary.added.to_string().bold(),
            sink.path().display()
        );
    } else {
        println!(
            "{} Dry run: {} entries not saved to {}",
            "!".yellow(),
            summary.added.to_string().bold(),
            sink.path().display()
        );
    }
}

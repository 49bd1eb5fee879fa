//! Migration pipeline: source records -> KeePass entries.
//!
//! Order is fixed: list personal then global IDs, fetch each record in
//! that order, then write everything and save once.

use crate::entry::PasswordEntry;
use crate::sink::KeePassSink;
use crate::source::{RecordSource, Scope};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

/// Options for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Scrape and fill the database in memory, but do not save
    pub dry_run: bool,
    /// Show a progress bar while fetching (hidden when not a terminal)
    pub progress: bool,
}

/// What a migration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub personal_ids: usize,
    pub global_ids: usize,
    /// Records fetched and parsed
    pub fetched: usize,
    /// Records skipped as not accessible
    pub skipped: usize,
    /// Entries appended to the database
    pub added: usize,
    /// Whether the database file was written
    pub saved: bool,
}

/// A fetched record with where it came from.
#[derive(Debug, Clone)]
pub struct ScrapedRecord {
    pub id: u32,
    pub scope: Scope,
    pub entry: PasswordEntry,
}

/// Run the whole pipeline against an authenticated source and an open sink.
pub fn run<S: RecordSource>(
    source: &S,
    sink: &mut KeePassSink,
    options: &MigrateOptions,
) -> Result<MigrationSummary> {
    let mut summary = MigrationSummary::default();

    let personal = source
        .list_ids(Scope::Personal)
        .context("Cannot list personal passwords")?;
    let global = source
        .list_ids(Scope::Global)
        .context("Cannot list global passwords")?;
    summary.personal_ids = personal.len();
    summary.global_ids = global.len();
    info!(
        "Found {} personal and {} global password(s)",
        personal.len(),
        global.len()
    );

    let queue: Vec<(u32, Scope)> = personal
        .into_iter()
        .map(|id| (id, Scope::Personal))
        .chain(global.into_iter().map(|id| (id, Scope::Global)))
        .collect();

    let records = fetch_all(source, &queue, options.progress)?;
    summary.fetched = records.len();
    summary.skipped = queue.len() - records.len();

    for record in &records {
        write_record(sink, record)?;
        summary.added += 1;
    }
    info!("Added {} entries to {}", summary.added, sink.path().display());

    if options.dry_run {
        info!("Dry run, database not saved");
    } else {
        sink.save()?;
        summary.saved = true;
    }

    Ok(summary)
}

/// Fetch every queued record, in order. Inaccessible records are dropped.
pub fn fetch_all<S: RecordSource>(
    source: &S,
    queue: &[(u32, Scope)],
    progress: bool,
) -> Result<Vec<ScrapedRecord>> {
    let bar = if progress {
        let bar = ProgressBar::new(queue.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut records = Vec::with_capacity(queue.len());
    for &(id, scope) in queue {
        bar.set_message(format!("{} #{}", scope, id));
        let fetched = source
            .fetch_record(id, scope)
            .with_context(|| format!("Cannot fetch {} password {}", scope, id))?;
        bar.inc(1);

        let Some(entry) = fetched else {
            continue;
        };
        if entry.name.is_none() {
            warn!("{} password {} has no name, adding it untitled", scope, id);
        }
        debug!("Fetched {} password {}", scope, id);
        records.push(ScrapedRecord { id, scope, entry });
    }
    bar.finish_and_clear();

    Ok(records)
}

fn write_record(sink: &mut KeePassSink, record: &ScrapedRecord) -> Result<()> {
    let entry = &record.entry;
    let group = sink.resolve_group(entry.group_name());
    sink.add_entry(
        &group,
        entry.title(),
        &entry.username,
        &entry.password,
        &entry.url,
        &entry.description,
    )
    .with_context(|| format!("Cannot add {} password {}", record.scope, record.id))
}

//! End-to-end pipeline tests with a fake source and real KDBX files.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Result};
use keepass::db::{Group, Node};
use mrpassword2keepass::migrate::{self, MigrateOptions};
use mrpassword2keepass::{KeePassSink, PasswordEntry, RecordSource, Scope};
use tempfile::TempDir;

const DB_PASSWORD: &str = "kdbx-test-password";

/// In-memory stand-in for a MrPassword instance.
#[derive(Default)]
struct FakeSource {
    ids: HashMap<Scope, Vec<u32>>,
    records: HashMap<(Scope, u32), PasswordEntry>,
    /// Fail when this record is fetched
    broken: Option<(Scope, u32)>,
}

impl FakeSource {
    fn with(mut self, scope: Scope, id: u32, entry: Option<PasswordEntry>) -> Self {
        self.ids.entry(scope).or_default().push(id);
        if let Some(entry) = entry {
            self.records.insert((scope, id), entry);
        }
        self
    }
}

impl RecordSource for FakeSource {
    fn list_ids(&self, scope: Scope) -> Result<Vec<u32>> {
        Ok(self.ids.get(&scope).cloned().unwrap_or_default())
    }

    fn fetch_record(&self, id: u32, scope: Scope) -> Result<Option<PasswordEntry>> {
        if self.broken == Some((scope, id)) {
            bail!("connection reset");
        }
        Ok(self.records.get(&(scope, id)).cloned())
    }
}

fn entry(name: &str, category: &str) -> PasswordEntry {
    PasswordEntry {
        name: Some(name.to_string()),
        category: category.to_string(),
        username: format!("{}-user", name),
        password: format!("{}-pass", name),
        url: format!("https://{}.example.com", name),
        description: String::new(),
    }
}

fn sample_source() -> FakeSource {
    FakeSource::default()
        .with(Scope::Personal, 1, Some(entry("mail", "Mail")))
        .with(Scope::Personal, 2, Some(entry("router", "")))
        .with(Scope::Global, 10, Some(entry("vpn", "Network")))
        // Listed but not accessible
        .with(Scope::Global, 11, None)
        .with(Scope::Global, 12, Some(entry("smtp", "Mail")))
}

fn new_database(path: &Path) -> Result<()> {
    KeePassSink::create(path, Some(DB_PASSWORD), None)?.save()
}

fn options() -> MigrateOptions {
    MigrateOptions {
        dry_run: false,
        progress: false,
    }
}

fn titles(group: &Group) -> Vec<String> {
    group
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Entry(e) => Some(e.get_title().unwrap_or_default().to_string()),
            Node::Group(_) => None,
        })
        .collect()
}

fn child_group<'a>(group: &'a Group, name: &str) -> Vec<&'a Group> {
    group
        .children
        .iter()
        .filter_map(|child| match child {
            Node::Group(g) if g.name == name => Some(g),
            _ => None,
        })
        .collect()
}

#[test]
fn test_migrate_into_groups() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("passwords.kdbx");
    new_database(&db_path)?;

    let mut sink = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
    let summary = migrate::run(&sample_source(), &mut sink, &options())?;

    assert_eq!(summary.personal_ids, 2);
    assert_eq!(summary.global_ids, 3);
    assert_eq!(summary.fetched, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.added, 4);
    assert!(summary.saved);

    let reopened = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
    let root = &reopened.database().root;
    assert_eq!(reopened.entry_count(), 4);

    // Uncategorised record lands in root
    assert_eq!(titles(root), vec!["router"]);

    // Personal records first, then global, same group reused
    let mail = child_group(root, "Mail");
    assert_eq!(mail.len(), 1);
    assert_eq!(titles(mail[0]), vec!["mail", "smtp"]);

    let network = child_group(root, "Network");
    assert_eq!(network.len(), 1);
    assert_eq!(titles(network[0]), vec!["vpn"]);

    Ok(())
}

#[test]
fn test_second_run_duplicates_entries() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("passwords.kdbx");
    new_database(&db_path)?;

    for _ in 0..2 {
        let mut sink = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
        migrate::run(&sample_source(), &mut sink, &options())?;
    }

    let reopened = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
    assert_eq!(reopened.entry_count(), 8);

    // Groups are found again, not recreated
    let root = &reopened.database().root;
    assert_eq!(child_group(root, "Mail").len(), 1);
    assert_eq!(titles(child_group(root, "Mail")[0]).len(), 4);

    Ok(())
}

#[test]
fn test_dry_run_leaves_file_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("passwords.kdbx");
    new_database(&db_path)?;
    let before = std::fs::read(&db_path)?;

    let mut sink = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
    let summary = migrate::run(
        &sample_source(),
        &mut sink,
        &MigrateOptions {
            dry_run: true,
            progress: false,
        },
    )?;

    assert_eq!(summary.added, 4);
    assert!(!summary.saved);
    assert_eq!(std::fs::read(&db_path)?, before);

    Ok(())
}

#[test]
fn test_fetch_failure_aborts_without_saving() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("passwords.kdbx");
    new_database(&db_path)?;
    let before = std::fs::read(&db_path)?;

    let mut source = sample_source();
    source.broken = Some((Scope::Global, 12));

    let mut sink = KeePassSink::open(&db_path, Some(DB_PASSWORD), None)?;
    let err = migrate::run(&source, &mut sink, &options()).unwrap_err();
    assert!(format!("{:#}", err).contains("connection reset"));

    assert_eq!(sink.entry_count(), 0);
    assert_eq!(std::fs::read(&db_path)?, before);

    Ok(())
}

#[test]
fn test_wrong_password_fails_to_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("passwords.kdbx");
    new_database(&db_path)?;

    assert!(KeePassSink::open(&db_path, Some("not-the-password"), None).is_err());
    Ok(())
}

#[test]
fn test_keyfile_only_database() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("keyfile.kdbx");
    let key_path = temp_dir.path().join("db.key");
    std::fs::write(&key_path, b"0123456789abcdef0123456789abcdef-some-random-keyfile")?;

    KeePassSink::create(&db_path, None, Some(&key_path))?.save()?;

    let mut sink = KeePassSink::open(&db_path, None, Some(&key_path))?;
    let source = FakeSource::default().with(Scope::Personal, 3, Some(entry("nas", "")));
    migrate::run(&source, &mut sink, &options())?;

    let reopened = KeePassSink::open(&db_path, None, Some(&key_path))?;
    assert_eq!(reopened.entry_count(), 1);
    Ok(())
}

//! Sink module - write entries into a KeePass (KDBX4) database.
//!
//! The file format and its encryption belong to the `keepass` crate. This
//! module only opens the file, places entries into groups and saves.

use crate::error::MigrateError;
use anyhow::{Context, Result};
use keepass::config::DatabaseConfig;
use keepass::db::{Entry, Group, Node, Value};
use keepass::{Database, DatabaseKey};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of a group as child indices from the root group.
/// An empty path is the root group itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupPath(Vec<usize>);

impl GroupPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

/// Credentials unlocking a KeePass database.
#[derive(Clone)]
struct Credentials {
    password: Option<String>,
    keyfile: Option<Vec<u8>>,
}

impl Credentials {
    fn load(password: Option<&str>, keyfile: Option<&Path>) -> Result<Self> {
        if password.is_none() && keyfile.is_none() {
            return Err(MigrateError::MissingCredentials.into());
        }

        let keyfile = keyfile
            .map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("Cannot read keyfile: {}", path.display()))
            })
            .transpose()?;

        Ok(Self {
            password: password.map(str::to_string),
            keyfile,
        })
    }

    /// Build a fresh composite key; `keepass` consumes it on every use.
    fn database_key(&self) -> Result<DatabaseKey> {
        let mut key = DatabaseKey::new();
        if let Some(password) = &self.password {
            key = key.with_password(password);
        }
        if let Some(keyfile) = &self.keyfile {
            key = key
                .with_keyfile(&mut keyfile.as_slice())
                .context("Cannot use keyfile")?;
        }
        Ok(key)
    }
}

/// An unlocked KeePass database bound to its file.
pub struct KeePassSink {
    path: PathBuf,
    credentials: Credentials,
    db: Database,
}

impl KeePassSink {
    /// Open and unlock an existing database.
    ///
    /// Fails on wrong credentials or a malformed file.
    pub fn open(path: &Path, password: Option<&str>, keyfile: Option<&Path>) -> Result<Self> {
        let credentials = Credentials::load(password, keyfile)?;

        let mut file = File::open(path)
            .with_context(|| format!("Cannot open KeePass database: {}", path.display()))?;
        let db = Database::open(&mut file, credentials.database_key()?)
            .with_context(|| format!("Cannot unlock KeePass database: {}", path.display()))?;

        debug!("Opened KeePass database {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            credentials,
            db,
        })
    }

    /// Start a new, empty database at `path`. Nothing is written until `save`.
    pub fn create(path: &Path, password: Option<&str>, keyfile: Option<&Path>) -> Result<Self> {
        let credentials = Credentials::load(password, keyfile)?;
        let db = Database::new(DatabaseConfig::default());

        debug!("Created empty KeePass database for {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            credentials,
            db,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Find the group for a category, creating it under root if missing.
    ///
    /// `None` or an empty name is the root group. Lookup is an exact name
    /// match over the whole tree, depth first; the first match wins.
    pub fn resolve_group(&mut self, category: Option<&str>) -> GroupPath {
        let name = match category {
            Some(name) if !name.is_empty() => name,
            _ => return GroupPath::root(),
        };

        if let Some(path) = find_group(&self.db.root, name) {
            return path;
        }

        debug!("Creating group {:?}", name);
        self.db.root.children.push(Node::Group(Group::new(name)));
        GroupPath(vec![self.db.root.children.len() - 1])
    }

    /// Append an entry to a group. Existing entries are never checked.
    pub fn add_entry(
        &mut self,
        group: &GroupPath,
        name: &str,
        username: &str,
        password: &str,
        url: &str,
        notes: &str,
    ) -> Result<()> {
        let target = group_mut(&mut self.db.root, group)
            .with_context(|| format!("Group {:?} no longer exists", group))?;

        let mut entry = Entry::new();
        entry
            .fields
            .insert("Title".to_string(), Value::Unprotected(name.to_string()));
        entry.fields.insert(
            "UserName".to_string(),
            Value::Unprotected(username.to_string()),
        );
        entry.fields.insert(
            "Password".to_string(),
            Value::Protected(password.as_bytes().to_vec().into()),
        );
        entry
            .fields
            .insert("URL".to_string(), Value::Unprotected(url.to_string()));
        entry
            .fields
            .insert("Notes".to_string(), Value::Unprotected(notes.to_string()));

        target.children.push(Node::Entry(entry));
        Ok(())
    }

    /// Write the database back to its file.
    ///
    /// The new content goes to `<path>.tmp` first and is renamed over the
    /// original, so the old file survives an interrupted save. The tmp file
    /// is removed again when any step fails.
    pub fn save(&self) -> Result<()> {
        let tmp_path = tmp_path(&self.path);

        if let Err(e) = self.write_and_replace(&tmp_path) {
            if tmp_path.exists() {
                if let Err(remove_err) = std::fs::remove_file(&tmp_path) {
                    debug!("Cannot remove {}: {}", tmp_path.display(), remove_err);
                }
            }
            return Err(e);
        }

        debug!("Saved KeePass database {}", self.path.display());
        Ok(())
    }

    fn write_and_replace(&self, tmp_path: &Path) -> Result<()> {
        {
            let mut file = File::create(tmp_path)
                .with_context(|| format!("Cannot create {}", tmp_path.display()))?;
            self.db
                .save(&mut file, self.credentials.database_key()?)
                .with_context(|| format!("Cannot write KeePass database {}", tmp_path.display()))?;
            file.sync_all()
                .with_context(|| format!("Cannot flush {}", tmp_path.display()))?;
        }

        std::fs::rename(tmp_path, &self.path).with_context(|| {
            format!(
                "Cannot move {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }

    /// Number of entries in the whole tree.
    pub fn entry_count(&self) -> usize {
        count_entries(&self.db.root)
    }

    /// Read access to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn find_group(group: &Group, name: &str) -> Option<GroupPath> {
    for (idx, child) in group.children.iter().enumerate() {
        if let Node::Group(child) = child {
            if child.name == name {
                return Some(GroupPath(vec![idx]));
            }
            if let Some(GroupPath(mut rest)) = find_group(child, name) {
                rest.insert(0, idx);
                return Some(GroupPath(rest));
            }
        }
    }
    None
}

fn group_mut<'a>(root: &'a mut Group, path: &GroupPath) -> Option<&'a mut Group> {
    let mut current = root;
    for &idx in &path.0 {
        current = match current.children.get_mut(idx)? {
            Node::Group(group) => group,
            Node::Entry(_) => return None,
        };
    }
    Some(current)
}

fn count_entries(group: &Group) -> usize {
    group
        .children
        .iter()
        .map(|child| match child {
            Node::Entry(_) => 1,
            Node::Group(group) => count_entries(group),
        })
        .sum()
}

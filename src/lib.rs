//! mrpassword2keepass library
//!
//! Pipeline: MrPassword (scrape HTML) -> PasswordEntry -> KeePass (KDBX4).
//! - `source`: login, list record IDs, fetch and parse records
//! - `sink`: open the database, resolve groups, add entries, save
//! - `migrate`: run both in the fixed personal-then-global order

pub mod config;
pub mod entry;
pub mod error;
pub mod migrate;
pub mod sink;
pub mod source;

// Re-export main types
pub use config::{Config, Settings};
pub use entry::PasswordEntry;
pub use error::MigrateError;
pub use migrate::{MigrateOptions, MigrationSummary};
pub use sink::{GroupPath, KeePassSink};
pub use source::{MrPasswordClient, RecordSource, Scope};

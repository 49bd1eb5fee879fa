//! Source module - read password records out of a MrPassword instance.
//!
//! MrPassword has no API, so records are scraped from its HTML:
//! - `session`: recover the login cookie from the raw response header
//! - `html`: pull record IDs and record fields out of pages
//! - `client`: authenticated HTTP access tying both together

pub mod client;
pub mod html;
pub mod session;

use crate::entry::PasswordEntry;
use anyhow::Result;
use std::fmt;

pub use client::MrPasswordClient;

/// Namespace a record lives in on MrPassword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Records owned by the logged-in user
    #[default]
    Personal,
    /// Records shared with everyone
    Global,
}

impl Scope {
    /// Path segment used in MrPassword URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Personal => "personal",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can list and fetch password records.
///
/// `MrPasswordClient` is the real implementation; tests plug in fakes.
pub trait RecordSource {
    /// IDs of all records visible in a scope, in page order.
    fn list_ids(&self, scope: Scope) -> Result<Vec<u32>>;

    /// Fetch one record. Returns `Ok(None)` when the record is not accessible.
    fn fetch_record(&self, id: u32, scope: Scope) -> Result<Option<PasswordEntry>>;
}

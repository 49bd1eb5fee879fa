//! Typed errors raised by this crate itself.
//!
//! Transport and KDBX failures are passed through from `reqwest` and
//! `keepass` inside `anyhow::Error` with context attached.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// Login answered without any `Set-Cookie` header.
    #[error("login response carried no session cookie")]
    MissingSessionCookie,

    /// Login answered with a client or server error status.
    #[error("login rejected with HTTP status {status}")]
    LoginRejected { status: u16 },

    /// A page fetch answered with anything but 2xx, e.g. a redirect back
    /// to the login page once the session is no longer accepted.
    #[error("MrPassword answered HTTP status {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Neither a password nor a keyfile was given for the KeePass database.
    #[error("a KeePass password or keyfile is required")]
    MissingCredentials,

    /// A required setting was given neither as a flag nor in the config file.
    #[error("missing required setting `{0}` (pass it as a flag or in the config file)")]
    MissingSetting(&'static str),
}

//! Session cookie recovery.
//!
//! MrPassword answers the login POST with a redirect whose `Set-Cookie`
//! header is not picked up by the regular cookie store, so the header is
//! read by hand. Keep this workaround: the site gives no other way to
//! obtain the session.

use crate::error::MigrateError;
use reqwest::header::{HeaderMap, SET_COOKIE};
use tracing::debug;

/// Build a `Cookie` request header value from every `Set-Cookie` header.
///
/// Only the leading `name=value` pair of each header is kept; attributes
/// such as `path` or `HttpOnly` are dropped. Header bytes are read lossily
/// since the site may send non-ASCII cookie values.
pub fn session_cookie(headers: &HeaderMap) -> Result<String, MigrateError> {
    let pairs: Vec<String> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| {
            let raw = String::from_utf8_lossy(value.as_bytes());
            let pair = cookie_pair(&raw).map(str::to_string);
            if pair.is_none() {
                debug!("Ignoring Set-Cookie header without a name: {:?}", raw);
            }
            pair
        })
        .collect();

    if pairs.is_empty() {
        return Err(MigrateError::MissingSessionCookie);
    }

    Ok(pairs.join("; "))
}

/// Leading `name=value` of one raw `Set-Cookie` value.
fn cookie_pair(raw: &str) -> Option<&str> {
    let pair = raw.split(';').next()?.trim();
    match pair.split_once('=') {
        Some((name, _)) if !name.trim().is_empty() => Some(pair),
        _ => None,
    }
}

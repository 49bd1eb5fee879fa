//! Authenticated HTTP access to a MrPassword instance.

use super::{html, session, RecordSource, Scope};
use crate::entry::PasswordEntry;
use crate::error::MigrateError;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use tracing::debug;

/// Logged-in MrPassword session.
pub struct MrPasswordClient {
    client: Client,
    base_url: String,
    /// `Cookie` header value sent with every request
    cookie: String,
}

impl MrPasswordClient {
    /// Log in and keep the session for later requests.
    ///
    /// The login POST answers with a redirect which is deliberately not
    /// followed: the session cookie is only on that redirect response.
    pub fn authenticate(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .context("Cannot build HTTP client")?;

        let login_url = format!("{}/login", base_url);
        debug!("Logging in to {} as {}", login_url, username);

        let response = client
            .post(&login_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .with_context(|| format!("Cannot reach MrPassword at {}", login_url))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(MigrateError::LoginRejected {
                status: status.as_u16(),
            }
            .into());
        }

        let cookie = session::session_cookie(response.headers())?;
        debug!("Login answered {}, session cookie recovered", status);

        Ok(Self {
            client,
            base_url,
            cookie,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a page with the session cookie.
    ///
    /// Anything but 2xx is an error. Redirects are not followed, so a
    /// rejected session shows up here as a 3xx to the login page.
    fn get_page(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(COOKIE, &self.cookie)
            .send()
            .with_context(|| format!("Cannot fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        response
            .text()
            .with_context(|| format!("Cannot read response body of {}", url))
    }

    fn overview_url(&self, scope: Scope) -> String {
        format!("{}/{}", self.base_url, scope)
    }

    fn record_url(&self, id: u32, scope: Scope) -> String {
        format!("{}/{}/{}", self.base_url, scope, id)
    }
}

impl RecordSource for MrPasswordClient {
    fn list_ids(&self, scope: Scope) -> Result<Vec<u32>> {
        let page = self.get_page(&self.overview_url(scope))?;
        let ids = html::parse_record_ids(&page)?;
        debug!("Found {} {} record(s)", ids.len(), scope);
        Ok(ids)
    }

    fn fetch_record(&self, id: u32, scope: Scope) -> Result<Option<PasswordEntry>> {
        let page = self.get_page(&self.record_url(id, scope))?;
        let record = html::parse_record(&page, id, scope)?;
        if record.is_none() {
            debug!("Record {} in {} is not accessible, skipping", id, scope);
        }
        Ok(record)
    }
}

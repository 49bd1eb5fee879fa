//! HTML scraping for MrPassword pages.
//!
//! The markup is MrPassword's own and undocumented. Parsing is tolerant:
//! anything missing from a page becomes an empty value, never an error.

use super::Scope;
use crate::entry::PasswordEntry;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

/// Anchors that reveal a password on the overview page.
const REVEAL_LINK_SELECTOR: &str = "a.reveal-password";

/// Prefix of the reveal anchor's `id` attribute, followed by the record ID.
const REVEAL_LINK_ID_PREFIX: &str = "id-";

/// Cells of the detail table.
const DETAIL_CELL_SELECTOR: &str = "table.password-details td";

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

/// Extract record IDs from an overview page, in page order.
pub fn parse_record_ids(html: &str) -> Result<Vec<u32>> {
    let document = Html::parse_document(html);
    let links = selector(REVEAL_LINK_SELECTOR)?;

    Ok(document
        .select(&links)
        .filter_map(|link| link.value().attr("id"))
        .filter_map(parse_reveal_id)
        .collect())
}

/// `id-<digits>` -> digits. Anything else is not a record link.
fn parse_reveal_id(attr: &str) -> Option<u32> {
    let digits = attr.strip_prefix(REVEAL_LINK_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Substring present on a detail page only when the record is editable,
/// i.e. accessible to the logged-in user.
pub fn edit_marker(id: u32, scope: Scope) -> String {
    format!("/{}/{}/edit", scope, id)
}

/// Parse a record detail page.
///
/// Returns `None` when the page has no edit link for this record; MrPassword
/// still renders the page for records the user cannot access.
pub fn parse_record(html: &str, id: u32, scope: Scope) -> Result<Option<PasswordEntry>> {
    if !html.contains(&edit_marker(id, scope)) {
        return Ok(None);
    }

    let document = Html::parse_document(html);
    let cells = selector(DETAIL_CELL_SELECTOR)?;
    let links = selector("a")?;

    let mut entry = PasswordEntry::default();
    let mut seen: Vec<String> = Vec::new();

    for cell in document.select(&cells) {
        let label = cell_text(&cell);
        // First occurrence of each label wins
        if seen.contains(&label) {
            continue;
        }

        let Some(value) = next_cell(&cell) else {
            continue;
        };

        match label.as_str() {
            "Name" => entry.name = Some(cell_text(&value)),
            "Category" => entry.category = cell_text(&value),
            "Username" => entry.username = cell_text(&value),
            "Password" => entry.password = cell_text(&value),
            "Description" => entry.description = cell_text(&value),
            "URL" => {
                entry.url = value
                    .select(&links)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string();
            }
            _ => continue,
        }
        seen.push(label);
    }

    Ok(Some(entry))
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Next element sibling of a table cell.
fn next_cell<'a>(cell: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    cell.next_siblings().find_map(ElementRef::wrap)
}

//! Record model - one password scraped from MrPassword.

/// A single scraped password record.
///
/// Every text field defaults to empty when the detail page lacks its cell.
/// `name` is the exception: a missing "Name" cell yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordEntry {
    /// Display title
    pub name: Option<String>,
    /// Destination group name (empty = root group)
    pub category: String,
    pub username: String,
    pub password: String,
    pub url: String,
    /// Free-form notes
    pub description: String,
}

impl PasswordEntry {
    /// Group this entry belongs to, or `None` for the root group.
    pub fn group_name(&self) -> Option<&str> {
        if self.category.is_empty() {
            None
        } else {
            Some(&self.category)
        }
    }

    /// Title to write into KeePass. Unnamed records get an empty title.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

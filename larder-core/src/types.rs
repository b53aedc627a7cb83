use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::clean_entries;

/// Title used whenever a page gives us nothing better.
pub const DEFAULT_TITLE: &str = "Untitled Recipe";

/// Title given to a vault entry added without one.
pub const DEFAULT_ENTRY_TITLE: &str = "Untitled";

/// Generate a fresh record identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A saved recipe. Field names match the JSON export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Assigned once at creation, never changed.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Trimmed, non-empty lines in document order.
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Trimmed, non-empty steps in document order.
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(
        default = "chrono::Utc::now",
        with = "chrono::serde::ts_milliseconds"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl Recipe {
    /// Build a freshly captured recipe, enforcing the field invariants.
    pub fn new(
        url: &str,
        title: Option<&str>,
        ingredients: Vec<String>,
        instructions: Vec<String>,
    ) -> Self {
        Self {
            id: new_id(),
            url: url.to_string(),
            title: display_title(title),
            ingredients: clean_entries(ingredients),
            instructions: clean_entries(instructions),
            created_at: Utc::now(),
            notes: String::new(),
        }
    }

    /// True when there is nothing worth saving: no title or neither list has content.
    pub fn is_insufficient(&self) -> bool {
        self.title.trim().is_empty() || (self.ingredients.is_empty() && self.instructions.is_empty())
    }

    /// Repair a record that came from outside (an import file): fill in a
    /// missing identifier, default the title and drop blank list entries.
    pub fn sanitized(mut self) -> Self {
        if self.id.trim().is_empty() {
            self.id = new_id();
        }
        self.title = display_title(Some(&self.title));
        self.ingredients = clean_entries(self.ingredients);
        self.instructions = clean_entries(self.instructions);
        self
    }
}

/// Trim a candidate title, falling back to [`DEFAULT_TITLE`] when blank.
pub fn display_title(title: Option<&str>) -> String {
    title_or(title, DEFAULT_TITLE)
}

fn title_or(title: Option<&str>, default: &str) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => default.to_string(),
    }
}

/// Identifies which extraction tier produced a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    JsonLd,
    Microdata,
    /// Heading scan over the visible text of the fetched HTML.
    PageText,
    /// Heading scan over text from the readable-text relay.
    ReadableText,
}

impl ExtractionMethod {
    pub fn status_message(&self) -> &'static str {
        match self {
            ExtractionMethod::ReadableText => "Imported via readable text fallback.",
            _ => "Imported successfully.",
        }
    }
}

/// A recipe together with the tier that produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub recipe: Recipe,
    pub method: ExtractionMethod,
}

/// A private link kept in the encrypted vault. Never persisted in plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl VaultEntry {
    pub fn new(title: &str, url: &str, notes: &str) -> Self {
        Self {
            id: new_id(),
            title: title_or(Some(title), DEFAULT_ENTRY_TITLE),
            url: url.trim().to_string(),
            notes: notes.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// The persisted form of a [`VaultEntry`]: base64 IV and AES-GCM ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Mirrors the plaintext entry id; used for matching, not secret.
    pub id: String,
    pub iv: String,
    pub ciphertext: String,
}

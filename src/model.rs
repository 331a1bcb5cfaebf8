use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Fixed category vocabulary offered by the phrase form. Free-text
/// categories entering through imports are accepted as-is.
pub const CATEGORIES: [&str; 7] = [
    "technology",
    "philosophy",
    "bestPractices",
    "architecture",
    "testing",
    "design",
    "methodology",
];

/// Opaque stable identifier for a phrase.
///
/// Generated ids are UUID v4 strings; ids arriving through imports are kept
/// verbatim so re-exports stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseId(String);

impl PhraseId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhraseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The core entity: a short text with metadata.
///
/// `id` and `created_at` are assigned once and never reassigned; updates go
/// through [`crate::store::PhraseUpdates`], which has no fields for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: PhraseId,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: u64,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: PhraseId::generate(),
            text: text.into(),
            tags: Vec::new(),
            author: None,
            category: None,
            created_at: Utc::now(),
            likes: 0,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Phrase as it appears in an import payload: `id` and `created_at` may be
/// missing and are filled in at import time.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseImport {
    #[serde(default)]
    pub id: Option<PhraseId>,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u64,
}

impl PhraseImport {
    /// Materialize into a full phrase, generating the missing identity
    /// fields. Present values are preserved unchanged.
    pub fn into_phrase(self) -> Phrase {
        Phrase {
            id: self.id.unwrap_or_else(PhraseId::generate),
            text: self.text,
            tags: self.tags,
            author: self.author,
            category: self.category,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            likes: self.likes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Date,
    Text,
    Likes,
    Author,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
    Virtual,
}

/// Persisted as a raw token, not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_token(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Unknown tokens fall back to the default.
    pub fn from_token(token: &str) -> Self {
        match token {
            "light" => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn as_token(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    pub fn from_token(token: &str) -> Self {
        match token {
            "es" => Locale::Es,
            _ => Locale::En,
        }
    }
}

/// The single application state owned by the store.
///
/// `phrases` is kept newest-first: new phrases are prepended. The selection
/// set is only meaningful while `selection_mode` is on; turning the mode off
/// clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub phrases: Vec<Phrase>,
    pub filter: String,
    pub selected_phrases: HashSet<PhraseId>,
    pub selection_mode: bool,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phrases: Vec::new(),
            filter: String::new(),
            selected_phrases: HashSet::new(),
            selection_mode: false,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            theme: Theme::default(),
            view_mode: ViewMode::default(),
            is_loading: false,
            error: None,
        }
    }
}

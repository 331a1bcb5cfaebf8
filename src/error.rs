use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Broad failure classes surfaced by the persistence gateway and the API
/// facade. Validation problems are normally reported through
/// [`crate::validation::ValidationResult`]; the `Validation` category only
/// appears when an operation (e.g. import) rejects its input wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Storage,
    Parsing,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ErrorCategory::Validation => "VALIDATION_ERROR",
            ErrorCategory::Storage => "STORAGE_ERROR",
            ErrorCategory::Parsing => "PARSING_ERROR",
            ErrorCategory::Unknown => "UNKNOWN_ERROR",
        };
        f.write_str(tag)
    }
}

/// Tagged error carried back to callers instead of an unwound panic.
///
/// Call sites check the result explicitly and decide whether to log, surface
/// to the user, or degrade to a default.
#[derive(Debug, Error)]
#[error("{category}: {message}")]
pub struct AppError {
    pub category: ErrorCategory,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            source: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Storage, message)
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Parsing, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unknown, message)
    }
}

//! Note content validation.

use thiserror::Error;

/// Maximum note length, counted in characters after trimming.
pub const MAX_CONTENT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Content is required")]
    Empty,
    #[error("Content cannot exceed {max} characters (got {length})")]
    TooLong { length: usize, max: usize },
}

/// Trimmed note content that passed validation.
///
/// Only `validate` constructs this, so stores never see raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContent(String);

impl ValidatedContent {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trim surrounding whitespace and check emptiness and length.
///
/// No other transformation is applied: no escaping, no truncation.
pub fn validate(content: &str) -> Result<ValidatedContent, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let length = trimmed.chars().count();
    if length > MAX_CONTENT_CHARS {
        return Err(ValidationError::TooLong {
            length,
            max: MAX_CONTENT_CHARS,
        });
    }

    Ok(ValidatedContent(trimmed.to_string()))
}

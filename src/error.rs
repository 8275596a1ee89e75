//! Error types for library sheet operations.
//!
//! Validation errors are raised before any I/O. A missing remote document is
//! never an error; stores report it as `None`.

use thiserror::Error;

/// Errors that can occur while reading, mutating or persisting library sheets
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Unknown library type: {0} (expected one of blocks, templates, icons, placeholders)")]
    UnknownLibraryType(String),

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidIdentifier {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Entry has no value for key field '{0}'")]
    MissingKey(String),

    #[error("Malformed sheet document: {0}")]
    MalformedDocument(String),

    #[error("{service} request to {url} failed with status {status}: {body}")]
    Transport {
        service: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl LibraryError {
    /// True for errors detected before any network call was attempted
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LibraryError::UnknownLibraryType(_)
                | LibraryError::InvalidIdentifier { .. }
                | LibraryError::MissingKey(_)
                | LibraryError::MalformedDocument(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// Check an org, repo or item name before it is spliced into a remote path
pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LibraryError::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: "must not be empty",
        });
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid || value.starts_with('.') {
        return Err(LibraryError::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason: "only letters, digits, '-', '_' and '.' are allowed",
        });
    }

    Ok(())
}

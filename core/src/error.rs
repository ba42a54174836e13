//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A referenced document does not exist at the resolved location.
    ///
    /// The resolver treats this as an unresolvable reference rather than a fatal failure.
    #[from(ignore)]
    #[display("Document not found: {_0}")]
    NotFound(String),

    /// Remote retrieval failed (network, TLS, non-success status).
    #[from(ignore)]
    #[display("Fetch Error: {_0}")]
    Fetch(String),

    /// Document text could not be parsed as YAML / JSON, or did not match the model.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Returns true when the error only signals a missing document.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound(_) => true,
            AppError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_conversion() {
        let io_err = Error::new(ErrorKind::Other, "test");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(!app_err.is_not_found());
    }

    #[test]
    fn test_string_conversion() {
        // Test that String defaults to General, not NotFound / Parse
        let msg = String::from("something wrong");
        let app_err: AppError = msg.into();
        match app_err {
            AppError::General(s) => assert_eq!(s, "something wrong"),
            _ => panic!("String should convert to AppError::General"),
        }
    }

    #[test]
    fn test_not_found_detection() {
        assert!(AppError::NotFound("./missing.yaml".into()).is_not_found());
        let io_missing: AppError = Error::new(ErrorKind::NotFound, "gone").into();
        assert!(io_missing.is_not_found());
        assert!(!AppError::Fetch("timeout".into()).is_not_found());
    }

    #[test]
    fn test_display_variants() {
        let err = AppError::Parse("bad indent".into());
        assert_eq!(format!("{}", err), "Parse Error: bad indent");
        let err = AppError::NotFound("a.yaml".into());
        assert_eq!(format!("{}", err), "Document not found: a.yaml");
    }
}

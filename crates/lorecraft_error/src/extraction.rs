//! JSON extraction error types.

/// Specific error conditions for extracting JSON from model output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ExtractionErrorKind {
    /// No JSON content could be located in the response text
    #[display("No JSON object or array found in response text")]
    NoJsonFound,
    /// Opening delimiter found but the region never closes
    #[display("Unbalanced delimiters starting with '{}'", _0)]
    UnbalancedDelimiters(char),
    /// Extracted text failed to parse as JSON
    #[display("Failed to parse extracted JSON: {}", _0)]
    Parse(String),
    /// Parsed JSON was not the expected array of entries
    #[display("Expected a JSON array of entries, got {}", _0)]
    NotAnArray(String),
}

/// Error type for JSON extraction operations.
///
/// # Examples
///
/// ```
/// use lorecraft_error::{ExtractionError, ExtractionErrorKind};
///
/// let err = ExtractionError::new(ExtractionErrorKind::NoJsonFound);
/// assert!(format!("{}", err).contains("No JSON"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Extraction Error: {} at line {} in {}", kind, line, file)]
pub struct ExtractionError {
    /// The specific error condition
    pub kind: ExtractionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExtractionError {
    /// Create a new ExtractionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExtractionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

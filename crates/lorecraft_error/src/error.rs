//! Top-level error wrapper types.

use crate::{
    ConfigError, ExtractionError, GenerationError, HostError, HttpError, JsonError, RetryableError,
    SourceError,
};

/// The foundation error enum covering every error domain in the workspace.
///
/// # Examples
///
/// ```
/// use lorecraft_error::{LorecraftError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: LorecraftError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum LorecraftErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON extraction error
    #[from(ExtractionError)]
    Extraction(ExtractionError),
    /// Host interface error
    #[from(HostError)]
    Host(HostError),
    /// Text-generation source error
    #[from(SourceError)]
    Source(SourceError),
    /// Generation pipeline error
    #[from(GenerationError)]
    Generation(GenerationError),
}

/// Lorecraft error with kind discrimination.
///
/// # Examples
///
/// ```
/// use lorecraft_error::{LorecraftResult, ConfigError};
///
/// fn might_fail() -> LorecraftResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Lorecraft Error: {}", _0)]
pub struct LorecraftError(Box<LorecraftErrorKind>);

impl LorecraftError {
    /// Create a new error from a kind.
    pub fn new(kind: LorecraftErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &LorecraftErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to LorecraftErrorKind
impl<T> From<T> for LorecraftError
where
    T: Into<LorecraftErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for LorecraftError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            LorecraftErrorKind::Source(e) => e.is_retryable(),
            LorecraftErrorKind::Http(_) => true,
            _ => false,
        }
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self.kind() {
            LorecraftErrorKind::Source(e) => e.retry_strategy_params(),
            _ => (2000, 5, 60),
        }
    }
}

/// Result type for Lorecraft operations.
///
/// # Examples
///
/// ```
/// use lorecraft_error::{LorecraftResult, HttpError};
///
/// fn fetch_data() -> LorecraftResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type LorecraftResult<T> = std::result::Result<T, LorecraftError>;

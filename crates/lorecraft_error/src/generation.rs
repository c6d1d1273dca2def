//! Generation pipeline error types.

/// Specific error conditions for the automated generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Book name was empty or whitespace
    #[display("Book name cannot be empty")]
    EmptyBookName,
    /// Core theme was empty or whitespace
    #[display("Core theme cannot be empty")]
    EmptyTheme,
    /// Credit balance is exhausted
    #[display("Call credits exhausted")]
    CreditsExhausted,
    /// A task failed every attempt in a retry round
    #[display("Task '{}' failed after {} attempts: {}", task, attempts, message)]
    AttemptsExhausted {
        /// Task name
        task: String,
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        message: String,
    },
    /// Decomposition did not produce a usable stage plan
    #[display("Invalid stage plan: {}", _0)]
    BadPlan(String),
    /// Template rendering failed
    #[display("Template error: {}", _0)]
    TemplateError(String),
    /// A generation run is already in progress
    #[display("A generation run is already in progress")]
    AlreadyRunning,
    /// The run was aborted while awaiting a manual retry
    #[display("Generation aborted")]
    Aborted,
}

/// Error type for generation pipeline operations.
///
/// # Examples
///
/// ```
/// use lorecraft_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::EmptyBookName);
/// assert!(format!("{}", err).contains("empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Host interface error types.

/// Specific error conditions for host-side lorebook and character operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum HostErrorKind {
    /// Failed to create a lorebook
    #[display("Failed to create lorebook '{}': {}", name, message)]
    LorebookCreate {
        /// Lorebook name
        name: String,
        /// Error message
        message: String,
    },
    /// Failed to read a lorebook or its entries
    #[display("Failed to read lorebook '{}': {}", name, message)]
    LorebookRead {
        /// Lorebook name
        name: String,
        /// Error message
        message: String,
    },
    /// Failed to create an entry in a lorebook
    #[display("Failed to create entry in lorebook '{}': {}", name, message)]
    EntryCreate {
        /// Lorebook name
        name: String,
        /// Error message
        message: String,
    },
    /// Failed to create a character card
    #[display("Failed to create character: {}", _0)]
    CharacterCreate(String),
    /// The host interface is not available
    #[display("Host interface unavailable: {}", _0)]
    Unavailable(String),
}

/// Error type for host interface operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Host Error: {} at line {} in {}", kind, line, file)]
pub struct HostError {
    /// The specific error condition
    pub kind: HostErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl HostError {
    /// Create a new HostError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: HostErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

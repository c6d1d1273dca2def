//! Input types for LLM requests.

use serde::{Deserialize, Serialize};

/// Supported input types to generation sources.
///
/// Kept as an enum for wire stability even though the pipeline currently
/// only sends text prompts.
///
/// # Examples
///
/// ```
/// use lorecraft_core::Input;
///
/// let text = Input::Text("Hello, world!".to_string());
/// assert_eq!(text.as_text(), Some("Hello, world!"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),
}

impl Input {
    /// Returns the text content if this is a text input.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Input::Text(text) => Some(text),
        }
    }
}

//! Typed lorebook records.

use serde::{Deserialize, Serialize};

/// A single lorebook entry.
///
/// All fields besides `keys` are optional. Unknown fields produced by a
/// model are dropped during sanitization rather than rejected here.
///
/// # Examples
///
/// ```
/// use lorecraft_core::LoreEntry;
///
/// let entry = LoreEntry::new(vec!["Ironhold".to_string()])
///     .with_comment("The mountain capital")
///     .with_content("Ironhold is a fortress city carved into the peaks.");
///
/// assert_eq!(entry.keys.len(), 1);
/// assert!(entry.content.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoreEntry {
    /// Trigger keywords for this entry
    #[serde(default, alias = "key")]
    pub keys: Vec<String>,
    /// Short human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Entry body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Entry type (e.g. "constant" or "selective")
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    /// Insertion position hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// Insertion depth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// Whether this entry is excluded from recursive activation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_recursion: Option<bool>,
    /// Relative ordering weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Host-assigned unique identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

impl LoreEntry {
    /// Create an entry with the given trigger keys.
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    /// Builder method to set the comment.
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Builder method to set the content.
    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// A named lorebook with its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreBook {
    /// Lorebook name
    pub name: String,
    /// The entries in creation order
    pub entries: Vec<LoreEntry>,
}

impl LoreBook {
    /// Create an empty lorebook.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }
}

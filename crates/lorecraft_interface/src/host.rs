//! Host traits implemented by the embedding application.
//!
//! The engine never talks to lorebook storage or character creation
//! endpoints directly. The host supplies these capabilities, which keeps
//! the pipeline testable against in-memory implementations.

use async_trait::async_trait;
use lorecraft_core::{CharacterCard, LoreEntry};
use lorecraft_error::LorecraftResult;

/// Lorebook storage operations provided by the host.
#[async_trait]
pub trait LorebookHost: Send + Sync {
    /// List the names of all existing lorebooks.
    async fn list_lorebooks(&self) -> LorecraftResult<Vec<String>>;

    /// Check whether a lorebook with this name exists.
    async fn lorebook_exists(&self, name: &str) -> LorecraftResult<bool> {
        Ok(self.list_lorebooks().await?.iter().any(|n| n == name))
    }

    /// Create a lorebook if it does not already exist.
    ///
    /// Implementations must be idempotent: creating a name that already
    /// exists is not an error.
    async fn create_lorebook(&self, name: &str) -> LorecraftResult<()>;

    /// Fetch the current entries of a lorebook.
    async fn entries(&self, name: &str) -> LorecraftResult<Vec<LoreEntry>>;

    /// Append a single entry to a lorebook.
    async fn create_entry(&self, name: &str, entry: &LoreEntry) -> LorecraftResult<()>;

    /// Delete a lorebook and its entries.
    async fn delete_lorebook(&self, name: &str) -> LorecraftResult<()>;
}

/// Character creation provided by the host.
#[async_trait]
pub trait CharacterHost: Send + Sync {
    /// Create a character card, returning the host-assigned identifier
    /// (typically the avatar file name).
    async fn create_character(&self, card: &CharacterCard) -> LorecraftResult<String>;
}

//! Companion character creation.
//!
//! After a run finishes, a "director" character card is generated from the
//! completed lorebook and handed to the host. The card's name and bound
//! world are always forced to the book name, whatever the model invented.

use crate::extraction::parse_json;
use crate::template::{PromptTemplate, TemplateParams, templates};
use lorecraft_core::{CharacterCard, GenerateRequest};
use lorecraft_error::LorecraftResult;
use lorecraft_interface::{CharacterHost, LorebookHost, LorecraftDriver};
use tracing::{debug, info};

/// Default brief when the caller supplies no character prompt.
pub const DEFAULT_CHARACTER_PROMPT: &str = "Create a suitable director character.";

/// Generate a director character from a finished lorebook and create it
/// through the host.
///
/// Returns the host-assigned identifier for the new character.
///
/// # Errors
///
/// Fails if the entries cannot be fetched, the model response is not a
/// character card, or the host rejects the creation. Callers running a full
/// pipeline treat this as a warning, not a run failure.
#[tracing::instrument(skip(driver, lorebooks, characters, user_prompt), fields(book = %book_name))]
pub async fn bind_character(
    driver: &dyn LorecraftDriver,
    lorebooks: &dyn LorebookHost,
    characters: &dyn CharacterHost,
    book_name: &str,
    user_prompt: Option<&str>,
    max_tokens: u32,
) -> LorecraftResult<String> {
    let entries = lorebooks.entries(book_name).await?;
    debug!(entries = entries.len(), "Building character prompt");

    let prompt = PromptTemplate::with_preamble(templates::CHARACTER).render(
        &TemplateParams::new()
            .entries(&entries)
            .user_prompt(user_prompt.unwrap_or(DEFAULT_CHARACTER_PROMPT)),
    )?;

    let response = driver
        .generate(&GenerateRequest::from_prompt(prompt, max_tokens))
        .await?;

    let card: CharacterCard = parse_json(&response.text())?;
    let card = card.bound_to(book_name);

    let id = characters.create_character(&card).await?;

    info!(id = %id, "Created director character");
    Ok(id)
}

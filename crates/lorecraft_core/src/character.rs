//! Character card types.

use serde::{Deserialize, Serialize};

/// A character card generated from a finished lorebook.
///
/// Field names follow the card format the host expects on upload. The
/// pipeline overwrites `name` and `world` with the book name before the
/// card is created, so a model-supplied name never leaks through.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharacterCard {
    /// Character name (forced to the book name before creation)
    #[serde(default)]
    pub name: String,
    /// Character description
    #[serde(default)]
    pub description: String,
    /// Opening message
    #[serde(default)]
    pub first_mes: String,
    /// Personality summary
    #[serde(default)]
    pub personality: String,
    /// Scenario framing
    #[serde(default)]
    pub scenario: String,
    /// Notes for the reader, not sent to the model
    #[serde(default)]
    pub creator_notes: String,
    /// System prompt override
    #[serde(default)]
    pub system_prompt: String,
    /// Instructions injected after chat history
    #[serde(default)]
    pub post_history_instructions: String,
    /// Comma-separated tag list
    #[serde(default)]
    pub tags: String,
    /// Bound lorebook name (forced to the book name before creation)
    #[serde(default)]
    pub world: String,
}

impl CharacterCard {
    /// Bind this card to a lorebook, forcing the name to match.
    pub fn bound_to<S: Into<String>>(mut self, book_name: S) -> Self {
        let book_name = book_name.into();
        self.name = book_name.clone();
        self.world = book_name;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_forces_name_and_world() {
        let card = CharacterCard {
            name: "Model Invented Name".to_string(),
            description: "A director.".to_string(),
            ..CharacterCard::default()
        };
        let bound = card.bound_to("Shattered Realms");
        assert_eq!(bound.name, "Shattered Realms");
        assert_eq!(bound.world, "Shattered Realms");
        assert_eq!(bound.description, "A director.");
    }

    #[test]
    fn tolerates_missing_fields() {
        let card: CharacterCard = serde_json::from_str(r#"{"description": "sparse"}"#).unwrap();
        assert_eq!(card.description, "sparse");
        assert!(card.first_mes.is_empty());
    }
}

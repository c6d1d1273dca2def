//! Type conversions between Lorecraft and OpenAI formats.

use crate::openai_compat::{ChatMessage, ChatRequest, ChatResponse};
use lorecraft_core::{GenerateRequest, GenerateResponse, Input, Output, Role};
use lorecraft_error::{SourceError, SourceErrorKind};

/// Token budget applied when a request does not set one.
///
/// Matches the generous ceiling the pipeline was tuned against; stage
/// outputs are whole entry arrays and truncation corrupts the JSON.
pub const DEFAULT_MAX_TOKENS: u32 = 60_000;

/// Converts a Lorecraft GenerateRequest to OpenAI chat format.
pub fn to_chat_request(req: &GenerateRequest, model: &str) -> Result<ChatRequest, SourceError> {
    let mut messages = Vec::new();

    for msg in &req.messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };

        for content in &msg.content {
            let Input::Text(text) = content;
            messages.push(ChatMessage {
                role: role.to_string(),
                content: text.clone(),
            });
        }
    }

    let mut builder = ChatRequest::builder();
    builder
        .model(req.model.clone().unwrap_or_else(|| model.to_string()))
        .messages(messages)
        .max_tokens(Some(req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)))
        .stream(Some(false));

    if let Some(temp) = req.temperature {
        builder.temperature(Some(temp));
    }

    builder
        .build()
        .map_err(|e| SourceError::new(SourceErrorKind::Builder(e.to_string())))
}

/// Converts an OpenAI chat response to a Lorecraft GenerateResponse.
pub fn from_chat_response(response: &ChatResponse) -> Result<GenerateResponse, SourceError> {
    let content = response
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .ok_or_else(|| SourceError::new(SourceErrorKind::EmptyResponse))?;

    Ok(GenerateResponse {
        outputs: vec![Output::Text(content)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorecraft_core::Message;

    #[test]
    fn default_token_budget_applied() {
        let req = GenerateRequest {
            messages: vec![Message::user("hello")],
            max_tokens: None,
            temperature: None,
            model: None,
        };
        let chat = to_chat_request(&req, "test-model").unwrap();
        assert_eq!(chat.max_tokens(), &Some(DEFAULT_MAX_TOKENS));
        assert_eq!(chat.stream(), &Some(false));
        assert_eq!(chat.model(), "test-model");
    }

    #[test]
    fn request_model_overrides_client_model() {
        let req = GenerateRequest {
            messages: vec![Message::user("hello")],
            max_tokens: Some(100),
            temperature: Some(0.5),
            model: Some("override".to_string()),
        };
        let chat = to_chat_request(&req, "default").unwrap();
        assert_eq!(chat.model(), "override");
        assert_eq!(chat.max_tokens(), &Some(100));
    }

    #[test]
    fn empty_choices_is_an_error() {
        let response = ChatResponse {
            choices: vec![],
            usage: None,
        };
        assert!(from_chat_response(&response).is_err());
    }
}

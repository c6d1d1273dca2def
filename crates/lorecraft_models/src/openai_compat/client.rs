//! Generic client for OpenAI-compatible APIs.

use crate::openai_compat::{ChatResponse, ModelList, completions_url, conversions, models_url};
use async_trait::async_trait;
use lorecraft_core::{GenerateRequest, GenerateResponse};
use lorecraft_error::{
    LorecraftResult, RetryableError, SourceError, SourceErrorKind,
};
use lorecraft_interface::LorecraftDriver;
use reqwest::Client;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, instrument};

/// Generic client for any OpenAI-compatible chat completions API.
///
/// This covers the "custom endpoint" generation source: the user supplies a
/// base URL, an optional API key, and a model name. Transient HTTP failures
/// are retried with jittered exponential backoff before the error reaches
/// the pipeline's own retry executor.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    completions_url: String,
    models_url: String,
}

impl OpenAICompatibleClient {
    /// Creates a new OpenAI-compatible client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL as configured by the user; normalized here
    /// * `api_key` - Optional bearer token
    /// * `model` - Model identifier
    #[instrument(skip(api_key), fields(model = %model))]
    pub fn new(base_url: &str, api_key: Option<String>, model: String) -> Self {
        let completions_url = completions_url(base_url);
        let models_url = models_url(base_url);

        debug!(
            model = %model,
            url = %completions_url,
            "Created OpenAI-compatible client"
        );

        Self {
            client: Client::new(),
            api_key,
            model,
            completions_url,
            models_url,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    async fn try_generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, SourceError> {
        let chat_request = conversions::to_chat_request(req, &self.model)?;

        debug!(
            model = %self.model,
            message_count = chat_request.messages().len(),
            "Sending request"
        );

        let response = self
            .authorized(self.client.post(&self.completions_url))
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "HTTP request failed");
                SourceError::new(SourceErrorKind::Request(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_text, "API error");

            return Err(SourceError::new(SourceErrorKind::Http {
                status_code: status.as_u16(),
                message: error_text,
            }));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse response");
            SourceError::new(SourceErrorKind::ResponseParsing(e.to_string()))
        })?;

        debug!(choices = chat_response.choices.len(), "Received response");

        conversions::from_chat_response(&chat_response)
    }

    /// Lists the models available at the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the listing cannot be
    /// parsed.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> LorecraftResult<Vec<String>> {
        let response = self
            .authorized(self.client.get(&self.models_url))
            .send()
            .await
            .map_err(|e| SourceError::new(SourceErrorKind::Request(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SourceError::new(SourceErrorKind::Http {
                status_code: status.as_u16(),
                message: error_text,
            })
            .into());
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| SourceError::new(SourceErrorKind::ResponseParsing(e.to_string())))?;

        Ok(list.ids())
    }
}

#[async_trait]
impl LorecraftDriver for OpenAICompatibleClient {
    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate(&self, req: &GenerateRequest) -> LorecraftResult<GenerateResponse> {
        let (initial_ms, max_retries, max_delay_secs) =
            SourceError::new(SourceErrorKind::Request(String::new())).retry_strategy_params();

        let strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(max_retries);

        let result = Retry::spawn(strategy, || async {
            match self.try_generate(req).await {
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    debug!(error = %e, "Transient error, will retry");
                    Err(RetryError::transient(e))
                }
                Err(e) => Err(RetryError::permanent(e)),
            }
        })
        .await;

        result.map_err(Into::into)
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

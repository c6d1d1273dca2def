//! Generation source selection.
//!
//! Mirrors the two sources the original extension exposed: the host's own
//! generation pipeline ("tavern") or a user-configured OpenAI-compatible
//! endpoint ("custom").

use crate::OpenAICompatibleClient;
use derive_getters::Getters;
use lorecraft_error::{LorecraftResult, SourceError, SourceErrorKind};
use lorecraft_interface::LorecraftDriver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which backend handles generation calls.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum AiSource {
    /// Route calls through the host application's generation pipeline
    #[default]
    Tavern,
    /// Call a user-configured OpenAI-compatible endpoint directly
    Custom,
}

/// Persisted source configuration.
///
/// # Examples
///
/// ```
/// use lorecraft_models::{AiSource, SourceSettings};
///
/// let settings = SourceSettings::default();
/// assert_eq!(settings.ai_source(), &AiSource::Tavern);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct SourceSettings {
    /// Selected generation source
    #[serde(default)]
    ai_source: AiSource,
    /// Base URL for the custom endpoint
    #[serde(default)]
    api_url: String,
    /// API key for the custom endpoint
    #[serde(default)]
    api_key: String,
    /// Model identifier for the custom endpoint
    #[serde(default)]
    api_model: String,
}

impl SourceSettings {
    /// Create settings for a custom endpoint.
    pub fn custom(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        api_model: impl Into<String>,
    ) -> Self {
        Self {
            ai_source: AiSource::Custom,
            api_url: api_url.into(),
            api_key: api_key.into(),
            api_model: api_model.into(),
        }
    }
}

/// Select the driver for a run.
///
/// The host driver is used for `AiSource::Tavern`; for `AiSource::Custom` a
/// bundled OpenAI-compatible client is built from the settings.
///
/// # Errors
///
/// Returns `MissingApiUrl` when the custom source is selected without a
/// configured URL.
pub fn build_driver(
    settings: &SourceSettings,
    host_driver: Arc<dyn LorecraftDriver>,
) -> LorecraftResult<Arc<dyn LorecraftDriver>> {
    match settings.ai_source {
        AiSource::Tavern => Ok(host_driver),
        AiSource::Custom => {
            if settings.api_url.trim().is_empty() {
                return Err(SourceError::new(SourceErrorKind::MissingApiUrl).into());
            }
            let api_key = if settings.api_key.is_empty() {
                None
            } else {
                Some(settings.api_key.clone())
            };
            Ok(Arc::new(OpenAICompatibleClient::new(
                &settings.api_url,
                api_key,
                settings.api_model.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lorecraft_core::{GenerateRequest, GenerateResponse, Output};

    struct EchoDriver;

    #[async_trait]
    impl LorecraftDriver for EchoDriver {
        async fn generate(&self, _req: &GenerateRequest) -> LorecraftResult<GenerateResponse> {
            Ok(GenerateResponse {
                outputs: vec![Output::Text("echo".to_string())],
            })
        }

        fn provider_name(&self) -> &'static str {
            "echo"
        }

        fn model_name(&self) -> &str {
            "echo-1"
        }
    }

    #[test]
    fn tavern_source_uses_host_driver() {
        let settings = SourceSettings::default();
        let driver = build_driver(&settings, Arc::new(EchoDriver)).unwrap();
        assert_eq!(driver.provider_name(), "echo");
    }

    #[test]
    fn custom_source_builds_client() {
        let settings = SourceSettings::custom("https://api.example.com", "", "test-model");
        let driver = build_driver(&settings, Arc::new(EchoDriver)).unwrap();
        assert_eq!(driver.provider_name(), "openai-compatible");
        assert_eq!(driver.model_name(), "test-model");
    }

    #[test]
    fn custom_source_requires_url() {
        let settings = SourceSettings::custom("", "key", "model");
        assert!(build_driver(&settings, Arc::new(EchoDriver)).is_err());
    }

    #[test]
    fn settings_round_trip() {
        let settings = SourceSettings::custom("https://api.example.com/v1", "sk-123", "gpt-4o");
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""ai_source":"custom""#));
        let back: SourceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}

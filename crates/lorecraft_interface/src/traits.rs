//! Trait definitions for text-generation backends.

use async_trait::async_trait;
use lorecraft_core::{GenerateRequest, GenerateResponse};
use lorecraft_error::LorecraftResult;

/// Core trait that all generation backends must implement.
///
/// This provides the minimal interface for synchronous text generation.
/// The host-provided "tavern" source and the bundled OpenAI-compatible
/// client both implement this trait.
#[async_trait]
pub trait LorecraftDriver: Send + Sync {
    /// Generate model output given a request.
    async fn generate(&self, req: &GenerateRequest) -> LorecraftResult<GenerateResponse>;

    /// Provider name (e.g., "tavern", "openai-compatible").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

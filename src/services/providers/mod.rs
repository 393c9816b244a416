/// Generative text provider abstraction
///
/// The pipeline talks to the model through `ModelGateway` only, so the escalator can be
/// exercised against scripted gateways and the upstream vendor can be swapped without
/// touching parsing or fallback logic.
use crate::{error::GatewayResult, services::prompt::Prompt};

pub mod gemini;

/// Sampling parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// One outbound completion call
///
/// Implementations make exactly one request per invocation and never retry internally;
/// timeouts are imposed by the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModelGateway: Send + Sync {
    /// Returns the raw model text, which must be treated as untrusted
    async fn generate(&self, prompt: &Prompt, params: GenerationParams) -> GatewayResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

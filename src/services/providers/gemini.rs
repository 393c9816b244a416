/// Google Gemini provider
///
/// Calls `models/{model}:generateContent` once per invocation. The instruction block is sent
/// as the system instruction and the context block as the single user turn.
use crate::{
    error::{GatewayError, GatewayResult},
    models::gemini::{GenerateContentRequest, GenerateContentResponse, GenerationConfig},
    services::{
        prompt::Prompt,
        providers::{GenerationParams, ModelGateway},
    },
};
use reqwest::Client as HttpClient;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait::async_trait]
impl ModelGateway for GeminiProvider {
    async fn generate(&self, prompt: &Prompt, params: GenerationParams) -> GatewayResult<String> {
        let body = GenerateContentRequest::new(
            &prompt.instruction,
            &prompt.context,
            GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(format!("Undecodable Gemini response: {}", e)))?;
        let text = payload.into_text();

        tracing::debug!(
            model = %self.model,
            temperature = params.temperature,
            chars = text.len(),
            provider = self.name(),
            "Generation completed"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

//! Ollama Provider
//!
//! Local model adapter over the Ollama HTTP API. Useful as a last-resort
//! fallback with no API key and no per-call cost. System and user prompts
//! are concatenated into one prompt for `/api/generate`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::ai::prompt::Prompt;
use crate::types::{ForgeError, Result};

use super::{LlmProvider, LlmResponse, OutputShape, ProviderConfig, TokenUsage};

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";

/// Ollama local inference provider
#[derive(Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    host: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

// =============================================================================
// Implementation
// =============================================================================

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let host = config
            .api_base
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim_end_matches('/')
            .to_string();

        Url::parse(&host)
            .map_err(|e| ForgeError::Config(format!("Invalid Ollama host '{}': {}", host, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(
                crate::constants::network::CONNECTION_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| ForgeError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse> {
        let start = Instant::now();

        let body = GenerateRequest {
            model: &self.model,
            prompt: format!("{}\n\n{}", prompt.system, prompt.user),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        debug!(model = %self.model, host = %self.host, "sending Ollama generate request");

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("Ollama request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ForgeError::LlmApi(format!(
                "Ollama API error ({}): {}",
                status, error_body
            )));
        }

        let generate: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("Invalid Ollama response: {}", e)))?;

        let usage = match (generate.prompt_eval_count, generate.eval_count) {
            (Some(input), Some(output)) => Some(TokenUsage::new(input, output)),
            _ => None,
        };

        Ok(LlmResponse {
            text: generate.response,
            usage,
            total_ms: start.elapsed().as_millis() as u64,
            model: self.model.clone(),
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Labeled
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.host))
            .send()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("Ollama health check failed: {}", e)))?;

        Ok(response.status().is_success())
    }
}

//! OpenAI Provider
//!
//! Chat Completions adapter. Requests `json_object` response format so the
//! model returns a `{subject, body}` object directly; the parser still
//! accepts labeled text if the model ignores the hint. Also works against
//! OpenAI-compatible endpoints via `api_base`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::ai::prompt::Prompt;
use crate::types::{ForgeError, Result};

use super::{LlmProvider, LlmResponse, OutputShape, ProviderConfig, TokenUsage};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// JSON mode requires the word "json" to appear in the messages; this rider
/// also overrides the labeled output format the shared system prompt asks
/// for.
const JSON_FORMAT_INSTRUCTION: &str = "Respond ONLY with a valid JSON object containing exactly \
two string fields: \"subject\" and \"body\". No markdown fences, no commentary.";

/// System message augmented for JSON mode
fn json_system(system: &str) -> String {
    format!("{}\n\n{}", system, JSON_FORMAT_INSTRUCTION)
}

/// OpenAI Chat Completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    callback_url: Option<String>,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// =============================================================================
// Implementation
// =============================================================================

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| ForgeError::Config("OpenAI API key not configured".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(
                crate::constants::network::CONNECTION_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| ForgeError::LlmApi(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::from(api_key),
            api_base: config
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            callback_url: config.callback_url,
        })
    }

    fn build_request(&self) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            );

        // Attribution headers for OpenAI-compatible gateways
        if let Some(url) = &self.callback_url {
            request = request
                .header("HTTP-Referer", url.as_str())
                .header("X-Title", "mailforge");
        }

        request
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse> {
        let start = Instant::now();

        let system = json_system(&prompt.system);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(model = %self.model, "sending OpenAI chat request");

        let response = self
            .build_request()
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ForgeError::LlmApi(format!(
                "OpenAI API error ({}): {}",
                status, error_body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("Invalid OpenAI response: {}", e)))?;

        let text = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
            .to_string();

        let usage = chat
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        Ok(LlmResponse {
            text,
            usage,
            total_ms: start.elapsed().as_millis() as u64,
            model: if chat.model.is_empty() {
                self.model.clone()
            } else {
                chat.model
            },
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn output_shape(&self) -> OutputShape {
        OutputShape::Json
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| ForgeError::LlmApi(format!("OpenAI health check failed: {}", e)))?;

        Ok(response.status().is_success())
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> ProviderConfig {
        ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let err = OpenAiProvider::new(ProviderConfig::default()).unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }

    #[test]
    fn test_defaults_applied() {
        let provider = OpenAiProvider::new(config_with_key()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.output_shape(), OutputShape::Json);
    }

    #[test]
    fn test_json_mode_instruction_reaches_messages() {
        // json_object response_format is only valid when the messages
        // mention JSON
        let system = json_system("You write follow-up emails.");
        assert!(system.to_lowercase().contains("json"));
        assert!(system.starts_with("You write follow-up emails."));
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = OpenAiProvider::new(config_with_key()).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("[REDACTED]"));
    }
}

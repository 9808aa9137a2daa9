//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait for email text generation. Each adapter
//! wraps one backend behind the same call and is a stateless wrapper around
//! credentials fixed at startup, so adapter instances are safely shared
//! across concurrent requests.
//!
//! ## Modules
//!
//! - `chain`: Ordered fallback chain over configured adapters
//! - `openai` / `anthropic` / `ollama`: Concrete backends

mod anthropic;
mod chain;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use chain::{ChainOutcome, ChainedProvider, ProviderChain, ProviderChainBuilder};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::prompt::Prompt;
use crate::constants::network;
use crate::types::Result;

// =============================================================================
// LLM Response
// =============================================================================

/// Raw provider output plus whatever usage metadata the backend reported
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw generated text, parsed downstream
    pub text: String,
    /// Token usage, when the provider reports it; estimated otherwise
    pub usage: Option<TokenUsage>,
    /// Wall-clock response time in milliseconds
    pub total_ms: u64,
    /// Model that produced the response
    pub model: String,
}

impl LlmResponse {
    /// Response with text only (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            total_ms: 0,
            model: String::new(),
        }
    }
}

/// Token usage metrics as reported by a provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Output shape a provider is asked to produce.
///
/// The response parser accepts both shapes regardless; the flag records what
/// the adapter requests from its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    /// Structured JSON object with subject/body keys
    Json,
    /// SUBJECT:/BODY: labeled plain text
    Labeled,
}

/// Shared provider type for concurrent access across requests
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for one LLM provider.
///
/// API keys are never serialized to output and are redacted in debug
/// output; each adapter converts the key to `SecretString` internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "openai", "anthropic", "ollama"
    pub provider: String,
    /// Model name (provider-specific default when absent)
    pub model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// API key; never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Priority rank in the fallback chain (lower = tried first)
    #[serde(default)]
    pub priority: u8,
    /// Base callback URL for provider-side attribution headers
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .field("priority", &self.priority)
            .finish()
    }
}

fn default_max_tokens() -> usize {
    1024
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            api_key: None,
            api_base: None,
            max_tokens: 1024,
            priority: 0,
            callback_url: None,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// One LLM backend behind a uniform generate-text operation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate raw text for the given prompt pair
    async fn generate(&self, prompt: &Prompt) -> Result<LlmResponse>;

    /// Stable provider identifier for logging and metrics
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Output shape this adapter requests from its backend
    fn output_shape(&self) -> OutputShape {
        OutputShape::Labeled
    }

    /// Check if the provider is available
    async fn health_check(&self) -> Result<bool>;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        _ => Err(crate::types::ForgeError::Config(format!(
            "Unknown provider: {}. Supported: openai, anthropic, ollama",
            config.provider
        ))),
    }
}

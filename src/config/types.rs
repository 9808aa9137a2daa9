//! Configuration Types
//!
//! All configuration structures with sensible defaults. Providers are
//! resolved once at startup from available credentials; the chain membership
//! is fixed for the process lifetime.

use serde::{Deserialize, Serialize};

use crate::ai::provider::ProviderConfig;
use crate::constants::{network, sanitizer};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Per-field sanitizer limits
    pub sanitizer: SanitizerPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            sanitizer: SanitizerPolicy::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `ForgeError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(crate::types::ForgeError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(crate::types::ForgeError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.llm.callback_url {
            url::Url::parse(url).map_err(|e| {
                crate::types::ForgeError::Config(format!("Invalid callback_url '{}': {}", url, e))
            })?;
        }

        self.sanitizer.validate()
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Provider credentials and generation settings.
///
/// A provider joins the fallback chain iff its credential/endpoint is set;
/// the chain is ordered OpenAI, Anthropic, Ollama.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Per-provider request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for email generation
    pub temperature: f32,

    /// Maximum tokens to generate per variant
    pub max_tokens: usize,

    /// Base callback URL sent in provider attribution headers
    pub callback_url: Option<String>,

    /// OpenAI API key (never serialized to output)
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,

    /// Anthropic API key (never serialized to output)
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: Option<String>,

    /// Ollama host URL; presence enables the local fallback provider
    pub ollama_host: Option<String>,
    pub ollama_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            max_tokens: 1024,
            callback_url: None,
            openai_api_key: None,
            openai_model: None,
            anthropic_api_key: None,
            anthropic_model: None,
            ollama_host: None,
            ollama_model: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the set of configured providers in priority order.
    ///
    /// Presence of a credential/endpoint decides membership; an empty result
    /// means zero providers and is rejected at chain construction.
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        let mut configs = Vec::new();

        if self.openai_api_key.is_some() {
            configs.push(ProviderConfig {
                provider: "openai".to_string(),
                model: self.openai_model.clone(),
                api_key: self.openai_api_key.clone(),
                api_base: None,
                timeout_secs: self.timeout_secs,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                priority: 0,
                callback_url: self.callback_url.clone(),
            });
        }

        if self.anthropic_api_key.is_some() {
            configs.push(ProviderConfig {
                provider: "anthropic".to_string(),
                model: self.anthropic_model.clone(),
                api_key: self.anthropic_api_key.clone(),
                api_base: None,
                timeout_secs: self.timeout_secs,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                priority: 1,
                callback_url: self.callback_url.clone(),
            });
        }

        if let Some(host) = &self.ollama_host {
            configs.push(ProviderConfig {
                provider: "ollama".to_string(),
                model: self.ollama_model.clone(),
                api_key: None,
                api_base: Some(host.clone()),
                timeout_secs: self.timeout_secs,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                priority: 2,
                callback_url: self.callback_url.clone(),
            });
        }

        configs
    }
}

// =============================================================================
// Sanitizer Policy
// =============================================================================

/// Per-field max lengths for the sanitizer.
///
/// Policy, not algorithm: limits are configurable per deployment while the
/// scrubbing rules stay fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerPolicy {
    /// Short identity fields: name, email, company, role, priority, link
    pub identity_max_chars: usize,
    /// Free-text notes
    pub notes_max_chars: usize,
    /// Additional-context field
    pub context_max_chars: usize,
    /// Single conversation-history entry
    pub history_entry_max_chars: usize,
    /// History entries included per prompt
    pub max_history_entries: usize,
}

impl Default for SanitizerPolicy {
    fn default() -> Self {
        Self {
            identity_max_chars: sanitizer::MAX_IDENTITY_CHARS,
            notes_max_chars: sanitizer::MAX_NOTES_CHARS,
            context_max_chars: sanitizer::MAX_CONTEXT_CHARS,
            history_entry_max_chars: sanitizer::MAX_HISTORY_ENTRY_CHARS,
            max_history_entries: sanitizer::MAX_HISTORY_ENTRIES,
        }
    }
}

impl SanitizerPolicy {
    fn validate(&self) -> crate::types::Result<()> {
        let limits = [
            ("identity_max_chars", self.identity_max_chars),
            ("notes_max_chars", self.notes_max_chars),
            ("context_max_chars", self.context_max_chars),
            ("history_entry_max_chars", self.history_entry_max_chars),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(crate::types::ForgeError::Config(format!(
                    "Sanitizer limit {} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

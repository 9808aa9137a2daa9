//! Provider Fallback Chain
//!
//! Tries configured providers strictly in priority order and returns the
//! first response that both arrives and parses. A provider gets exactly one
//! attempt per generation; timeouts, transport errors, empty responses, and
//! malformed output all count as that provider's failure and move the chain
//! to the next entry. When every provider fails, the aggregate error carries
//! one classified failure per provider for logging, while its display stays
//! free of provider error bodies.
//!
//! ## Invariants
//!
//! - Order is fixed at construction; no reordering between calls
//! - No retries against the same provider within one generation
//! - An empty chain is a configuration error, caught at construction

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::ai::prompt::Prompt;
use crate::ai::timeout::with_timeout;
use crate::types::{EmailStyle, FailureKind, ForgeError, ProviderFailure, Result};

use super::{ProviderConfig, SharedProvider, TokenUsage, create_provider};

// =============================================================================
// Chain Types
// =============================================================================

/// One provider slot in the chain
pub struct ChainedProvider {
    pub provider: SharedProvider,
    /// Lower priority is tried first
    pub priority: u8,
    /// Per-call timeout for this provider
    pub timeout: Duration,
}

/// Result of a successful chain call.
///
/// Carries the parsed value plus the raw text and usage for metering, and
/// the failures of any providers skipped over on the way to success.
#[derive(Debug)]
pub struct ChainOutcome<T> {
    pub value: T,
    /// Raw provider text, kept for token estimation
    pub raw: String,
    /// Provider that produced the accepted response
    pub provider_id: String,
    /// Usage as reported by the winning provider, if any
    pub usage: Option<TokenUsage>,
    /// Failures from providers tried before the winner
    pub failures: Vec<ProviderFailure>,
}

/// Ordered multi-provider fallback chain
pub struct ProviderChain {
    providers: Vec<ChainedProvider>,
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.provider_names())
            .finish()
    }
}

impl ProviderChain {
    /// Build a chain from explicit slots. Fails on an empty list.
    pub fn new(mut providers: Vec<ChainedProvider>) -> Result<Self> {
        if providers.is_empty() {
            return Err(ForgeError::Config(
                "Provider chain requires at least one configured provider".to_string(),
            ));
        }
        providers.sort_by_key(|p| p.priority);
        Ok(Self { providers })
    }

    /// Build a chain from provider configurations
    pub fn from_configs(configs: &[ProviderConfig]) -> Result<Self> {
        let mut providers = Vec::with_capacity(configs.len());
        for config in configs {
            providers.push(ChainedProvider {
                provider: create_provider(config)?,
                priority: config.priority,
                timeout: Duration::from_secs(config.timeout_secs),
            });
        }
        Self::new(providers)
    }

    /// Number of providers in the chain
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider identifiers in attempt order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.provider.name()).collect()
    }

    /// Run the chain: call each provider in order and validate its raw text
    /// with `validate`. The first response that validates wins; a validation
    /// failure counts as that provider's failure and triggers fallback.
    pub async fn generate<T, F>(
        &self,
        prompt: &Prompt,
        style: EmailStyle,
        validate: F,
    ) -> Result<ChainOutcome<T>>
    where
        F: Fn(&str) -> Result<T>,
    {
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for slot in &self.providers {
            let name = slot.provider.name();
            debug!(provider = name, %style, "attempting provider");

            let response = with_timeout(slot.timeout, slot.provider.generate(prompt), name).await;

            let response = match response {
                Ok(response) => response,
                Err(error) => {
                    let kind = match &error {
                        ForgeError::Timeout { .. } => FailureKind::Timeout,
                        _ => FailureKind::Transport,
                    };
                    warn!(provider = name, %style, kind = kind.as_str(), %error, "provider failed");
                    failures.push(ProviderFailure::new(name, kind, error.to_string()));
                    continue;
                }
            };

            if response.text.trim().is_empty() {
                warn!(provider = name, %style, "provider returned empty response");
                failures.push(ProviderFailure::new(
                    name,
                    FailureKind::EmptyResponse,
                    "empty response text",
                ));
                continue;
            }

            match validate(&response.text) {
                Ok(value) => {
                    info!(
                        provider = name,
                        model = %response.model,
                        %style,
                        elapsed_ms = response.total_ms,
                        fallbacks = failures.len(),
                        "provider succeeded"
                    );
                    return Ok(ChainOutcome {
                        value,
                        raw: response.text,
                        provider_id: name.to_string(),
                        usage: response.usage,
                        failures,
                    });
                }
                Err(error) => {
                    warn!(provider = name, %style, %error, "provider output failed validation");
                    failures.push(ProviderFailure::new(
                        name,
                        FailureKind::MalformedOutput,
                        error.to_string(),
                    ));
                }
            }
        }

        Err(ForgeError::AllProvidersFailed {
            style,
            attempted: self.providers.len(),
            failures,
        })
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for assembling a chain from mixed sources
pub struct ProviderChainBuilder {
    providers: Vec<ChainedProvider>,
    default_timeout: Duration,
}

impl ProviderChainBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            default_timeout: Duration::from_secs(crate::constants::network::DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Default per-call timeout for providers added without one
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Add a provider from configuration
    pub fn add_provider(mut self, config: &ProviderConfig) -> Result<Self> {
        self.providers.push(ChainedProvider {
            provider: create_provider(config)?,
            priority: config.priority,
            timeout: Duration::from_secs(config.timeout_secs),
        });
        Ok(self)
    }

    /// Add an already-constructed provider at the given priority
    pub fn add_shared(mut self, provider: SharedProvider, priority: u8) -> Self {
        self.providers.push(ChainedProvider {
            provider,
            priority,
            timeout: self.default_timeout,
        });
        self
    }

    pub fn build(self) -> Result<ProviderChain> {
        ProviderChain::new(self.providers)
    }
}

impl Default for ProviderChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmProvider, LlmResponse, OutputShape};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockProvider {
        name: String,
        response: Result<String>,
        calls: AtomicU32,
    }

    impl MockProvider {
        fn ok(name: &str, text: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                response: Ok(text.to_string()),
                calls: AtomicU32::new(0),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                response: Err(ForgeError::LlmApi(format!("{} unreachable", name))),
                calls: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn generate(&self, _prompt: &Prompt) -> Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(LlmResponse::text_only(text.clone())),
                Err(_) => Err(ForgeError::LlmApi(format!("{} unreachable", self.name))),
            }
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "mock"
        }

        fn output_shape(&self) -> OutputShape {
            OutputShape::Labeled
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn test_prompt() -> Prompt {
        Prompt {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    fn accept_all(text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = ProviderChain::new(vec![]).unwrap_err();
        assert!(matches!(err, ForgeError::Config(_)));
    }

    #[test]
    fn test_providers_sorted_by_priority() {
        let chain = ProviderChainBuilder::new()
            .add_shared(MockProvider::ok("third", "c"), 2)
            .add_shared(MockProvider::ok("first", "a"), 0)
            .add_shared(MockProvider::ok("second", "b"), 1)
            .build()
            .unwrap();
        assert_eq!(chain.provider_names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_chain_and_outcome_are_debuggable() {
        let chain = ProviderChainBuilder::new()
            .add_shared(MockProvider::ok("first", "a"), 0)
            .build()
            .unwrap();
        assert!(format!("{:?}", chain).contains("first"));

        let outcome = ChainOutcome {
            value: "parsed".to_string(),
            raw: "raw".to_string(),
            provider_id: "first".to_string(),
            usage: None,
            failures: vec![],
        };
        assert!(format!("{:?}", outcome).contains("provider_id"));
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let first = MockProvider::ok("first", "from first");
        let second = MockProvider::ok("second", "from second");
        let chain = ProviderChainBuilder::new()
            .add_shared(first.clone(), 0)
            .add_shared(second.clone(), 1)
            .build()
            .unwrap();

        let outcome = chain
            .generate(&test_prompt(), EmailStyle::Formal, accept_all)
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "first");
        assert_eq!(outcome.value, "from first");
        assert!(outcome.failures.is_empty());
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fallback_on_transport_error() {
        let first = MockProvider::failing("first");
        let second = MockProvider::ok("second", "from second");
        let chain = ProviderChainBuilder::new()
            .add_shared(first.clone(), 0)
            .add_shared(second, 1)
            .build()
            .unwrap();

        let outcome = chain
            .generate(&test_prompt(), EmailStyle::Formal, accept_all)
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "second");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::Transport);
        assert_eq!(first.call_count(), 1); // exactly one attempt, no retry
    }

    #[tokio::test]
    async fn test_fallback_on_malformed_output() {
        let first = MockProvider::ok("first", "garbage");
        let second = MockProvider::ok("second", "valid");
        let chain = ProviderChainBuilder::new()
            .add_shared(first, 0)
            .add_shared(second, 1)
            .build()
            .unwrap();

        let outcome = chain
            .generate(&test_prompt(), EmailStyle::Casual, |text| {
                if text == "valid" {
                    Ok(text.to_string())
                } else {
                    Err(ForgeError::format("not valid"))
                }
            })
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "second");
        assert_eq!(outcome.failures[0].kind, FailureKind::MalformedOutput);
    }

    #[tokio::test]
    async fn test_empty_response_triggers_fallback() {
        let first = MockProvider::ok("first", "   ");
        let second = MockProvider::ok("second", "real text");
        let chain = ProviderChainBuilder::new()
            .add_shared(first, 0)
            .add_shared(second, 1)
            .build()
            .unwrap();

        let outcome = chain
            .generate(&test_prompt(), EmailStyle::Formal, accept_all)
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "second");
        assert_eq!(outcome.failures[0].kind, FailureKind::EmptyResponse);
    }

    #[tokio::test]
    async fn test_all_providers_failed() {
        let chain = ProviderChainBuilder::new()
            .add_shared(MockProvider::failing("first"), 0)
            .add_shared(MockProvider::failing("second"), 1)
            .build()
            .unwrap();

        let err = chain
            .generate(&test_prompt(), EmailStyle::Formal, accept_all)
            .await
            .unwrap_err();

        match err {
            ForgeError::AllProvidersFailed {
                style,
                attempted,
                failures,
            } => {
                assert_eq!(style, EmailStyle::Formal);
                assert_eq!(attempted, 2);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_classified() {
        struct SlowProvider;

        #[async_trait]
        impl LlmProvider for SlowProvider {
            async fn generate(&self, _prompt: &Prompt) -> Result<LlmResponse> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(LlmResponse::text_only("late"))
            }
            fn name(&self) -> &str {
                "slow"
            }
            fn model(&self) -> &str {
                "mock"
            }
            async fn health_check(&self) -> Result<bool> {
                Ok(true)
            }
        }

        let chain = ProviderChainBuilder::new()
            .with_timeout(Duration::from_millis(10))
            .add_shared(Arc::new(SlowProvider), 0)
            .add_shared(MockProvider::ok("fast", "text"), 1)
            .build()
            .unwrap();

        let outcome = chain
            .generate(&test_prompt(), EmailStyle::Formal, accept_all)
            .await
            .unwrap();

        assert_eq!(outcome.provider_id, "fast");
        assert_eq!(outcome.failures[0].kind, FailureKind::Timeout);
    }
}

//! Generation Service
//!
//! Orchestrates the full template pipeline: sanitize once, build per-style
//! prompts, run the provider chain, and pair the validated variants. The
//! primary operation produces both a formal and a casual variant for one
//! request; the two variants run concurrently and each failure is
//! all-or-nothing (no partial templates).
//!
//! Every chain-level provider failure and every per-style outcome is
//! reported to the metrics sink; metrics failures never affect generation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Config, SanitizerPolicy};
use crate::types::{
    CombinedTemplate, EmailStyle, ForgeError, GenerationRequest, GenerationResult, Result,
};

use super::metrics::{GenerationEvent, GenerationStatus, MetricsSink, NoopMetrics, SharedMetrics};
use super::parser::ResponseParser;
use super::prompt::PromptBuilder;
use super::provider::ProviderChain;
use super::sanitizer::{SanitizedRequest, Sanitizer};
use super::tokenizer::estimate_exchange_tokens;

/// Follow-up email template generation pipeline
pub struct GenerationService {
    sanitizer: Sanitizer,
    policy: SanitizerPolicy,
    prompts: PromptBuilder,
    parser: ResponseParser,
    chain: ProviderChain,
    metrics: SharedMetrics,
}

impl GenerationService {
    /// Service over an already-built chain, with metrics discarded
    pub fn new(chain: ProviderChain, policy: SanitizerPolicy) -> Self {
        Self {
            sanitizer: Sanitizer::new(),
            policy,
            prompts: PromptBuilder::new(),
            parser: ResponseParser::new(),
            chain,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Build the whole pipeline from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider_configs = config.llm.provider_configs();
        if provider_configs.is_empty() {
            return Err(ForgeError::Config(
                "No LLM providers configured. Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or an Ollama host".to_string(),
            ));
        }
        let chain = ProviderChain::from_configs(&provider_configs)?;
        Ok(Self::new(chain, config.sanitizer.clone()))
    }

    /// Attach a metrics sink
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Provider identifiers in fallback order
    pub fn provider_names(&self) -> Vec<&str> {
        self.chain.provider_names()
    }

    /// Generate the paired formal + casual template for one request.
    ///
    /// The request is sanitized exactly once; both variants share the
    /// sanitized fields and run concurrently. Either variant failing fails
    /// the whole call.
    pub async fn generate_template(&self, request: &GenerationRequest) -> Result<CombinedTemplate> {
        let request_id = Uuid::new_v4();
        info!(%request_id, contact = %request.email, "generating combined template");

        let sanitized = self.sanitizer.sanitize_request(request, &self.policy);

        let (formal, casual) = tokio::join!(
            self.generate_variant(&sanitized, EmailStyle::Formal),
            self.generate_variant(&sanitized, EmailStyle::Casual),
        );

        let combined = CombinedTemplate::new(formal?, casual?);
        info!(
            %request_id,
            provider = %combined.provider_id,
            total_tokens = combined.total_tokens,
            "combined template ready"
        );
        Ok(combined)
    }

    /// Generate a single variant in the style carried by the request
    pub async fn generate_one(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let sanitized = self.sanitizer.sanitize_request(request, &self.policy);
        self.generate_variant(&sanitized, request.style).await
    }

    async fn generate_variant(
        &self,
        sanitized: &SanitizedRequest,
        style: EmailStyle,
    ) -> Result<GenerationResult> {
        let prompt = self.prompts.build(sanitized, style);
        let start = Instant::now();

        let outcome = self
            .chain
            .generate(&prompt, style, |raw| self.parser.parse(raw))
            .await;

        match outcome {
            Ok(outcome) => {
                self.report_failures(&outcome.failures);

                let tokens_used = outcome
                    .usage
                    .map(|usage| usage.total())
                    .unwrap_or_else(|| estimate_exchange_tokens(&prompt, &outcome.raw));

                self.metrics.record_generation(GenerationEvent {
                    style,
                    provider: outcome.provider_id.clone(),
                    duration: start.elapsed(),
                    status: GenerationStatus::Success,
                    tokens_used: Some(tokens_used),
                });

                Ok(GenerationResult {
                    subject: outcome.value.subject,
                    body: outcome.value.body,
                    tokens_used,
                    provider_id: outcome.provider_id,
                    style,
                })
            }
            Err(error) => {
                if let ForgeError::AllProvidersFailed { failures, .. } = &error {
                    self.report_failures(failures);
                    for failure in failures {
                        warn!(%style, %failure, "provider failure detail");
                    }
                }

                self.metrics.record_generation(GenerationEvent {
                    style,
                    provider: "none".to_string(),
                    duration: start.elapsed(),
                    status: GenerationStatus::Failure,
                    tokens_used: None,
                });

                Err(error)
            }
        }
    }

    fn report_failures(&self, failures: &[crate::types::ProviderFailure]) {
        for failure in failures {
            self.metrics
                .record_generation_error(failure.kind.as_str(), &failure.provider);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::metrics::MetricsCollector;
    use crate::ai::prompt::Prompt;
    use crate::ai::provider::{
        LlmProvider, LlmResponse, OutputShape, ProviderChainBuilder, SharedProvider,
    };
    use async_trait::async_trait;

    struct ScriptedProvider {
        name: &'static str,
        output: Option<String>,
    }

    impl ScriptedProvider {
        fn valid(name: &'static str) -> SharedProvider {
            let body = "Thanks again for the great conversation last week. \
                        I would love to continue where we left off sometime soon.";
            Arc::new(Self {
                name,
                output: Some(format!("SUBJECT: Following up\nBODY:\n{}", body)),
            })
        }

        fn failing(name: &'static str) -> SharedProvider {
            Arc::new(Self { name, output: None })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(&self, _prompt: &Prompt) -> crate::types::Result<LlmResponse> {
            match &self.output {
                Some(text) => Ok(LlmResponse::text_only(text.clone())),
                None => Err(ForgeError::LlmApi("scripted failure".to_string())),
            }
        }
        fn name(&self) -> &str {
            self.name
        }
        fn model(&self) -> &str {
            "mock"
        }
        fn output_shape(&self) -> OutputShape {
            OutputShape::Labeled
        }
        async fn health_check(&self) -> crate::types::Result<bool> {
            Ok(true)
        }
    }

    fn service(providers: Vec<SharedProvider>) -> GenerationService {
        let mut builder = ProviderChainBuilder::new();
        for (priority, provider) in providers.into_iter().enumerate() {
            builder = builder.add_shared(provider, priority as u8);
        }
        GenerationService::new(builder.build().unwrap(), SanitizerPolicy::default())
    }

    fn request() -> GenerationRequest {
        GenerationRequest::builder("Ada Lovelace", "ada@example.com")
            .company("Analytical Engines Ltd")
            .build()
    }

    #[tokio::test]
    async fn test_combined_template_has_both_styles() {
        let service = service(vec![ScriptedProvider::valid("primary")]);
        let combined = service.generate_template(&request()).await.unwrap();

        assert_eq!(combined.formal.style, EmailStyle::Formal);
        assert_eq!(combined.casual.style, EmailStyle::Casual);
        assert_eq!(combined.provider_id, "primary");
        assert!(combined.total_tokens > 0);
    }

    #[tokio::test]
    async fn test_fallback_reaches_later_provider() {
        let service = service(vec![
            ScriptedProvider::failing("broken"),
            ScriptedProvider::valid("backup"),
        ]);
        let combined = service.generate_template(&request()).await.unwrap();
        assert_eq!(combined.provider_id, "backup");
    }

    #[tokio::test]
    async fn test_all_failures_propagate() {
        let service = service(vec![
            ScriptedProvider::failing("a"),
            ScriptedProvider::failing("b"),
        ]);
        let err = service.generate_template(&request()).await.unwrap_err();
        assert!(matches!(err, ForgeError::AllProvidersFailed { .. }));
    }

    #[tokio::test]
    async fn test_metrics_record_fallback_errors() {
        let collector = Arc::new(MetricsCollector::new());
        let mut builder = ProviderChainBuilder::new();
        builder = builder.add_shared(ScriptedProvider::failing("broken"), 0);
        builder = builder.add_shared(ScriptedProvider::valid("backup"), 1);
        let service = GenerationService::new(builder.build().unwrap(), SanitizerPolicy::default())
            .with_metrics(collector.clone());

        service.generate_template(&request()).await.unwrap();

        let summary = collector.summary();
        // one failed provider per style
        assert_eq!(summary.provider_errors, 2);
        assert_eq!(summary.generations, 2);
        assert_eq!(summary.failures, 0);
    }

    #[tokio::test]
    async fn test_single_variant_honors_request_style() {
        let service = service(vec![ScriptedProvider::valid("primary")]);
        let request = GenerationRequest::builder("Ada", "ada@example.com")
            .style(EmailStyle::Casual)
            .build();
        let result = service.generate_one(&request).await.unwrap();
        assert_eq!(result.style, EmailStyle::Casual);
    }
}

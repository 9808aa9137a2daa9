//! AI Generation Pipeline
//!
//! Everything between an inbound generation request and a validated email
//! template:
//!
//! - `sanitizer`: Scrubs untrusted free-text fields before prompt assembly
//! - `prompt`: Builds the per-style (system, user) prompt pair
//! - `provider`: LLM adapters and the ordered fallback chain
//! - `parser`: Extracts and validates `{subject, body}` from raw output
//! - `tokenizer`: Character-based usage estimation fallback
//! - `metrics`: Outcome reporting sink
//! - `timeout`: Bounded per-call timeout wrapper
//! - `service`: The orchestrating pipeline

pub mod metrics;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod sanitizer;
pub mod service;
pub mod timeout;
pub mod tokenizer;

pub use metrics::{GenerationEvent, GenerationStatus, MetricsCollector, MetricsSink, NoopMetrics, SharedMetrics};
pub use parser::{ParsedEmail, ResponseParser};
pub use prompt::{Prompt, PromptBuilder};
pub use provider::{
    LlmProvider, LlmResponse, OutputShape, ProviderChain, ProviderChainBuilder, ProviderConfig,
    SharedProvider, TokenUsage, create_provider,
};
pub use sanitizer::{SanitizedField, SanitizedRequest, Sanitizer};
pub use service::GenerationService;
pub use timeout::with_timeout;
pub use tokenizer::estimate_exchange_tokens;

//! Unified Error Type System
//!
//! Centralized error types for the whole crate, following the propagation
//! policy of the generation pipeline:
//!
//! - **SanitizationEvent**: not an error at all; neutralizations are logged
//!   and generation proceeds.
//! - **ProviderFailure**: recorded per adapter inside the fallback chain,
//!   never surfaced directly to callers.
//! - **AllProvidersFailed**: the only generation error crossing the subsystem
//!   boundary; its display message does not leak provider error bodies, but
//!   the failures are preserved on the variant for logging.
//! - **ResponseFormat**: unparsable or out-of-bounds model output; treated by
//!   the chain exactly like a transport failure (unparsable output is as good
//!   as no output).
//! - **Config**: startup-time misconfiguration, raised before any request is
//!   accepted.

use std::time::Duration;
use thiserror::Error;

use super::EmailStyle;

// =============================================================================
// Provider Failure
// =============================================================================

/// Classification of a single adapter's failure inside the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bounded per-call timeout exceeded
    Timeout,
    /// HTTP/transport-level error, including non-2xx responses
    Transport,
    /// Wire-level success but no usable text in the response
    EmptyResponse,
    /// Raw output could not be parsed into a valid subject/body pair
    MalformedOutput,
}

impl FailureKind {
    /// Stable identifier used as the `error_type` metrics dimension
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::EmptyResponse => "empty_response",
            Self::MalformedOutput => "malformed_output",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provider's recorded failure during fallback.
///
/// Kept for logging and metrics; never included in caller-facing messages.
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    /// Provider identifier (stable string, e.g. a model backend name)
    pub provider: String,
    /// Failure classification
    pub kind: FailureKind,
    /// Upstream error detail, for logs only
    pub message: String,
}

impl ProviderFailure {
    pub fn new(provider: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.kind, self.message)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ForgeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Generation Errors
    // -------------------------------------------------------------------------
    /// Transport/API-level provider error
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Model output failed parsing or shape validation
    #[error("Response format error: {0}")]
    ResponseFormat(String),

    /// Every configured adapter failed for one style.
    ///
    /// The display message deliberately omits per-provider error bodies;
    /// callers log the preserved `failures` instead.
    #[error("all {attempted} providers failed for {style} generation")]
    AllProvidersFailed {
        style: EmailStyle,
        attempted: usize,
        failures: Vec<ProviderFailure>,
    },
}

impl ForgeError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a response-format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::ResponseFormat(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

// =============================================================================
// Tests
// =============================================================================

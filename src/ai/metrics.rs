//! Generation Metrics
//!
//! Fire-and-forget outcome reporting for the generation pipeline. The sink
//! trait is the boundary to the (external) metrics backend: implementations
//! must never block or fail the generation path. One event is recorded per
//! style per attempt, plus a distinct error event per provider-level failure
//! during fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use crate::types::EmailStyle;

// =============================================================================
// Sink Interface
// =============================================================================

/// Outcome of one style generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    Success,
    Failure,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One recorded generation attempt
#[derive(Debug, Clone)]
pub struct GenerationEvent {
    pub style: EmailStyle,
    /// Winning provider id, or "none" when every provider failed
    pub provider: String,
    pub duration: Duration,
    pub status: GenerationStatus,
    /// Reported or estimated tokens; absent on failure
    pub tokens_used: Option<u32>,
}

/// Metrics collaborator interface. Implementations are fire-and-forget.
pub trait MetricsSink: Send + Sync {
    /// Record the outcome of one style generation attempt
    fn record_generation(&self, event: GenerationEvent);

    /// Record one provider-level failure observed during fallback
    fn record_generation_error(&self, error_type: &str, provider: &str);
}

/// Shared metrics sink handle
pub type SharedMetrics = Arc<dyn MetricsSink>;

/// Sink that discards everything; useful default and test stand-in
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_generation(&self, _event: GenerationEvent) {}
    fn record_generation_error(&self, _error_type: &str, _provider: &str) {}
}

// =============================================================================
// In-Process Collector
// =============================================================================

/// Thread-safe in-process collector.
///
/// Uses atomic counters for minimal contention across concurrent
/// generations; suitable for exposing process-level counters until a real
/// metrics backend is wired in by the API layer.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    generations: AtomicU32,
    failures: AtomicU32,
    provider_errors: AtomicU32,
    total_tokens: AtomicU64,
    total_duration_ms: AtomicU64,
}

/// Snapshot of collected counters
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub generations: u32,
    pub failures: u32,
    pub provider_errors: u32,
    pub total_tokens: u64,
    pub avg_duration_ms: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters snapshot
    pub fn summary(&self) -> MetricsSummary {
        let generations = self.generations.load(Ordering::Relaxed);
        let total_duration = self.total_duration_ms.load(Ordering::Relaxed);

        let avg_duration_ms = if generations > 0 {
            total_duration as f64 / generations as f64
        } else {
            0.0
        };

        MetricsSummary {
            generations,
            failures: self.failures.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
            avg_duration_ms,
        }
    }
}

impl MetricsSink for MetricsCollector {
    fn record_generation(&self, event: GenerationEvent) {
        self.generations.fetch_add(1, Ordering::Relaxed);
        if event.status == GenerationStatus::Failure {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(tokens) = event.tokens_used {
            self.total_tokens.fetch_add(tokens as u64, Ordering::Relaxed);
        }
        self.total_duration_ms
            .fetch_add(event.duration.as_millis() as u64, Ordering::Relaxed);
    }

    fn record_generation_error(&self, _error_type: &str, _provider: &str) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }
}

// =============================================================================
// Tests
// =============================================================================

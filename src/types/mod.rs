//! Domain Types
//!
//! Core data model for follow-up email generation: requests, styles, and the
//! results returned to the API layer. All free-text request fields are
//! untrusted until they pass through the sanitizer; a request is immutable
//! once built.

pub mod error;

pub use error::{FailureKind, ForgeError, ProviderFailure, Result};

use serde::{Deserialize, Serialize};

// =============================================================================
// Email Style
// =============================================================================

/// Output persona requested for one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailStyle {
    /// Professional tone, full salutations
    #[default]
    Formal,
    /// Friendly, conversational tone
    Casual,
}

impl std::fmt::Display for EmailStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailStyle::Formal => write!(f, "formal"),
            EmailStyle::Casual => write!(f, "casual"),
        }
    }
}

impl std::str::FromStr for EmailStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "formal" => Ok(EmailStyle::Formal),
            "casual" => Ok(EmailStyle::Casual),
            _ => Err(format!(
                "Unknown email style: {}. Valid values: formal, casual",
                s
            )),
        }
    }
}

// =============================================================================
// Generation Request
// =============================================================================

/// Inbound generation request from the API layer.
///
/// Name and email are required; everything else is optional context. All
/// free-text fields are treated as untrusted until sanitized. Build via
/// [`GenerationRequest::builder`]; the request is not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Contact name (required)
    pub name: String,
    /// Contact email (required)
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Free-text notes about the contact
    #[serde(default)]
    pub notes: Option<String>,
    /// Link to the contact's profile page
    #[serde(default)]
    pub profile_url: Option<String>,
    /// Ordered prior conversation snippets, oldest first
    #[serde(default)]
    pub history: Vec<String>,
    /// Free-text additional context for this generation
    #[serde(default)]
    pub additional_context: Option<String>,
    /// Requested style for single-variant generation
    #[serde(default)]
    pub style: EmailStyle,
}

impl GenerationRequest {
    pub fn builder(name: impl Into<String>, email: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            request: GenerationRequest {
                name: name.into(),
                email: email.into(),
                company: None,
                role: None,
                priority: None,
                notes: None,
                profile_url: None,
                history: Vec::new(),
                additional_context: None,
                style: EmailStyle::default(),
            },
        }
    }
}

/// Builder for [`GenerationRequest`]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.request.company = Some(company.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.request.role = Some(role.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.request.priority = Some(priority.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.request.notes = Some(notes.into());
        self
    }

    pub fn profile_url(mut self, url: impl Into<String>) -> Self {
        self.request.profile_url = Some(url.into());
        self
    }

    pub fn history_entry(mut self, entry: impl Into<String>) -> Self {
        self.request.history.push(entry.into());
        self
    }

    pub fn history(mut self, entries: Vec<String>) -> Self {
        self.request.history = entries;
        self
    }

    pub fn additional_context(mut self, context: impl Into<String>) -> Self {
        self.request.additional_context = Some(context.into());
        self
    }

    pub fn style(mut self, style: EmailStyle) -> Self {
        self.request.style = style;
        self
    }

    pub fn build(self) -> GenerationRequest {
        self.request
    }
}

// =============================================================================
// Generation Results
// =============================================================================

/// One validated email variant produced by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Subject line, 5-200 characters
    pub subject: String,
    /// Email body, 50-2000 characters
    pub body: String,
    /// Tokens consumed by this variant (provider-reported or estimated)
    pub tokens_used: u32,
    /// Provider that produced this variant
    pub provider_id: String,
    /// Style this variant was generated for
    pub style: EmailStyle,
}

impl GenerationResult {
    /// Body split into blank-line-separated paragraph units.
    ///
    /// No other markup is inferred.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.body
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Paired formal/casual result returned to the API layer.
///
/// The attached provider id is the one that produced the formal variant; the
/// two variants are not required to come from the same provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedTemplate {
    pub formal: GenerationResult,
    pub casual: GenerationResult,
    /// Provider of the formal variant
    pub provider_id: String,
    /// Summed token usage across both variants
    pub total_tokens: u32,
}

impl CombinedTemplate {
    pub fn new(formal: GenerationResult, casual: GenerationResult) -> Self {
        let provider_id = formal.provider_id.clone();
        let total_tokens = formal.tokens_used + casual.tokens_used;
        Self {
            formal,
            casual,
            provider_id,
            total_tokens,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_round_trip() {
        assert_eq!(EmailStyle::Formal.to_string(), "formal");
        assert_eq!("CASUAL".parse::<EmailStyle>().unwrap(), EmailStyle::Casual);
        assert!("shouty".parse::<EmailStyle>().is_err());
    }

    #[test]
    fn test_request_builder_minimal() {
        let request = GenerationRequest::builder("Ada Lovelace", "ada@example.com").build();
        assert_eq!(request.name, "Ada Lovelace");
        assert!(request.company.is_none());
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_request_builder_full() {
        let request = GenerationRequest::builder("Ada", "ada@example.com")
            .company("Analytical Engines Ltd")
            .role("CTO")
            .priority("high")
            .notes("met at conference")
            .history_entry("Discussed the Q3 roadmap")
            .history_entry("Sent intro deck")
            .style(EmailStyle::Casual)
            .build();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.style, EmailStyle::Casual);
    }

    #[test]
    fn test_combined_template_sums_tokens_and_takes_formal_provider() {
        let formal = GenerationResult {
            subject: "Following up".to_string(),
            body: "b".repeat(60),
            tokens_used: 120,
            provider_id: "openai".to_string(),
            style: EmailStyle::Formal,
        };
        let casual = GenerationResult {
            subject: "Hey there".to_string(),
            body: "b".repeat(60),
            tokens_used: 80,
            provider_id: "anthropic".to_string(),
            style: EmailStyle::Casual,
        };
        let combined = CombinedTemplate::new(formal, casual);
        assert_eq!(combined.provider_id, "openai");
        assert_eq!(combined.total_tokens, 200);
    }

    #[test]
    fn test_paragraph_units() {
        let result = GenerationResult {
            subject: "Subject".to_string(),
            body: "First paragraph.\n\nSecond paragraph.\n\n\nThird.".to_string(),
            tokens_used: 1,
            provider_id: "test".to_string(),
            style: EmailStyle::Formal,
        };
        let paragraphs = result.paragraphs();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0], "First paragraph.");
    }
}

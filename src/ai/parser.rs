//! Response Parsing and Validation
//!
//! Extracts a `{subject, body}` pair from raw model output and validates it
//! against the email shape constraints. Two shapes are accepted:
//!
//! - A JSON object with `subject`/`body` keys, optionally inside a fenced
//!   code block
//! - Labeled plain text (`SUBJECT: ...` / `BODY: ...`), body possibly
//!   multi-paragraph and terminated by end of text
//!
//! Plain text without a `SUBJECT:` marker falls back to the default subject
//! with the whole text as body; a usable email is still recoverable, so this
//! is deliberately permissive. Out-of-bounds or missing body is a hard
//! `ResponseFormat` error, never silently coerced.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::constants::email;
use crate::types::{ForgeError, Result};

static SUBJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*subject\s*:\s*(.*)$").expect("static subject pattern must compile")
});

static BODY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*body\s*:\s*").expect("static body pattern must compile")
});

/// A validated subject/body pair; style and provider are attached by the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEmail {
    pub subject: String,
    pub body: String,
}

/// Parser for semi-structured model output
#[derive(Debug, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw model output into a validated email.
    pub fn parse(&self, raw: &str) -> Result<ParsedEmail> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(ForgeError::format("empty response text"));
        }

        let email = match self.try_json(text) {
            Some(result) => result?,
            None => self.parse_labeled(text),
        };

        self.validate(email)
    }

    /// Attempt the JSON shape. Returns `None` when the text is not JSON at
    /// all, in which case the labeled-text shape applies.
    fn try_json(&self, text: &str) -> Option<Result<ParsedEmail>> {
        let candidate = extract_json_candidate(text)?;
        let value: Value = serde_json::from_str(candidate).ok()?;
        let object = value.as_object()?;

        debug!("parsing JSON-shaped response");

        let body = match object.get("body").and_then(Value::as_str) {
            Some(body) => body.trim().to_string(),
            None => {
                return Some(Err(ForgeError::format(
                    "JSON response missing string 'body' field",
                )));
            }
        };

        let subject = object
            .get("subject")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| email::DEFAULT_SUBJECT.to_string());

        Some(Ok(ParsedEmail { subject, body }))
    }

    /// Parse the labeled plain-text shape.
    fn parse_labeled(&self, text: &str) -> ParsedEmail {
        if let Some(captures) = SUBJECT_LINE.captures(text) {
            let subject = captures
                .get(1)
                .map_or("", |m| m.as_str())
                .trim()
                .to_string();
            let subject_end = captures.get(0).map_or(0, |m| m.end());

            // Body: everything after the BODY: marker if present, otherwise
            // everything after the subject line
            let body = match BODY_MARKER.find(text) {
                Some(marker) if marker.start() >= subject_end => text[marker.end()..].trim(),
                _ => text[subject_end..].trim(),
            };

            ParsedEmail {
                subject,
                body: body.to_string(),
            }
        } else {
            // Permissive fallback: the whole text is still a usable body
            debug!("no SUBJECT marker in response, using default subject");
            ParsedEmail {
                subject: email::DEFAULT_SUBJECT.to_string(),
                body: text.to_string(),
            }
        }
    }

    /// Enforce subject/body length bounds as hard failures.
    fn validate(&self, email: ParsedEmail) -> Result<ParsedEmail> {
        let subject_chars = email.subject.chars().count();
        if !(email::SUBJECT_MIN_CHARS..=email::SUBJECT_MAX_CHARS).contains(&subject_chars) {
            return Err(ForgeError::format(format!(
                "subject length {} outside {}-{} characters",
                subject_chars,
                email::SUBJECT_MIN_CHARS,
                email::SUBJECT_MAX_CHARS
            )));
        }

        let body_chars = email.body.chars().count();
        if !(email::BODY_MIN_CHARS..=email::BODY_MAX_CHARS).contains(&body_chars) {
            return Err(ForgeError::format(format!(
                "body length {} outside {}-{} characters",
                body_chars,
                email::BODY_MIN_CHARS,
                email::BODY_MAX_CHARS
            )));
        }

        Ok(email)
    }
}

/// Pull a JSON object candidate out of raw text: either a fenced ```json
/// block or a top-level brace-delimited object. Returns `None` when no
/// object is present.
fn extract_json_candidate(text: &str) -> Option<&str> {
    if let Some(fence_start) = text.find("```") {
        let after_fence = &text[fence_start + 3..];
        let content_start = after_fence.find('\n')?;
        let content = &after_fence[content_start + 1..];
        let fence_end = content.find("```")?;
        let candidate = content[..fence_end].trim();
        if candidate.starts_with('{') {
            return Some(candidate);
        }
    }

    if text.starts_with('{') {
        let end = text.rfind('}')?;
        return Some(&text[..=end]);
    }

    None
}

// =============================================================================
// Tests
// =============================================================================

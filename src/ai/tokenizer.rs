//! Token Usage Estimation
//!
//! Providers that report token usage are taken at their word; for the rest,
//! usage is approximated from character counts over the full exchanged text
//! (prompt + response). An approximation for metering, not a
//! tokenizer-accurate count.

use crate::constants::tokens::CHARS_PER_TOKEN;

use super::prompt::Prompt;

/// Estimate tokens for a full exchange when the provider reported none:
/// `ceil(total_chars / 4)` over system prompt, user prompt, and response.
pub fn estimate_exchange_tokens(prompt: &Prompt, response: &str) -> u32 {
    let total = prompt.char_count() + response.chars().count();
    total.div_ceil(CHARS_PER_TOKEN) as u32
}

// =============================================================================
// Tests
// =============================================================================

//! MailForge - AI follow-up email template generator for CRM backends
//!
//! Turns a contact record plus conversation history into a paired
//! formal/casual follow-up email template. Untrusted free-text fields are
//! sanitized before prompt assembly, generation runs through an ordered
//! multi-provider fallback chain, and every variant is validated against
//! fixed subject/body shape constraints before it is returned.
//!
//! # Architecture
//!
//! - **types**: Domain model (requests, styles, results) and the unified
//!   error type
//! - **config**: Layered configuration (defaults, TOML files, env vars)
//! - **ai**: The generation pipeline (sanitizer, prompts, provider chain,
//!   parser, metrics)

pub mod ai;
pub mod config;
pub mod constants;
pub mod types;

pub use ai::GenerationService;
pub use config::{Config, ConfigLoader, SanitizerPolicy};
pub use types::{
    CombinedTemplate, EmailStyle, ForgeError, GenerationRequest, GenerationResult, Result,
};

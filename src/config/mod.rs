//! Configuration
//!
//! Provider credentials, generation settings, and sanitizer policy.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{Config, LlmConfig, SanitizerPolicy};

//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Sanitizer constants
pub mod sanitizer {
    /// Marker inserted in place of a neutralized injection attempt.
    ///
    /// The presence of tampering stays visible to the model as inert data
    /// instead of disappearing without trace.
    pub const MARKER: &str = "[filtered]";

    /// Default max length for short identity fields (name, email, company, role)
    pub const MAX_IDENTITY_CHARS: usize = 100;

    /// Default max length for free-text notes
    pub const MAX_NOTES_CHARS: usize = 1000;

    /// Default max length for the additional-context field
    pub const MAX_CONTEXT_CHARS: usize = 2000;

    /// Default max length for a single conversation-history entry
    pub const MAX_HISTORY_ENTRY_CHARS: usize = 500;

    /// Maximum conversation-history entries included in a prompt
    pub const MAX_HISTORY_ENTRIES: usize = 20;
}

/// Email shape constraints enforced by the response parser
pub mod email {
    /// Minimum subject length (characters)
    pub const SUBJECT_MIN_CHARS: usize = 5;

    /// Maximum subject length (characters)
    pub const SUBJECT_MAX_CHARS: usize = 200;

    /// Minimum body length (characters)
    pub const BODY_MIN_CHARS: usize = 50;

    /// Maximum body length (characters)
    pub const BODY_MAX_CHARS: usize = 2000;

    /// Subject used when a plain-text response carries no SUBJECT: marker
    pub const DEFAULT_SUBJECT: &str = "Follow-up";
}

/// Token estimation constants
pub mod tokens {
    /// Approximate characters per model token for English prose
    pub const CHARS_PER_TOKEN: usize = 4;
}

/// HTTP/Network constants
pub mod network {
    /// Default per-provider request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;
}

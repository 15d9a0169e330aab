//! Commands run from assistant lifecycle hooks.
//!
//! - [`session_log`] condenses a JSONL conversation transcript into a dated
//!   markdown session log.
//! - [`episodic`] appends one JSON episode per tool call to the memory tree
//!   and flags recognizable completions so follow-on skills can be chained.
//!
//! Both read the hook payload that the assistant writes to stdin
//! ([`HookInput`]); every field is optional and missing values fall back to
//! sensible defaults.

#![deny(unsafe_code)]

pub mod episodic;
pub mod input;
pub mod session_log;
pub mod transcript;

pub use episodic::{
    detect_completion, CompletionEvent, CompletionRule, EpisodeOutcome, EpisodeRecord,
    EpisodicLogger, PendingTrigger, COMPLETION_RULES,
};
pub use input::{parse_hook_input, HookInput};
pub use session_log::{SessionLogRequest, SessionLogger};
pub use transcript::{collect_insights, read_transcript, TranscriptInsights};

/// Version stamped into session logs and episodes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

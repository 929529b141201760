//! The bait persona: scam keyword triage plus staged canned replies.

pub mod picker;
pub mod responder;

pub use picker::{ReplyPicker, SeededPicker, ThreadRngPicker};
pub use responder::{
    EscalationStage, KeywordSet, ReplyCategory, ReplyPools, ScamResponder, Verdict,
};

use crate::config::PersonaConfig;
use std::sync::Arc;

/// Create a responder that samples replies from the thread-local RNG.
pub fn create_responder(config: &PersonaConfig) -> ScamResponder {
    ScamResponder::from_config(config, Arc::new(ThreadRngPicker))
}

//! Request core: normalize, count, respond.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::normalize::InboundMessage;
use crate::config::PersonaConfig;
use crate::persona::{self, ScamResponder};
use crate::sessions::{self, SessionTracker};

/// Reply used when processing faults; fixed regardless of persona config.
pub const FALLBACK_REPLY: &str = "Okay.";

/// Body returned for every processed honeypot request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotReply {
    pub status: String,
    pub scam_detected: bool,
    pub message_count: u64,
    pub reply: String,
}

impl HoneypotReply {
    pub fn success(scam_detected: bool, message_count: u64, reply: String) -> Self {
        Self {
            status: "success".into(),
            scam_detected,
            message_count,
            reply,
        }
    }

    /// The safe default served when the core fails.
    pub fn fallback() -> Self {
        Self::success(false, 1, FALLBACK_REPLY.into())
    }
}

/// Owns the session registry and the persona; one instance serves all requests.
pub struct RequestProcessor {
    tracker: Arc<dyn SessionTracker>,
    responder: ScamResponder,
    default_session_id: String,
}

impl RequestProcessor {
    pub fn new(
        tracker: Arc<dyn SessionTracker>,
        responder: ScamResponder,
        default_session_id: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            responder,
            default_session_id: default_session_id.into(),
        }
    }

    /// In-memory sessions and a thread-RNG persona built from `config`.
    pub fn from_config(config: &PersonaConfig) -> Self {
        Self::new(
            Arc::from(sessions::create_session_tracker()),
            persona::create_responder(config),
            config.default_session_id.clone(),
        )
    }

    /// Run the core over a decoded body. Errors only come from the session backend.
    pub fn process(&self, body: &Value) -> Result<HoneypotReply> {
        let message = InboundMessage::normalize(body, &self.default_session_id);
        let count = self.tracker.touch(&message.session_id)?;
        let verdict = self.responder.respond(&message.text, count);

        tracing::debug!(
            session = %message.session_id,
            count,
            scam = verdict.scam_detected,
            category = verdict.category.as_str(),
            "honeypot reply selected"
        );

        Ok(HoneypotReply::success(
            verdict.scam_detected,
            count,
            verdict.reply,
        ))
    }

    /// [`process`](Self::process) behind a guard: any error or panic yields
    /// [`HoneypotReply::fallback`].
    pub fn handle(&self, body: &Value) -> HoneypotReply {
        match catch_unwind(AssertUnwindSafe(|| self.process(body))) {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "honeypot processing failed, serving fallback");
                HoneypotReply::fallback()
            }
            Err(_) => {
                tracing::warn!("honeypot processing panicked, serving fallback");
                HoneypotReply::fallback()
            }
        }
    }

    pub fn tracker(&self) -> &dyn SessionTracker {
        self.tracker.as_ref()
    }

    pub fn responder(&self) -> &ScamResponder {
        &self.responder
    }
}

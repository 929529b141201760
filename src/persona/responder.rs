//! Scam triage and canned-reply selection.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::picker::ReplyPicker;
use crate::config::PersonaConfig;

/// Which pool a reply was drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReplyCategory {
    Confused,
    Helper,
    Otp,
    Link,
    Neutral,
}

impl ReplyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confused => "confused",
            Self::Helper => "helper",
            Self::Otp => "otp",
            Self::Link => "link",
            Self::Neutral => "neutral",
        }
    }
}

/// Escalation stage of a session, derived only from its interaction count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EscalationStage {
    New,
    Early,
    Late,
}

impl EscalationStage {
    /// `0` is `New`, `1..late_from` is `Early`, anything from `late_from` on is `Late`.
    pub fn from_count(count: u64, late_from: u64) -> Self {
        if count == 0 {
            Self::New
        } else if count < late_from {
            Self::Early
        } else {
            Self::Late
        }
    }
}

/// Lower-cased substring set. Empty entries are dropped so nothing matches vacuously.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// True iff `text` (already lower-cased) contains at least one keyword.
    pub fn matches(&self, text: &str) -> bool {
        !text.is_empty() && self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Immutable reply pools, one per non-neutral category.
#[derive(Debug, Clone)]
pub struct ReplyPools {
    pub confused: Vec<String>,
    pub helper: Vec<String>,
    pub otp: Vec<String>,
    pub link: Vec<String>,
}

impl ReplyPools {
    pub fn get(&self, category: ReplyCategory) -> &[String] {
        match category {
            ReplyCategory::Confused => &self.confused,
            ReplyCategory::Helper => &self.helper,
            ReplyCategory::Otp => &self.otp,
            ReplyCategory::Link => &self.link,
            ReplyCategory::Neutral => &[],
        }
    }
}

/// Outcome of running the persona over one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub scam_detected: bool,
    pub category: ReplyCategory,
    pub reply: String,
}

/// Picks a persona reply from the message text and the session's interaction count.
///
/// Never fails: a non-scam message, or a category whose pool is empty, gets
/// the neutral reply.
pub struct ScamResponder {
    scam_keywords: KeywordSet,
    otp_triggers: KeywordSet,
    link_triggers: KeywordSet,
    helper_after_messages: u64,
    neutral_reply: String,
    pools: ReplyPools,
    picker: Arc<dyn ReplyPicker>,
}

impl ScamResponder {
    pub fn from_config(config: &PersonaConfig, picker: Arc<dyn ReplyPicker>) -> Self {
        tracing::debug!(
            picker = picker.name(),
            keywords = config.scam_keywords.len(),
            helper_after = config.helper_after_messages,
            "persona ready"
        );
        Self {
            scam_keywords: KeywordSet::new(&config.scam_keywords),
            otp_triggers: KeywordSet::new(&config.otp_triggers),
            link_triggers: KeywordSet::new(&config.link_triggers),
            helper_after_messages: config.helper_after_messages,
            neutral_reply: config.neutral_reply.clone(),
            pools: ReplyPools {
                confused: config.replies.confused.clone(),
                helper: config.replies.helper.clone(),
                otp: config.replies.otp.clone(),
                link: config.replies.link.clone(),
            },
            picker,
        }
    }

    /// Name of the reply sampler, for logs.
    pub fn picker_name(&self) -> &str {
        self.picker.name()
    }

    pub fn is_scam(&self, text: &str) -> bool {
        self.scam_keywords.matches(text)
    }

    /// Select the reply category without sampling.
    ///
    /// Priority for scam messages: OTP triggers, then link triggers, then the
    /// escalation stage decides between confused and helper.
    pub fn classify(&self, text: &str, count: u64) -> ReplyCategory {
        if !self.is_scam(text) {
            return ReplyCategory::Neutral;
        }
        if self.otp_triggers.matches(text) {
            return ReplyCategory::Otp;
        }
        if self.link_triggers.matches(text) {
            return ReplyCategory::Link;
        }
        match EscalationStage::from_count(count, self.helper_after_messages) {
            EscalationStage::New | EscalationStage::Early => ReplyCategory::Confused,
            EscalationStage::Late => ReplyCategory::Helper,
        }
    }

    /// Classify `text` (already lower-cased) and draw a reply from the matching pool.
    pub fn respond(&self, text: &str, count: u64) -> Verdict {
        let scam_detected = self.is_scam(text);
        let category = self.classify(text, count);
        let pool = self.pools.get(category);

        if pool.is_empty() {
            return Verdict {
                scam_detected,
                category: ReplyCategory::Neutral,
                reply: self.neutral_reply.clone(),
            };
        }

        let idx = self.picker.pick(pool.len()).min(pool.len() - 1);
        Verdict {
            scam_detected,
            category,
            reply: pool[idx].clone(),
        }
    }

    pub fn neutral_reply(&self) -> &str {
        &self.neutral_reply
    }

    pub fn pools(&self) -> &ReplyPools {
        &self.pools
    }

    pub fn scam_keywords(&self) -> &KeywordSet {
        &self.scam_keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::picker::SeededPicker;

    /// Always returns the same index, clamped by the responder.
    struct FixedPicker(usize);

    impl ReplyPicker for FixedPicker {
        fn pick(&self, _len: usize) -> usize {
            self.0
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn responder() -> ScamResponder {
        ScamResponder::from_config(&PersonaConfig::default(), Arc::new(SeededPicker::new(1)))
    }

    fn in_pool(responder: &ScamResponder, category: ReplyCategory, reply: &str) -> bool {
        responder.pools().get(category).iter().any(|r| r == reply)
    }

    #[test]
    fn escalation_stage_boundaries() {
        assert_eq!(EscalationStage::from_count(0, 3), EscalationStage::New);
        assert_eq!(EscalationStage::from_count(1, 3), EscalationStage::Early);
        assert_eq!(EscalationStage::from_count(2, 3), EscalationStage::Early);
        assert_eq!(EscalationStage::from_count(3, 3), EscalationStage::Late);
        assert_eq!(EscalationStage::from_count(300, 3), EscalationStage::Late);
    }

    #[test]
    fn empty_text_is_never_scam() {
        let r = responder();
        assert!(!r.is_scam(""));
        let verdict = r.respond("", 5);
        assert!(!verdict.scam_detected);
        assert_eq!(verdict.category, ReplyCategory::Neutral);
        assert_eq!(verdict.reply, "Okay.");
    }

    #[test]
    fn every_configured_keyword_triggers_detection() {
        let r = responder();
        for keyword in PersonaConfig::default().scam_keywords {
            let text = format!("hello there {keyword} friend");
            assert!(r.is_scam(&text), "{keyword} should be detected");
        }
    }

    #[test]
    fn text_without_keywords_gets_neutral_reply() {
        let r = responder();
        let verdict = r.respond("good morning, how are you?", 1);
        assert!(!verdict.scam_detected);
        assert_eq!(verdict.reply, "Okay.");
    }

    #[test]
    fn keywords_match_as_substrings() {
        let r = responder();
        assert!(r.is_scam("your bankaccount"));
        assert!(r.is_scam("reverify"));
    }

    #[test]
    fn generic_scam_is_confused_before_threshold_and_helper_after() {
        let r = responder();
        let text = "your account is blocked, verify now";

        for count in [1, 2] {
            let verdict = r.respond(text, count);
            assert!(verdict.scam_detected);
            assert_eq!(verdict.category, ReplyCategory::Confused);
            assert!(in_pool(&r, ReplyCategory::Confused, &verdict.reply));
        }
        for count in [3, 4, 50] {
            let verdict = r.respond(text, count);
            assert_eq!(verdict.category, ReplyCategory::Helper);
            assert!(in_pool(&r, ReplyCategory::Helper, &verdict.reply));
        }
    }

    #[test]
    fn otp_trigger_outranks_link_and_stage() {
        let r = responder();
        let text = "share the otp code and click this link";
        for count in [1, 10] {
            let verdict = r.respond(text, count);
            assert_eq!(verdict.category, ReplyCategory::Otp);
            assert!(in_pool(&r, ReplyCategory::Otp, &verdict.reply));
        }
    }

    #[test]
    fn code_alone_needs_a_scam_keyword() {
        let r = responder();
        assert_eq!(r.classify("send me the code", 1), ReplyCategory::Neutral);
        assert_eq!(r.classify("bank code please", 1), ReplyCategory::Otp);
    }

    #[test]
    fn link_trigger_outranks_stage() {
        let r = responder();
        for count in [1, 9] {
            assert_eq!(
                r.classify("urgent: open http://x.example now", count),
                ReplyCategory::Link
            );
            assert_eq!(r.classify("click to claim reward", count), ReplyCategory::Link);
        }
    }

    #[test]
    fn keyword_list_is_configuration() {
        let mut config = PersonaConfig::default();
        config.scam_keywords = vec!["LOTTERY".into()];
        let r = ScamResponder::from_config(&config, Arc::new(SeededPicker::new(3)));

        assert!(r.is_scam("you won the lottery"));
        assert!(!r.is_scam("your account is blocked"));
    }

    #[test]
    fn custom_threshold_moves_helper_switch() {
        let mut config = PersonaConfig::default();
        config.helper_after_messages = 1;
        let r = ScamResponder::from_config(&config, Arc::new(SeededPicker::new(3)));
        assert_eq!(r.classify("bank blocked", 1), ReplyCategory::Helper);
    }

    #[test]
    fn out_of_range_pick_is_clamped() {
        let r = ScamResponder::from_config(&PersonaConfig::default(), Arc::new(FixedPicker(99)));
        let verdict = r.respond("bank blocked", 1);
        let pool = r.pools().get(ReplyCategory::Confused);
        assert_eq!(&verdict.reply, pool.last().unwrap());
    }

    #[test]
    fn empty_pool_falls_back_to_neutral() {
        let mut config = PersonaConfig::default();
        config.replies.link.clear();
        let r = ScamResponder::from_config(&config, Arc::new(FixedPicker(0)));
        let verdict = r.respond("click the link", 1);
        assert!(verdict.scam_detected);
        assert_eq!(verdict.category, ReplyCategory::Neutral);
        assert_eq!(verdict.reply, "Okay.");
    }

    #[test]
    fn picker_name_reports_injected_sampler() {
        let r = ScamResponder::from_config(&PersonaConfig::default(), Arc::new(SeededPicker::new(5)));
        assert_eq!(r.picker_name(), "seeded");
        assert_eq!(crate::persona::create_responder(&PersonaConfig::default()).picker_name(), "thread_rng");
    }

    #[test]
    fn fixed_picker_selects_exact_reply() {
        let r = ScamResponder::from_config(&PersonaConfig::default(), Arc::new(FixedPicker(1)));
        let verdict = r.respond("verify your upi", 1);
        assert_eq!(verdict.reply, PersonaConfig::default().replies.confused[1]);
    }

    #[test]
    fn keyword_set_drops_blank_entries() {
        let set = KeywordSet::new(["", "  ", "Bank"]);
        assert_eq!(set.keywords(), &["bank".to_string()]);
        assert!(!set.matches("anything at all"));
    }
}

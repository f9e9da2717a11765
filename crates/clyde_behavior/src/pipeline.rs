//! Behavior pipeline: ordered rules, first match wins.
//!
//! Messages from the cat go to the cat tracker instead of the rules. Every
//! reply is then held to the triggering channel's policy: a silent channel
//! hears nothing back, whichever path produced the reply.

use crate::rule::{BehaviorRule, RuleOutcome};
use crate::rules::seed_rules;
use crate::session::Session;
use chrono::{DateTime, Utc};
use clyde_core::text::normalize_whitespace;
use clyde_core::{ChannelPolicy, Incoming, Reply};

/// Name reported when the cat tracker handled a message.
pub const CAT_RULE: &str = "cat";

/// Result of dispatching one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// The rule that matched, if any.
    pub rule: Option<String>,
    pub replies: Vec<Reply>,
}

impl Dispatch {
    pub fn matched(&self) -> bool {
        self.rule.is_some()
    }
}

pub struct BehaviorPipeline {
    rules: Vec<BehaviorRule>,
}

impl BehaviorPipeline {
    pub fn new(rules: Vec<BehaviorRule>) -> Self {
        Self { rules }
    }

    /// The default rule set for a bot called `bot_name`.
    pub fn with_seed_rules(bot_name: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(seed_rules(bot_name)?))
    }

    /// Append a rule at the lowest priority.
    pub fn add_rule(&mut self, rule: BehaviorRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[BehaviorRule] {
        &self.rules
    }

    /// Run one message through the cat tracker or the rules.
    ///
    /// Learning is not done here; callers train the chains first.
    pub fn dispatch(
        &self,
        session: &mut Session,
        msg: &Incoming,
        now: DateTime<Utc>,
    ) -> Dispatch {
        if session.is_cat(msg) {
            let addressed = session.is_addressed(msg.body());
            let replies = session
                .cat_observe(msg, now)
                .into_iter()
                .filter(|reply| {
                    let allowed = session.may_speak_on(&reply.channel, addressed);
                    if !allowed {
                        tracing::debug!("Keeping quiet to the cat on {}", reply.channel);
                    }
                    allowed
                })
                .collect();
            session.last_interaction = now;
            return Dispatch {
                rule: Some(CAT_RULE.to_string()),
                replies,
            };
        }

        let text = normalize_whitespace(msg.body());
        for rule in &self.rules {
            let Some(outcome) = rule.evaluate(session, msg, &text) else {
                continue;
            };
            session.last_interaction = now;
            tracing::debug!("Rule {} matched on {}", rule.name, msg.channel);
            let replies = route(session, msg, outcome).into_iter().collect();
            return Dispatch {
                rule: Some(rule.name.clone()),
                replies,
            };
        }
        Dispatch::default()
    }
}

/// Decide where a matched rule's reply goes, if anywhere.
///
/// Runs after the rule itself, so a subscription change already applies to
/// its own acknowledgement.
fn route(session: &Session, msg: &Incoming, outcome: RuleOutcome) -> Option<Reply> {
    if outcome.body.is_empty() {
        return None;
    }
    let addressed = session.is_addressed(msg.body());
    if session.may_speak_on(&msg.channel, addressed) {
        return Some(Reply::new(&msg.channel, &msg.instance, outcome.body));
    }
    match session.subs.policy(&msg.channel) {
        Some(ChannelPolicy::HomeOnly) => {
            Some(Reply::new(session.subs.home(), &msg.instance, outcome.body))
        }
        _ => {
            tracing::debug!("Suppressing reply on silent channel {}", msg.channel);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clyde_core::ClydeConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn setup(dir: &TempDir) -> (BehaviorPipeline, Session) {
        let mut config = ClydeConfig::default();
        config.runtime.data_dir = Some(dir.path().to_path_buf());
        let session = Session::fresh(&config, Box::new(StdRng::seed_from_u64(11)), Utc::now());
        (BehaviorPipeline::with_seed_rules("clyde").unwrap(), session)
    }

    #[test]
    fn test_unmatched_produces_nothing() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        let before = session.last_interaction;
        let msg = Incoming::new("alice", "clyde-dev", "personal", "", "just chatting");
        let out = pipeline.dispatch(&mut session, &msg, before + chrono::Duration::seconds(5));
        assert!(!out.matched());
        assert!(out.replies.is_empty());
        assert_eq!(session.last_interaction, before);
    }

    #[test]
    fn test_match_updates_last_interaction() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        let later = session.last_interaction + chrono::Duration::seconds(5);
        let msg = Incoming::new("alice", "clyde-dev", "personal", "", "hi clyde");
        let out = pipeline.dispatch(&mut session, &msg, later);
        assert_eq!(out.rule.as_deref(), Some("greeting"));
        assert_eq!(session.last_interaction, later);
    }

    #[test]
    fn test_home_only_redirects_unless_named() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("snacks", ChannelPolicy::HomeOnly);
        session.chain.train("if the sun and the moon fought, who would win?");

        let msg = Incoming::new(
            "alice",
            "snacks",
            "lunch",
            "",
            "if cats and dogs fought, who would win?",
        );
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.replies.len(), 1);
        assert_eq!(out.replies[0].channel, "clyde-dev");

        let msg = Incoming::new("alice", "snacks", "lunch", "", "hi clyde");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.replies[0].channel, "snacks");
    }

    #[test]
    fn test_everywhere_replies_in_place() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("snacks", ChannelPolicy::Everywhere);
        let msg = Incoming::new("alice", "snacks", "lunch", "", "hello clyde");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.replies[0].channel, "snacks");
        assert_eq!(out.replies[0].instance, "lunch");
    }

    #[test]
    fn test_unknown_channel_is_silent() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        let msg = Incoming::new("alice", "elsewhere", "x", "", "hi clyde");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert!(out.matched());
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_subscription_ack_follows_new_policy() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        let msg = Incoming::new("alice", "snacks", "x", "", "clyde, join us");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(session.subs.policy("snacks"), Some(ChannelPolicy::Everywhere));
        assert_eq!(out.replies.len(), 1);
        assert_eq!(out.replies[0].channel, "snacks");

        let msg = Incoming::new("alice", "snacks", "x", "", "clyde, only talk at home");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(session.subs.policy("snacks"), Some(ChannelPolicy::HomeOnly));
        assert_eq!(out.replies[0].channel, "snacks");

        let msg = Incoming::new("alice", "snacks", "x", "", "clyde, be quiet");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(session.subs.policy("snacks"), Some(ChannelPolicy::SilentListen));
        assert_eq!(out.rule.as_deref(), Some("subscribe_quiet"));
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_silent_channels_get_no_subscription_acks() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("library", ChannelPolicy::SilentListen);

        for body in ["clyde, be quiet", "clyde, leave"] {
            let msg = Incoming::new("alice", "library", "x", "", body);
            let out = pipeline.dispatch(&mut session, &msg, Utc::now());
            assert!(out.matched(), "{body}");
            assert!(out.replies.is_empty(), "{body} got {:?}", out.replies);
        }
        assert_eq!(session.subs.policy("library"), None);

        // never subscribed at all
        let msg = Incoming::new("alice", "randomchan", "x", "", "clyde, leave");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.rule.as_deref(), Some("unsubscribe"));
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_home_only_ignores_name_inside_other_words() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("stables", ChannelPolicy::HomeOnly);
        session.chain.train("a clydesdale is a horse");

        let msg = Incoming::new(
            "alice",
            "stables",
            "x",
            "",
            "if the clydesdale and the pony fought, who would win?",
        );
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.replies.len(), 1);
        assert_eq!(out.replies[0].channel, "clyde-dev");
    }

    #[test]
    fn test_cat_keeps_quiet_on_silent_channel() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("library", ChannelPolicy::SilentListen);

        let msg = Incoming::new("zeroday", "library", "x", "", "zeroday slips out of clyde's grip");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.rule.as_deref(), Some(CAT_RULE));
        assert!(out.replies.is_empty());
    }

    #[test]
    fn test_cat_speaks_where_allowed() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        session.subs.set("lounge", ChannelPolicy::Everywhere);

        let msg = Incoming::new("zeroday", "lounge", "x", "", "zeroday slips out of clyde's grip");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.replies.len(), 1);
        assert_eq!(out.replies[0].channel, "lounge");
    }

    #[test]
    fn test_cat_messages_bypass_rules() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        let msg = Incoming::new("zeroday", "clyde-dev", "personal", "", "zeroday purrs at clyde");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.rule.as_deref(), Some(CAT_RULE));
        assert_eq!(
            session.cat.as_ref().and_then(|c| c.location()),
            Some(("clyde-dev", "personal"))
        );
    }

    #[test]
    fn test_empty_response_still_matches() {
        let dir = TempDir::new().unwrap();
        let (pipeline, mut session) = setup(&dir);
        // nothing learned yet, so babble has nothing to add
        let msg = Incoming::new("alice", "clyde-dev", "personal", "", "what does clyde think");
        let out = pipeline.dispatch(&mut session, &msg, Utc::now());
        assert_eq!(out.rule.as_deref(), Some("babble"));
        assert!(out.replies.is_empty());
    }
}

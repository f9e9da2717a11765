//! Behavior rules: pattern → captures → response.
//!
//! A rule is plain data: a case-insensitive pattern, a flag saying whether
//! the response seeds the chain, and a [`Response`] describing what to say.
//! Responses that need arbitrary logic go through [`Capability`].

use crate::session::Session;
use clyde_core::{ChannelPolicy, FactKey, Incoming};
use rand::seq::SliceRandom;
use regex::{Captures as RegexCaptures, Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Placeholder in rule patterns replaced by the bot's name.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Reply sent instead of running a rule that needs an authenticated sender.
const REFUSAL: &str = "I only take orders from people I trust, $sender.";

/// Named values available to templates: every named capture group plus
/// `sender`, `channel`, `name` and `home`.
pub type Captures = BTreeMap<String, String>;

static TEMPLATE_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$(\w+)").unwrap());

/// Replace `$key` with its captured value. Unknown keys are left alone.
pub fn expand(template: &str, captures: &Captures) -> String {
    TEMPLATE_VAR
        .replace_all(template, |caps: &RegexCaptures| match captures.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

// ============================================================================
// Responses
// ============================================================================

/// Arbitrary response logic. Returning `None` means "matched, nothing to say".
pub trait Capability: Send + Sync {
    fn respond(&self, session: &mut Session, msg: &Incoming, captures: &Captures) -> Option<String>;

    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({})", self.name())
    }
}

/// Which fact store a response reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRef {
    /// A fixed named store.
    Named(String),
    /// The impersonation store of the person in this capture.
    PersonIn(String),
}

impl StoreRef {
    fn key(&self, captures: &Captures) -> Option<FactKey> {
        match self {
            StoreRef::Named(name) => Some(FactKey::store(name)),
            StoreRef::PersonIn(capture) => captures
                .get(capture)
                .filter(|p| !p.is_empty())
                .map(|p| FactKey::impersonation(p)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Response {
    /// One of the templates, picked at random.
    Template(Vec<String>),
    /// "I am ____" for the current mood.
    MoodReport,
    /// Cheer up one step, then answer.
    MoodUp(Vec<String>),
    /// Sadden one step, then answer.
    MoodDown(Vec<String>),
    /// Append the value of `capture` to a store, then acknowledge.
    Remember {
        store: StoreRef,
        capture: String,
        ack: Vec<String>,
    },
    /// Read a random line from a store into `$fact` and expand `template`.
    Recall {
        store: StoreRef,
        template: String,
        fallback: Vec<String>,
    },
    /// Set the triggering channel's policy.
    Subscribe {
        policy: ChannelPolicy,
        ack: Vec<String>,
    },
    /// Forget the triggering channel.
    Unsubscribe { ack: Vec<String> },
    /// Continue from the last `tail` words of the utterance.
    Babble { tail: usize },
    Custom(Arc<dyn Capability>),
}

/// What a matched rule wants to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Empty when the rule matched but has nothing to say.
    pub body: String,
}

impl RuleOutcome {
    fn say(body: String) -> Self {
        Self { body }
    }
}

fn pick(session: &mut Session, templates: &[String], captures: &Captures) -> String {
    templates
        .choose(session.rng())
        .map(|t| expand(t, captures))
        .unwrap_or_default()
}

impl Response {
    fn produce(
        &self,
        session: &mut Session,
        msg: &Incoming,
        text: &str,
        captures: &Captures,
    ) -> RuleOutcome {
        match self {
            Response::Template(templates) => RuleOutcome::say(pick(session, templates, captures)),
            Response::MoodReport => RuleOutcome::say(session.mood.to_string()),
            Response::MoodUp(templates) => {
                session.mood = session.mood.better();
                RuleOutcome::say(pick(session, templates, captures))
            }
            Response::MoodDown(templates) => {
                session.mood = session.mood.worse();
                RuleOutcome::say(pick(session, templates, captures))
            }
            Response::Remember { store, capture, ack } => {
                let line = captures.get(capture).map(String::as_str).unwrap_or("");
                let Some(key) = store.key(captures).filter(|_| !line.is_empty()) else {
                    return RuleOutcome::say("remember what?".to_string());
                };
                match session.facts.append(&key, line) {
                    Ok(()) => RuleOutcome::say(pick(session, ack, captures)),
                    Err(e) => {
                        tracing::warn!("Failed to remember {:?}: {}", key, e);
                        RuleOutcome::say("sorry, I couldn't write that down.".to_string())
                    }
                }
            }
            Response::Recall { store, template, fallback } => {
                let recalled = store.key(captures).and_then(|key| session.recall(&key).ok());
                match recalled {
                    Some(fact) => {
                        let mut captures = captures.clone();
                        captures.insert("fact".to_string(), fact);
                        RuleOutcome::say(expand(template, &captures))
                    }
                    None => RuleOutcome::say(pick(session, fallback, captures)),
                }
            }
            Response::Subscribe { policy, ack } => {
                if session.subs.is_home(&msg.channel) {
                    return RuleOutcome::say("but this is my home!".to_string());
                }
                session.subs.set(&msg.channel, *policy);
                tracing::info!("Channel {} set to {:?}", msg.channel, policy);
                RuleOutcome::say(pick(session, ack, captures))
            }
            Response::Unsubscribe { ack } => {
                if session.subs.is_home(&msg.channel) {
                    return RuleOutcome::say("but this is my home!".to_string());
                }
                if session.subs.remove(&msg.channel) {
                    tracing::info!("Left channel {}", msg.channel);
                }
                RuleOutcome::say(pick(session, ack, captures))
            }
            Response::Babble { tail } => {
                let words: Vec<&str> = text.split_whitespace().collect();
                let seed = words[words.len().saturating_sub(*tail)..].join(" ");
                let seed_len = seed.split_whitespace().count();
                let out = session.babble(&seed);
                let continuation: Vec<&str> = out.split_whitespace().skip(seed_len).collect();
                RuleOutcome::say(continuation.join(" "))
            }
            Response::Custom(capability) => {
                RuleOutcome::say(capability.respond(session, msg, captures).unwrap_or_default())
            }
        }
    }
}

// ============================================================================
// Rules
// ============================================================================

#[derive(Debug, Clone)]
pub struct BehaviorRule {
    pub name: String,
    pattern: Regex,
    /// Feed the response into the chain as a seed.
    pub chain: bool,
    /// Refuse unauthenticated senders.
    pub requires_auth: bool,
    pub response: Response,
}

impl BehaviorRule {
    /// Compile a rule. `{name}` in `pattern` becomes the bot's name.
    pub fn new(
        name: &str,
        pattern: &str,
        bot_name: &str,
        response: Response,
    ) -> Result<Self, regex::Error> {
        let pattern = pattern.replace(NAME_PLACEHOLDER, &regex::escape(bot_name));
        let pattern = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            chain: false,
            requires_auth: false,
            response,
        })
    }

    pub fn chained(mut self) -> Self {
        self.chain = true;
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Names of the pattern's capture groups.
    pub fn capture_keys(&self) -> Vec<&str> {
        self.pattern.capture_names().flatten().collect()
    }

    /// Try the rule against normalized `text`. `None` means no match.
    pub fn evaluate(
        &self,
        session: &mut Session,
        msg: &Incoming,
        text: &str,
    ) -> Option<RuleOutcome> {
        let caps = self.pattern.captures(text)?;
        let mut captures = Captures::new();
        captures.insert("sender".to_string(), msg.sender_name().to_string());
        captures.insert("channel".to_string(), msg.channel.clone());
        captures.insert("name".to_string(), session.identity.name.clone());
        captures.insert("home".to_string(), session.subs.home().to_string());
        for key in self.capture_keys() {
            if let Some(m) = caps.name(key) {
                captures.insert(key.to_string(), m.as_str().trim().to_string());
            }
        }

        if self.requires_auth && !msg.authenticated {
            tracing::info!("Rule {} refused for unauthenticated {}", self.name, msg.sender);
            return Some(RuleOutcome::say(expand(REFUSAL, &captures)));
        }

        let mut outcome = self.response.produce(session, msg, text, &captures);
        if self.chain && !outcome.body.is_empty() {
            outcome.body = session.babble(&outcome.body);
        }
        Some(outcome)
    }
}

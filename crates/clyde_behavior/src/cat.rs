//! Cat tracker: a small state machine following the channel cat.
//!
//! The cat announces what it is doing in third person ("zeroday purrs",
//! "alice scoops up zeroday"). Each announcement is classified into a
//! [`CatAction`], optionally naming the user involved; actions naming us are
//! *directed*. Commands go back to the cat as `<catname>::<verb>` on the
//! channel where it was last seen.

use chrono::{DateTime, Duration, Utc};
use clyde_core::config::CatConfig;
use clyde_core::text::strip_realm;
use clyde_core::{Incoming, Mood, Reply};
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Verbs used to play with the cat.
pub const PLAY_VERBS: &[&str] = &["pet", "skritch", "cuddle", "treat", "play"];

const SCOOP_VERB: &str = "scoop";
const DROP_VERB: &str = "drop";
const CONSOLATION: &[&str] = &["aww.", "next time, kitty.", "fine, be that way."];

// ============================================================================
// States and actions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatState {
    /// Whereabouts unknown.
    Traveling,
    /// Nearby, nothing pending.
    Normal,
    /// We asked to pick it up.
    TryScoop,
    /// We are holding it.
    WeScooped,
    /// We are carrying it somewhere.
    WeCarrying,
    /// We asked to put it down.
    TryDeposit,
    /// We tried to play with it.
    TryPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatAction {
    React,
    Scooped,
    ScoopFailed,
    Leave,
    Enter,
    Deposited,
    Bored,
}

/// Tried in order; the first pattern that matches classifies the message.
static ACTION_PATTERNS: LazyLock<Vec<(CatAction, Regex)>> = LazyLock::new(|| {
    [
        (
            CatAction::React,
            r"(?:(?:bats|scratches) at|rubs up against|snuggles up to|looks at) (?P<user>\w*)",
        ),
        (CatAction::React, r"slips out of (?P<user>\w*)'s arms|purrs|meows|is confused"),
        (CatAction::Scooped, r"(?P<user>\w*) scoops"),
        (CatAction::ScoopFailed, r"slips out of (?P<user>\w*)'s grip"),
        (CatAction::Leave, r"carried away by (?P<user>\w*)"),
        (CatAction::Enter, r"(?P<user>\w*) carries"),
        (CatAction::Deposited, r"(?P<user>\w*) sets"),
        (CatAction::Bored, r"rolls around|curls up|plays with her tail|mews softly"),
    ]
    .into_iter()
    .map(|(action, pattern)| (action, Regex::new(pattern).unwrap()))
    .collect()
});

/// Classify a cat message. The user is empty when the action names nobody.
pub fn classify(text: &str) -> Option<(CatAction, String)> {
    ACTION_PATTERNS.iter().find_map(|(action, re)| {
        re.captures(text).map(|caps| {
            let user = caps.name("user").map(|m| m.as_str()).unwrap_or("");
            (*action, user.to_string())
        })
    })
}

// ============================================================================
// Tracker
// ============================================================================

#[derive(Debug, Clone)]
pub struct CatTracker {
    config: CatConfig,
    /// Our own name as the cat would say it.
    us: String,
    state: CatState,
    /// Channel and instance where the cat was last heard.
    location: Option<(String, String)>,
    /// Since when someone else has been holding the cat.
    held_elsewhere: Option<DateTime<Utc>>,
    /// Last time anyone did something with the cat.
    last_attention: DateTime<Utc>,
}

impl CatTracker {
    pub fn new(config: CatConfig, our_sender: &str, now: DateTime<Utc>) -> Self {
        Self {
            config,
            us: strip_realm(our_sender).to_string(),
            state: CatState::Traveling,
            location: None,
            held_elsewhere: None,
            last_attention: now,
        }
    }

    pub fn state(&self) -> CatState {
        self.state
    }

    pub fn location(&self) -> Option<(&str, &str)> {
        self.location
            .as_ref()
            .map(|(c, i)| (c.as_str(), i.as_str()))
    }

    pub fn held_elsewhere(&self) -> Option<DateTime<Utc>> {
        self.held_elsewhere
    }

    pub fn is_cat(&self, msg: &Incoming) -> bool {
        msg.sender_name()
            .eq_ignore_ascii_case(strip_realm(&self.config.sender))
    }

    fn command(&self, verb: &str) -> Option<Reply> {
        let (channel, instance) = self.location.as_ref()?;
        Some(Reply::new(
            channel,
            instance,
            format!("{}::{}", self.config.name, verb),
        ))
    }

    fn say(&self, text: &str) -> Option<Reply> {
        let (channel, instance) = self.location.as_ref()?;
        Some(Reply::new(channel, instance, text))
    }

    fn try_scoop(&mut self) -> Option<Reply> {
        let reply = self.command(SCOOP_VERB)?;
        self.state = CatState::TryScoop;
        Some(reply)
    }

    fn try_play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Reply> {
        let verb = PLAY_VERBS.choose(rng).copied().unwrap_or("pet");
        let reply = self.command(verb)?;
        self.state = CatState::TryPlay;
        Some(reply)
    }

    /// React to one of the cat's messages.
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        msg: &Incoming,
        now: DateTime<Utc>,
        mood: &mut Mood,
        rng: &mut R,
    ) -> Vec<Reply> {
        self.location = Some((msg.channel.clone(), msg.instance.clone()));
        let mut out = Vec::new();

        let Some((action, user)) = classify(msg.body()) else {
            tracing::debug!("Unclassified cat message: {}", msg.body());
            self.state = CatState::Normal;
            return self.lonely_check(mood, rng).into_iter().collect();
        };
        let directed = !user.is_empty() && user.eq_ignore_ascii_case(&self.us);
        let idle_for = now - self.last_attention;
        if !user.is_empty() {
            self.last_attention = now;
        }
        tracing::debug!(
            "Cat {:?} (user {:?}, directed {}) in {:?}",
            action,
            user,
            directed,
            self.state
        );

        match (action, directed) {
            (CatAction::React, true) if self.state == CatState::TryPlay => {
                *mood = mood.better().better().at_least_ok();
                self.state = CatState::Normal;
            }
            (CatAction::Scooped, true) => {
                if self.held_elsewhere.take().is_some() {
                    // rescued from a hog: put it straight back down
                    out.extend(self.command(DROP_VERB));
                    self.state = CatState::TryDeposit;
                } else {
                    self.state = CatState::WeScooped;
                }
            }
            (CatAction::Scooped, false) => {
                self.held_elsewhere = Some(now);
                self.state = CatState::Normal;
            }
            (CatAction::ScoopFailed, true) => {
                let line = CONSOLATION.choose(rng).copied().unwrap_or("aww.");
                out.extend(self.say(line));
                self.state = CatState::Normal;
            }
            (CatAction::Leave, true) => self.state = CatState::WeCarrying,
            (CatAction::Leave, false) => {
                self.state = CatState::Traveling;
                self.location = None;
                self.held_elsewhere = None;
            }
            (CatAction::Enter, true) => {
                self.state = CatState::TryDeposit;
                out.extend(self.command(DROP_VERB));
            }
            (CatAction::Deposited, true) => {
                self.state = CatState::Normal;
                out.extend(self.try_play(rng));
            }
            (CatAction::Deposited, false) => {
                self.held_elsewhere = None;
                self.state = CatState::Normal;
            }
            (CatAction::Bored, _) => {
                self.state = CatState::Normal;
                let threshold = Duration::seconds(self.config.idle_threshold_secs);
                let chance = self.config.initiate_probability.clamp(0.0, 1.0);
                if idle_for > threshold && rng.gen_bool(chance) {
                    let attempt = if rng.gen_bool(0.5) {
                        self.try_scoop()
                    } else {
                        self.try_play(rng)
                    };
                    if attempt.is_some() {
                        self.last_attention = now;
                    }
                    out.extend(attempt);
                }
            }
            _ => self.state = CatState::Normal,
        }

        out.extend(self.lonely_check(mood, rng));
        out
    }

    fn lonely_check<R: Rng + ?Sized>(&mut self, mood: &Mood, rng: &mut R) -> Option<Reply> {
        if mood.is_lonely() && self.state == CatState::Normal {
            self.try_play(rng)
        } else {
            None
        }
    }

    /// Reclaim the cat when someone has been hogging it too long.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> Vec<Reply> {
        let Some(since) = self.held_elsewhere else {
            return Vec::new();
        };
        if now - since <= Duration::seconds(self.config.held_timeout_secs) {
            return Vec::new();
        }
        tracing::info!("Cat held elsewhere since {}, trying to reclaim it", since);
        self.try_scoop().into_iter().collect()
    }
}

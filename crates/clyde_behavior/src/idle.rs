//! What happens when nobody talks to us.
//!
//! On each tick, past configurable quiet periods, mood may slide toward
//! lonely and we may say something unprompted on the home channel. What we
//! say depends on how we feel.

use crate::rules::BORED_STORE;
use crate::session::Session;
use chrono::{DateTime, Duration, Utc};
use clyde_core::config::IdleConfig;
use clyde_core::{ClydeConfig, FactKey, MoodLevel, Reply};
use rand::seq::SliceRandom;
use rand::Rng;

const LONELY_LINES: &[&str] = &["is anyone there?", "hello?", "I'm lonely :("];

pub struct IdleBehavior {
    config: IdleConfig,
    home_instance: String,
}

impl IdleBehavior {
    pub fn new(config: &ClydeConfig) -> Self {
        Self {
            config: config.idle.clone(),
            home_instance: config.identity.home_instance.clone(),
        }
    }

    /// Run the idle checks for one tick.
    pub fn on_tick(&self, session: &mut Session, now: DateTime<Utc>) -> Option<Reply> {
        let quiet = now - session.last_interaction;

        if quiet > Duration::seconds(self.config.lonely_after_secs)
            && session.mood.named() > MoodLevel::Lonely
            && session.rng().gen_bool(self.config.sadden_probability.clamp(0.0, 1.0))
        {
            session.mood = session.mood.worse();
            tracing::debug!(
                "Nobody around for {}s, mood now {}",
                quiet.num_seconds(),
                session.mood.describe()
            );
        }

        if quiet > Duration::seconds(self.config.chatter_after_secs)
            && session.rng().gen_bool(self.config.chatter_probability.clamp(0.0, 1.0))
        {
            let body = self.chatter(session);
            if !body.is_empty() {
                // speaking up counts as interacting
                session.last_interaction = now;
                let home = session.subs.home().to_string();
                return Some(Reply::new(&home, &self.home_instance, body));
            }
        }
        None
    }

    fn chatter(&self, session: &mut Session) -> String {
        match session.mood.named() {
            level if level <= MoodLevel::Lonely => LONELY_LINES
                .choose(session.rng())
                .map(|s| s.to_string())
                .unwrap_or_default(),
            MoodLevel::Turnip | MoodLevel::Ok => {
                match session.recall(&FactKey::store(BORED_STORE)) {
                    Ok(activity) => {
                        format!("I'm bored. Maybe I'll {}.", activity.trim_end_matches('.'))
                    }
                    Err(_) => "I'm bored.".to_string(),
                }
            }
            _ => {
                let babble = session.babble("");
                if babble.is_empty() {
                    session.mood.to_string()
                } else {
                    babble
                }
            }
        }
    }
}

//! Session: everything the engine knows and feels, owned in one place.
//!
//! A session is never shared: the dispatcher holds it and lends it to rules,
//! the cat tracker and the idle behavior one event at a time.

use crate::cat::CatTracker;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clyde_chain::Chain;
use clyde_core::config::{ChainConfig, IdentityConfig};
use clyde_core::text::{break_lines, mentions_word, strip_realm};
use clyde_core::{
    ChannelPolicy, ClydeConfig, FactError, FactKey, FactStore, Incoming, Mood, Outgoing, Reply,
    Subscriptions,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::path::{Path, PathBuf};

// ============================================================================
// On-disk layout
// ============================================================================

/// Where a session's state lives under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub chain: PathBuf,
    pub zsig: PathBuf,
    pub subs: PathBuf,
    pub facts: PathBuf,
}

impl StatePaths {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let dir = data_dir.as_ref();
        Self {
            chain: dir.join("chain.json"),
            zsig: dir.join("zsig.json"),
            subs: dir.join("subs.json"),
            facts: dir.join("facts"),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    pub identity: IdentityConfig,
    chain_config: ChainConfig,
    line_width: usize,
    paths: StatePaths,
    /// Learns from message bodies.
    pub chain: Chain,
    /// Learns from signatures.
    pub zsig: Chain,
    pub mood: Mood,
    pub subs: Subscriptions,
    pub facts: FactStore,
    /// `None` when cat tracking is disabled.
    pub cat: Option<CatTracker>,
    /// Last time a rule or the cat tracker acted on a message.
    pub last_interaction: DateTime<Utc>,
    rng: Box<dyn RngCore + Send>,
}

impl Session {
    /// A session with empty chains and no subscriptions.
    pub fn fresh(config: &ClydeConfig, rng: Box<dyn RngCore + Send>, now: DateTime<Utc>) -> Self {
        let paths = StatePaths::new(config.data_dir());
        let chain = Chain::new(config.chain.prefix_len);
        let zsig = Chain::new(config.chain.prefix_len);
        let subs = Subscriptions::new(&config.identity.home_channel);
        Self::assemble(config, paths, chain, zsig, subs, rng, now)
    }

    /// Restore a session from the data directory.
    ///
    /// Missing or unreadable chain and subscription files start empty. A chain
    /// built with a longer prefix than configured is an error.
    pub fn load(config: &ClydeConfig, now: DateTime<Utc>) -> Result<Self> {
        let paths = StatePaths::new(config.data_dir());
        let prefix_len = config.chain.prefix_len;
        let chain = Chain::load(&paths.chain, prefix_len)
            .with_context(|| format!("Failed to load chain {}", paths.chain.display()))?;
        let zsig = Chain::load(&paths.zsig, prefix_len)
            .with_context(|| format!("Failed to load chain {}", paths.zsig.display()))?;
        let subs = Subscriptions::load(&paths.subs, &config.identity.home_channel);
        let rng: Box<dyn RngCore + Send> = match config.runtime.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Ok(Self::assemble(config, paths, chain, zsig, subs, rng, now))
    }

    fn assemble(
        config: &ClydeConfig,
        paths: StatePaths,
        chain: Chain,
        zsig: Chain,
        subs: Subscriptions,
        rng: Box<dyn RngCore + Send>,
        now: DateTime<Utc>,
    ) -> Self {
        let cat = config
            .cat
            .enabled
            .then(|| CatTracker::new(config.cat.clone(), &config.identity.sender, now));
        Self {
            identity: config.identity.clone(),
            chain_config: config.chain.clone(),
            line_width: config.runtime.line_width,
            facts: FactStore::new(&paths.facts),
            paths,
            chain,
            zsig,
            mood: Mood::new(config.mood.initial, config.mood.max),
            subs,
            cat,
            last_interaction: now,
            rng,
        }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    /// Write both chains and the subscriptions back to the data directory.
    pub fn persist(&self) -> Result<()> {
        if let Some(dir) = self.paths.chain.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data dir {}", dir.display()))?;
        }
        self.chain
            .save(&self.paths.chain)
            .with_context(|| format!("Failed to save chain {}", self.paths.chain.display()))?;
        self.zsig
            .save(&self.paths.zsig)
            .with_context(|| format!("Failed to save chain {}", self.paths.zsig.display()))?;
        self.subs
            .save(&self.paths.subs)
            .with_context(|| {
                format!("Failed to save subscriptions {}", self.paths.subs.display())
            })?;
        Ok(())
    }

    /// The session's random source.
    pub fn rng(&mut self) -> &mut (dyn RngCore + Send) {
        self.rng.as_mut()
    }

    /// Whether a message was sent by us.
    pub fn is_own(&self, msg: &Incoming) -> bool {
        msg.sender_name()
            .eq_ignore_ascii_case(strip_realm(&self.identity.sender))
    }

    /// Whether `text` calls us by name.
    pub fn is_addressed(&self, text: &str) -> bool {
        mentions_word(text, &self.identity.name)
    }

    /// Whether we may speak on `channel` in place.
    ///
    /// Always true at home. Elsewhere the channel's policy decides, and a
    /// channel we never subscribed to is only listened to.
    pub fn may_speak_on(&self, channel: &str, addressed: bool) -> bool {
        if self.subs.is_home(channel) {
            return true;
        }
        match self.subs.policy(channel).unwrap_or(ChannelPolicy::SilentListen) {
            ChannelPolicy::SilentListen => false,
            ChannelPolicy::HomeOnly => addressed,
            ChannelPolicy::Everywhere => true,
        }
    }

    /// Feed a message into both chains.
    pub fn learn(&mut self, msg: &Incoming) {
        self.chain.train(msg.body());
        self.zsig.train(msg.signature());
    }

    /// Continue `seed` with the body chain.
    ///
    /// The sentence count is drawn uniformly from the configured weights and
    /// the configured word ceiling always applies.
    pub fn babble(&mut self, seed: &str) -> String {
        let sentences = self
            .chain_config
            .sentence_weights
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(1);
        self.chain.generate_sentences(
            seed,
            sentences,
            self.chain_config.max_words,
            &mut self.rng,
        )
    }

    /// A random line from a fact store.
    pub fn recall(&mut self, key: &FactKey) -> std::result::Result<String, FactError> {
        self.facts.random_line(key, &mut self.rng)
    }

    /// A signature from the signature chain, or the configured default.
    pub fn signature(&mut self) -> String {
        let sig = self
            .zsig
            .generate("", self.chain_config.signature_max_words, &mut self.rng);
        if sig.is_empty() {
            self.identity.signature.clone()
        } else {
            sig
        }
    }

    /// Sign and wrap a reply for the transport.
    pub fn compose(&mut self, reply: Reply) -> Outgoing {
        Outgoing {
            signature: self.signature(),
            body: break_lines(&reply.body, self.line_width),
            channel: reply.channel,
            instance: reply.instance,
        }
    }

    /// Let the cat tracker check its timers.
    ///
    /// Commands aimed at a channel we only listen to are dropped.
    pub fn cat_tick(&mut self, now: DateTime<Utc>) -> Vec<Reply> {
        let replies = match &mut self.cat {
            Some(cat) => cat.on_tick(now),
            None => return Vec::new(),
        };
        replies
            .into_iter()
            .filter(|reply| self.may_speak_on(&reply.channel, false))
            .collect()
    }

    /// Let the cat tracker react to one of the cat's messages.
    pub fn cat_observe(&mut self, msg: &Incoming, now: DateTime<Utc>) -> Vec<Reply> {
        let Session { cat, mood, rng, .. } = self;
        match cat {
            Some(cat) => cat.observe(msg, now, mood, rng.as_mut()),
            None => Vec::new(),
        }
    }

    /// Whether `msg` came from the cat.
    pub fn is_cat(&self, msg: &Incoming) -> bool {
        self.cat.as_ref().is_some_and(|cat| cat.is_cat(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> ClydeConfig {
        let mut config = ClydeConfig::default();
        config.runtime.data_dir = Some(dir.to_path_buf());
        config
    }

    fn test_session(dir: &Path) -> Session {
        let rng = Box::new(StdRng::seed_from_u64(7));
        Session::fresh(&test_config(dir), rng, Utc::now())
    }

    #[test]
    fn test_learn_trains_both_chains() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(dir.path());
        session.learn(&Incoming::new("alice", "clyde-dev", "personal", "the sig", "hello there"));
        assert!(session.chain.suffixes("hello").is_some());
        assert!(session.zsig.suffixes("the").is_some());
        assert!(session.chain.suffixes("the").is_none());
    }

    #[test]
    fn test_signature_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(dir.path());
        assert_eq!(session.signature(), "Clyde");

        session.zsig.train("Secret Agent Man");
        assert_ne!(session.signature(), "Clyde");
    }

    #[test]
    fn test_compose_wraps_and_signs() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(dir.path());
        let long = "word ".repeat(40);
        let out = session.compose(Reply::new("clyde-dev", "personal", long));
        assert_eq!(out.channel, "clyde-dev");
        assert_eq!(out.signature, "Clyde");
        assert!(out.body.lines().all(|l| l.chars().count() <= 70));
        assert!(out.body.lines().count() > 1);
    }

    #[test]
    fn test_own_messages_detected() {
        let dir = TempDir::new().unwrap();
        let session = test_session(dir.path());
        assert!(session.is_own(&Incoming::new("clyde@ATHENA.MIT.EDU", "c", "i", "", "x")));
        assert!(!session.is_own(&Incoming::new("alice", "c", "i", "", "x")));
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path());
        let mut session = test_session(dir.path());
        session.learn(&Incoming::new(
            "alice",
            "clyde-dev",
            "personal",
            "sig here",
            "one two three",
        ));
        session.subs.set("snacks", clyde_core::ChannelPolicy::Everywhere);
        session.persist().unwrap();

        let loaded = Session::load(&config, Utc::now()).unwrap();
        assert_eq!(loaded.chain, session.chain);
        assert_eq!(loaded.zsig, session.zsig);
        assert_eq!(
            loaded.subs.policy("snacks"),
            Some(clyde_core::ChannelPolicy::Everywhere)
        );
    }

    #[test]
    fn test_load_empty_dir_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let session = Session::load(&test_config(dir.path()), Utc::now()).unwrap();
        assert!(session.chain.is_empty());
        assert!(session.subs.is_empty());
        assert_eq!(session.mood, Mood::default());
    }

    #[test]
    fn test_load_rejects_prefix_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(dir.path());
        config.chain.prefix_len = 3;
        let mut chain = Chain::new(3);
        chain.train("a b c d e");
        chain.save(StatePaths::new(dir.path()).chain).unwrap();

        config.chain.prefix_len = 2;
        assert!(Session::load(&config, Utc::now()).is_err());
    }

    #[test]
    fn test_cat_reclaim_respects_channel_policy() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(dir.path());
        session.subs.set("lounge", ChannelPolicy::Everywhere);
        let t0 = Utc::now();
        let later = t0 + chrono::Duration::hours(1);

        let hogged = Incoming::new("zeroday", "library", "x", "", "bob scoops zeroday");
        session.cat_observe(&hogged, t0);
        assert!(session.cat_tick(later).is_empty());

        let hogged = Incoming::new("zeroday", "lounge", "x", "", "bob scoops zeroday");
        session.cat_observe(&hogged, t0);
        let replies = session.cat_tick(later);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].channel, "lounge");
        assert!(replies[0].body.ends_with("scoop"));
    }

    #[test]
    fn test_may_speak_on() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(dir.path());
        session.subs.set("quiet", ChannelPolicy::SilentListen);
        session.subs.set("porch", ChannelPolicy::HomeOnly);
        session.subs.set("lounge", ChannelPolicy::Everywhere);

        assert!(session.may_speak_on("clyde-dev", false));
        assert!(!session.may_speak_on("quiet", true));
        assert!(!session.may_speak_on("nowhere", true));
        assert!(!session.may_speak_on("porch", false));
        assert!(session.may_speak_on("porch", true));
        assert!(session.may_speak_on("lounge", false));
        assert!(session.is_addressed("hey Clyde, look"));
        assert!(!session.is_addressed("a clydesdale"));
    }
}

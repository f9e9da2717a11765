//! Channel subscriptions and their reply policies.
//!
//! Persisted as a JSON object mapping channel name to a small integer code.
//! A missing or unreadable file means no subscriptions beyond the home channel.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// How the engine may reply on a non-home channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPolicy {
    /// Learn from the channel but never reply there.
    SilentListen,
    /// Redirect replies to the home channel unless addressed by name.
    HomeOnly,
    /// Reply in place.
    Everywhere,
}

impl ChannelPolicy {
    pub fn code(self) -> u8 {
        match self {
            ChannelPolicy::SilentListen => 0,
            ChannelPolicy::HomeOnly => 1,
            ChannelPolicy::Everywhere => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ChannelPolicy::SilentListen),
            1 => Some(ChannelPolicy::HomeOnly),
            2 => Some(ChannelPolicy::Everywhere),
            _ => None,
        }
    }
}

/// The set of channels the engine listens on, plus the home channel.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    home: String,
    channels: BTreeMap<String, ChannelPolicy>,
}

impl Subscriptions {
    pub fn new(home: &str) -> Self {
        Self {
            home: home.to_string(),
            channels: BTreeMap::new(),
        }
    }

    /// Load from `path`, falling back to an empty set on any failure.
    pub fn load<P: AsRef<Path>>(path: P, home: &str) -> Self {
        let path = path.as_ref();
        let mut subs = Self::new(home);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::info!("No subscriptions at {} ({}), home channel only", path.display(), e);
                return subs;
            }
        };
        let raw: BTreeMap<String, u8> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Ignoring unreadable subscriptions file {}: {}", path.display(), e);
                return subs;
            }
        };
        for (channel, code) in raw {
            match ChannelPolicy::from_code(code) {
                Some(policy) => {
                    subs.channels.insert(channel, policy);
                }
                None => tracing::warn!("Unknown policy code {} for channel {}", code, channel),
            }
        }
        tracing::info!("Loaded {} subscriptions", subs.channels.len());
        subs
    }

    /// Write the full set to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let raw: BTreeMap<&str, u8> = self
            .channels
            .iter()
            .map(|(c, p)| (c.as_str(), p.code()))
            .collect();
        let json = serde_json::to_string_pretty(&raw)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn is_home(&self, channel: &str) -> bool {
        channel.eq_ignore_ascii_case(&self.home)
    }

    /// Policy for `channel`; the home channel always allows replies.
    pub fn policy(&self, channel: &str) -> Option<ChannelPolicy> {
        if self.is_home(channel) {
            return Some(ChannelPolicy::Everywhere);
        }
        self.channels.get(&channel.to_lowercase()).copied()
    }

    pub fn set(&mut self, channel: &str, policy: ChannelPolicy) {
        self.channels.insert(channel.to_lowercase(), policy);
    }

    pub fn remove(&mut self, channel: &str) -> bool {
        self.channels.remove(&channel.to_lowercase()).is_some()
    }

    pub fn channels(&self) -> impl Iterator<Item = (&str, ChannelPolicy)> {
        self.channels.iter().map(|(c, p)| (c.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

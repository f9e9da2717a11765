//! Message shapes exchanged with the transport.

use crate::text::strip_realm;
use serde::{Deserialize, Serialize};

/// A message delivered by the transport.
///
/// `fields` is the raw multi-field body: the second-to-last field is the
/// sender's signature, the last one is the utterance. Missing fields read as
/// empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incoming {
    /// Sender identity, possibly `identity@REALM`.
    pub sender: String,
    pub channel: String,
    pub instance: String,
    /// Whether the transport verified the sender.
    pub authenticated: bool,
    pub fields: Vec<String>,
}

impl Incoming {
    /// Build a message with the usual two-field body.
    pub fn new(sender: &str, channel: &str, instance: &str, signature: &str, body: &str) -> Self {
        Self {
            sender: sender.to_string(),
            channel: channel.to_string(),
            instance: instance.to_string(),
            authenticated: true,
            fields: vec![signature.to_string(), body.to_string()],
        }
    }

    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Main utterance text.
    pub fn body(&self) -> &str {
        self.fields.last().map(String::as_str).unwrap_or("")
    }

    /// Auxiliary signature text.
    pub fn signature(&self) -> &str {
        let n = self.fields.len();
        if n > 1 {
            &self.fields[n - 2]
        } else {
            ""
        }
    }

    /// Sender with any `@REALM` suffix removed.
    pub fn sender_name(&self) -> &str {
        strip_realm(&self.sender)
    }
}

/// A reply decided by the engine, before signature and formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel: String,
    pub instance: String,
    pub body: String,
}

impl Reply {
    pub fn new(channel: &str, instance: &str, body: impl Into<String>) -> Self {
        Self {
            channel: channel.to_string(),
            instance: instance.to_string(),
            body: body.into(),
        }
    }
}

/// A fully formed message handed to the transport's send capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outgoing {
    pub channel: String,
    pub instance: String,
    pub signature: String,
    pub body: String,
}

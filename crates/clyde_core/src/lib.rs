//! # Clyde core
//!
//! Leaf types shared by every other crate: the mood scale, channel
//! subscriptions, append-only fact stores, message shapes and configuration.

pub mod config;
pub mod error;
pub mod facts;
pub mod message;
pub mod mood;
pub mod subscription;
pub mod text;

pub use config::ClydeConfig;
pub use error::{CoreError, FactError};
pub use facts::{FactKey, FactStore};
pub use message::{Incoming, Outgoing, Reply};
pub use mood::{Mood, MoodLevel};
pub use subscription::{ChannelPolicy, Subscriptions};

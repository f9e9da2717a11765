//! # Clyde chain
//!
//! A word-level Markov chain that learns from every utterance it sees and
//! continues seed text with statistically plausible words.
//!
//! Keys are tails of a fixed-length [`Prefix`] so that lookups fall back to
//! shorter contexts, down to the empty key, before giving up.

mod chain;
mod error;
mod prefix;

pub use chain::{is_sentence_end, Chain, SuffixCounts};
pub use error::{ChainError, Result};
pub use prefix::Prefix;

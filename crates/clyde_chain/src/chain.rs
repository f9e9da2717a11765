//! The prefix → suffix frequency table.
//!
//! Every observed `(prefix, word)` pair is recorded under every non-degenerate
//! tail of the prefix, down to the empty key. Lookup walks from the longest
//! tail to the shortest, so generation degrades gracefully instead of
//! stopping the moment an exact context is unknown.
//!
//! With a prefix length of two, training on `I am not a number! I am a free man!`
//! records (among others):
//!
//! ```text
//!   key          suffix
//!   ""           I, am, not, a, ...
//!   "i"          am
//!   "i am"       not, a
//!   "am a"       free
//! ```

use crate::error::{ChainError, Result};
use crate::prefix::Prefix;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Next-word counts for one key. Ordered so sampling is reproducible.
pub type SuffixCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    table: HashMap<String, SuffixCounts>,
    prefix_len: usize,
}

impl Chain {
    pub fn new(prefix_len: usize) -> Self {
        Self {
            table: HashMap::new(),
            prefix_len,
        }
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn suffixes(&self, key: &str) -> Option<&SuffixCounts> {
        self.table.get(key)
    }

    /// Read-only view of the whole table.
    pub fn table(&self) -> &HashMap<String, SuffixCounts> {
        &self.table
    }

    /// Count `suffix` after every distinct tail of `prefix`.
    pub fn add(&mut self, prefix: &Prefix, suffix: &str) {
        debug_assert_eq!(prefix.len(), self.prefix_len);
        for i in 0..=self.prefix_len {
            if prefix.is_degenerate_tail(i) {
                continue;
            }
            let counts = self.table.entry(prefix.key(i)).or_default();
            let count = counts.entry(suffix.to_string()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    /// Learn from whitespace-separated text.
    pub fn train(&mut self, text: &str) {
        let mut prefix = Prefix::new(self.prefix_len);
        for word in text.split_whitespace() {
            self.add(&prefix, word);
            prefix.shift(word);
        }
    }

    /// Pick a next word for `prefix`, falling back to shorter tails.
    ///
    /// Returns `None` only when no tail, including the empty key, has any
    /// recorded suffix.
    pub fn next_word<R: Rng + ?Sized>(&self, prefix: &Prefix, rng: &mut R) -> Option<&str> {
        for i in 0..=prefix.len() {
            if prefix.is_degenerate_tail(i) {
                continue;
            }
            let Some(counts) = self.table.get(&prefix.key(i)) else {
                continue;
            };
            if let Some(word) = weighted_choice(counts, rng) {
                return Some(word);
            }
        }
        None
    }

    /// Extend `seed` by at most `max_words` generated words.
    ///
    /// The result starts with the seed's own words. Generation stops early
    /// when no continuation is available.
    pub fn generate<R: Rng + ?Sized>(&self, seed: &str, max_words: usize, rng: &mut R) -> String {
        self.generate_until(seed, max_words, None, rng)
    }

    /// Extend `seed` until `sentences` sentence-ending words have been
    /// generated, or `max_words` words, whichever comes first.
    pub fn generate_sentences<R: Rng + ?Sized>(
        &self,
        seed: &str,
        sentences: usize,
        max_words: usize,
        rng: &mut R,
    ) -> String {
        self.generate_until(seed, max_words, Some(sentences.max(1)), rng)
    }

    fn generate_until<R: Rng + ?Sized>(
        &self,
        seed: &str,
        max_words: usize,
        sentences: Option<usize>,
        rng: &mut R,
    ) -> String {
        let mut words: Vec<String> = seed.split_whitespace().map(str::to_string).collect();
        let mut prefix = Prefix::from_words(&words, self.prefix_len);
        let mut ended = 0usize;

        for _ in 0..max_words {
            let Some(next) = self.next_word(&prefix, rng) else {
                break;
            };
            let next = next.to_string();
            prefix.shift(&next);
            let is_end = is_sentence_end(&next);
            words.push(next);
            if is_end {
                ended += 1;
                if sentences.is_some_and(|target| ended >= target) {
                    break;
                }
            }
        }
        words.join(" ")
    }

    /// Write the table as a JSON object of objects.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(&self.table)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::info!("Saved chain with {} keys to {}", self.table.len(), path.display());
        Ok(())
    }

    /// Load a saved table.
    ///
    /// A missing or unparseable file yields an empty chain. A table whose keys
    /// are longer than `prefix_len` was built with a different configuration
    /// and is rejected.
    pub fn load<P: AsRef<Path>>(path: P, prefix_len: usize) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::info!("No chain at {} ({}), starting empty", path.display(), e);
                return Ok(Self::new(prefix_len));
            }
        };
        let table: HashMap<String, SuffixCounts> = match serde_json::from_str(&content) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Ignoring unreadable chain {}: {}", path.display(), e);
                return Ok(Self::new(prefix_len));
            }
        };
        let chain = Self::from_table(table, prefix_len)?;
        tracing::info!("Loaded chain with {} keys from {}", chain.len(), path.display());
        Ok(chain)
    }

    /// Wrap an existing table, checking key lengths against `prefix_len`.
    pub fn from_table(table: HashMap<String, SuffixCounts>, prefix_len: usize) -> Result<Self> {
        for key in table.keys() {
            let found = if key.is_empty() {
                0
            } else {
                key.split(' ').count()
            };
            if found > prefix_len {
                return Err(ChainError::PrefixMismatch {
                    key: key.clone(),
                    found,
                    expected: prefix_len,
                });
            }
        }
        Ok(Self { table, prefix_len })
    }
}

/// Weighted draw: a uniform cursor in `[0, total)` walks the counts in key
/// order and lands on the word whose span contains it.
///
/// Counts whose total does not fit in a `u64` can only come from a damaged
/// file; such a key yields nothing.
fn weighted_choice<'a, R: Rng + ?Sized>(
    counts: &'a SuffixCounts,
    rng: &mut R,
) -> Option<&'a str> {
    let Some(total) = counts.values().try_fold(0u64, |acc, &c| acc.checked_add(c)) else {
        tracing::warn!("Skipping suffix table whose counts overflow");
        return None;
    };
    if total == 0 {
        return None;
    }
    let mut cursor = rng.gen_range(0..total);
    for (word, &count) in counts {
        if cursor < count {
            return Some(word);
        }
        cursor -= count;
    }
    None
}

/// Whether `word` finishes a sentence (`.`, `!` or `?`, ignoring closing quotes and brackets).
pub fn is_sentence_end(word: &str) -> bool {
    let trimmed = word.trim_end_matches(['"', '\'', ')', ']']);
    trimmed.ends_with(['.', '!', '?'])
}

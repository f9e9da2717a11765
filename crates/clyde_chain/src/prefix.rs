//! Rolling window of the most recent words.

/// A Markov chain prefix of exactly `len` lowercase words.
///
/// Unfilled slots hold empty strings and always sit at the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    words: Vec<String>,
}

impl Prefix {
    /// An all-empty prefix.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![String::new(); len],
        }
    }

    /// Seed a prefix from the last `len` words of `words`.
    pub fn from_words<S: AsRef<str>>(words: &[S], len: usize) -> Self {
        let mut prefix = Self::new(len);
        let start = words.len().saturating_sub(len);
        for w in &words[start..] {
            prefix.shift(w.as_ref());
        }
        prefix
    }

    /// Drop the oldest word and append `word` lowercased.
    pub fn shift(&mut self, word: &str) {
        if self.words.is_empty() {
            return;
        }
        self.words.rotate_left(1);
        if let Some(last) = self.words.last_mut() {
            *last = word.to_lowercase();
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Whether the tail starting at `i` begins with an unfilled slot.
    pub(crate) fn is_degenerate_tail(&self, i: usize) -> bool {
        i < self.words.len() && self.words[i].is_empty()
    }

    /// Key for the tail starting at word `i`; `i == len` gives the empty key.
    pub fn key(&self, i: usize) -> String {
        self.words[i.min(self.words.len())..].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_lowercases_and_drops_oldest() {
        let mut p = Prefix::new(2);
        p.shift("I");
        assert_eq!(p.words(), &["".to_string(), "i".to_string()]);
        p.shift("Am");
        p.shift("NOT");
        assert_eq!(p.words(), &["am".to_string(), "not".to_string()]);
    }

    #[test]
    fn test_from_words_pads_short_seed() {
        let p = Prefix::from_words(&["Hello"], 3);
        assert_eq!(p.key(0), "  hello");
        assert!(p.is_degenerate_tail(0));
        assert!(p.is_degenerate_tail(1));
        assert!(!p.is_degenerate_tail(2));
        assert_eq!(p.key(2), "hello");
        assert_eq!(p.key(3), "");
    }

    #[test]
    fn test_from_words_takes_last_words() {
        let p = Prefix::from_words(&["a", "b", "c", "d"], 2);
        assert_eq!(p.key(0), "c d");
        assert_eq!(p.key(1), "d");
    }

    #[test]
    fn test_zero_length_prefix() {
        let mut p = Prefix::new(0);
        p.shift("anything");
        assert!(p.is_empty());
        assert_eq!(p.key(0), "");
    }
}

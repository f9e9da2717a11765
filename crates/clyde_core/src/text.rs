//! Small string helpers shared by the engine and the transports.

/// Default outgoing line width.
pub const MAX_LINE: usize = 70;

/// Remove an `@REALM` suffix from a sender identity.
pub fn strip_realm(sender: &str) -> &str {
    match sender.split_once('@') {
        Some((name, _)) => name,
        None => sender,
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `word` appears in `text` as a whole word, ignoring case.
pub fn mentions_word(text: &str, word: &str) -> bool {
    let word = word.trim().to_lowercase();
    if word.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    let is_word_char = |c: char| c.is_alphanumeric() || c == '_';
    text.match_indices(&word).any(|(start, found)| {
        let before = text[..start].chars().next_back();
        let after = text[start + found.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

/// Greedily wrap words into lines of at most `max_line` characters.
///
/// A single word longer than the limit gets a line of its own.
pub fn break_lines(text: &str, max_line: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if !line.is_empty() && len + 1 + word_len > max_line {
            lines.push(std::mem::take(&mut line));
            len = 0;
        }
        if !line.is_empty() {
            line.push(' ');
            len += 1;
        }
        line.push_str(word);
        len += word_len;
    }
    lines.push(line);
    lines.join("\n")
}

/// Lowercase a person's name and escape it into a safe file name.
///
/// Alphanumerics, `-` and `_` pass through; every other byte becomes `%XX`.
pub fn escape_name(name: &str) -> String {
    let lowered = normalize_whitespace(name).to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for b in lowered.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_realm() {
        assert_eq!(strip_realm("alice@ATHENA.MIT.EDU"), "alice");
        assert_eq!(strip_realm("alice"), "alice");
        assert_eq!(strip_realm(""), "");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  if  the\tsun\n and "), "if the sun and");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_mentions_word_needs_boundaries() {
        assert!(mentions_word("hi Clyde!", "clyde"));
        assert!(mentions_word("clyde, join us", "clyde"));
        assert!(mentions_word("the clydesdale and clyde", "clyde"));
        assert!(!mentions_word("what a clydesdale", "clyde"));
        assert!(!mentions_word("my_clyde_bot", "clyde"));
        assert!(!mentions_word("anything", ""));
    }

    #[test]
    fn test_break_lines_wraps() {
        let text = "aaaa bbbb cccc dddd";
        assert_eq!(break_lines(text, 9), "aaaa bbbb\ncccc dddd");
        assert_eq!(break_lines(text, 100), text);
    }

    #[test]
    fn test_break_lines_long_word() {
        assert_eq!(break_lines("hi supercalifragilistic yo", 5), "hi\nsupercalifragilistic\nyo");
    }

    #[test]
    fn test_break_lines_empty() {
        assert_eq!(break_lines("", 70), "");
    }

    #[test]
    fn test_escape_name() {
        assert_eq!(escape_name("Ben Bitdiddle"), "ben%20bitdiddle");
        assert_eq!(escape_name("../etc"), "%2E%2E%2Fetc");
        assert_eq!(escape_name("cat_lady-2"), "cat_lady-2");
    }
}

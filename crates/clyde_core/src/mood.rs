//! Mood: a bounded ordinal scale.
//!
//! The scale runs from `0` to a configurable `max`. The reference scale has
//! eight named levels; scales with a different `max` map onto those names
//! proportionally, so "lonely" and "ok" still mean the same thing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight named moods, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    Yucky,
    Angry,
    Unhappy,
    Lonely,
    Turnip,
    Ok,
    Good,
    Great,
}

impl MoodLevel {
    const ALL: [MoodLevel; 8] = [
        MoodLevel::Yucky,
        MoodLevel::Angry,
        MoodLevel::Unhappy,
        MoodLevel::Lonely,
        MoodLevel::Turnip,
        MoodLevel::Ok,
        MoodLevel::Good,
        MoodLevel::Great,
    ];

    fn index(self) -> u32 {
        self as u32
    }

    /// Word or phrase completing the sentence "I am ____".
    pub fn describe(self) -> &'static str {
        match self {
            MoodLevel::Yucky => "yucky",
            MoodLevel::Angry => "angry",
            MoodLevel::Unhappy => "unhappy",
            MoodLevel::Lonely => "lonely",
            MoodLevel::Turnip => "a turnip",
            MoodLevel::Ok => "ok",
            MoodLevel::Good => "good",
            MoodLevel::Great => "great",
        }
    }

    /// Punctuation finishing "I am $mood".
    pub fn punctuation(self) -> &'static str {
        match self {
            MoodLevel::Angry | MoodLevel::Great => "!",
            MoodLevel::Lonely => " :(",
            MoodLevel::Good => " :)",
            _ => ".",
        }
    }
}

const NAMED_MAX: u32 = 7;

/// Current mood on a `[0, max]` scale. Increments and decrements saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mood {
    level: u8,
    max: u8,
}

impl Default for Mood {
    fn default() -> Self {
        Self::at(MoodLevel::Ok, NAMED_MAX as u8)
    }
}

impl Mood {
    /// Create a mood, clamping `level` into `[0, max]`.
    pub fn new(level: u8, max: u8) -> Self {
        Self {
            level: level.min(max),
            max,
        }
    }

    /// The lowest level on a `max` scale that reads as `named` or better.
    pub fn at(named: MoodLevel, max: u8) -> Self {
        let level = Self::floor_of(named, max);
        Self { level, max }
    }

    fn floor_of(named: MoodLevel, max: u8) -> u8 {
        // smallest level with level * 7 / max >= index
        let max32 = max as u32;
        if max32 == 0 {
            return 0;
        }
        let level = (named.index() * max32).div_ceil(NAMED_MAX);
        level.min(max32) as u8
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    /// The named mood this level reads as.
    pub fn named(&self) -> MoodLevel {
        if self.max == 0 {
            return MoodLevel::Ok;
        }
        let idx = self.level as u32 * NAMED_MAX / self.max as u32;
        MoodLevel::ALL[idx.min(NAMED_MAX) as usize]
    }

    /// One step better, saturating at `max`.
    pub fn better(self) -> Self {
        Self {
            level: self.level.saturating_add(1).min(self.max),
            ..self
        }
    }

    /// One step worse, saturating at zero.
    pub fn worse(self) -> Self {
        Self {
            level: self.level.saturating_sub(1),
            ..self
        }
    }

    /// Raise to "ok" if currently below it.
    pub fn at_least_ok(self) -> Self {
        let ok = Self::floor_of(MoodLevel::Ok, self.max);
        Self {
            level: self.level.max(ok),
            ..self
        }
    }

    pub fn is_lonely(&self) -> bool {
        self.named() == MoodLevel::Lonely
    }

    pub fn describe(&self) -> &'static str {
        self.named().describe()
    }

    pub fn punctuation(&self) -> &'static str {
        self.named().punctuation()
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I am {}{}", self.describe(), self.punctuation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ok() {
        let mood = Mood::default();
        assert_eq!(mood.level(), 5);
        assert_eq!(mood.named(), MoodLevel::Ok);
    }

    #[test]
    fn test_better_saturates() {
        let mood = Mood::new(7, 7);
        assert_eq!(mood.better().level(), 7);
        assert_eq!(Mood::new(6, 7).better().named(), MoodLevel::Great);
    }

    #[test]
    fn test_worse_saturates() {
        let mood = Mood::new(0, 7);
        assert_eq!(mood.worse().level(), 0);
        assert_eq!(Mood::new(4, 7).worse().named(), MoodLevel::Lonely);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(Mood::new(200, 7).level(), 7);
    }

    #[test]
    fn test_at_least_ok() {
        assert_eq!(Mood::new(1, 7).at_least_ok().named(), MoodLevel::Ok);
        assert_eq!(Mood::new(7, 7).at_least_ok().named(), MoodLevel::Great);
    }

    #[test]
    fn test_display_sentence() {
        assert_eq!(Mood::new(3, 7).to_string(), "I am lonely :(");
        assert_eq!(Mood::new(4, 7).to_string(), "I am a turnip.");
        assert_eq!(Mood::new(6, 7).to_string(), "I am good :)");
    }

    #[test]
    fn test_scaled_scale_keeps_names() {
        // a 0..=14 scale still has a top, a bottom and an ok floor
        assert_eq!(Mood::new(14, 14).named(), MoodLevel::Great);
        assert_eq!(Mood::new(0, 14).named(), MoodLevel::Yucky);
        let ok = Mood::at(MoodLevel::Ok, 14);
        assert_eq!(ok.named(), MoodLevel::Ok);
        assert_eq!(ok.worse().named(), MoodLevel::Turnip);
        assert_eq!(Mood::new(2, 14).at_least_ok(), ok);
    }

    #[test]
    fn test_lonely_detection() {
        assert!(Mood::at(MoodLevel::Lonely, 7).is_lonely());
        assert!(!Mood::default().is_lonely());
    }
}

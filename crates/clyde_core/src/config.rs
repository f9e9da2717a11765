use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClydeConfig {
    pub identity: IdentityConfig,
    pub chain: ChainConfig,
    pub mood: MoodConfig,
    pub cat: CatConfig,
    pub idle: IdleConfig,
    pub runtime: RuntimeConfig,
}

impl ClydeConfig {
    /// Read `path` as TOML. Sections or keys left out keep their defaults,
    /// and `CLYDE_*` variables win over the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let mut config: ClydeConfig = toml::from_str(&content)
            .with_context(|| format!("{} is not a valid clyde config", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing or broken file just means
    /// the built-in settings (still subject to `CLYDE_*`).
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("No usable config ({:#}), running with built-in settings", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// `CLYDE_*` variables; numbers that fail to parse are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CLYDE_NAME") {
            self.identity.name = v;
        }
        if let Ok(v) = std::env::var("CLYDE_HOME_CHANNEL") {
            self.identity.home_channel = v;
        }
        if let Ok(v) = std::env::var("CLYDE_DATA_DIR") {
            self.runtime.data_dir = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("CLYDE_TICK_SECS") {
            if let Ok(n) = v.parse() {
                self.runtime.tick_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("CLYDE_SEED") {
            if let Ok(n) = v.parse() {
                self.runtime.seed = Some(n);
            }
        }
    }

    /// Directory holding chains, subscriptions and fact stores.
    /// Defaults to `~/.clyde`.
    pub fn data_dir(&self) -> PathBuf {
        match &self.runtime.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".clyde"),
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Name people use to address the bot.
    pub name: String,
    /// Sender id stamped on outgoing messages; incoming messages from it are ignored.
    pub sender: String,
    /// Signature used when the signature chain has nothing to say.
    pub signature: String,
    pub home_channel: String,
    pub home_instance: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "clyde".to_string(),
            sender: "clyde".to_string(),
            signature: "Clyde".to_string(),
            home_channel: "clyde-dev".to_string(),
            home_instance: "personal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub prefix_len: usize,
    /// Hard ceiling on generated words per reply.
    pub max_words: usize,
    /// Sentence counts drawn uniformly from this list; repeats bias the draw.
    pub sentence_weights: Vec<usize>,
    pub signature_max_words: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            prefix_len: 2,
            max_words: 40,
            sentence_weights: vec![1, 1, 1, 2, 2, 3],
            signature_max_words: 6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    pub max: u8,
    pub initial: u8,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self { max: 7, initial: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatConfig {
    pub enabled: bool,
    /// Name the cat goes by, also the command prefix (`zeroday::pet`).
    pub name: String,
    /// Sender id of the cat's messages.
    pub sender: String,
    /// How long the cat must have been left alone before a bored cat is approached.
    pub idle_threshold_secs: i64,
    /// Chance of approaching a bored, long-idle cat.
    pub initiate_probability: f64,
    /// How long the cat may stay carried off before we go fetch it.
    pub held_timeout_secs: i64,
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "zeroday".to_string(),
            sender: "zeroday".to_string(),
            idle_threshold_secs: 3600,
            initiate_probability: 0.5,
            held_timeout_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Quiet time before mood starts sliding toward lonely.
    pub lonely_after_secs: i64,
    /// Per-tick chance of the mood sliding once past `lonely_after_secs`.
    pub sadden_probability: f64,
    /// Quiet time before unprompted chatter becomes possible.
    pub chatter_after_secs: i64,
    /// Per-tick chance of unprompted chatter once past `chatter_after_secs`.
    pub chatter_probability: f64,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            lonely_after_secs: 3600,
            sadden_probability: 0.02,
            chatter_after_secs: 7200,
            chatter_probability: 0.01,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub data_dir: Option<PathBuf>,
    pub tick_interval_secs: u64,
    pub queue_capacity: usize,
    /// Artificial typing delay per character of an outgoing reply.
    pub pace_ms_per_char: u64,
    pub line_width: usize,
    pub seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            tick_interval_secs: 60,
            queue_capacity: 64,
            pace_ms_per_char: 20,
            line_width: crate::text::MAX_LINE,
            seed: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ClydeConfig::default();
        assert_eq!(cfg.identity.name, "clyde");
        assert_eq!(cfg.chain.prefix_len, 2);
        assert_eq!(cfg.mood.max, 7);
        assert_eq!(cfg.cat.name, "zeroday");
        assert!(cfg.runtime.seed.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[identity]
name = "bonnie"
home_channel = "bonnie-dev"
"#;
        let cfg: ClydeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.identity.name, "bonnie");
        assert_eq!(cfg.identity.home_channel, "bonnie-dev");
        // Defaults for unspecified fields
        assert_eq!(cfg.identity.signature, "Clyde");
        assert_eq!(cfg.chain.max_words, 40);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[identity]
name = "clyde"
sender = "clyde-bot"
signature = "Clyde the Great"
home_channel = "clyde"
home_instance = "chatter"

[chain]
prefix_len = 3
max_words = 25
sentence_weights = [1, 2]
signature_max_words = 4

[mood]
max = 14
initial = 10

[cat]
enabled = false
name = "whiskers"
sender = "whiskers@ATHENA"
idle_threshold_secs = 60
initiate_probability = 1.0
held_timeout_secs = 120

[idle]
lonely_after_secs = 10
sadden_probability = 0.5
chatter_after_secs = 20
chatter_probability = 0.25

[runtime]
data_dir = "/tmp/clyde"
tick_interval_secs = 5
queue_capacity = 8
pace_ms_per_char = 0
line_width = 40
seed = 42
"#;
        let cfg: ClydeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.identity.sender, "clyde-bot");
        assert_eq!(cfg.chain.prefix_len, 3);
        assert_eq!(cfg.chain.sentence_weights, vec![1, 2]);
        assert_eq!(cfg.mood.max, 14);
        assert!(!cfg.cat.enabled);
        assert_eq!(cfg.cat.held_timeout_secs, 120);
        assert!((cfg.idle.chatter_probability - 0.25).abs() < 1e-9);
        assert_eq!(cfg.runtime.seed, Some(42));
        assert_eq!(cfg.data_dir(), PathBuf::from("/tmp/clyde"));
    }

    // one test, so the process environment is never touched concurrently
    #[test]
    fn test_environment_renames_and_reseeds() {
        std::env::set_var("CLYDE_NAME", "bonnie");
        std::env::set_var("CLYDE_SEED", "7");
        std::env::set_var("CLYDE_TICK_SECS", "soon");

        let mut cfg = ClydeConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.identity.name, "bonnie");
        assert_eq!(cfg.runtime.seed, Some(7));
        assert_eq!(cfg.runtime.tick_interval_secs, 60);

        std::env::remove_var("CLYDE_NAME");
        std::env::remove_var("CLYDE_SEED");
        std::env::remove_var("CLYDE_TICK_SECS");

        let cfg = ClydeConfig::load_or_default("/no/such/clyde.toml");
        assert_eq!(cfg.identity.name, "clyde");
        assert!(cfg.runtime.seed.is_none());
    }
}

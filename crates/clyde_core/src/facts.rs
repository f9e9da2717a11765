//! Append-only fact stores.
//!
//! Each store is a newline-delimited text file under the data directory.
//! Reads pick a random non-blank line; a missing, unreadable or empty store
//! yields [`FactError::NoData`] rather than a hard failure.

use crate::error::FactError;
use crate::text::escape_name;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Subdirectory holding per-person impersonation stores.
pub const IMPERSONATION_DIR: &str = "impersonate";

/// Which store to read or append to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FactKey {
    /// A plain named store such as `jobs` or `bored`.
    Store(String),
    /// Remembered phrases for one person, keyed by their name.
    Impersonation(String),
}

impl FactKey {
    pub fn store(name: &str) -> Self {
        FactKey::Store(name.to_string())
    }

    pub fn impersonation(person: &str) -> Self {
        FactKey::Impersonation(person.to_string())
    }

    fn relative_path(&self) -> PathBuf {
        match self {
            FactKey::Store(name) => PathBuf::from(escape_name(name)),
            FactKey::Impersonation(person) => {
                Path::new(IMPERSONATION_DIR).join(escape_name(person))
            }
        }
    }

    fn label(&self) -> String {
        match self {
            FactKey::Store(name) => name.clone(),
            FactKey::Impersonation(person) => format!("{}/{}", IMPERSONATION_DIR, person),
        }
    }
}

/// A directory of fact stores.
#[derive(Debug, Clone)]
pub struct FactStore {
    root: PathBuf,
}

impl FactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &FactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Append one line. Embedded newlines are flattened to spaces.
    pub fn append(&self, key: &FactKey, line: &str) -> Result<(), FactError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = line.replace(['\n', '\r'], " ");
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line.trim())?;
        tracing::debug!("Appended to fact store {}", key.label());
        Ok(())
    }

    /// All non-blank lines of a store.
    pub fn lines(&self, key: &FactKey) -> Result<Vec<String>, FactError> {
        let path = self.path_for(key);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            tracing::debug!("Fact store {} unreadable: {}", key.label(), e);
            FactError::NoData(key.label())
        })?;
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            return Err(FactError::NoData(key.label()));
        }
        Ok(lines)
    }

    /// Pick one stored line uniformly at random.
    pub fn random_line<R: Rng + ?Sized>(
        &self,
        key: &FactKey,
        rng: &mut R,
    ) -> Result<String, FactError> {
        let lines = self.lines(key)?;
        lines
            .choose(rng)
            .cloned()
            .ok_or_else(|| FactError::NoData(key.label()))
    }
}

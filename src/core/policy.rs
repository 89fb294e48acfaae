/// Session policy: variant caps, generation quota, cooldown and length hints.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Inclusive sentence-count range handed to a generator as a length hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRange {
    pub min: u8,
    pub max: u8,
}

impl SentenceRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min as usize..=self.max as usize).contains(&count)
    }
}

/// Limits applied to block variant generation within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailPolicy {
    pub max_detail_variants_per_block: usize,
    pub max_detail_generations_per_session: u32,
    pub action_cooldown_ms: u64,
    pub detail_sentence_range: SentenceRange,
    pub expand_sentence_range: SentenceRange,
    /// Generate a detail automatically when a block is opened. Advisory;
    /// callers decide whether to act on it.
    pub auto_detail_on_open: bool,
}

impl Default for DetailPolicy {
    fn default() -> Self {
        Self {
            max_detail_variants_per_block: 3,
            max_detail_generations_per_session: 10,
            action_cooldown_ms: 3000,
            detail_sentence_range: SentenceRange::new(3, 4),
            expand_sentence_range: SentenceRange::new(6, 8),
            auto_detail_on_open: false,
        }
    }
}

impl DetailPolicy {
    /// Load a policy from a RON file. Missing fields take their defaults.
    pub fn load_from_ron(path: &Path) -> Result<DetailPolicy, PolicyError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a policy from a RON string.
    pub fn parse_ron(input: &str) -> Result<DetailPolicy, PolicyError> {
        let policy: DetailPolicy = ron::from_str(input)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_detail_variants_per_block == 0 {
            return Err(PolicyError::Invalid(
                "max_detail_variants_per_block must be at least 1".to_string(),
            ));
        }
        for (name, range) in [
            ("detail_sentence_range", self.detail_sentence_range),
            ("expand_sentence_range", self.expand_sentence_range),
        ] {
            if range.min > range.max {
                return Err(PolicyError::Invalid(format!(
                    "{}: min {} exceeds max {}",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

//! Parser configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// How unprefixed clauses combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Unprefixed clauses are optional (SHOULD)
    #[default]
    Or,
    /// Unprefixed clauses are required (MUST)
    And,
}

/// Configuration for [`PhraseQueryParser`](crate::query::PhraseQueryParser)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field used for terms without an explicit `field:` prefix
    pub default_field: String,
    /// Whether resolved phrases require their tokens in order
    pub in_order: bool,
    /// Default combination of unprefixed clauses
    pub default_operator: Operator,
    /// Edit distance for `term~` without an explicit value
    pub fuzzy_max_edits: u32,
    /// Maximum terms a single wildcard/fuzzy/range may expand to
    pub max_expansions: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_field: "body".to_string(),
            in_order: true,
            default_operator: Operator::Or,
            fuzzy_max_edits: 2,
            max_expansions: 1024,
        }
    }
}

impl ParserConfig {
    /// Load a configuration from a JSON file; missing keys keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

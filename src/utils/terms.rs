//! Indexed term access and multi-term expansion.
//!
//! The parser never reads an index directly; it enumerates terms through
//! [`TermSource`] when a wildcard, fuzzy or range clause has to be expanded
//! inside a phrase.

use crate::error::{QueryError, Result};
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read-only access to the distinct terms of a field, in sorted order.
pub trait TermSource {
    fn terms<'a>(&'a self, field: &str) -> Box<dyn Iterator<Item = &'a str> + 'a>;
}

/// In-memory term dictionary keyed by field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermDictionary {
    fields: BTreeMap<String, BTreeSet<String>>,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, term: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(term.into());
    }

    /// Build a dictionary for one field from a list of terms
    pub fn with_terms<I, S>(field: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dict = Self::new();
        for term in terms {
            dict.insert(field, term);
        }
        dict
    }

    /// Load `{"field": ["term", ...]}` from a JSON file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open term dictionary {}", path.display()))?;
        let dict = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse term dictionary {}", path.display()))?;
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(|terms| terms.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TermSource for TermDictionary {
    fn terms<'a>(&'a self, field: &str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.fields.get(field) {
            Some(terms) => Box::new(terms.iter().map(String::as_str)),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Translate a `*`/`?` glob into an anchored regex
pub fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    re.push_str(&regex::escape(&escaped.to_string()));
                }
            }
            _ => re.push_str(&regex::escape(&ch.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| QueryError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Terms of `field` matching a wildcard pattern
pub fn expand_wildcard(
    source: &dyn TermSource,
    field: &str,
    pattern: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let re = wildcard_regex(pattern)?;
    collect_limited(source.terms(field).filter(|t| re.is_match(t)), field, limit)
}

/// Terms of `field` within `max_edits` of `text`
pub fn expand_fuzzy(
    source: &dyn TermSource,
    field: &str,
    text: &str,
    max_edits: u32,
    limit: usize,
) -> Result<Vec<String>> {
    let max = max_edits as usize;
    collect_limited(
        source
            .terms(field)
            .filter(|t| levenshtein_distance(t, text) <= max),
        field,
        limit,
    )
}

/// Terms of `field` between the bounds; `None` leaves a side open
pub fn expand_range(
    source: &dyn TermSource,
    field: &str,
    lower: Option<&str>,
    upper: Option<&str>,
    include_lower: bool,
    include_upper: bool,
    limit: usize,
) -> Result<Vec<String>> {
    let in_range = |t: &str| {
        let above = match lower {
            Some(lo) if include_lower => t >= lo,
            Some(lo) => t > lo,
            None => true,
        };
        let below = match upper {
            Some(hi) if include_upper => t <= hi,
            Some(hi) => t < hi,
            None => true,
        };
        above && below
    };
    collect_limited(source.terms(field).filter(|t| in_range(*t)), field, limit)
}

fn collect_limited<'a>(
    terms: impl Iterator<Item = &'a str>,
    field: &str,
    limit: usize,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for term in terms {
        if out.len() == limit {
            return Err(QueryError::TooManyExpansions {
                field: field.to_string(),
                limit,
            });
        }
        out.push(term.to_string());
    }
    tracing::trace!(field, expanded = out.len(), "multi-term expansion");
    Ok(out)
}

/// Edit distance between two strings, by chars
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

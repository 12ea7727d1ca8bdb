//! Clause trees: the parsed top-level query, the boolean tree a phrase
//! resolves to, and the positional tree it is rewritten into.

use crate::error::{QueryError, Result};
use crate::query::anchor::AnchorId;
use serde::Serialize;
use std::fmt;

/// Text of the term used when a position must never match.
pub const NEVER_MATCH_TEXT: &str = "\u{0}never-match: no terms expanded\u{0}";

/// Occurrence of a boolean sub-clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Occur {
    /// Required
    Must,
    /// Prohibited
    MustNot,
    /// Optional
    Should,
}

impl Occur {
    pub fn is_prohibited(self) -> bool {
        self == Occur::MustNot
    }
}

/// A single term in a field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermClause {
    pub field: String,
    pub text: String,
    pub boost: f32,
}

impl TermClause {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            text: text.into(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// Inclusive/exclusive lexicographic term range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeClause {
    pub field: String,
    /// `None` is an open bound
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
    pub boost: f32,
}

/// Boolean tree produced when a phrase's text is re-parsed.
///
/// Multi-term constructs are already expanded into `Composite`s of `Term`s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseTree {
    Term(TermClause),
    Composite(Vec<(ClauseTree, Occur)>),
}

impl ClauseTree {
    /// Multiply the boost of every leaf by `boost`.
    pub fn boosted(self, boost: f32) -> Self {
        match self {
            ClauseTree::Term(term) => {
                let scaled = term.boost * boost;
                ClauseTree::Term(term.with_boost(scaled))
            }
            ClauseTree::Composite(children) => ClauseTree::Composite(
                children
                    .into_iter()
                    .map(|(child, occur)| (child.boosted(boost), occur))
                    .collect(),
            ),
        }
    }
}

/// Position-aware clause tree.
///
/// Child order of `Near` mirrors the token order of the phrase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalClause {
    Term(TermClause),
    Near {
        clauses: Vec<PositionalClause>,
        slop: u32,
        in_order: bool,
    },
    Or(Vec<PositionalClause>),
    Not {
        include: Box<PositionalClause>,
        exclude: Box<PositionalClause>,
    },
}

impl PositionalClause {
    /// Term that is guaranteed to match no document.
    pub fn never_matches(field: &str) -> Self {
        PositionalClause::Term(TermClause::new(field, NEVER_MATCH_TEXT))
    }

    /// The always-empty alternation; contributes nothing to an aggregate.
    pub fn empty() -> Self {
        PositionalClause::Or(Vec::new())
    }

    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, PositionalClause::Or(clauses) if clauses.is_empty())
    }

    pub fn is_never_match(&self) -> bool {
        matches!(self, PositionalClause::Term(term) if term.text == NEVER_MATCH_TEXT)
    }

    pub fn near(clauses: Vec<PositionalClause>, slop: u32, in_order: bool) -> Self {
        PositionalClause::Near {
            clauses,
            slop,
            in_order,
        }
    }

    pub fn not(include: PositionalClause, exclude: PositionalClause) -> Self {
        PositionalClause::Not {
            include: Box::new(include),
            exclude: Box::new(exclude),
        }
    }

    /// Field of the first leaf, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            PositionalClause::Term(term) => Some(&term.field),
            PositionalClause::Near { clauses, .. } | PositionalClause::Or(clauses) => {
                clauses.iter().find_map(|c| c.field())
            }
            PositionalClause::Not { include, .. } => include.field(),
        }
    }

    /// Set the weight of a term clause; composite clauses carry no weight
    /// of their own and are left untouched.
    pub fn set_boost(&mut self, boost: f32) {
        if let PositionalClause::Term(term) = self {
            term.boost = boost;
        }
    }

    pub fn boost(&self) -> f32 {
        match self {
            PositionalClause::Term(term) => term.boost,
            _ => 1.0,
        }
    }
}

/// Builds canonical leaf clauses.
pub trait LeafFactory {
    fn positional_term(&self, field: &str, text: &str) -> PositionalClause;
}

/// Leaf factory producing unit-weight positional terms
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLeafFactory;

impl LeafFactory for DefaultLeafFactory {
    fn positional_term(&self, field: &str, text: &str) -> PositionalClause {
        PositionalClause::Term(TermClause::new(field, text))
    }
}

/// Top-level query tree returned by the parser
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Term(TermClause),
    Boolean(Vec<(Query, Occur)>),
    Wildcard {
        field: String,
        pattern: String,
        boost: f32,
    },
    Fuzzy {
        field: String,
        text: String,
        max_edits: u32,
        boost: f32,
    },
    Range(RangeClause),
    Boosted {
        query: Box<Query>,
        boost: f32,
    },
    /// Placeholder for a phrase awaiting resolution
    Phrase(AnchorId),
    Positional(PositionalClause),
}

impl Query {
    /// Short name of the clause kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Query::Term(_) => "term",
            Query::Boolean(_) => "boolean",
            Query::Wildcard { .. } => "wildcard",
            Query::Fuzzy { .. } => "fuzzy",
            Query::Range(_) => "range",
            Query::Boosted { .. } => "boosted",
            Query::Phrase(_) => "phrase placeholder",
            Query::Positional(_) => "positional",
        }
    }

    /// Whether any unresolved phrase placeholder remains
    pub fn has_placeholders(&self) -> bool {
        match self {
            Query::Phrase(_) => true,
            Query::Boolean(children) => children.iter().any(|(c, _)| c.has_placeholders()),
            Query::Boosted { query, .. } => query.has_placeholders(),
            _ => false,
        }
    }
}

impl TryFrom<Query> for ClauseTree {
    type Error = QueryError;

    fn try_from(query: Query) -> Result<Self> {
        match query {
            Query::Term(term) => Ok(ClauseTree::Term(term)),
            Query::Boolean(children) => children
                .into_iter()
                .map(|(child, occur)| ClauseTree::try_from(child).map(|c| (c, occur)))
                .collect::<Result<Vec<_>>>()
                .map(ClauseTree::Composite),
            Query::Boosted { query, boost } => Ok(ClauseTree::try_from(*query)?.boosted(boost)),
            other => Err(QueryError::UnsupportedClause(other.kind().to_string())),
        }
    }
}

impl fmt::Display for Occur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occur::Must => write!(f, "+"),
            Occur::MustNot => write!(f, "-"),
            Occur::Should => Ok(()),
        }
    }
}

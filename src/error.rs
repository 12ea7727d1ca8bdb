//! Error type shared by the grammar, the phrase resolver and the rewriter.

/// Errors raised while parsing or rewriting a query.
///
/// Every variant aborts the whole parse call; there is no partial recovery.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A clause inside a phrase names a field other than the phrase's own.
    #[error("clause field `{candidate}` does not match phrase field `{anchor}`")]
    FieldMismatch { candidate: String, anchor: String },

    /// A clause kind the rewriter cannot handle.
    #[error("unsupported clause: {0}")]
    UnsupportedClause(String),

    /// A non-positional clause was handed to the weighted aggregator.
    #[error("expected a positional clause, got {0}")]
    Type(String),

    /// Malformed query text.
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// A wildcard, fuzzy or range term expanded past the configured limit.
    #[error("expansion on field `{field}` exceeded {limit} terms")]
    TooManyExpansions { field: String, limit: usize },

    /// A wildcard pattern could not be compiled.
    #[error("invalid wildcard pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl QueryError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        QueryError::Syntax {
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

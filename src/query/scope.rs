//! Field scope guard for clauses built inside a phrase.

use crate::error::{QueryError, Result};

/// Fail unless `candidate` is the phrase's field.
///
/// Called before a clause is constructed, never on a finished tree.
pub fn check_same_field(candidate: &str, anchor: &str) -> Result<()> {
    if candidate == anchor {
        Ok(())
    } else {
        Err(QueryError::FieldMismatch {
            candidate: candidate.to_string(),
            anchor: anchor.to_string(),
        })
    }
}

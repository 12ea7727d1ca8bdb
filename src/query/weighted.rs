//! Weighted positional clause aggregation.
//!
//! Collects positional term clauses for one field, merging repeats by
//! summing their weights, and builds either the single surviving clause or
//! an alternation over all of them.

use crate::error::{QueryError, Result};
use crate::query::clause::{LeafFactory, PositionalClause, Query};
use rustc_hash::FxHashMap;

/// Aggregates weighted positional clauses for a single field.
///
/// Weights are summed in `f64` and narrowed to `f32` once in [`build`],
/// so the merged weight does not depend on insertion order unless the
/// partial sums exceed `f64` precision.
///
/// [`build`]: WeightedClauseAggregator::build
pub struct WeightedClauseAggregator<'f, F: LeafFactory + ?Sized> {
    field: String,
    factory: &'f F,
    /// Entries in first-insertion order
    entries: Vec<(PositionalClause, f64)>,
    /// (field, text) of term entries -> index into `entries`
    terms: FxHashMap<(String, String), usize>,
}

impl<'f, F: LeafFactory + ?Sized> WeightedClauseAggregator<'f, F> {
    pub fn new(field: impl Into<String>, factory: &'f F) -> Self {
        Self {
            field: field.into(),
            factory,
            entries: Vec::new(),
            terms: FxHashMap::default(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Add `weight` to the canonical positional term for `text`.
    pub fn add_term(&mut self, text: &str, weight: f32) {
        let clause = self.factory.positional_term(&self.field, text);
        self.add_positional(clause, weight);
    }

    /// Add an already-built clause; only positional clauses are accepted.
    pub fn add_clause(&mut self, clause: Query, weight: f32) -> Result<()> {
        match clause {
            Query::Positional(positional) => {
                self.add_positional(positional, weight);
                Ok(())
            }
            other => Err(QueryError::Type(other.kind().to_string())),
        }
    }

    /// Add a positional clause. Term clauses merge with earlier entries for
    /// the same field and text; the empty sentinel is ignored.
    pub fn add_positional(&mut self, clause: PositionalClause, weight: f32) {
        if clause.is_empty_sentinel() {
            return;
        }

        if let PositionalClause::Term(term) = &clause {
            let key = (term.field.clone(), term.text.clone());
            if let Some(&idx) = self.terms.get(&key) {
                self.entries[idx].1 += f64::from(weight);
                return;
            }
            self.terms.insert(key, self.entries.len());
        }
        self.entries.push((clause, f64::from(weight)));
    }

    /// Build the aggregate: the sole clause when there is exactly one entry,
    /// otherwise an alternation in first-insertion order.
    pub fn build(&self) -> PositionalClause {
        let mut clauses: Vec<PositionalClause> = self
            .entries
            .iter()
            .map(|(clause, weight)| {
                let mut clause = clause.clone();
                clause.set_boost(*weight as f32);
                clause
            })
            .collect();

        if clauses.len() == 1 {
            if let Some(only) = clauses.pop() {
                return only;
            }
        }
        PositionalClause::Or(clauses)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.terms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::clause::{DefaultLeafFactory, TermClause};

    fn term(text: &str, boost: f32) -> PositionalClause {
        PositionalClause::Term(TermClause::new("body", text).with_boost(boost))
    }

    #[test]
    fn test_repeated_terms_sum_weights() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_term("smith", 0.5);
        agg.add_term("jones", 1.0);
        agg.add_term("smith", 2.0);
        agg.add_term("smith", 0.25);
        assert_eq!(agg.count(), 2);
        assert_eq!(
            agg.build(),
            PositionalClause::Or(vec![term("smith", 2.75), term("jones", 1.0)])
        );
    }

    #[test]
    fn test_weight_independent_of_order() {
        let weights = [0.5, 1.5, 2.0, 0.25];
        let mut forward = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        for w in weights {
            forward.add_term("x", w);
        }
        let mut backward = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        for w in weights.iter().rev() {
            backward.add_term("x", *w);
        }
        assert_eq!(forward.build(), term("x", 4.25));
        assert_eq!(forward.build(), backward.build());
    }

    #[test]
    fn test_weight_exact_beyond_f32_precision() {
        let mut small_first = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        for w in [1.0, 1.0, 16_777_216.0] {
            small_first.add_term("x", w);
        }
        let mut large_first = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        for w in [16_777_216.0, 1.0, 1.0] {
            large_first.add_term("x", w);
        }
        assert_eq!(small_first.build(), term("x", 16_777_218.0));
        assert_eq!(small_first.build(), large_first.build());
    }

    #[test]
    fn test_single_clause_unwrapped() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_term("smith", 1.0);
        assert_eq!(agg.build(), term("smith", 1.0));
    }

    #[test]
    fn test_empty_sentinel_is_noop() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_clause(Query::Positional(PositionalClause::empty()), 5.0)
            .unwrap();
        assert_eq!(agg.count(), 0);
        agg.add_term("a", 1.0);
        agg.add_positional(PositionalClause::empty(), 3.0);
        assert_eq!(agg.count(), 1);
    }

    #[test]
    fn test_empty_build_is_empty_sentinel() {
        let agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        assert!(agg.build().is_empty_sentinel());
    }

    #[test]
    fn test_add_clause_rejects_non_positional() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        let err = agg
            .add_clause(Query::Term(TermClause::new("body", "a")), 1.0)
            .unwrap_err();
        assert_eq!(err, QueryError::Type("term".into()));
        assert_eq!(agg.count(), 0);
    }

    #[test]
    fn test_add_clause_merges_with_add_term() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_term("a", 1.0);
        agg.add_clause(Query::Positional(term("a", 9.0)), 2.0).unwrap();
        assert_eq!(agg.build(), term("a", 3.0));
    }

    #[test]
    fn test_composite_entries_are_kept_distinct() {
        let near = PositionalClause::near(vec![term("a", 1.0), term("b", 1.0)], 0, true);
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_positional(near.clone(), 1.0);
        agg.add_positional(near.clone(), 1.0);
        assert_eq!(agg.count(), 2);
        assert_eq!(agg.build(), PositionalClause::Or(vec![near.clone(), near]));
    }

    #[test]
    fn test_clear() {
        let mut agg = WeightedClauseAggregator::new("body", &DefaultLeafFactory);
        agg.add_term("a", 1.0);
        agg.add_term("b", 1.0);
        agg.clear();
        assert_eq!(agg.count(), 0);
        agg.add_term("a", 2.0);
        assert_eq!(agg.build(), term("a", 2.0));
    }
}

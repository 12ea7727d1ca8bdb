//! Rewrites a resolved phrase tree into a positional query.
//!
//! The top level of the phrase becomes a `Near` over its clauses in token
//! order. Nested groups become alternations at a single position, with
//! prohibited members moved into a `Not`. Prohibited top-level clauses are
//! handled by matching the positive clauses with a widened slop and
//! excluding any span that matches the full original sequence.

use crate::error::Result;
use crate::query::clause::{ClauseTree, LeafFactory, Occur, PositionalClause, Query, TermClause};
use crate::query::scope::check_same_field;
use crate::query::weighted::WeightedClauseAggregator;

/// Rewriter bound to one phrase's field, slop and ordering.
pub struct PhraseRewriter<'a, F: LeafFactory + ?Sized> {
    field: &'a str,
    slop: u32,
    in_order: bool,
    factory: &'a F,
}

impl<'a, F: LeafFactory + ?Sized> PhraseRewriter<'a, F> {
    pub fn new(field: &'a str, slop: u32, in_order: bool, factory: &'a F) -> Self {
        Self {
            field,
            slop,
            in_order,
            factory,
        }
    }

    /// Rewrite an externally supplied query. It must convert to a boolean
    /// clause tree whose every leaf lies in this rewriter's field.
    pub fn rewrite_query(&self, query: Query) -> Result<Query> {
        let tree = ClauseTree::try_from(query)?;
        self.check_fields(&tree)?;
        Ok(self.rewrite(&tree))
    }

    /// Rewrite a resolved phrase tree.
    ///
    /// A single term is returned unchanged; a one-term phrase needs no
    /// proximity wrapper.
    pub fn rewrite(&self, tree: &ClauseTree) -> Query {
        let children = match tree {
            ClauseTree::Term(term) => return Query::Term(term.clone()),
            ClauseTree::Composite(children) => children,
        };

        let mut all = Vec::with_capacity(children.len());
        let mut positive = Vec::with_capacity(children.len());
        let mut negatives: u32 = 0;

        for (child, occur) in children {
            let clause = match child {
                ClauseTree::Term(term) => self.leaf(term),
                ClauseTree::Composite(group) => self.group(group),
            };
            if occur.is_prohibited() {
                negatives += 1;
            } else {
                positive.push(clause.clone());
            }
            all.push(clause);
        }

        tracing::debug!(
            field = self.field,
            clauses = all.len(),
            negatives,
            slop = self.slop,
            "rewrote phrase"
        );

        if negatives == 0 {
            return Query::Positional(PositionalClause::near(all, self.slop, self.in_order));
        }

        let include = if positive.len() == 1 {
            positive.remove(0)
        } else {
            PositionalClause::near(positive, self.slop.saturating_add(negatives), self.in_order)
        };
        let exclude = PositionalClause::near(all, self.slop, self.in_order);
        Query::Positional(PositionalClause::not(include, exclude))
    }

    fn leaf(&self, term: &TermClause) -> PositionalClause {
        let mut clause = self.factory.positional_term(&term.field, &term.text);
        clause.set_boost(term.boost);
        clause
    }

    /// One position holding any of the group's included clauses and none of
    /// its excluded ones. Always yields exactly one clause per group.
    fn group(&self, children: &[(ClauseTree, Occur)]) -> PositionalClause {
        let mut included = WeightedClauseAggregator::new(self.field, self.factory);
        let mut excluded = WeightedClauseAggregator::new(self.field, self.factory);

        for (child, occur) in children {
            let target = if occur.is_prohibited() {
                &mut excluded
            } else {
                &mut included
            };
            match child {
                ClauseTree::Term(term) => target.add_term(&term.text, term.boost),
                ClauseTree::Composite(nested) => {
                    let clause = self.group(nested);
                    let weight = clause.boost();
                    target.add_positional(clause, weight);
                }
            }
        }

        // An empty alternation would drop the slot and let the rest of the
        // phrase match on its own.
        let include = if included.count() == 0 {
            PositionalClause::never_matches(self.field)
        } else {
            included.build()
        };

        if excluded.count() == 0 {
            include
        } else {
            PositionalClause::not(include, excluded.build())
        }
    }

    fn check_fields(&self, tree: &ClauseTree) -> Result<()> {
        match tree {
            ClauseTree::Term(term) => check_same_field(&term.field, self.field),
            ClauseTree::Composite(children) => children
                .iter()
                .try_for_each(|(child, _)| self.check_fields(child)),
        }
    }
}

//! Phrase-aware query parser.
//!
//! Parsing runs in two passes over the same grammar:
//!
//! 1. **Capture** - the query is parsed normally. Each quoted phrase becomes
//!    a [`PhraseAnchor`] in an [`AnchorQueue`] and a placeholder in the tree.
//! 2. **Resolve** - each anchor's text is re-parsed with its field as the
//!    default, multi-term constructs expanded against the [`TermSource`],
//!    and every clause checked against the phrase's field as it is built.
//!
//! The resolved trees are then rewritten into positional clauses and
//! substituted for their placeholders.

use crate::config::ParserConfig;
use crate::error::{QueryError, Result};
use crate::query::anchor::{AnchorQueue, PhraseAnchor};
use crate::query::clause::{
    ClauseTree, DefaultLeafFactory, LeafFactory, Occur, Query, RangeClause, TermClause,
};
use crate::query::parser::{ClauseBuilder, MultiTermMode, ParseContext, parse_with};
use crate::query::rewrite::PhraseRewriter;
use crate::query::scope::check_same_field;
use crate::utils::terms::{TermSource, expand_fuzzy, expand_range, expand_wildcard};

/// Query parser that turns quoted phrases into positional queries.
///
/// `parse` takes `&self`; all per-parse state lives in the values passed
/// between the passes, so one parser can serve any number of calls.
pub struct PhraseQueryParser<'a, F: LeafFactory = DefaultLeafFactory> {
    config: ParserConfig,
    terms: &'a dyn TermSource,
    factory: F,
}

impl<'a> PhraseQueryParser<'a> {
    pub fn new(config: ParserConfig, terms: &'a dyn TermSource) -> Self {
        Self {
            config,
            terms,
            factory: DefaultLeafFactory,
        }
    }
}

impl<'a, F: LeafFactory> PhraseQueryParser<'a, F> {
    /// Use a different leaf factory for positional terms.
    pub fn with_factory<G: LeafFactory>(self, factory: G) -> PhraseQueryParser<'a, G> {
        PhraseQueryParser {
            config: self.config,
            terms: self.terms,
            factory,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn in_order(&self) -> bool {
        self.config.in_order
    }

    /// Whether resolved phrases require their terms in order
    pub fn set_in_order(&mut self, in_order: bool) {
        self.config.in_order = in_order;
    }

    /// Parse `text`, rewriting every quoted phrase into a positional query.
    pub fn parse(&self, text: &str) -> Result<Query> {
        let (tree, mut anchors) = self.capture(text)?;
        let resolved = self.resolve(&mut anchors)?;
        tracing::debug!(phrases = resolved, "resolved phrase anchors");
        self.substitute(tree, &anchors)
    }

    /// First pass: parse normally and collect phrase anchors.
    pub fn capture(&self, text: &str) -> Result<(Query, AnchorQueue)> {
        let ctx = self.context(&self.config.default_field, MultiTermMode::Opaque);
        let mut builder = CaptureBuilder {
            anchors: AnchorQueue::new(),
            in_order: self.config.in_order,
        };
        let tree = parse_with(text, &ctx, &mut builder)?;
        tracing::debug!(anchors = builder.anchors.len(), "captured phrases");
        Ok((tree, builder.anchors))
    }

    /// Second pass: re-parse every unresolved anchor in discovery order
    /// under its own field. Returns how many anchors were resolved.
    pub fn resolve(&self, anchors: &mut AnchorQueue) -> Result<usize> {
        let mut resolved = 0;
        for anchor in anchors.iter_mut() {
            if anchor.is_resolved() {
                continue;
            }
            let tree = self.resolve_anchor(anchor)?;
            anchor.set_resolved(tree);
            resolved += 1;
        }
        Ok(resolved)
    }

    fn resolve_anchor(&self, anchor: &PhraseAnchor) -> Result<ClauseTree> {
        tracing::debug!(
            field = %anchor.field,
            text = %anchor.raw_text,
            slop = anchor.slop,
            in_order = anchor.in_order,
            "resolving phrase"
        );
        let ctx = self.context(&anchor.field, MultiTermMode::Expand);
        let mut builder =
            ResolveBuilder::new(&anchor.field, self.terms, self.config.max_expansions);
        let tree = parse_with(&anchor.raw_text, &ctx, &mut builder)?;
        // A lone multi-term token still fills a single position.
        if builder.last_was_expansion {
            return Ok(ClauseTree::Composite(vec![(tree, Occur::Should)]));
        }
        Ok(tree)
    }

    /// Replace each phrase placeholder with its rewritten positional form.
    pub fn substitute(&self, tree: Query, anchors: &AnchorQueue) -> Result<Query> {
        match tree {
            Query::Phrase(id) => {
                let anchor = anchors
                    .get(id)
                    .ok_or_else(|| QueryError::UnsupportedClause(format!("unknown phrase {}", id.0)))?;
                let resolved = anchor.resolved().ok_or_else(|| {
                    QueryError::UnsupportedClause(format!("unresolved phrase {}", id.0))
                })?;
                let rewriter =
                    PhraseRewriter::new(&anchor.field, anchor.slop, anchor.in_order, &self.factory);
                Ok(rewriter.rewrite(resolved))
            }
            Query::Boolean(children) => children
                .into_iter()
                .map(|(child, occur)| self.substitute(child, anchors).map(|c| (c, occur)))
                .collect::<Result<Vec<_>>>()
                .map(Query::Boolean),
            Query::Boosted { query, boost } => Ok(Query::Boosted {
                query: Box::new(self.substitute(*query, anchors)?),
                boost,
            }),
            other => Ok(other),
        }
    }

    fn context<'c>(&self, default_field: &'c str, multi_term: MultiTermMode) -> ParseContext<'c> {
        ParseContext {
            default_field,
            default_operator: self.config.default_operator,
            fuzzy_max_edits: self.config.fuzzy_max_edits,
            multi_term,
        }
    }
}

/// Builds the top-level tree, turning phrases into anchored placeholders.
struct CaptureBuilder {
    anchors: AnchorQueue,
    in_order: bool,
}

impl ClauseBuilder for CaptureBuilder {
    type Clause = Query;

    fn term(&mut self, _: &ParseContext<'_>, field: &str, text: &str) -> Result<Query> {
        Ok(Query::Term(TermClause::new(field, text)))
    }

    fn wildcard(&mut self, _: &ParseContext<'_>, field: &str, pattern: &str) -> Result<Query> {
        Ok(Query::Wildcard {
            field: field.to_string(),
            pattern: pattern.to_string(),
            boost: 1.0,
        })
    }

    fn fuzzy(
        &mut self,
        _: &ParseContext<'_>,
        field: &str,
        text: &str,
        max_edits: u32,
    ) -> Result<Query> {
        Ok(Query::Fuzzy {
            field: field.to_string(),
            text: text.to_string(),
            max_edits,
            boost: 1.0,
        })
    }

    fn range(&mut self, _: &ParseContext<'_>, range: RangeClause) -> Result<Query> {
        Ok(Query::Range(range))
    }

    fn phrase(&mut self, _: &ParseContext<'_>, field: &str, text: &str, slop: u32) -> Result<Query> {
        let id = self
            .anchors
            .push(PhraseAnchor::new(field, text, slop, self.in_order));
        Ok(Query::Phrase(id))
    }

    fn boolean(&mut self, _: &ParseContext<'_>, clauses: Vec<(Query, Occur)>) -> Result<Query> {
        Ok(Query::Boolean(clauses))
    }

    fn boost(&mut self, clause: Query, boost: f32) -> Result<Query> {
        Ok(match clause {
            Query::Term(term) => {
                let scaled = term.boost * boost;
                Query::Term(term.with_boost(scaled))
            }
            Query::Wildcard {
                field,
                pattern,
                boost: b,
            } => Query::Wildcard {
                field,
                pattern,
                boost: b * boost,
            },
            Query::Fuzzy {
                field,
                text,
                max_edits,
                boost: b,
            } => Query::Fuzzy {
                field,
                text,
                max_edits,
                boost: b * boost,
            },
            Query::Range(mut range) => {
                range.boost *= boost;
                Query::Range(range)
            }
            other => Query::Boosted {
                query: Box::new(other),
                boost,
            },
        })
    }
}

/// Builds a phrase's boolean tree, rejecting clauses from other fields and
/// expanding multi-term constructs into composites of terms.
struct ResolveBuilder<'a> {
    field: &'a str,
    terms: &'a dyn TermSource,
    max_expansions: usize,
    /// Whether the most recently built clause is a multi-term expansion
    last_was_expansion: bool,
}

impl<'a> ResolveBuilder<'a> {
    fn new(field: &'a str, terms: &'a dyn TermSource, max_expansions: usize) -> Self {
        Self {
            field,
            terms,
            max_expansions,
            last_was_expansion: false,
        }
    }

    fn expanded(&mut self, field: &str, terms: Vec<String>) -> ClauseTree {
        self.last_was_expansion = true;
        ClauseTree::Composite(
            terms
                .into_iter()
                .map(|text| (ClauseTree::Term(TermClause::new(field, text)), Occur::Should))
                .collect(),
        )
    }

    fn require_expansion(ctx: &ParseContext<'_>, kind: &str) -> Result<()> {
        match ctx.multi_term {
            MultiTermMode::Expand => Ok(()),
            MultiTermMode::Opaque => Err(QueryError::UnsupportedClause(format!(
                "opaque {} inside phrase",
                kind
            ))),
        }
    }
}

impl ClauseBuilder for ResolveBuilder<'_> {
    type Clause = ClauseTree;

    fn term(&mut self, _: &ParseContext<'_>, field: &str, text: &str) -> Result<ClauseTree> {
        check_same_field(field, self.field)?;
        self.last_was_expansion = false;
        Ok(ClauseTree::Term(TermClause::new(field, text)))
    }

    fn wildcard(&mut self, ctx: &ParseContext<'_>, field: &str, pattern: &str) -> Result<ClauseTree> {
        check_same_field(field, self.field)?;
        Self::require_expansion(ctx, "wildcard")?;
        let terms = expand_wildcard(self.terms, field, pattern, self.max_expansions)?;
        Ok(self.expanded(field, terms))
    }

    fn fuzzy(
        &mut self,
        ctx: &ParseContext<'_>,
        field: &str,
        text: &str,
        max_edits: u32,
    ) -> Result<ClauseTree> {
        check_same_field(field, self.field)?;
        Self::require_expansion(ctx, "fuzzy")?;
        let terms = expand_fuzzy(self.terms, field, text, max_edits, self.max_expansions)?;
        Ok(self.expanded(field, terms))
    }

    fn range(&mut self, ctx: &ParseContext<'_>, range: RangeClause) -> Result<ClauseTree> {
        check_same_field(&range.field, self.field)?;
        Self::require_expansion(ctx, "range")?;
        let terms = expand_range(
            self.terms,
            &range.field,
            range.lower.as_deref(),
            range.upper.as_deref(),
            range.include_lower,
            range.include_upper,
            self.max_expansions,
        )?;
        Ok(self.expanded(&range.field, terms))
    }

    fn phrase(&mut self, _: &ParseContext<'_>, field: &str, _: &str, _: u32) -> Result<ClauseTree> {
        check_same_field(field, self.field)?;
        Err(QueryError::UnsupportedClause("phrase nested in phrase".to_string()))
    }

    fn boolean(
        &mut self,
        _: &ParseContext<'_>,
        clauses: Vec<(ClauseTree, Occur)>,
    ) -> Result<ClauseTree> {
        self.last_was_expansion = false;
        Ok(ClauseTree::Composite(clauses))
    }

    fn boost(&mut self, clause: ClauseTree, boost: f32) -> Result<ClauseTree> {
        Ok(clause.boosted(boost))
    }
}

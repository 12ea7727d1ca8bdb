pub mod anchor;
pub mod clause;
pub mod parser;
pub mod phrase;
pub mod rewrite;
pub mod scope;
pub mod weighted;

pub use phrase::PhraseQueryParser;
// Re-exports for public API
pub use anchor::{AnchorId, AnchorQueue, PhraseAnchor};
pub use clause::{
    ClauseTree, DefaultLeafFactory, LeafFactory, Occur, PositionalClause, Query, RangeClause,
    TermClause,
};
pub use parser::{ClauseBuilder, MultiTermMode, ParseContext, parse_with};
pub use rewrite::PhraseRewriter;
pub use scope::check_same_field;
pub use weighted::WeightedClauseAggregator;

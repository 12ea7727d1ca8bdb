//! # spanq - Phrase-to-Proximity Query Rewriting
//!
//! spanq parses text queries and rewrites every quoted phrase into a
//! positional ("span") query that enforces token adjacency and order,
//! including phrases that contain wildcards, fuzzy terms, ranges, groups
//! and negated terms.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`query`] - Grammar, phrase capture/resolution, positional rewriting
//! - [`utils`] - Term enumeration and multi-term expansion
//! - [`config`] - Parser configuration
//! - [`output`] - Query rendering (Lucene-style text and JSON)
//! - [`error`] - Error type shared by every stage
//!
//! ## Quick Start
//!
//! ```
//! use spanq::config::ParserConfig;
//! use spanq::query::PhraseQueryParser;
//! use spanq::utils::TermDictionary;
//!
//! let terms = TermDictionary::with_terms("body", ["fred", "freddy", "smith"]);
//! let parser = PhraseQueryParser::new(ParserConfig::default(), &terms);
//!
//! let query = parser.parse("\"fred* smith\"~1").unwrap();
//! assert_eq!(
//!     query.to_string(),
//!     "spanNear([spanOr([body:fred, body:freddy]), body:smith], 1, true)"
//! );
//! ```
//!
//! ## Two passes
//!
//! 1. **Capture** - the query is parsed normally; phrases become anchors.
//! 2. **Resolve** - each phrase is re-parsed under its own field, with
//!    wildcard/fuzzy/range terms expanded against the term source and every
//!    clause checked against the phrase's field as it is built.
//!
//! The resolved boolean trees are rewritten into `spanNear`/`spanOr`/
//! `spanNot` trees and substituted back into the top-level query.

pub mod config;
pub mod error;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{QueryError, Result};

//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`terms`] - Term enumeration and wildcard/fuzzy/range expansion
//!
//! ## Key Functions
//!
//! ```
//! use spanq::utils::{TermDictionary, expand_wildcard};
//!
//! let dict = TermDictionary::with_terms("body", ["fred", "freddy", "smith"]);
//! let terms = expand_wildcard(&dict, "body", "fred*", 100).unwrap();
//! assert_eq!(terms, vec!["fred", "freddy"]);
//! ```

pub mod terms;

pub use terms::*;

//! Phrase anchors captured during the first parse pass.

use crate::query::clause::ClauseTree;
use serde::Serialize;

/// Index of an anchor in its [`AnchorQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AnchorId(pub usize);

/// A quoted phrase waiting for its field-restricted second pass
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseAnchor {
    pub field: String,
    pub raw_text: String,
    pub slop: u32,
    pub in_order: bool,
    resolved: Option<ClauseTree>,
}

impl PhraseAnchor {
    pub fn new(field: impl Into<String>, raw_text: impl Into<String>, slop: u32, in_order: bool) -> Self {
        Self {
            field: field.into(),
            raw_text: raw_text.into(),
            slop,
            in_order,
            resolved: None,
        }
    }

    pub fn resolved(&self) -> Option<&ClauseTree> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Store the second-pass tree. An anchor is resolved exactly once.
    pub(crate) fn set_resolved(&mut self, tree: ClauseTree) {
        debug_assert!(self.resolved.is_none(), "phrase anchor resolved twice");
        self.resolved = Some(tree);
    }
}

/// Anchors in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnchorQueue {
    anchors: Vec<PhraseAnchor>,
}

impl AnchorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, anchor: PhraseAnchor) -> AnchorId {
        self.anchors.push(anchor);
        AnchorId(self.anchors.len() - 1)
    }

    pub fn get(&self, id: AnchorId) -> Option<&PhraseAnchor> {
        self.anchors.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhraseAnchor> {
        self.anchors.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut PhraseAnchor> {
        self.anchors.iter_mut()
    }
}

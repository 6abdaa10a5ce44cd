//! The message-structure definition tree.
//!
//! A structure is an ordered tree of segment nodes and segment-group nodes,
//! each optionally present and optionally repeating. Groups carry an ordered
//! child list and may be a choice, in which case exactly one child matches.

use serde::{Deserialize, Serialize};

/// One node of a structure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureNode {
    Segment(SegmentNode),
    Group(GroupNode),
}

impl StructureNode {
    /// A required, non-repeating segment node.
    pub fn segment(code: impl Into<String>) -> Self {
        StructureNode::Segment(SegmentNode {
            code: code.into(),
            optional: false,
            repeating: false,
        })
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        match &mut self {
            StructureNode::Segment(node) => node.optional = optional,
            StructureNode::Group(node) => node.optional = optional,
        }
        self
    }

    pub fn with_repeating(mut self, repeating: bool) -> Self {
        match &mut self {
            StructureNode::Segment(node) => node.repeating = repeating,
            StructureNode::Group(node) => node.repeating = repeating,
        }
        self
    }
}

/// A named segment position within a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentNode {
    pub code: String,
    pub optional: bool,
    pub repeating: bool,
}

/// A named cluster of segments treated as one nesting unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    pub name: String,
    pub optional: bool,
    pub repeating: bool,
    /// When true, exactly one child matches per occurrence.
    pub choice: bool,
    pub children: Vec<StructureNode>,
}

impl GroupNode {
    pub fn new(name: impl Into<String>, children: Vec<StructureNode>) -> Self {
        GroupNode {
            name: name.into(),
            optional: false,
            repeating: false,
            choice: false,
            children,
        }
    }
}

/// A complete message-structure definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStructure {
    /// Structure identifier, e.g. `ADT_A01`.
    pub id: String,
    /// Top-level nodes in document order.
    pub children: Vec<StructureNode>,
}

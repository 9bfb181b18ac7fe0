//! Source location tags

use crate::model::CodeModel;
use crate::traverse::NodeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A span in a source document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Document path or name
    pub document: String,
    /// Offset of the first character
    pub start_offset: u32,
    /// Number of characters
    pub length: u32,
}

impl Location {
    /// Creates a new location
    pub fn new(document: impl Into<String>, start_offset: u32, length: u32) -> Self {
        Self {
            document: document.into(),
            start_offset,
            length,
        }
    }

    /// Offset one past the last character
    pub fn end_offset(&self) -> u32 {
        self.start_offset.saturating_add(self.length)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.document, self.start_offset, self.end_offset())
    }
}

/// Maps nodes to the source locations a debugger should show for them.
///
/// Advisory only: converters use it when source tracking is enabled and
/// must tolerate empty answers.
pub trait SourceLocationProvider: Send + Sync {
    /// Locations that best describe `node`
    fn primary_locations(&self, model: &CodeModel, node: NodeRef) -> Vec<Location>;
}

/// Provider that reports the tags stored on the nodes themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeLocations;

impl SourceLocationProvider for NodeLocations {
    fn primary_locations(&self, model: &CodeModel, node: NodeRef) -> Vec<Location> {
        match node {
            NodeRef::Expression(id) => model.expression(id).locations.clone(),
            NodeRef::Statement(id) => model.statement(id).locations.clone(),
        }
    }
}

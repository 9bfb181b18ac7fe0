//! Read-only traversal over expression and statement trees

use crate::error::Result;
use crate::ids::{ExprId, LocalId, ParamId, StmtId};
use crate::model::{CodeModel, ModelHashSet};
use crate::rewrite::HandleRewriter;
use std::fmt;

/// Handle of either node category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Expression(ExprId),
    Statement(StmtId),
}

impl NodeRef {
    /// Whether this is one of the shared placeholders
    pub fn is_dummy(&self) -> bool {
        match self {
            NodeRef::Expression(id) => *id == ExprId::DUMMY,
            NodeRef::Statement(id) => *id == StmtId::DUMMY_BLOCK,
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Expression(id) => id.fmt(f),
            NodeRef::Statement(id) => id.fmt(f),
        }
    }
}

impl From<ExprId> for NodeRef {
    fn from(id: ExprId) -> Self {
        NodeRef::Expression(id)
    }
}

impl From<StmtId> for NodeRef {
    fn from(id: StmtId) -> Self {
        NodeRef::Statement(id)
    }
}

/// Locals and parameters a node declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations {
    pub locals: Vec<LocalId>,
    pub parameters: Vec<ParamId>,
}

#[derive(Default)]
struct ChildCollector {
    children: Vec<NodeRef>,
    declarations: Declarations,
}

impl HandleRewriter for ChildCollector {
    fn expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.children.push(NodeRef::Expression(expression));
        Ok(expression)
    }

    fn statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.children.push(NodeRef::Statement(statement));
        Ok(statement)
    }

    fn declared_local(&mut self, local: LocalId) -> Result<LocalId> {
        self.declarations.locals.push(local);
        Ok(local)
    }

    fn declared_parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        self.declarations.parameters.push(parameter);
        Ok(parameter)
    }
}

impl CodeModel {
    fn collect(&self, node: NodeRef) -> ChildCollector {
        let mut collector = ChildCollector::default();
        // The collector never fails
        let _ = match node {
            NodeRef::Expression(id) => self.expression(id).clone().rewrite_children(&mut collector),
            NodeRef::Statement(id) => self.statement(id).clone().rewrite_children(&mut collector),
        };
        collector
    }

    /// Direct children of a node, in canonical order
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.collect(node).children
    }

    /// Locals and parameters declared directly by a node
    pub fn declarations(&self, node: NodeRef) -> Declarations {
        self.collect(node).declarations
    }

    /// Pre-order walk of everything reachable from `root`
    pub fn descendants(&self, root: NodeRef) -> Traversal<'_> {
        Traversal::new(self).from(root)
    }
}

/// Iterative pre-order depth-first traversal
///
/// Each node is yielded once even when subtrees are shared. The dummy
/// placeholders are skipped.
pub struct Traversal<'m> {
    model: &'m CodeModel,
    stack: Vec<NodeRef>,
    visited: ModelHashSet<NodeRef>,
}

impl<'m> Traversal<'m> {
    /// Empty traversal over `model`
    pub fn new(model: &'m CodeModel) -> Self {
        Self {
            model,
            stack: Vec::new(),
            visited: ModelHashSet::default(),
        }
    }

    /// Adds a root. Roots are walked in the order they were added.
    pub fn from(mut self, root: NodeRef) -> Self {
        self.stack.insert(0, root);
        self
    }
}

impl Iterator for Traversal<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        while let Some(node) = self.stack.pop() {
            if node.is_dummy() || !self.visited.insert(node) {
                continue;
            }
            let children = self.model.children(node);
            self.stack.extend(children.into_iter().rev());
            return Some(node);
        }
        None
    }
}

#[cfg(test)]
#[path = "traverse_tests.rs"]
mod tests;

//! Structural comparison of subtrees
//!
//! Two subtrees are structurally equal when they have the same shape and the
//! same field values, ignoring node handles. Locals and parameters must
//! correspond one-to-one: if `x` maps to `y` once, every later use of `x`
//! must pair with `y`.

use crate::error::Result;
use crate::ids::{ExprId, LocalId, ParamId, StmtId};
use crate::model::{CodeModel, ModelHashMap};
use crate::rewrite::HandleRewriter;
use crate::traverse::NodeRef;

#[derive(Default)]
struct Eraser {
    children: Vec<NodeRef>,
    locals: Vec<LocalId>,
    parameters: Vec<ParamId>,
}

impl HandleRewriter for Eraser {
    fn expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.children.push(NodeRef::Expression(expression));
        Ok(ExprId::DUMMY)
    }

    fn statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.children.push(NodeRef::Statement(statement));
        Ok(StmtId::DUMMY_BLOCK)
    }

    fn local(&mut self, local: LocalId) -> Result<LocalId> {
        self.locals.push(local);
        Ok(LocalId::DUMMY)
    }

    fn parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        self.parameters.push(parameter);
        Ok(ParamId::DUMMY)
    }
}

struct Comparer<'a> {
    left: &'a CodeModel,
    right: &'a CodeModel,
    locals: ModelHashMap<LocalId, LocalId>,
    locals_back: ModelHashMap<LocalId, LocalId>,
    parameters: ModelHashMap<ParamId, ParamId>,
    parameters_back: ModelHashMap<ParamId, ParamId>,
}

fn pair<T: Copy + Eq + std::hash::Hash>(
    forward: &mut ModelHashMap<T, T>,
    back: &mut ModelHashMap<T, T>,
    a: T,
    b: T,
) -> Option<bool> {
    match (forward.get(&a), back.get(&b)) {
        (Some(mapped), _) => Some(*mapped == b),
        (None, Some(_)) => Some(false),
        (None, None) => {
            forward.insert(a, b);
            back.insert(b, a);
            None
        }
    }
}

impl Comparer<'_> {
    fn erase(model: &CodeModel, node: NodeRef, eraser: &mut Eraser) -> NodeValue {
        // Erasing never fails
        match node {
            NodeRef::Expression(id) => {
                let mut expression = model.expression(id).clone();
                let _ = expression.rewrite_children(eraser);
                NodeValue::Expression(expression)
            }
            NodeRef::Statement(id) => {
                let mut statement = model.statement(id).clone();
                let _ = statement.rewrite_children(eraser);
                NodeValue::Statement(statement)
            }
        }
    }

    fn nodes(&mut self, a: NodeRef, b: NodeRef) -> bool {
        match (a.is_dummy(), b.is_dummy()) {
            (true, true) => return true,
            (false, false) => {}
            _ => return false,
        }
        let mut left = Eraser::default();
        let mut right = Eraser::default();
        if Self::erase(self.left, a, &mut left) != Self::erase(self.right, b, &mut right) {
            return false;
        }
        if left.children.len() != right.children.len()
            || left.locals.len() != right.locals.len()
            || left.parameters.len() != right.parameters.len()
        {
            return false;
        }
        for (x, y) in left.locals.iter().zip(&right.locals) {
            match pair(&mut self.locals, &mut self.locals_back, *x, *y) {
                Some(false) => return false,
                Some(true) => {}
                None => {
                    if self.left.local(*x) != self.right.local(*y) {
                        return false;
                    }
                }
            }
        }
        for (x, y) in left.parameters.iter().zip(&right.parameters) {
            match pair(&mut self.parameters, &mut self.parameters_back, *x, *y) {
                Some(false) => return false,
                Some(true) => {}
                None => {
                    let (px, py) = (self.left.parameter(*x), self.right.parameter(*y));
                    // Owners differ between a tree and its copy
                    if px.name != py.name || px.ty != py.ty || px.index != py.index {
                        return false;
                    }
                }
            }
        }
        left.children
            .iter()
            .zip(&right.children)
            .all(|(x, y)| self.nodes(*x, *y))
    }
}

#[derive(PartialEq)]
enum NodeValue {
    Expression(crate::expressions::Expression),
    Statement(crate::statements::Statement),
}

/// Whether `a` in `left` and `b` in `right` are structurally equal
pub fn structurally_equal(left: &CodeModel, a: NodeRef, right: &CodeModel, b: NodeRef) -> bool {
    Comparer {
        left,
        right,
        locals: ModelHashMap::default(),
        locals_back: ModelHashMap::default(),
        parameters: ModelHashMap::default(),
        parameters_back: ModelHashMap::default(),
    }
    .nodes(a, b)
}

#[cfg(test)]
#[path = "equality_tests.rs"]
mod tests;

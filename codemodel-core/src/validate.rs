//! Structural validation
//!
//! Rejects trees no front end should produce: dangling handles, receivers on
//! static calls, assignments to non-targets and the like. Transforms assume
//! validated input and do not re-check.

use crate::error::{Error, Result};
use crate::expressions::{
    AddressDereference, AddressableDefinition, AddressableExpression, ArrayIndexer,
    BoundDefinition, ExpressionKind, ExpressionNode, TargetDefinition, TargetExpression,
    ThisReference,
};
use crate::ids::{ExprId, FieldId, LocalId, MethodId, ParamId, PropertyId, StmtId, TypeId};
use crate::model::{CodeModel, ModelHashSet};
use crate::rewrite::HandleRewriter;
use crate::traverse::NodeRef;

struct ResolveCheck<'m> {
    model: &'m CodeModel,
}

fn dangling(handle: impl ToString) -> Error {
    Error::DanglingHandle(handle.to_string())
}

impl HandleRewriter for ResolveCheck<'_> {
    fn expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.model.try_expression(expression).ok_or_else(|| dangling(expression))?;
        Ok(expression)
    }

    fn statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.model.try_statement(statement).ok_or_else(|| dangling(statement))?;
        Ok(statement)
    }

    fn local(&mut self, local: LocalId) -> Result<LocalId> {
        self.model.try_local(local).ok_or_else(|| dangling(local))?;
        Ok(local)
    }

    fn parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        self.model.try_parameter(parameter).ok_or_else(|| dangling(parameter))?;
        Ok(parameter)
    }

    fn field(&mut self, field: FieldId) -> Result<FieldId> {
        self.model.try_field(field).ok_or_else(|| dangling(field))?;
        Ok(field)
    }

    fn method(&mut self, method: MethodId) -> Result<MethodId> {
        self.model.try_method(method).ok_or_else(|| dangling(method))?;
        Ok(method)
    }

    fn property(&mut self, property: PropertyId) -> Result<PropertyId> {
        self.model.try_property(property).ok_or_else(|| dangling(property))?;
        Ok(property)
    }

    fn type_reference(&mut self, ty: TypeId) -> Result<TypeId> {
        self.model.try_type_definition(ty).ok_or_else(|| dangling(ty))?;
        Ok(ty)
    }
}

fn malformed(node: ExprId, kind: &'static str, reason: &str) -> Error {
    Error::MalformedNode {
        node: node.to_string(),
        kind,
        reason: reason.to_string(),
    }
}

impl CodeModel {
    /// Validates every node reachable from `root`
    pub fn validate(&self, root: NodeRef) -> Result<()> {
        let mut stack = vec![root];
        let mut seen = ModelHashSet::default();
        while let Some(node) = stack.pop() {
            if node.is_dummy() || !seen.insert(node) {
                continue;
            }
            let mut check = ResolveCheck { model: self };
            match node {
                NodeRef::Expression(id) => {
                    check.expression(id)?;
                    self.expression(id).clone().rewrite_children(&mut check)?;
                    self.validate_expression(id)?;
                }
                NodeRef::Statement(id) => {
                    check.statement(id)?;
                    self.statement(id).clone().rewrite_children(&mut check)?;
                }
            }
            stack.extend(self.children(node));
        }
        Ok(())
    }

    fn is_kind<T: ExpressionNode>(&self, id: ExprId) -> bool {
        self.expression_node::<T>(id).is_some()
    }

    fn check_field_receiver(
        &self,
        id: ExprId,
        kind: &'static str,
        field: FieldId,
        instance: Option<ExprId>,
    ) -> Result<()> {
        match (self.field(field).is_static, instance.is_some()) {
            (true, true) => Err(malformed(id, kind, "static field accessed through an instance")),
            (false, false) => Err(malformed(
                id,
                kind,
                "instance field accessed without an instance",
            )),
            _ => Ok(()),
        }
    }

    fn validate_expression(&self, id: ExprId) -> Result<()> {
        let kind = &self.expression(id).kind;
        let name = kind.name();
        match kind {
            ExpressionKind::MethodCall(call) => {
                if call.is_static_call && call.this_argument.is_some() {
                    return Err(malformed(id, name, "static call carries a this argument"));
                }
                if call.has_receiver() && call.this_argument.is_none() {
                    return Err(malformed(id, name, "instance call has no this argument"));
                }
            }
            ExpressionKind::Assignment(assignment) => {
                if !self.is_kind::<TargetExpression>(assignment.target) {
                    return Err(malformed(id, name, "target is not a target expression"));
                }
            }
            ExpressionKind::OutArgument(out) => {
                if !self.is_kind::<TargetExpression>(out.expression) {
                    return Err(malformed(id, name, "argument is not a target expression"));
                }
            }
            ExpressionKind::AddressOf(address_of) => {
                if !self.is_kind::<AddressableExpression>(address_of.expression) {
                    return Err(malformed(id, name, "operand is not addressable"));
                }
            }
            ExpressionKind::RefArgument(argument) => {
                if !self.is_kind::<AddressableExpression>(argument.expression) {
                    return Err(malformed(id, name, "argument is not addressable"));
                }
            }
            ExpressionKind::BoundExpression(bound) => {
                if let BoundDefinition::Field(field) = bound.definition {
                    self.check_field_receiver(id, name, field, bound.instance)?;
                }
            }
            ExpressionKind::TargetExpression(target) => match target.definition {
                TargetDefinition::Field(field) => {
                    self.check_field_receiver(id, name, field, target.instance)?;
                }
                TargetDefinition::ArrayIndexer(indexer)
                    if !self.is_kind::<ArrayIndexer>(indexer) =>
                {
                    return Err(malformed(id, name, "indexer definition is not an array indexer"));
                }
                TargetDefinition::AddressDereference(deref)
                    if !self.is_kind::<AddressDereference>(deref) =>
                {
                    return Err(malformed(id, name, "dereference definition is not a dereference"));
                }
                _ => {}
            },
            ExpressionKind::AddressableExpression(addressable) => match addressable.definition {
                AddressableDefinition::Field(field) => {
                    self.check_field_receiver(id, name, field, addressable.instance)?;
                }
                AddressableDefinition::ArrayIndexer(indexer)
                    if !self.is_kind::<ArrayIndexer>(indexer) =>
                {
                    return Err(malformed(id, name, "indexer definition is not an array indexer"));
                }
                AddressableDefinition::AddressDereference(deref)
                    if !self.is_kind::<AddressDereference>(deref) =>
                {
                    return Err(malformed(id, name, "dereference definition is not a dereference"));
                }
                AddressableDefinition::This(this) if !self.is_kind::<ThisReference>(this) => {
                    return Err(malformed(id, name, "this definition is not a this reference"));
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;

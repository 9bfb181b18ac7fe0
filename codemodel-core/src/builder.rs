//! Shorthand constructors for common nodes
//!
//! Result types are taken from the referenced definitions, so the built
//! nodes are well-typed as long as the definitions are.

use crate::error::Result;
use crate::expressions::{
    Assignment, BoundDefinition, BoundExpression, CompileTimeConstant, Constant, Expression,
    ExpressionKind, MethodCall, TargetDefinition, TargetExpression, ThisReference,
};
use crate::ids::{ExprId, FieldId, LocalId, MethodId, ParamId, StmtId, TypeId};
use crate::members::{LocalDefinition, ParameterDefinition, SignatureOwner};
use crate::model::CodeModel;
use crate::statements::{
    BlockStatement, ExpressionStatement, LocalDeclarationStatement, ReturnStatement, Statement,
    StatementKind,
};

impl CodeModel {
    /// Adds an untagged expression
    pub fn new_expression(
        &mut self,
        kind: impl Into<ExpressionKind>,
        ty: TypeId,
    ) -> Result<ExprId> {
        self.add_expression(Expression::new(kind, ty))
    }

    /// Adds an untagged statement
    pub fn new_statement(&mut self, kind: impl Into<StatementKind>) -> Result<StmtId> {
        self.add_statement(Statement::new(kind))
    }

    /// A literal typed by its platform type
    pub fn constant(&mut self, value: Constant) -> Result<ExprId> {
        let ty = value.platform_type();
        self.new_expression(CompileTimeConstant { value }, ty)
    }

    /// `this` inside a member of `ty`
    pub fn this_reference(&mut self, ty: TypeId) -> Result<ExprId> {
        self.new_expression(ThisReference, ty)
    }

    /// Read of a local
    pub fn bound_local(&mut self, local: LocalId) -> Result<ExprId> {
        let ty = self.local(local).ty;
        self.new_expression(
            BoundExpression {
                definition: BoundDefinition::Local(local),
                ..Default::default()
            },
            ty,
        )
    }

    /// Read of a parameter
    pub fn bound_parameter(&mut self, parameter: ParamId) -> Result<ExprId> {
        let ty = self.parameter(parameter).ty;
        self.new_expression(
            BoundExpression {
                definition: BoundDefinition::Parameter(parameter),
                ..Default::default()
            },
            ty,
        )
    }

    /// Read of a field; `instance` is absent for static fields
    pub fn bound_field(&mut self, instance: Option<ExprId>, field: FieldId) -> Result<ExprId> {
        let ty = self.field(field).ty;
        self.new_expression(
            BoundExpression {
                definition: BoundDefinition::Field(field),
                instance,
                ..Default::default()
            },
            ty,
        )
    }

    /// Write target for a local
    pub fn target_local(&mut self, local: LocalId) -> Result<ExprId> {
        let ty = self.local(local).ty;
        self.new_expression(
            TargetExpression {
                definition: TargetDefinition::Local(local),
                ..Default::default()
            },
            ty,
        )
    }

    /// Write target for a field; `instance` is absent for static fields
    pub fn target_field(&mut self, instance: Option<ExprId>, field: FieldId) -> Result<ExprId> {
        let ty = self.field(field).ty;
        self.new_expression(
            TargetExpression {
                definition: TargetDefinition::Field(field),
                instance,
                ..Default::default()
            },
            ty,
        )
    }

    /// `target = source`, typed like the target
    pub fn assignment(&mut self, target: ExprId, source: ExprId) -> Result<ExprId> {
        let ty = self.expression(target).ty;
        self.new_expression(Assignment { target, source }, ty)
    }

    /// Call of `method`. Static-ness and virtual dispatch follow the method
    /// definition; `this_argument` must be absent for static methods.
    pub fn call(
        &mut self,
        this_argument: Option<ExprId>,
        method: MethodId,
        arguments: Vec<ExprId>,
    ) -> Result<ExprId> {
        let definition = self.method(method);
        let ty = definition.return_type;
        let call = MethodCall {
            this_argument,
            arguments,
            method_to_call: method,
            is_static_call: definition.is_static,
            is_virtual_call: definition.is_virtual && !definition.is_static,
            ..Default::default()
        };
        self.new_expression(call, ty)
    }

    /// `expression;`
    pub fn expression_statement(&mut self, expression: ExprId) -> Result<StmtId> {
        self.new_statement(ExpressionStatement { expression })
    }

    /// `{ statements }`
    pub fn block(&mut self, statements: Vec<StmtId>) -> Result<StmtId> {
        self.new_statement(BlockStatement::new(statements))
    }

    /// `return expression;`
    pub fn return_statement(&mut self, expression: Option<ExprId>) -> Result<StmtId> {
        self.new_statement(ReturnStatement { expression })
    }

    /// `T local = initial_value;`
    pub fn local_declaration(
        &mut self,
        local: LocalId,
        initial_value: Option<ExprId>,
    ) -> Result<StmtId> {
        self.new_statement(LocalDeclarationStatement {
            local_variable: local,
            initial_value,
        })
    }

    /// Adds a plain local
    pub fn new_local(&mut self, name: impl Into<String>, ty: TypeId) -> Result<LocalId> {
        self.add_local(LocalDefinition::new(name, ty))
    }

    /// Appends a by-value parameter to `method`'s signature
    pub fn new_parameter(
        &mut self,
        method: MethodId,
        name: impl Into<String>,
        ty: TypeId,
    ) -> Result<ParamId> {
        let index = u16::try_from(self.method(method).parameters.len()).unwrap_or(u16::MAX);
        let parameter = self.add_parameter(ParameterDefinition::new(
            name,
            ty,
            index,
            SignatureOwner::Method(method),
        ))?;
        self.method_mut(method).parameters.push(parameter);
        Ok(parameter)
    }
}

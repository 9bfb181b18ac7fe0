//! Handle rewriting over node children
//!
//! Every node kind knows the order and category of its children. A
//! [`HandleRewriter`] receives each child handle and returns its
//! replacement; copiers, mutators and read-only walks are all built on it.
//!
//! Rewriting operates on a detached node value, so the rewriter is free to
//! grow or patch the model while children are processed.

use crate::error::Result;
use crate::expressions::{
    AddressableDefinition, ArrayIndexer, BoundDefinition, Expression, ExpressionKind,
    TargetDefinition, TokenDefinition,
};
use crate::ids::{ExprId, FieldId, LocalId, MethodId, ParamId, PropertyId, StmtId, TypeId};
use crate::model::CodeModel;
use crate::statements::{CatchClause, Statement, StatementKind, SwitchCase};

/// Callback receiving each child handle of a node
pub trait HandleRewriter {
    /// Child expression
    fn expression(&mut self, expression: ExprId) -> Result<ExprId>;

    /// Child statement
    fn statement(&mut self, statement: StmtId) -> Result<StmtId>;

    /// A list of child expressions, in order
    fn expressions(&mut self, expressions: Vec<ExprId>) -> Result<Vec<ExprId>> {
        expressions.into_iter().map(|e| self.expression(e)).collect()
    }

    /// A list of child statements, in order
    fn statements(&mut self, statements: Vec<StmtId>) -> Result<Vec<StmtId>> {
        statements.into_iter().map(|s| self.statement(s)).collect()
    }

    /// A local referenced by the node
    fn local(&mut self, local: LocalId) -> Result<LocalId> {
        Ok(local)
    }

    /// A local declared by the node (declaration, foreach variable, catch container)
    fn declared_local(&mut self, local: LocalId) -> Result<LocalId> {
        self.local(local)
    }

    /// A parameter referenced by the node
    fn parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        Ok(parameter)
    }

    /// A parameter declared by the node (anonymous delegate signature)
    fn declared_parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        self.parameter(parameter)
    }

    fn field(&mut self, field: FieldId) -> Result<FieldId> {
        Ok(field)
    }

    fn method(&mut self, method: MethodId) -> Result<MethodId> {
        Ok(method)
    }

    fn property(&mut self, property: PropertyId) -> Result<PropertyId> {
        Ok(property)
    }

    fn type_reference(&mut self, ty: TypeId) -> Result<TypeId> {
        Ok(ty)
    }

    fn switch_case(&mut self, case: SwitchCase) -> Result<SwitchCase> {
        case.rewrite_children(self)
    }

    fn catch_clause(&mut self, clause: CatchClause) -> Result<CatchClause> {
        clause.rewrite_children(self)
    }
}

fn expr<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut ExprId) -> Result<()> {
    *slot = r.expression(*slot)?;
    Ok(())
}

fn opt_expr<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut Option<ExprId>) -> Result<()> {
    if let Some(e) = slot {
        *e = r.expression(*e)?;
    }
    Ok(())
}

fn exprs<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut Vec<ExprId>) -> Result<()> {
    *slot = r.expressions(std::mem::take(slot))?;
    Ok(())
}

fn stmt<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut StmtId) -> Result<()> {
    *slot = r.statement(*slot)?;
    Ok(())
}

fn opt_stmt<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut Option<StmtId>) -> Result<()> {
    if let Some(s) = slot {
        *s = r.statement(*s)?;
    }
    Ok(())
}

fn stmts<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut Vec<StmtId>) -> Result<()> {
    *slot = r.statements(std::mem::take(slot))?;
    Ok(())
}

fn ty<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut TypeId) -> Result<()> {
    *slot = r.type_reference(*slot)?;
    Ok(())
}

impl Expression {
    /// Rewrites the kind's children, then the result type
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        self.kind.rewrite_children(r)?;
        ty(r, &mut self.ty)
    }

    /// For a target whose definition is an array indexer, takes the
    /// instance and the type from that indexer as it stands in `model`.
    ///
    /// Call after rewriting: the indexer may have been replaced, and the
    /// target must write into the replacement's array.
    pub fn sync_indexer_target(&mut self, model: &CodeModel) {
        if let ExpressionKind::TargetExpression(target) = &mut self.kind {
            if let TargetDefinition::ArrayIndexer(indexer) = target.definition {
                if let Some(node) = model.expression_node::<ArrayIndexer>(indexer) {
                    target.instance = Some(node.indexed_object);
                    self.ty = model.expression(indexer).ty;
                }
            }
        }
    }
}

impl ExpressionKind {
    /// Passes every child handle through `r`, in evaluation-independent
    /// canonical order
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        match self {
            ExpressionKind::Addition(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::BitwiseAnd(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::BitwiseOr(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::Division(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::Equality(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::ExclusiveOr(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::GreaterThan(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::GreaterThanOrEqual(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::LeftShift(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::LessThan(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::LessThanOrEqual(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::Modulus(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::Multiplication(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::NotEquality(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::RightShift(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::Subtraction(n) => {
                expr(r, &mut n.left_operand)?;
                expr(r, &mut n.right_operand)
            }
            ExpressionKind::AddressableExpression(n) => {
                n.definition = match n.definition {
                    AddressableDefinition::Local(l) => AddressableDefinition::Local(r.local(l)?),
                    AddressableDefinition::Parameter(p) => {
                        AddressableDefinition::Parameter(r.parameter(p)?)
                    }
                    AddressableDefinition::Field(f) => AddressableDefinition::Field(r.field(f)?),
                    AddressableDefinition::ArrayIndexer(e) => {
                        AddressableDefinition::ArrayIndexer(r.expression(e)?)
                    }
                    AddressableDefinition::AddressDereference(e) => {
                        AddressableDefinition::AddressDereference(r.expression(e)?)
                    }
                    AddressableDefinition::Method(m) => AddressableDefinition::Method(r.method(m)?),
                    AddressableDefinition::This(e) => AddressableDefinition::This(r.expression(e)?),
                    AddressableDefinition::Expression(e) => {
                        AddressableDefinition::Expression(r.expression(e)?)
                    }
                };
                opt_expr(r, &mut n.instance)
            }
            ExpressionKind::AddressDereference(n) => expr(r, &mut n.address),
            ExpressionKind::AddressOf(n) => expr(r, &mut n.expression),
            ExpressionKind::AnonymousDelegate(n) => {
                n.parameters = n
                    .parameters
                    .iter()
                    .map(|p| r.declared_parameter(*p))
                    .collect::<Result<Vec<_>>>()?;
                stmt(r, &mut n.body)?;
                ty(r, &mut n.return_type)
            }
            ExpressionKind::ArrayIndexer(n) => {
                expr(r, &mut n.indexed_object)?;
                exprs(r, &mut n.indices)
            }
            ExpressionKind::Assignment(n) => {
                expr(r, &mut n.target)?;
                expr(r, &mut n.source)
            }
            ExpressionKind::BlockExpression(n) => {
                stmt(r, &mut n.block_statement)?;
                expr(r, &mut n.expression)
            }
            ExpressionKind::BoundExpression(n) => {
                opt_expr(r, &mut n.instance)?;
                n.definition = match n.definition {
                    BoundDefinition::Local(l) => BoundDefinition::Local(r.local(l)?),
                    BoundDefinition::Parameter(p) => BoundDefinition::Parameter(r.parameter(p)?),
                    BoundDefinition::Field(f) => BoundDefinition::Field(r.field(f)?),
                };
                Ok(())
            }
            ExpressionKind::CastIfPossible(n) => {
                expr(r, &mut n.value_to_cast)?;
                ty(r, &mut n.target_type)
            }
            ExpressionKind::CheckIfInstance(n) => {
                expr(r, &mut n.operand)?;
                ty(r, &mut n.type_to_check)
            }
            ExpressionKind::CompileTimeConstant(_) => Ok(()),
            ExpressionKind::Conditional(n) => {
                expr(r, &mut n.condition)?;
                expr(r, &mut n.result_if_true)?;
                expr(r, &mut n.result_if_false)
            }
            ExpressionKind::Conversion(n) => {
                expr(r, &mut n.value_to_convert)?;
                ty(r, &mut n.type_after_conversion)
            }
            ExpressionKind::CreateArray(n) => {
                ty(r, &mut n.element_type)?;
                exprs(r, &mut n.sizes)?;
                exprs(r, &mut n.initializers)
            }
            ExpressionKind::CreateDelegateInstance(n) => {
                opt_expr(r, &mut n.instance)?;
                n.method_to_call_via_delegate = r.method(n.method_to_call_via_delegate)?;
                Ok(())
            }
            ExpressionKind::CreateObjectInstance(n) => {
                exprs(r, &mut n.arguments)?;
                n.method_to_call = r.method(n.method_to_call)?;
                Ok(())
            }
            ExpressionKind::DefaultValue(n) => ty(r, &mut n.default_value_type),
            ExpressionKind::DupValue(_) => Ok(()),
            ExpressionKind::GetTypeOfTypedReference(n) => expr(r, &mut n.typed_reference),
            ExpressionKind::GetValueOfTypedReference(n) => {
                expr(r, &mut n.typed_reference)?;
                ty(r, &mut n.target_type)
            }
            ExpressionKind::LogicalNot(n) => expr(r, &mut n.operand),
            ExpressionKind::MakeTypedReference(n) => expr(r, &mut n.operand),
            ExpressionKind::MethodCall(n) => {
                // Static and jump calls have no receiver to visit
                if n.has_receiver() {
                    opt_expr(r, &mut n.this_argument)?;
                }
                exprs(r, &mut n.arguments)?;
                n.method_to_call = r.method(n.method_to_call)?;
                Ok(())
            }
            ExpressionKind::NamedArgument(n) => expr(r, &mut n.argument_value),
            ExpressionKind::OldValue(n) => expr(r, &mut n.expression),
            ExpressionKind::OnesComplement(n) => expr(r, &mut n.operand),
            ExpressionKind::OutArgument(n) => expr(r, &mut n.expression),
            ExpressionKind::PointerCall(n) => {
                expr(r, &mut n.pointer)?;
                exprs(r, &mut n.arguments)
            }
            ExpressionKind::PopValue(_) => Ok(()),
            ExpressionKind::RefArgument(n) => expr(r, &mut n.expression),
            ExpressionKind::ReturnValue(_) => Ok(()),
            ExpressionKind::RuntimeArgumentHandleExpression(_) => Ok(()),
            ExpressionKind::SizeOf(n) => ty(r, &mut n.type_to_size),
            ExpressionKind::StackArrayCreate(n) => {
                ty(r, &mut n.element_type)?;
                expr(r, &mut n.size)
            }
            ExpressionKind::TargetExpression(n) => {
                if let TargetDefinition::ArrayIndexer(e) = n.definition {
                    // Instance and type follow the indexer, see `Expression::sync_indexer_target`
                    n.definition = TargetDefinition::ArrayIndexer(r.expression(e)?);
                    return Ok(());
                }
                n.definition = match n.definition {
                    TargetDefinition::Local(l) => TargetDefinition::Local(r.local(l)?),
                    TargetDefinition::Parameter(p) => TargetDefinition::Parameter(r.parameter(p)?),
                    TargetDefinition::Field(f) => TargetDefinition::Field(r.field(f)?),
                    TargetDefinition::ArrayIndexer(e) => TargetDefinition::ArrayIndexer(e),
                    TargetDefinition::AddressDereference(e) => {
                        TargetDefinition::AddressDereference(r.expression(e)?)
                    }
                    TargetDefinition::Property(p) => TargetDefinition::Property(r.property(p)?),
                };
                opt_expr(r, &mut n.instance)
            }
            ExpressionKind::ThisReference(_) => Ok(()),
            ExpressionKind::TokenOf(n) => {
                n.definition = match n.definition {
                    TokenDefinition::Field(f) => TokenDefinition::Field(r.field(f)?),
                    TokenDefinition::Method(m) => TokenDefinition::Method(r.method(m)?),
                    TokenDefinition::Type(t) => TokenDefinition::Type(r.type_reference(t)?),
                };
                Ok(())
            }
            ExpressionKind::TypeOf(n) => ty(r, &mut n.type_to_get),
            ExpressionKind::UnaryNegation(n) => expr(r, &mut n.operand),
            ExpressionKind::UnaryPlus(n) => expr(r, &mut n.operand),
            ExpressionKind::VectorLength(n) => expr(r, &mut n.vector),
        }
    }
}

impl Statement {
    /// Rewrites the kind's children
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        self.kind.rewrite_children(r)
    }
}

impl StatementKind {
    /// Passes every child handle through `r`
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        match self {
            StatementKind::Assert(n) => {
                expr(r, &mut n.condition)?;
                opt_expr(r, &mut n.description)
            }
            StatementKind::Assume(n) => {
                expr(r, &mut n.condition)?;
                opt_expr(r, &mut n.description)
            }
            StatementKind::Block(n) => stmts(r, &mut n.statements),
            StatementKind::Break(_) => Ok(()),
            StatementKind::Conditional(n) => {
                expr(r, &mut n.condition)?;
                stmt(r, &mut n.true_branch)?;
                stmt(r, &mut n.false_branch)
            }
            StatementKind::Continue(_) => Ok(()),
            StatementKind::CopyMemory(n) => {
                expr(r, &mut n.target_address)?;
                expr(r, &mut n.source_address)?;
                expr(r, &mut n.number_of_bytes_to_copy)
            }
            StatementKind::DebuggerBreak(_) => Ok(()),
            StatementKind::DoUntil(n) => {
                stmt(r, &mut n.body)?;
                expr(r, &mut n.condition)
            }
            StatementKind::Empty(_) => Ok(()),
            StatementKind::Expression(n) => expr(r, &mut n.expression),
            StatementKind::FillMemory(n) => {
                expr(r, &mut n.target_address)?;
                expr(r, &mut n.fill_value)?;
                expr(r, &mut n.number_of_bytes_to_fill)
            }
            StatementKind::ForEach(n) => {
                n.variable = r.declared_local(n.variable)?;
                expr(r, &mut n.collection)?;
                stmt(r, &mut n.body)
            }
            StatementKind::For(n) => {
                stmts(r, &mut n.initial_statements)?;
                expr(r, &mut n.condition)?;
                stmts(r, &mut n.incrementers)?;
                stmt(r, &mut n.body)
            }
            StatementKind::Goto(_) => Ok(()),
            StatementKind::GotoSwitchCase(n) => opt_expr(r, &mut n.target_case),
            StatementKind::Labeled(n) => stmt(r, &mut n.statement),
            StatementKind::LocalDeclaration(n) => {
                n.local_variable = r.declared_local(n.local_variable)?;
                opt_expr(r, &mut n.initial_value)
            }
            StatementKind::Lock(n) => {
                expr(r, &mut n.guard)?;
                stmt(r, &mut n.body)
            }
            StatementKind::Push(n) => expr(r, &mut n.value_to_push),
            StatementKind::ResourceUse(n) => {
                stmt(r, &mut n.resource_acquisitions)?;
                stmt(r, &mut n.body)
            }
            StatementKind::Rethrow(_) => Ok(()),
            StatementKind::Return(n) => opt_expr(r, &mut n.expression),
            StatementKind::Switch(n) => {
                expr(r, &mut n.expression)?;
                n.cases = std::mem::take(&mut n.cases)
                    .into_iter()
                    .map(|case| r.switch_case(case))
                    .collect::<Result<Vec<_>>>()?;
                Ok(())
            }
            StatementKind::Throw(n) => expr(r, &mut n.exception),
            StatementKind::TryCatchFinally(n) => {
                stmt(r, &mut n.try_body)?;
                n.catch_clauses = std::mem::take(&mut n.catch_clauses)
                    .into_iter()
                    .map(|clause| r.catch_clause(clause))
                    .collect::<Result<Vec<_>>>()?;
                opt_stmt(r, &mut n.finally_body)?;
                opt_stmt(r, &mut n.fault_body)
            }
            StatementKind::WhileDo(n) => {
                expr(r, &mut n.condition)?;
                stmt(r, &mut n.body)
            }
            StatementKind::YieldBreak(_) => Ok(()),
            StatementKind::YieldReturn(n) => expr(r, &mut n.expression),
        }
    }
}

impl SwitchCase {
    /// Rewrites the label (absent for the default case) and the body
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(mut self, r: &mut R) -> Result<Self> {
        opt_expr(r, &mut self.expression)?;
        stmts(r, &mut self.body)?;
        Ok(self)
    }
}

impl CatchClause {
    /// Rewrites the caught type, the container local, the filter and the body
    pub fn rewrite_children<R: HandleRewriter + ?Sized>(mut self, r: &mut R) -> Result<Self> {
        ty(r, &mut self.exception_type)?;
        if let Some(local) = self.exception_container {
            self.exception_container = Some(r.declared_local(local)?);
        }
        opt_expr(r, &mut self.filter_condition)?;
        stmt(r, &mut self.body)?;
        Ok(self)
    }
}

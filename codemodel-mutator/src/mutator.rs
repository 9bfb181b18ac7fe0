//! Mutating visitor over the code model
//!
//! [`CodeMutator`] has one hook per concrete node kind. Every hook defaults
//! to walking the node's children, so an implementation overrides only the
//! kinds it rewrites and calls [`walk_expression`] / [`walk_statement`] to
//! keep descending. Hooks return the handle that replaces the node in its
//! parent; returning [`StmtId::DUMMY_BLOCK`] from a statement hook removes
//! the statement from an enclosing statement list.
//!
//! Whether a hook sees the original node or a fresh shallow copy is decided
//! by the dispatch adapter (see [`crate::dispatch`]) from the mutator's
//! [`MutatorConfig`].

use crate::config::{MutationScope, MutatorConfig};
use crate::dispatch::{dispatch_expression, dispatch_statement};
use codemodel_contracts::{ContractProvider, LoopContract, MethodContract};
use codemodel_core::members::{ParameterDefinition, SignatureOwner};
use codemodel_core::{
    CatchClause, CodeModel, ExprId, ExpressionKind, FieldId, HandleRewriter, LocalId, MethodId,
    ModelHashMap, NodeRef, ParamId, PropertyId, Result, StmtId, SwitchCase, TypeId,
};
use std::sync::Arc;
use tracing::trace;

/// State shared by every hook of a mutator
#[derive(Debug, Clone, Default)]
pub struct MutatorContext {
    pub config: MutatorConfig,
    /// Contracts to carry along with the methods and loops they describe
    pub contracts: Option<Arc<ContractProvider>>,
    path: Vec<NodeRef>,
    signatures: Vec<ExprId>,
    /// Parameters of copied delegates, keyed by the parameter they replace
    parameter_copies: ModelHashMap<ParamId, ParamId>,
}

impl MutatorContext {
    pub fn new(config: MutatorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Also visit and re-associate contracts held by `contracts`
    pub fn with_contracts(mut self, contracts: Arc<ContractProvider>) -> Self {
        self.contracts = Some(contracts);
        self
    }

    /// Nodes currently being visited, outermost first
    pub fn path(&self) -> &[NodeRef] {
        &self.path
    }

    /// Innermost anonymous delegate whose body is being visited
    pub fn current_signature(&self) -> Option<ExprId> {
        self.signatures.last().copied()
    }

    /// The parameter that stands for `parameter` in the delegate copy being
    /// visited, or `parameter` itself
    pub fn copy_of_parameter(&self, parameter: ParamId) -> ParamId {
        self.parameter_copies
            .get(&parameter)
            .copied()
            .unwrap_or(parameter)
    }

    pub(crate) fn enter(&mut self, node: NodeRef) {
        self.path.push(node);
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }
}

macro_rules! walking_expression_hooks {
    ($($hook:ident),* $(,)?) => {
        $(
            /// Expression kind hook; the default walks the children
            fn $hook(&mut self, model: &mut CodeModel, expression: ExprId) -> Result<ExprId> {
                walk_expression(self, model, expression)
            }
        )*
    };
}

macro_rules! walking_statement_hooks {
    ($($hook:ident),* $(,)?) => {
        $(
            /// Statement kind hook; the default walks the children
            fn $hook(&mut self, model: &mut CodeModel, statement: StmtId) -> Result<StmtId> {
                walk_statement(self, model, statement)
            }
        )*
    };
}

/// A pass that rewrites expression and statement trees
pub trait CodeMutator {
    fn context(&self) -> &MutatorContext;

    fn context_mut(&mut self) -> &mut MutatorContext;

    /// Visit any expression - dispatches to its kind hook
    fn visit_expression(&mut self, model: &mut CodeModel, expression: ExprId) -> Result<ExprId> {
        dispatch_expression(self, model, expression)
    }

    /// Visit any statement - dispatches to its kind hook
    fn visit_statement(&mut self, model: &mut CodeModel, statement: StmtId) -> Result<StmtId> {
        dispatch_statement(self, model, statement)
    }

    fn visit_expressions(
        &mut self,
        model: &mut CodeModel,
        expressions: Vec<ExprId>,
    ) -> Result<Vec<ExprId>> {
        expressions
            .into_iter()
            .map(|e| self.visit_expression(model, e))
            .collect()
    }

    /// Visits a statement list, dropping statements replaced by the dummy
    /// block when the config asks for it
    fn visit_statements(
        &mut self,
        model: &mut CodeModel,
        statements: Vec<StmtId>,
    ) -> Result<Vec<StmtId>> {
        let remove_dummies = self.context().config.remove_dummy_statements;
        let mut visited = Vec::with_capacity(statements.len());
        for statement in statements {
            let replacement = self.visit_statement(model, statement)?;
            if remove_dummies && replacement == StmtId::DUMMY_BLOCK {
                trace!("Removing statement {}", statement);
                continue;
            }
            visited.push(replacement);
        }
        Ok(visited)
    }

    // ===== Expression kinds =====

    walking_expression_hooks! {
        visit_addition,
        visit_addressable_expression,
        visit_address_dereference,
        visit_address_of,
        visit_array_indexer,
        visit_assignment,
        visit_bitwise_and,
        visit_bitwise_or,
        visit_block_expression,
        visit_bound_expression,
        visit_cast_if_possible,
        visit_check_if_instance,
        visit_compile_time_constant,
        visit_conditional,
        visit_conversion,
        visit_create_array,
        visit_create_delegate_instance,
        visit_create_object_instance,
        visit_default_value,
        visit_division,
        visit_dup_value,
        visit_equality,
        visit_exclusive_or,
        visit_get_type_of_typed_reference,
        visit_get_value_of_typed_reference,
        visit_greater_than,
        visit_greater_than_or_equal,
        visit_left_shift,
        visit_less_than,
        visit_less_than_or_equal,
        visit_logical_not,
        visit_make_typed_reference,
        visit_method_call,
        visit_modulus,
        visit_multiplication,
        visit_named_argument,
        visit_not_equality,
        visit_old_value,
        visit_ones_complement,
        visit_out_argument,
        visit_pointer_call,
        visit_pop_value,
        visit_ref_argument,
        visit_return_value,
        visit_right_shift,
        visit_runtime_argument_handle_expression,
        visit_size_of,
        visit_stack_array_create,
        visit_subtraction,
        visit_target_expression,
        visit_this_reference,
        visit_token_of,
        visit_type_of,
        visit_unary_negation,
        visit_unary_plus,
        visit_vector_length,
    }

    /// Anonymous delegates push their signature for the duration of the walk.
    ///
    /// A delegate handed over as a fresh copy gets its own parameters, and
    /// references inside its body are redirected to them.
    fn visit_anonymous_delegate(
        &mut self,
        model: &mut CodeModel,
        expression: ExprId,
    ) -> Result<ExprId> {
        let replaced = own_delegate_signature(self, model, expression)?;
        self.context_mut().signatures.push(expression);
        trace!("Entering signature of {}", expression);
        let result = walk_expression(self, model, expression);
        self.context_mut().signatures.pop();
        for parameter in replaced {
            self.context_mut().parameter_copies.remove(&parameter);
        }
        trace!("Leaving signature of {}", expression);
        result
    }

    // ===== Statement kinds =====

    walking_statement_hooks! {
        visit_assert_statement,
        visit_assume_statement,
        visit_block_statement,
        visit_break_statement,
        visit_conditional_statement,
        visit_continue_statement,
        visit_copy_memory_statement,
        visit_debugger_break_statement,
        visit_do_until_statement,
        visit_empty_statement,
        visit_expression_statement,
        visit_fill_memory_statement,
        visit_for_each_statement,
        visit_for_statement,
        visit_goto_statement,
        visit_goto_switch_case_statement,
        visit_labeled_statement,
        visit_local_declaration_statement,
        visit_lock_statement,
        visit_push_statement,
        visit_resource_use_statement,
        visit_rethrow_statement,
        visit_return_statement,
        visit_switch_statement,
        visit_throw_statement,
        visit_try_catch_finally_statement,
        visit_while_do_statement,
        visit_yield_break_statement,
        visit_yield_return_statement,
    }

    // ===== Auxiliary structures =====

    fn visit_switch_case(&mut self, model: &mut CodeModel, case: SwitchCase) -> Result<SwitchCase> {
        case.rewrite_children(&mut Children::new(self, model))
    }

    fn visit_catch_clause(
        &mut self,
        model: &mut CodeModel,
        clause: CatchClause,
    ) -> Result<CatchClause> {
        clause.rewrite_children(&mut Children::new(self, model))
    }

    fn visit_method_contract(
        &mut self,
        model: &mut CodeModel,
        contract: &MethodContract,
    ) -> Result<MethodContract> {
        let mut visited = contract.clone();
        visited.rewrite_expressions(&mut Children::new(self, model))?;
        Ok(visited)
    }

    fn visit_loop_contract(
        &mut self,
        model: &mut CodeModel,
        contract: &LoopContract,
    ) -> Result<LoopContract> {
        let mut visited = contract.clone();
        visited.rewrite_expressions(&mut Children::new(self, model))?;
        Ok(visited)
    }

    // ===== References =====

    fn visit_local_reference(&mut self, _model: &mut CodeModel, local: LocalId) -> Result<LocalId> {
        Ok(local)
    }

    fn visit_parameter_reference(
        &mut self,
        _model: &mut CodeModel,
        parameter: ParamId,
    ) -> Result<ParamId> {
        Ok(parameter)
    }

    fn visit_property_reference(
        &mut self,
        _model: &mut CodeModel,
        property: PropertyId,
    ) -> Result<PropertyId> {
        Ok(property)
    }

    /// Type references are kept unless a mutator overrides this.
    /// Not called in [`MutationScope::MethodBodiesOnly`].
    fn visit_type_reference(&mut self, _model: &mut CodeModel, ty: TypeId) -> Result<TypeId> {
        Ok(ty)
    }

    /// Visits the field's type. Not called in [`MutationScope::MethodBodiesOnly`].
    fn visit_field_reference(&mut self, model: &mut CodeModel, field: FieldId) -> Result<FieldId> {
        let ty = model.field(field).ty;
        let visited = self.visit_type_reference(model, ty)?;
        if visited != ty {
            model.field_mut(field).ty = visited;
        }
        Ok(field)
    }

    /// Visits the method's return and parameter types.
    /// Not called in [`MutationScope::MethodBodiesOnly`].
    fn visit_method_reference(
        &mut self,
        model: &mut CodeModel,
        method: MethodId,
    ) -> Result<MethodId> {
        let return_type = model.method(method).return_type;
        let visited = self.visit_type_reference(model, return_type)?;
        if visited != return_type {
            model.method_mut(method).return_type = visited;
        }
        for parameter in model.method(method).parameters.clone() {
            let ty = model.parameter(parameter).ty;
            let visited = self.visit_type_reference(model, ty)?;
            if visited != ty {
                model.parameter_mut(parameter).ty = visited;
            }
        }
        Ok(method)
    }

    // ===== Methods =====

    /// Visits the method's body block and installs the result, which
    /// discards anything generated from the old tree, then visits the
    /// method's contract
    fn visit_method_body(&mut self, model: &mut CodeModel, method: MethodId) -> Result<()> {
        if let Some(body) = model.method_body(method) {
            let block = body.block();
            let visited = self.visit_statement(model, block)?;
            // In-place rewrites keep the root handle, so always reinstall
            body.set_block(visited);
        }
        if let Some(contracts) = self.context().contracts.clone() {
            if let Some(contract) = contracts.contract_for_method(method) {
                let visited = self.visit_method_contract(model, &contract)?;
                contracts.associate_method_with_contract(method, visited);
            }
        }
        Ok(())
    }
}

/// Gives a copied delegate parameters of its own. Returns the parameters
/// that were replaced, empty when the delegate already owns its signature.
fn own_delegate_signature<V: CodeMutator + ?Sized>(
    visitor: &mut V,
    model: &mut CodeModel,
    delegate: ExprId,
) -> Result<Vec<ParamId>> {
    let parameters = match &model.expression(delegate).kind {
        ExpressionKind::AnonymousDelegate(node) => node.parameters.clone(),
        _ => return Ok(Vec::new()),
    };
    let owner = SignatureOwner::AnonymousDelegate(delegate);
    if parameters.iter().all(|p| model.parameter(*p).owner == owner) {
        return Ok(Vec::new());
    }
    let mut copies = Vec::with_capacity(parameters.len());
    for &parameter in &parameters {
        let definition = ParameterDefinition {
            owner,
            ..model.parameter(parameter).clone()
        };
        let copy = model.add_parameter(definition)?;
        visitor.context_mut().parameter_copies.insert(parameter, copy);
        copies.push(copy);
    }
    trace!("Copied {} parameters of {}", copies.len(), delegate);
    if let ExpressionKind::AnonymousDelegate(node) = &mut model.expression_mut(delegate).kind {
        node.parameters = copies;
    }
    Ok(parameters)
}

/// Routes a node's children to the hooks of a mutator
pub struct Children<'a, V: ?Sized> {
    visitor: &'a mut V,
    model: &'a mut CodeModel,
}

impl<'a, V: CodeMutator + ?Sized> Children<'a, V> {
    pub fn new(visitor: &'a mut V, model: &'a mut CodeModel) -> Self {
        Self { visitor, model }
    }

    fn bodies_only(&self) -> bool {
        self.visitor.context().config.scope == MutationScope::MethodBodiesOnly
    }
}

impl<V: CodeMutator + ?Sized> HandleRewriter for Children<'_, V> {
    fn expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.visitor.visit_expression(self.model, expression)
    }

    fn statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.visitor.visit_statement(self.model, statement)
    }

    fn expressions(&mut self, expressions: Vec<ExprId>) -> Result<Vec<ExprId>> {
        self.visitor.visit_expressions(self.model, expressions)
    }

    fn statements(&mut self, statements: Vec<StmtId>) -> Result<Vec<StmtId>> {
        self.visitor.visit_statements(self.model, statements)
    }

    fn local(&mut self, local: LocalId) -> Result<LocalId> {
        self.visitor.visit_local_reference(self.model, local)
    }

    fn parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        let parameter = self.visitor.context().copy_of_parameter(parameter);
        self.visitor.visit_parameter_reference(self.model, parameter)
    }

    fn field(&mut self, field: FieldId) -> Result<FieldId> {
        if self.bodies_only() {
            return Ok(field);
        }
        self.visitor.visit_field_reference(self.model, field)
    }

    fn method(&mut self, method: MethodId) -> Result<MethodId> {
        if self.bodies_only() {
            return Ok(method);
        }
        self.visitor.visit_method_reference(self.model, method)
    }

    fn property(&mut self, property: PropertyId) -> Result<PropertyId> {
        self.visitor.visit_property_reference(self.model, property)
    }

    fn type_reference(&mut self, ty: TypeId) -> Result<TypeId> {
        if self.bodies_only() {
            return Ok(ty);
        }
        self.visitor.visit_type_reference(self.model, ty)
    }

    fn switch_case(&mut self, case: SwitchCase) -> Result<SwitchCase> {
        self.visitor.visit_switch_case(self.model, case)
    }

    fn catch_clause(&mut self, clause: CatchClause) -> Result<CatchClause> {
        self.visitor.visit_catch_clause(self.model, clause)
    }
}

/// Visits every child of `expression` and stores the results back into it
pub fn walk_expression<V: CodeMutator + ?Sized>(
    visitor: &mut V,
    model: &mut CodeModel,
    expression: ExprId,
) -> Result<ExprId> {
    if expression == ExprId::DUMMY {
        return Ok(expression);
    }
    let mut node = model.expression(expression).clone();
    node.rewrite_children(&mut Children::new(visitor, model))?;
    node.sync_indexer_target(model);
    *model.expression_mut(expression) = node;
    Ok(expression)
}

/// Visits every child of `statement` and stores the results back into it
pub fn walk_statement<V: CodeMutator + ?Sized>(
    visitor: &mut V,
    model: &mut CodeModel,
    statement: StmtId,
) -> Result<StmtId> {
    if statement == StmtId::DUMMY_BLOCK {
        return Ok(statement);
    }
    let mut node = model.statement(statement).clone();
    node.rewrite_children(&mut Children::new(visitor, model))?;
    *model.statement_mut(statement) = node;
    Ok(statement)
}

/// A mutator with no overrides: walks everything, changing nothing
/// except what its configuration implies (copies of frozen nodes,
/// removal of dummy statements)
#[derive(Debug, Clone, Default)]
pub struct IdentityMutator {
    context: MutatorContext,
}

impl IdentityMutator {
    pub fn new(config: MutatorConfig) -> Self {
        Self {
            context: MutatorContext::new(config),
        }
    }
}

impl CodeMutator for IdentityMutator {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }
}

#[cfg(test)]
#[path = "mutator_tests.rs"]
mod tests;

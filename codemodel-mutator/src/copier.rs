//! Shallow and deep copies of code model trees
//!
//! A deep copy produces a structurally independent tree. Everything
//! declared inside the copied cone (locals, anonymous delegate parameters,
//! and for [`DeepCopier::copy_method`] the method and its parameters) is
//! copied once and every reference inside the cone is redirected to the
//! copy. References that leave the cone (fields, types, outer locals and
//! parameters, other methods) are kept as is.

use codemodel_contracts::{ContractProvider, LoopContract, MethodContract};
use codemodel_core::members::{MethodDefinition, SignatureOwner};
use codemodel_core::{
    CatchClause, CodeModel, ExprId, ExpressionKind, HandleRewriter, LocalId, MethodId,
    ModelHashMap, NodeRef, ParamId, Result, StmtId, SwitchCase,
};
use std::sync::Arc;
use tracing::{debug, trace};

/// One-level copies: new nodes sharing every child handle
pub struct ShallowCopier<'m> {
    model: &'m mut CodeModel,
}

impl<'m> ShallowCopier<'m> {
    pub fn new(model: &'m mut CodeModel) -> Self {
        Self { model }
    }

    pub fn copy_expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.model.shallow_copy_expression(expression)
    }

    pub fn copy_statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.model.shallow_copy_statement(statement)
    }

    pub fn copy_switch_case(&self, case: &SwitchCase) -> SwitchCase {
        case.clone()
    }

    pub fn copy_catch_clause(&self, clause: &CatchClause) -> CatchClause {
        clause.clone()
    }

    /// New method with the same definition and parameters, whose body
    /// holds the same block
    pub fn copy_method(&mut self, method: MethodId) -> Result<MethodId> {
        let definition = self.model.method(method).clone();
        let copy = self.model.add_method(definition)?;
        if let Some(body) = self.model.method_body(method) {
            let shared = body.with_block(copy, body.block());
            self.model.set_method_body(copy, shared);
        }
        Ok(copy)
    }
}

/// Cone-aware deep copier
pub struct DeepCopier<'m> {
    model: &'m mut CodeModel,
    contracts: Option<Arc<ContractProvider>>,
    locals_inside_cone: ModelHashMap<LocalId, LocalId>,
    parameters_inside_cone: ModelHashMap<ParamId, ParamId>,
    methods_inside_cone: ModelHashMap<MethodId, MethodId>,
}

impl<'m> DeepCopier<'m> {
    pub fn new(model: &'m mut CodeModel) -> Self {
        Self {
            model,
            contracts: None,
            locals_inside_cone: ModelHashMap::default(),
            parameters_inside_cone: ModelHashMap::default(),
            methods_inside_cone: ModelHashMap::default(),
        }
    }

    /// Copy loop and method contracts along with their owners
    pub fn with_contracts(mut self, contracts: Arc<ContractProvider>) -> Self {
        self.contracts = Some(contracts);
        self
    }

    pub fn model(&self) -> &CodeModel {
        self.model
    }

    // ===== Public copy operations =====

    pub fn copy_expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.add_inner_definitions(NodeRef::Expression(expression))?;
        self.substitute_expression(expression)
    }

    pub fn copy_statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.add_inner_definitions(NodeRef::Statement(statement))?;
        self.substitute_statement(statement)
    }

    /// Same as [`Self::copy_statement`]; reads better at call sites holding a body block
    pub fn copy_block(&mut self, block: StmtId) -> Result<StmtId> {
        self.copy_statement(block)
    }

    /// Replaces every element with its copy. The elements form one cone, so
    /// a local declared by one element and used by another is shared.
    pub fn copy_expressions(&mut self, expressions: &mut [ExprId]) -> Result<()> {
        for expression in expressions.iter() {
            self.add_inner_definitions(NodeRef::Expression(*expression))?;
        }
        for expression in expressions.iter_mut() {
            *expression = self.substitute_expression(*expression)?;
        }
        Ok(())
    }

    /// Replaces every element with its copy, as one cone
    pub fn copy_statements(&mut self, statements: &mut [StmtId]) -> Result<()> {
        for statement in statements.iter() {
            self.add_inner_definitions(NodeRef::Statement(*statement))?;
        }
        for statement in statements.iter_mut() {
            *statement = self.substitute_statement(*statement)?;
        }
        Ok(())
    }

    pub fn copy_switch_case(&mut self, case: &SwitchCase) -> Result<SwitchCase> {
        if let Some(label) = case.expression {
            self.add_inner_definitions(NodeRef::Expression(label))?;
        }
        for statement in &case.body {
            self.add_inner_definitions(NodeRef::Statement(*statement))?;
        }
        case.clone().rewrite_children(self)
    }

    pub fn copy_catch_clause(&mut self, clause: &CatchClause) -> Result<CatchClause> {
        if let Some(container) = clause.exception_container {
            self.declare_local(container)?;
        }
        if let Some(filter) = clause.filter_condition {
            self.add_inner_definitions(NodeRef::Expression(filter))?;
        }
        self.add_inner_definitions(NodeRef::Statement(clause.body))?;
        clause.clone().rewrite_children(self)
    }

    /// Copies a method with its parameters, body and contract. Calls of the
    /// method from inside its own body are redirected to the copy.
    pub fn copy_method(&mut self, method: MethodId) -> Result<MethodId> {
        let definition = self.model.method(method).clone();
        let copy = self.model.add_method(MethodDefinition {
            parameters: Vec::new(),
            ..definition.clone()
        })?;
        self.methods_inside_cone.insert(method, copy);

        let mut parameters = Vec::with_capacity(definition.parameters.len());
        for parameter in &definition.parameters {
            let mut copied = self.model.parameter(*parameter).clone();
            copied.owner = SignatureOwner::Method(copy);
            let copied = self.model.add_parameter(copied)?;
            self.parameters_inside_cone.insert(*parameter, copied);
            parameters.push(copied);
        }
        self.model.method_mut(copy).parameters = parameters;

        if let Some(body) = self.model.method_body(method) {
            let block = self.copy_block(body.block())?;
            self.model.set_method_body(copy, body.with_block(copy, block));
        }

        if let Some(contracts) = self.contracts.clone() {
            if let Some(contract) = contracts.contract_for_method(method) {
                let copied = self.copy_method_contract(&contract)?;
                contracts.associate_method_with_contract(copy, copied);
            }
        }

        debug!("Copied method {} ({}) to {}", definition.name, method, copy);
        Ok(copy)
    }

    /// Copies every expression of the contract into the current cone
    pub fn copy_method_contract(&mut self, contract: &MethodContract) -> Result<MethodContract> {
        let mut copied = contract.clone();
        copied.rewrite_expressions(self)?;
        Ok(copied)
    }

    /// Copies every expression of the contract into the current cone
    pub fn copy_loop_contract(&mut self, contract: &LoopContract) -> Result<LoopContract> {
        let mut copied = contract.clone();
        copied.rewrite_expressions(self)?;
        Ok(copied)
    }

    /// The copy of `local` if it was declared inside a cone copied so far,
    /// otherwise `local` itself
    pub fn existing_copy_of_local(&self, local: LocalId) -> LocalId {
        self.locals_inside_cone.get(&local).copied().unwrap_or(local)
    }

    /// The copy of `parameter` if it belongs to a copied signature,
    /// otherwise `parameter` itself
    pub fn existing_copy_of_parameter(&self, parameter: ParamId) -> ParamId {
        self.parameters_inside_cone
            .get(&parameter)
            .copied()
            .unwrap_or(parameter)
    }

    // ===== Cone =====

    /// Copies every local and parameter declared under `root`, so uses met
    /// before their declaration resolve to the copy as well
    fn add_inner_definitions(&mut self, root: NodeRef) -> Result<()> {
        let declarations: Vec<_> = self
            .model
            .descendants(root)
            .map(|node| self.model.declarations(node))
            .collect();
        let before = self.locals_inside_cone.len() + self.parameters_inside_cone.len();
        for declared in declarations {
            for local in declared.locals {
                self.declare_local(local)?;
            }
            for parameter in declared.parameters {
                self.declare_parameter(parameter)?;
            }
        }
        trace!(
            "Cone under {} declares {} new definitions",
            root,
            self.locals_inside_cone.len() + self.parameters_inside_cone.len() - before
        );
        Ok(())
    }

    fn declare_local(&mut self, local: LocalId) -> Result<LocalId> {
        if let Some(copy) = self.locals_inside_cone.get(&local) {
            return Ok(*copy);
        }
        let definition = self.model.local(local).clone();
        let copy = self.model.add_local(definition)?;
        self.locals_inside_cone.insert(local, copy);
        Ok(copy)
    }

    fn declare_parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        if let Some(copy) = self.parameters_inside_cone.get(&parameter) {
            return Ok(*copy);
        }
        let definition = self.model.parameter(parameter).clone();
        let copy = self.model.add_parameter(definition)?;
        self.parameters_inside_cone.insert(parameter, copy);
        Ok(copy)
    }

    // ===== Substitution =====

    fn substitute_expression(&mut self, expression: ExprId) -> Result<ExprId> {
        if expression == ExprId::DUMMY {
            return Ok(expression);
        }
        let mut node = self.model.expression(expression).clone();
        node.rewrite_children(self)?;
        node.sync_indexer_target(self.model);
        let copy = self.model.add_expression(node)?;

        // Delegate parameters were copied before their owner existed
        if let ExpressionKind::AnonymousDelegate(delegate) = &self.model.expression(copy).kind {
            for parameter in delegate.parameters.clone() {
                self.model.parameter_mut(parameter).owner = SignatureOwner::AnonymousDelegate(copy);
            }
        }
        Ok(copy)
    }

    fn substitute_statement(&mut self, statement: StmtId) -> Result<StmtId> {
        if statement == StmtId::DUMMY_BLOCK {
            return Ok(statement);
        }
        let mut node = self.model.statement(statement).clone();
        node.rewrite_children(self)?;
        let is_loop = node.kind.is_loop();
        let copy = self.model.add_statement(node)?;

        if is_loop {
            if let Some(contracts) = self.contracts.clone() {
                if let Some(contract) = contracts.contract_for_loop(statement) {
                    let copied = self.copy_loop_contract(&contract)?;
                    contracts.associate_loop_with_contract(copy, copied);
                }
            }
        }
        Ok(copy)
    }
}

impl HandleRewriter for DeepCopier<'_> {
    fn expression(&mut self, expression: ExprId) -> Result<ExprId> {
        self.substitute_expression(expression)
    }

    fn statement(&mut self, statement: StmtId) -> Result<StmtId> {
        self.substitute_statement(statement)
    }

    fn local(&mut self, local: LocalId) -> Result<LocalId> {
        Ok(self.existing_copy_of_local(local))
    }

    fn declared_local(&mut self, local: LocalId) -> Result<LocalId> {
        self.declare_local(local)
    }

    fn parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        Ok(self.existing_copy_of_parameter(parameter))
    }

    fn declared_parameter(&mut self, parameter: ParamId) -> Result<ParamId> {
        self.declare_parameter(parameter)
    }

    fn method(&mut self, method: MethodId) -> Result<MethodId> {
        Ok(self.methods_inside_cone.get(&method).copied().unwrap_or(method))
    }
}

#[cfg(test)]
#[path = "copier_tests.rs"]
mod tests;

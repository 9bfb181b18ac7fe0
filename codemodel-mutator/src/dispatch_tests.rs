use super::*;
use crate::config::MutatorConfig;
use crate::mutator::{walk_expression, walk_statement, MutatorContext};
use codemodel_contracts::{ContractProvider, LoopContract, LoopInvariant};
use codemodel_core::expressions::{Constant, LogicalNot};
use codemodel_core::statements::WhileDoStatement;
use codemodel_core::TypeId;
use std::sync::Arc;

/// Records the hooks it is called through
#[derive(Default)]
struct HookRecorder {
    context: MutatorContext,
    hooks: Vec<&'static str>,
}

impl HookRecorder {
    fn new(config: MutatorConfig) -> Self {
        Self {
            context: MutatorContext::new(config),
            hooks: Vec::new(),
        }
    }
}

impl CodeMutator for HookRecorder {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_logical_not(&mut self, model: &mut CodeModel, expression: ExprId) -> Result<ExprId> {
        self.hooks.push("logical_not");
        walk_expression(self, model, expression)
    }

    fn visit_compile_time_constant(
        &mut self,
        _model: &mut CodeModel,
        expression: ExprId,
    ) -> Result<ExprId> {
        self.hooks.push("constant");
        Ok(expression)
    }

    fn visit_while_do_statement(
        &mut self,
        model: &mut CodeModel,
        statement: StmtId,
    ) -> Result<StmtId> {
        self.hooks.push("while");
        walk_statement(self, model, statement)
    }

    fn visit_block_statement(
        &mut self,
        model: &mut CodeModel,
        statement: StmtId,
    ) -> Result<StmtId> {
        self.hooks.push("block");
        walk_statement(self, model, statement)
    }
}

/// `while (!true) {}`
fn loop_statement(model: &mut CodeModel) -> (StmtId, ExprId) {
    let truth = model.constant(Constant::Bool(true)).unwrap();
    let condition = model
        .new_expression(LogicalNot { operand: truth }, TypeId::BOOLEAN)
        .unwrap();
    let body = model.block(Vec::new()).unwrap();
    let statement = model
        .new_statement(WhileDoStatement { condition, body })
        .unwrap();
    (statement, condition)
}

#[test]
fn test_each_node_reaches_its_kind_hook() {
    let mut model = CodeModel::new();
    let (statement, _) = loop_statement(&mut model);
    let mut recorder = HookRecorder::new(MutatorConfig::in_place());

    recorder.visit_statement(&mut model, statement).unwrap();

    assert_eq!(recorder.hooks, vec!["while", "logical_not", "constant", "block"]);
}

#[test]
fn test_unfrozen_node_is_passed_as_is() {
    let mut model = CodeModel::new();
    let (statement, condition) = loop_statement(&mut model);
    let mut recorder = HookRecorder::new(MutatorConfig::in_place());

    assert_eq!(recorder.visit_expression(&mut model, condition).unwrap(), condition);
    assert_eq!(recorder.visit_statement(&mut model, statement).unwrap(), statement);
}

#[test]
fn test_copy_on_write_hook_receives_fresh_copy() {
    let mut model = CodeModel::new();
    let (_, condition) = loop_statement(&mut model);
    let before = model.expression_count();
    let mut recorder = HookRecorder::new(MutatorConfig::copy_on_write());

    let result = recorder.visit_expression(&mut model, condition).unwrap();

    assert_ne!(result, condition);
    // The negation and its operand were both copied
    assert_eq!(model.expression_count(), before + 2);
}

#[test]
fn test_dummy_block_is_returned_without_dispatch() {
    let mut model = CodeModel::new();
    let mut recorder = HookRecorder::new(MutatorConfig::copy_on_write());
    let result = recorder
        .visit_statement(&mut model, StmtId::DUMMY_BLOCK)
        .unwrap();
    assert_eq!(result, StmtId::DUMMY_BLOCK);
    assert!(recorder.hooks.is_empty());
}

#[test]
fn test_loop_contract_follows_copied_loop() {
    let mut model = CodeModel::new();
    let (statement, _) = loop_statement(&mut model);
    let invariant = model.constant(Constant::Bool(true)).unwrap();
    let contracts = Arc::new(ContractProvider::new());
    contracts.associate_loop_with_contract(
        statement,
        LoopContract {
            invariants: vec![LoopInvariant::new(invariant)],
            ..Default::default()
        },
    );
    let mut recorder = HookRecorder {
        context: MutatorContext::new(MutatorConfig::copy_on_write())
            .with_contracts(Arc::clone(&contracts)),
        hooks: Vec::new(),
    };

    let copy = recorder.visit_statement(&mut model, statement).unwrap();

    assert_ne!(copy, statement);
    let original = contracts.contract_for_loop(statement).unwrap();
    let copied = contracts.contract_for_loop(copy).unwrap();
    assert_eq!(original.invariants[0].condition, invariant);
    assert_ne!(copied.invariants[0].condition, invariant);
}

use super::*;
use codemodel_core::expressions::{
    Addition, AnonymousDelegate, BoundDefinition, BoundExpression, CompileTimeConstant, Constant,
};
use codemodel_core::members::{MethodDefinition, ParameterDefinition, TypeDefinition};
use codemodel_core::statements::{BlockStatement, ReturnStatement};
use codemodel_core::{BlockBody, NodeRef};

/// Replaces every `1` with `2`
#[derive(Default)]
struct OneToTwo {
    context: MutatorContext,
    rewritten: usize,
}

impl OneToTwo {
    fn new(config: MutatorConfig) -> Self {
        Self {
            context: MutatorContext::new(config),
            rewritten: 0,
        }
    }
}

impl CodeMutator for OneToTwo {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_compile_time_constant(
        &mut self,
        model: &mut CodeModel,
        expression: ExprId,
    ) -> Result<ExprId> {
        let node = model
            .expression_node_mut::<CompileTimeConstant>(expression)
            .unwrap();
        if node.value == Constant::Int32(1) {
            node.value = Constant::Int32(2);
            self.rewritten += 1;
        }
        Ok(expression)
    }
}

fn int(model: &mut CodeModel, value: i32) -> ExprId {
    model.constant(Constant::Int32(value)).unwrap()
}

fn constant_of(model: &CodeModel, expression: ExprId) -> Constant {
    model
        .expression_node::<CompileTimeConstant>(expression)
        .unwrap()
        .value
        .clone()
}

/// `1 + 3`
fn sum(model: &mut CodeModel) -> (ExprId, ExprId) {
    let one = int(model, 1);
    let three = int(model, 3);
    let sum = model
        .new_expression(Addition::new(one, three), TypeId::INT32)
        .unwrap();
    (sum, one)
}

fn left_operand(model: &CodeModel, sum: ExprId) -> ExprId {
    model.expression_node::<Addition>(sum).unwrap().left_operand
}

// ===== In place / copy on write =====

#[test]
fn test_in_place_mutates_original_nodes() {
    let mut model = CodeModel::new();
    let (sum, one) = sum(&mut model);
    let mut mutator = OneToTwo::new(MutatorConfig::in_place());

    let result = mutator.visit_expression(&mut model, sum).unwrap();

    assert_eq!(result, sum);
    assert_eq!(left_operand(&model, sum), one);
    assert_eq!(constant_of(&model, one), Constant::Int32(2));
    assert_eq!(mutator.rewritten, 1);
}

#[test]
fn test_copy_on_write_leaves_input_untouched() {
    let mut model = CodeModel::new();
    let (sum, one) = sum(&mut model);
    let mut mutator = OneToTwo::new(MutatorConfig::copy_on_write());

    let result = mutator.visit_expression(&mut model, sum).unwrap();

    assert_ne!(result, sum);
    assert_eq!(constant_of(&model, one), Constant::Int32(1));
    let copied_one = left_operand(&model, result);
    assert_ne!(copied_one, one);
    assert_eq!(constant_of(&model, copied_one), Constant::Int32(2));
}

#[test]
fn test_frozen_nodes_are_copied_before_mutation() {
    let mut model = CodeModel::new();
    let (sum, one) = sum(&mut model);
    model.freeze_tree(NodeRef::Expression(sum));
    let mut mutator = OneToTwo::new(MutatorConfig::in_place());

    let result = mutator.visit_expression(&mut model, sum).unwrap();

    assert_ne!(result, sum);
    assert_eq!(constant_of(&model, one), Constant::Int32(1));
    assert_eq!(constant_of(&model, left_operand(&model, result)), Constant::Int32(2));
}

#[test]
fn test_only_frozen_part_is_copied() {
    let mut model = CodeModel::new();
    let (sum, one) = sum(&mut model);
    model.freeze_expression(one);
    let mut mutator = OneToTwo::new(MutatorConfig::in_place());

    let result = mutator.visit_expression(&mut model, sum).unwrap();

    assert_eq!(result, sum);
    let new_one = left_operand(&model, sum);
    assert_ne!(new_one, one);
    assert_eq!(constant_of(&model, one), Constant::Int32(1));
    assert_eq!(constant_of(&model, new_one), Constant::Int32(2));
}

#[test]
fn test_dummy_expression_is_not_visited() {
    let mut model = CodeModel::new();
    let mut mutator = OneToTwo::new(MutatorConfig::copy_on_write());
    let result = mutator.visit_expression(&mut model, ExprId::DUMMY).unwrap();
    assert_eq!(result, ExprId::DUMMY);
    assert_eq!(model.expression_count(), 1);
}

// ===== Statement removal =====

/// Removes every expression statement
struct DropExpressionStatements {
    context: MutatorContext,
}

impl CodeMutator for DropExpressionStatements {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_expression_statement(
        &mut self,
        _model: &mut CodeModel,
        _statement: StmtId,
    ) -> Result<StmtId> {
        Ok(StmtId::DUMMY_BLOCK)
    }
}

fn block_with_expression_statement(model: &mut CodeModel) -> (StmtId, StmtId) {
    let one = int(model, 1);
    let statement = model.expression_statement(one).unwrap();
    let value = int(model, 0);
    let ret = model.return_statement(Some(value)).unwrap();
    let block = model.block(vec![statement, ret]).unwrap();
    (block, ret)
}

#[test]
fn test_dummy_block_result_removes_statement() {
    let mut model = CodeModel::new();
    let (block, ret) = block_with_expression_statement(&mut model);
    let mut mutator = DropExpressionStatements {
        context: MutatorContext::new(MutatorConfig::in_place()),
    };

    mutator.visit_statement(&mut model, block).unwrap();

    let statements = &model.statement_node::<BlockStatement>(block).unwrap().statements;
    assert_eq!(statements, &vec![ret]);
}

#[test]
fn test_dummy_block_result_is_kept_when_removal_is_off() {
    let mut model = CodeModel::new();
    let (block, ret) = block_with_expression_statement(&mut model);
    let config = MutatorConfig {
        remove_dummy_statements: false,
        ..MutatorConfig::in_place()
    };
    let mut mutator = DropExpressionStatements {
        context: MutatorContext::new(config),
    };

    mutator.visit_statement(&mut model, block).unwrap();

    let statements = &model.statement_node::<BlockStatement>(block).unwrap().statements;
    assert_eq!(statements, &vec![StmtId::DUMMY_BLOCK, ret]);
}

// ===== Scope =====

/// Widens every `Int32` to `Int64`
struct Widen {
    context: MutatorContext,
}

impl CodeMutator for Widen {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_type_reference(&mut self, _model: &mut CodeModel, ty: TypeId) -> Result<TypeId> {
        Ok(if ty == TypeId::INT32 { TypeId::INT64 } else { ty })
    }
}

#[test]
fn test_whole_unit_scope_visits_type_references() {
    let mut model = CodeModel::new();
    let (sum, _) = sum(&mut model);
    let mut mutator = Widen {
        context: MutatorContext::new(MutatorConfig::in_place()),
    };

    mutator.visit_expression(&mut model, sum).unwrap();

    assert_eq!(model.expression(sum).ty, TypeId::INT64);
}

#[test]
fn test_method_bodies_only_scope_passes_references_through() {
    let mut model = CodeModel::new();
    let (sum, _) = sum(&mut model);
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    let method = model
        .add_method(MethodDefinition::new("M", ty, TypeId::INT32))
        .unwrap();
    let call = model.call(None, method, vec![sum]).unwrap();
    let mut mutator = Widen {
        context: MutatorContext::new(MutatorConfig::method_bodies_only()),
    };

    mutator.visit_expression(&mut model, call).unwrap();

    assert_eq!(model.expression(sum).ty, TypeId::INT32);
    assert_eq!(model.method(method).return_type, TypeId::INT32);
}

#[test]
fn test_whole_unit_scope_visits_referenced_method_signature() {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    let method = model
        .add_method(MethodDefinition {
            is_static: true,
            ..MethodDefinition::new("M", ty, TypeId::INT32)
        })
        .unwrap();
    let parameter = model.new_parameter(method, "x", TypeId::INT32).unwrap();
    let call = model.call(None, method, Vec::new()).unwrap();
    let mut mutator = Widen {
        context: MutatorContext::new(MutatorConfig::in_place()),
    };

    mutator.visit_expression(&mut model, call).unwrap();

    assert_eq!(model.method(method).return_type, TypeId::INT64);
    assert_eq!(model.parameter(parameter).ty, TypeId::INT64);
}

// ===== Path and signatures =====

/// Records the enclosing signature and path depth at every constant
#[derive(Default)]
struct SignatureRecorder {
    context: MutatorContext,
    seen: Vec<(Option<ExprId>, usize)>,
}

impl CodeMutator for SignatureRecorder {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_compile_time_constant(
        &mut self,
        _model: &mut CodeModel,
        expression: ExprId,
    ) -> Result<ExprId> {
        assert_eq!(
            self.context.path().last(),
            Some(&NodeRef::Expression(expression))
        );
        self.seen
            .push((self.context.current_signature(), self.context.path().len()));
        Ok(expression)
    }
}

#[test]
fn test_anonymous_delegate_pushes_its_signature() {
    let mut model = CodeModel::new();
    let inside = int(&mut model, 1);
    let ret = model.return_statement(Some(inside)).unwrap();
    let body = model.block(vec![ret]).unwrap();
    let delegate = model
        .new_expression(
            AnonymousDelegate {
                body,
                return_type: TypeId::INT32,
                ..Default::default()
            },
            TypeId::OBJECT,
        )
        .unwrap();
    let outside = int(&mut model, 2);
    let statement = model.expression_statement(delegate).unwrap();
    let tail = model.expression_statement(outside).unwrap();
    let root = model.block(vec![statement, tail]).unwrap();

    let mut recorder = SignatureRecorder::default();
    recorder.visit_statement(&mut model, root).unwrap();

    // root block, statement, delegate, body block, return, constant
    assert_eq!(recorder.seen[0], (Some(delegate), 6));
    // root block, statement, constant
    assert_eq!(recorder.seen[1], (None, 3));
    assert!(recorder.context.path().is_empty());
    assert_eq!(recorder.context.current_signature(), None);
}

/// `(int p) => { return p; }`; returns the delegate and its parameter
fn identity_delegate(model: &mut CodeModel) -> (ExprId, ParamId) {
    let delegate = model
        .new_expression(
            AnonymousDelegate {
                return_type: TypeId::INT32,
                ..Default::default()
            },
            TypeId::OBJECT,
        )
        .unwrap();
    let parameter = model
        .add_parameter(ParameterDefinition::new(
            "p",
            TypeId::INT32,
            0,
            SignatureOwner::AnonymousDelegate(delegate),
        ))
        .unwrap();
    let read = model.bound_parameter(parameter).unwrap();
    let ret = model.return_statement(Some(read)).unwrap();
    let body = model.block(vec![ret]).unwrap();
    let node = model
        .expression_node_mut::<AnonymousDelegate>(delegate)
        .unwrap();
    node.parameters = vec![parameter];
    node.body = body;
    (delegate, parameter)
}

/// The parameter read by the delegate's `return p;`
fn returned_parameter(model: &CodeModel, delegate: ExprId) -> ParamId {
    let body = model.expression_node::<AnonymousDelegate>(delegate).unwrap().body;
    let ret = model.statement_node::<BlockStatement>(body).unwrap().statements[0];
    let read = model
        .statement_node::<ReturnStatement>(ret)
        .unwrap()
        .expression
        .unwrap();
    match model.expression_node::<BoundExpression>(read).unwrap().definition {
        BoundDefinition::Parameter(parameter) => parameter,
        other => panic!("expected a parameter, found {:?}", other),
    }
}

#[test]
fn test_copied_delegate_owns_its_parameters() {
    let mut model = CodeModel::new();
    let (delegate, parameter) = identity_delegate(&mut model);
    let mut mutator = IdentityMutator::new(MutatorConfig::copy_on_write());

    let copy = mutator.visit_expression(&mut model, delegate).unwrap();

    assert_ne!(copy, delegate);
    let copied = model.expression_node::<AnonymousDelegate>(copy).unwrap().parameters[0];
    assert_ne!(copied, parameter);
    assert_eq!(
        model.parameter(copied).owner,
        SignatureOwner::AnonymousDelegate(copy)
    );
    assert_eq!(model.parameter(copied).name, "p");
    assert_eq!(returned_parameter(&model, copy), copied);

    // The input keeps its own signature
    assert_eq!(
        model.parameter(parameter).owner,
        SignatureOwner::AnonymousDelegate(delegate)
    );
    assert_eq!(returned_parameter(&model, delegate), parameter);
    assert_eq!(mutator.context().copy_of_parameter(parameter), parameter);
}

#[test]
fn test_in_place_delegate_keeps_its_parameters() {
    let mut model = CodeModel::new();
    let (delegate, parameter) = identity_delegate(&mut model);
    let parameters_before = model.parameter_count();
    let mut mutator = IdentityMutator::new(MutatorConfig::in_place());

    let result = mutator.visit_expression(&mut model, delegate).unwrap();

    assert_eq!(result, delegate);
    assert_eq!(model.parameter_count(), parameters_before);
    assert_eq!(returned_parameter(&model, delegate), parameter);
}

// ===== Method bodies and contracts =====

#[test]
fn test_visit_method_body_installs_copied_block() {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    let method = model
        .add_method(MethodDefinition::new("M", ty, TypeId::INT32))
        .unwrap();
    let one = int(&mut model, 1);
    let ret = model.return_statement(Some(one)).unwrap();
    let block = model.block(vec![ret]).unwrap();
    model.set_method_body(method, Arc::new(BlockBody::new(method, block)));

    let mut mutator = OneToTwo::new(MutatorConfig::copy_on_write());
    mutator.visit_method_body(&mut model, method).unwrap();

    let installed = model.method_body(method).unwrap().block();
    assert_ne!(installed, block);
    assert_eq!(constant_of(&model, one), Constant::Int32(1));
    assert_eq!(mutator.rewritten, 1);
}

#[test]
fn test_visit_method_body_visits_and_reassociates_contract() {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    let method = model
        .add_method(MethodDefinition::new("M", ty, TypeId::VOID))
        .unwrap();
    let condition = int(&mut model, 1);
    let contracts = Arc::new(ContractProvider::new());
    contracts.associate_method_with_contract(
        method,
        MethodContract {
            preconditions: vec![codemodel_contracts::Precondition::new(condition)],
            ..Default::default()
        },
    );

    let mut mutator = OneToTwo {
        context: MutatorContext::new(MutatorConfig::copy_on_write())
            .with_contracts(Arc::clone(&contracts)),
        rewritten: 0,
    };
    mutator.visit_method_body(&mut model, method).unwrap();

    let contract = contracts.contract_for_method(method).unwrap();
    let visited = contract.preconditions[0].condition;
    assert_ne!(visited, condition);
    assert_eq!(constant_of(&model, visited), Constant::Int32(2));
}

#[test]
fn test_identity_mutator_changes_nothing_in_place() {
    let mut model = CodeModel::new();
    let (block, _) = block_with_expression_statement(&mut model);
    let before = model.clone();
    let mut mutator = IdentityMutator::new(MutatorConfig::in_place());

    let result = mutator.visit_statement(&mut model, block).unwrap();

    assert_eq!(result, block);
    assert_eq!(model.statement(block), before.statement(block));
    assert_eq!(model.expression_count(), before.expression_count());
}

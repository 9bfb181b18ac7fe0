use super::*;
use crate::config::MutatorConfig;
use crate::mutator::{walk_statement, CodeMutator, MutatorContext};
use crate::services::{ClosureRemover, IlConverter, IteratorDecomposer, OperationValue};
use codemodel_core::expressions::{AnonymousDelegate, CompileTimeConstant, Constant};
use codemodel_core::members::TypeDefinition;
use codemodel_core::statements::{EmptyStatement, YieldBreakStatement, YieldReturnStatement};
use codemodel_core::{ExpressionKind, StatementKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

/// Emits one operation per statement of the root block and counts its calls
#[derive(Default)]
struct CountingConverter {
    calls: AtomicUsize,
    fail_next: AtomicBool,
    delay: Option<Duration>,
}

impl IlConverter for CountingConverter {
    fn convert(&self, request: ConversionRequest<'_>) -> anyhow::Result<GeneratedBody> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            anyhow::bail!("converter unavailable");
        }
        let statements = match &request.model.statement(request.block).kind {
            codemodel_core::StatementKind::Block(block) => block.statements.len(),
            _ => 1,
        };
        let operations = (0..statements)
            .map(|offset| Operation::new(0x2a, offset as u32, OperationValue::None))
            .collect();
        Ok(GeneratedBody {
            operations,
            max_stack: 8,
            size: statements as u32,
            ..Default::default()
        })
    }
}

/// Replaces every anonymous delegate with a null constant
struct NullingClosureRemover;

impl ClosureRemover for NullingClosureRemover {
    fn remove_anonymous_delegates(
        &self,
        model: &mut CodeModel,
        _method: MethodId,
        block: StmtId,
    ) -> anyhow::Result<Vec<TypeId>> {
        let delegates: Vec<_> = model
            .descendants(NodeRef::Statement(block))
            .filter_map(|node| match node {
                NodeRef::Expression(id)
                    if matches!(model.expression(id).kind, ExpressionKind::AnonymousDelegate(_)) =>
                {
                    Some(id)
                }
                _ => None,
            })
            .collect();
        for id in delegates {
            model.expression_mut(id).kind = CompileTimeConstant {
                value: Constant::Null,
            }
            .into();
        }
        let helper = model.add_type(TypeDefinition::new("", "<>c__DisplayClass1"))?;
        Ok(vec![helper])
    }
}

/// Turns yield statements into empty statements and adds a state machine type
#[derive(Default)]
struct CountingDecomposer {
    calls: AtomicUsize,
    saw_delegates: AtomicBool,
}

impl IteratorDecomposer for CountingDecomposer {
    fn decompose_iterator(
        &self,
        model: &mut CodeModel,
        _method: MethodId,
        block: StmtId,
    ) -> anyhow::Result<Vec<TypeId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = NormalizationChecker::check(model, NodeRef::Statement(block));
        self.saw_delegates
            .store(found.has_anonymous_delegates, Ordering::SeqCst);
        let yields: Vec<_> = model
            .descendants(NodeRef::Statement(block))
            .filter_map(|node| match node {
                NodeRef::Statement(id)
                    if matches!(
                        model.statement(id).kind,
                        StatementKind::YieldReturn(_) | StatementKind::YieldBreak(_)
                    ) =>
                {
                    Some(id)
                }
                _ => None,
            })
            .collect();
        for id in yields {
            model.statement_mut(id).kind = EmptyStatement::default().into();
        }
        let state_machine = model.add_type(TypeDefinition::new("", "<M>d__0"))?;
        Ok(vec![state_machine])
    }
}

fn services(converter: &Arc<CountingConverter>) -> Arc<BodyServices> {
    Arc::new(BodyServices::new(Arc::clone(converter) as Arc<dyn IlConverter>))
}

fn two_statement_block(model: &mut CodeModel) -> StmtId {
    let first = model.return_statement(None).unwrap();
    let second = model.return_statement(None).unwrap();
    model.block(vec![first, second]).unwrap()
}

fn method(model: &mut CodeModel) -> MethodId {
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    model
        .add_method(codemodel_core::members::MethodDefinition::new("M", ty, TypeId::VOID))
        .unwrap()
}

fn block_with_delegate(model: &mut CodeModel) -> (StmtId, codemodel_core::ExprId) {
    let body = model.block(Vec::new()).unwrap();
    let lambda = model
        .new_expression(
            AnonymousDelegate {
                body,
                return_type: TypeId::VOID,
                ..Default::default()
            },
            TypeId::OBJECT,
        )
        .unwrap();
    let statement = model.expression_statement(lambda).unwrap();
    (model.block(vec![statement]).unwrap(), lambda)
}

// ===== Single generation =====

#[test]
fn test_accessors_share_one_generation() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block);

    assert!(!body.is_generated());
    assert_eq!(body.operations(&model).unwrap().len(), 2);
    assert_eq!(body.max_stack(&model).unwrap(), 8);
    assert_eq!(body.size(&model).unwrap(), 2);
    assert!(body.local_variables(&model).unwrap().is_empty());
    assert!(body.exception_information(&model).unwrap().is_empty());
    assert!(body.private_helper_types(&model).unwrap().is_empty());

    assert!(body.is_generated());
    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    assert!(body.generated(&model).unwrap().normalized_model.is_none());
}

#[test]
fn test_set_block_discards_generated_operations() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block);
    assert_eq!(body.operations(&model).unwrap().len(), 2);

    let single = model.return_statement(None).unwrap();
    let replacement = model.block(vec![single]).unwrap();
    body.set_block(replacement);

    assert!(!body.is_generated());
    assert_eq!(body.block(), replacement);
    assert_eq!(body.operations(&model).unwrap().len(), 1);
    assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_set_options_discards_generated_operations() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block);
    body.operations(&model).unwrap();

    body.set_options(BodyOptions {
        locals_are_zeroed: false,
        ..BodyOptions::default()
    });

    assert!(!body.locals_are_zeroed());
    assert!(!body.is_generated());
    body.operations(&model).unwrap();
    assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_first_access_generates_once() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter {
        delay: Some(Duration::from_millis(20)),
        ..Default::default()
    });
    let body = SourceMethodBody::new(method, services(&converter), block);
    let barrier = Barrier::new(8);

    let results: Vec<Arc<GeneratedBody>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    body.generated(&model).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    for result in &results {
        assert!(Arc::ptr_eq(result, &results[0]));
    }
}

#[test]
fn test_failed_conversion_is_retried() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    converter.fail_next.store(true, Ordering::SeqCst);
    let body = SourceMethodBody::new(method, services(&converter), block);

    let error = body.operations(&model).unwrap_err();
    assert!(matches!(error, Error::Other(_)));
    assert!(error.to_string().contains("converter unavailable"));
    assert!(!body.is_generated());

    assert_eq!(body.operations(&model).unwrap().len(), 2);
    assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
}

// ===== Normalization =====

#[test]
fn test_delegates_are_removed_in_a_scratch_model() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let (block, lambda) = block_with_delegate(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let services = Arc::new(
        BodyServices::new(Arc::clone(&converter) as Arc<dyn IlConverter>)
            .with_closure_remover(Arc::new(NullingClosureRemover)),
    );
    let body = SourceMethodBody::new(method, services, block);
    let expressions_before = model.expression_count();

    let generated = body.generated(&model).unwrap();

    assert_eq!(generated.private_helper_types.len(), 1);
    let scratch = generated.normalized_model.as_ref().unwrap();
    let helper = generated.private_helper_types[0];
    assert_eq!(scratch.type_definition(helper).name, "<>c__DisplayClass1");
    let converted_roots = scratch.statement_count() - model.statement_count();
    assert_eq!(converted_roots, 3);

    // The caller's tree is untouched
    assert!(matches!(
        model.expression(lambda).kind,
        ExpressionKind::AnonymousDelegate(_)
    ));
    assert_eq!(model.expression_count(), expressions_before);
    assert_eq!(body.block(), block);
}

#[test]
fn test_normalized_option_skips_the_check() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let (block, _) = block_with_delegate(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block).with_options(BodyOptions {
        is_normalized: true,
        ..BodyOptions::default()
    });

    let generated = body.generated(&model).unwrap();
    assert!(generated.normalized_model.is_none());
    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_normalizer_is_an_error() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let (block, _) = block_with_delegate(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block);

    match body.generated(&model) {
        Err(Error::MissingNormalizer { method, service }) => {
            assert_eq!(method, "M");
            assert_eq!(service, "closure remover");
        }
        other => panic!("expected a missing normalizer, got {:?}", other),
    }
    assert_eq!(converter.calls.load(Ordering::SeqCst), 0);

    let yield_break = model.new_statement(YieldBreakStatement).unwrap();
    body.set_block(model.block(vec![yield_break]).unwrap());
    match body.generated(&model) {
        Err(Error::MissingNormalizer { service, .. }) => assert_eq!(service, "iterator decomposer"),
        other => panic!("expected a missing normalizer, got {:?}", other),
    }
}

/// `{ yield return 1; yield break; }`
fn iterator_block(model: &mut CodeModel) -> StmtId {
    let one = model.constant(Constant::Int32(1)).unwrap();
    let yield_return = model
        .new_statement(YieldReturnStatement { expression: one })
        .unwrap();
    let yield_break = model.new_statement(YieldBreakStatement).unwrap();
    model.block(vec![yield_return, yield_break]).unwrap()
}

#[test]
fn test_iterator_is_decomposed_in_a_scratch_model() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = iterator_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let decomposer = Arc::new(CountingDecomposer::default());
    let services = Arc::new(
        BodyServices::new(Arc::clone(&converter) as Arc<dyn IlConverter>)
            .with_iterator_decomposer(Arc::clone(&decomposer) as Arc<dyn IteratorDecomposer>),
    );
    let body = SourceMethodBody::new(method, services, block);

    let generated = body.generated(&model).unwrap();
    body.operations(&model).unwrap();

    assert_eq!(decomposer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    let scratch = generated.normalized_model.as_ref().unwrap();
    let helpers = body.private_helper_types(&model).unwrap();
    assert_eq!(helpers.len(), 1);
    assert_eq!(scratch.type_definition(helpers[0]).name, "<M>d__0");
    assert!(model.find_type("<M>d__0").is_none());
    assert!(NormalizationChecker::check(&model, NodeRef::Statement(block)).has_yield_statements);
}

#[test]
fn test_closures_are_removed_before_iterators_are_decomposed() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let (lambda_block, _) = block_with_delegate(&mut model);
    let yield_break = model.new_statement(YieldBreakStatement).unwrap();
    let block = model.block(vec![lambda_block, yield_break]).unwrap();
    let converter = Arc::new(CountingConverter::default());
    let decomposer = Arc::new(CountingDecomposer::default());
    let services = Arc::new(
        BodyServices::new(Arc::clone(&converter) as Arc<dyn IlConverter>)
            .with_closure_remover(Arc::new(NullingClosureRemover))
            .with_iterator_decomposer(Arc::clone(&decomposer) as Arc<dyn IteratorDecomposer>),
    );
    let body = SourceMethodBody::new(method, services, block);

    let generated = body.generated(&model).unwrap();

    assert_eq!(decomposer.calls.load(Ordering::SeqCst), 1);
    assert!(!decomposer.saw_delegates.load(Ordering::SeqCst));
    let scratch = generated.normalized_model.as_ref().unwrap();
    let names: Vec<&str> = generated
        .private_helper_types
        .iter()
        .map(|ty| scratch.type_definition(*ty).name.as_str())
        .collect();
    assert_eq!(names, ["<>c__DisplayClass1", "<M>d__0"]);
    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
}

// ===== Mutation of the installed block =====

/// Removes every return statement after the first
struct KeepFirstReturn {
    context: MutatorContext,
    returns: usize,
}

impl CodeMutator for KeepFirstReturn {
    fn context(&self) -> &MutatorContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut MutatorContext {
        &mut self.context
    }

    fn visit_return_statement(
        &mut self,
        model: &mut CodeModel,
        statement: StmtId,
    ) -> Result<StmtId> {
        self.returns += 1;
        if self.returns > 1 {
            return Ok(StmtId::DUMMY_BLOCK);
        }
        walk_statement(self, model, statement)
    }
}

/// Generates, mutates through the method body and returns the block
/// before and after
fn mutate_generated_body(config: MutatorConfig) -> (StmtId, StmtId) {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = Arc::new(SourceMethodBody::new(method, services(&converter), block));
    model.set_method_body(method, Arc::clone(&body) as Arc<dyn MethodBody>);
    assert_eq!(body.operations(&model).unwrap().len(), 2);

    let mut mutator = KeepFirstReturn {
        context: MutatorContext::new(config),
        returns: 0,
    };
    mutator.visit_method_body(&mut model, method).unwrap();

    assert!(!body.is_generated());
    assert_eq!(body.operations(&model).unwrap().len(), 1);
    assert_eq!(converter.calls.load(Ordering::SeqCst), 2);
    (block, body.block())
}

#[test]
fn test_in_place_mutation_discards_generated_operations() {
    let (before, after) = mutate_generated_body(MutatorConfig::in_place());
    assert_eq!(before, after);
}

#[test]
fn test_copy_on_write_mutation_discards_generated_operations() {
    let (before, after) = mutate_generated_body(MutatorConfig::copy_on_write());
    assert_ne!(before, after);
}

// ===== Body flavor =====

#[test]
fn test_with_block_keeps_services_and_options() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let block = two_statement_block(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::new(method, services(&converter), block).with_options(BodyOptions {
        locals_are_zeroed: false,
        ..BodyOptions::default()
    });

    let copy = body.with_block(method, block);
    let copy = copy.as_any().downcast_ref::<SourceMethodBody>().unwrap();

    assert!(!copy.locals_are_zeroed());
    assert!(!copy.is_generated());
    copy.operations(&model).unwrap();
    assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
    assert!(!body.is_generated());
}

#[test]
fn test_empty_body_holds_the_dummy_block() {
    let mut model = CodeModel::new();
    let method = method(&mut model);
    let converter = Arc::new(CountingConverter::default());
    let body = SourceMethodBody::empty(method, services(&converter));
    assert_eq!(body.block(), StmtId::DUMMY_BLOCK);
    assert_eq!(body.method_definition(), method);
}

//! Dispatch adapter: routes a node to its kind hook
//!
//! Before dispatching, the adapter decides whether the hook may write the
//! node itself or must receive a fresh shallow copy. The hook's return value
//! is passed straight back to the caller.

use crate::mutator::CodeMutator;
use codemodel_core::{
    CodeModel, ExprId, ExpressionTag, NodeRef, Result, StatementTag, StmtId,
};
use tracing::trace;

fn writable_expression<V: CodeMutator + ?Sized>(
    visitor: &V,
    model: &mut CodeModel,
    expression: ExprId,
) -> Result<ExprId> {
    let config = &visitor.context().config;
    if config.copy_only_if_not_already_mutable && !model.is_expression_frozen(expression) {
        return Ok(expression);
    }
    let copy = model.shallow_copy_expression(expression)?;
    trace!("Copied {} to {} before mutation", expression, copy);
    Ok(copy)
}

fn writable_statement<V: CodeMutator + ?Sized>(
    visitor: &V,
    model: &mut CodeModel,
    statement: StmtId,
) -> Result<StmtId> {
    let config = &visitor.context().config;
    if config.copy_only_if_not_already_mutable && !model.is_statement_frozen(statement) {
        return Ok(statement);
    }
    let copy = model.shallow_copy_statement(statement)?;
    trace!("Copied {} to {} before mutation", statement, copy);
    Ok(copy)
}

/// Calls the hook for the kind of `expression`. The dummy expression is
/// returned without visiting.
pub fn dispatch_expression<V: CodeMutator + ?Sized>(
    visitor: &mut V,
    model: &mut CodeModel,
    expression: ExprId,
) -> Result<ExprId> {
    if expression == ExprId::DUMMY {
        return Ok(expression);
    }
    let target = writable_expression(visitor, model, expression)?;
    visitor.context_mut().enter(NodeRef::Expression(target));
    let result = match model.expression(target).kind.tag() {
        ExpressionTag::Addition => visitor.visit_addition(model, target),
        ExpressionTag::AddressableExpression => visitor.visit_addressable_expression(model, target),
        ExpressionTag::AddressDereference => visitor.visit_address_dereference(model, target),
        ExpressionTag::AddressOf => visitor.visit_address_of(model, target),
        ExpressionTag::AnonymousDelegate => visitor.visit_anonymous_delegate(model, target),
        ExpressionTag::ArrayIndexer => visitor.visit_array_indexer(model, target),
        ExpressionTag::Assignment => visitor.visit_assignment(model, target),
        ExpressionTag::BitwiseAnd => visitor.visit_bitwise_and(model, target),
        ExpressionTag::BitwiseOr => visitor.visit_bitwise_or(model, target),
        ExpressionTag::BlockExpression => visitor.visit_block_expression(model, target),
        ExpressionTag::BoundExpression => visitor.visit_bound_expression(model, target),
        ExpressionTag::CastIfPossible => visitor.visit_cast_if_possible(model, target),
        ExpressionTag::CheckIfInstance => visitor.visit_check_if_instance(model, target),
        ExpressionTag::CompileTimeConstant => visitor.visit_compile_time_constant(model, target),
        ExpressionTag::Conditional => visitor.visit_conditional(model, target),
        ExpressionTag::Conversion => visitor.visit_conversion(model, target),
        ExpressionTag::CreateArray => visitor.visit_create_array(model, target),
        ExpressionTag::CreateDelegateInstance => {
            visitor.visit_create_delegate_instance(model, target)
        }
        ExpressionTag::CreateObjectInstance => visitor.visit_create_object_instance(model, target),
        ExpressionTag::DefaultValue => visitor.visit_default_value(model, target),
        ExpressionTag::Division => visitor.visit_division(model, target),
        ExpressionTag::DupValue => visitor.visit_dup_value(model, target),
        ExpressionTag::Equality => visitor.visit_equality(model, target),
        ExpressionTag::ExclusiveOr => visitor.visit_exclusive_or(model, target),
        ExpressionTag::GetTypeOfTypedReference => {
            visitor.visit_get_type_of_typed_reference(model, target)
        }
        ExpressionTag::GetValueOfTypedReference => {
            visitor.visit_get_value_of_typed_reference(model, target)
        }
        ExpressionTag::GreaterThan => visitor.visit_greater_than(model, target),
        ExpressionTag::GreaterThanOrEqual => visitor.visit_greater_than_or_equal(model, target),
        ExpressionTag::LeftShift => visitor.visit_left_shift(model, target),
        ExpressionTag::LessThan => visitor.visit_less_than(model, target),
        ExpressionTag::LessThanOrEqual => visitor.visit_less_than_or_equal(model, target),
        ExpressionTag::LogicalNot => visitor.visit_logical_not(model, target),
        ExpressionTag::MakeTypedReference => visitor.visit_make_typed_reference(model, target),
        ExpressionTag::MethodCall => visitor.visit_method_call(model, target),
        ExpressionTag::Modulus => visitor.visit_modulus(model, target),
        ExpressionTag::Multiplication => visitor.visit_multiplication(model, target),
        ExpressionTag::NamedArgument => visitor.visit_named_argument(model, target),
        ExpressionTag::NotEquality => visitor.visit_not_equality(model, target),
        ExpressionTag::OldValue => visitor.visit_old_value(model, target),
        ExpressionTag::OnesComplement => visitor.visit_ones_complement(model, target),
        ExpressionTag::OutArgument => visitor.visit_out_argument(model, target),
        ExpressionTag::PointerCall => visitor.visit_pointer_call(model, target),
        ExpressionTag::PopValue => visitor.visit_pop_value(model, target),
        ExpressionTag::RefArgument => visitor.visit_ref_argument(model, target),
        ExpressionTag::ReturnValue => visitor.visit_return_value(model, target),
        ExpressionTag::RightShift => visitor.visit_right_shift(model, target),
        ExpressionTag::RuntimeArgumentHandleExpression => {
            visitor.visit_runtime_argument_handle_expression(model, target)
        }
        ExpressionTag::SizeOf => visitor.visit_size_of(model, target),
        ExpressionTag::StackArrayCreate => visitor.visit_stack_array_create(model, target),
        ExpressionTag::Subtraction => visitor.visit_subtraction(model, target),
        ExpressionTag::TargetExpression => visitor.visit_target_expression(model, target),
        ExpressionTag::ThisReference => visitor.visit_this_reference(model, target),
        ExpressionTag::TokenOf => visitor.visit_token_of(model, target),
        ExpressionTag::TypeOf => visitor.visit_type_of(model, target),
        ExpressionTag::UnaryNegation => visitor.visit_unary_negation(model, target),
        ExpressionTag::UnaryPlus => visitor.visit_unary_plus(model, target),
        ExpressionTag::VectorLength => visitor.visit_vector_length(model, target),
    };
    visitor.context_mut().leave();
    result
}

/// Calls the hook for the kind of `statement`. The dummy block is returned
/// without visiting. A loop's contract follows the loop to whatever the hook
/// returns.
pub fn dispatch_statement<V: CodeMutator + ?Sized>(
    visitor: &mut V,
    model: &mut CodeModel,
    statement: StmtId,
) -> Result<StmtId> {
    if statement == StmtId::DUMMY_BLOCK {
        return Ok(statement);
    }
    let is_loop = model.statement(statement).kind.is_loop();
    let target = writable_statement(visitor, model, statement)?;
    visitor.context_mut().enter(NodeRef::Statement(target));
    let result = match model.statement(target).kind.tag() {
        StatementTag::Assert => visitor.visit_assert_statement(model, target),
        StatementTag::Assume => visitor.visit_assume_statement(model, target),
        StatementTag::Block => visitor.visit_block_statement(model, target),
        StatementTag::Break => visitor.visit_break_statement(model, target),
        StatementTag::Conditional => visitor.visit_conditional_statement(model, target),
        StatementTag::Continue => visitor.visit_continue_statement(model, target),
        StatementTag::CopyMemory => visitor.visit_copy_memory_statement(model, target),
        StatementTag::DebuggerBreak => visitor.visit_debugger_break_statement(model, target),
        StatementTag::DoUntil => visitor.visit_do_until_statement(model, target),
        StatementTag::Empty => visitor.visit_empty_statement(model, target),
        StatementTag::Expression => visitor.visit_expression_statement(model, target),
        StatementTag::FillMemory => visitor.visit_fill_memory_statement(model, target),
        StatementTag::ForEach => visitor.visit_for_each_statement(model, target),
        StatementTag::For => visitor.visit_for_statement(model, target),
        StatementTag::Goto => visitor.visit_goto_statement(model, target),
        StatementTag::GotoSwitchCase => visitor.visit_goto_switch_case_statement(model, target),
        StatementTag::Labeled => visitor.visit_labeled_statement(model, target),
        StatementTag::LocalDeclaration => visitor.visit_local_declaration_statement(model, target),
        StatementTag::Lock => visitor.visit_lock_statement(model, target),
        StatementTag::Push => visitor.visit_push_statement(model, target),
        StatementTag::ResourceUse => visitor.visit_resource_use_statement(model, target),
        StatementTag::Rethrow => visitor.visit_rethrow_statement(model, target),
        StatementTag::Return => visitor.visit_return_statement(model, target),
        StatementTag::Switch => visitor.visit_switch_statement(model, target),
        StatementTag::Throw => visitor.visit_throw_statement(model, target),
        StatementTag::TryCatchFinally => visitor.visit_try_catch_finally_statement(model, target),
        StatementTag::WhileDo => visitor.visit_while_do_statement(model, target),
        StatementTag::YieldBreak => visitor.visit_yield_break_statement(model, target),
        StatementTag::YieldReturn => visitor.visit_yield_return_statement(model, target),
    };
    visitor.context_mut().leave();
    let result = result?;

    if is_loop {
        if let Some(contracts) = visitor.context().contracts.clone() {
            if let Some(contract) = contracts.contract_for_loop(statement) {
                let visited = visitor.visit_loop_contract(model, &contract)?;
                if model.statement(result).kind.is_loop() {
                    contracts.associate_loop_with_contract(result, visited);
                }
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

use super::*;
use crate::body::BlockBody;
use crate::expressions::{Addition, Constant};
use crate::members::FieldDefinition;
use crate::statements::ReturnStatement;

fn int(model: &mut CodeModel, value: i32) -> ExprId {
    model.constant(Constant::Int32(value)).unwrap()
}

// ===== Construction =====

#[test]
fn test_new_model_holds_dummies_and_platform_types() {
    let model = CodeModel::new();
    assert_eq!(model.expression_count(), 1);
    assert_eq!(model.statement_count(), 1);
    assert_eq!(model.type_count(), 1 + PlatformType::ALL.len());
    assert_eq!(model.find_type("Int32"), Some(TypeId::INT32));
    assert_eq!(model.find_type("Boolean"), Some(TypeId::BOOLEAN));
    assert_eq!(model.platform_type(PlatformType::String), TypeId::STRING);
    assert!(model.type_definition(TypeId::INT32).is_value_type);
    assert!(!model.type_definition(TypeId::OBJECT).is_value_type);
}

#[test]
fn test_dummy_block_is_empty() {
    let model = CodeModel::new();
    let block = model
        .statement_node::<BlockStatement>(StmtId::DUMMY_BLOCK)
        .unwrap();
    assert!(block.statements.is_empty());
}

#[test]
fn test_add_field_lists_it_on_the_type() {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("Demo", "C")).unwrap();
    let field = model
        .add_field(FieldDefinition::new("count", TypeId::INT32, ty))
        .unwrap();
    assert_eq!(model.type_definition(ty).fields, vec![field]);
    assert_eq!(model.find_field(ty, "count"), Some(field));
    assert_eq!(model.type_definition(ty).full_name(), "Demo.C");
}

#[test]
fn test_typed_node_access() {
    let mut model = CodeModel::new();
    let left = int(&mut model, 1);
    let right = int(&mut model, 2);
    let sum = model
        .new_expression(Addition::new(left, right), TypeId::INT32)
        .unwrap();

    assert_eq!(model.expression_node::<Addition>(sum).unwrap().right_operand, right);
    assert!(model.expression_node::<CompileTimeConstant>(sum).is_none());

    model.expression_node_mut::<Addition>(sum).unwrap().check_overflow = true;
    assert!(model.expression_node::<Addition>(sum).unwrap().check_overflow);
}

// ===== Shallow copies =====

#[test]
fn test_shallow_copy_shares_children() {
    let mut model = CodeModel::new();
    let left = int(&mut model, 1);
    let right = int(&mut model, 2);
    let sum = model
        .new_expression(Addition::new(left, right), TypeId::INT32)
        .unwrap();

    let copy = model.shallow_copy_expression(sum).unwrap();
    assert_ne!(copy, sum);
    let copied = model.expression_node::<Addition>(copy).unwrap();
    assert_eq!(copied.left_operand, left);
    assert_eq!(copied.right_operand, right);
}

#[test]
fn test_shallow_copy_of_dummies_is_identity() {
    let mut model = CodeModel::new();
    assert_eq!(model.shallow_copy_expression(ExprId::DUMMY).unwrap(), ExprId::DUMMY);
    assert_eq!(
        model.shallow_copy_statement(StmtId::DUMMY_BLOCK).unwrap(),
        StmtId::DUMMY_BLOCK
    );
    assert_eq!(model.expression_count(), 1);
}

// ===== Mutability =====

#[test]
fn test_freeze_tree_marks_descendants() {
    let mut model = CodeModel::new();
    let value = int(&mut model, 7);
    let ret = model.new_statement(ReturnStatement { expression: Some(value) }).unwrap();
    let block = model.block(vec![ret]).unwrap();
    let loose = int(&mut model, 8);

    model.freeze_tree(NodeRef::Statement(block));

    assert!(model.is_statement_frozen(block));
    assert!(model.is_statement_frozen(ret));
    assert!(model.is_expression_frozen(value));
    assert!(!model.is_expression_frozen(loose));
}

#[test]
fn test_dummies_are_always_frozen() {
    let model = CodeModel::new();
    assert!(model.is_expression_frozen(ExprId::DUMMY));
    assert!(model.is_statement_frozen(StmtId::DUMMY_BLOCK));
}

// ===== Bodies =====

#[test]
fn test_method_body_attach_and_replace_block() {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("", "C")).unwrap();
    let method = model
        .add_method(MethodDefinition::new("M", ty, TypeId::VOID))
        .unwrap();
    assert!(model.method_body(method).is_none());

    let block = model.block(vec![]).unwrap();
    model.set_method_body(method, Arc::new(BlockBody::new(method, StmtId::DUMMY_BLOCK)));
    let body = model.method_body(method).unwrap();
    assert_eq!(body.block(), StmtId::DUMMY_BLOCK);

    body.set_block(block);
    assert_eq!(model.method_body(method).unwrap().block(), block);
    assert_eq!(model.find_method(ty, "M"), Some(method));

    assert!(model.remove_method_body(method).is_some());
    assert!(model.method_body(method).is_none());
}

// ===== Serialization =====

#[test]
fn test_model_serializes_without_bodies() {
    let mut model = CodeModel::new();
    let value = int(&mut model, 3);
    model.freeze_expression(value);

    let json = serde_json::to_string(&model).unwrap();
    let restored: CodeModel = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.expression_count(), model.expression_count());
    assert_eq!(restored.expression(value), model.expression(value));
    assert!(restored.is_expression_frozen(value));
}

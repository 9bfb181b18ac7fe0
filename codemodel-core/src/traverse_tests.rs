use super::*;
use crate::expressions::{AnonymousDelegate, Constant, Multiplication};
use crate::ids::TypeId;
use crate::members::{ParameterDefinition, SignatureOwner};
use crate::statements::{ForStatement, WhileDoStatement};

#[test]
fn test_children_follow_canonical_order() {
    let mut model = CodeModel::new();
    let x = model.new_local("x", TypeId::INT32).unwrap();
    let zero = model.constant(Constant::Int32(0)).unwrap();
    let init = model.local_declaration(x, Some(zero)).unwrap();
    let condition = model.constant(Constant::Bool(true)).unwrap();
    let step = model.block(vec![]).unwrap();
    let body = model.block(vec![]).unwrap();
    let for_loop = model
        .new_statement(ForStatement {
            initial_statements: vec![init],
            condition,
            incrementers: vec![step],
            body,
        })
        .unwrap();

    assert_eq!(
        model.children(for_loop.into()),
        vec![
            NodeRef::Statement(init),
            NodeRef::Expression(condition),
            NodeRef::Statement(step),
            NodeRef::Statement(body),
        ]
    );
    assert_eq!(model.declarations(init.into()).locals, vec![x]);
}

#[test]
fn test_descendants_are_pre_order() {
    let mut model = CodeModel::new();
    let a = model.constant(Constant::Int32(2)).unwrap();
    let b = model.constant(Constant::Int32(3)).unwrap();
    let product = model
        .new_expression(Multiplication::new(a, b), TypeId::INT32)
        .unwrap();
    let statement = model.expression_statement(product).unwrap();
    let block = model.block(vec![statement]).unwrap();

    let order: Vec<NodeRef> = model.descendants(block.into()).collect();
    assert_eq!(
        order,
        vec![
            NodeRef::Statement(block),
            NodeRef::Statement(statement),
            NodeRef::Expression(product),
            NodeRef::Expression(a),
            NodeRef::Expression(b),
        ]
    );
}

#[test]
fn test_shared_subtree_is_yielded_once() {
    let mut model = CodeModel::new();
    let shared = model.constant(Constant::Int32(5)).unwrap();
    let product = model
        .new_expression(Multiplication::new(shared, shared), TypeId::INT32)
        .unwrap();

    let count = model.descendants(product.into()).count();
    assert_eq!(count, 2);
}

#[test]
fn test_dummies_are_skipped() {
    let mut model = CodeModel::new();
    let condition = model.constant(Constant::Bool(false)).unwrap();
    let loop_statement = model
        .new_statement(WhileDoStatement {
            condition,
            body: StmtId::DUMMY_BLOCK,
        })
        .unwrap();

    let nodes: Vec<NodeRef> = model.descendants(loop_statement.into()).collect();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|node| !node.is_dummy()));
}

#[test]
fn test_anonymous_delegate_declares_its_parameters() {
    let mut model = CodeModel::new();
    let delegate = model
        .new_expression(AnonymousDelegate::default(), TypeId::OBJECT)
        .unwrap();
    let parameter = model
        .add_parameter(ParameterDefinition::new(
            "value",
            TypeId::INT32,
            0,
            SignatureOwner::AnonymousDelegate(delegate),
        ))
        .unwrap();
    model
        .expression_node_mut::<AnonymousDelegate>(delegate)
        .unwrap()
        .parameters
        .push(parameter);

    let declarations = model.declarations(delegate.into());
    assert_eq!(declarations.parameters, vec![parameter]);
    assert!(declarations.locals.is_empty());
}

#[test]
fn test_multiple_roots_walk_in_insertion_order() {
    let mut model = CodeModel::new();
    let first = model.constant(Constant::Int32(1)).unwrap();
    let second = model.constant(Constant::Int32(2)).unwrap();

    let nodes: Vec<NodeRef> = Traversal::new(&model)
        .from(first.into())
        .from(second.into())
        .collect();
    assert_eq!(nodes, vec![NodeRef::Expression(first), NodeRef::Expression(second)]);
}

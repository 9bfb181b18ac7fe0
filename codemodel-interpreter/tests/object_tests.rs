//! Objects, constructors and properties end to end

use codemodel_core::expressions::{
    Constant, CreateObjectInstance, TargetDefinition, TargetExpression,
};
use codemodel_core::members::{
    FieldDefinition, MethodDefinition, PropertyDefinition, TypeDefinition,
};
use codemodel_core::{BlockBody, CodeModel, MethodId, StmtId, TypeId};
use codemodel_interpreter::{Interpreter, InterpreterError, InterpreterOptions, Value};
use std::sync::Arc;

fn install(model: &mut CodeModel, method: MethodId, statements: Vec<StmtId>) {
    let block = model.block(statements).unwrap();
    model.set_method_body(method, Arc::new(BlockBody::new(method, block)));
}

/// ```text
/// class Counter {
///     int value;
///     Counter(int start) { this.value = start; }
///     int Value { set { this.value = value; } }
///     int Read() { return this.value; }
///     static int Run() { var c = new Counter(3); c.Value = 9; return c.Read(); }
/// }
/// ```
struct Counter {
    model: CodeModel,
    run: MethodId,
    constructor: MethodId,
    setter: MethodId,
}

fn counter() -> Counter {
    let mut model = CodeModel::new();
    let ty = model.add_type(TypeDefinition::new("Demo", "Counter")).unwrap();
    let value = model
        .add_field(FieldDefinition::new("value", TypeId::INT32, ty))
        .unwrap();

    let constructor = model
        .add_method(MethodDefinition {
            is_constructor: true,
            ..MethodDefinition::new(".ctor", ty, TypeId::VOID)
        })
        .unwrap();
    let start = model.new_parameter(constructor, "start", TypeId::INT32).unwrap();
    let this = model.this_reference(ty).unwrap();
    let target = model.target_field(Some(this), value).unwrap();
    let source = model.bound_parameter(start).unwrap();
    let store = model.assignment(target, source).unwrap();
    let store = model.expression_statement(store).unwrap();
    install(&mut model, constructor, vec![store]);

    let setter = model
        .add_method(MethodDefinition::new("set_Value", ty, TypeId::VOID))
        .unwrap();
    let incoming = model.new_parameter(setter, "value", TypeId::INT32).unwrap();
    let this = model.this_reference(ty).unwrap();
    let target = model.target_field(Some(this), value).unwrap();
    let source = model.bound_parameter(incoming).unwrap();
    let store = model.assignment(target, source).unwrap();
    let store = model.expression_statement(store).unwrap();
    install(&mut model, setter, vec![store]);
    let property = model
        .add_property(PropertyDefinition {
            setter: Some(setter),
            ..PropertyDefinition::new("Value", TypeId::INT32, ty)
        })
        .unwrap();

    let read = model
        .add_method(MethodDefinition::new("Read", ty, TypeId::INT32))
        .unwrap();
    let this = model.this_reference(ty).unwrap();
    let field = model.bound_field(Some(this), value).unwrap();
    let ret = model.return_statement(Some(field)).unwrap();
    install(&mut model, read, vec![ret]);

    let run = model
        .add_method(MethodDefinition {
            is_static: true,
            ..MethodDefinition::new("Run", ty, TypeId::INT32)
        })
        .unwrap();
    let c = model.new_local("c", ty).unwrap();
    let three = model.constant(Constant::Int32(3)).unwrap();
    let create = model
        .new_expression(
            CreateObjectInstance {
                method_to_call: constructor,
                arguments: vec![three],
            },
            ty,
        )
        .unwrap();
    let declare = model.local_declaration(c, Some(create)).unwrap();
    let instance = model.bound_local(c).unwrap();
    let property_target = model
        .new_expression(
            TargetExpression {
                definition: TargetDefinition::Property(property),
                instance: Some(instance),
                ..Default::default()
            },
            TypeId::INT32,
        )
        .unwrap();
    let nine = model.constant(Constant::Int32(9)).unwrap();
    let set = model.assignment(property_target, nine).unwrap();
    let set = model.expression_statement(set).unwrap();
    let receiver = model.bound_local(c).unwrap();
    let call = model.call(Some(receiver), read, Vec::new()).unwrap();
    let ret = model.return_statement(Some(call)).unwrap();
    install(&mut model, run, vec![declare, set, ret]);

    Counter {
        model,
        run,
        constructor,
        setter,
    }
}

#[test]
fn test_constructor_and_property_setter_run() {
    let counter = counter();
    let mut interpreter = Interpreter::new(&counter.model, InterpreterOptions::default());

    let result = interpreter.call(counter.run, None, Vec::new()).unwrap();

    assert_eq!(result, Value::Integer(9));
    assert_eq!(interpreter.call_count(counter.constructor), 1);
    assert_eq!(interpreter.call_count(counter.setter), 1);
}

#[test]
fn test_receiver_must_not_be_null() {
    let mut counter = counter();
    // Drop the constructor call: `c` starts out null
    let block = counter.model.method_body(counter.run).unwrap().block();
    let statements = counter
        .model
        .statement_node::<codemodel_core::statements::BlockStatement>(block)
        .unwrap()
        .statements
        .clone();
    let declaration = counter
        .model
        .statement_node_mut::<codemodel_core::statements::LocalDeclarationStatement>(statements[0])
        .unwrap();
    declaration.initial_value = None;

    let mut interpreter = Interpreter::new(&counter.model, InterpreterOptions::default());
    let error = interpreter.call(counter.run, None, Vec::new()).unwrap_err();

    assert!(matches!(error, InterpreterError::TypeError(_)));
}

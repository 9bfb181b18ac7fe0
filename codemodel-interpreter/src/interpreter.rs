//! Core interpreter implementation

use rustc_hash::FxHashMap;
use tracing::trace;

use codemodel_core::expressions::{
    BoundDefinition, BoundExpression, Conversion, MethodCall, TargetDefinition,
};
use codemodel_core::{
    CodeModel, Error, ExprId, Expression, ExpressionKind, FieldId, MethodId, Statement,
    StatementKind, StmtId, TypeId,
};

use crate::environment::Environment;
use crate::error::{ControlFlow, InterpreterError, InterpreterResult};
use crate::value::{Object, ObjectRef, Value};

/// Interpreter options
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Maximum nesting of method calls
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 256,
        }
    }
}

/// Tree-walking interpreter over one model
///
/// Calls are bound statically: a virtual call runs the method the call
/// names, not an override on the receiver's type.
pub struct Interpreter<'m> {
    model: &'m CodeModel,
    options: InterpreterOptions,
    /// Current call nesting
    call_depth: usize,
    /// Invocations per method since creation
    call_counts: FxHashMap<MethodId, usize>,
    /// Storage of static fields
    statics: FxHashMap<FieldId, Value>,
}

impl<'m> Interpreter<'m> {
    /// Create a new interpreter
    pub fn new(model: &'m CodeModel, options: InterpreterOptions) -> Self {
        Self {
            model,
            options,
            call_depth: 0,
            call_counts: FxHashMap::default(),
            statics: FxHashMap::default(),
        }
    }

    /// A fresh instance of `ty` without running a constructor
    pub fn new_object(&self, ty: TypeId) -> Value {
        Value::Object(Object::new(ty))
    }

    /// How often `method` has been called
    pub fn call_count(&self, method: MethodId) -> usize {
        self.call_counts.get(&method).copied().unwrap_or(0)
    }

    pub fn call_counts(&self) -> &FxHashMap<MethodId, usize> {
        &self.call_counts
    }

    /// Runs `method`'s body and returns its result, `Value::Null` for void methods
    pub fn call(
        &mut self,
        method: MethodId,
        this: Option<Value>,
        arguments: Vec<Value>,
    ) -> InterpreterResult<Value> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(InterpreterError::StackOverflow(self.options.max_call_depth));
        }
        let definition = self
            .model
            .try_method(method)
            .ok_or_else(|| Error::DanglingHandle(method.to_string()))?;
        if arguments.len() != definition.parameters.len() {
            return Err(InterpreterError::ArityError {
                expected: definition.parameters.len(),
                actual: arguments.len(),
            });
        }
        let body = self
            .model
            .method_body(method)
            .ok_or(InterpreterError::MissingBody(method))?;

        let mut env = if definition.is_static {
            Environment::new()
        } else {
            match this {
                Some(this) if this != Value::Null => Environment::with_this(this),
                _ => {
                    return Err(InterpreterError::TypeError(format!(
                        "instance method {} called without a receiver",
                        definition.name
                    )))
                }
            }
        };
        for (parameter, argument) in definition.parameters.iter().zip(arguments) {
            env.bind_parameter(*parameter, argument);
        }

        *self.call_counts.entry(method).or_default() += 1;
        trace!("Calling {} at depth {}", definition.name, self.call_depth);
        self.call_depth += 1;
        let flow = self.execute(body.block(), &mut env);
        self.call_depth -= 1;

        match flow? {
            ControlFlow::Return(Some(value)) => Ok(value),
            ControlFlow::Return(None) | ControlFlow::Normal => Ok(Value::Null),
            ControlFlow::Break => Err(InterpreterError::BreakOutsideLoop),
            ControlFlow::Continue => Err(InterpreterError::ContinueOutsideLoop),
        }
    }

    fn expression(&self, expression: ExprId) -> InterpreterResult<&'m Expression> {
        Ok(self
            .model
            .try_expression(expression)
            .ok_or_else(|| Error::DanglingHandle(expression.to_string()))?)
    }

    fn statement(&self, statement: StmtId) -> InterpreterResult<&'m Statement> {
        Ok(self
            .model
            .try_statement(statement)
            .ok_or_else(|| Error::DanglingHandle(statement.to_string()))?)
    }

    // ===== Statements =====

    /// Execute a statement
    pub fn execute(
        &mut self,
        statement: StmtId,
        env: &mut Environment,
    ) -> InterpreterResult<ControlFlow> {
        let node = self.statement(statement)?;
        match &node.kind {
            StatementKind::Block(block) => {
                for inner in &block.statements {
                    match self.execute(*inner, env)? {
                        ControlFlow::Normal => {}
                        other => return Ok(other),
                    }
                }
                Ok(ControlFlow::Normal)
            }
            StatementKind::Expression(statement) => {
                self.evaluate(statement.expression, env)?;
                Ok(ControlFlow::Normal)
            }
            StatementKind::LocalDeclaration(declaration) => {
                let value = match declaration.initial_value {
                    Some(initial) => self.evaluate(initial, env)?,
                    None => Value::default_for(self.model.local(declaration.local_variable).ty),
                };
                env.declare_local(declaration.local_variable, value);
                Ok(ControlFlow::Normal)
            }
            StatementKind::Return(ret) => {
                let value = match ret.expression {
                    Some(expression) => Some(self.evaluate(expression, env)?),
                    None => None,
                };
                Ok(ControlFlow::Return(value))
            }
            StatementKind::Conditional(conditional) => {
                if self.evaluate(conditional.condition, env)?.is_truthy() {
                    self.execute(conditional.true_branch, env)
                } else {
                    self.execute(conditional.false_branch, env)
                }
            }
            StatementKind::WhileDo(while_do) => {
                while self.evaluate(while_do.condition, env)?.is_truthy() {
                    match self.execute(while_do.body, env)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal | ControlFlow::Continue => {}
                    }
                }
                Ok(ControlFlow::Normal)
            }
            StatementKind::DoUntil(do_until) => {
                loop {
                    match self.execute(do_until.body, env)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal | ControlFlow::Continue => {}
                    }
                    if self.evaluate(do_until.condition, env)?.is_truthy() {
                        break;
                    }
                }
                Ok(ControlFlow::Normal)
            }
            StatementKind::For(for_statement) => {
                for initial in &for_statement.initial_statements {
                    self.execute(*initial, env)?;
                }
                while self.evaluate(for_statement.condition, env)?.is_truthy() {
                    match self.execute(for_statement.body, env)? {
                        ControlFlow::Break => break,
                        ControlFlow::Return(value) => return Ok(ControlFlow::Return(value)),
                        ControlFlow::Normal | ControlFlow::Continue => {}
                    }
                    for incrementer in &for_statement.incrementers {
                        self.execute(*incrementer, env)?;
                    }
                }
                Ok(ControlFlow::Normal)
            }
            StatementKind::Break(_) => Ok(ControlFlow::Break),
            StatementKind::Continue(_) => Ok(ControlFlow::Continue),
            StatementKind::Empty(_) | StatementKind::DebuggerBreak(_) => Ok(ControlFlow::Normal),
            StatementKind::Labeled(labeled) => self.execute(labeled.statement, env),
            StatementKind::Assert(assert) => {
                self.check(statement, assert.condition, env)?;
                Ok(ControlFlow::Normal)
            }
            StatementKind::Assume(assume) => {
                self.check(statement, assume.condition, env)?;
                Ok(ControlFlow::Normal)
            }
            StatementKind::Throw(throw) => {
                Err(InterpreterError::Thrown(self.evaluate(throw.exception, env)?))
            }
            other => Err(InterpreterError::UnsupportedStatement {
                kind: other.name(),
                node: statement,
            }),
        }
    }

    fn check(
        &mut self,
        statement: StmtId,
        condition: ExprId,
        env: &mut Environment,
    ) -> InterpreterResult<()> {
        if self.evaluate(condition, env)?.is_truthy() {
            Ok(())
        } else {
            Err(InterpreterError::AssertionFailed(statement))
        }
    }

    // ===== Expressions =====

    /// Evaluate an expression
    pub fn evaluate(
        &mut self,
        expression: ExprId,
        env: &mut Environment,
    ) -> InterpreterResult<Value> {
        let node = self.expression(expression)?;
        match &node.kind {
            ExpressionKind::CompileTimeConstant(constant) => {
                Ok(Value::from_constant(&constant.value))
            }
            ExpressionKind::ThisReference(_) => env
                .this()
                .cloned()
                .ok_or(InterpreterError::NullReference(expression)),
            ExpressionKind::BoundExpression(bound) => self.read_bound(expression, bound, env),
            ExpressionKind::Assignment(assignment) => {
                let value = self.evaluate(assignment.source, env)?;
                self.store(assignment.target, value.clone(), env)?;
                Ok(value)
            }
            ExpressionKind::MethodCall(call) => self.eval_call(expression, call, env),
            ExpressionKind::CreateObjectInstance(create) => {
                let ty = self.model.method(create.method_to_call).containing_type;
                let object = self.new_object(ty);
                let arguments = self.evaluate_all(&create.arguments, env)?;
                self.call(create.method_to_call, Some(object.clone()), arguments)?;
                Ok(object)
            }
            ExpressionKind::Conditional(conditional) => {
                if self.evaluate(conditional.condition, env)?.is_truthy() {
                    self.evaluate(conditional.result_if_true, env)
                } else {
                    self.evaluate(conditional.result_if_false, env)
                }
            }
            ExpressionKind::BlockExpression(block) => {
                match self.execute(block.block_statement, env)? {
                    ControlFlow::Normal => self.evaluate(block.expression, env),
                    flow => Err(InterpreterError::TypeError(format!(
                        "block expression {} left with {}",
                        expression, flow
                    ))),
                }
            }
            ExpressionKind::LogicalNot(not) => {
                Ok(Value::Boolean(!self.evaluate(not.operand, env)?.is_truthy()))
            }
            ExpressionKind::UnaryNegation(negation) => {
                match self.evaluate(negation.operand, env)? {
                    Value::Integer(i) if negation.check_overflow => {
                        Ok(Value::Integer(i.checked_neg().ok_or(InterpreterError::Overflow)?))
                    }
                    Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => Err(InterpreterError::TypeError(format!(
                        "cannot negate {}",
                        other.kind_name()
                    ))),
                }
            }
            ExpressionKind::UnaryPlus(plus) => self.evaluate(plus.operand, env),
            ExpressionKind::OnesComplement(complement) => {
                let value = self.evaluate(complement.operand, env)?;
                let i = value.to_integer().ok_or_else(|| {
                    InterpreterError::TypeError(format!("cannot complement {}", value.kind_name()))
                })?;
                Ok(Value::Integer(!i))
            }
            ExpressionKind::Conversion(conversion) => self.convert(conversion, env),
            ExpressionKind::DefaultValue(default) => {
                Ok(Value::default_for(default.default_value_type))
            }
            kind => match kind.as_binary() {
                Some(binary) => {
                    let (left, right) = (binary.left_operand(), binary.right_operand());
                    if self.is_target(left)? {
                        return self.compound_assignment(
                            expression,
                            kind,
                            left,
                            right,
                            binary.result_is_unmodified_left_operand(),
                            env,
                        );
                    }
                    let left = self.evaluate(left, env)?;
                    let right = self.evaluate(right, env)?;
                    self.binary(expression, kind, left, right)
                }
                None => Err(InterpreterError::UnsupportedExpression {
                    kind: kind.name(),
                    node: expression,
                }),
            },
        }
    }

    fn evaluate_all(
        &mut self,
        expressions: &[ExprId],
        env: &mut Environment,
    ) -> InterpreterResult<Vec<Value>> {
        expressions
            .iter()
            .map(|expression| self.evaluate(*expression, env))
            .collect()
    }

    fn eval_call(
        &mut self,
        expression: ExprId,
        call: &MethodCall,
        env: &mut Environment,
    ) -> InterpreterResult<Value> {
        let receiver = match call.this_argument {
            Some(this) if call.has_receiver() => {
                let receiver = self.evaluate(this, env)?;
                if receiver == Value::Null {
                    return Err(InterpreterError::NullReference(expression));
                }
                Some(receiver)
            }
            _ => None,
        };
        let arguments = self.evaluate_all(&call.arguments, env)?;
        self.call(call.method_to_call, receiver, arguments)
    }

    fn convert(
        &mut self,
        conversion: &Conversion,
        env: &mut Environment,
    ) -> InterpreterResult<Value> {
        let value = self.evaluate(conversion.value_to_convert, env)?;
        let target = conversion.type_after_conversion;
        let converted = if target == TypeId::FLOAT64 {
            value.to_float().map(Value::Float)
        } else if target == TypeId::BOOLEAN {
            Some(Value::Boolean(value.is_truthy()))
        } else if Value::default_for(target) == Value::Integer(0) {
            match &value {
                Value::Float(f) => Some(Value::Integer(*f as i64)),
                other => other.to_integer().map(Value::Integer),
            }
        } else {
            Some(value.clone())
        };
        converted.ok_or_else(|| {
            InterpreterError::TypeError(format!(
                "cannot convert {} to {}",
                value.kind_name(),
                target
            ))
        })
    }

    // ===== Storage =====

    fn instance(
        &mut self,
        expression: ExprId,
        instance: Option<ExprId>,
        env: &mut Environment,
    ) -> InterpreterResult<ObjectRef> {
        let value = match instance {
            Some(instance) => self.evaluate(instance, env)?,
            None => Value::Null,
        };
        match value {
            Value::Object(object) => Ok(object),
            _ => Err(InterpreterError::NullReference(expression)),
        }
    }

    fn read_bound(
        &mut self,
        expression: ExprId,
        bound: &BoundExpression,
        env: &mut Environment,
    ) -> InterpreterResult<Value> {
        match bound.definition {
            BoundDefinition::Local(local) => env.local(local),
            BoundDefinition::Parameter(parameter) => env.parameter(parameter),
            BoundDefinition::Field(field) => {
                let model = self.model;
                let default = || Value::default_for(model.field(field).ty);
                if model.field(field).is_static {
                    return Ok(self.statics.get(&field).cloned().unwrap_or_else(default));
                }
                let object = self.instance(expression, bound.instance, env)?;
                let value = object.borrow().fields.get(&field).cloned();
                Ok(value.unwrap_or_else(default))
            }
        }
    }

    fn is_target(&self, expression: ExprId) -> InterpreterResult<bool> {
        Ok(matches!(
            self.expression(expression)?.kind,
            ExpressionKind::TargetExpression(_)
        ))
    }

    /// Current value of an assignment target
    fn load(&mut self, target: ExprId, env: &mut Environment) -> InterpreterResult<Value> {
        let ExpressionKind::TargetExpression(node) = &self.expression(target)?.kind else {
            return Err(self.not_a_target(target)?);
        };
        let definition = match node.definition {
            TargetDefinition::Local(local) => BoundDefinition::Local(local),
            TargetDefinition::Parameter(parameter) => BoundDefinition::Parameter(parameter),
            TargetDefinition::Field(field) => BoundDefinition::Field(field),
            _ => {
                return Err(InterpreterError::UnsupportedExpression {
                    kind: "TargetExpression",
                    node: target,
                })
            }
        };
        let bound = BoundExpression {
            definition,
            instance: node.instance,
            ..Default::default()
        };
        self.read_bound(target, &bound, env)
    }

    fn store(
        &mut self,
        target: ExprId,
        value: Value,
        env: &mut Environment,
    ) -> InterpreterResult<()> {
        let ExpressionKind::TargetExpression(node) = &self.expression(target)?.kind else {
            return Err(self.not_a_target(target)?);
        };
        match node.definition {
            TargetDefinition::Local(local) => env.assign_local(local, value),
            TargetDefinition::Parameter(parameter) => env.assign_parameter(parameter, value)?,
            TargetDefinition::Field(field) => {
                if self.model.field(field).is_static {
                    self.statics.insert(field, value);
                } else {
                    let object = self.instance(target, node.instance, env)?;
                    object.borrow_mut().fields.insert(field, value);
                }
            }
            TargetDefinition::Property(property) => {
                let definition = self.model.property(property);
                let setter = definition.setter.ok_or_else(|| {
                    InterpreterError::TypeError(format!(
                        "property {} has no setter",
                        definition.name
                    ))
                })?;
                let receiver = match node.instance {
                    Some(instance) => Some(self.evaluate(instance, env)?),
                    None => None,
                };
                self.call(setter, receiver, vec![value])?;
            }
            TargetDefinition::ArrayIndexer(_) | TargetDefinition::AddressDereference(_) => {
                return Err(InterpreterError::UnsupportedExpression {
                    kind: "TargetExpression",
                    node: target,
                })
            }
        }
        Ok(())
    }

    fn not_a_target(&self, expression: ExprId) -> InterpreterResult<InterpreterError> {
        Ok(InterpreterError::TypeError(format!(
            "{} expression {} is not an assignment target",
            self.expression(expression)?.kind.name(),
            expression
        )))
    }

    /// `target op= value`, yielding the old or the new value
    fn compound_assignment(
        &mut self,
        expression: ExprId,
        kind: &ExpressionKind,
        target: ExprId,
        operand: ExprId,
        yields_old_value: bool,
        env: &mut Environment,
    ) -> InterpreterResult<Value> {
        let old = self.load(target, env)?;
        let right = self.evaluate(operand, env)?;
        let new = self.binary(expression, kind, old.clone(), right)?;
        self.store(target, new.clone(), env)?;
        Ok(if yields_old_value { old } else { new })
    }

    // ===== Operators =====

    fn binary(
        &self,
        expression: ExprId,
        kind: &ExpressionKind,
        left: Value,
        right: Value,
    ) -> InterpreterResult<Value> {
        match kind {
            ExpressionKind::Equality(_) => return Ok(Value::Boolean(left == right)),
            ExpressionKind::NotEquality(_) => return Ok(Value::Boolean(left != right)),
            _ => {}
        }
        let mismatch = || {
            InterpreterError::TypeError(format!(
                "cannot apply {} to {} and {}",
                kind.name(),
                left.kind_name(),
                right.kind_name()
            ))
        };
        match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => match kind {
                ExpressionKind::BitwiseAnd(_) => Ok(Value::Boolean(a & b)),
                ExpressionKind::BitwiseOr(_) => Ok(Value::Boolean(a | b)),
                ExpressionKind::ExclusiveOr(_) => Ok(Value::Boolean(a ^ b)),
                _ => Err(mismatch()),
            },
            (Value::String(a), Value::String(b)) => match kind {
                ExpressionKind::Addition(_) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(mismatch()),
            },
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                match (left.to_float(), right.to_float()) {
                    (Some(a), Some(b)) => float_binary(expression, kind, a, b),
                    _ => Err(mismatch()),
                }
            }
            _ => match (left.to_integer(), right.to_integer()) {
                (Some(a), Some(b)) => integer_binary(expression, kind, a, b),
                _ => Err(mismatch()),
            },
        }
    }
}

fn unsupported(expression: ExprId, kind: &ExpressionKind) -> InterpreterError {
    InterpreterError::UnsupportedExpression {
        kind: kind.name(),
        node: expression,
    }
}

fn integer_binary(
    expression: ExprId,
    kind: &ExpressionKind,
    a: i64,
    b: i64,
) -> InterpreterResult<Value> {
    use ExpressionKind as K;
    let checked = |result: Option<i64>| result.ok_or(InterpreterError::Overflow);
    let value = match kind {
        K::Addition(node) if node.check_overflow => Value::Integer(checked(a.checked_add(b))?),
        K::Addition(_) => Value::Integer(a.wrapping_add(b)),
        K::Subtraction(node) if node.check_overflow => Value::Integer(checked(a.checked_sub(b))?),
        K::Subtraction(_) => Value::Integer(a.wrapping_sub(b)),
        K::Multiplication(node) if node.check_overflow => {
            Value::Integer(checked(a.checked_mul(b))?)
        }
        K::Multiplication(_) => Value::Integer(a.wrapping_mul(b)),
        K::Division(_) | K::Modulus(_) if b == 0 => return Err(InterpreterError::DivisionByZero),
        K::Division(_) => Value::Integer(a.wrapping_div(b)),
        K::Modulus(_) => Value::Integer(a.wrapping_rem(b)),
        // Shift counts are masked, as the hardware does
        K::LeftShift(_) => Value::Integer(a.wrapping_shl(b as u32)),
        K::RightShift(node) if node.treat_operands_as_unsigned => {
            Value::Integer((a as u64).wrapping_shr(b as u32) as i64)
        }
        K::RightShift(_) => Value::Integer(a.wrapping_shr(b as u32)),
        K::BitwiseAnd(_) => Value::Integer(a & b),
        K::BitwiseOr(_) => Value::Integer(a | b),
        K::ExclusiveOr(_) => Value::Integer(a ^ b),
        K::LessThan(_) => Value::Boolean(a < b),
        K::LessThanOrEqual(_) => Value::Boolean(a <= b),
        K::GreaterThan(_) => Value::Boolean(a > b),
        K::GreaterThanOrEqual(_) => Value::Boolean(a >= b),
        _ => return Err(unsupported(expression, kind)),
    };
    Ok(value)
}

fn float_binary(
    expression: ExprId,
    kind: &ExpressionKind,
    a: f64,
    b: f64,
) -> InterpreterResult<Value> {
    use ExpressionKind as K;
    let value = match kind {
        K::Addition(_) => Value::Float(a + b),
        K::Subtraction(_) => Value::Float(a - b),
        K::Multiplication(_) => Value::Float(a * b),
        K::Division(_) => Value::Float(a / b),
        K::Modulus(_) => Value::Float(a % b),
        K::LessThan(_) => Value::Boolean(a < b),
        K::LessThanOrEqual(_) => Value::Boolean(a <= b),
        K::GreaterThan(_) => Value::Boolean(a > b),
        K::GreaterThanOrEqual(_) => Value::Boolean(a >= b),
        _ => return Err(unsupported(expression, kind)),
    };
    Ok(value)
}

#[cfg(test)]
#[path = "interpreter_tests.rs"]
mod tests;

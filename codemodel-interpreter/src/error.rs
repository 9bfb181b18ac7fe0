//! Error types for the interpreter

use std::fmt;
use thiserror::Error;

use codemodel_core::{ExprId, LocalId, MethodId, ParamId, StmtId};

use crate::value::Value;

/// Result type for interpreter operations
pub type InterpreterResult<T> = Result<T, InterpreterError>;

/// Errors that can occur during interpretation
#[derive(Debug, Error)]
pub enum InterpreterError {
    /// Local read before it was declared or assigned
    #[error("Local {0} is not initialized")]
    UninitializedLocal(LocalId),

    /// Parameter not bound in the current frame
    #[error("Parameter {0} is not bound")]
    UnboundParameter(ParamId),

    /// Type mismatch
    #[error("Type error: {0}")]
    TypeError(String),

    /// Invalid number of arguments
    #[error("Arity error: expected {expected} arguments, got {actual}")]
    ArityError { expected: usize, actual: usize },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Called method has no body to run
    #[error("Method {0} has no body")]
    MissingBody(MethodId),

    /// Instance member accessed without an object
    #[error("Null reference in {0}")]
    NullReference(ExprId),

    /// Expression kind the interpreter does not evaluate
    #[error("Cannot evaluate {kind} expression {node}")]
    UnsupportedExpression { kind: &'static str, node: ExprId },

    /// Statement kind the interpreter does not execute
    #[error("Cannot execute {kind} statement {node}")]
    UnsupportedStatement { kind: &'static str, node: StmtId },

    /// `assert` evaluated to false
    #[error("Assertion failed in {0}")]
    AssertionFailed(StmtId),

    /// `throw` reached the top of the interpreter
    #[error("Unhandled exception: {0}")]
    Thrown(Value),

    /// Stack overflow
    #[error("Stack overflow: maximum call depth {0} exceeded")]
    StackOverflow(usize),

    /// Break outside of loop
    #[error("Break outside of loop")]
    BreakOutsideLoop,

    /// Continue outside of loop
    #[error("Continue outside of loop")]
    ContinueOutsideLoop,

    /// The model itself is malformed
    #[error(transparent)]
    Model(#[from] codemodel_core::Error),
}

/// How a statement finished
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Fell through to the next statement
    Normal,
    /// Leave the innermost loop
    Break,
    /// Next iteration of the innermost loop
    Continue,
    /// Return from the method, with the value for non-void methods
    Return(Option<Value>),
}

impl fmt::Display for ControlFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlFlow::Normal => write!(f, "normal"),
            ControlFlow::Break => write!(f, "break"),
            ControlFlow::Continue => write!(f, "continue"),
            ControlFlow::Return(_) => write!(f, "return"),
        }
    }
}

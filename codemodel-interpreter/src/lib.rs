//! Tree-walking evaluator for code model method bodies
//!
//! Runs the statement trees held by a [`codemodel_core::CodeModel`] directly,
//! which is enough to check that a rewritten body still computes what the
//! original did. Only the structured subset of the node kinds is supported:
//! constants, arithmetic, comparisons, locals, parameters, fields, calls,
//! conditionals, loops and returns.

pub mod environment;
pub mod error;
pub mod interpreter;
pub mod value;

pub use environment::Environment;
pub use error::{ControlFlow, InterpreterError, InterpreterResult};
pub use interpreter::{Interpreter, InterpreterOptions};
pub use value::{Object, ObjectRef, Value};

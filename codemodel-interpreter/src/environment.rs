//! Call frames

use rustc_hash::FxHashMap;

use codemodel_core::{LocalId, ParamId};

use crate::error::{InterpreterError, InterpreterResult};
use crate::value::Value;

/// Bindings of one method activation
///
/// Locals are keyed by definition handle, so nested blocks share the frame:
/// well-formed trees never declare the same local twice on one path.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Receiver of an instance method
    this: Option<Value>,
    parameters: FxHashMap<ParamId, Value>,
    locals: FxHashMap<LocalId, Value>,
}

impl Environment {
    /// Create a frame for a static method
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frame for an instance method
    pub fn with_this(this: Value) -> Self {
        Self {
            this: Some(this),
            ..Self::default()
        }
    }

    /// The receiver, `None` in static methods
    pub fn this(&self) -> Option<&Value> {
        self.this.as_ref()
    }

    pub fn bind_parameter(&mut self, parameter: ParamId, value: Value) {
        self.parameters.insert(parameter, value);
    }

    pub fn parameter(&self, parameter: ParamId) -> InterpreterResult<Value> {
        self.parameters
            .get(&parameter)
            .cloned()
            .ok_or(InterpreterError::UnboundParameter(parameter))
    }

    /// Parameters are writable like locals
    pub fn assign_parameter(&mut self, parameter: ParamId, value: Value) -> InterpreterResult<()> {
        match self.parameters.get_mut(&parameter) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(InterpreterError::UnboundParameter(parameter)),
        }
    }

    /// Declares or re-declares a local (loop bodies declare on each iteration)
    pub fn declare_local(&mut self, local: LocalId, value: Value) {
        self.locals.insert(local, value);
    }

    pub fn local(&self, local: LocalId) -> InterpreterResult<Value> {
        self.locals
            .get(&local)
            .cloned()
            .ok_or(InterpreterError::UninitializedLocal(local))
    }

    /// Assigns a local. Assignment before declaration is allowed, as the
    /// declaration may have been hoisted out of the tree.
    pub fn assign_local(&mut self, local: LocalId, value: Value) {
        self.locals.insert(local, value);
    }

    /// Number of locals currently bound
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }
}

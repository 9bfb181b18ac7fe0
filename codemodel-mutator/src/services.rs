//! External collaborators of lazily generated method bodies
//!
//! The tree-to-instruction converter and the normalizing passes live outside
//! this crate. They are reached through the traits here and report failures
//! as `anyhow::Error`, which surface as [`codemodel_core::Error::Other`].

use crate::config::BodyOptions;
use codemodel_core::{
    CodeModel, FieldId, LocalId, Location, MethodId, ParamId, SourceLocationProvider, StmtId,
    TypeId,
};
use std::fmt;
use std::sync::Arc;

/// Operand of an operation
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OperationValue {
    #[default]
    None,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Local(LocalId),
    Parameter(ParamId),
    Field(FieldId),
    Method(MethodId),
    Type(TypeId),
    /// Branch target
    Offset(u32),
}

/// One instruction of a generated body
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub opcode: u16,
    pub offset: u32,
    pub value: OperationValue,
    pub location: Option<Location>,
}

impl Operation {
    pub fn new(opcode: u16, offset: u32, value: OperationValue) -> Self {
        Self {
            opcode,
            offset,
            value,
            location: None,
        }
    }
}

/// Instruction range in which some locals are in scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalScope {
    pub offset: u32,
    pub length: u32,
    pub locals: Vec<LocalId>,
}

/// Namespaces imported by the code of a scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    pub used_namespaces: Vec<String>,
}

/// Kind of a protected region handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Catch,
    Filter,
    Finally,
    Fault,
}

/// One protected region and its handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInformation {
    pub handler_kind: HandlerKind,
    pub exception_type: TypeId,
    pub try_start_offset: u32,
    pub try_end_offset: u32,
    pub filter_decision_start_offset: u32,
    pub handler_start_offset: u32,
    pub handler_end_offset: u32,
}

/// Everything a converter produces for one body
#[derive(Debug, Clone, Default)]
pub struct GeneratedBody {
    pub operations: Vec<Operation>,
    pub local_variables: Vec<LocalId>,
    pub max_stack: u16,
    pub local_scopes: Vec<LocalScope>,
    pub iterator_scopes: Vec<LocalScope>,
    pub namespace_scopes: Vec<NamespaceScope>,
    pub exception_information: Vec<ExceptionInformation>,
    /// Types introduced while normalizing (closure and iterator classes)
    pub private_helper_types: Vec<TypeId>,
    /// Size of the encoded body in bytes
    pub size: u32,
    /// When the body had to be normalized first, the model its handles
    /// resolve in. `None` for bodies converted straight from the caller's model.
    pub normalized_model: Option<Arc<CodeModel>>,
}

/// Input of one conversion
#[derive(Clone, Copy)]
pub struct ConversionRequest<'a> {
    pub model: &'a CodeModel,
    pub method: MethodId,
    pub block: StmtId,
    pub options: &'a BodyOptions,
    pub locations: Option<&'a dyn SourceLocationProvider>,
}

impl fmt::Debug for ConversionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("method", &self.method)
            .field("block", &self.block)
            .field("options", self.options)
            .field("locations", &self.locations.is_some())
            .finish()
    }
}

/// Turns a normalized statement tree into operations
pub trait IlConverter: Send + Sync {
    fn convert(&self, request: ConversionRequest<'_>) -> anyhow::Result<GeneratedBody>;
}

/// Rewrites anonymous delegates into helper types
pub trait ClosureRemover: Send + Sync {
    /// Removes every anonymous delegate under `block` in place and returns
    /// the helper types it introduced
    fn remove_anonymous_delegates(
        &self,
        model: &mut CodeModel,
        method: MethodId,
        block: StmtId,
    ) -> anyhow::Result<Vec<TypeId>>;
}

/// Rewrites iterator code (yield statements) into a state machine
pub trait IteratorDecomposer: Send + Sync {
    /// Decomposes the iterator under `block` in place and returns the
    /// helper types it introduced
    fn decompose_iterator(
        &self,
        model: &mut CodeModel,
        method: MethodId,
        block: StmtId,
    ) -> anyhow::Result<Vec<TypeId>>;
}

/// The collaborators a [`crate::SourceMethodBody`] generates with
#[derive(Clone)]
pub struct BodyServices {
    pub converter: Arc<dyn IlConverter>,
    pub closure_remover: Option<Arc<dyn ClosureRemover>>,
    pub iterator_decomposer: Option<Arc<dyn IteratorDecomposer>>,
    pub location_provider: Option<Arc<dyn SourceLocationProvider>>,
}

impl BodyServices {
    pub fn new(converter: Arc<dyn IlConverter>) -> Self {
        Self {
            converter,
            closure_remover: None,
            iterator_decomposer: None,
            location_provider: None,
        }
    }

    pub fn with_closure_remover(mut self, remover: Arc<dyn ClosureRemover>) -> Self {
        self.closure_remover = Some(remover);
        self
    }

    pub fn with_iterator_decomposer(mut self, decomposer: Arc<dyn IteratorDecomposer>) -> Self {
        self.iterator_decomposer = Some(decomposer);
        self
    }

    pub fn with_location_provider(mut self, provider: Arc<dyn SourceLocationProvider>) -> Self {
        self.location_provider = Some(provider);
        self
    }
}

impl fmt::Debug for BodyServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyServices")
            .field("closure_remover", &self.closure_remover.is_some())
            .field("iterator_decomposer", &self.iterator_decomposer.is_some())
            .field("location_provider", &self.location_provider.is_some())
            .finish_non_exhaustive()
    }
}

//! Copying and mutation of code model trees
//!
//! This crate provides:
//! - The dispatch adapter and the [`CodeMutator`] visitor with one hook per node kind
//! - [`ShallowCopier`] and the cone-aware [`DeepCopier`]
//! - [`SourceMethodBody`], a method body that converts its tree to operations on first use
//! - [`LazyPropertyMutator`], a rewrite caching attributed property getters

pub mod config;
pub mod copier;
pub mod dispatch;
pub mod host;
pub mod lazy_body;
pub mod lazy_property;
pub mod mutator;
pub mod normalize;
pub mod services;

pub use config::{BodyOptions, LazyPropertyConfig, MutationScope, MutatorConfig};
pub use copier::{DeepCopier, ShallowCopier};
pub use dispatch::{dispatch_expression, dispatch_statement};
pub use host::{CollectingHost, Diagnostic, DiagnosticSubject, Host, Severity, TracingHost};
pub use lazy_body::SourceMethodBody;
pub use lazy_property::{LazyPropertyMutator, LazyPropertyReport};
pub use mutator::{
    walk_expression, walk_statement, Children, CodeMutator, IdentityMutator, MutatorContext,
};
pub use normalize::NormalizationChecker;
pub use services::{
    BodyServices, ClosureRemover, ConversionRequest, ExceptionInformation, GeneratedBody,
    HandlerKind, IlConverter, IteratorDecomposer, LocalScope, NamespaceScope, Operation,
    OperationValue,
};

//! Core types for the mutable code model
//!
//! This crate provides the building blocks every transform works on:
//! - typed handles and the [`CodeModel`] arena
//! - expression and statement node kinds
//! - type, field, method, property, parameter and local definitions
//! - child rewriting, traversal, validation and structural equality
//! - the [`MethodBody`] abstraction and error types

pub mod body;
pub mod builder;
pub mod equality;
pub mod error;
pub mod expressions;
pub mod ids;
pub mod location;
pub mod members;
pub mod model;
pub mod rewrite;
pub mod statements;
pub mod traverse;
pub mod validate;

pub use body::{BlockBody, MethodBody};
pub use equality::structurally_equal;
pub use error::{Error, Result};
pub use expressions::{Expression, ExpressionKind, ExpressionNode, ExpressionTag};
pub use ids::{ExprId, FieldId, LocalId, MethodId, ParamId, PropertyId, StmtId, TypeId};
pub use location::{Location, NodeLocations, SourceLocationProvider};
pub use model::{CodeModel, ModelHashMap, ModelHashSet};
pub use rewrite::HandleRewriter;
pub use statements::{
    CatchClause, Statement, StatementKind, StatementNode, StatementTag, SwitchCase,
};
pub use traverse::{Declarations, NodeRef, Traversal};

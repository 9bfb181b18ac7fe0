//! Code contracts for the mutable code model
//!
//! This crate provides method, type and loop contracts whose conditions are
//! expressions in a [`codemodel_core::CodeModel`], and the
//! [`ContractProvider`] that associates them with the nodes they describe.

pub mod contract;
pub mod provider;

pub use contract::{
    LoopContract, LoopInvariant, MethodContract, Postcondition, Precondition, QuantifierTriggers,
    ThrownException, TypeContract, TypeInvariant,
};
pub use provider::ContractProvider;

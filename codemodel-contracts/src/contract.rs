//! Contract data types
//!
//! Contracts describe behavior a method, type or loop promises, as boolean
//! expressions living in the same [`CodeModel`] as the code they describe.
//! They are *not* embedded in the nodes they describe: a
//! [`ContractProvider`](crate::ContractProvider) associates them by handle.
//!
//! # Method contracts
//!
//! A method contract collects:
//! - preconditions, checked on entry and blamed on the caller
//! - postconditions, checked on normal return; may use `old(e)` and `result`
//! - thrown exceptions, each with the postcondition that holds when thrown
//! - frame information (`reads`, `writes`, `modified_variables`, `allocates`,
//!   `frees`) and termination `variants`
//!
//! # Type and loop contracts
//!
//! Type invariants hold after every public member returns. Loop invariants
//! hold on entry and after each iteration.
//!
//! # Copying
//!
//! Every expression handle held here is visible through `rewrite_expressions`,
//! which is how copiers and mutators carry a contract over to a new owner.
//!
//! [`CodeModel`]: codemodel_core::CodeModel

use codemodel_core::{ExprId, FieldId, HandleRewriter, Location, MethodId, Result, TypeId};
use serde::{Deserialize, Serialize};

fn rewrite_all<R: HandleRewriter + ?Sized>(r: &mut R, slot: &mut Vec<ExprId>) -> Result<()> {
    *slot = r.expressions(std::mem::take(slot))?;
    Ok(())
}

fn rewrite_optional<R: HandleRewriter + ?Sized>(
    r: &mut R,
    slot: &mut Option<ExprId>,
) -> Result<()> {
    if let Some(e) = slot {
        *e = r.expression(*e)?;
    }
    Ok(())
}

/// A condition the caller must establish
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Precondition {
    /// Boolean expression
    pub condition: ExprId,
    /// Message shown on violation
    pub description: Option<ExprId>,
    /// Exception thrown instead of a contract failure
    pub exception_to_throw: Option<ExprId>,
    /// Keep the check even in builds that strip contracts
    pub always_check_at_runtime: bool,
    /// Source text the condition was parsed from
    pub original_source: Option<String>,
    pub locations: Vec<Location>,
}

impl Precondition {
    /// Precondition over `condition` with nothing else set
    pub fn new(condition: ExprId) -> Self {
        Self {
            condition,
            ..Default::default()
        }
    }

    fn rewrite_expressions<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        self.condition = r.expression(self.condition)?;
        rewrite_optional(r, &mut self.description)?;
        rewrite_optional(r, &mut self.exception_to_throw)
    }
}

/// A condition the method establishes on return
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Postcondition {
    /// Boolean expression; may contain `old(e)` and `result`
    pub condition: ExprId,
    pub description: Option<ExprId>,
    pub original_source: Option<String>,
    pub locations: Vec<Location>,
}

impl Postcondition {
    /// Postcondition over `condition` with nothing else set
    pub fn new(condition: ExprId) -> Self {
        Self {
            condition,
            ..Default::default()
        }
    }

    fn rewrite_expressions<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        self.condition = r.expression(self.condition)?;
        rewrite_optional(r, &mut self.description)
    }
}

/// An exception a method may throw and what holds when it does
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThrownException {
    pub exception_type: TypeId,
    pub postcondition: Postcondition,
}

/// The contract of a method
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodContract {
    /// Objects the method allocates
    pub allocates: Vec<ExprId>,
    /// Objects the method frees
    pub frees: Vec<ExprId>,
    /// Variables whose values may differ on return
    pub modified_variables: Vec<ExprId>,
    /// Callers should inline the method when verifying
    pub must_inline: bool,
    pub postconditions: Vec<Postcondition>,
    pub preconditions: Vec<Precondition>,
    /// Locations the method may read
    pub reads: Vec<ExprId>,
    pub thrown_exceptions: Vec<ThrownException>,
    /// Locations the method may write
    pub writes: Vec<ExprId>,
    /// Termination measures
    pub variants: Vec<ExprId>,
    /// No observable side effects
    pub is_pure: bool,
    pub locations: Vec<Location>,
}

impl MethodContract {
    /// Whether the contract says nothing
    pub fn is_empty(&self) -> bool {
        self.allocates.is_empty()
            && self.frees.is_empty()
            && self.modified_variables.is_empty()
            && self.postconditions.is_empty()
            && self.preconditions.is_empty()
            && self.reads.is_empty()
            && self.thrown_exceptions.is_empty()
            && self.writes.is_empty()
            && self.variants.is_empty()
            && !self.must_inline
            && !self.is_pure
    }

    /// Passes every expression (and thrown exception type) through `r`
    pub fn rewrite_expressions<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        rewrite_all(r, &mut self.allocates)?;
        rewrite_all(r, &mut self.frees)?;
        rewrite_all(r, &mut self.modified_variables)?;
        for postcondition in &mut self.postconditions {
            postcondition.rewrite_expressions(r)?;
        }
        for precondition in &mut self.preconditions {
            precondition.rewrite_expressions(r)?;
        }
        rewrite_all(r, &mut self.reads)?;
        for thrown in &mut self.thrown_exceptions {
            thrown.exception_type = r.type_reference(thrown.exception_type)?;
            thrown.postcondition.rewrite_expressions(r)?;
        }
        rewrite_all(r, &mut self.writes)?;
        rewrite_all(r, &mut self.variants)
    }
}

/// A condition that holds whenever an instance is observable
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeInvariant {
    pub condition: ExprId,
    pub description: Option<ExprId>,
    /// Assumed rather than checked
    pub is_axiom: bool,
    pub original_source: Option<String>,
    pub locations: Vec<Location>,
}

/// The contract of a type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeContract {
    /// Model fields that exist only in contracts
    pub contract_fields: Vec<FieldId>,
    /// Model methods that exist only in contracts
    pub contract_methods: Vec<MethodId>,
    pub invariants: Vec<TypeInvariant>,
}

impl TypeContract {
    /// Passes the contract members and every invariant through `r`
    pub fn rewrite_expressions<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        for field in &mut self.contract_fields {
            *field = r.field(*field)?;
        }
        for method in &mut self.contract_methods {
            *method = r.method(*method)?;
        }
        for invariant in &mut self.invariants {
            invariant.condition = r.expression(invariant.condition)?;
            rewrite_optional(r, &mut invariant.description)?;
        }
        Ok(())
    }
}

/// A condition that holds on loop entry and after every iteration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopInvariant {
    pub condition: ExprId,
    pub description: Option<ExprId>,
    pub original_source: Option<String>,
    pub locations: Vec<Location>,
}

impl LoopInvariant {
    /// Invariant over `condition` with nothing else set
    pub fn new(condition: ExprId) -> Self {
        Self {
            condition,
            ..Default::default()
        }
    }
}

/// The contract of a loop statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopContract {
    pub invariants: Vec<LoopInvariant>,
    /// Termination measures
    pub variants: Vec<ExprId>,
    /// Locations the loop body may write
    pub writes: Vec<ExprId>,
    pub locations: Vec<Location>,
}

impl LoopContract {
    /// Passes every expression through `r`
    pub fn rewrite_expressions<R: HandleRewriter + ?Sized>(&mut self, r: &mut R) -> Result<()> {
        for invariant in &mut self.invariants {
            invariant.condition = r.expression(invariant.condition)?;
            rewrite_optional(r, &mut invariant.description)?;
        }
        rewrite_all(r, &mut self.variants)?;
        rewrite_all(r, &mut self.writes)
    }
}

/// Trigger sets of a quantifier: each inner list is one multi-pattern
pub type QuantifierTriggers = Vec<Vec<ExprId>>;

#[cfg(test)]
#[path = "contract_tests.rs"]
mod tests;

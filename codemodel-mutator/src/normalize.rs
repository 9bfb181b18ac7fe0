//! Detection of code that needs normalizing before conversion

use codemodel_core::{CodeModel, ExpressionKind, NodeRef, StatementKind};

/// What a tree contains that a converter cannot take directly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationChecker {
    /// At least one anonymous delegate (closure)
    pub has_anonymous_delegates: bool,
    /// At least one yield return or yield break (iterator)
    pub has_yield_statements: bool,
}

impl NormalizationChecker {
    /// Scans everything reachable from `root`
    pub fn check(model: &CodeModel, root: NodeRef) -> Self {
        let mut checker = Self::default();
        for node in model.descendants(root) {
            match node {
                NodeRef::Expression(id) => {
                    if let ExpressionKind::AnonymousDelegate(_) = model.expression(id).kind {
                        checker.has_anonymous_delegates = true;
                    }
                }
                NodeRef::Statement(id) => {
                    if matches!(
                        model.statement(id).kind,
                        StatementKind::YieldReturn(_) | StatementKind::YieldBreak(_)
                    ) {
                        checker.has_yield_statements = true;
                    }
                }
            }
            if checker.has_anonymous_delegates && checker.has_yield_statements {
                break;
            }
        }
        checker
    }

    /// The tree can be converted as it is
    pub fn is_normalized(&self) -> bool {
        !self.has_anonymous_delegates && !self.has_yield_statements
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;

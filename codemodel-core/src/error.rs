//! Error types for the code model

use thiserror::Error;

/// Errors produced while building, validating or transforming a code model
#[derive(Error, Debug)]
pub enum Error {
    /// A node combines fields in a way no well-formed program can
    #[error("Malformed {kind} node {node}: {reason}")]
    MalformedNode {
        /// Display form of the offending handle
        node: String,
        /// Node kind name
        kind: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A handle does not resolve to anything in the model
    #[error("Dangling handle: {0}")]
    DanglingHandle(String),

    /// Arena exhausted
    #[error("Handle overflow: maximum number of {0} reached")]
    HandleOverflow(&'static str),

    /// A method body needs normalization but the pass is not available
    #[error("Method {method} needs a {service} before it can be converted")]
    MissingNormalizer {
        /// Display form of the method handle
        method: String,
        /// Name of the missing service
        service: &'static str,
    },

    /// Failure reported by an external collaborator
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for code model operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

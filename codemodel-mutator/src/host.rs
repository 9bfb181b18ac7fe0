//! Host services: diagnostics reporting

use codemodel_core::{MethodId, PropertyId, TypeId};
use parking_lot::Mutex;
use std::fmt;
use tracing::{error, info, warn};

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// The member a diagnostic is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSubject {
    Type(TypeId),
    Method(MethodId),
    Property(PropertyId),
}

impl fmt::Display for DiagnosticSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSubject::Type(id) => id.fmt(f),
            DiagnosticSubject::Method(id) => id.fmt(f),
            DiagnosticSubject::Property(id) => id.fmt(f),
        }
    }
}

/// A message about a member that a rewrite could not handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub subject: DiagnosticSubject,
    /// Full message, already prefixed with the member's name
    pub message: String,
}

/// Environment a rewrite runs in
pub trait Host: Send + Sync {
    /// Reports a diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// Host that turns diagnostics into tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHost;

impl Host for TracingHost {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!(subject = %diagnostic.subject, "{}", diagnostic.message),
            Severity::Warning => warn!(subject = %diagnostic.subject, "{}", diagnostic.message),
            Severity::Info => info!(subject = %diagnostic.subject, "{}", diagnostic.message),
        }
    }
}

/// Host that keeps every diagnostic, and also traces it
#[derive(Debug, Default)]
pub struct CollectingHost {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Number of reported errors
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

impl Host for CollectingHost {
    fn report(&self, diagnostic: Diagnostic) {
        TracingHost.report(diagnostic.clone());
        self.diagnostics.lock().push(diagnostic);
    }
}

use super::severity::DiagnosticSeverity;
use serde::{Deserialize, Serialize};

/// Diagnostic codes for the error taxonomy in spec.md §7. These are all
/// non-fatal: the engine always produces an `AnalyzedModule`, degraded
/// where necessary, and these codes just make the degradation visible to
/// whoever is driving the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A resolved type set had size != 1 where exactly one was required.
    AmbiguousResolution,
    /// Two module ids collided; the later module was rejected.
    DuplicateModuleId,
    /// A derive/assignment/class-name rewrite overrode a previous one.
    NameCollision,
    /// A sidecar-merged method's parameter count disagreed with the analyzed one.
    InconsistentArity,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::AmbiguousResolution => "ambiguous-resolution",
            DiagnosticCode::DuplicateModuleId => "duplicate-module-id",
            DiagnosticCode::NameCollision => "name-collision",
            DiagnosticCode::InconsistentArity => "inconsistent-arity",
        }
    }

    pub fn default_severity(self) -> DiagnosticSeverity {
        match self {
            DiagnosticCode::AmbiguousResolution => DiagnosticSeverity::Hint,
            DiagnosticCode::DuplicateModuleId => DiagnosticSeverity::Error,
            DiagnosticCode::NameCollision => DiagnosticSeverity::Info,
            DiagnosticCode::InconsistentArity => DiagnosticSeverity::Warning,
        }
    }
}

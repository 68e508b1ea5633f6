use super::diagnostic::Diagnostic;
use serde::{Deserialize, Serialize};

/// An ordered bag of diagnostics, with the stable sort the teacher's
/// `AnalyzerPipeline::sort_diagnostics` applies: by module/file, then line,
/// then column, then code — so two runs over the same modules in the same
/// order produce byte-for-byte identical diagnostic output (spec.md §8
/// "Stable ordering").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticCollection {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn sort_stable(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let af = a.location.as_ref().map(|l| l.module.as_str()).unwrap_or_default();
            let bf = b.location.as_ref().map(|l| l.module.as_str()).unwrap_or_default();
            af.cmp(bf)
                .then_with(|| {
                    let al = a.location.as_ref().map(|l| l.line).unwrap_or(0);
                    let bl = b.location.as_ref().map(|l| l.line).unwrap_or(0);
                    al.cmp(&bl)
                })
                .then_with(|| {
                    let ac = a.location.as_ref().map(|l| l.column).unwrap_or(0);
                    let bc = b.location.as_ref().map(|l| l.column).unwrap_or(0);
                    ac.cmp(&bc)
                })
                .then_with(|| a.code.as_str().cmp(b.code.as_str()))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::code::DiagnosticCode;
    use crate::diagnostics::location::SourceLocation;

    #[test]
    fn sorts_by_module_then_line_then_column_then_code() {
        let mut col = DiagnosticCollection::default();
        col.push(
            Diagnostic::new(DiagnosticCode::NameCollision, "b")
                .with_location(SourceLocation::new("b", 1, 1)),
        );
        col.push(
            Diagnostic::new(DiagnosticCode::AmbiguousResolution, "a")
                .with_location(SourceLocation::new("a", 5, 1)),
        );
        col.push(
            Diagnostic::new(DiagnosticCode::InconsistentArity, "a2")
                .with_location(SourceLocation::new("a", 2, 9)),
        );
        col.sort_stable();
        let modules: Vec<_> = col.diagnostics.iter().map(|d| d.location.as_ref().unwrap().module.clone()).collect();
        assert_eq!(modules, vec!["a", "a", "b"]);
        assert_eq!(col.diagnostics[0].location.as_ref().unwrap().line, 2);
    }
}

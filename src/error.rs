use thiserror::Error;

/// The one real error taxonomy this crate returns (spec.md §7). Everything
/// else degrades to diagnostics or widened/empty type sets rather than
/// raising.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("module `{0}` was already ingested into this context")]
    DuplicateModuleId(String),
}

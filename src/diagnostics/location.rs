use serde::{Deserialize, Serialize};

/// A 1-based line/column location, populated only when the caller's AST
/// carries spans and `AnalysisConfig::track_locations` is enabled. The core
/// never computes spans itself — it just carries whatever the external
/// parser attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub module: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(module: impl Into<String>, line: usize, column: usize) -> Self {
        Self { module: module.into(), line, column }
    }
}

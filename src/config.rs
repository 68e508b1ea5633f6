use serde::{Deserialize, Serialize};

/// Context-wide configuration, mirroring the shape of the teacher's
/// `analysis::context::AnalysisConfig` (toggle maps keyed by a string id)
/// but scoped to this crate's pattern detectors and narrowing behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Apply the name-based parameter type heuristics of spec.md §4.1.3
    /// (`x,y,z,w,h,width,height` → number, `isX` → boolean, ...).
    pub enable_name_heuristics: bool,

    /// Detect `setmetatable(x, meta)` instance promotion (spec.md §4.1.2).
    pub enable_setmetatable_detection: bool,

    /// Detect `X:derive("T")` class idiom (spec.md §4.4).
    pub enable_derive_detection: bool,

    /// Detect closure-class idiom: `local self = {}` + method decls (spec.md §4.4).
    pub enable_closure_class_detection: bool,

    /// Detect framework UI base/child classes (spec.md §4.4).
    pub enable_framework_ui_detection: bool,

    /// Populate `SourceLocation`s on diagnostics when the caller's AST
    /// provides spans. Disabled by default since this crate's own `ast`
    /// module carries no spans; a caller lowering a richer AST into ours
    /// can still attach locations out of band via `AnalysisContext::
    /// note_location`.
    pub track_locations: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enable_name_heuristics: true,
            enable_setmetatable_detection: true,
            enable_derive_detection: true,
            enable_closure_class_detection: true,
            enable_framework_ui_detection: true,
            track_locations: false,
        }
    }
}

//! `ResolvedModule` (spec §3.5) — a module's partial results, produced by
//! `resolveItems` right after that module is fully walked, and consumed by
//! the finalizer one module at a time.

use crate::expr::ExpressionInfo;
use crate::ids::TableId;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ClassRef {
    pub name: String,
    pub table_id: TableId,
    pub base: Option<String>,
    pub derive_name: Option<String>,
    pub generated: bool,
    pub defining_module: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedModule {
    pub id: String,
    pub classes: Vec<ClassRef>,
    pub functions: Vec<(String, crate::ids::FunctionId)>,
    pub requires: Vec<(String, String)>,
    pub fields: Vec<(TableId, String)>,
    /// Module-level `return a, b, ...` expressions, left unresolved here —
    /// the finalizer runs each through the resolver once every module is in.
    pub returns: Vec<ExpressionInfo>,
    pub seen_classes: HashSet<TableId>,
}

impl ResolvedModule {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }
}

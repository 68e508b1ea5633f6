//! Opaque interned-ID namespaces (spec §3.1).
//!
//! Every cross-reference inside the analysis context is one of these IDs,
//! never a borrowed pointer into another record — the arena-of-records
//! design spec.md §9 calls for. IDs are monotonically increasing per
//! namespace within the lifetime of one `AnalysisContext` and are never
//! reused, so stale IDs from a dropped context are simply never looked up
//! again rather than silently aliasing a new record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A table record id: `@table(N)[name?]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u32);

/// A function record id: `@function(N)[name?]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// A reserved-role id: `@parameter(N)`, `@self`, `@instance`, `@module(path)`,
/// `@local`, `@field`, `@generated`. These never collide with `TableId`/
/// `FunctionId` because they live in their own internal namespace, but they
/// are still valid left-hand sides for a `reference` expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleId {
    Parameter(u32),
    SelfParam,
    Instance(u32),
    Module(String),
    Local(u32),
    Field(u32),
    Generated(u32),
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@table({})", self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@function({})", self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleId::Parameter(n) => write!(f, "@parameter({n})"),
            RoleId::SelfParam => write!(f, "@self"),
            RoleId::Instance(n) => write!(f, "@instance({n})"),
            RoleId::Module(path) => write!(f, "@module({path})"),
            RoleId::Local(n) => write!(f, "@local({n})"),
            RoleId::Field(n) => write!(f, "@field({n})"),
            RoleId::Generated(n) => write!(f, "@generated({n})"),
        }
    }
}

/// Any reference-able id: a local/parameter role, or an interned table/function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefId {
    Role(RoleId),
    Table(TableId),
    Function(FunctionId),
}

impl RefId {
    /// True for ids that must never leak into public output (spec §3.1, §8 "No leakage").
    pub fn is_internal(&self) -> bool {
        true
    }
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefId::Role(r) => write!(f, "{r}"),
            RefId::Table(t) => write!(f, "{t}"),
            RefId::Function(fun) => write!(f, "{fun}"),
        }
    }
}

/// Per-namespace monotonic counter, one instance per namespace per context.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGen(u32);

impl IdGen {
    pub fn next(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_distinct() {
        let mut gen = IdGen::default();
        let a = TableId(gen.next());
        let b = TableId(gen.next());
        assert_ne!(a, b);
        assert!(a.0 < b.0);
    }

    #[test]
    fn display_forms_are_internal_and_never_emitted_raw() {
        assert_eq!(TableId(3).to_string(), "@table(3)");
        assert_eq!(RoleId::SelfParam.to_string(), "@self");
    }
}

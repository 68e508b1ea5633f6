//! The internal, lowered expression representation (spec §3.2).
//!
//! This is distinct from the raw parser-facing `ast::Expr`: by the time an
//! expression reaches here, table/function literals have been interned
//! (assigned a `TableId`/`FunctionId`) and bare identifiers have been
//! resolved against the current scope into a `RefId`. Lowering from
//! `ast::Expr` happens in `AnalysisContext::lower_expr`.

use crate::ast::{Indexer, LiteralValue, LuaType, Operator};
use crate::ids::{FunctionId, RefId, TableId};
use crate::usage::UsageMask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Reference(RefId),
    Require { module: String },
    Literal(Literal),
    Index { base: Box<Expression>, index: Box<Expression> },
    Member { base: Box<Expression>, member: String, indexer: Indexer },
    Operation { operator: Operator, arguments: Vec<Expression> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub lua_type: LuaType,
    pub literal: Option<LiteralValue>,
    pub table_id: Option<TableId>,
    pub function_id: Option<FunctionId>,
}

/// Wraps an `Expression` with the flags spec §3.2 names, plus the usage
/// mask accumulated for it (§4.1.4) and a monotonic `uid` used purely as a
/// memoization key in the resolver (spec §4.2 "memoizes by ExpressionInfo
/// identity") — it carries no semantic meaning of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionInfo {
    pub uid: u64,
    pub expr: Expression,
    /// 1-based multi-return slot this info addresses, if any.
    pub index: Option<usize>,
    pub instance: bool,
    pub from_literal: bool,
    pub function_level: bool,
    pub defining_module: String,
    pub usage: UsageMask,
}

impl ExpressionInfo {
    pub fn narrow_usage(&mut self, mask: UsageMask) {
        self.usage = self.usage.intersect(mask);
    }
}

/// A stripped-down, serializable snapshot used only when an `ExpressionInfo`
/// needs to cross the public boundary (e.g. attached to a diagnostic). Not
/// used internally; internal code works with `Expression` directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpressionSummary {
    pub kind: &'static str,
}

impl Expression {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Reference(_) => "reference",
            Expression::Require { .. } => "require",
            Expression::Literal(_) => "literal",
            Expression::Index { .. } => "index",
            Expression::Member { .. } => "member",
            Expression::Operation { .. } => "operation",
        }
    }
}

//! `FunctionInfo` (spec §3.4).

use crate::expr::{Expression, ExpressionInfo};
use crate::ast::Indexer;
use crate::ids::{FunctionId, RefId};
use crate::types::TypeSet;

/// Where a function was assigned (spec §3.4 `identifierExpression`), kept
/// around for constructor/method detection in §4.1.3.
#[derive(Debug, Clone)]
pub struct IdentifierExpr {
    pub base: Option<Expression>,
    pub name: String,
    pub indexer: Option<Indexer>,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub id: FunctionId,
    /// Parameter ids, including a leading `@self` for `:`-indexed methods.
    pub parameters: Vec<RefId>,
    pub parameter_names: Vec<String>,
    pub parameter_types: Vec<TypeSet>,
    pub return_types: Vec<TypeSet>,
    pub return_expressions: Vec<Vec<ExpressionInfo>>,
    /// Minimum observed return width; slots at or beyond this index are
    /// implicitly nullable (spec §4.1.5).
    pub min_returns: usize,
    pub identifier_expression: Option<IdentifierExpr>,
    pub is_constructor: bool,
    pub is_method: bool,
    /// §4.7 ambient extension: a rosetta-sourced synthetic function, never
    /// discovered by walking an AST.
    pub is_synthetic: bool,
    pub defining_module: String,
}

impl FunctionInfo {
    pub fn new(id: FunctionId, defining_module: impl Into<String>) -> Self {
        Self {
            id,
            parameters: Vec::new(),
            parameter_names: Vec::new(),
            parameter_types: Vec::new(),
            return_types: Vec::new(),
            return_expressions: Vec::new(),
            min_returns: usize::MAX,
            identifier_expression: None,
            is_constructor: false,
            is_method: false,
            is_synthetic: false,
            defining_module: defining_module.into(),
        }
    }

    pub fn ensure_return_slot(&mut self, index: usize) {
        if self.return_types.len() <= index {
            self.return_types.resize(index + 1, TypeSet::new());
            self.return_expressions.resize(index + 1, Vec::new());
        }
    }

    /// spec §4.1.5: "After ingestion, slots with index >= minReturns gain `nil`."
    pub fn apply_min_returns_nil(&mut self) {
        use crate::types::TypeAtom;
        for (i, slot) in self.return_types.iter_mut().enumerate() {
            if i >= self.min_returns {
                slot.insert(TypeAtom::Nil);
            }
        }
    }
}

//! Framework (atom-UI) base/child class idiom (spec §4.4).
//!
//! Base: `A.__call({ _ATOM_UI_CLASS = X, ... })`.
//! Child: `Parent({...})` where `Parent` resolves to a UI-tagged table.

use crate::ast::{Expr, Indexer, Operator, TableField};

const UI_CLASS_KEY: &str = "_ATOM_UI_CLASS";

fn table_has_key(fields: &[TableField], key: &str) -> bool {
    fields.iter().any(|f| matches!(f, TableField::Keyed { key: Expr::Reference { name }, .. } if name == key))
}

/// Returns the table-constructor argument when `expr` matches
/// `<ref>.__call({ _ATOM_UI_CLASS = ..., ... })`.
pub fn detect_ui_base_call(expr: &Expr) -> Option<&crate::ast::TableConstructor> {
    let Expr::Operation { operator: Operator::Call, arguments } = expr else {
        return None;
    };
    let [callee, arg] = &arguments[..] else {
        return None;
    };
    let Expr::Member { member, indexer: Indexer::Dot, .. } = callee else {
        return None;
    };
    if member != "__call" {
        return None;
    }
    let Expr::Literal { table: Some(table), .. } = arg else {
        return None;
    };
    if table_has_key(&table.fields, UI_CLASS_KEY) {
        Some(table)
    } else {
        None
    }
}

/// Returns the table-constructor argument when `expr` matches
/// `Parent({...})` and `is_ui_tagged(parent_name)` is true.
pub fn detect_ui_child_call<'a>(
    expr: &'a Expr,
    is_ui_tagged: impl Fn(&str) -> bool,
) -> Option<&'a crate::ast::TableConstructor> {
    let Expr::Operation { operator: Operator::Call, arguments } = expr else {
        return None;
    };
    let [callee, arg] = &arguments[..] else {
        return None;
    };
    let Expr::Reference { name } = callee else {
        return None;
    };
    if !is_ui_tagged(name) {
        return None;
    }
    let Expr::Literal { table: Some(table), .. } = arg else {
        return None;
    };
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{LuaType, TableConstructor};

    #[test]
    fn recognizes_ui_base_call() {
        let table = TableConstructor {
            fields: vec![TableField::Keyed {
                key: Expr::Reference { name: UI_CLASS_KEY.into() },
                value: Expr::Reference { name: "Node".into() },
            }],
        };
        let expr = Expr::Operation {
            operator: Operator::Call,
            arguments: vec![
                Expr::Member { base: Box::new(Expr::Reference { name: "A".into() }), member: "__call".into(), indexer: Indexer::Dot },
                Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(table)), function: None },
            ],
        };
        assert!(detect_ui_base_call(&expr).is_some());
    }

    #[test]
    fn recognizes_ui_child_call() {
        let table = TableConstructor { fields: vec![] };
        let expr = Expr::Operation {
            operator: Operator::Call,
            arguments: vec![
                Expr::Reference { name: "Widget".into() },
                Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(table)), function: None },
            ],
        };
        assert!(detect_ui_child_call(&expr, |n| n == "Widget").is_some());
        assert!(detect_ui_child_call(&expr, |n| n == "Other").is_none());
    }
}

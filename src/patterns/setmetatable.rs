//! `setmetatable(X, meta)` call shape (spec §4.1.2, §4.4).

use crate::ast::{Expr, Operator};

/// Returns `(x_name, meta_expr)` when `expr` is a call to the global
/// `setmetatable` with a bare-identifier first argument.
pub fn detect_setmetatable_call(expr: &Expr) -> Option<(String, Expr)> {
    let Expr::Operation { operator: Operator::Call, arguments } = expr else {
        return None;
    };
    let [callee, x, meta] = &arguments[..] else {
        return None;
    };
    let Expr::Reference { name } = callee else {
        return None;
    };
    if name != "setmetatable" {
        return None;
    }
    let Expr::Reference { name: x_name } = x else {
        return None;
    };
    Some((x_name.clone(), meta.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LuaType;

    #[test]
    fn recognizes_setmetatable() {
        let expr = Expr::Operation {
            operator: Operator::Call,
            arguments: vec![
                Expr::Reference { name: "setmetatable".into() },
                Expr::Reference { name: "inst".into() },
                Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(crate::ast::TableConstructor { fields: vec![] })), function: None },
            ],
        };
        let (x, _meta) = detect_setmetatable_call(&expr).unwrap();
        assert_eq!(x, "inst");
    }
}

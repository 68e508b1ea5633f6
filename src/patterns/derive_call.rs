//! `X:derive("T")` (spec §4.4 "Derive call").

use crate::ast::{Expr, Indexer, LiteralValue, Operator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeriveCall {
    pub base_name: String,
    pub derive_name: String,
}

/// Recognizes `<base>:derive("T")` where `base` is a bare identifier and
/// the single argument is a string literal. Whether `base` is a global name
/// or resolves to a single classed table is decided by the caller, which
/// has the scope/context this module doesn't.
pub fn detect_derive_call(expr: &Expr) -> Option<DeriveCall> {
    let Expr::Operation { operator: Operator::Call, arguments } = expr else {
        return None;
    };
    let [callee, arg] = &arguments[..] else {
        return None;
    };
    let Expr::Member { base, member, indexer: Indexer::Colon } = callee else {
        return None;
    };
    if member != "derive" {
        return None;
    }
    let Expr::Reference { name } = base.as_ref() else {
        return None;
    };
    let Expr::Literal { literal: Some(LiteralValue::Str(derive_name)), .. } = arg else {
        return None;
    };
    Some(DeriveCall { base_name: name.clone(), derive_name: derive_name.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LuaType;

    fn str_lit(s: &str) -> Expr {
        Expr::Literal { lua_type: LuaType::String, literal: Some(LiteralValue::Str(s.into())), table: None, function: None }
    }

    #[test]
    fn recognizes_derive_call() {
        let expr = Expr::Operation {
            operator: Operator::Call,
            arguments: vec![
                Expr::Member {
                    base: Box::new(Expr::Reference { name: "Base".into() }),
                    member: "derive".into(),
                    indexer: Indexer::Colon,
                },
                str_lit("Widget"),
            ],
        };
        let d = detect_derive_call(&expr).unwrap();
        assert_eq!(d.base_name, "Base");
        assert_eq!(d.derive_name, "Widget");
    }

    #[test]
    fn rejects_dot_indexed_call() {
        let expr = Expr::Operation {
            operator: Operator::Call,
            arguments: vec![
                Expr::Member {
                    base: Box::new(Expr::Reference { name: "Base".into() }),
                    member: "derive".into(),
                    indexer: Indexer::Dot,
                },
                str_lit("Widget"),
            ],
        };
        assert!(detect_derive_call(&expr).is_none());
    }
}

//! Closure-class idiom (spec §4.4): a constructor function whose body binds
//! `self`/`publ` to a fresh table (or a base-class constructor call), then
//! adds methods onto that binding with subsequent function declarations.
//! Suppressed if the body also calls `setmetatable` on the same binding
//! (that shape is the metatable-instance idiom instead, §4.1.2).

use crate::ast::{Expr, FunctionBody, Indexer, LValue, Operator, Statement};
use crate::patterns::setmetatable::detect_setmetatable_call;

#[derive(Debug, Clone)]
pub struct ClosureClass {
    pub binding_name: String,
    pub base_call: Option<String>,
    pub method_names: Vec<String>,
}

fn is_self_binding(name: &str) -> bool {
    name == "self" || name == "publ"
}

fn is_fresh_table_or_base_new(value: &Expr) -> Option<Option<String>> {
    match value {
        Expr::Literal { table: Some(_), .. } => Some(None),
        Expr::Operation { operator: Operator::Call, arguments } => {
            let [callee, ..] = &arguments[..] else { return None };
            let Expr::Member { base, member, indexer: Indexer::Dot } = callee else {
                return None;
            };
            if member != "new" {
                return None;
            }
            let Expr::Reference { name } = base.as_ref() else { return None };
            Some(Some(name.clone()))
        }
        _ => None,
    }
}

pub fn detect_closure_class(body: &FunctionBody) -> Option<ClosureClass> {
    let mut binding_name = None;
    let mut base_call = None;
    let mut method_names = Vec::new();
    let mut suppressed = false;

    for stmt in &body.statements {
        match stmt {
            Statement::Local(local) if binding_name.is_none() => {
                if let ([name], [value]) = (&local.names[..], &local.values[..]) {
                    if is_self_binding(name) {
                        if let Some(base) = is_fresh_table_or_base_new(value) {
                            binding_name = Some(name.clone());
                            base_call = base;
                        }
                    }
                }
            }
            Statement::FunctionDeclaration(decl) => {
                if let Some(bound) = &binding_name {
                    if let LValue::Member { base, member, indexer: Indexer::Colon | Indexer::Dot } = &decl.identifier {
                        if let Expr::Reference { name } = base {
                            if name == bound {
                                method_names.push(member.clone());
                            }
                        }
                    }
                }
            }
            Statement::Call(expr) => {
                if let Some(bound) = &binding_name {
                    if let Some((target, _meta)) = detect_setmetatable_call(expr) {
                        if &target == bound {
                            suppressed = true;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if suppressed {
        return None;
    }
    let binding_name = binding_name?;
    if method_names.is_empty() {
        return None;
    }
    Some(ClosureClass { binding_name, base_call, method_names })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDeclaration, LocalStatement, LuaType};

    fn empty_table() -> Expr {
        Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(crate::ast::TableConstructor { fields: vec![] })), function: None }
    }

    #[test]
    fn detects_self_table_plus_method() {
        let body = FunctionBody {
            parameters: vec![],
            is_method: false,
            statements: vec![
                Statement::Local(LocalStatement { names: vec!["self".into()], values: vec![empty_table()] }),
                Statement::FunctionDeclaration(FunctionDeclaration {
                    identifier: LValue::Member {
                        base: Expr::Reference { name: "self".into() },
                        member: "go".into(),
                        indexer: Indexer::Colon,
                    },
                    body: FunctionBody { parameters: vec![], is_method: true, statements: vec![] },
                }),
            ],
        };
        let detected = detect_closure_class(&body).unwrap();
        assert_eq!(detected.binding_name, "self");
        assert_eq!(detected.method_names, vec!["go".to_string()]);
    }

    #[test]
    fn no_methods_means_no_closure_class() {
        let body = FunctionBody {
            parameters: vec![],
            is_method: false,
            statements: vec![Statement::Local(LocalStatement { names: vec!["self".into()], values: vec![empty_table()] })],
        };
        assert!(detect_closure_class(&body).is_none());
    }
}

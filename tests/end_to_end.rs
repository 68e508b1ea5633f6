//! End-to-end scenarios over hand-built `ast::Chunk` values, exercising the
//! full ingest -> resolve -> finalize pipeline.

use lua_semantic::ast::*;
use lua_semantic::context::AnalysisContext;
use lua_semantic::finalizer::Finalizer;
use lua_semantic::AnalysisConfig;

fn num(n: f64) -> Expr {
    Expr::Literal { lua_type: LuaType::Number, literal: Some(LiteralValue::Num(OrderedFloat(n))), table: None, function: None }
}

fn str_lit(s: &str) -> Expr {
    Expr::Literal { lua_type: LuaType::String, literal: Some(LiteralValue::Str(s.to_string())), table: None, function: None }
}

fn empty_table() -> Expr {
    Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(TableConstructor { fields: vec![] })), function: None }
}

#[test]
fn setmetatable_promotes_object_fields_onto_the_metatable_class() {
    let chunk = Chunk {
        statements: vec![
            Statement::Local(LocalStatement { names: vec!["X".into()], values: vec![empty_table()] }),
            Statement::Local(LocalStatement { names: vec!["inst".into()], values: vec![empty_table()] }),
            Statement::Assignment(Assignment {
                target: LValue::Member { base: Expr::Reference { name: "inst".into() }, member: "a".into(), indexer: Indexer::Dot },
                value: num(1.0),
            }),
            Statement::Call(Expr::Operation {
                operator: Operator::Call,
                arguments: vec![
                    Expr::Reference { name: "setmetatable".into() },
                    Expr::Reference { name: "inst".into() },
                    Expr::Literal {
                        lua_type: LuaType::Table,
                        literal: None,
                        table: Some(Box::new(TableConstructor {
                            fields: vec![TableField::Keyed {
                                key: Expr::Reference { name: "__index".into() },
                                value: Expr::Reference { name: "X".into() },
                            }],
                        })),
                        function: None,
                    },
                ],
            }),
        ],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("widget", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    let module = &modules["widget"];
    assert_eq!(module.classes.len(), 1);
    assert_eq!(module.classes[0].name, "X");
    let field = module.classes[0].fields.iter().find(|f| f.name == "a").unwrap();
    assert_eq!(field.types, vec!["number".to_string()]);
    assert!(module.tables.is_empty(), "the consumed inst object should not surface as a leftover table");
}

#[test]
fn derive_call_produces_a_class_with_base_and_derive_name() {
    let chunk = Chunk {
        statements: vec![Statement::Local(LocalStatement {
            names: vec!["Enemy".into()],
            values: vec![Expr::Operation {
                operator: Operator::Call,
                arguments: vec![
                    Expr::Member { base: Box::new(Expr::Reference { name: "ISBaseObject".into() }), member: "derive".into(), indexer: Indexer::Colon },
                    str_lit("Enemy"),
                ],
            }],
        })],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("enemy", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    let module = &modules["enemy"];
    assert_eq!(module.classes.len(), 1);
    assert_eq!(module.classes[0].name, "Enemy");
    assert_eq!(module.classes[0].base.as_deref(), Some("ISBaseObject"));
    assert_eq!(module.classes[0].derive_name.as_deref(), Some("Enemy"));
}

#[test]
fn closure_class_constructor_marks_its_self_table() {
    let constructor_body = FunctionBody {
        parameters: vec![],
        is_method: false,
        statements: vec![
            Statement::Local(LocalStatement { names: vec!["self".into()], values: vec![empty_table()] }),
            Statement::FunctionDeclaration(FunctionDeclaration {
                identifier: LValue::Member { base: Expr::Reference { name: "self".into() }, member: "greet".into(), indexer: Indexer::Colon },
                body: FunctionBody { parameters: vec![], is_method: true, statements: vec![] },
            }),
            Statement::Return(ReturnStatement { arguments: vec![Expr::Reference { name: "self".into() }] }),
        ],
    };
    let chunk = Chunk {
        statements: vec![Statement::FunctionDeclaration(FunctionDeclaration {
            identifier: LValue::Reference { name: "new_greeter".into(), is_local: true },
            body: constructor_body,
        })],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("greeter", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    let module = &modules["greeter"];
    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.functions[0].name, "new_greeter");
}

#[test]
fn table_field_types_emit_only_with_at_least_two_definitions() {
    let chunk = Chunk {
        statements: vec![
            Statement::Local(LocalStatement {
                names: vec!["T".into()],
                values: vec![Expr::Literal {
                    lua_type: LuaType::Table,
                    literal: None,
                    table: Some(Box::new(TableConstructor {
                        fields: vec![
                            TableField::Keyed {
                                key: Expr::Reference { name: "flagA".into() },
                                value: Expr::Literal { lua_type: LuaType::Boolean, literal: Some(LiteralValue::Bool(true)), table: None, function: None },
                            },
                            TableField::Keyed {
                                key: Expr::Reference { name: "flagB".into() },
                                value: Expr::Literal { lua_type: LuaType::Boolean, literal: Some(LiteralValue::Bool(false)), table: None, function: None },
                            },
                        ],
                    })),
                    function: None,
                }],
            }),
            Statement::Assignment(Assignment {
                target: LValue::Member { base: Expr::Reference { name: "T".into() }, member: "flagA".into(), indexer: Indexer::Dot },
                value: Expr::Literal { lua_type: LuaType::Boolean, literal: Some(LiteralValue::Bool(false)), table: None, function: None },
            }),
        ],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("flags", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    let module = &modules["flags"];
    assert_eq!(module.tables.len(), 1);
    let flag_a = module.tables[0].fields.iter().find(|f| f.key == "flagA").unwrap();
    let flag_b = module.tables[0].fields.iter().find(|f| f.key == "flagB").unwrap();
    assert_eq!(flag_a.value_types, vec!["boolean".to_string()], "flagA has two definitions and should resolve");
    assert!(flag_b.value_types.is_empty(), "flagB has only one definition and should stay unresolved");
}

#[test]
fn module_return_resolves_the_returned_literal_type() {
    let chunk = Chunk { statements: vec![Statement::Return(ReturnStatement { arguments: vec![str_lit("ok")] })] };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("m", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    let module = &modules["m"];
    assert_eq!(module.returns.len(), 1);
    assert_eq!(module.returns[0].types, vec!["string".to_string()]);
}

#[test]
fn and_or_short_circuit_through_a_full_pipeline_run() {
    let chunk = Chunk {
        statements: vec![Statement::Return(ReturnStatement {
            arguments: vec![Expr::Operation {
                operator: Operator::Or,
                arguments: vec![
                    Expr::Literal { lua_type: LuaType::Nil, literal: Some(LiteralValue::Nil), table: None, function: None },
                    num(1.0),
                ],
            }],
        })],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("m", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    assert_eq!(modules["m"].returns[0].types, vec!["number".to_string()]);
}

#[test]
fn duplicate_module_id_is_reported_as_an_error_not_a_panic() {
    let chunk = Chunk { statements: vec![] };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("dup", &chunk).unwrap();
    assert!(ctx.ingest_module("dup", &chunk).is_err());
}

#[test]
fn no_internal_id_leaks_into_any_analyzed_module() {
    let chunk = Chunk {
        statements: vec![Statement::Local(LocalStatement {
            names: vec!["Enemy".into()],
            values: vec![Expr::Operation {
                operator: Operator::Call,
                arguments: vec![
                    Expr::Member { base: Box::new(Expr::Reference { name: "Base".into() }), member: "derive".into(), indexer: Indexer::Colon },
                    str_lit("Enemy"),
                ],
            }],
        })],
    };
    let mut ctx = AnalysisContext::new(AnalysisConfig::default());
    ctx.ingest_module("m", &chunk).unwrap();
    let modules = Finalizer::finalize(ctx.into_parts());
    for module in modules.values() {
        module.assert_no_leakage();
    }
}

//! Public output model (spec §3.6) — the finalizer's target, and the only
//! part of this crate an emitter should need. No internal `@`-id may ever
//! appear in any `String` here (spec §8 "No leakage").

use crate::diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedParameter {
    pub name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedFunction {
    pub name: String,
    pub parameters: Vec<AnalyzedParameter>,
    pub return_types: Vec<Vec<String>>,
    pub is_method: bool,
    pub is_synthetic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedField {
    pub name: String,
    pub types: Vec<String>,
    /// Dotted setter name for floating setter fields (spec §4.3 step 2,
    /// §6 emitter contract "Setter fields are emitted with their dotted names").
    pub dotted_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedOverload {
    pub parameters: Vec<AnalyzedParameter>,
    pub return_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedClass {
    pub name: String,
    pub base: Option<String>,
    pub derive_name: Option<String>,
    pub fields: Vec<AnalyzedField>,
    pub literal_fields: Vec<AnalyzedField>,
    pub static_fields: Vec<AnalyzedField>,
    pub setter_fields: Vec<AnalyzedField>,
    pub methods: Vec<AnalyzedFunction>,
    pub functions: Vec<AnalyzedFunction>,
    pub constructors: Vec<AnalyzedFunction>,
    pub function_constructors: Vec<AnalyzedFunction>,
    pub overloads: Vec<AnalyzedOverload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedTableField {
    pub key: String,
    pub value_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedTable {
    pub name: Option<String>,
    pub fields: Vec<AnalyzedTableField>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedReturn {
    pub index: usize,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzedModule {
    pub id: String,
    pub classes: Vec<AnalyzedClass>,
    pub tables: Vec<AnalyzedTable>,
    pub functions: Vec<AnalyzedFunction>,
    pub fields: Vec<AnalyzedField>,
    pub returns: Vec<AnalyzedReturn>,
    /// Ambient (SPEC_FULL §3): diagnostics collected while analyzing this
    /// module, so an emitter doesn't need a second pass to surface them.
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyzedModule {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// No string anywhere in this module may begin with `@` (spec §8).
    pub fn assert_no_leakage(&self) {
        fn check(s: &str) {
            debug_assert!(!s.starts_with('@'), "internal id leaked into public output: {s}");
        }
        for c in &self.classes {
            check(&c.name);
            if let Some(b) = &c.base {
                check(b);
            }
            for f in c.fields.iter().chain(&c.literal_fields).chain(&c.static_fields).chain(&c.setter_fields) {
                check(&f.name);
                for t in &f.types {
                    check(t);
                }
            }
        }
        for t in &self.tables {
            for f in &t.fields {
                check(&f.key);
                for ty in &f.value_types {
                    check(ty);
                }
            }
        }
    }

    // --- §4.6 sidecar merge boundary -------------------------------------

    /// Add a class the sidecar declared but the analyzer never detected, or
    /// return the existing one with the same name for further merging.
    pub fn merge_class(&mut self, class: AnalyzedClass) -> &mut AnalyzedClass {
        if let Some(pos) = self.classes.iter().position(|c| c.name == class.name) {
            return &mut self.classes[pos];
        }
        self.classes.push(class);
        self.classes.last_mut().unwrap()
    }

    /// Fold a sidecar-declared method into an existing class, recording an
    /// `InconsistentArity` diagnostic (rather than erroring) when the
    /// sidecar's parameter count disagrees with an already-analyzed method
    /// of the same name — the analyzed arity wins (spec §7).
    pub fn merge_function(&mut self, class_name: &str, method: AnalyzedFunction) {
        use crate::diagnostics::{Diagnostic, DiagnosticCode};
        let Some(class) = self.classes.iter_mut().find(|c| c.name == class_name) else {
            return;
        };
        if let Some(existing) = class.methods.iter().find(|m| m.name == method.name) {
            if existing.parameters.len() != method.parameters.len() {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticCode::InconsistentArity,
                    format!(
                        "sidecar declares {} params for {}.{}, analyzed has {}",
                        method.parameters.len(),
                        class_name,
                        method.name,
                        existing.parameters.len()
                    ),
                ));
            }
            return;
        }
        class.methods.push(method);
    }

    pub fn merge_table(&mut self, table: AnalyzedTable) {
        if !self.tables.iter().any(|t| t.name == table.name) {
            self.tables.push(table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_function_keeps_analyzed_arity_and_flags_mismatch() {
        let mut module = AnalyzedModule::new("m");
        module.merge_class(AnalyzedClass { name: "A".into(), ..Default::default() });
        module.classes[0].methods.push(AnalyzedFunction {
            name: "foo".into(),
            parameters: vec![AnalyzedParameter { name: "x".into(), types: vec!["unknown".into()] }],
            ..Default::default()
        });
        module.merge_function(
            "A",
            AnalyzedFunction {
                name: "foo".into(),
                parameters: vec![
                    AnalyzedParameter { name: "x".into(), types: vec![] },
                    AnalyzedParameter { name: "y".into(), types: vec![] },
                ],
                ..Default::default()
            },
        );
        assert_eq!(module.classes[0].methods.len(), 1, "sidecar must not duplicate the analyzed method");
        assert_eq!(module.diagnostics.len(), 1);
    }
}

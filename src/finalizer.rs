//! Collapses interned ids into the public `AnalyzedModule` tree (spec §4.3).
//!
//! Runs once every module of interest has been ingested, so the resolver it
//! drives can see every module's classes when deciding whether a `Table`
//! atom names a real class or falls back to the generic `table` type.

use crate::analyzed_module::{
    AnalyzedClass, AnalyzedField, AnalyzedFunction, AnalyzedModule, AnalyzedParameter, AnalyzedReturn, AnalyzedTable,
    AnalyzedTableField,
};
use crate::context::AnalysisContextParts;
use crate::function_info::FunctionInfo;
use crate::ids::{FunctionId, TableId};
use crate::resolver::Resolver;
use crate::table_info::TableInfo;
use crate::types::{collapse_booleans, TypeAtom, TypeSet};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Render a type set to the public string vocabulary (spec §3.6, §8
/// "Boolean collapse", "No leakage"): sorted, de-duplicated, and collapsed
/// to the generic `table` name once more than two distinct classes would
/// otherwise show up side by side in the same slot.
pub fn render_type_set(set: &TypeSet, tables: &[TableInfo]) -> Vec<String> {
    let mut set = set.clone();
    collapse_booleans(&mut set);

    let distinct_classes: HashSet<&str> = set
        .iter()
        .filter_map(|a| match a {
            TypeAtom::Table(tid) => tables[tid.0 as usize].class_name.as_deref().filter(|_| tables[tid.0 as usize].is_class()),
            _ => None,
        })
        .collect();
    let collapse_tables = distinct_classes.len() > 2;

    let mut names: Vec<String> = set
        .iter()
        .map(|atom| atom_to_name(atom, tables, collapse_tables))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn atom_to_name(atom: &TypeAtom, tables: &[TableInfo], collapse_tables: bool) -> String {
    match atom {
        TypeAtom::Nil => "nil".to_string(),
        TypeAtom::True | TypeAtom::False | TypeAtom::Boolean => "boolean".to_string(),
        TypeAtom::Str => "string".to_string(),
        TypeAtom::Num => "number".to_string(),
        TypeAtom::Function(_) => "function".to_string(),
        TypeAtom::Unknown => "unknown".to_string(),
        TypeAtom::Table(tid) => {
            let table = &tables[tid.0 as usize];
            if !collapse_tables && table.is_class() {
                table.class_name.clone().unwrap()
            } else {
                "table".to_string()
            }
        }
    }
}

pub struct Finalizer {
    tables: Vec<TableInfo>,
    functions: Vec<FunctionInfo>,
}

impl Finalizer {
    /// Consume `parts` and produce one `AnalyzedModule` per ingested module,
    /// in ingestion order (spec §5 "Ordering guarantee").
    pub fn finalize(parts: AnalysisContextParts) -> IndexMap<String, AnalyzedModule> {
        let AnalysisContextParts { resolved, tables, functions, usage, global_names, definitions, diagnostics } = parts;
        let finalizer = Finalizer { tables, functions };
        let mut resolver = Resolver::new(&finalizer.tables, &finalizer.functions, &usage, &global_names, &definitions);

        let mut out = IndexMap::new();
        for (module_id, module) in &resolved {
            let mut analyzed = AnalyzedModule::new(module_id.clone());
            let mut emitted: HashSet<TableId> = HashSet::new();

            for class_ref in &module.classes {
                let table = &finalizer.tables[class_ref.table_id.0 as usize];
                if table.emit_as_table {
                    continue;
                }
                emitted.insert(class_ref.table_id);
                let analyzed_class = finalizer.finalize_class(class_ref.table_id, &class_ref.name, class_ref.base.as_deref(), class_ref.derive_name.as_deref(), &mut resolver);
                analyzed.classes.push(analyzed_class);
            }

            for &seen_tid in &module.seen_classes {
                if !emitted.insert(seen_tid) {
                    continue;
                }
                let table = &finalizer.tables[seen_tid.0 as usize];
                if table.consumed_by_instance {
                    continue;
                }
                if table.is_class() {
                    let name = table.class_name.clone().unwrap();
                    let analyzed_class = finalizer.finalize_class(seen_tid, &name, table.base_class.as_deref(), table.derive_name.as_deref(), &mut resolver);
                    analyzed.classes.push(analyzed_class);
                    continue;
                }
                analyzed.tables.push(finalizer.finalize_table(seen_tid, table.original_name.clone(), &mut resolver));
            }

            for (name, function_id) in &module.functions {
                let carried_by_class = finalizer.functions[function_id.0 as usize]
                    .identifier_expression
                    .as_ref()
                    .and_then(|ie| ie.base.as_ref())
                    .is_some();
                if carried_by_class {
                    continue;
                }
                analyzed.functions.push(finalizer.finalize_function(name, *function_id, &mut resolver));
            }

            for (index, info) in module.returns.iter().enumerate() {
                let types = render_type_set(&resolver.resolve(info.uid, &info.expr), &finalizer.tables);
                analyzed.returns.push(AnalyzedReturn { index: index + 1, types });
            }

            analyzed.diagnostics = diagnostics.diagnostics.iter().filter(|d| module_field_matches(d, module_id)).cloned().collect();
            analyzed.assert_no_leakage();
            out.insert(module_id.clone(), analyzed);
        }
        out
    }

    fn finalize_class(
        &self,
        table_id: TableId,
        name: &str,
        base: Option<&str>,
        derive_name: Option<&str>,
        resolver: &mut Resolver<'_>,
    ) -> AnalyzedClass {
        let table = &self.tables[table_id.0 as usize];
        let mut class = AnalyzedClass {
            name: name.to_string(),
            base: base.map(str::to_string),
            derive_name: derive_name.map(str::to_string),
            ..Default::default()
        };

        for entry in &table.literal_fields {
            let types = render_type_set(&resolver.resolve(entry.value.uid, &entry.value.expr), &self.tables);
            class.literal_fields.push(AnalyzedField { name: unquote(&entry.key), types, dotted_name: None });
        }

        // Ancestor-field pruning (spec §4.3 "finalizeClassFields"): a field
        // already declared on the base class is redundant on the child.
        let base_field_names: HashSet<String> = base
            .and_then(|b| self.tables.iter().find(|t| t.class_name.as_deref() == Some(b)))
            .map(|t| t.definitions.keys().map(|k| unquote(k)).collect())
            .unwrap_or_default();

        for (key, infos) in &table.definitions {
            let plain_name = unquote(key);
            if base_field_names.contains(&plain_name) {
                continue;
            }
            let mut combined = TypeSet::new();
            let mut is_all_functions = true;
            for info in infos {
                let resolved_set = resolver.resolve(info.uid, &info.expr);
                if !resolved_set.iter().all(|a| matches!(a, TypeAtom::Function(_))) {
                    is_all_functions = false;
                }
                combined.extend(resolved_set);
            }
            if is_all_functions && !infos.is_empty() {
                for atom in &combined {
                    if let TypeAtom::Function(fid) = atom {
                        let method = self.finalize_function(&plain_name, *fid, resolver);
                        if self.functions[fid.0 as usize].is_constructor {
                            class.constructors.push(method);
                        } else if self.functions[fid.0 as usize].is_method {
                            class.methods.push(method);
                        } else {
                            class.function_constructors.push(method);
                        }
                    }
                }
                continue;
            }
            let types = render_type_set(&combined, &self.tables);
            class.fields.push(AnalyzedField { name: plain_name, types, dotted_name: None });
        }

        class
    }

    /// A plain table's field only gets a rendered type once at least two
    /// definitions have been recorded against it (spec §4.3
    /// "finalizeTable"): a single assignment is too little evidence to
    /// narrow a dynamically-typed field, so it stays unresolved.
    fn finalize_table(&self, table_id: TableId, name: Option<String>, resolver: &mut Resolver<'_>) -> AnalyzedTable {
        let table = &self.tables[table_id.0 as usize];
        let mut out = AnalyzedTable { name, fields: Vec::new() };
        for entry in &table.literal_fields {
            let value_types = match table.definitions.get(&entry.key) {
                Some(defs) if defs.len() >= 2 => {
                    let mut combined = TypeSet::new();
                    for info in defs {
                        combined.extend(resolver.resolve(info.uid, &info.expr));
                    }
                    render_type_set(&combined, &self.tables)
                }
                _ => Vec::new(),
            };
            out.fields.push(AnalyzedTableField { key: unquote(&entry.key), value_types });
        }
        out
    }

    fn finalize_function(&self, name: &str, function_id: FunctionId, resolver: &mut Resolver<'_>) -> AnalyzedFunction {
        let f = &self.functions[function_id.0 as usize];
        let parameters = f
            .parameter_names
            .iter()
            .zip(&f.parameter_types)
            .filter(|(n, _)| n.as_str() != "self")
            .map(|(n, types)| AnalyzedParameter { name: n.clone(), types: render_type_set(types, &self.tables) })
            .collect();
        // §4.7 synthetic functions never had an AST body to walk: their
        // declared `return_types` are the only source of truth. Ordinary
        // functions resolve live from the return expressions they collected
        // during ingestion instead.
        let return_types = if f.is_synthetic {
            f.return_types.iter().map(|set| render_type_set(set, &self.tables)).collect()
        } else {
            f.return_expressions
                .iter()
                .enumerate()
                .map(|(i, infos)| {
                    let mut set = TypeSet::new();
                    for info in infos {
                        set.extend(resolver.resolve(info.uid, &info.expr));
                    }
                    if i >= f.min_returns {
                        set.insert(TypeAtom::Nil);
                    }
                    render_type_set(&set, &self.tables)
                })
                .collect()
        };
        AnalyzedFunction {
            name: name.to_string(),
            parameters,
            return_types,
            is_method: f.is_method,
            is_synthetic: f.is_synthetic,
        }
    }
}

fn unquote(key: &str) -> String {
    key.strip_prefix('"').and_then(|s| s.strip_suffix('"')).map(|s| s.replace("\\\"", "\"")).unwrap_or_else(|| key.to_string())
}

fn module_field_matches(diagnostic: &crate::diagnostics::Diagnostic, module_id: &str) -> bool {
    diagnostic.location.as_ref().map(|l| l.module == module_id).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::single;

    #[test]
    fn collapses_booleans_and_sorts() {
        let tables: Vec<TableInfo> = Vec::new();
        let mut set = single(TypeAtom::True);
        set.insert(TypeAtom::False);
        set.insert(TypeAtom::Str);
        let rendered = render_type_set(&set, &tables);
        assert_eq!(rendered, vec!["boolean".to_string(), "string".to_string()]);
    }

    #[test]
    fn more_than_two_classes_collapse_to_table() {
        let mut tables = Vec::new();
        for i in 0..3u32 {
            let mut t = TableInfo::new(TableId(i), "m");
            t.class_name = Some(format!("Class{i}"));
            tables.push(t);
        }
        let set: TypeSet = (0..3u32).map(|i| TypeAtom::Table(TableId(i))).collect();
        let rendered = render_type_set(&set, &tables);
        assert_eq!(rendered, vec!["table".to_string()]);
    }

    #[test]
    fn unquote_strips_literal_key_quoting() {
        assert_eq!(unquote("\"foo\""), "foo");
        assert_eq!(unquote("1"), "1");
    }
}

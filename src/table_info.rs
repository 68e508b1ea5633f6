//! `TableInfo` (spec §3.3).

use crate::ast::LuaType;
use crate::expr::ExpressionInfo;
use crate::ids::TableId;
use crate::types::TypeSet;
use indexmap::IndexMap;

/// Canonicalize a field key the way spec §3.3/§GLOSSARY define "literal
/// key": string keys are double-quoted with internal quotes escaped;
/// numeric/identifier keys pass through unchanged.
pub fn literal_key(name: &str, lua_type: Option<LuaType>) -> String {
    match lua_type {
        Some(LuaType::String) | None => {
            let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        Some(_) => name.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LiteralFieldEntry {
    pub key: String,
    pub value: ExpressionInfo,
    pub static_types: Option<TypeSet>,
}

#[derive(Debug, Clone)]
pub struct TableInfo {
    pub id: TableId,
    /// Insertion-ordered key/value pairs as they appeared in the original
    /// table constructor (spec §3.3, used by `finalizeTable`).
    pub literal_fields: Vec<LiteralFieldEntry>,
    /// `literalKey -> ExpressionInfo[]`, insertion order preserved so two
    /// runs over the same modules in the same order agree byte-for-byte
    /// (spec §5 "Ordering guarantee").
    pub definitions: IndexMap<String, Vec<ExpressionInfo>>,
    pub defining_module: String,
    pub class_name: Option<String>,
    pub original_name: Option<String>,
    pub base_class: Option<String>,
    pub derive_name: Option<String>,
    pub emit_as_table: bool,
    pub is_local_class: bool,
    pub is_empty_class: bool,
    pub is_closure_class: bool,
    pub from_hidden_class: bool,
    pub is_atom_ui: bool,
    pub is_atom_ui_base: bool,
    pub container_id: Option<TableId>,
    /// Set once this table's object has been promoted to an `@instance`
    /// role by `setmetatable` (spec §4.1.2): its fields were copied onto the
    /// metatable, so it no longer has an independent identity worth
    /// emitting, either as a table or a class.
    pub consumed_by_instance: bool,
}

impl TableInfo {
    pub fn new(id: TableId, defining_module: impl Into<String>) -> Self {
        Self {
            id,
            literal_fields: Vec::new(),
            definitions: IndexMap::new(),
            defining_module: defining_module.into(),
            class_name: None,
            original_name: None,
            base_class: None,
            derive_name: None,
            emit_as_table: false,
            is_local_class: false,
            is_empty_class: false,
            is_closure_class: false,
            from_hidden_class: false,
            is_atom_ui: false,
            is_atom_ui_base: false,
            container_id: None,
            consumed_by_instance: false,
        }
    }

    pub fn is_class(&self) -> bool {
        self.class_name.is_some() && !self.emit_as_table
    }

    pub fn push_definition(&mut self, key: String, info: ExpressionInfo) {
        self.definitions.entry(key).or_default().push(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_keys_are_quoted_and_escaped() {
        assert_eq!(literal_key("foo", Some(LuaType::String)), "\"foo\"");
        assert_eq!(literal_key("a\"b", Some(LuaType::String)), "\"a\\\"b\"");
    }

    #[test]
    fn numeric_and_identifier_keys_pass_through() {
        assert_eq!(literal_key("1", Some(LuaType::Number)), "1");
        assert_eq!(literal_key("foo", Some(LuaType::Number)), "foo");
    }
}

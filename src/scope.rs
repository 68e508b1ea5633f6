//! Lexical scope model (spec §2 "Scope model").

use crate::ids::{FunctionId, RefId, TableId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy)]
pub enum ScopeKind {
    Module,
    Function(FunctionId),
}

/// Partial items emitted eagerly during assignment (spec §GLOSSARY "Partial
/// item"); `resolveItems` (§4.1.6) groups these into a module's class/
/// function/require/field lists after the module is fully walked.
#[derive(Debug, Clone)]
pub enum PartialItem {
    Class { name: String, table_id: TableId },
    SeenClass { table_id: TableId },
    Require { name: String, module: String },
    Function { name: String, function_id: FunctionId },
    Field { table_id: TableId, key: String },
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub names: HashMap<String, RefId>,
    pub items: Vec<PartialItem>,
}

impl Scope {
    pub fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Self { id, kind, parent, names: HashMap::new(), items: Vec::new() }
    }

    pub fn bind(&mut self, name: impl Into<String>, id: RefId) {
        self.names.insert(name.into(), id);
    }
}

/// A scope arena plus the lookup chain walk, shared by every module.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn push(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, kind, parent));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Resolve a name by walking up the parent chain, as ordinary lexical
    /// scoping requires.
    pub fn resolve(&self, mut scope: ScopeId, name: &str) -> Option<RefId> {
        loop {
            let s = self.get(scope);
            if let Some(id) = s.names.get(name) {
                return Some(id.clone());
            }
            match s.parent {
                Some(p) => scope = p,
                None => return None,
            }
        }
    }

    pub fn is_function_scope(&self, scope: ScopeId) -> Option<FunctionId> {
        match self.get(scope).kind {
            ScopeKind::Function(f) => Some(f),
            ScopeKind::Module => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RoleId;

    #[test]
    fn resolves_through_parent_chain() {
        let mut arena = ScopeArena::default();
        let module = arena.push(ScopeKind::Module, None);
        let func = arena.push(ScopeKind::Function(FunctionId(0)), Some(module));
        arena.get_mut(module).bind("Global", RefId::Role(RoleId::Local(0)));
        assert!(arena.resolve(func, "Global").is_some());
        assert!(arena.resolve(func, "Missing").is_none());
    }
}

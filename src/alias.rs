//! Module alias map (spec §6 "Dependency resolver"): `path-suffix ->
//! {fullIDs}`, consulted only when a `require` by a shorter name is
//! ambiguous. A non-unique alias is ignored — the caller gets `None` back
//! and the require resolves to nothing, same as an unknown module.

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct AliasMap {
    by_suffix: HashMap<String, Vec<String>>,
}

impl AliasMap {
    pub fn register(&mut self, full_id: &str) {
        let mut parts: Vec<&str> = full_id.split('/').collect();
        while !parts.is_empty() {
            let suffix = parts.join("/");
            self.by_suffix.entry(suffix).or_default().push(full_id.to_string());
            parts.remove(0);
        }
    }

    /// Resolve `name` to a single full module id. Ambiguous or missing
    /// suffixes resolve to `None`.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let candidates = self.by_suffix.get(name)?;
        let mut unique: Vec<&str> = candidates.iter().map(String::as_str).collect();
        unique.sort_unstable();
        unique.dedup();
        if unique.len() == 1 {
            Some(unique[0])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_suffix_resolves() {
        let mut map = AliasMap::default();
        map.register("a/b/widget");
        assert_eq!(map.resolve("widget"), Some("a/b/widget"));
        assert_eq!(map.resolve("b/widget"), Some("a/b/widget"));
    }

    #[test]
    fn ambiguous_suffix_is_ignored() {
        let mut map = AliasMap::default();
        map.register("a/widget");
        map.register("b/widget");
        assert_eq!(map.resolve("widget"), None);
    }
}

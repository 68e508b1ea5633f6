//! Name-based parameter type heuristics (spec §4.1.3).
//!
//! Applied only when `AnalysisConfig::enable_name_heuristics` is set, and
//! only ever *seeds* a parameter's type set — usage narrowing and the
//! resolver can still widen or further narrow it later.

use crate::types::{TypeAtom, TypeSet};

const NUMERIC_NAMES: &[&str] = &["x", "y", "z", "w", "h", "width", "height", "dx", "dy", "radius"];

/// Best-effort type guess for a bare parameter name. Returns an empty set
/// ("no information") when nothing matches.
pub fn infer_from_name(name: &str) -> TypeSet {
    let lower = name.to_ascii_lowercase();
    if NUMERIC_NAMES.contains(&lower.as_str()) {
        let mut set = TypeSet::new();
        set.insert(TypeAtom::Num);
        return set;
    }
    if lower.starts_with("is") && lower.len() > 2 && lower.as_bytes()[2].is_ascii_uppercase() {
        let mut set = TypeSet::new();
        set.insert(TypeAtom::Boolean);
        return set;
    }
    TypeSet::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_numeric_names() {
        assert_eq!(infer_from_name("width"), infer_from_name("height"));
        assert!(infer_from_name("width").contains(&TypeAtom::Num));
    }

    #[test]
    fn recognizes_is_prefixed_booleans() {
        assert!(infer_from_name("isVisible").contains(&TypeAtom::Boolean));
        assert!(infer_from_name("island").is_empty());
    }

    #[test]
    fn unknown_names_carry_no_information() {
        assert!(infer_from_name("foo").is_empty());
    }
}

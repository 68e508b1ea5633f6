//! Type-set representation (spec §4.2, §9 "dynamic typing").
//!
//! A type set is a set of atoms drawn from a closed domain: the primitive
//! names, the boolean-literal singletons `true`/`false` (which the resolver
//! later collapses into `boolean`), opaque table/function identities, and
//! the reserved `unknown` marker — distinct from the empty set, which means
//! "no information" rather than "explicitly unresolved" (spec §9).

use crate::ids::{FunctionId, TableId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeAtom {
    Nil,
    True,
    False,
    Boolean,
    Str,
    Num,
    Table(TableId),
    Function(FunctionId),
    Unknown,
}

pub type TypeSet = BTreeSet<TypeAtom>;

pub fn single(atom: TypeAtom) -> TypeSet {
    let mut s = TypeSet::new();
    s.insert(atom);
    s
}

/// Collapse `{true, false}` down to `{boolean}` (spec §8 "Boolean collapse").
/// Applied wherever a type set is about to leave the resolver.
pub fn collapse_booleans(set: &mut TypeSet) {
    if set.contains(&TypeAtom::True) && set.contains(&TypeAtom::False) {
        set.remove(&TypeAtom::True);
        set.remove(&TypeAtom::False);
        set.insert(TypeAtom::Boolean);
    }
}

/// Literal truthiness of an atom, where determinable; `None` means "can't tell
/// without control-flow simulation", which the resolver treats conservatively.
pub fn atom_truthiness(atom: &TypeAtom) -> Option<bool> {
    match atom {
        TypeAtom::Nil | TypeAtom::False => Some(false),
        TypeAtom::True | TypeAtom::Str | TypeAtom::Num | TypeAtom::Table(_) | TypeAtom::Function(_) => Some(true),
        TypeAtom::Boolean | TypeAtom::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_only_fires_when_both_present() {
        let mut s = single(TypeAtom::True);
        collapse_booleans(&mut s);
        assert_eq!(s, single(TypeAtom::True));

        let mut both = TypeSet::new();
        both.insert(TypeAtom::True);
        both.insert(TypeAtom::False);
        collapse_booleans(&mut both);
        assert_eq!(both, single(TypeAtom::Boolean));
    }
}

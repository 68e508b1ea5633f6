//! Usage-constraint masks (spec §4.1.4).
//!
//! A mask composes monotonically via intersection over the 5-element
//! universe `{boolean, function, number, string, table}`. `nil` and
//! `unknown` sit outside that universe and are never filtered out by a
//! mask: a mask only narrows *which primitive/table/function shapes* are
//! plausible, it never asserts a value can't be absent or unresolved.

use crate::types::{TypeAtom, TypeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageMask {
    pub boolean: bool,
    pub function: bool,
    pub number: bool,
    pub string: bool,
    pub table: bool,
}

impl UsageMask {
    pub const FULL: UsageMask = UsageMask { boolean: true, function: true, number: true, string: true, table: true };

    pub fn concatenand() -> Self {
        Self { boolean: false, function: false, number: true, string: true, table: false }
    }

    pub fn indexed_or_length() -> Self {
        Self { boolean: false, function: false, number: false, string: true, table: true }
    }

    pub fn index_assigned() -> Self {
        Self { boolean: false, function: false, number: false, string: false, table: true }
    }

    pub fn arithmetic() -> Self {
        Self { boolean: false, function: false, number: true, string: false, table: false }
    }

    pub fn called() -> Self {
        Self { boolean: false, function: true, number: false, string: false, table: false }
    }

    pub fn is_full(self) -> bool {
        self == Self::FULL
    }

    /// Monotonic composition: two constraints on the same expression both hold.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            boolean: self.boolean && other.boolean,
            function: self.function && other.function,
            number: self.number && other.number,
            string: self.string && other.string,
            table: self.table && other.table,
        }
    }

    fn allows(self, atom: &TypeAtom) -> bool {
        match atom {
            TypeAtom::Nil | TypeAtom::Unknown => true,
            TypeAtom::True | TypeAtom::False | TypeAtom::Boolean => self.boolean,
            TypeAtom::Str => self.string,
            TypeAtom::Num => self.number,
            TypeAtom::Table(_) => self.table,
            TypeAtom::Function(_) => self.function,
        }
    }

    /// Narrow `set` in place per spec §4.2: "if the mask would eliminate all
    /// types, leave the set unchanged"; "no information" (a full mask) is a
    /// no-op regardless of set size.
    pub fn narrow(self, set: &mut TypeSet) {
        if self.is_full() || set.len() <= 1 {
            return;
        }
        let narrowed: TypeSet = set.iter().copied().filter(|a| self.allows(a)).collect();
        if !narrowed.is_empty() {
            *set = narrowed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::single;

    #[test]
    fn full_mask_is_no_information() {
        assert!(UsageMask::FULL.is_full());
        let mut set: TypeSet = [TypeAtom::Str, TypeAtom::Num].into_iter().collect();
        let before = set.clone();
        UsageMask::FULL.narrow(&mut set);
        assert_eq!(set, before);
    }

    #[test]
    fn narrowing_never_empties_the_set() {
        let mut set = single(TypeAtom::Nil);
        // single-element sets are left alone regardless, per spec (len <= 1 short-circuit)
        UsageMask::arithmetic().narrow(&mut set);
        assert_eq!(set, single(TypeAtom::Nil));

        let mut multi: TypeSet = [TypeAtom::Str, TypeAtom::Table(crate::ids::TableId(0))].into_iter().collect();
        let before = multi.clone();
        // arithmetic mask allows neither string nor table -> would empty the set -> unchanged
        UsageMask::arithmetic().narrow(&mut multi);
        assert_eq!(multi, before);
    }

    #[test]
    fn narrowing_is_a_subset_or_equal() {
        let mut set: TypeSet = [TypeAtom::Str, TypeAtom::Num, TypeAtom::Table(crate::ids::TableId(1))].into_iter().collect();
        let before = set.clone();
        UsageMask::concatenand().narrow(&mut set);
        assert!(set.is_subset(&before));
    }
}

//! Cycle-safe type resolution over the interned arenas (spec §4.2).
//!
//! `Resolver::resolve` walks an `Expression` tree to a `TypeSet`, memoizing
//! by `ExpressionInfo::uid` and guarding against self-referential bindings
//! (`local x = x` across a require cycle, a getter that reads its own
//! field) with a `seen` set — a cycle resolves to `unknown` rather than
//! recursing forever, the same least-fixed-point trick the teacher's
//! `semantic::types` pass uses for recursive generic bounds.

use crate::expr::{Expression, ExpressionInfo};
use crate::function_info::FunctionInfo;
use crate::ids::{FunctionId, RefId, RoleId};
use crate::table_info::TableInfo;
use crate::types::{atom_truthiness, collapse_booleans, single, TypeAtom, TypeSet};
use crate::usage::UsageMask;
use std::collections::{HashMap, HashSet};

/// Built-in globals whose return type this resolver knows without a body to
/// walk (spec §4.2 "built-in recognition").
fn builtin_return_type(name: &str) -> Option<TypeSet> {
    match name {
        "tonumber" => Some(single(TypeAtom::Num)),
        "tostring" | "getText" => Some(single(TypeAtom::Str)),
        "getTextOrNull" => {
            let mut set = single(TypeAtom::Str);
            set.insert(TypeAtom::Nil);
            Some(set)
        }
        _ => None,
    }
}

pub struct Resolver<'a> {
    tables: &'a [TableInfo],
    functions: &'a [FunctionInfo],
    usage: &'a HashMap<RefId, UsageMask>,
    global_names: &'a HashMap<RefId, String>,
    /// Every definition recorded against a binding identity (spec §4.1.4/
    /// §4.2 "reference"): a local/global reassigned any number of times
    /// accumulates one entry per assignment here, unioned on resolve.
    definitions: &'a HashMap<RefId, Vec<ExpressionInfo>>,
    cache: HashMap<u64, TypeSet>,
    seen: HashSet<u64>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        tables: &'a [TableInfo],
        functions: &'a [FunctionInfo],
        usage: &'a HashMap<RefId, UsageMask>,
        global_names: &'a HashMap<RefId, String>,
        definitions: &'a HashMap<RefId, Vec<ExpressionInfo>>,
    ) -> Self {
        Self { tables, functions, usage, global_names, definitions, cache: HashMap::new(), seen: HashSet::new() }
    }

    /// Resolve a binding's type set, identified by its usage-registry key
    /// (`RefId`) and the expression(s) feeding it. Callers that already have
    /// an `ExpressionInfo` pass its `uid` so recursive resolutions memoize.
    pub fn resolve(&mut self, uid: u64, expr: &Expression) -> TypeSet {
        if let Some(cached) = self.cache.get(&uid) {
            return cached.clone();
        }
        if !self.seen.insert(uid) {
            return single(TypeAtom::Unknown);
        }
        let mut result = self.resolve_expr(expr);
        collapse_booleans(&mut result);
        if let Some(mask) = self.mask_for(expr) {
            mask.narrow(&mut result);
        }
        self.seen.remove(&uid);
        self.cache.insert(uid, result.clone());
        result
    }

    fn mask_for(&self, expr: &Expression) -> Option<UsageMask> {
        match expr {
            Expression::Reference(rid) => self.usage.get(rid).copied(),
            _ => None,
        }
    }

    fn resolve_expr(&mut self, expr: &Expression) -> TypeSet {
        match expr {
            Expression::Reference(rid) => self.resolve_ref(rid),
            Expression::Require { .. } => single(TypeAtom::Unknown),
            Expression::Literal(lit) => self.resolve_literal(lit),
            Expression::Index { base, .. } => self.resolve_expr(base),
            Expression::Member { base, member, .. } => self.resolve_member(base, member),
            Expression::Operation { operator, arguments } => self.resolve_operation(*operator, arguments),
        }
    }

    /// A `reference` resolves by identity (spec §4.2): a table/function
    /// literal always carries its own interned type, a parameter seeds from
    /// its declared/guessed type, and anything else unions over every
    /// definition recorded against that binding.
    fn resolve_ref(&mut self, rid: &RefId) -> TypeSet {
        match rid {
            RefId::Table(tid) => single(TypeAtom::Table(*tid)),
            RefId::Function(fid) => single(TypeAtom::Function(*fid)),
            RefId::Role(RoleId::Parameter(_)) | RefId::Role(RoleId::SelfParam) => self.resolve_parameter(rid),
            RefId::Role(_) => self.resolve_definitions(rid),
        }
    }

    fn resolve_parameter(&mut self, rid: &RefId) -> TypeSet {
        for f in self.functions.iter() {
            if let Some(idx) = f.parameters.iter().position(|p| p == rid) {
                let seed = &f.parameter_types[idx];
                if !seed.is_empty() {
                    return seed.clone();
                }
                break;
            }
        }
        self.resolve_definitions(rid)
    }

    fn resolve_definitions(&mut self, rid: &RefId) -> TypeSet {
        let Some(infos) = self.definitions.get(rid) else {
            return single(TypeAtom::Unknown);
        };
        let infos = infos.clone();
        let mut out = TypeSet::new();
        for info in &infos {
            out.extend(self.resolve(info.uid, &info.expr));
        }
        if out.is_empty() {
            out.insert(TypeAtom::Unknown);
        }
        out
    }

    fn resolve_literal(&mut self, lit: &crate::expr::Literal) -> TypeSet {
        use crate::ast::LiteralValue;
        if let Some(tid) = lit.table_id {
            return single(TypeAtom::Table(tid));
        }
        if let Some(fid) = lit.function_id {
            return single(TypeAtom::Function(fid));
        }
        match &lit.literal {
            Some(LiteralValue::Bool(true)) => single(TypeAtom::True),
            Some(LiteralValue::Bool(false)) => single(TypeAtom::False),
            Some(LiteralValue::Str(_)) => single(TypeAtom::Str),
            Some(LiteralValue::Num(_)) => single(TypeAtom::Num),
            Some(LiteralValue::Nil) | None => single(TypeAtom::Nil),
        }
    }

    fn resolve_member(&mut self, base: &Expression, member: &str) -> TypeSet {
        let base_types = self.resolve_expr(base);
        let mut out = TypeSet::new();
        for atom in &base_types {
            if let TypeAtom::Table(tid) = atom {
                let table = &self.tables[tid.0 as usize];
                let key = crate::table_info::literal_key(member, None);
                if let Some(infos) = table.definitions.get(&key) {
                    for info in infos {
                        out.extend(self.resolve(info.uid, &info.expr));
                    }
                    continue;
                }
            }
            out.insert(TypeAtom::Unknown);
        }
        if out.is_empty() {
            out.insert(TypeAtom::Unknown);
        }
        out
    }

    fn resolve_operation(&mut self, operator: crate::ast::Operator, arguments: &[Expression]) -> TypeSet {
        use crate::ast::Operator::*;
        match operator {
            And => self.resolve_and(arguments),
            Or => self.resolve_or(arguments),
            Not => single(TypeAtom::Boolean),
            Eq | Ne | Lt | Le | Gt | Ge => single(TypeAtom::Boolean),
            Concat => single(TypeAtom::Str),
            Add | Sub | Mul | Div | Mod | Pow | UnaryMinus | BAnd | BOr | BXor | BNot | Shl | Shr => single(TypeAtom::Num),
            Length => single(TypeAtom::Num),
            Call => self.resolve_call(arguments),
        }
    }

    /// `a and b`: if `a` is a literal known-falsy, the result is exactly
    /// `a`'s type (short circuits); if known-truthy, the result is `b`'s;
    /// otherwise both sides are plausible (spec §4.2 "truthiness folding").
    fn resolve_and(&mut self, arguments: &[Expression]) -> TypeSet {
        let [lhs_expr, rhs_expr] = arguments else { return single(TypeAtom::Unknown) };
        let lhs = self.resolve_expr(lhs_expr);
        if lhs.len() == 1 {
            match atom_truthiness(lhs.iter().next().unwrap()) {
                Some(false) => return lhs,
                Some(true) => return self.resolve_expr(rhs_expr),
                None => {}
            }
        }
        let rhs = self.resolve_expr(rhs_expr);
        let mut out = lhs;
        out.extend(rhs);
        out
    }

    fn resolve_or(&mut self, arguments: &[Expression]) -> TypeSet {
        let [lhs_expr, rhs_expr] = arguments else { return single(TypeAtom::Unknown) };
        let lhs = self.resolve_expr(lhs_expr);
        if lhs.len() == 1 {
            match atom_truthiness(lhs.iter().next().unwrap()) {
                Some(true) => return lhs,
                Some(false) => return self.resolve_expr(rhs_expr),
                None => {}
            }
        }
        let rhs = self.resolve_expr(rhs_expr);
        let mut out = lhs;
        out.extend(rhs);
        out
    }

    fn resolve_call(&mut self, arguments: &[Expression]) -> TypeSet {
        let Some(callee) = arguments.first() else { return single(TypeAtom::Unknown) };
        if let Expression::Member { member, .. } = callee {
            if let Some(builtin) = builtin_return_type(member) {
                return builtin;
            }
        }
        if let Expression::Reference(rid) = callee {
            if let Some(name) = self.global_names.get(rid) {
                if let Some(builtin) = builtin_return_type(name) {
                    return builtin;
                }
            }
        }
        let callee_types = self.resolve_expr(callee);
        let mut out = TypeSet::new();
        for atom in &callee_types {
            if let TypeAtom::Function(fid) = atom {
                out.extend(self.resolve_function_call(*fid));
                continue;
            }
            out.insert(TypeAtom::Unknown);
        }
        if out.is_empty() {
            out.insert(TypeAtom::Unknown);
        }
        out
    }

    /// A call's result is slot 0 of the callee's declared return types (spec
    /// §4.2 "call"). Constructors additionally tag slot 0 with the class
    /// table they build, so a field assigned through the returned instance
    /// attributes back onto that class (spec §4.2 "resolveReturnTypes").
    fn resolve_function_call(&mut self, fid: FunctionId) -> TypeSet {
        let f = &self.functions[fid.0 as usize];
        let mut slot0 = if f.is_synthetic {
            f.return_types.first().cloned().unwrap_or_default()
        } else {
            let mut set = TypeSet::new();
            if let Some(infos) = f.return_expressions.first() {
                for info in infos {
                    set.extend(self.resolve(info.uid, &info.expr));
                }
            }
            if 0 >= f.min_returns {
                set.insert(TypeAtom::Nil);
            }
            set
        };
        if f.is_constructor {
            if let Some(Expression::Reference(RefId::Table(owner_tid))) = f.identifier_expression.as_ref().and_then(|ie| ie.base.as_ref()) {
                slot0.insert(TypeAtom::Table(*owner_tid));
            }
        }
        if slot0.is_empty() {
            slot0.insert(TypeAtom::Unknown);
        }
        slot0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Literal;
    use crate::ast::LiteralValue;

    fn resolver<'a>(
        tables: &'a [TableInfo],
        functions: &'a [FunctionInfo],
        usage: &'a HashMap<RefId, UsageMask>,
        global_names: &'a HashMap<RefId, String>,
        definitions: &'a HashMap<RefId, Vec<ExpressionInfo>>,
    ) -> Resolver<'a> {
        Resolver::new(tables, functions, usage, global_names, definitions)
    }

    #[test]
    fn literal_number_resolves_to_num() {
        let tables = Vec::new();
        let functions = Vec::new();
        let usage = HashMap::new();
        let names = HashMap::new();
        let definitions = HashMap::new();
        let mut r = resolver(&tables, &functions, &usage, &names, &definitions);
        let lit = Literal { lua_type: crate::ast::LuaType::Number, literal: Some(LiteralValue::Num(crate::ast::OrderedFloat(1.0))), table_id: None, function_id: None };
        let set = r.resolve(0, &Expression::Literal(lit));
        assert_eq!(set, single(TypeAtom::Num));
    }

    #[test]
    fn and_short_circuits_on_known_falsy_literal() {
        let tables = Vec::new();
        let functions = Vec::new();
        let usage = HashMap::new();
        let names = HashMap::new();
        let definitions = HashMap::new();
        let mut r = resolver(&tables, &functions, &usage, &names, &definitions);
        let nil = Expression::Literal(Literal { lua_type: crate::ast::LuaType::Nil, literal: Some(LiteralValue::Nil), table_id: None, function_id: None });
        let num = Expression::Literal(Literal { lua_type: crate::ast::LuaType::Number, literal: Some(LiteralValue::Num(crate::ast::OrderedFloat(2.0))), table_id: None, function_id: None });
        let set = r.resolve(1, &Expression::Operation { operator: crate::ast::Operator::And, arguments: vec![nil, num] });
        assert_eq!(set, single(TypeAtom::Nil));
    }

    #[test]
    fn self_referential_uid_resolves_to_unknown_instead_of_looping() {
        let tables = Vec::new();
        let functions = Vec::new();
        let usage = HashMap::new();
        let names = HashMap::new();
        let definitions = HashMap::new();
        let mut r = resolver(&tables, &functions, &usage, &names, &definitions);
        r.seen.insert(7);
        let set = r.resolve(7, &Expression::Literal(Literal { lua_type: crate::ast::LuaType::Nil, literal: Some(LiteralValue::Nil), table_id: None, function_id: None }));
        assert_eq!(set, single(TypeAtom::Unknown));
    }
}

//! The central analysis context (spec §4.1).
//!
//! `AnalysisContext` owns the table/function arenas, the scope chains for
//! every ingested module, and the usage-mask registry keyed by binding
//! identity. Modules are ingested one at a time; `ingest_module` walks the
//! statement tree, interning table/function literals, binding names into
//! scopes, running the class-idiom detectors at the shapes spec §4.4
//! describes them, and emitting partial items. Once every module of interest
//! has been ingested, `finalize`/`into_parts` hands the accumulated arenas to
//! the resolver and finalizer.

use crate::alias::AliasMap;
use crate::analyzed_module::AnalyzedModule;
use crate::ast::{self, Expr, LValue, LiteralValue, LuaType, Operator, Parameter, Statement, TableField};
use crate::config::AnalysisConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::error::AnalysisError;
use crate::expr::{Expression, ExpressionInfo, Literal};
use crate::finalizer::Finalizer;
use crate::function_info::{FunctionInfo, IdentifierExpr};
use crate::heuristics;
use crate::ids::{FunctionId, IdGen, RefId, RoleId, TableId};
use crate::patterns;
use crate::resolved_module::ResolvedModule;
use crate::scope::{PartialItem, ScopeArena, ScopeId, ScopeKind};
use crate::table_info::{literal_key, LiteralFieldEntry, TableInfo};
use crate::types::TypeSet;
use crate::usage::UsageMask;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::{BTreeMap, HashMap};

/// Everything the resolver and finalizer need, handed over by
/// `AnalysisContext::into_parts` once every module of interest is ingested.
pub struct AnalysisContextParts {
    pub resolved: IndexMap<String, ResolvedModule>,
    pub tables: Vec<TableInfo>,
    pub functions: Vec<FunctionInfo>,
    pub usage: HashMap<RefId, UsageMask>,
    pub global_names: HashMap<RefId, String>,
    pub definitions: HashMap<RefId, Vec<ExpressionInfo>>,
    pub diagnostics: DiagnosticCollection,
}

struct ModuleState {
    scope: ScopeId,
    /// Expressions returned at module top level (`return a, b`), distinct
    /// from a function's own return slots.
    returns: Vec<ExpressionInfo>,
}

pub struct AnalysisContext {
    pub config: AnalysisConfig,
    tables: Vec<TableInfo>,
    functions: Vec<FunctionInfo>,
    scopes: ScopeArena,
    modules: IndexMap<String, ModuleState>,
    aliases: AliasMap,
    diagnostics: DiagnosticCollection,
    role_ids: IdGen,
    expr_uids: u64,
    /// Usage constraints accumulated per binding identity (spec §4.1.4):
    /// every appearance of the same `RefId` narrows the same entry.
    usage: HashMap<RefId, UsageMask>,
    /// Original source name of every free-global `RefId` this context
    /// minted, so the resolver can still recognize a bare `tostring(x)`
    /// call even though the `RefId` itself carries no name.
    global_names: HashMap<RefId, String>,
    /// Every definition recorded against a binding identity (spec §4.1.4/
    /// §4.2 "reference"): a local/global reassigned any number of times
    /// accumulates one entry per assignment here, unioned on resolve.
    definitions: HashMap<RefId, Vec<ExpressionInfo>>,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            tables: Vec::new(),
            functions: Vec::new(),
            scopes: ScopeArena::default(),
            modules: IndexMap::new(),
            aliases: AliasMap::default(),
            diagnostics: DiagnosticCollection::default(),
            role_ids: IdGen::default(),
            expr_uids: 0,
            usage: HashMap::new(),
            global_names: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    /// Ingest one module's chunk. Returns `DuplicateModuleId` if `module_id`
    /// was already ingested into this context (spec.md §7) — callers that
    /// need idempotent re-ingestion should construct a fresh context.
    pub fn ingest_module(&mut self, module_id: &str, chunk: &ast::Chunk) -> Result<(), AnalysisError> {
        if self.modules.contains_key(module_id) {
            return Err(AnalysisError::DuplicateModuleId(module_id.to_string()));
        }
        debug!(target: "lua_semantic::context", "ingesting module `{module_id}`");
        self.aliases.register(module_id);
        let scope = self.scopes.push(ScopeKind::Module, None);
        self.modules.insert(module_id.to_string(), ModuleState { scope, returns: Vec::new() });
        self.walk_statements(module_id, scope, &chunk.statements);

        let (mut classes, mut functions) = (0usize, 0usize);
        for item in &self.scopes.get(scope).items {
            match item {
                PartialItem::Class { .. } => classes += 1,
                PartialItem::Function { .. } => functions += 1,
                _ => {}
            }
        }
        debug!(
            target: "lua_semantic::context",
            "finished ingesting module `{module_id}`: {classes} class item(s), {functions} function item(s)"
        );
        Ok(())
    }

    /// §4.7 ambient extension: register a function this context never
    /// discovered by walking an AST (a rosetta-sourced builtin stub, say),
    /// so the finalizer can still describe it.
    pub fn register_synthetic_function(
        &mut self,
        module_id: &str,
        parameter_names: Vec<String>,
        return_types: Vec<TypeSet>,
    ) -> FunctionId {
        let id = self.intern_function(module_id);
        let mut info = FunctionInfo::new(id, module_id);
        info.is_synthetic = true;
        for name in parameter_names {
            info.parameters.push(RefId::Role(RoleId::Parameter(self.role_ids.next())));
            info.parameter_names.push(name);
            info.parameter_types.push(TypeSet::new());
        }
        info.return_types = return_types;
        info.min_returns = info.return_types.len();
        self.functions[id.0 as usize] = info;
        id
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Hand the accumulated arenas over to the resolver/finalizer. Consumes
    /// the context — nothing ingests into it again after this point.
    pub fn into_parts(self) -> AnalysisContextParts {
        let mut resolved = IndexMap::new();
        let AnalysisContext { modules, scopes, tables, functions, usage, global_names, definitions, mut diagnostics, .. } = self;
        for (id, state) in modules {
            let module = Self::resolve_items(&id, &scopes, state, &tables, &functions, &mut diagnostics);
            resolved.insert(id, module);
        }
        AnalysisContextParts { resolved, tables, functions, usage, global_names, definitions, diagnostics }
    }

    /// Run the whole ingest -> resolve -> finalize pipeline to completion
    /// (spec §4.5): every ingested module lands in a name-sorted map, and
    /// every diagnostic collected across every module comes back as one flat,
    /// stably-ordered list.
    pub fn finalize(self) -> (BTreeMap<String, AnalyzedModule>, Vec<Diagnostic>) {
        let module_count = self.modules.len();
        debug!(target: "lua_semantic::context", "finalizing {module_count} ingested module(s)");
        let parts = self.into_parts();
        let modules = Finalizer::finalize(parts);
        let mut diagnostics = DiagnosticCollection::default();
        let mut out = BTreeMap::new();
        let mut class_count = 0;
        let mut function_count = 0;
        for (id, module) in modules {
            class_count += module.classes.len();
            function_count += module.functions.len();
            diagnostics.extend(DiagnosticCollection { diagnostics: module.diagnostics.clone() });
            out.insert(id, module);
        }
        diagnostics.sort_stable();
        debug!(
            target: "lua_semantic::context",
            "finalize complete: {module_count} module(s), {class_count} class(es), {function_count} function(s)"
        );
        (out, diagnostics.diagnostics)
    }

    // --- interning --------------------------------------------------------

    fn intern_table(&mut self, module_id: &str) -> TableId {
        let id = TableId(self.tables.len() as u32);
        self.tables.push(TableInfo::new(id, module_id));
        id
    }

    fn intern_function(&mut self, module_id: &str) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(FunctionInfo::new(id, module_id));
        id
    }

    fn next_uid(&mut self) -> u64 {
        let v = self.expr_uids;
        self.expr_uids += 1;
        v
    }

    fn wrap_info(&mut self, module_id: &str, expr: Expression, from_literal: bool, function_level: bool) -> ExpressionInfo {
        ExpressionInfo {
            uid: self.next_uid(),
            expr,
            index: None,
            instance: false,
            from_literal,
            function_level,
            defining_module: module_id.to_string(),
            usage: UsageMask::FULL,
        }
    }

    fn root_scope(&self, mut scope: ScopeId) -> ScopeId {
        loop {
            match self.scopes.get(scope).parent {
                Some(p) => scope = p,
                None => return scope,
            }
        }
    }

    /// Resolve `name` against the scope chain, or treat it as a free global
    /// and bind it once into the module's root scope so later appearances
    /// of the same name resolve to the same `RefId` (spec §4.1.4 needs a
    /// stable identity to accumulate usage against).
    fn resolve_or_bind_global(&mut self, scope: ScopeId, name: &str) -> RefId {
        if let Some(id) = self.scopes.resolve(scope, name) {
            return id;
        }
        let root = self.root_scope(scope);
        let id = RefId::Role(RoleId::Generated(self.role_ids.next()));
        self.scopes.get_mut(root).bind(name, id.clone());
        self.global_names.insert(id.clone(), name.to_string());
        id
    }

    fn record_usage(&mut self, expr: &Expression, mask: UsageMask) {
        if let Expression::Reference(rid) = expr {
            self.usage
                .entry(rid.clone())
                .and_modify(|m| *m = m.intersect(mask))
                .or_insert(mask);
        }
    }

    fn record_definition(&mut self, rid: RefId, info: ExpressionInfo) {
        self.definitions.entry(rid).or_default().push(info);
    }

    // --- lowering -----------------------------------------------------------

    fn lower_expr(&mut self, module_id: &str, scope: ScopeId, expr: &Expr) -> Expression {
        match expr {
            Expr::Reference { name } => Expression::Reference(self.resolve_or_bind_global(scope, name)),
            Expr::Require { module } => {
                let resolved = self.aliases.resolve(module).map(str::to_string).unwrap_or_else(|| module.clone());
                Expression::Require { module: resolved }
            }
            Expr::Literal { lua_type, literal, table, function } => {
                let table_id = table.as_ref().map(|t| self.intern_table_literal(module_id, scope, t));
                let function_id = function.as_ref().map(|f| self.intern_function_literal(module_id, scope, f, None));
                Expression::Literal(Literal { lua_type: *lua_type, literal: literal.clone(), table_id, function_id })
            }
            Expr::Index { base, index } => {
                let base = self.lower_expr(module_id, scope, base);
                let index = self.lower_expr(module_id, scope, index);
                self.record_usage(&base, UsageMask::indexed_or_length());
                Expression::Index { base: Box::new(base), index: Box::new(index) }
            }
            Expr::Member { base, member, indexer } => {
                let base = self.lower_expr(module_id, scope, base);
                self.record_usage(&base, UsageMask::indexed_or_length());
                Expression::Member { base: Box::new(base), member: member.clone(), indexer: *indexer }
            }
            Expr::Operation { operator, arguments } => {
                let lowered: Vec<Expression> = arguments.iter().map(|a| self.lower_expr(module_id, scope, a)).collect();
                self.apply_operator_usage(*operator, &lowered);
                Expression::Operation { operator: *operator, arguments: lowered }
            }
        }
    }

    fn apply_operator_usage(&mut self, operator: Operator, arguments: &[Expression]) {
        use Operator::*;
        match operator {
            Concat => {
                for a in arguments {
                    self.record_usage(a, UsageMask::concatenand());
                }
            }
            Add | Sub | Mul | Div | Mod | Pow | UnaryMinus | BAnd | BOr | BXor | BNot | Shl | Shr => {
                for a in arguments {
                    self.record_usage(a, UsageMask::arithmetic());
                }
            }
            Length => {
                for a in arguments {
                    self.record_usage(a, UsageMask::indexed_or_length());
                }
            }
            Call => {
                if let Some(callee) = arguments.first() {
                    self.record_usage(callee, UsageMask::called());
                }
            }
            Eq | Ne | Lt | Le | Gt | Ge | And | Or | Not => {}
        }
    }

    fn intern_table_literal(&mut self, module_id: &str, scope: ScopeId, ctor: &ast::TableConstructor) -> TableId {
        let id = self.intern_table(module_id);
        let mut next_index: u32 = 1;
        for field in &ctor.fields {
            let (key_str, value_expr) = match field {
                TableField::Keyed { key, value } => (self.literal_key_of(key), value),
                TableField::Positional(value) => {
                    let key = next_index.to_string();
                    next_index += 1;
                    (key, value)
                }
            };
            let lowered = self.lower_expr(module_id, scope, value_expr);
            let info = self.wrap_info(module_id, lowered, matches!(value_expr, Expr::Literal { .. }), false);
            self.tables[id.0 as usize].literal_fields.push(LiteralFieldEntry {
                key: key_str.clone(),
                value: info.clone(),
                static_types: None,
            });
            self.tables[id.0 as usize].push_definition(key_str, info);
        }
        id
    }

    fn literal_key_of(&self, key: &Expr) -> String {
        match key {
            Expr::Reference { name } => literal_key(name, None),
            Expr::Literal { lua_type, literal: Some(LiteralValue::Str(s)), .. } => literal_key(s, Some(*lua_type)),
            Expr::Literal { lua_type, literal: Some(LiteralValue::Num(n)), .. } => {
                literal_key(&format_num(n.0), Some(*lua_type))
            }
            _ => "?".to_string(),
        }
    }

    fn intern_function_literal(
        &mut self,
        module_id: &str,
        parent_scope: ScopeId,
        body: &ast::FunctionBody,
        identifier: Option<IdentifierExpr>,
    ) -> FunctionId {
        let id = self.intern_function(module_id);
        let mut info = FunctionInfo::new(id, module_id);
        info.is_method = body.is_method;
        info.identifier_expression = identifier;
        let func_scope = self.scopes.push(ScopeKind::Function(id), Some(parent_scope));

        if body.is_method {
            let self_id = RefId::Role(RoleId::SelfParam);
            self.scopes.get_mut(func_scope).bind("self", self_id.clone());
            info.parameters.push(self_id);
            info.parameter_names.push("self".to_string());
            info.parameter_types.push(TypeSet::new());
        }
        for parameter in &body.parameters {
            match parameter {
                Parameter::Identifier(name) => {
                    let pid = RefId::Role(RoleId::Parameter(self.role_ids.next()));
                    self.scopes.get_mut(func_scope).bind(name, pid.clone());
                    info.parameters.push(pid);
                    info.parameter_names.push(name.clone());
                    let guess = if self.config.enable_name_heuristics { heuristics::infer_from_name(name) } else { TypeSet::new() };
                    info.parameter_types.push(guess);
                }
                Parameter::Varargs => {
                    let pid = RefId::Role(RoleId::Parameter(self.role_ids.next()));
                    self.scopes.get_mut(func_scope).bind("...", pid.clone());
                    info.parameters.push(pid);
                    info.parameter_names.push("...".to_string());
                    info.parameter_types.push(TypeSet::new());
                }
            }
        }

        self.functions[id.0 as usize] = info;
        self.walk_statements(module_id, func_scope, &body.statements);
        self.functions[id.0 as usize].apply_min_returns_nil();

        if self.config.enable_closure_class_detection {
            if let Some(closure) = patterns::detect_closure_class(body) {
                if let Some(RefId::Table(tid)) = self.scopes.resolve(func_scope, &closure.binding_name) {
                    self.tables[tid.0 as usize].is_closure_class = true;
                    self.functions[id.0 as usize].is_constructor = true;
                    trace!(target: "lua_semantic::context", "closure class detected for table {tid} via {}", closure.binding_name);
                }
            }
        }
        id
    }

    // --- statement walking ----------------------------------------------

    fn walk_statements(&mut self, module_id: &str, scope: ScopeId, statements: &[Statement]) {
        for stmt in statements {
            self.walk_statement(module_id, scope, stmt);
        }
    }

    fn walk_statement(&mut self, module_id: &str, scope: ScopeId, stmt: &Statement) {
        match stmt {
            Statement::Local(local) => {
                let infos: Vec<ExpressionInfo> = local
                    .values
                    .iter()
                    .map(|v| {
                        let lowered = self.lower_expr(module_id, scope, v);
                        self.wrap_info(module_id, lowered, matches!(v, Expr::Literal { .. }), false)
                    })
                    .collect();
                for (i, name) in local.names.iter().enumerate() {
                    let default_id = RefId::Role(RoleId::Local(self.role_ids.next()));
                    self.scopes.get_mut(scope).bind(name, default_id.clone());
                    if let (Some(value_expr), Some(info)) = (local.values.get(i), infos.get(i)) {
                        self.note_binding(module_id, scope, name, value_expr, info);
                    }
                }
            }
            Statement::Assignment(assignment) => self.walk_assignment(module_id, scope, assignment),
            Statement::FunctionDeclaration(decl) => self.walk_function_declaration(module_id, scope, decl),
            Statement::Call(expr) => {
                if self.config.enable_setmetatable_detection {
                    if let Some((target, meta)) = patterns::detect_setmetatable_call(expr) {
                        self.apply_setmetatable(module_id, scope, &target, &meta);
                        return;
                    }
                }
                self.lower_expr(module_id, scope, expr);
            }
            Statement::Return(ret) => self.walk_return(module_id, scope, ret),
        }
    }

    /// `setmetatable(x, meta)` (spec §4.1.2): when `x` is a plain table and
    /// `meta` resolves to a class table (or an `{__index = Y}` shape naming
    /// one), copy every field `x` has accumulated so far onto `Y` as instance
    /// fields and rebind `x` to a fresh `@instance` role pointing at `Y`.
    fn apply_setmetatable(&mut self, module_id: &str, scope: ScopeId, target: &str, meta: &Expr) {
        let Some(RefId::Table(x_tid)) = self.scopes.resolve(scope, target) else { return };
        if self.tables[x_tid.0 as usize].is_class() {
            return;
        }
        let Some((y_tid, y_name)) = self.resolve_metatable_target(scope, meta) else { return };
        if y_tid == x_tid {
            return;
        }

        let copied: Vec<(String, Vec<ExpressionInfo>)> =
            self.tables[x_tid.0 as usize].definitions.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (key, infos) in copied {
            for mut info in infos {
                info.instance = true;
                self.tables[y_tid.0 as usize].push_definition(key.clone(), info);
            }
        }

        {
            let y = &mut self.tables[y_tid.0 as usize];
            if y.class_name.is_none() {
                y.class_name = Some(y_name);
            }
            y.is_local_class = true;
        }
        self.tables[x_tid.0 as usize].consumed_by_instance = true;

        let instance_id = RefId::Role(RoleId::Instance(self.role_ids.next()));
        let meta_info = self.wrap_info(module_id, Expression::Reference(RefId::Table(y_tid)), false, false);
        self.record_definition(instance_id.clone(), meta_info);
        self.scopes.get_mut(scope).bind(target, instance_id);
    }

    fn resolve_metatable_target(&self, scope: ScopeId, meta: &Expr) -> Option<(TableId, String)> {
        match meta {
            Expr::Reference { name } => match self.scopes.resolve(scope, name) {
                Some(RefId::Table(tid)) => Some((tid, name.clone())),
                _ => None,
            },
            Expr::Literal { table: Some(ctor), .. } => ctor.fields.iter().find_map(|field| {
                let TableField::Keyed { key, value } = field else { return None };
                let Expr::Reference { name: key_name } = key else { return None };
                if key_name != "__index" {
                    return None;
                }
                let Expr::Reference { name } = value else { return None };
                match self.scopes.resolve(scope, name) {
                    Some(RefId::Table(tid)) => Some((tid, name.clone())),
                    _ => None,
                }
            }),
            _ => None,
        }
    }

    fn base_table_for_field_write(&self, base: &Expression) -> Option<(TableId, bool)> {
        match base {
            Expression::Reference(RefId::Table(tid)) => Some((*tid, false)),
            Expression::Reference(rid @ RefId::Role(RoleId::Instance(_))) => {
                let infos = self.definitions.get(rid)?;
                table_id_of(&infos.first()?.expr).map(|tid| (tid, true))
            }
            Expression::Member { base, member, .. } => {
                let (parent_tid, parent_is_instance) = self.base_table_for_field_write(base)?;
                let key = literal_key(member, Some(LuaType::String));
                let infos = self.tables[parent_tid.0 as usize].definitions.get(&key)?;
                let [info] = infos.as_slice() else { return None };
                table_id_of(&info.expr).map(|tid| (tid, parent_is_instance || info.instance))
            }
            _ => None,
        }
    }

    /// Register a field assignment onto a table, running the same
    /// derive-call/framework-UI detectors and nested-class synthesis that
    /// `note_binding` runs for a plain `x = v` (spec §4.1.1/§4.4, "Field
    /// assignment (addField)").
    fn note_field_assignment(
        &mut self,
        module_id: &str,
        scope: ScopeId,
        container_tid: TableId,
        field_name: &str,
        is_instance: bool,
        value_expr: &Expr,
        info: &ExpressionInfo,
        key: String,
    ) {
        if self.config.enable_derive_detection {
            if let Some(derive) = patterns::detect_derive_call(value_expr) {
                let tid = self.intern_table(module_id);
                {
                    let table = &mut self.tables[tid.0 as usize];
                    table.class_name = Some(field_name.to_string());
                    table.base_class = Some(derive.base_name);
                    table.derive_name = Some(derive.derive_name);
                    table.container_id = Some(container_tid);
                }
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: field_name.to_string(), table_id: tid });
                let synth = self.wrap_info(module_id, Expression::Reference(RefId::Table(tid)), false, false);
                self.tables[container_tid.0 as usize].push_definition(key, synth);
                return;
            }
        }
        if self.config.enable_framework_ui_detection {
            if let Some(ctor) = patterns::detect_ui_base_call(value_expr) {
                let tid = self.absorb_ui_table(module_id, scope, field_name, ctor, true);
                self.tables[tid.0 as usize].container_id = Some(container_tid);
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: field_name.to_string(), table_id: tid });
                let synth = self.wrap_info(module_id, Expression::Reference(RefId::Table(tid)), false, false);
                self.tables[container_tid.0 as usize].push_definition(key, synth);
                return;
            }
            let is_tagged = |parent: &str| match self.scopes.resolve(scope, parent) {
                Some(RefId::Table(tid)) => self.tables[tid.0 as usize].is_atom_ui,
                _ => false,
            };
            if let Some(ctor) = patterns::detect_ui_child_call(value_expr, is_tagged) {
                let ctor = ctor.clone();
                let tid = self.absorb_ui_table(module_id, scope, field_name, &ctor, false);
                self.tables[tid.0 as usize].container_id = Some(container_tid);
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: field_name.to_string(), table_id: tid });
                let synth = self.wrap_info(module_id, Expression::Reference(RefId::Table(tid)), false, false);
                self.tables[container_tid.0 as usize].push_definition(key, synth);
                return;
            }
        }

        if let Expression::Literal(Literal { function_id: Some(_), .. }) = &info.expr {
            let (needs_promotion, dotted) = {
                let c = &self.tables[container_tid.0 as usize];
                let needs = c.container_id.is_some() && !c.is_class() && c.class_name.is_none();
                (needs, c.original_name.clone().unwrap_or_else(|| field_name.to_string()))
            };
            if needs_promotion {
                self.tables[container_tid.0 as usize].class_name = Some(dotted.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: dotted, table_id: container_tid });
            }
        }

        if let Expression::Literal(Literal { table_id: Some(tid), .. }) = &info.expr {
            let dotted = match &self.tables[container_tid.0 as usize].class_name {
                Some(base) => format!("{base}.{field_name}"),
                None => field_name.to_string(),
            };
            self.tables[tid.0 as usize].container_id = Some(container_tid);
            self.tables[tid.0 as usize].original_name = Some(dotted);
        }

        if self.tables[container_tid.0 as usize].class_name.is_some() {
            self.scopes.get_mut(scope).items.push(PartialItem::SeenClass { table_id: container_tid });
        }
        let mut field_info = info.clone();
        field_info.instance = is_instance;
        self.tables[container_tid.0 as usize].push_definition(key, field_info);
    }

    fn walk_assignment(&mut self, module_id: &str, scope: ScopeId, assignment: &ast::Assignment) {
        let lowered_value = self.lower_expr(module_id, scope, &assignment.value);
        let info = self.wrap_info(
            module_id,
            lowered_value,
            matches!(assignment.value, Expr::Literal { .. }),
            false,
        );
        match &assignment.target {
            LValue::Reference { name, is_local } => {
                if *is_local || self.scopes.resolve(scope, name).is_none() {
                    let id = RefId::Role(RoleId::Local(self.role_ids.next()));
                    self.scopes.get_mut(scope).bind(name, id);
                }
                self.note_binding(module_id, scope, name, &assignment.value, &info);
            }
            LValue::Member { base, member, indexer: _ } => {
                let lowered_base = self.lower_expr(module_id, scope, base);
                self.record_usage(&lowered_base, UsageMask::index_assigned());
                if member == "__index" {
                    return;
                }
                if let Some((tid, is_instance)) = self.base_table_for_field_write(&lowered_base) {
                    let key = literal_key(member, Some(LuaType::String));
                    self.note_field_assignment(module_id, scope, tid, member, is_instance, &assignment.value, &info, key);
                }
            }
            LValue::Index { base, index } => {
                let lowered_base = self.lower_expr(module_id, scope, base);
                self.record_usage(&lowered_base, UsageMask::index_assigned());
                let key = self.literal_key_of(index);
                if let Some((tid, is_instance)) = self.base_table_for_field_write(&lowered_base) {
                    if let Expression::Literal(Literal { table_id: Some(child_tid), .. }) = &info.expr {
                        self.tables[child_tid.0 as usize].container_id = Some(tid);
                    }
                    let mut field_info = info.clone();
                    field_info.instance = is_instance;
                    if self.tables[tid.0 as usize].class_name.is_some() {
                        self.scopes.get_mut(scope).items.push(PartialItem::SeenClass { table_id: tid });
                    }
                    self.tables[tid.0 as usize].push_definition(key, field_info);
                }
            }
        }
    }

    /// Register the partial item + class-idiom checks that spec §4.1.1 and
    /// §4.4 run whenever a name is bound to a value, covering both `local x
    /// = v` and `x = v` (non-local) assignment.
    fn note_binding(&mut self, module_id: &str, scope: ScopeId, name: &str, value_expr: &Expr, info: &ExpressionInfo) {
        if let Expr::Require { module } = value_expr {
            let resolved = self.aliases.resolve(module).map(str::to_string).unwrap_or_else(|| module.clone());
            self.scopes.get_mut(scope).items.push(PartialItem::Require { name: name.to_string(), module: resolved });
            return;
        }

        if self.config.enable_derive_detection {
            if let Some(derive) = patterns::detect_derive_call(value_expr) {
                let tid = self.intern_table(module_id);
                {
                    let table = &mut self.tables[tid.0 as usize];
                    table.class_name = Some(name.to_string());
                    table.base_class = Some(derive.base_name);
                    table.derive_name = Some(derive.derive_name);
                }
                let rid = RefId::Table(tid);
                self.scopes.get_mut(scope).bind(name, rid.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: name.to_string(), table_id: tid });
                self.record_definition(rid, info.clone());
                return;
            }
        }

        if self.config.enable_framework_ui_detection {
            if let Some(ctor) = patterns::detect_ui_base_call(value_expr) {
                let tid = self.absorb_ui_table(module_id, scope, name, ctor, true);
                let rid = RefId::Table(tid);
                self.scopes.get_mut(scope).bind(name, rid.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: name.to_string(), table_id: tid });
                self.record_definition(rid, info.clone());
                return;
            }
            let is_tagged = |parent: &str| match self.scopes.resolve(scope, parent) {
                Some(RefId::Table(tid)) => self.tables[tid.0 as usize].is_atom_ui,
                _ => false,
            };
            if let Some(ctor) = patterns::detect_ui_child_call(value_expr, is_tagged) {
                let ctor = ctor.clone();
                let tid = self.absorb_ui_table(module_id, scope, name, &ctor, false);
                let rid = RefId::Table(tid);
                self.scopes.get_mut(scope).bind(name, rid.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::Class { name: name.to_string(), table_id: tid });
                self.record_definition(rid, info.clone());
                return;
            }
        }

        match &info.expr {
            // A plain table literal with no class marker is still just a
            // table until setmetatable/derive tags it; `SeenClass` lets
            // resolveItems later tell "never a class" apart from "not yet
            // marked" when it walks the other modules that reference it.
            // Rebind the name straight to the table id (instead of leaving
            // it pointed at the throwaway local role) so later statements —
            // `self.method = fn`, `setmetatable(self, ...)` — see the same
            // identity this literal was interned under.
            Expression::Literal(Literal { table_id: Some(tid), .. }) => {
                let rid = RefId::Table(*tid);
                self.scopes.get_mut(scope).bind(name, rid.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::SeenClass { table_id: *tid });
                self.record_definition(rid, info.clone());
            }
            Expression::Literal(Literal { function_id: Some(fid), .. }) => {
                let rid = RefId::Function(*fid);
                self.scopes.get_mut(scope).bind(name, rid.clone());
                self.scopes.get_mut(scope).items.push(PartialItem::Function { name: name.to_string(), function_id: *fid });
                self.record_definition(rid, info.clone());
            }
            _ => {
                if let Some(rid) = self.scopes.resolve(scope, name) {
                    self.record_definition(rid, info.clone());
                }
            }
        }
    }

    fn absorb_ui_table(&mut self, module_id: &str, scope: ScopeId, name: &str, ctor: &ast::TableConstructor, is_base: bool) -> TableId {
        let tid = self.intern_table_literal(module_id, scope, ctor);
        let table = &mut self.tables[tid.0 as usize];
        table.class_name = Some(name.to_string());
        table.is_atom_ui = true;
        table.is_atom_ui_base = is_base;
        table.literal_fields.retain(|f| f.key != literal_key("_ATOM_UI_CLASS", Some(LuaType::String)));
        tid
    }

    fn walk_function_declaration(&mut self, module_id: &str, scope: ScopeId, decl: &ast::FunctionDeclaration) {
        match &decl.identifier {
            LValue::Reference { name, is_local } => {
                let identifier = IdentifierExpr { base: None, name: name.clone(), indexer: None };
                let fid = self.intern_function_literal(module_id, scope, &decl.body, Some(identifier));
                if *is_local || self.scopes.resolve(scope, name).is_none() {
                    self.scopes.get_mut(scope).bind(name, RefId::Function(fid));
                }
                self.scopes.get_mut(scope).items.push(PartialItem::Function { name: name.clone(), function_id: fid });
            }
            LValue::Member { base, member, indexer } => {
                let lowered_base = self.lower_expr(module_id, scope, base);
                let identifier = IdentifierExpr { base: Some(lowered_base.clone()), name: member.clone(), indexer: Some(*indexer) };
                let fid = self.intern_function_literal(module_id, scope, &decl.body, Some(identifier));
                if member == "new" {
                    self.functions[fid.0 as usize].is_constructor = true;
                }
                if let Expression::Reference(RefId::Table(tid)) = lowered_base {
                    let key = literal_key(member, Some(LuaType::String));
                    let info = self.wrap_info(module_id, Expression::Reference(RefId::Function(fid)), false, false);
                    self.tables[tid.0 as usize].push_definition(key, info);
                }
            }
            LValue::Index { .. } => {
                // `t[expr] = function() ... end` is vanishingly rare and spec.md
                // doesn't name a shape for it; lower for usage side effects only.
                self.lower_expr(module_id, scope, &Expr::Literal {
                    lua_type: LuaType::Function,
                    literal: None,
                    table: None,
                    function: Some(Box::new(decl.body.clone())),
                });
            }
        }
    }

    fn walk_return(&mut self, module_id: &str, scope: ScopeId, ret: &ast::ReturnStatement) {
        if let Some(fid) = self.scopes.is_function_scope(scope) {
            for (i, arg) in ret.arguments.iter().enumerate() {
                let lowered = self.lower_expr(module_id, scope, arg);
                let mut info = self.wrap_info(module_id, lowered, matches!(arg, Expr::Literal { .. }), true);
                info.index = Some(i + 1);
                self.functions[fid.0 as usize].ensure_return_slot(i);
                self.functions[fid.0 as usize].return_expressions[i].push(info);
            }
            let width = ret.arguments.len();
            let f = &mut self.functions[fid.0 as usize];
            f.min_returns = f.min_returns.min(width);
        } else {
            for (i, arg) in ret.arguments.iter().enumerate() {
                let lowered = self.lower_expr(module_id, scope, arg);
                let mut info = self.wrap_info(module_id, lowered, matches!(arg, Expr::Literal { .. }), false);
                info.index = Some(i + 1);
                if let Some(module_scope) = self.module_state_for_scope_mut(scope) {
                    module_scope.returns.push(info);
                }
            }
        }
    }

    fn module_state_for_scope_mut(&mut self, scope: ScopeId) -> Option<&mut ModuleState> {
        let root = self.root_scope(scope);
        self.modules.values_mut().find(|m| m.scope == root)
    }

    // --- resolveItems (spec §4.1.6) --------------------------------------

    fn resolve_items(
        module_id: &str,
        scopes: &ScopeArena,
        state: ModuleState,
        tables: &[TableInfo],
        _functions: &[FunctionInfo],
        diagnostics: &mut DiagnosticCollection,
    ) -> ResolvedModule {
        let mut resolved = ResolvedModule::new(module_id);
        let mut seen_names: HashMap<String, ()> = HashMap::new();
        for item in &scopes.get(state.scope).items {
            match item {
                PartialItem::Class { name, table_id } => {
                    if seen_names.insert(name.clone(), ()).is_some() {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticCode::NameCollision,
                            format!("`{name}` rebinds an earlier class/function in module `{module_id}`"),
                        ));
                    }
                    let table = &tables[table_id.0 as usize];
                    resolved.classes.push(crate::resolved_module::ClassRef {
                        name: name.clone(),
                        table_id: *table_id,
                        base: table.base_class.clone(),
                        derive_name: table.derive_name.clone(),
                        generated: false,
                        defining_module: module_id.to_string(),
                    });
                }
                PartialItem::SeenClass { table_id } => {
                    resolved.seen_classes.insert(*table_id);
                }
                PartialItem::Require { name, module } => resolved.requires.push((name.clone(), module.clone())),
                PartialItem::Function { name, function_id } => resolved.functions.push((name.clone(), *function_id)),
                PartialItem::Field { table_id, key } => resolved.fields.push((*table_id, key.clone())),
            }
        }
        resolved.returns = state.returns;
        resolved
    }
}

fn table_id_of(expr: &Expression) -> Option<TableId> {
    match expr {
        Expression::Reference(RefId::Table(tid)) => Some(*tid),
        Expression::Literal(Literal { table_id: Some(tid), .. }) => Some(*tid),
        _ => None,
    }
}

fn format_num(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn chunk_with(statements: Vec<Statement>) -> Chunk {
        Chunk { statements }
    }

    #[test]
    fn duplicate_module_id_is_rejected() {
        let mut ctx = AnalysisContext::new(AnalysisConfig::default());
        let chunk = chunk_with(vec![]);
        ctx.ingest_module("m", &chunk).unwrap();
        let err = ctx.ingest_module("m", &chunk).unwrap_err();
        assert_eq!(err, AnalysisError::DuplicateModuleId("m".to_string()));
    }

    #[test]
    fn local_table_literal_is_interned_and_tracked() {
        let mut ctx = AnalysisContext::new(AnalysisConfig::default());
        let chunk = chunk_with(vec![Statement::Local(LocalStatement {
            names: vec!["T".into()],
            values: vec![Expr::Literal {
                lua_type: LuaType::Table,
                literal: None,
                table: Some(Box::new(TableConstructor {
                    fields: vec![TableField::Keyed {
                        key: Expr::Reference { name: "foo".into() },
                        value: Expr::Literal { lua_type: LuaType::Number, literal: Some(LiteralValue::Num(OrderedFloat(1.0))), table: None, function: None },
                    }],
                })),
                function: None,
            }],
        })]);
        ctx.ingest_module("m", &chunk).unwrap();
        let parts = ctx.into_parts();
        assert_eq!(parts.tables.len(), 1);
        assert_eq!(parts.tables[0].literal_fields[0].key, "\"foo\"");
        assert!(parts.resolved.contains_key("m"));
    }

    #[test]
    fn setmetatable_copies_fields_onto_the_metatable_and_promotes_the_instance() {
        let mut ctx = AnalysisContext::new(AnalysisConfig::default());
        let chunk = chunk_with(vec![
            Statement::Local(LocalStatement {
                names: vec!["Base".into()],
                values: vec![Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(TableConstructor { fields: vec![] })), function: None }],
            }),
            Statement::Local(LocalStatement {
                names: vec!["inst".into()],
                values: vec![Expr::Literal { lua_type: LuaType::Table, literal: None, table: Some(Box::new(TableConstructor { fields: vec![] })), function: None }],
            }),
            Statement::Assignment(Assignment {
                target: LValue::Member { base: Expr::Reference { name: "inst".into() }, member: "a".into(), indexer: Indexer::Dot },
                value: Expr::Literal { lua_type: LuaType::Number, literal: Some(LiteralValue::Num(OrderedFloat(1.0))), table: None, function: None },
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
                            fields: vec![TableField::Keyed { key: Expr::Reference { name: "__index".into() }, value: Expr::Reference { name: "Base".into() } }],
                        })),
                        function: None,
                    },
                ],
            }),
        ]);
        ctx.ingest_module("m", &chunk).unwrap();
        let parts = ctx.into_parts();
        let base_table = parts.tables.iter().find(|t| t.class_name.as_deref() == Some("Base")).expect("Base promoted to a class");
        assert!(base_table.is_local_class);
        assert!(base_table.definitions.get("\"a\"").is_some(), "inst's field should be copied onto Base");
    }
}

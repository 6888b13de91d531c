use std::collections::HashMap;

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::NameExpr,
        statements::{ClassDecl, LoopControl, LoopIndex, VariableDecl},
        types::{BuiltinType, TypeKind},
    },
    parser::parser::Program,
    Position,
};

use super::{
    diagnostics::{DiagnosticKind, Diagnostics},
    resolver::{contain, Resolver},
    scope::{DefaultValue, Definition, Scope, ScopeHeader, ScopeId, ScopeKind},
    type_cache::{TypeCache, TypeError, TypeId},
};

/// A name brought in from another module. Linking is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord<'ast> {
    pub name: &'ast str,
    pub path: String,
    pub position: &'ast Position,
}

/// The checked form of one program: its scope tree, the types it uses and
/// everything that was reported about it.
#[derive(Debug)]
pub struct Module<'ast> {
    pub scopes: Vec<Scope<'ast>>,
    /// Scope ids by nesting depth
    pub levels: Vec<Vec<ScopeId>>,
    /// Comprehension scopes by the comprehension's id
    pub comprehensions: HashMap<usize, ScopeId>,
    pub types: TypeCache,
    pub diagnostics: Diagnostics,
    pub imports: Vec<ImportRecord<'ast>>,
    pub exports: Vec<&'ast NameExpr>,
    memo: HashMap<(ScopeId, &'ast str), TypeId>,
}

impl<'ast> Module<'ast> {
    pub const ROOT: ScopeId = ScopeId(0);

    fn new(program: &'ast Program) -> Self {
        let root = Scope::new(
            Module::ROOT,
            ScopeKind::Module,
            0,
            None,
            ScopeHeader::None,
            &program.body,
        );

        Module {
            scopes: vec![root],
            levels: vec![vec![Module::ROOT]],
            comprehensions: HashMap::new(),
            types: TypeCache::new(),
            diagnostics: Diagnostics::new(),
            imports: vec![],
            exports: vec![],
            memo: HashMap::new(),
        }
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'ast> {
        &self.scopes[id.0]
    }

    fn resolver(&mut self) -> Resolver<'_, 'ast> {
        Resolver::new(
            &self.scopes,
            &self.comprehensions,
            &mut self.types,
            &mut self.diagnostics,
            &mut self.memo,
        )
    }

    /// Resolves a name as if it was used at `position` inside `scope`.
    pub fn resolve_name(
        &mut self,
        scope: ScopeId,
        name: &str,
        position: &Position,
    ) -> Result<Option<TypeId>, TypeError> {
        contain(self.resolver().resolve_name(scope, name, position))
    }

    /// Resolves an expression as if it appeared inside `scope`.
    pub fn resolve_expression(
        &mut self,
        scope: ScopeId,
        expr: &Expr,
    ) -> Result<Option<TypeId>, TypeError> {
        self.resolver().resolve_expression(scope, expr)
    }

    fn attach(
        &mut self,
        parent: ScopeId,
        kind: ScopeKind,
        header: ScopeHeader<'ast>,
        body: &'ast [Stmt],
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let level = self.scopes[parent.0].level + 1;

        let mut scope = Scope::new(id, kind, level, Some(parent), header, body);
        scope.link_to(&self.scopes[parent.0]);

        self.scopes[parent.0].children.push(id);
        self.scopes.push(scope);

        if self.levels.len() <= level {
            self.levels.push(vec![]);
        }
        self.levels[level].push(id);

        id
    }

    fn define(&mut self, scope: ScopeId, definition: Definition<'ast>) {
        if let Err(existing) = self.scopes[scope.0].defines.insert(definition) {
            let original = existing.position();
            self.diagnostics.error(
                DiagnosticKind::Redefinition {
                    name: definition.name().to_string(),
                    mode: existing.mode(),
                    line: original.line,
                    col: original.col,
                },
                definition.position(),
            );
        }
    }

    /// Builds the scope tree one nesting level at a time.
    fn construct(&mut self) {
        let mut level = 0;
        while level < self.levels.len() {
            let ids = self.levels[level].clone();
            tracing::debug!(level, scopes = ids.len(), "constructing scope level");

            for id in ids {
                self.construct_scope(id);
            }
            level += 1;
        }

        for export in self.exports.clone() {
            if self.scopes[Module::ROOT.0].defines.get(&export.name).is_none() {
                self.diagnostics.error(
                    DiagnosticKind::UndefinedExport {
                        name: export.name.clone(),
                    },
                    &export.position,
                );
            }
        }
    }

    fn construct_scope(&mut self, id: ScopeId) {
        let (header, body) = {
            let scope = &self.scopes[id.0];
            tracing::trace!(scope = id.0, kind = ?scope.kind, level = scope.level, "constructing scope");
            (scope.header, scope.body)
        };

        match header {
            ScopeHeader::None => {}
            ScopeHeader::Function(decl) => {
                for param in &decl.params {
                    self.define(id, Definition::Parameter(param));
                    if let Some(default) = &param.default {
                        self.scopes[id.0].defaults.push(DefaultValue::Parameter(param));
                        self.collect_comprehensions(id, default);
                    }
                }
            }
            ScopeHeader::Class(decl) => self.construct_class(id, decl),
            ScopeHeader::For(header) => self.define_indexes(id, &header.indexes),
            ScopeHeader::Comprehension(comprehension) => {
                self.define_indexes(id, &comprehension.header.indexes);
                for expr in Expr::comprehension_body(comprehension) {
                    self.collect_comprehensions(id, expr);
                }
            }
        }

        self.construct_statements(id, body);
    }

    fn define_indexes(&mut self, id: ScopeId, indexes: &'ast [LoopIndex]) {
        for index in indexes {
            if let LoopIndex::Declared(decl) = index {
                self.define(id, Definition::Variable(decl));
            }
        }
    }

    fn construct_class(&mut self, id: ScopeId, decl: &'ast ClassDecl) {
        for member in &decl.members {
            self.construct_variable(id, &member.decl);
        }

        for method in &decl.methods {
            self.define(id, Definition::Function(&method.decl));
            let body = method.decl.body.as_deref().unwrap_or(&[]);
            self.attach(id, ScopeKind::Function, ScopeHeader::Function(&method.decl), body);
        }

        for special in [&decl.constructor, &decl.destructor].into_iter().flatten() {
            let body = special.body.as_deref().unwrap_or(&[]);
            self.attach(id, ScopeKind::Function, ScopeHeader::Function(special), body);
        }
    }

    fn construct_variable(&mut self, id: ScopeId, decl: &'ast VariableDecl) {
        if let (Some(Expr::HashDeclaration(hash)), true) = (&decl.value, is_bare_hash(decl)) {
            self.define(id, Definition::HashType(decl));
            for field in &hash.fields {
                if let Some(value) = &field.value {
                    self.scopes[id.0].defaults.push(DefaultValue::Variable(field));
                    self.collect_comprehensions(id, value);
                }
            }
            return;
        }

        self.define(id, Definition::Variable(decl));
        if let Some(value) = &decl.value {
            self.scopes[id.0].defaults.push(DefaultValue::Variable(decl));
            self.collect_comprehensions(id, value);
        }
    }

    /// Defers the statements of one body into `id`, opening child scopes for
    /// nested bodies. Nothing after a `return` is constructed.
    fn construct_statements(&mut self, id: ScopeId, body: &'ast [Stmt]) {
        let mut returned = false;

        for stmt in body {
            if returned {
                self.diagnostics.error(
                    DiagnosticKind::DeadCode {
                        next: stmt.kind_name(),
                    },
                    stmt.position(),
                );
                break;
            }

            match stmt {
                Stmt::Expression(stmt) => {
                    self.scopes[id.0].expressions.push(&stmt.expression);
                    self.collect_comprehensions(id, &stmt.expression);
                }
                Stmt::Variable(decl) => self.construct_variable(id, decl),
                Stmt::Function(decl) => {
                    self.define(id, Definition::Function(decl));
                    let body = decl.body.as_deref().unwrap_or(&[]);
                    self.attach(id, ScopeKind::Function, ScopeHeader::Function(decl), body);
                }
                Stmt::Class(decl) => {
                    let class = self.attach(id, ScopeKind::Class, ScopeHeader::Class(decl), &[]);
                    self.define(id, Definition::Class { decl, scope: class });
                }
                Stmt::If(stmt) => {
                    for branch in &stmt.branches {
                        self.scopes[id.0].conditions.push(&branch.condition);
                        self.collect_comprehensions(id, &branch.condition);
                        self.attach(id, ScopeKind::Block, ScopeHeader::None, &branch.body);
                    }
                    if let Some(body) = &stmt.else_body {
                        self.attach(id, ScopeKind::Block, ScopeHeader::None, body);
                    }
                }
                Stmt::While(stmt) => {
                    self.scopes[id.0].conditions.push(&stmt.condition);
                    self.collect_comprehensions(id, &stmt.condition);
                    self.attach(id, ScopeKind::Loop, ScopeHeader::None, &stmt.body);
                }
                Stmt::For(stmt) => {
                    self.collect_comprehensions(id, &stmt.header.iterator);
                    self.attach(id, ScopeKind::Loop, ScopeHeader::For(&stmt.header), &stmt.body);
                }
                Stmt::Return(ret) => {
                    let return_scope = self.scopes[id.0].return_scope;
                    match return_scope {
                        Some(function) => self.scopes[function.0].returns.push((id, ret)),
                        None => self
                            .diagnostics
                            .error(DiagnosticKind::ReturnOutsideFunction, &ret.position),
                    }
                    if let Some(value) = &ret.value {
                        self.collect_comprehensions(id, value);
                    }
                    returned = true;
                }
                Stmt::LoopControl(control) => {
                    if self.scopes[id.0].break_scope.is_none() {
                        let keyword = match control.kind {
                            LoopControl::Break => "break",
                            LoopControl::Continue => "continue",
                        };
                        self.diagnostics.error(
                            DiagnosticKind::LoopControlOutsideLoop { keyword },
                            &control.position,
                        );
                    }
                }
                Stmt::Import(stmt) => {
                    for import in &stmt.names {
                        self.define(id, Definition::Import(import));
                        let path = match &stmt.from {
                            Some(from) => format!("{}.{}", from, import.path),
                            None => import.path.to_string(),
                        };
                        self.imports.push(ImportRecord {
                            name: import.bound_name(),
                            path,
                            position: &import.position,
                        });
                    }
                }
                Stmt::Export(stmt) => self.exports.extend(stmt.names.iter()),
                Stmt::Block(stmt) => {
                    self.attach(id, ScopeKind::Block, ScopeHeader::None, &stmt.body);
                }
            }
        }
    }

    /// Opens a scope for every comprehension evaluated in `id`.
    fn collect_comprehensions(&mut self, id: ScopeId, expr: &'ast Expr) {
        if let Expr::Comprehension(comprehension) = expr {
            let scope = self.attach(
                id,
                ScopeKind::Comprehension,
                ScopeHeader::Comprehension(comprehension),
                &[],
            );
            self.comprehensions.insert(comprehension.id, scope);
        }

        for child in expr.children() {
            self.collect_comprehensions(id, child);
        }
    }

    /// Comprehension scopes are checked when their expression is resolved.
    fn validate(&mut self) -> Result<(), TypeError> {
        let mut resolver = Resolver::new(
            &self.scopes,
            &self.comprehensions,
            &mut self.types,
            &mut self.diagnostics,
            &mut self.memo,
        );

        for level in &self.levels {
            for id in level {
                if self.scopes[id.0].kind != ScopeKind::Comprehension {
                    resolver.validate_scope(*id)?;
                }
            }
        }

        Ok(())
    }
}

/// `hash Name = {...}` declares a type rather than a variable.
fn is_bare_hash(decl: &VariableDecl) -> bool {
    matches!(
        &decl.ty.kind,
        TypeKind::Builtin { builtin: BuiltinType::Hash, sub } if sub.is_empty()
    )
}

/// Builds the scope tree of a parsed program and checks it.
///
/// Problems with the program end up in [`Module::diagnostics`]; `Err` means
/// the checker itself hit an inconsistency.
pub fn type_check(program: &Program) -> Result<Module<'_>, TypeError> {
    let mut module = Module::new(program);

    module.construct();
    tracing::debug!(
        scopes = module.scopes.len(),
        levels = module.levels.len(),
        "constructed scope tree"
    );

    module.validate()?;
    tracing::debug!(
        types = module.types.len(),
        diagnostics = module.diagnostics.len(),
        "validated module"
    );

    Ok(module)
}

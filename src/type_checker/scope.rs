//! Lexical scopes and the obligations deferred into them.

use std::collections::HashMap;

use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::ComprehensionExpr,
        statements::{
            ClassDecl, ForHeader, FunctionDecl, ImportName, Parameter, ReturnStmt, VariableDecl,
        },
    },
    Position,
};

/// Index of a scope inside its module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Block,
    Function,
    Class,
    Loop,
    Comprehension,
}

/// The syntax a scope was opened for.
#[derive(Debug, Clone, Copy)]
pub enum ScopeHeader<'ast> {
    None,
    Function(&'ast FunctionDecl),
    Class(&'ast ClassDecl),
    For(&'ast ForHeader),
    Comprehension(&'ast ComprehensionExpr),
}

#[derive(Debug, Clone, Copy)]
pub enum Definition<'ast> {
    Variable(&'ast VariableDecl),
    Parameter(&'ast Parameter),
    Function(&'ast FunctionDecl),
    Class {
        decl: &'ast ClassDecl,
        scope: ScopeId,
    },
    /// `hash Name = {Type field, ...}`
    HashType(&'ast VariableDecl),
    Import(&'ast ImportName),
}

impl<'ast> Definition<'ast> {
    pub fn name(&self) -> &'ast str {
        match *self {
            Definition::Variable(decl) | Definition::HashType(decl) => &decl.name,
            Definition::Parameter(param) => &param.name,
            Definition::Function(decl) => &decl.name,
            Definition::Class { decl, .. } => &decl.name,
            Definition::Import(import) => import.bound_name(),
        }
    }

    pub fn position(&self) -> &'ast Position {
        match *self {
            Definition::Variable(decl) | Definition::HashType(decl) => &decl.position,
            Definition::Parameter(param) => &param.position,
            Definition::Function(decl) => &decl.position,
            Definition::Class { decl, .. } => &decl.position,
            Definition::Import(import) => &import.position,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Definition::Import(_) => "imported",
            _ => "defined",
        }
    }
}

/// Names declared directly in one scope. A name is unique across all
/// partitions and lookups search them in a fixed order.
#[derive(Debug, Default)]
pub struct Defines<'ast> {
    pub functions: HashMap<&'ast str, Definition<'ast>>,
    pub imports: HashMap<&'ast str, Definition<'ast>>,
    pub names: HashMap<&'ast str, Definition<'ast>>,
    pub types: HashMap<&'ast str, Definition<'ast>>,
}

impl<'ast> Defines<'ast> {
    pub fn get(&self, name: &str) -> Option<Definition<'ast>> {
        [&self.functions, &self.imports, &self.names, &self.types]
            .into_iter()
            .find_map(|partition| partition.get(name).copied())
    }

    /// Returns the existing definition if the name is already taken.
    pub fn insert(&mut self, definition: Definition<'ast>) -> Result<(), Definition<'ast>> {
        let name = definition.name();
        if let Some(existing) = self.get(name) {
            return Err(existing);
        }

        let partition = match definition {
            Definition::Function(_) => &mut self.functions,
            Definition::Import(_) => &mut self.imports,
            Definition::Variable(_) | Definition::Parameter(_) => &mut self.names,
            Definition::Class { .. } | Definition::HashType(_) => &mut self.types,
        };
        partition.insert(name, definition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.imports.len() + self.names.len() + self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A declared value whose initializer must match the declared type.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue<'ast> {
    Variable(&'ast VariableDecl),
    Parameter(&'ast Parameter),
}

#[derive(Debug)]
pub struct Scope<'ast> {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub level: usize,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,

    /// Nearest function scope, including this one
    pub return_scope: Option<ScopeId>,
    /// Nearest loop scope inside the same function
    pub break_scope: Option<ScopeId>,
    /// Nearest class scope, including this one
    pub member_scope: Option<ScopeId>,

    pub header: ScopeHeader<'ast>,
    pub body: &'ast [Stmt],
    pub defines: Defines<'ast>,

    pub defaults: Vec<DefaultValue<'ast>>,
    pub expressions: Vec<&'ast Expr>,
    pub conditions: Vec<&'ast Expr>,
    /// Returns of a function scope, with the scope each one appears in
    pub returns: Vec<(ScopeId, &'ast ReturnStmt)>,
}

impl<'ast> Scope<'ast> {
    pub fn new(
        id: ScopeId,
        kind: ScopeKind,
        level: usize,
        parent: Option<ScopeId>,
        header: ScopeHeader<'ast>,
        body: &'ast [Stmt],
    ) -> Self {
        Scope {
            id,
            kind,
            level,
            parent,
            children: vec![],
            return_scope: None,
            break_scope: None,
            member_scope: None,
            header,
            body,
            defines: Defines::default(),
            defaults: vec![],
            expressions: vec![],
            conditions: vec![],
            returns: vec![],
        }
    }

    /// Back-links a new child to the nearest enclosing function, loop and
    /// class scopes.
    pub fn link_to(&mut self, parent: &Scope<'ast>) {
        self.return_scope = match self.kind {
            ScopeKind::Function => Some(self.id),
            ScopeKind::Class => None,
            _ => parent.return_scope,
        };

        self.break_scope = match self.kind {
            ScopeKind::Loop => Some(self.id),
            ScopeKind::Function | ScopeKind::Class => None,
            _ => parent.break_scope,
        };

        self.member_scope = match self.kind {
            ScopeKind::Class => Some(self.id),
            _ => parent.member_scope,
        };
    }
}

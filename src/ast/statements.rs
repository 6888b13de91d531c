use std::fmt::Display;

use crate::Position;

use super::{
    ast::{Expr, Stmt},
    expressions::NameExpr,
    types::TypeDescriptor,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub position: Position,
}

/// `Type name [= value]`. Constness lives on the type.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub ty: TypeDescriptor,
    pub value: Option<Expr>,
    pub position: Position,
}

impl VariableDecl {
    pub fn is_const(&self) -> bool {
        self.ty.is_const
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: Option<Expr>,
    pub is_variadic: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: TypeDescriptor,
    pub params: Vec<Parameter>,
    /// Number of leading parameters without a default value
    pub required_params: usize,
    /// `None` for abstract methods
    pub body: Option<Vec<Stmt>>,
    pub position: Position,
}

impl FunctionDecl {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|param| param.is_variadic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_const: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember<T> {
    pub decl: T,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub base: Option<NameExpr>,
    pub members: Vec<ClassMember<VariableDecl>>,
    pub methods: Vec<ClassMember<FunctionDecl>>,
    pub constructor: Option<FunctionDecl>,
    pub destructor: Option<FunctionDecl>,
    pub position: Position,
}

impl ClassDecl {
    pub fn member(&self, name: &str) -> Option<&ClassMember<VariableDecl>> {
        self.members.iter().find(|member| member.decl.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&ClassMember<FunctionDecl>> {
        self.methods.iter().find(|method| method.decl.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub position: Position,
}

/// `if` followed by any number of `elif` branches and an optional `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub branches: Vec<ConditionalBranch>,
    pub else_body: Option<Vec<Stmt>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopIndex {
    /// `for int i in ...` declares a fresh name
    Declared(VariableDecl),
    /// `for i in ...` reuses a name from an enclosing scope
    Name(NameExpr),
}

impl LoopIndex {
    pub fn name(&self) -> &str {
        match self {
            LoopIndex::Declared(decl) => &decl.name,
            LoopIndex::Name(name) => &name.name,
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            LoopIndex::Declared(decl) => &decl.position,
            LoopIndex::Name(name) => &name.position,
        }
    }
}

/// The `indexes in iterator` part shared by loops and comprehensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ForHeader {
    pub indexes: Vec<LoopIndex>,
    pub iterator: Box<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub header: ForHeader,
    pub body: Vec<Stmt>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopControlStmt {
    pub kind: LoopControl,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModulePath {
    pub segments: Vec<String>,
    pub position: Position,
}

impl Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportName {
    pub path: ModulePath,
    pub alias: Option<NameExpr>,
    pub position: Position,
}

impl ImportName {
    /// The name this import introduces into the importing scope.
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => &alias.name,
            None => self
                .path
                .segments
                .first()
                .map(String::as_str)
                .unwrap_or_default(),
        }
    }
}

/// `import a.b as c, d` or `from a.b import c as d, e`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub from: Option<ModulePath>,
    pub names: Vec<ImportName>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportStmt {
    pub names: Vec<NameExpr>,
    pub position: Position,
}

/// `scope:` or a bare indented block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub position: Position,
}

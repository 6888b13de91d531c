use crate::Position;

use super::{
    expressions::{
        AssignmentExpr, BinaryExpr, CallExpr, CastExpr, ComprehensionExpr, HashDeclarationExpr,
        HashValueExpr, IndexExpr, IsExpr, ListExpr, LiteralExpr, MapExpr, MemberExpr, NameExpr,
        RangeExpr, SelfMemberExpr, TernaryExpr, UnaryExpr,
    },
    statements::{
        BlockStmt, ClassDecl, ExportStmt, ExpressionStmt, ForStmt, FunctionDecl, IfStmt,
        ImportStmt, LoopControlStmt, LoopIndex, ReturnStmt, VariableDecl, WhileStmt,
    },
};

/// Coarse shape of a node, used by grammar checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Literal,
    Name,
    Unary,
    Binary,
    Ternary,
    Declaration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Name(NameExpr),
    SelfMember(SelfMemberExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Is(IsExpr),
    Ternary(TernaryExpr),
    Assignment(AssignmentExpr),
    Call(CallExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    Range(RangeExpr),
    List(ListExpr),
    Map(MapExpr),
    HashValue(HashValueExpr),
    HashDeclaration(HashDeclarationExpr),
    Comprehension(ComprehensionExpr),
    Cast(CastExpr),
}

impl Expr {
    pub fn position(&self) -> &Position {
        match self {
            Expr::Literal(expr) => &expr.position,
            Expr::Name(expr) => &expr.position,
            Expr::SelfMember(expr) => &expr.position,
            Expr::Unary(expr) => &expr.position,
            Expr::Binary(expr) => &expr.position,
            Expr::Is(expr) => &expr.position,
            Expr::Ternary(expr) => &expr.position,
            Expr::Assignment(expr) => &expr.position,
            Expr::Call(expr) => &expr.position,
            Expr::Member(expr) => &expr.position,
            Expr::Index(expr) => &expr.position,
            Expr::Range(expr) => &expr.position,
            Expr::List(expr) => &expr.position,
            Expr::Map(expr) => &expr.position,
            Expr::HashValue(expr) => &expr.position,
            Expr::HashDeclaration(expr) => &expr.position,
            Expr::Comprehension(expr) => &expr.position,
            Expr::Cast(expr) => &expr.position,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Expr::Literal(_)
            | Expr::List(_)
            | Expr::Map(_)
            | Expr::HashValue(_)
            | Expr::Comprehension(_) => Arity::Literal,
            Expr::HashDeclaration(_) => Arity::Declaration,
            Expr::Name(_) | Expr::SelfMember(_) => Arity::Name,
            Expr::Unary(_) | Expr::Cast(_) => Arity::Unary,
            Expr::Binary(_)
            | Expr::Is(_)
            | Expr::Assignment(_)
            | Expr::Call(_)
            | Expr::Member(_)
            | Expr::Index(_)
            | Expr::Range(_) => Arity::Binary,
            Expr::Ternary(_) => Arity::Ternary,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "LITERAL",
            Expr::Name(_) => "NAME",
            Expr::SelfMember(_) => "MEMBER",
            Expr::Unary(_) => "UNARY",
            Expr::Binary(_) => "BINARY",
            Expr::Is(_) => "IS",
            Expr::Ternary(_) => "HOOK",
            Expr::Assignment(_) => "ASSIGN",
            Expr::Call(_) => "CALL",
            Expr::Member(_) => "DOT",
            Expr::Index(_) => "INDEX",
            Expr::Range(_) => "RANGE",
            Expr::List(_) => "LIST",
            Expr::Map(_) => "MAP",
            Expr::HashValue(_) => "HASH_VAL",
            Expr::HashDeclaration(_) => "HASH_DEC",
            Expr::Comprehension(_) => "COMPREHENSION",
            Expr::Cast(_) => "CAST",
        }
    }

    /// Direct sub-expressions evaluated in the same scope as this node.
    ///
    /// A comprehension only contributes its iterator, everything else in it
    /// belongs to the comprehension's own scope.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Name(_) | Expr::SelfMember(_) => vec![],
            Expr::Unary(expr) => vec![expr.operand.as_ref()],
            Expr::Binary(expr) => vec![expr.left.as_ref(), expr.right.as_ref()],
            Expr::Is(expr) => vec![expr.value.as_ref()],
            Expr::Ternary(expr) => vec![
                expr.condition.as_ref(),
                expr.then_branch.as_ref(),
                expr.else_branch.as_ref(),
            ],
            Expr::Assignment(expr) => vec![expr.target.as_ref(), expr.value.as_ref()],
            Expr::Call(expr) => {
                let mut children = vec![expr.callee.as_ref()];
                children.extend(expr.arguments.iter());
                children
            }
            Expr::Member(expr) => vec![expr.object.as_ref()],
            Expr::Index(expr) => vec![expr.target.as_ref(), expr.index.as_ref()],
            Expr::Range(expr) => {
                let mut children = vec![expr.target.as_ref()];
                children.extend(expr.slots.iter().flatten());
                children
            }
            Expr::List(expr) => expr.items.iter().collect(),
            Expr::Map(expr) => expr
                .entries
                .iter()
                .flat_map(|(key, value)| [key, value])
                .collect(),
            Expr::HashValue(expr) => expr.fields.iter().map(|field| &field.value).collect(),
            Expr::HashDeclaration(expr) => expr
                .fields
                .iter()
                .filter_map(|field| field.value.as_ref())
                .collect(),
            Expr::Comprehension(expr) => vec![expr.header.iterator.as_ref()],
            Expr::Cast(expr) => vec![expr.value.as_ref()],
        }
    }

    /// Sub-expressions owned by a comprehension's own scope.
    pub fn comprehension_body(comprehension: &ComprehensionExpr) -> Vec<&Expr> {
        let mut body: Vec<&Expr> = comprehension.returns.iter().collect();
        body.extend(comprehension.condition.as_deref());
        body.extend(comprehension.else_returns.iter());
        body.extend(comprehension.header.indexes.iter().filter_map(|index| match index {
            LoopIndex::Declared(decl) => decl.value.as_ref(),
            LoopIndex::Name(_) => None,
        }));
        body
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(ExpressionStmt),
    Variable(VariableDecl),
    Function(FunctionDecl),
    Class(ClassDecl),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    LoopControl(LoopControlStmt),
    Import(ImportStmt),
    Export(ExportStmt),
    Block(BlockStmt),
}

impl Stmt {
    pub fn position(&self) -> &Position {
        match self {
            Stmt::Expression(stmt) => &stmt.position,
            Stmt::Variable(stmt) => &stmt.position,
            Stmt::Function(stmt) => &stmt.position,
            Stmt::Class(stmt) => &stmt.position,
            Stmt::If(stmt) => &stmt.position,
            Stmt::While(stmt) => &stmt.position,
            Stmt::For(stmt) => &stmt.position,
            Stmt::Return(stmt) => &stmt.position,
            Stmt::LoopControl(stmt) => &stmt.position,
            Stmt::Import(stmt) => &stmt.position,
            Stmt::Export(stmt) => &stmt.position,
            Stmt::Block(stmt) => &stmt.position,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Expression(_) => "EXPRESSION",
            Stmt::Variable(_) => "VARIABLE",
            Stmt::Function(_) => "FUNCTION",
            Stmt::Class(_) => "CLASS",
            Stmt::If(_) => "IF",
            Stmt::While(_) => "WHILE",
            Stmt::For(_) => "FOR",
            Stmt::Return(_) => "RETURN",
            Stmt::LoopControl(_) => "LOOP_CONTROL",
            Stmt::Import(_) => "IMPORT",
            Stmt::Export(_) => "EXPORT",
            Stmt::Block(_) => "SCOPE",
        }
    }
}

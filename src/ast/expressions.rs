use crate::{lexer::tokens::TokenKind, Position};

use super::{
    ast::Expr,
    statements::{ForHeader, VariableDecl},
    types::TypeDescriptor,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub value: Literal,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameExpr {
    pub name: String,
    pub position: Position,
}

/// `@name`, a member of the enclosing class instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfMemberExpr {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    Increment,
    Decrement,
    Spread,
    New,
    Delete,
}

impl UnaryOp {
    pub fn from_token(kind: TokenKind) -> Option<UnaryOp> {
        match kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            TokenKind::Increment => Some(UnaryOp::Increment),
            TokenKind::Decrement => Some(UnaryOp::Decrement),
            TokenKind::Ellipsis => Some(UnaryOp::Spread),
            TokenKind::New => Some(UnaryOp::New),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
            UnaryOp::Spread => "...",
            UnaryOp::New => "new",
            UnaryOp::Delete => "del",
        }
    }

    pub fn has_side_effect(&self) -> bool {
        matches!(
            self,
            UnaryOp::Increment | UnaryOp::Decrement | UnaryOp::New | UnaryOp::Delete
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Mul,
    Div,
    DivInt,
    Exp,
    Mod,
    Plus,
    Minus,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    In,
    Has,
    Range,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<BinaryOp> {
        match kind {
            TokenKind::Mul => Some(BinaryOp::Mul),
            TokenKind::Div => Some(BinaryOp::Div),
            TokenKind::DivInt => Some(BinaryOp::DivInt),
            TokenKind::Exp => Some(BinaryOp::Exp),
            TokenKind::Mod => Some(BinaryOp::Mod),
            TokenKind::Plus => Some(BinaryOp::Plus),
            TokenKind::Minus => Some(BinaryOp::Minus),
            TokenKind::LeftShift => Some(BinaryOp::LeftShift),
            TokenKind::RightShift => Some(BinaryOp::RightShift),
            TokenKind::UnsignedRightShift => Some(BinaryOp::UnsignedRightShift),
            TokenKind::Less => Some(BinaryOp::Less),
            TokenKind::LessEqual => Some(BinaryOp::LessEqual),
            TokenKind::Greater => Some(BinaryOp::Greater),
            TokenKind::GreaterEqual => Some(BinaryOp::GreaterEqual),
            TokenKind::In => Some(BinaryOp::In),
            TokenKind::Has => Some(BinaryOp::Has),
            TokenKind::Ellipsis => Some(BinaryOp::Range),
            TokenKind::Equal => Some(BinaryOp::Equal),
            TokenKind::NotEqual => Some(BinaryOp::NotEqual),
            TokenKind::BitAnd => Some(BinaryOp::BitAnd),
            TokenKind::BitXor => Some(BinaryOp::BitXor),
            TokenKind::BitOr => Some(BinaryOp::BitOr),
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::DivInt => "//",
            BinaryOp::Exp => "**",
            BinaryOp::Mod => "%",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::Has => "has",
            BinaryOp::Range => "...",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub position: Position,
}

/// `value is Type`
#[derive(Debug, Clone, PartialEq)]
pub struct IsExpr {
    pub value: Box<Expr>,
    pub ty: TypeDescriptor,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpr {
    pub condition: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Box<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub target: Box<Expr>,
    /// Set for compound assignments such as `+=`
    pub operator: Option<BinaryOp>,
    pub value: Box<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
    pub position: Position,
}

/// `target[start:end:step]` with every slot optional.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub target: Box<Expr>,
    pub slots: Vec<Option<Expr>>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListExpr {
    pub items: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapExpr {
    pub entries: Vec<(Expr, Expr)>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashField {
    pub name: String,
    pub value: Expr,
    pub position: Position,
}

/// `{:name = value, ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct HashValueExpr {
    pub fields: Vec<HashField>,
    pub position: Position,
}

/// `{Type name = default, ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct HashDeclarationExpr {
    pub fields: Vec<VariableDecl>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionExpr {
    /// Unique within one parse, used to find the comprehension's scope
    pub id: usize,
    pub returns: Vec<Expr>,
    pub header: ForHeader,
    pub condition: Option<Box<Expr>>,
    pub else_returns: Vec<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub ty: TypeDescriptor,
    pub value: Box<Expr>,
    pub position: Position,
}

use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::{ast::expressions::BinaryOp, Span};

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("class", TokenKind::Class);
        map.insert("extends", TokenKind::Extends);
        map.insert("if", TokenKind::If);
        map.insert("elif", TokenKind::Elif);
        map.insert("else", TokenKind::Else);
        map.insert("for", TokenKind::For);
        map.insert("while", TokenKind::While);
        map.insert("scope", TokenKind::Scope);
        map.insert("ret", TokenKind::Return);
        map.insert("return", TokenKind::Return);
        map.insert("break", TokenKind::Break);
        map.insert("continue", TokenKind::Continue);
        map.insert("true", TokenKind::Boolean);
        map.insert("false", TokenKind::Boolean);
        map.insert("null", TokenKind::Null);
        map.insert("from", TokenKind::From);
        map.insert("import", TokenKind::Import);
        map.insert("as", TokenKind::As);
        map.insert("export", TokenKind::Export);

        map.insert("has", TokenKind::Has);
        map.insert("in", TokenKind::In);
        map.insert("is", TokenKind::Is);
        map.insert("new", TokenKind::New);
        map.insert("del", TokenKind::Delete);

        for name in ["void", "bool", "int", "float", "string", "list", "map", "hash"] {
            map.insert(name, TokenKind::Type);
        }

        for name in ["const", "static", "abstract", "public", "protected", "private"] {
            map.insert(name, TokenKind::Modifier);
        }

        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    BlockStart,
    BlockEnd,
    Eol,
    End,

    Integer,
    Float,
    String,
    Boolean,
    Null,
    Identifier,
    Type,
    Modifier,

    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    LeftParen,
    RightParen,

    Assign,                   // =
    AssignPlus,               // +=
    AssignMinus,              // -=
    AssignMul,                // *=
    AssignDiv,                // /=
    AssignDivInt,             // //=
    AssignMod,                // %=
    AssignExp,                // **=
    AssignBitAnd,             // &=
    AssignBitOr,              // |=
    AssignBitXor,             // ^=
    AssignLeftShift,          // <<=
    AssignRightShift,         // >>=
    AssignUnsignedRightShift, // >>>=

    Equal,    // ==
    NotEqual, // !=
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    Or,
    And,
    Not,

    BitAnd,
    BitOr,
    BitXor,
    BitNot,
    LeftShift,
    RightShift,
    UnsignedRightShift,

    Plus,
    Minus,
    Mul,
    Div,
    DivInt, // //
    Mod,
    Exp, // **
    Increment,
    Decrement,

    Comma,
    Hook, // ?
    Colon,
    Ellipsis,
    Dot,
    At,

    // Reserved
    Class,
    Extends,
    If,
    Elif,
    Else,
    For,
    While,
    Scope,
    Return,
    Break,
    Continue,
    From,
    Import,
    As,
    Export,
    Has,
    In,
    Is,
    New,
    Delete,
}

impl TokenKind {
    /// The binary operator folded into a compound assignment, if any.
    pub fn compound_operator(&self) -> Option<BinaryOp> {
        match self {
            TokenKind::AssignPlus => Some(BinaryOp::Plus),
            TokenKind::AssignMinus => Some(BinaryOp::Minus),
            TokenKind::AssignMul => Some(BinaryOp::Mul),
            TokenKind::AssignDiv => Some(BinaryOp::Div),
            TokenKind::AssignDivInt => Some(BinaryOp::DivInt),
            TokenKind::AssignMod => Some(BinaryOp::Mod),
            TokenKind::AssignExp => Some(BinaryOp::Exp),
            TokenKind::AssignBitAnd => Some(BinaryOp::BitAnd),
            TokenKind::AssignBitOr => Some(BinaryOp::BitOr),
            TokenKind::AssignBitXor => Some(BinaryOp::BitXor),
            TokenKind::AssignLeftShift => Some(BinaryOp::LeftShift),
            TokenKind::AssignRightShift => Some(BinaryOp::RightShift),
            TokenKind::AssignUnsignedRightShift => Some(BinaryOp::UnsignedRightShift),
            _ => None,
        }
    }

    pub fn is_opening_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftCurly
        )
    }

    pub fn is_closing_bracket(&self) -> bool {
        matches!(
            self,
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightCurly
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} `{}`", self.kind, self.value)
        }
    }
}

impl Token {
    pub fn is_one_of_many(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    pub fn debug(&self) {
        if self.is_one_of_many(&[
            TokenKind::String,
            TokenKind::Identifier,
            TokenKind::Integer,
            TokenKind::Float,
            TokenKind::Type,
            TokenKind::Modifier,
        ]) {
            println!("{} ({}) at {}", self.kind, self.value, self.span.start);
        } else {
            println!("{} () at {}", self.kind, self.span.start);
        }
    }
}

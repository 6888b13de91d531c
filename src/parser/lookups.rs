//! The symbol table that drives the Pratt parser.
//!
//! Each token kind maps to a [`SymbolEntry`] holding its left binding power
//! and the handlers used when the token starts an expression (NUD), continues
//! one (LED) or starts a statement. The table is filled once by
//! [`create_token_lookups`] and is read-only afterwards.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    ast::{ast::Expr, ast::Stmt, types::TypeDescriptor},
    errors::errors::Error,
    lexer::tokens::TokenKind,
};

use super::{expr::*, parser::Parser, stmt::*, types::create_token_type_lookups};

/// Numeric precedence. Higher values bind tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BindingPower(pub u8);

impl BindingPower {
    pub const DEFAULT: BindingPower = BindingPower(0);
    pub const ASSIGNMENT: BindingPower = BindingPower(2);
    pub const TERNARY: BindingPower = BindingPower(5);
    pub const LOGICAL: BindingPower = BindingPower(7);
    pub const BIT_OR: BindingPower = BindingPower(8);
    pub const BIT_XOR: BindingPower = BindingPower(9);
    pub const BIT_AND: BindingPower = BindingPower(10);
    pub const EQUALITY: BindingPower = BindingPower(11);
    pub const RELATIONAL: BindingPower = BindingPower(12);
    pub const SHIFT: BindingPower = BindingPower(13);
    pub const ADDITIVE: BindingPower = BindingPower(14);
    pub const MULTIPLICATIVE: BindingPower = BindingPower(15);
    pub const UNARY: BindingPower = BindingPower(18);
    pub const CALL: BindingPower = BindingPower(19);
    pub const MEMBER: BindingPower = BindingPower(20);

    /// The binding power right-associative operators recurse with.
    pub fn lower(self) -> BindingPower {
        BindingPower(self.0.saturating_sub(1))
    }
}

pub type StmtHandler = fn(&mut Parser) -> Result<Stmt, Error>;
pub type StmtGuard = fn(&Parser) -> bool;
pub type NUDHandler = fn(&mut Parser) -> Result<Expr, Error>;
pub type LEDHandler = fn(&mut Parser, Expr, BindingPower) -> Result<Expr, Error>;
pub type TypeNUDHandler = fn(&mut Parser) -> Result<TypeDescriptor, Error>;
pub type TypeLEDHandler = fn(&mut Parser, TypeDescriptor, BindingPower) -> Result<TypeDescriptor, Error>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolEntry {
    pub binding_power: BindingPower,
    pub nud: Option<NUDHandler>,
    pub led: Option<LEDHandler>,
    pub stmt: Option<StmtHandler>,
    /// Decides by lookahead whether `stmt` applies
    pub guard: Option<StmtGuard>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<TokenKind, SymbolEntry>,
    type_nud_lookup: HashMap<TokenKind, TypeNUDHandler>,
    type_led_lookup: HashMap<TokenKind, TypeLEDHandler>,
    type_binding_power_lookup: HashMap<TokenKind, BindingPower>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Registers a kind, raising its binding power if it is already known.
    pub fn register(&mut self, kind: TokenKind, binding_power: BindingPower) -> &mut SymbolEntry {
        let entry = self.symbols.entry(kind).or_default();
        entry.binding_power = entry.binding_power.max(binding_power);
        entry
    }

    /// Registers a prefix operator. Without a handler the operand is parsed
    /// as a unary subtree at [`BindingPower::UNARY`].
    pub fn register_prefix(&mut self, kind: TokenKind, handler: Option<NUDHandler>) {
        self.register(kind, BindingPower::DEFAULT).nud = Some(handler.unwrap_or(parse_prefix_expr));
    }

    pub fn register_infix_left(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        handler: Option<LEDHandler>,
    ) {
        self.register(kind, binding_power).led = Some(handler.unwrap_or(parse_binary_expr));
    }

    /// Like [`SymbolTable::register_infix_left`] but the default handler
    /// recurses one binding power lower, grouping right to left.
    pub fn register_infix_right(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        handler: Option<LEDHandler>,
    ) {
        self.register(kind, binding_power).led =
            Some(handler.unwrap_or(parse_binary_right_expr));
    }

    pub fn register_statement(
        &mut self,
        kind: TokenKind,
        handler: StmtHandler,
        guard: Option<StmtGuard>,
    ) {
        let entry = self.register(kind, BindingPower::DEFAULT);
        entry.stmt = Some(handler);
        entry.guard = guard;
    }

    pub fn register_literal(&mut self, kind: TokenKind) {
        self.register(kind, BindingPower::DEFAULT).nud = Some(parse_literal_expr);
    }

    pub fn register_assignment(&mut self, kind: TokenKind) {
        self.register_infix_right(kind, BindingPower::ASSIGNMENT, Some(parse_assignment_expr));
    }

    pub fn register_type_nud(&mut self, kind: TokenKind, handler: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, handler);
    }

    pub fn register_type_led(
        &mut self,
        kind: TokenKind,
        binding_power: BindingPower,
        handler: TypeLEDHandler,
    ) {
        self.type_binding_power_lookup.insert(kind, binding_power);
        self.type_led_lookup.insert(kind, handler);
    }

    pub fn get(&self, kind: TokenKind) -> Option<&SymbolEntry> {
        self.symbols.get(&kind)
    }

    pub fn binding_power(&self, kind: TokenKind) -> BindingPower {
        self.symbols
            .get(&kind)
            .map(|entry| entry.binding_power)
            .unwrap_or_default()
    }

    pub fn type_nud(&self, kind: TokenKind) -> Option<TypeNUDHandler> {
        self.type_nud_lookup.get(&kind).copied()
    }

    pub fn type_led(&self, kind: TokenKind) -> Option<TypeLEDHandler> {
        self.type_led_lookup.get(&kind).copied()
    }

    pub fn type_binding_power(&self, kind: TokenKind) -> BindingPower {
        self.type_binding_power_lookup
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }
}

lazy_static! {
    pub static ref SYMBOL_TABLE: SymbolTable = {
        let mut table = SymbolTable::new();
        create_token_lookups(&mut table);
        create_token_type_lookups(&mut table);
        table
    };
}

fn is_user_type_declaration(parser: &Parser) -> bool {
    parser.peek_kind() == TokenKind::Identifier
}

pub fn create_token_lookups(table: &mut SymbolTable) {
    // Separators only need to be known with a zero binding power
    for kind in [
        TokenKind::Comma,
        TokenKind::Colon,
        TokenKind::RightParen,
        TokenKind::RightBracket,
        TokenKind::RightCurly,
        TokenKind::Eol,
        TokenKind::BlockEnd,
        TokenKind::End,
        TokenKind::As,
        TokenKind::Extends,
    ] {
        table.register(kind, BindingPower::DEFAULT);
    }

    // Literals and names
    table.register_literal(TokenKind::Integer);
    table.register_literal(TokenKind::Float);
    table.register_literal(TokenKind::String);
    table.register_literal(TokenKind::Boolean);
    table.register_literal(TokenKind::Null);
    table.register_prefix(TokenKind::Identifier, Some(parse_name_expr));
    table.register_prefix(TokenKind::Type, Some(parse_misplaced_type_expr));
    table.register_prefix(TokenKind::At, Some(parse_self_member_expr));

    // Prefix operators
    for kind in [
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Not,
        TokenKind::BitNot,
        TokenKind::Increment,
        TokenKind::Decrement,
        TokenKind::Ellipsis,
        TokenKind::New,
        TokenKind::Delete,
    ] {
        table.register_prefix(kind, None);
    }

    // Grouping, casts and literals
    table.register_prefix(TokenKind::LeftParen, Some(parse_paren_expr));
    table.register_prefix(TokenKind::LeftBracket, Some(parse_list_expr));
    table.register_prefix(TokenKind::LeftCurly, Some(parse_curly_expr));

    // Multiplicative and additive
    for kind in [
        TokenKind::Mul,
        TokenKind::Div,
        TokenKind::DivInt,
        TokenKind::Exp,
        TokenKind::Mod,
    ] {
        table.register_infix_left(kind, BindingPower::MULTIPLICATIVE, None);
    }
    table.register_infix_left(TokenKind::Plus, BindingPower::ADDITIVE, None);
    table.register_infix_left(TokenKind::Minus, BindingPower::ADDITIVE, None);

    // Shifts
    table.register_infix_left(TokenKind::LeftShift, BindingPower::SHIFT, None);
    table.register_infix_left(TokenKind::RightShift, BindingPower::SHIFT, None);
    table.register_infix_left(TokenKind::UnsignedRightShift, BindingPower::SHIFT, None);

    // Relational
    for kind in [
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
        TokenKind::In,
        TokenKind::Has,
        TokenKind::Ellipsis,
    ] {
        table.register_infix_left(kind, BindingPower::RELATIONAL, None);
    }

    // Equality
    table.register_infix_left(TokenKind::Equal, BindingPower::EQUALITY, None);
    table.register_infix_left(TokenKind::NotEqual, BindingPower::EQUALITY, None);
    table.register_infix_left(TokenKind::Is, BindingPower::EQUALITY, Some(parse_is_expr));

    // Bitwise and logical
    table.register_infix_left(TokenKind::BitAnd, BindingPower::BIT_AND, None);
    table.register_infix_left(TokenKind::BitXor, BindingPower::BIT_XOR, None);
    table.register_infix_left(TokenKind::BitOr, BindingPower::BIT_OR, None);
    table.register_infix_right(TokenKind::And, BindingPower::LOGICAL, None);
    table.register_infix_right(TokenKind::Or, BindingPower::LOGICAL, None);

    table.register_infix_left(TokenKind::Hook, BindingPower::TERNARY, Some(parse_ternary_expr));

    // Call, member and index
    table.register_infix_left(TokenKind::LeftParen, BindingPower::CALL, Some(parse_call_expr));
    table.register_infix_left(TokenKind::Dot, BindingPower::MEMBER, Some(parse_member_expr));
    table.register_infix_left(TokenKind::LeftBracket, BindingPower::MEMBER, Some(parse_index_expr));

    // Assignment
    for kind in [
        TokenKind::Assign,
        TokenKind::AssignPlus,
        TokenKind::AssignMinus,
        TokenKind::AssignMul,
        TokenKind::AssignDiv,
        TokenKind::AssignDivInt,
        TokenKind::AssignMod,
        TokenKind::AssignExp,
        TokenKind::AssignBitAnd,
        TokenKind::AssignBitOr,
        TokenKind::AssignBitXor,
        TokenKind::AssignLeftShift,
        TokenKind::AssignRightShift,
        TokenKind::AssignUnsignedRightShift,
    ] {
        table.register_assignment(kind);
    }

    // Statements
    table.register_statement(
        TokenKind::Identifier,
        parse_declaration_stmt,
        Some(is_user_type_declaration),
    );
    table.register_statement(TokenKind::Type, parse_declaration_stmt, None);
    table.register_statement(TokenKind::Modifier, parse_modifier_stmt, None);
    table.register_statement(TokenKind::BlockStart, parse_block_stmt, None);
    table.register_statement(TokenKind::Scope, parse_scope_stmt, None);
    table.register_statement(TokenKind::Return, parse_return_stmt, None);
    table.register_statement(TokenKind::Break, parse_loop_control_stmt, None);
    table.register_statement(TokenKind::Continue, parse_loop_control_stmt, None);
    table.register_statement(TokenKind::If, parse_if_stmt, None);
    table.register_statement(TokenKind::Elif, parse_dangling_branch_stmt, None);
    table.register_statement(TokenKind::Else, parse_dangling_branch_stmt, None);
    table.register_statement(TokenKind::While, parse_while_stmt, None);
    table.register_statement(TokenKind::For, parse_for_stmt, None);
    table.register_statement(TokenKind::Class, parse_class_stmt, None);
    table.register_statement(TokenKind::Import, parse_import_stmt, None);
    table.register_statement(TokenKind::From, parse_import_stmt, None);
    table.register_statement(TokenKind::Export, parse_export_stmt, None);
}

use crate::{
    ast::{
        ast::{Arity, Expr},
        expressions::{
            AssignmentExpr, BinaryExpr, BinaryOp, CallExpr, CastExpr, ComprehensionExpr,
            HashDeclarationExpr, HashField, HashValueExpr, IndexExpr, IsExpr, ListExpr, Literal,
            LiteralExpr, MapExpr, MemberExpr, NameExpr, RangeExpr, SelfMemberExpr, TernaryExpr,
            UnaryExpr, UnaryOp,
        },
        statements::VariableDecl,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position,
};

use super::{
    lookups::BindingPower,
    parser::Parser,
    stmt::{parse_declaration, parse_for_header, Declaration, DeclarationContext},
    types::parse_type,
};

/// Core Pratt loop: run the NUD of the current token, then keep feeding the
/// result to LED handlers while the next token binds tighter than `bp`.
pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    let symbols = parser.symbols();
    let token = parser.current_token();

    let Some(nud) = symbols.get(token.kind).and_then(|entry| entry.nud) else {
        return Err(Error::new(
            ErrorImpl::InvalidExpression {
                token: token.to_string(),
            },
            token.span.start.clone(),
        ));
    };

    let mut left = nud(parser)?;

    loop {
        let kind = parser.current_token_kind();
        let next_bp = symbols.binding_power(kind);
        if next_bp <= bp {
            break;
        }

        let Some(led) = symbols.get(kind).and_then(|entry| entry.led) else {
            return Err(unexpected_token(parser.current_token()));
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

fn unexpected_token(token: &Token) -> Error {
    Error::new(
        ErrorImpl::UnexpectedToken {
            token: token.value.clone(),
        },
        token.span.start.clone(),
    )
}

fn unexpected_token_detailed(token: &Token, message: &str) -> Error {
    Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: token.value.clone(),
            message: message.to_string(),
        },
        token.span.start.clone(),
    )
}

fn parse_integer(token: &Token) -> Result<i64, Error> {
    let parsed = match token
        .value
        .strip_prefix("0x")
        .or_else(|| token.value.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => token.value.parse::<i64>(),
    };

    parsed.map_err(|_| {
        Error::new(
            ErrorImpl::NumberParseError {
                token: token.value.clone(),
            },
            token.span.start.clone(),
        )
    })
}

pub fn parse_literal_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();
    let position = token.span.start.clone();

    let value = match token.kind {
        TokenKind::Integer => Literal::Integer(parse_integer(&token)?),
        TokenKind::Float => token.value.parse::<f64>().map(Literal::Float).map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                position.clone(),
            )
        })?,
        TokenKind::String => Literal::String(token.value),
        TokenKind::Boolean => Literal::Bool(token.value == "true"),
        TokenKind::Null => Literal::Null,
        _ => return Err(unexpected_token(&token)),
    };

    Ok(Expr::Literal(LiteralExpr { value, position }))
}

pub fn parse_name_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();

    Ok(Expr::Name(NameExpr {
        name: token.value,
        position: token.span.start,
    }))
}

/// Builtin type names only start an expression inside a cast or a
/// declaration, both of which are handled before reaching here.
pub fn parse_misplaced_type_expr(parser: &mut Parser) -> Result<Expr, Error> {
    Err(unexpected_token_detailed(
        parser.current_token(),
        "a type cannot be used as a value",
    ))
}

pub fn parse_self_member_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let at = parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;

    Ok(Expr::SelfMember(SelfMemberExpr {
        name: name.value,
        position: at.span.start,
    }))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator = parser.advance();
    let Some(op) = UnaryOp::from_token(operator.kind) else {
        return Err(unexpected_token(&operator));
    };

    let operand = parse_expr(parser, BindingPower::UNARY)?;

    Ok(Expr::Unary(UnaryExpr {
        op,
        operand: Box::new(operand),
        position: operator.span.start,
    }))
}

fn build_binary_expr(
    parser: &mut Parser,
    left: Expr,
    right_bp: BindingPower,
) -> Result<Expr, Error> {
    let operator = parser.advance();
    let Some(op) = BinaryOp::from_token(operator.kind) else {
        return Err(unexpected_token(&operator));
    };

    let right = parse_expr(parser, right_bp)?;

    Ok(Expr::Binary(BinaryExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
        position: operator.span.start,
    }))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    build_binary_expr(parser, left, bp)
}

pub fn parse_binary_right_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Error> {
    build_binary_expr(parser, left, bp.lower())
}

/// `value is Type`
pub fn parse_is_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator = parser.advance();
    let ty = parse_type(parser)?;

    Ok(Expr::Is(IsExpr {
        value: Box::new(left),
        ty,
        position: operator.span.start,
    }))
}

pub fn parse_ternary_expr(
    parser: &mut Parser,
    left: Expr,
    _bp: BindingPower,
) -> Result<Expr, Error> {
    let hook = parser.advance();
    let then_branch = parse_expr(parser, BindingPower::DEFAULT)?;
    parser.expect(TokenKind::Colon)?;
    let else_branch = parse_expr(parser, BindingPower::DEFAULT)?;

    Ok(Expr::Ternary(TernaryExpr {
        condition: Box::new(left),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        position: hook.span.start,
    }))
}

pub fn parse_assignment_expr(
    parser: &mut Parser,
    left: Expr,
    bp: BindingPower,
) -> Result<Expr, Error> {
    let operator = parser.advance();

    // Names and the binary access forms are locations
    let assignable = match left.arity() {
        Arity::Name => true,
        Arity::Binary => matches!(left, Expr::Member(_) | Expr::Index(_) | Expr::Range(_)),
        _ => false,
    };
    if !assignable {
        return Err(Error::new(
            ErrorImpl::BadAssignmentTarget,
            left.position().clone(),
        ));
    }

    let value = parse_expr(parser, bp.lower())?;

    Ok(Expr::Assignment(AssignmentExpr {
        target: Box::new(left),
        operator: operator.kind.compound_operator(),
        value: Box::new(value),
        position: operator.span.start,
    }))
}

pub fn parse_member_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();
    let property = parser.expect(TokenKind::Identifier)?;

    Ok(Expr::Member(MemberExpr {
        object: Box::new(left),
        property: property.value,
        position: property.span.start,
    }))
}

/// Comma separated expressions up to and including `closing`. A trailing
/// comma is allowed.
fn parse_expr_list(parser: &mut Parser, closing: TokenKind) -> Result<Vec<Expr>, Error> {
    let mut items = vec![];

    while parser.current_token_kind() != closing {
        items.push(parse_expr(parser, BindingPower::DEFAULT)?);
        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(closing)?;
    Ok(items)
}

pub fn parse_call_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    parser.advance();

    let callable = matches!(
        left,
        Expr::Name(_)
            | Expr::SelfMember(_)
            | Expr::Member(_)
            | Expr::Index(_)
            | Expr::Call(_)
            | Expr::Cast(_)
            | Expr::Ternary(_)
    );
    if !callable {
        return Err(Error::new(
            ErrorImpl::InvalidCallTarget,
            left.position().clone(),
        ));
    }

    let arguments = parse_expr_list(parser, TokenKind::RightParen)?;
    let position = left.position().clone();

    Ok(Expr::Call(CallExpr {
        callee: Box::new(left),
        arguments,
        position,
    }))
}

/// `target[index]` or a slice `target[start:end:step]`.
pub fn parse_index_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let bracket = parser.advance();
    let position = bracket.span.start;

    if parser.current_token_kind() == TokenKind::RightBracket {
        return Err(unexpected_token_detailed(
            parser.current_token(),
            "expected an index or a range",
        ));
    }

    let mut slots = vec![];
    loop {
        let slot = match parser.current_token_kind() {
            TokenKind::Colon | TokenKind::RightBracket => None,
            _ => Some(parse_expr(parser, BindingPower::DEFAULT)?),
        };
        slots.push(slot);

        if !parser.advance_if(TokenKind::Colon) {
            break;
        }
    }

    parser.expect(TokenKind::RightBracket)?;

    if slots.len() > 3 {
        return Err(Error::new(ErrorImpl::TooManyRangeSlots, position));
    }

    if slots.len() == 1 {
        if let Some(index) = slots.pop().flatten() {
            return Ok(Expr::Index(IndexExpr {
                target: Box::new(left),
                index: Box::new(index),
                position,
            }));
        }
    }

    Ok(Expr::Range(RangeExpr {
        target: Box::new(left),
        slots,
        position,
    }))
}

/// A list literal, or a comprehension once a `for` follows the values.
pub fn parse_list_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let bracket = parser.advance();
    let position = bracket.span.start;

    let mut items = vec![];
    while !matches!(
        parser.current_token_kind(),
        TokenKind::RightBracket | TokenKind::For
    ) {
        items.push(parse_expr(parser, BindingPower::DEFAULT)?);
        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    if parser.current_token_kind() == TokenKind::For {
        return parse_comprehension_expr(parser, items, position);
    }

    parser.expect(TokenKind::RightBracket)?;
    Ok(Expr::List(ListExpr { items, position }))
}

fn parse_comprehension_expr(
    parser: &mut Parser,
    returns: Vec<Expr>,
    position: Position,
) -> Result<Expr, Error> {
    let for_token = parser.advance();
    if returns.is_empty() {
        return Err(unexpected_token_detailed(
            &for_token,
            "a comprehension needs a value before `for`",
        ));
    }

    let header = parse_for_header(parser, true)?;

    let mut condition = None;
    let mut else_returns = vec![];
    if parser.advance_if(TokenKind::If) {
        condition = Some(Box::new(parse_expr(parser, BindingPower::DEFAULT)?));

        if parser.advance_if(TokenKind::Else) {
            loop {
                else_returns.push(parse_expr(parser, BindingPower::DEFAULT)?);
                if !parser.advance_if(TokenKind::Comma) {
                    break;
                }
            }
        }
    } else if parser.current_token_kind() == TokenKind::Else {
        return Err(Error::new(
            ErrorImpl::MissingIf {
                keyword: String::from("else"),
            },
            parser.get_position(),
        ));
    }

    parser.expect(TokenKind::RightBracket)?;

    Ok(Expr::Comprehension(ComprehensionExpr {
        id: parser.advance_id(),
        returns,
        header,
        condition,
        else_returns,
        position,
    }))
}

/// `{}` maps, `{:field = value}` hash values and `{Type field}` hash
/// declarations all start with a curly brace.
pub fn parse_curly_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let curly = parser.advance();
    let position = curly.span.start;

    match parser.current_token_kind() {
        TokenKind::RightCurly => {
            parser.advance();
            Ok(Expr::Map(MapExpr {
                entries: vec![],
                position,
            }))
        }
        TokenKind::Colon => parse_hash_value_expr(parser, position),
        TokenKind::Type | TokenKind::Modifier => parse_hash_declaration_expr(parser, position),
        TokenKind::Identifier if parser.peek_kind() == TokenKind::Identifier => {
            parse_hash_declaration_expr(parser, position)
        }
        _ => parse_map_expr(parser, position),
    }
}

fn parse_hash_value_expr(parser: &mut Parser, position: Position) -> Result<Expr, Error> {
    let mut fields: Vec<HashField> = vec![];

    while parser.current_token_kind() != TokenKind::RightCurly {
        let colon = parser.expect(TokenKind::Colon)?;
        let name = parser.expect(TokenKind::Identifier)?;
        if fields.iter().any(|field| field.name == name.value) {
            return Err(Error::new(
                ErrorImpl::DuplicateField { name: name.value },
                name.span.start,
            ));
        }

        parser.expect(TokenKind::Assign)?;
        let value = parse_expr(parser, BindingPower::DEFAULT)?;

        fields.push(HashField {
            name: name.value,
            value,
            position: colon.span.start,
        });

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::RightCurly)?;
    Ok(Expr::HashValue(HashValueExpr { fields, position }))
}

fn parse_hash_declaration_expr(parser: &mut Parser, position: Position) -> Result<Expr, Error> {
    let mut fields: Vec<VariableDecl> = vec![];

    while parser.current_token_kind() != TokenKind::RightCurly {
        let is_const = match parser.current_token_kind() {
            TokenKind::Modifier => {
                let modifier = parser.advance();
                if modifier.value != "const" {
                    return Err(Error::new(
                        ErrorImpl::InvalidModifier {
                            modifier: modifier.value,
                        },
                        modifier.span.start,
                    ));
                }
                true
            }
            _ => false,
        };

        let mut field = match parse_declaration(parser, DeclarationContext::HashField)? {
            Declaration::Variable(field) => field,
            Declaration::Function(function) => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: function.name,
                        message: String::from("hash fields cannot be functions"),
                    },
                    function.position,
                ))
            }
        };
        field.ty.is_const |= is_const;

        if fields.iter().any(|existing| existing.name == field.name) {
            return Err(Error::new(
                ErrorImpl::DuplicateField { name: field.name },
                field.position,
            ));
        }
        fields.push(field);

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::RightCurly)?;
    Ok(Expr::HashDeclaration(HashDeclarationExpr { fields, position }))
}

fn parse_map_expr(parser: &mut Parser, position: Position) -> Result<Expr, Error> {
    let mut entries = vec![];

    while parser.current_token_kind() != TokenKind::RightCurly {
        let key = parse_expr(parser, BindingPower::DEFAULT)?;
        parser.expect(TokenKind::Colon)?;
        let value = parse_expr(parser, BindingPower::DEFAULT)?;
        entries.push((key, value));

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::RightCurly)?;
    Ok(Expr::Map(MapExpr { entries, position }))
}

/// Grouping, or a cast when the parentheses hold a type. A lone name in
/// parentheses is read as a cast to that user type.
pub fn parse_paren_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let paren = parser.advance();
    let position = paren.span.start;

    let is_cast = match parser.current_token_kind() {
        TokenKind::Type => true,
        TokenKind::Identifier => parser.peek_kind() == TokenKind::RightParen,
        _ => false,
    };

    if is_cast {
        let ty = parse_type(parser)?;
        parser.expect(TokenKind::RightParen)?;
        let value = parse_expr(parser, BindingPower::UNARY)?;

        return Ok(Expr::Cast(CastExpr {
            ty,
            value: Box::new(value),
            position,
        }));
    }

    if parser.current_token_kind() == TokenKind::RightParen {
        return Err(unexpected_token_detailed(
            parser.current_token(),
            "expected an expression inside parentheses",
        ));
    }

    let expr = parse_expr(parser, BindingPower::DEFAULT)?;
    parser.expect(TokenKind::RightParen)?;

    Ok(expr)
}

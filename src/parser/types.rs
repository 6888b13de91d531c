//! Type annotation parsing.
//!
//! Types are parsed with the same NUD/LED scheme as expressions:
//!
//! - Builtin type names and user type names start a type
//! - `[...]` adds sub types to a builtin, e.g. `map[string, int]`
//! - `(...)` turns the type into a function type returning it

use crate::{
    ast::types::{BuiltinType, TypeDescriptor, TypeKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{
    lookups::{BindingPower, SymbolTable},
    parser::Parser,
    stmt::parse_function_params,
};

pub fn create_token_type_lookups(table: &mut SymbolTable) {
    table.register_type_nud(TokenKind::Type, parse_builtin_type);
    table.register_type_nud(TokenKind::Identifier, parse_named_type);
    table.register_type_led(TokenKind::LeftBracket, BindingPower::MEMBER, parse_sub_types);
    table.register_type_led(TokenKind::LeftParen, BindingPower::CALL, parse_function_type);
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeDescriptor, Error> {
    let symbols = parser.symbols();
    let token = parser.current_token();

    let Some(nud) = symbols.type_nud(token.kind) else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.value.clone(),
                message: String::from("expected a type"),
            },
            token.span.start.clone(),
        ));
    };

    let mut left = nud(parser)?;

    loop {
        let kind = parser.current_token_kind();
        let bp = symbols.type_binding_power(kind);
        if bp <= BindingPower::DEFAULT {
            break;
        }

        let Some(led) = symbols.type_led(kind) else {
            break;
        };
        left = led(parser, left, bp)?;
    }

    check_required_sub_type(&left)?;
    Ok(left)
}

/// `list` and `map` cannot be used without their sub types.
fn check_required_sub_type(ty: &TypeDescriptor) -> Result<(), Error> {
    match &ty.kind {
        TypeKind::Builtin { builtin, sub } if builtin.is_container() && sub.is_empty() => {
            Err(Error::new(
                ErrorImpl::MissingSubType {
                    parent: builtin.to_string(),
                },
                ty.position.clone(),
            ))
        }
        _ => Ok(()),
    }
}

pub fn parse_builtin_type(parser: &mut Parser) -> Result<TypeDescriptor, Error> {
    let token = parser.expect(TokenKind::Type)?;

    match BuiltinType::from_name(&token.value) {
        Some(builtin) => Ok(TypeDescriptor::builtin(builtin, token.span.start)),
        None => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            token.span.start,
        )),
    }
}

pub fn parse_named_type(parser: &mut Parser) -> Result<TypeDescriptor, Error> {
    let token = parser.expect(TokenKind::Identifier)?;
    Ok(TypeDescriptor::named(token.value, token.span.start))
}

pub fn parse_sub_types(
    parser: &mut Parser,
    left: TypeDescriptor,
    _bp: BindingPower,
) -> Result<TypeDescriptor, Error> {
    let bracket = parser.advance();

    let builtin = match &left.kind {
        TypeKind::Builtin { builtin, sub } if sub.is_empty() => *builtin,
        _ => {
            return Err(Error::new(
                ErrorImpl::InvalidSubType {
                    parent: left.to_string(),
                    sub: bracket.value,
                },
                bracket.span.start,
            ))
        }
    };

    let mut sub = vec![];
    loop {
        let token = parser.current_token().clone();
        let allowed = match token.kind {
            TokenKind::Identifier => builtin.accepts_named_sub_type(),
            TokenKind::Type => builtin.is_container(),
            _ => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: token.value,
                        message: String::from("expected a sub type"),
                    },
                    token.span.start,
                ))
            }
        };

        if !allowed {
            return Err(Error::new(
                ErrorImpl::InvalidSubType {
                    parent: builtin.to_string(),
                    sub: token.value,
                },
                token.span.start,
            ));
        }

        sub.push(parse_type(parser)?);

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::RightBracket)?;

    let max = if builtin == BuiltinType::Map { 2 } else { 1 };
    if sub.len() > max {
        return Err(Error::new(
            ErrorImpl::SubTypeCount {
                parent: builtin.to_string(),
                count: sub.len(),
            },
            bracket.span.start,
        ));
    }

    Ok(TypeDescriptor {
        kind: TypeKind::Builtin { builtin, sub },
        is_const: left.is_const,
        position: left.position,
    })
}

pub fn parse_function_type(
    parser: &mut Parser,
    left: TypeDescriptor,
    _bp: BindingPower,
) -> Result<TypeDescriptor, Error> {
    parser.advance();
    check_required_sub_type(&left)?;

    let (params, required) = parse_function_params(parser, true)?;
    let variadic = params.last().is_some_and(|param| param.is_variadic);
    let position = left.position.clone();

    Ok(TypeDescriptor {
        kind: TypeKind::Function {
            returns: Box::new(left),
            params: params.into_iter().map(|param| param.ty).collect(),
            required,
            variadic,
        },
        is_const: false,
        position,
    })
}

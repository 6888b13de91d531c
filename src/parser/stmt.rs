use crate::{
    ast::{
        ast::{Expr, Stmt},
        expressions::{BinaryOp, NameExpr},
        statements::{
            BlockStmt, ClassDecl, ClassMember, ConditionalBranch, ExportStmt, ExpressionStmt,
            ForHeader, ForStmt, FunctionDecl, IfStmt, ImportName, ImportStmt, LoopControl,
            LoopControlStmt, LoopIndex, Modifiers, ModulePath, Parameter, ReturnStmt,
            VariableDecl, Visibility, WhileStmt,
        },
        types::{BuiltinType, TypeDescriptor},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Position,
};

use super::{expr::parse_expr, lookups::BindingPower, parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let kind = parser.current_token_kind();

    if let Some(entry) = parser.symbols().get(kind) {
        if let Some(handler) = entry.stmt {
            if entry.guard.map_or(true, |guard| guard(parser)) {
                return handler(parser);
            }
        }
    }

    parse_expression_stmt(parser)
}

/// Whether evaluating `expr` can change program state. Expression
/// statements without side effects are rejected.
fn has_side_effect(expr: &Expr) -> bool {
    match expr {
        Expr::Assignment(_) | Expr::Call(_) => true,
        Expr::Unary(unary) => unary.op.has_side_effect(),
        Expr::Binary(binary) if matches!(binary.op, BinaryOp::And | BinaryOp::Or) => {
            has_side_effect(&binary.left) || has_side_effect(&binary.right)
        }
        Expr::Binary(binary) => has_side_effect(&binary.left),
        _ => false,
    }
}

fn parse_expression_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let expression = parse_expr(parser, BindingPower::DEFAULT)?;

    if !has_side_effect(&expression) {
        return Err(Error::new(
            ErrorImpl::NoSideEffect {
                expression: expression.kind_name().to_string(),
            },
            expression.position().clone(),
        ));
    }

    parser.expect(TokenKind::Eol)?;
    let position = expression.position().clone();

    Ok(Stmt::Expression(ExpressionStmt {
        expression,
        position,
    }))
}

/// Statements until the end of the current block.
pub fn parse_stmt_list(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    let mut body = vec![];

    while !matches!(
        parser.current_token_kind(),
        TokenKind::BlockEnd | TokenKind::End
    ) {
        body.push(parse_stmt(parser)?);
    }

    Ok(body)
}

/// The body after a `:`. A bare line end gives an empty body.
pub fn parse_body(parser: &mut Parser) -> Result<Vec<Stmt>, Error> {
    if parser.advance_if(TokenKind::Eol) {
        return Ok(vec![]);
    }

    parser.expect(TokenKind::BlockStart)?;
    let body = parse_stmt_list(parser)?;
    parser.expect(TokenKind::BlockEnd)?;

    Ok(body)
}

pub enum Declaration {
    Variable(VariableDecl),
    Function(FunctionDecl),
}

/// Where a declaration appears. Decides what may follow the name and
/// whether a line end terminates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationContext {
    Statement,
    ClassMember { is_abstract: bool },
    HashField,
    LoopIndex,
}

/// `Type name [= value]` or `Type name(params): body`.
pub fn parse_declaration(
    parser: &mut Parser,
    context: DeclarationContext,
) -> Result<Declaration, Error> {
    let position = parser.get_position();
    let ty = parse_type(parser)?;
    let name = parser.expect(TokenKind::Identifier)?.value;
    let is_abstract = matches!(context, DeclarationContext::ClassMember { is_abstract: true });

    let can_be_function = matches!(
        context,
        DeclarationContext::Statement | DeclarationContext::ClassMember { .. }
    );

    if can_be_function && parser.current_token_kind() == TokenKind::LeftParen {
        parser.advance();
        let (params, required_params) = parse_function_params(parser, false)?;

        let body = if is_abstract {
            if parser.current_token_kind() == TokenKind::Colon {
                return Err(Error::new(
                    ErrorImpl::AbstractWithBody { name },
                    parser.get_position(),
                ));
            }
            parser.expect(TokenKind::Eol)?;
            None
        } else {
            parser.expect(TokenKind::Colon)?;
            Some(parse_body(parser)?)
        };

        return Ok(Declaration::Function(FunctionDecl {
            name,
            return_type: ty,
            params,
            required_params,
            body,
            position,
        }));
    }

    let mut value = None;
    if context != DeclarationContext::LoopIndex && parser.current_token_kind() == TokenKind::Assign
    {
        if is_abstract {
            return Err(Error::new(
                ErrorImpl::AbstractWithValue { name },
                parser.get_position(),
            ));
        }
        parser.advance();
        value = Some(parse_expr(parser, BindingPower::DEFAULT)?);
    }

    if matches!(
        context,
        DeclarationContext::Statement | DeclarationContext::ClassMember { .. }
    ) {
        parser.expect(TokenKind::Eol)?;
    }

    Ok(Declaration::Variable(VariableDecl {
        name,
        ty,
        value,
        position,
    }))
}

/// Parameters after the opening parenthesis, up to and including the
/// closing one. Returns the parameters and the number of required ones.
///
/// With `type_only` names are optional and defaults are not allowed, as in
/// `int(string, float...)`.
pub fn parse_function_params(
    parser: &mut Parser,
    type_only: bool,
) -> Result<(Vec<Parameter>, usize), Error> {
    let mut params: Vec<Parameter> = vec![];
    let mut required = None;

    while parser.current_token_kind() != TokenKind::RightParen {
        let position = parser.get_position();

        let mut is_const = false;
        if parser.current_token_kind() == TokenKind::Modifier {
            let modifier = parser.advance();
            if modifier.value != "const" {
                return Err(Error::new(
                    ErrorImpl::InvalidModifier {
                        modifier: modifier.value,
                    },
                    modifier.span.start,
                ));
            }
            is_const = true;
        }

        let ty = parse_type(parser)?.with_const(is_const);

        let name = if parser.current_token_kind() == TokenKind::Identifier {
            parser.advance().value
        } else if type_only {
            String::new()
        } else {
            parser.expect(TokenKind::Identifier)?.value
        };

        let is_variadic = parser.advance_if(TokenKind::Ellipsis);

        let default = if !type_only && !is_variadic && parser.advance_if(TokenKind::Assign) {
            Some(parse_expr(parser, BindingPower::DEFAULT)?)
        } else {
            None
        };

        if default.is_some() {
            required.get_or_insert(params.len());
        } else if required.is_some() && !is_variadic {
            return Err(Error::new(
                ErrorImpl::RequiredAfterOptional { name },
                position,
            ));
        }

        params.push(Parameter {
            name,
            ty,
            default,
            is_variadic,
            position,
        });

        if is_variadic || !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::RightParen)?;

    let variadic = params.last().is_some_and(|param| param.is_variadic) as usize;
    let required = required.unwrap_or(params.len() - variadic);

    Ok((params, required))
}

/// Declarations that start with a type. Identifiers only reach here when
/// followed by another identifier.
pub fn parse_declaration_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    match parse_declaration(parser, DeclarationContext::Statement)? {
        Declaration::Variable(decl) => Ok(Stmt::Variable(decl)),
        Declaration::Function(decl) => Ok(Stmt::Function(decl)),
    }
}

/// `const Type name = value`. Only `const` is valid outside of classes.
pub fn parse_modifier_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let modifier = parser.advance();
    if modifier.value != "const" {
        return Err(Error::new(
            ErrorImpl::InvalidModifier {
                modifier: modifier.value,
            },
            modifier.span.start,
        ));
    }

    match parse_declaration(parser, DeclarationContext::Statement)? {
        Declaration::Variable(mut decl) => {
            decl.ty.is_const = true;
            decl.position = modifier.span.start;
            Ok(Stmt::Variable(decl))
        }
        Declaration::Function(decl) => Err(Error::new(
            ErrorImpl::InvalidModifier {
                modifier: modifier.value,
            },
            decl.position,
        )),
    }
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance();
    let body = parse_stmt_list(parser)?;
    parser.expect(TokenKind::BlockEnd)?;

    Ok(Stmt::Block(BlockStmt {
        body,
        position: start.span.start,
    }))
}

pub fn parse_scope_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    parser.expect(TokenKind::Colon)?;
    let body = parse_body(parser)?;

    Ok(Stmt::Block(BlockStmt {
        body,
        position: keyword.span.start,
    }))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();

    let value = if parser.current_token_kind() == TokenKind::Eol {
        None
    } else {
        Some(parse_expr(parser, BindingPower::DEFAULT)?)
    };
    parser.expect(TokenKind::Eol)?;

    Ok(Stmt::Return(ReturnStmt {
        value,
        position: keyword.span.start,
    }))
}

pub fn parse_loop_control_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let kind = match keyword.kind {
        TokenKind::Break => LoopControl::Break,
        _ => LoopControl::Continue,
    };
    parser.expect(TokenKind::Eol)?;

    Ok(Stmt::LoopControl(LoopControlStmt {
        kind,
        position: keyword.span.start,
    }))
}

fn parse_conditional_branch(
    parser: &mut Parser,
    position: Position,
) -> Result<ConditionalBranch, Error> {
    let condition = parse_expr(parser, BindingPower::DEFAULT)?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_body(parser)?;

    Ok(ConditionalBranch {
        condition,
        body,
        position,
    })
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let position = keyword.span.start;

    let mut branches = vec![parse_conditional_branch(parser, position.clone())?];
    while parser.current_token_kind() == TokenKind::Elif {
        let elif = parser.advance();
        branches.push(parse_conditional_branch(parser, elif.span.start)?);
    }

    let else_body = if parser.advance_if(TokenKind::Else) {
        parser.expect(TokenKind::Colon)?;
        Some(parse_body(parser)?)
    } else {
        None
    };

    Ok(Stmt::If(IfStmt {
        branches,
        else_body,
        position,
    }))
}

/// `elif` or `else` that does not follow an `if` body.
pub fn parse_dangling_branch_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.current_token();

    Err(Error::new(
        ErrorImpl::MissingIf {
            keyword: keyword.value.clone(),
        },
        keyword.span.start.clone(),
    ))
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let condition = parse_expr(parser, BindingPower::DEFAULT)?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_body(parser)?;

    Ok(Stmt::While(WhileStmt {
        condition,
        body,
        position: keyword.span.start,
    }))
}

/// `indexes in iterator`, after the `for` keyword. Comprehension indexes
/// must declare their type.
pub fn parse_for_header(parser: &mut Parser, in_comprehension: bool) -> Result<ForHeader, Error> {
    let position = parser.get_position();
    let mut indexes = vec![];

    loop {
        let token = parser.current_token().clone();
        let is_bare_name = token.kind == TokenKind::Identifier
            && matches!(parser.peek_kind(), TokenKind::Comma | TokenKind::In);

        if is_bare_name {
            if in_comprehension {
                return Err(Error::new(
                    ErrorImpl::UntypedComprehensionIndex { name: token.value },
                    token.span.start,
                ));
            }

            parser.advance();
            indexes.push(LoopIndex::Name(NameExpr {
                name: token.value,
                position: token.span.start,
            }));
        } else {
            match parse_declaration(parser, DeclarationContext::LoopIndex)? {
                Declaration::Variable(decl) => indexes.push(LoopIndex::Declared(decl)),
                Declaration::Function(decl) => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedTokenDetailed {
                            token: decl.name,
                            message: String::from("a loop index cannot be a function"),
                        },
                        decl.position,
                    ))
                }
            }
        }

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::In)?;
    let iterator = parse_expr(parser, BindingPower::DEFAULT)?;

    Ok(ForHeader {
        indexes,
        iterator: Box::new(iterator),
        position,
    })
}

pub fn parse_for_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let header = parse_for_header(parser, false)?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_body(parser)?;

    Ok(Stmt::For(ForStmt {
        header,
        body,
        position: keyword.span.start,
    }))
}

/// Modifiers in front of a class member. Returns the modifiers and whether
/// any were written.
fn parse_member_modifiers(parser: &mut Parser) -> Result<(Modifiers, bool), Error> {
    let mut modifiers = Modifiers::default();
    let mut seen: Vec<String> = vec![];
    let mut has_visibility = false;

    while parser.current_token_kind() == TokenKind::Modifier {
        let modifier = parser.advance();

        if seen.contains(&modifier.value) {
            return Err(Error::new(
                ErrorImpl::DuplicateModifier {
                    modifier: modifier.value,
                },
                modifier.span.start,
            ));
        }

        let visibility = match modifier.value.as_str() {
            "const" => {
                modifiers.is_const = true;
                None
            }
            "static" => {
                modifiers.is_static = true;
                None
            }
            "abstract" => {
                modifiers.is_abstract = true;
                None
            }
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => Some(Visibility::Public),
        };

        if let Some(visibility) = visibility {
            if has_visibility {
                return Err(Error::new(
                    ErrorImpl::ConflictingVisibility,
                    modifier.span.start,
                ));
            }
            has_visibility = true;
            modifiers.visibility = visibility;
        }

        seen.push(modifier.value);
    }

    Ok((modifiers, !seen.is_empty()))
}

/// `new ClassName(params): body` or `del ClassName(): body`.
fn parse_special_method(parser: &mut Parser, class_name: &str) -> Result<FunctionDecl, Error> {
    let keyword = parser.advance();
    let name = parser.expect(TokenKind::Identifier)?;

    if name.value != class_name {
        return Err(Error::new(
            ErrorImpl::InvalidSpecialMethod {
                kind: keyword.value,
                message: format!("expected name {} but got {}", class_name, name.value),
            },
            name.span.start,
        ));
    }

    parser.expect(TokenKind::LeftParen)?;
    let (params, required_params) = parse_function_params(parser, false)?;
    parser.expect(TokenKind::Colon)?;
    let body = parse_body(parser)?;

    let return_type = match keyword.kind {
        TokenKind::New => TypeDescriptor::named(class_name.to_string(), keyword.span.start.clone()),
        _ => TypeDescriptor::builtin(BuiltinType::Void, keyword.span.start.clone()),
    };

    Ok(FunctionDecl {
        name: keyword.value,
        return_type,
        params,
        required_params,
        body: Some(body),
        position: keyword.span.start,
    })
}

fn is_member_name_taken(class: &ClassDecl, name: &str) -> bool {
    class.member(name).is_some() || class.method(name).is_some()
}

pub fn parse_class_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();
    let name = parser.expect(TokenKind::Identifier)?.value;

    let base = if parser.advance_if(TokenKind::Extends) {
        let base = parser.expect(TokenKind::Identifier)?;
        Some(NameExpr {
            name: base.value,
            position: base.span.start,
        })
    } else {
        None
    };

    parser.expect(TokenKind::Colon)?;

    let mut class = ClassDecl {
        name,
        base,
        members: vec![],
        methods: vec![],
        constructor: None,
        destructor: None,
        position: keyword.span.start,
    };

    if parser.advance_if(TokenKind::Eol) {
        return Ok(Stmt::Class(class));
    }

    parser.expect(TokenKind::BlockStart)?;

    while !matches!(
        parser.current_token_kind(),
        TokenKind::BlockEnd | TokenKind::End
    ) {
        let (modifiers, has_modifiers) = parse_member_modifiers(parser)?;
        let token = parser.current_token().clone();

        match token.kind {
            TokenKind::New | TokenKind::Delete => {
                if has_modifiers {
                    return Err(Error::new(
                        ErrorImpl::InvalidSpecialMethod {
                            kind: token.value,
                            message: String::from("modifiers are not allowed"),
                        },
                        token.span.start,
                    ));
                }

                let method = parse_special_method(parser, &class.name)?;
                let slot = match token.kind {
                    TokenKind::New => &mut class.constructor,
                    _ => &mut class.destructor,
                };

                if slot.is_some() {
                    return Err(Error::new(
                        ErrorImpl::InvalidSpecialMethod {
                            kind: token.value,
                            message: String::from("only one is allowed per class"),
                        },
                        token.span.start,
                    ));
                }
                *slot = Some(method);
            }
            TokenKind::Identifier if parser.peek_kind() != TokenKind::Identifier => {
                return Err(Error::new(
                    ErrorImpl::AmbiguousClassMember { name: token.value },
                    token.span.start,
                ));
            }
            TokenKind::Identifier | TokenKind::Type => {
                let context = DeclarationContext::ClassMember {
                    is_abstract: modifiers.is_abstract,
                };

                match parse_declaration(parser, context)? {
                    Declaration::Variable(mut decl) => {
                        if is_member_name_taken(&class, &decl.name) {
                            return Err(Error::new(
                                ErrorImpl::DuplicateMember { name: decl.name },
                                decl.position,
                            ));
                        }
                        decl.ty.is_const |= modifiers.is_const;
                        class.members.push(ClassMember { decl, modifiers });
                    }
                    Declaration::Function(decl) => {
                        if is_member_name_taken(&class, &decl.name) {
                            return Err(Error::new(
                                ErrorImpl::DuplicateMember { name: decl.name },
                                decl.position,
                            ));
                        }
                        class.methods.push(ClassMember { decl, modifiers });
                    }
                }
            }
            _ => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: token.value,
                        message: String::from("expected a class member"),
                    },
                    token.span.start,
                ))
            }
        }
    }

    parser.expect(TokenKind::BlockEnd)?;

    Ok(Stmt::Class(class))
}

fn parse_module_path(parser: &mut Parser) -> Result<ModulePath, Error> {
    let first = parser.expect(TokenKind::Identifier)?;
    let position = first.span.start;
    let mut segments = vec![first.value];

    while parser.advance_if(TokenKind::Dot) {
        segments.push(parser.expect(TokenKind::Identifier)?.value);
    }

    Ok(ModulePath { segments, position })
}

/// `import a.b [as c], ...` or `from a.b import c [as d], ...`.
pub fn parse_import_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();

    let from = if keyword.kind == TokenKind::From {
        let path = parse_module_path(parser)?;
        parser.expect(TokenKind::Import)?;
        Some(path)
    } else {
        None
    };

    let mut names = vec![];
    loop {
        let path = parse_module_path(parser)?;
        let position = path.position.clone();

        let alias = if parser.advance_if(TokenKind::As) {
            let alias = parser.expect(TokenKind::Identifier)?;
            Some(NameExpr {
                name: alias.value,
                position: alias.span.start,
            })
        } else {
            None
        };

        names.push(ImportName {
            path,
            alias,
            position,
        });

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::Eol)?;

    Ok(Stmt::Import(ImportStmt {
        from,
        names,
        position: keyword.span.start,
    }))
}

pub fn parse_export_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let keyword = parser.advance();

    let mut names = vec![];
    loop {
        let name = parser.expect(TokenKind::Identifier)?;
        names.push(NameExpr {
            name: name.value,
            position: name.span.start,
        });

        if !parser.advance_if(TokenKind::Comma) {
            break;
        }
    }

    parser.expect(TokenKind::Eol)?;

    Ok(Stmt::Export(ExportStmt {
        names,
        position: keyword.span.start,
    }))
}

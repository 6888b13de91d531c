//! Parser state and the entry point that turns tokens into a [`Program`].
//!
//! The parser itself only tracks where it is in the token stream. All
//! grammar knowledge lives in the shared [`SymbolTable`], which maps token
//! kinds to NUD, LED and statement handlers.

use std::rc::Rc;

use crate::{
    ast::ast::Stmt,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position, Span,
};

use super::{
    lookups::{SymbolTable, SYMBOL_TABLE},
    stmt::parse_stmt_list,
};

/// The statements of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub file: Rc<String>,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Rc<String>,
    symbols: &'static SymbolTable,
    /// Counter for comprehension ids
    current_id: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, file: Rc<String>) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::End) {
            let position = tokens
                .last()
                .map(|token| token.span.end.clone())
                .unwrap_or_else(|| Position::new(1, 1, Rc::clone(&file)));
            tokens.push(Token {
                kind: TokenKind::End,
                value: String::new(),
                span: Span {
                    start: position.clone(),
                    end: position,
                },
            });
        }

        Parser {
            tokens,
            pos: 0,
            file,
            symbols: &SYMBOL_TABLE,
            current_id: 0,
        }
    }

    pub fn symbols(&self) -> &'static SymbolTable {
        self.symbols
    }

    /// Returns the current token without advancing. Past the end this keeps
    /// returning the trailing `End` token.
    pub fn current_token(&self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// The kind of the token after the current one.
    pub fn peek_kind(&self) -> TokenKind {
        let index = (self.pos + 1).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    /// Advances to the next token and returns the previous one.
    pub fn advance(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consumes a token of the expected kind or fails with `error`, falling
    /// back to [`ErrorImpl::ExpectedToken`].
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind == expected_kind {
            return Ok(self.advance());
        }

        match error {
            Some(error) => Err(error),
            None => Err(Error::new(
                ErrorImpl::ExpectedToken {
                    expected: expected_kind,
                    found: token.kind,
                },
                token.span.start.clone(),
            )),
        }
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Consumes the current token when it has the given kind.
    pub fn advance_if(&mut self, kind: TokenKind) -> bool {
        if self.current_token_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::End
    }

    pub fn advance_id(&mut self) -> usize {
        let id = self.current_id;
        self.current_id += 1;
        id
    }

    /// Position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    pub fn file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }
}

/// Parses a token stream produced by the lexer into a [`Program`].
///
/// Parsing stops at the first syntax error.
pub fn parse(tokens: Vec<Token>, file: Rc<String>) -> Result<Program, Error> {
    let mut parser = Parser::new(tokens, Rc::clone(&file));

    let has_outer_block = parser.advance_if(TokenKind::BlockStart);
    let body = parse_stmt_list(&mut parser)?;
    if has_outer_block {
        parser.expect(TokenKind::BlockEnd)?;
    }
    parser.expect(TokenKind::End)?;

    tracing::debug!(file = %file, statements = body.len(), "parsed program");

    Ok(Program { body, file })
}

use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Config, Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

fn pattern(source: &str, handler: RegexHandler) -> RegexPattern {
    RegexPattern {
        regex: Regex::new(&format!("^(?:{})", source)).unwrap(),
        handler,
    }
}

lazy_static! {
    // Tried in order, so longer operators come before their prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern("[ \\t\\r]+", skip_handler),
        pattern("\\\\[ \\t]*\\r?\\n", continuation_handler),
        pattern("\\n", newline_handler),
        pattern("#[^\\n]*", skip_handler),
        pattern("[0-9]+\\.[0-9]+([eE][-+]?[0-9]+)?|[0-9]+[eE][-+]?[0-9]+", float_handler),
        pattern("0[xX][0-9a-fA-F]+|[0-9]+", integer_handler),
        pattern("\"([^\"\\\\\\n]|\\\\.)*\"|'([^'\\\\\\n]|\\\\.)*'", string_handler),
        pattern("[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        pattern(">>>=", MK_DEFAULT_HANDLER!(TokenKind::AssignUnsignedRightShift, ">>>=")),
        pattern(">>=", MK_DEFAULT_HANDLER!(TokenKind::AssignRightShift, ">>=")),
        pattern("<<=", MK_DEFAULT_HANDLER!(TokenKind::AssignLeftShift, "<<=")),
        pattern("\\*\\*=", MK_DEFAULT_HANDLER!(TokenKind::AssignExp, "**=")),
        pattern("//=", MK_DEFAULT_HANDLER!(TokenKind::AssignDivInt, "//=")),
        pattern(">>>", MK_DEFAULT_HANDLER!(TokenKind::UnsignedRightShift, ">>>")),
        pattern("\\.\\.\\.", MK_DEFAULT_HANDLER!(TokenKind::Ellipsis, "...")),
        pattern("\\|=", MK_DEFAULT_HANDLER!(TokenKind::AssignBitOr, "|=")),
        pattern("\\^=", MK_DEFAULT_HANDLER!(TokenKind::AssignBitXor, "^=")),
        pattern("&=", MK_DEFAULT_HANDLER!(TokenKind::AssignBitAnd, "&=")),
        pattern("\\+=", MK_DEFAULT_HANDLER!(TokenKind::AssignPlus, "+=")),
        pattern("-=", MK_DEFAULT_HANDLER!(TokenKind::AssignMinus, "-=")),
        pattern("\\*=", MK_DEFAULT_HANDLER!(TokenKind::AssignMul, "*=")),
        pattern("/=", MK_DEFAULT_HANDLER!(TokenKind::AssignDiv, "/=")),
        pattern("%=", MK_DEFAULT_HANDLER!(TokenKind::AssignMod, "%=")),
        pattern("==", MK_DEFAULT_HANDLER!(TokenKind::Equal, "==")),
        pattern("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEqual, "!=")),
        pattern("\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        pattern("&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        pattern("<<", MK_DEFAULT_HANDLER!(TokenKind::LeftShift, "<<")),
        pattern(">>", MK_DEFAULT_HANDLER!(TokenKind::RightShift, ">>")),
        pattern("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEqual, "<=")),
        pattern(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEqual, ">=")),
        pattern("\\+\\+", MK_DEFAULT_HANDLER!(TokenKind::Increment, "++")),
        pattern("--", MK_DEFAULT_HANDLER!(TokenKind::Decrement, "--")),
        pattern("\\*\\*", MK_DEFAULT_HANDLER!(TokenKind::Exp, "**")),
        pattern("//", MK_DEFAULT_HANDLER!(TokenKind::DivInt, "//")),
        pattern("=", MK_DEFAULT_HANDLER!(TokenKind::Assign, "=")),
        pattern(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        pattern("\\?", MK_DEFAULT_HANDLER!(TokenKind::Hook, "?")),
        pattern(":", MK_DEFAULT_HANDLER!(TokenKind::Colon, ":")),
        pattern("\\|", MK_DEFAULT_HANDLER!(TokenKind::BitOr, "|")),
        pattern("&", MK_DEFAULT_HANDLER!(TokenKind::BitAnd, "&")),
        pattern("\\^", MK_DEFAULT_HANDLER!(TokenKind::BitXor, "^")),
        pattern("~", MK_DEFAULT_HANDLER!(TokenKind::BitNot, "~")),
        pattern("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        pattern(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        pattern("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        pattern("-", MK_DEFAULT_HANDLER!(TokenKind::Minus, "-")),
        pattern("\\*", MK_DEFAULT_HANDLER!(TokenKind::Mul, "*")),
        pattern("/", MK_DEFAULT_HANDLER!(TokenKind::Div, "/")),
        pattern("%", MK_DEFAULT_HANDLER!(TokenKind::Mod, "%")),
        pattern("!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        pattern("\\.", MK_DEFAULT_HANDLER!(TokenKind::Dot, ".")),
        pattern("@", MK_DEFAULT_HANDLER!(TokenKind::At, "@")),
        pattern("\\[", MK_DEFAULT_HANDLER!(TokenKind::LeftBracket, "[")),
        pattern("\\]", MK_DEFAULT_HANDLER!(TokenKind::RightBracket, "]")),
        pattern("\\{", MK_DEFAULT_HANDLER!(TokenKind::LeftCurly, "{")),
        pattern("\\}", MK_DEFAULT_HANDLER!(TokenKind::RightCurly, "}")),
        pattern("\\(", MK_DEFAULT_HANDLER!(TokenKind::LeftParen, "(")),
        pattern("\\)", MK_DEFAULT_HANDLER!(TokenKind::RightParen, ")")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    col: u32,
    file: Rc<String>,
    tab_width: usize,
    /// Widths of the currently open indentation levels, outermost first
    indents: Vec<usize>,
    /// Number of unclosed brackets; newlines inside brackets are joined
    depth: usize,
    line_start: bool,
    tokens_on_line: usize,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>, tab_width: usize) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            col: 1,
            file: file_name,
            tab_width,
            indents: vec![0],
            depth: 0,
            line_start: true,
            tokens_on_line: 0,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
        self.col += n as u32;
    }

    pub fn push(&mut self, token: Token) {
        if token.kind.is_opening_bracket() {
            self.depth += 1;
        } else if token.kind.is_closing_bracket() {
            self.depth = self.depth.saturating_sub(1);
        }

        self.tokens_on_line += 1;
        self.tokens.push(token);
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.col, Rc::clone(&self.file))
    }

    /// Span of `len` bytes starting at the cursor.
    pub fn span_for(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position::new(self.line, self.col + len as u32, Rc::clone(&self.file)),
        }
    }

    pub fn at(&self) -> Option<char> {
        self.remainder().chars().next()
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn next_line(&mut self, reset_line: bool) {
        self.line += 1;
        self.col = 1;

        if reset_line {
            self.tokens_on_line = 0;
            self.line_start = self.depth == 0;
        }
    }

    fn push_marker(&mut self, kind: TokenKind) {
        let span = self.span_for(0);
        self.tokens.push(MK_TOKEN!(kind, String::new(), span));
    }

    /// Measures the indentation of a fresh line and opens or closes blocks.
    fn indentation(&mut self) -> Result<(), Error> {
        self.line_start = false;

        let mut width = 0;
        let mut consumed = 0;
        for c in self.remainder().chars() {
            match c {
                ' ' => width += 1,
                '\t' => width += self.tab_width,
                _ => break,
            }
            consumed += 1;
        }
        self.advance_n(consumed);

        let rest = self.remainder();
        if rest.is_empty() || rest.starts_with(['\n', '\r', '#']) {
            return Ok(());
        }

        let current = self.indents.last().copied().unwrap_or(0);

        if width > current {
            if matches!(self.tokens.last(), Some(token) if token.kind == TokenKind::Eol) {
                self.tokens.pop();
            }

            self.indents.push(width);
            self.push_marker(TokenKind::BlockStart);
        } else if width < current {
            while width < self.indents.last().copied().unwrap_or(0) {
                self.indents.pop();
                self.push_marker(TokenKind::BlockEnd);
            }

            if width != self.indents.last().copied().unwrap_or(0) {
                return Err(Error::new(
                    ErrorImpl::UnalignedIndentation { width },
                    self.position(),
                ));
            }
        }

        Ok(())
    }

    fn finish(&mut self) {
        if self.tokens_on_line > 0 {
            self.push_marker(TokenKind::Eol);
        }

        while self.indents.len() > 1 {
            self.indents.pop();
            self.push_marker(TokenKind::BlockEnd);
        }

        self.push_marker(TokenKind::BlockEnd);
        self.push_marker(TokenKind::End);
    }
}

fn matched_text(lexer: &Lexer, regex: &Regex) -> Option<String> {
    regex
        .find(lexer.remainder())
        .map(|matched| matched.as_str().to_string())
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    if let Some(matched) = matched_text(lexer, regex) {
        lexer.advance_n(matched.len());
    }
}

fn continuation_handler(lexer: &mut Lexer, regex: &Regex) {
    if let Some(matched) = matched_text(lexer, regex) {
        lexer.advance_n(matched.len());
        lexer.next_line(false);
    }
}

fn newline_handler(lexer: &mut Lexer, _regex: &Regex) {
    if lexer.depth == 0 && lexer.tokens_on_line > 0 {
        lexer.push_marker(TokenKind::Eol);
    }

    lexer.advance_n(1);
    lexer.next_line(true);
}

fn float_handler(lexer: &mut Lexer, regex: &Regex) {
    if let Some(matched) = matched_text(lexer, regex) {
        let span = lexer.span_for(matched.len());
        lexer.advance_n(matched.len());
        lexer.push(MK_TOKEN!(TokenKind::Float, matched, span));
    }
}

fn integer_handler(lexer: &mut Lexer, regex: &Regex) {
    if let Some(matched) = matched_text(lexer, regex) {
        let span = lexer.span_for(matched.len());
        lexer.advance_n(matched.len());
        lexer.push(MK_TOKEN!(TokenKind::Integer, matched, span));
    }
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let Some(matched) = matched_text(lexer, regex) else {
        return;
    };

    let span = lexer.span_for(matched.len());
    lexer.advance_n(matched.len());

    let string_literal = &matched[1..matched.len() - 1];
    let mut result = String::new();
    let mut chars = string_literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            _ => {
                // Unknown escapes keep their backslash
                result.push(ch);
                continue;
            }
        }
        chars.next();
    }

    lexer.push(MK_TOKEN!(TokenKind::String, result, span));
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let Some(value) = matched_text(lexer, regex) else {
        return;
    };

    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    let span = lexer.span_for(value.len());
    lexer.advance_n(value.len());
    lexer.push(MK_TOKEN!(kind, value, span));
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    tokenize_with_config(source, file, &Config::default())
}

/// Converts source text into tokens, including the synthetic block markers.
///
/// The returned stream always starts with `BlockStart` and ends with
/// `BlockEnd` followed by `End`.
pub fn tokenize_with_config(
    source: String,
    file: Option<String>,
    config: &Config,
) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file, config.tab_width);
    lex.push_marker(TokenKind::BlockStart);

    while !lex.at_eof() {
        if lex.line_start {
            lex.indentation()?;
            continue;
        }

        let Some(pattern) = PATTERNS
            .iter()
            .find(|pattern| pattern.regex.is_match(lex.remainder()))
        else {
            return Err(Error::new(
                ErrorImpl::UnrecognisedToken {
                    token: lex.at().map(String::from).unwrap_or_default(),
                },
                lex.position(),
            ));
        };

        (pattern.handler)(&mut lex, &pattern.regex);
    }

    lex.finish();

    tracing::debug!(file = %lex.file, tokens = lex.tokens.len(), "tokenized source");
    Ok(lex.tokens)
}

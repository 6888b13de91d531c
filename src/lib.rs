#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

use crate::{
    errors::errors::{Error, ErrorImpl, ErrorTip},
    lexer::lexer::tokenize_with_config,
    parser::parser::{parse, Program},
    type_checker::{
        diagnostics::{Diagnostic, Severity},
        type_checker::type_check,
    },
};

pub use config::Config;

pub mod ast;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A 1-based source location. Ordering is by line, then column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(line: u32, col: u32, file: Rc<String>) -> Self {
        Position { line, col, file }
    }

    pub fn null() -> Self {
        Position::new(0, 0, Rc::new(String::from("<null>")))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Result of checking one source file that parsed successfully.
pub struct Report {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Whether this report should fail the build under the given configuration.
    pub fn is_failure(&self, config: &Config) -> bool {
        self.has_errors() || (config.deny_warnings && self.warnings().next().is_some())
    }
}

/// Runs the lexer, parser and type checker over a single source file.
///
/// A syntax error aborts immediately and is returned as `Err`. Semantic
/// problems never abort, they are collected into the returned [`Report`]
/// sorted by position.
pub fn check_source(source: String, file: Option<String>, config: &Config) -> Result<Report, Error> {
    let tokens = tokenize_with_config(source, file, config)?;
    let file = tokens
        .first()
        .map(|token| Rc::clone(&token.span.start.file))
        .unwrap_or_else(|| Rc::new(String::from("shell")));

    let program = parse(tokens, file)?;

    let diagnostics = match type_check(&program) {
        Ok(module) => module.diagnostics.into_sorted(),
        Err(error) => {
            return Err(Error::new(
                ErrorImpl::InternalError {
                    message: error.to_string(),
                },
                Position::null(),
            ))
        }
    };

    Ok(Report {
        program,
        diagnostics,
    })
}

pub fn get_line_at_position<'a>(source: &'a str, position: &Position) -> Option<&'a str> {
    if position.line == 0 {
        return None;
    }

    source.lines().nth(position.line as usize - 1)
}

pub fn display_error(error: &Error, source: &str) {
    /*
        error: message
        -> final.lufa:20:9
           |
        20 | int a = #
           | --------^
    */

    let position = error.get_position();

    if let ErrorTip::None = error.get_tip() {
        eprintln!("error: {}", error.get_error_name());
    } else {
        eprintln!("error: {} ({})", error.get_error_name(), error.get_tip());
    }

    display_source_line(source, position);
}

pub fn display_diagnostic(diagnostic: &Diagnostic, source: &str) {
    eprintln!("{}: {}", diagnostic.severity, diagnostic.kind);
    display_source_line(source, &diagnostic.position);
}

fn display_source_line(source: &str, position: &Position) {
    eprintln!("-> {}", position);

    let Some(line_text) = get_line_at_position(source, position) else {
        return;
    };

    let line_string = position.line.to_string();
    let padding = line_string.len() + 2;

    eprintln!("{:>padding$}", "|");

    let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
    eprintln!("{} | {}", line_string, line_text_removed.trim_end());

    let arrows = (position.col as usize).saturating_sub(removed_whitespace).max(1);

    eprintln!("{:>padding$} {:->arrows$}", "|", "^");
}

fn remove_starting_whitespace(string: &str) -> (&str, usize) {
    let start = string
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();

    (&string[start..], start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{get_line_at_position, remove_starting_whitespace, Position};

    #[test]
    fn test_get_line_at_position() {
        let source = "int x = 1\n\nstring s = \"a\"\n";
        let file = Rc::new(String::from("test.lufa"));

        assert_eq!(
            get_line_at_position(source, &Position::new(1, 5, Rc::clone(&file))),
            Some("int x = 1")
        );
        assert_eq!(
            get_line_at_position(source, &Position::new(3, 1, Rc::clone(&file))),
            Some("string s = \"a\"")
        );
        assert_eq!(get_line_at_position(source, &Position::new(0, 0, file)), None);
    }

    #[test]
    fn test_position_ordering() {
        let file = Rc::new(String::from("test.lufa"));
        let a = Position::new(2, 10, Rc::clone(&file));
        let b = Position::new(3, 1, Rc::clone(&file));
        let c = Position::new(3, 4, file);

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_remove_starting_whitespace() {
        assert_eq!(remove_starting_whitespace("    ret x"), ("ret x", 4));
        assert_eq!(remove_starting_whitespace("x"), ("x", 0));
    }
}

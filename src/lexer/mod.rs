//! Lexical analysis module.
//!
//! Converts source text into a stream of tokens for the parser:
//!
//! - Tokenization using an ordered table of anchored regex patterns
//! - Keywords, builtin type names, modifiers and word operators
//! - Synthetic `BlockStart`/`BlockEnd`/`Eol`/`End` markers derived from indentation
//! - Line and column tracking for error reporting

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;

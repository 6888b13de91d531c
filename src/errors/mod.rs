//! Error types for the lexer and parser.
//!
//! - `Error` pairs an error kind with the source position it was raised at
//! - `ErrorImpl` enumerates every syntax error kind
//! - `ErrorTip` carries an optional suggestion for display
//!
//! Semantic problems are not errors in this sense; they are collected as
//! diagnostics by the type checker.

pub mod errors;

//! Pratt parser producing the syntax tree.
//!
//! - `lookups` holds the symbol table mapping token kinds to binding powers
//!   and NUD/LED/statement handlers
//! - `expr`, `stmt` and `types` hold the handlers themselves
//! - `parser` holds the token cursor and the `parse` entry point

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;

//! Semantic analysis.
//!
//! Checking a program happens in two passes over a tree of scopes:
//!
//! - Construction walks the AST one nesting level at a time, defines names
//!   and defers every initializer, expression, condition and return into the
//!   scope it belongs to
//! - Validation resolves the deferred obligations, recording diagnostics
//!   without stopping at the first problem
//!
//! Types are interned in a [`type_cache::TypeCache`] and compared by id.

pub mod diagnostics;
pub mod operators;
pub mod resolver;
pub mod scope;
pub mod type_cache;
pub mod type_checker;

#[cfg(test)]
mod tests;

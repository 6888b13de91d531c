/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: The `Expr` and `Stmt` enums
/// - expressions: Node structs and operators for expressions
/// - statements: Node structs for statements and declarations
/// - types: Type descriptors as written in the source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;

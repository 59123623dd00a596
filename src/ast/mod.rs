//! The abstract syntax tree: expression and statement nodes shared by the parser, resolver,
//! and evaluator.

pub mod expr;
pub mod stmt;

pub use expr::Expr;
pub use stmt::{FunctionDecl, Stmt};

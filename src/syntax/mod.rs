//! Lossless C# syntax trees: lexing, parsing, printing, and node
//! correlation across rewrites.

pub mod ast;
pub mod parse;
pub mod print;
pub mod token;
pub mod track;

pub use ast::{CompilationUnit, Expr, ExprKind, NodeId, Stmt, StmtKind, TypeSyntax};
pub use parse::parse;
pub use print::unit_text;
pub use track::NodeTracker;

#![doc = include_str!("../README.md")]

//! Candidate invariant expressions for the galago learning loop.
//!
//! The same [`Expr`](ast::Expr) value feeds every consumer: the symbolic
//! oracle translates it to solver terms, the external verifier receives its
//! infix rendering, and counterexample replay evaluates it concretely.

pub mod ast;
pub mod errors;
pub mod eval;
pub mod parser;

pub use ast::Expr;
pub use errors::{EvalError, ParseError};
pub use eval::{eval, holds, Binding, Value};
pub use parser::parse;

#![doc = include_str!("../README.md")]

//! SMT solver integration for candidate invariant queries.
//!
//! The symbolic oracle asserts obligation-violation formulas over
//! [`galago_expr::Expr`] and reads counterexample states back out of the
//! models. The backend surface is kept behind the [`solver::SmtSolver`]
//! trait so tests can substitute scripted solvers.

pub mod backends;
pub mod solver;
pub mod sorts;

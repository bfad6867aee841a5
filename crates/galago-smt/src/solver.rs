use std::collections::HashMap;
use std::fmt;

use galago_expr::{Expr, Value};

use crate::sorts::Sort;

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown(String),
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatResult::Sat => write!(f, "sat"),
            SatResult::Unsat => write!(f, "unsat"),
            SatResult::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// A model (variable assignments) extracted from a SAT result.
///
/// Values reuse [`galago_expr::Value`] so a model can be fed straight back
/// into candidate evaluation.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub values: HashMap<String, Value>,
}

impl Model {
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// Abstract SMT solver interface.
pub trait SmtSolver {
    type Error: std::error::Error;

    /// Declare a new variable.
    fn declare_var(&mut self, name: &str, sort: &Sort) -> Result<(), Self::Error>;

    /// Assert a boolean constraint.
    fn assert(&mut self, expr: &Expr) -> Result<(), Self::Error>;

    /// Check satisfiability.
    fn check_sat(&mut self) -> Result<SatResult, Self::Error>;

    /// Check satisfiability and extract a model for the named variables if SAT.
    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &Sort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error>;

    /// Reset the solver state, dropping assertions and declarations.
    fn reset(&mut self) -> Result<(), Self::Error>;
}

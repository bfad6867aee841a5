use std::collections::HashMap;

use thiserror::Error;
use z3::SatResult as Z3SatResult;

use galago_expr::{Expr, Value};

use crate::solver::{Model, SatResult, SmtSolver};
use crate::sorts::Sort;

#[derive(Debug, Error)]
pub enum Z3Error {
    #[error("Z3 error: {0}")]
    Internal(String),
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
}

/// Z3-backed solver for obligation-violation queries.
///
/// The oracle creates a fresh instance per candidate and calls `reset`
/// between obligations, so no incremental state survives a query.
pub struct Z3Solver {
    solver: z3::Solver,
    int_vars: HashMap<String, z3::ast::Int>,
    bool_vars: HashMap<String, z3::ast::Bool>,
}

impl Z3Solver {
    pub fn new() -> Self {
        Self {
            solver: z3::Solver::new(),
            int_vars: HashMap::new(),
            bool_vars: HashMap::new(),
        }
    }

    fn translate(&self, expr: &Expr) -> Result<Z3Term, Z3Error> {
        match expr {
            Expr::Var(name) => {
                if let Some(v) = self.int_vars.get(name) {
                    Ok(Z3Term::Int(v.clone()))
                } else if let Some(v) = self.bool_vars.get(name) {
                    Ok(Z3Term::Bool(v.clone()))
                } else {
                    Err(Z3Error::UnknownVariable(name.clone()))
                }
            }
            Expr::IntLit(n) => Ok(Z3Term::Int(z3::ast::Int::from_i64(*n))),
            Expr::BoolLit(b) => Ok(Z3Term::Bool(z3::ast::Bool::from_bool(*b))),
            Expr::Add(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Int(&l + &r))
            }
            Expr::Sub(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Int(&l - &r))
            }
            Expr::Mul(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Int(&l * &r))
            }
            Expr::Eq(lhs, rhs) => {
                let l = self.translate(lhs)?;
                let r = self.translate(rhs)?;
                match (l, r) {
                    (Z3Term::Int(li), Z3Term::Int(ri)) => Ok(Z3Term::Bool(li.eq(&ri))),
                    (Z3Term::Bool(lb), Z3Term::Bool(rb)) => Ok(Z3Term::Bool(lb.eq(&rb))),
                    _ => Err(Z3Error::Internal("Sort mismatch in Eq".into())),
                }
            }
            Expr::Ne(lhs, rhs) => {
                let l = self.translate(lhs)?;
                let r = self.translate(rhs)?;
                match (l, r) {
                    (Z3Term::Int(li), Z3Term::Int(ri)) => Ok(Z3Term::Bool(li.eq(&ri).not())),
                    (Z3Term::Bool(lb), Z3Term::Bool(rb)) => Ok(Z3Term::Bool(lb.eq(&rb).not())),
                    _ => Err(Z3Error::Internal("Sort mismatch in Ne".into())),
                }
            }
            Expr::Lt(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Bool(l.lt(&r)))
            }
            Expr::Le(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Bool(l.le(&r)))
            }
            Expr::Gt(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Bool(l.gt(&r)))
            }
            Expr::Ge(lhs, rhs) => {
                let l = self.translate(lhs)?.into_int()?;
                let r = self.translate(rhs)?.into_int()?;
                Ok(Z3Term::Bool(l.ge(&r)))
            }
            Expr::And(exprs) => {
                let bools: Result<Vec<_>, _> = exprs
                    .iter()
                    .map(|e| self.translate(e).and_then(|z| z.into_bool()))
                    .collect();
                let bools = bools?;
                let refs: Vec<&z3::ast::Bool> = bools.iter().collect();
                Ok(Z3Term::Bool(z3::ast::Bool::and(&refs)))
            }
            Expr::Or(exprs) => {
                let bools: Result<Vec<_>, _> = exprs
                    .iter()
                    .map(|e| self.translate(e).and_then(|z| z.into_bool()))
                    .collect();
                let bools = bools?;
                let refs: Vec<&z3::ast::Bool> = bools.iter().collect();
                Ok(Z3Term::Bool(z3::ast::Bool::or(&refs)))
            }
            Expr::Not(inner) => {
                let b = self.translate(inner)?.into_bool()?;
                Ok(Z3Term::Bool(b.not()))
            }
            Expr::Implies(lhs, rhs) => {
                let l = self.translate(lhs)?.into_bool()?;
                let r = self.translate(rhs)?.into_bool()?;
                Ok(Z3Term::Bool(l.implies(&r)))
            }
        }
    }
}

enum Z3Term {
    Int(z3::ast::Int),
    Bool(z3::ast::Bool),
}

impl Z3Term {
    fn into_int(self) -> Result<z3::ast::Int, Z3Error> {
        match self {
            Z3Term::Int(i) => Ok(i),
            Z3Term::Bool(_) => Err(Z3Error::Internal("Expected Int, got Bool".into())),
        }
    }

    fn into_bool(self) -> Result<z3::ast::Bool, Z3Error> {
        match self {
            Z3Term::Bool(b) => Ok(b),
            Z3Term::Int(_) => Err(Z3Error::Internal("Expected Bool, got Int".into())),
        }
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtSolver for Z3Solver {
    type Error = Z3Error;

    fn declare_var(&mut self, name: &str, sort: &Sort) -> Result<(), Z3Error> {
        match sort {
            Sort::Int => {
                let v = z3::ast::Int::new_const(name);
                self.int_vars.insert(name.to_string(), v);
            }
            Sort::Bool => {
                let v = z3::ast::Bool::new_const(name);
                self.bool_vars.insert(name.to_string(), v);
            }
        }
        Ok(())
    }

    fn assert(&mut self, expr: &Expr) -> Result<(), Z3Error> {
        let term = self.translate(expr)?.into_bool()?;
        self.solver.assert(&term);
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Z3Error> {
        match self.solver.check() {
            Z3SatResult::Sat => Ok(SatResult::Sat),
            Z3SatResult::Unsat => Ok(SatResult::Unsat),
            Z3SatResult::Unknown => Ok(SatResult::Unknown("Z3 returned unknown".into())),
        }
    }

    fn check_sat_with_model(
        &mut self,
        var_names: &[(&str, &Sort)],
    ) -> Result<(SatResult, Option<Model>), Z3Error> {
        match self.solver.check() {
            Z3SatResult::Sat => {
                let z3_model = self
                    .solver
                    .get_model()
                    .ok_or_else(|| Z3Error::Internal("SAT but no model available".into()))?;
                let mut values = HashMap::new();

                for &(name, sort) in var_names {
                    match sort {
                        Sort::Int => {
                            if let Some(v) = self.int_vars.get(name) {
                                if let Some(val) = z3_model.eval::<z3::ast::Int>(v, true) {
                                    if let Some(n) = val.as_i64() {
                                        values.insert(name.to_string(), Value::Int(n));
                                    }
                                }
                            }
                        }
                        Sort::Bool => {
                            if let Some(v) = self.bool_vars.get(name) {
                                if let Some(val) = z3_model.eval::<z3::ast::Bool>(v, true) {
                                    if let Some(b) = val.as_bool() {
                                        values.insert(name.to_string(), Value::Bool(b));
                                    }
                                }
                            }
                        }
                    }
                }

                Ok((SatResult::Sat, Some(Model { values })))
            }
            Z3SatResult::Unsat => Ok((SatResult::Unsat, None)),
            Z3SatResult::Unknown => Ok((SatResult::Unknown("Z3 returned unknown".into()), None)),
        }
    }

    fn reset(&mut self) -> Result<(), Z3Error> {
        self.solver.reset();
        self.int_vars.clear();
        self.bool_vars.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn z3_basic_sat() -> TestResult {
        let mut solver = Z3Solver::new();

        solver.declare_var("x", &Sort::Int)?;
        solver.declare_var("y", &Sort::Int)?;

        // x > 0 && y > 0 && x + y == 10
        let term = Expr::and(vec![
            Expr::var("x").gt(Expr::int(0)),
            Expr::var("y").gt(Expr::int(0)),
            Expr::var("x").add(Expr::var("y")).eq(Expr::int(10)),
        ]);
        solver.assert(&term)?;
        assert_eq!(solver.check_sat()?, SatResult::Sat);
        Ok(())
    }

    #[test]
    fn z3_basic_unsat() -> TestResult {
        let mut solver = Z3Solver::new();

        solver.declare_var("x", &Sort::Int)?;
        let term = Expr::and(vec![
            Expr::var("x").gt(Expr::int(0)),
            Expr::var("x").lt(Expr::int(0)),
        ]);
        solver.assert(&term)?;
        assert_eq!(solver.check_sat()?, SatResult::Unsat);
        Ok(())
    }

    #[test]
    fn z3_model_extraction() -> TestResult {
        let mut solver = Z3Solver::new();

        solver.declare_var("x", &Sort::Int)?;
        solver.assert(&Expr::var("x").eq(Expr::int(42)))?;

        let vars = vec![("x", &Sort::Int)];
        let (result, model) = solver.check_sat_with_model(&vars)?;
        assert_eq!(result, SatResult::Sat);
        let model = model.ok_or_else(|| {
            std::io::Error::other("expected model for SAT result in z3_model_extraction")
        })?;
        assert_eq!(model.get_int("x"), Some(42));
        Ok(())
    }

    #[test]
    fn z3_violation_query_with_primed_state() -> TestResult {
        // Step violation for candidate x >= 0 under transition x! == x + 1:
        // x >= 0 && x! == x + 1 && !(x! >= 0) must be unsatisfiable.
        let mut solver = Z3Solver::new();
        solver.declare_var("x", &Sort::Int)?;
        solver.declare_var("x!", &Sort::Int)?;

        let candidate = Expr::var("x").ge(Expr::int(0));
        let violation = Expr::and(vec![
            candidate.clone(),
            Expr::var("x!").eq(Expr::var("x").add(Expr::int(1))),
            candidate.primed().not(),
        ]);
        solver.assert(&violation)?;
        assert_eq!(solver.check_sat()?, SatResult::Unsat);
        Ok(())
    }

    #[test]
    fn z3_distinct_translation() -> TestResult {
        let mut solver = Z3Solver::new();
        solver.declare_var("x", &Sort::Int)?;
        solver.assert(&Expr::var("x").ne(Expr::var("x")))?;
        assert_eq!(solver.check_sat()?, SatResult::Unsat);
        Ok(())
    }

    #[test]
    fn z3_reset_clears_declarations() -> TestResult {
        let mut solver = Z3Solver::new();
        solver.declare_var("x", &Sort::Int)?;
        solver.assert(&Expr::var("x").eq(Expr::int(1)))?;
        solver.reset()?;

        let err = solver.assert(&Expr::var("x").eq(Expr::int(2)));
        assert!(matches!(err, Err(Z3Error::UnknownVariable(_))));
        Ok(())
    }

    #[test]
    fn z3_rejects_unsorted_formula() {
        let mut solver = Z3Solver::new();
        solver.declare_var("x", &Sort::Int).unwrap();
        // An integer is not a boolean constraint.
        let err = solver.assert(&Expr::var("x").add(Expr::int(1)));
        assert!(matches!(err, Err(Z3Error::Internal(_))));
    }
}

//! Symbolic oracle: obligations discharged as SMT violation queries.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use galago_expr::Expr;
use galago_ice::{CounterExample, ObligationKind};
use galago_smt::backends::smtlib_printer::to_smtlib;
use galago_smt::backends::z3_backend::Z3Solver;
use galago_smt::solver::{SatResult, SmtSolver};
use galago_smt::sorts::Sort;

use crate::config::{ScoringPolicy, SymbolicObligations};
use crate::oracle::{Oracle, OracleError, OracleOutcome};

/// Decides candidates by solving one violation query per obligation.
///
/// Each consultation uses a fresh solver instance, reset between
/// obligations. Every free variable of a violation query is declared as an
/// integer, the candidate language's only program sort.
pub struct SymbolicOracle<'a> {
    obligations: &'a SymbolicObligations,
    policy: ScoringPolicy,
    rng: StdRng,
}

impl<'a> SymbolicOracle<'a> {
    pub fn new(
        obligations: &'a SymbolicObligations,
        policy: ScoringPolicy,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            obligations,
            policy,
            rng,
        }
    }

    /// Canonical obligation order, shuffled under [`ScoringPolicy::Any`].
    fn obligation_order(&mut self) -> [ObligationKind; 3] {
        let mut order = ObligationKind::ALL;
        if self.policy == ScoringPolicy::Any {
            order.shuffle(&mut self.rng);
        }
        order
    }
}

/// Render a violation query as a standalone SMT-LIB script for logs.
fn query_script(vars: &BTreeSet<String>, violation: &Expr) -> String {
    let mut script = String::new();
    for name in vars {
        script.push_str(&format!("(declare-fun {name} () Int)\n"));
    }
    script.push_str(&format!("(assert {})\n(check-sat)\n", to_smtlib(violation)));
    script
}

impl Oracle for SymbolicOracle<'_> {
    fn check(&mut self, candidate: &Expr) -> Result<OracleOutcome, OracleError> {
        let mut solver = Z3Solver::new();
        for kind in self.obligation_order() {
            let violation = self.obligations.violation(kind, candidate);
            let vars = violation.free_vars();
            debug!(obligation = %kind, query = %query_script(&vars, &violation), "violation query");

            solver
                .reset()
                .map_err(|e| OracleError::Solver(e.to_string()))?;
            for name in &vars {
                solver
                    .declare_var(name, &Sort::Int)
                    .map_err(|e| OracleError::Solver(e.to_string()))?;
            }
            solver
                .assert(&violation)
                .map_err(|e| OracleError::Solver(e.to_string()))?;

            let requested: Vec<(&str, &Sort)> =
                vars.iter().map(|name| (name.as_str(), &Sort::Int)).collect();
            let (result, model) = solver
                .check_sat_with_model(&requested)
                .map_err(|e| OracleError::Solver(e.to_string()))?;
            match result {
                SatResult::Sat => {
                    let Some(model) = model else {
                        warn!(obligation = %kind, "solver returned sat without a model");
                        return Err(OracleError::Solver(
                            "sat verdict without a model".to_string(),
                        ));
                    };
                    return Ok(OracleOutcome::Refuted {
                        kind,
                        witness: CounterExample::from_model(kind, &model),
                    });
                }
                SatResult::Unsat => {}
                SatResult::Unknown(reason) => return Err(OracleError::Solver(reason)),
            }
        }
        Ok(OracleOutcome::Verified)
    }
}

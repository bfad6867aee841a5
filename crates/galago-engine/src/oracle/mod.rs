//! Ground-truth oracles for candidate invariants.
//!
//! The reward path consults an oracle only when the replay proxy is
//! inconclusive. Both backends answer the same question: does every proof
//! obligation hold for this candidate, and if not, which one fails and at
//! which witness state?

use thiserror::Error;

use galago_expr::Expr;
use galago_ice::{CounterExample, ObligationKind, TaskId, WitnessParseError};

use crate::config::{EngineOptions, OracleChoice, TaskSpec};
use crate::oracle::report::ReportError;

pub mod report;
pub mod symbolic;
pub mod verifier;

pub use symbolic::SymbolicOracle;
pub use verifier::VerifierOracle;

/// Verdict of one full oracle consultation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    /// Every obligation holds for the candidate.
    Verified,
    /// One obligation fails; `witness` is a state refuting the candidate.
    Refuted {
        kind: ObligationKind,
        witness: CounterExample,
    },
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Verifier process error: {0}")]
    Process(String),
    #[error("Verifier report error: {0}")]
    Report(#[from] ReportError),
    #[error("Witness error: {0}")]
    Witness(#[from] WitnessParseError),
    #[error("task `{task}` carries no templates for the {backend} oracle")]
    MissingTemplates { task: TaskId, backend: OracleChoice },
}

/// The expensive ground truth behind the reward's replay proxy.
pub trait Oracle {
    /// Decide the candidate against every proof obligation.
    fn check(&mut self, candidate: &Expr) -> Result<OracleOutcome, OracleError>;
}

/// Build the oracle selected by `options` for one task.
///
/// `seed` fixes the obligation shuffle of the symbolic backend under the
/// `Any` scoring policy; verdicts do not otherwise depend on it.
pub fn oracle_for_task<'t>(
    options: &EngineOptions,
    task: &'t TaskSpec,
    seed: Option<u64>,
) -> Result<Box<dyn Oracle + 't>, OracleError> {
    match options.oracle {
        OracleChoice::Symbolic => {
            let obligations =
                task.symbolic
                    .as_ref()
                    .ok_or_else(|| OracleError::MissingTemplates {
                        task: task.id.clone(),
                        backend: OracleChoice::Symbolic,
                    })?;
            Ok(Box::new(SymbolicOracle::new(
                obligations,
                options.scoring,
                seed,
            )))
        }
        OracleChoice::Verifier => {
            let templates = task
                .verifier
                .as_ref()
                .ok_or_else(|| OracleError::MissingTemplates {
                    task: task.id.clone(),
                    backend: OracleChoice::Verifier,
                })?;
            Ok(Box::new(VerifierOracle::new(
                options.verifier.clone(),
                templates,
                options.scoring,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SymbolicObligations, VerifierTemplates};

    #[test]
    fn gateway_rejects_tasks_without_backend_templates() {
        let task = TaskSpec::new("bare");
        let mut options = EngineOptions::default();

        let err = match oracle_for_task(&options, &task, None) {
            Ok(_) => panic!("expected a configuration error"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            OracleError::MissingTemplates {
                backend: OracleChoice::Symbolic,
                ..
            }
        ));

        options.oracle = OracleChoice::Verifier;
        let err = match oracle_for_task(&options, &task, None) {
            Ok(_) => panic!("expected a configuration error"),
            Err(err) => err,
        };
        assert!(matches!(
            err,
            OracleError::MissingTemplates {
                backend: OracleChoice::Verifier,
                ..
            }
        ));
    }

    #[test]
    fn gateway_builds_the_selected_backend() {
        let task = TaskSpec::new("full")
            .with_symbolic(SymbolicObligations::new(
                Expr::bool(false),
                Expr::bool(false),
                Expr::bool(false),
            ))
            .with_verifier(VerifierTemplates::default());

        let mut options = EngineOptions::default();
        assert!(oracle_for_task(&options, &task, Some(7)).is_ok());

        options.oracle = OracleChoice::Verifier;
        assert!(oracle_for_task(&options, &task, Some(7)).is_ok());
    }
}

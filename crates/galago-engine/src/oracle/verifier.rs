//! External-verifier oracle: render the obligation programs, run the tool,
//! classify its report.

use std::process::Command;

use tracing::error;

use galago_expr::Expr;
use galago_ice::CounterExample;

use crate::config::{ScoringPolicy, VerifierCommand, VerifierTemplates};
use crate::oracle::report::{self, ReportVerdict};
use crate::oracle::{Oracle, OracleError, OracleOutcome};

/// Decides candidates through one external verifier run per consultation.
///
/// The rendered obligation programs are appended to the command line after
/// the fixed arguments; the verdict is read from the tool's stdout. A
/// launch failure or a non-zero exit is an error, with the rendered inputs
/// logged for postmortem.
pub struct VerifierOracle<'a> {
    command: VerifierCommand,
    templates: &'a VerifierTemplates,
    policy: ScoringPolicy,
}

impl<'a> VerifierOracle<'a> {
    pub fn new(
        command: VerifierCommand,
        templates: &'a VerifierTemplates,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            command,
            templates,
            policy,
        }
    }
}

impl Oracle for VerifierOracle<'_> {
    fn check(&mut self, candidate: &Expr) -> Result<OracleOutcome, OracleError> {
        let programs = self.templates.render_for(candidate, self.policy);
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .args(&programs)
            .output()
            .map_err(|e| {
                error!(program = %self.command.program, "failed to launch verifier: {e}");
                OracleError::Process(format!(
                    "failed to launch `{}`: {e}",
                    self.command.program
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            for program in &programs {
                error!(input = %program, "verifier obligation program");
            }
            return Err(OracleError::Process(format!(
                "`{}` exited with {}: {}",
                self.command.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match report::parse_report(&stdout)? {
            ReportVerdict::AllClear => Ok(OracleOutcome::Verified),
            ReportVerdict::ObligationFailed { kind, witness } => Ok(OracleOutcome::Refuted {
                kind,
                witness: CounterExample::parse_witness(&witness)?,
            }),
        }
    }
}

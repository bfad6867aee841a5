use std::fmt;

use galago_expr::Expr;
use galago_ice::{ObligationKind, TaskId};

pub use galago_ice::ReplayConfig;

/// Which oracle backend answers candidate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OracleChoice {
    /// Discharge obligation-violation queries directly over SMT.
    #[default]
    Symbolic,
    /// Run an external verifier and classify its textual report.
    Verifier,
}

impl fmt::Display for OracleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleChoice::Symbolic => write!(f, "symbolic"),
            OracleChoice::Verifier => write!(f, "verifier"),
        }
    }
}

/// How obligation feedback shapes the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringPolicy {
    /// Obligations are checked in entry, step, exit order; a refutation
    /// overrides the scores downstream of the failing obligation.
    #[default]
    Ordered,
    /// Any single refutation counts alike; obligation order is shuffled.
    Any,
}

/// External verifier invocation: the binary and its fixed leading arguments.
///
/// Rendered obligation programs are appended after `args` on every query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifierCommand {
    pub program: String,
    pub args: Vec<String>,
}

/// Options for a reward session.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub oracle: OracleChoice,
    pub scoring: ScoringPolicy,
    pub replay: ReplayConfig,
    /// Exit the process after the first verified candidate.
    pub stop_on_solution: bool,
    /// Required when `oracle` is [`OracleChoice::Verifier`].
    pub verifier: VerifierCommand,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            oracle: OracleChoice::Symbolic,
            scoring: ScoringPolicy::Ordered,
            replay: ReplayConfig::default(),
            stop_on_solution: false,
            verifier: VerifierCommand::default(),
        }
    }
}

/// Fixed formula parts of one task's three proof obligations.
///
/// The frontend supplies these once per task. `trans` relates the pre-state
/// to the primed (`v!`) post-state; `post` already encodes the negation of
/// the exit goal, so a candidate consistent with it is a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicObligations {
    pub pre: Expr,
    pub trans: Expr,
    pub post: Expr,
}

impl SymbolicObligations {
    pub fn new(pre: Expr, trans: Expr, post: Expr) -> Self {
        Self { pre, trans, post }
    }

    /// The satisfiability query whose models are witnesses against
    /// `candidate`: `pre && !C` for entry, `trans && C && !C'` for the
    /// step (`C'` primes every candidate variable), `post && C` for exit.
    pub fn violation(&self, kind: ObligationKind, candidate: &Expr) -> Expr {
        match kind {
            ObligationKind::Pre => Expr::and(vec![self.pre.clone(), candidate.clone().not()]),
            ObligationKind::Inductive => Expr::and(vec![
                self.trans.clone(),
                candidate.clone(),
                candidate.primed().not(),
            ]),
            ObligationKind::Post => Expr::and(vec![self.post.clone(), candidate.clone()]),
        }
    }
}

/// Program-text fragments for the external verifier.
///
/// A rendered obligation program is `prelude`, then the candidate's infix
/// text, then the obligation's suffix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifierTemplates {
    pub prelude: String,
    pub pre_suffix: String,
    pub inductive_suffix: String,
    pub combined_suffix: String,
}

impl VerifierTemplates {
    /// Splice the candidate into one obligation template.
    pub fn render(&self, candidate: &Expr, suffix: &str) -> String {
        format!("{}{}{}", self.prelude, candidate, suffix)
    }

    /// The programs submitted per query, in submission order: entry, step,
    /// and combined under [`ScoringPolicy::Ordered`]; the combined program
    /// alone under [`ScoringPolicy::Any`].
    pub fn render_for(&self, candidate: &Expr, policy: ScoringPolicy) -> Vec<String> {
        match policy {
            ScoringPolicy::Ordered => vec![
                self.render(candidate, &self.pre_suffix),
                self.render(candidate, &self.inductive_suffix),
                self.render(candidate, &self.combined_suffix),
            ],
            ScoringPolicy::Any => vec![self.render(candidate, &self.combined_suffix)],
        }
    }
}

/// One verification task: its identity plus the obligation templates each
/// oracle backend needs. A backend whose templates are absent cannot serve
/// the task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub id: TaskId,
    pub symbolic: Option<SymbolicObligations>,
    pub verifier: Option<VerifierTemplates>,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            symbolic: None,
            verifier: None,
        }
    }

    pub fn with_symbolic(mut self, obligations: SymbolicObligations) -> Self {
        self.symbolic = Some(obligations);
        self
    }

    pub fn with_verifier(mut self, templates: VerifierTemplates) -> Self {
        self.verifier = Some(templates);
        self
    }
}

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use galago_expr::{holds, Binding, EvalError, Expr, Value};
use galago_smt::solver::Model;

/// Names containing this separator are SSA bookkeeping copies introduced by
/// the frontend and carry no program-state meaning.
const SSA_SEPARATOR: char = '_';

/// Trailing marker on post-state variable names inside inductive witnesses.
const PRIME_MARKER: char = '!';

/// Unbound program variables default to 1 during replay, mirroring the
/// witness convention of the oracles.
const DEFAULT_VALUE: Value = Value::Int(1);

/// The three proof obligations a loop invariant must discharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObligationKind {
    /// Entry: states reachable before the loop must satisfy the invariant.
    Pre,
    /// Step: the invariant must survive one loop iteration.
    Inductive,
    /// Exit: the invariant plus the exit condition must imply the goal.
    Post,
}

impl ObligationKind {
    /// Canonical obligation order.
    pub const ALL: [ObligationKind; 3] =
        [ObligationKind::Pre, ObligationKind::Inductive, ObligationKind::Post];

    /// Witness block marker in verifier output and canonical keys.
    pub fn marker(self) -> &'static str {
        match self {
            ObligationKind::Pre => "T:",
            ObligationKind::Inductive => "I:",
            ObligationKind::Post => "F:",
        }
    }

    /// Position in the canonical obligation order.
    pub fn index(self) -> usize {
        match self {
            ObligationKind::Pre => 0,
            ObligationKind::Inductive => 1,
            ObligationKind::Post => 2,
        }
    }

    /// Diagnostics event name for replayed samples of this obligation.
    pub fn replay_event(self) -> &'static str {
        match self {
            ObligationKind::Pre => "replayed_pre",
            ObligationKind::Inductive => "replayed_inductive",
            ObligationKind::Post => "replayed_post",
        }
    }
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::Pre => write!(f, "pre"),
            ObligationKind::Inductive => write!(f, "inductive"),
            ObligationKind::Post => write!(f, "post"),
        }
    }
}

/// Replay verdict: does a stored witness still refute the candidate?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate handles this witness correctly.
    Good,
    /// The witness still refutes the candidate.
    Bad,
}

impl Verdict {
    pub fn is_good(self) -> bool {
        matches!(self, Verdict::Good)
    }

    fn from_bool(good: bool) -> Self {
        if good {
            Verdict::Good
        } else {
            Verdict::Bad
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Good => write!(f, "good"),
            Verdict::Bad => write!(f, "bad"),
        }
    }
}

/// Errors from parsing witness text blocks out of verifier reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessParseError {
    #[error("witness text has no recognized obligation marker: '{text}'")]
    UnknownMarker { text: String },

    #[error("{kind} witness body must be brace-enclosed: '{body}'")]
    UnbracedBody { kind: ObligationKind, body: String },

    #[error("inductive witness is missing the ';' state separator: '{body}'")]
    MissingStateSeparator { body: String },

    #[error("malformed assignment entry '{entry}'")]
    MalformedEntry { entry: String },

    #[error("unparsable value '{value}' in assignment entry")]
    UnparsableValue { value: String },
}

/// A concrete witness state refuting one proof obligation.
///
/// Identity is the canonical key printed by `Display`: entries sorted by
/// variable name, `T:{x=0,y=1}` for pre, `F:{…}` for post, and
/// `I:{pre;post}` for inductive witnesses with both states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterExample {
    Pre {
        state: BTreeMap<String, Value>,
    },
    Inductive {
        pre: BTreeMap<String, Value>,
        post: BTreeMap<String, Value>,
    },
    Post {
        state: BTreeMap<String, Value>,
    },
}

impl CounterExample {
    pub fn pre(state: BTreeMap<String, Value>) -> Self {
        CounterExample::Pre { state }
    }

    pub fn inductive(pre: BTreeMap<String, Value>, post: BTreeMap<String, Value>) -> Self {
        CounterExample::Inductive { pre, post }
    }

    pub fn post(state: BTreeMap<String, Value>) -> Self {
        CounterExample::Post { state }
    }

    pub fn kind(&self) -> ObligationKind {
        match self {
            CounterExample::Pre { .. } => ObligationKind::Pre,
            CounterExample::Inductive { .. } => ObligationKind::Inductive,
            CounterExample::Post { .. } => ObligationKind::Post,
        }
    }

    /// Build a witness from a solver model.
    ///
    /// SSA bookkeeping names (containing `_`) are dropped. For inductive
    /// witnesses, names ending in `!` land in the post-state map under the
    /// unprimed name.
    pub fn from_model(kind: ObligationKind, model: &Model) -> Self {
        match kind {
            ObligationKind::Pre | ObligationKind::Post => {
                let state: BTreeMap<String, Value> = model
                    .values
                    .iter()
                    .filter(|(name, _)| !name.contains(SSA_SEPARATOR))
                    .map(|(name, value)| (name.clone(), *value))
                    .collect();
                match kind {
                    ObligationKind::Pre => CounterExample::Pre { state },
                    _ => CounterExample::Post { state },
                }
            }
            ObligationKind::Inductive => {
                let mut pre = BTreeMap::new();
                let mut post = BTreeMap::new();
                for (name, value) in &model.values {
                    if name.contains(SSA_SEPARATOR) {
                        continue;
                    }
                    match name.strip_suffix(PRIME_MARKER) {
                        Some(base) => {
                            post.insert(base.to_string(), *value);
                        }
                        None => {
                            pre.insert(name.clone(), *value);
                        }
                    }
                }
                CounterExample::Inductive { pre, post }
            }
        }
    }

    /// Parse a witness text block such as `T:{x=0,y=1}` or `I:{x=0;x=1}`.
    pub fn parse_witness(text: &str) -> Result<Self, WitnessParseError> {
        let text = text.trim();
        for kind in ObligationKind::ALL {
            if let Some(body) = text.strip_prefix(kind.marker()) {
                return Self::parse_body(kind, body);
            }
        }
        Err(WitnessParseError::UnknownMarker {
            text: text.to_string(),
        })
    }

    fn parse_body(kind: ObligationKind, body: &str) -> Result<Self, WitnessParseError> {
        let inner = body
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| WitnessParseError::UnbracedBody {
                kind,
                body: body.to_string(),
            })?;
        match kind {
            ObligationKind::Pre => Ok(CounterExample::Pre {
                state: Self::parse_state(inner)?,
            }),
            ObligationKind::Post => Ok(CounterExample::Post {
                state: Self::parse_state(inner)?,
            }),
            ObligationKind::Inductive => {
                let (first, second) = inner.split_once(';').ok_or_else(|| {
                    WitnessParseError::MissingStateSeparator {
                        body: inner.to_string(),
                    }
                })?;
                Ok(CounterExample::Inductive {
                    pre: Self::parse_state(first)?,
                    post: Self::parse_state(second)?,
                })
            }
        }
    }

    fn parse_state(text: &str) -> Result<BTreeMap<String, Value>, WitnessParseError> {
        let mut state = BTreeMap::new();
        if text.trim().is_empty() {
            return Ok(state);
        }
        for entry in text.split(',') {
            let (name, value) =
                entry
                    .split_once('=')
                    .ok_or_else(|| WitnessParseError::MalformedEntry {
                        entry: entry.to_string(),
                    })?;
            let value = value.trim();
            let parsed = match value {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => value
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| WitnessParseError::UnparsableValue {
                        value: value.to_string(),
                    })?,
            };
            state.insert(name.trim().to_string(), parsed);
        }
        Ok(state)
    }

    /// Canonical dedup key, also the `Display` rendering.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Does the candidate handle this witness correctly?
    ///
    /// Pre witnesses must satisfy the candidate; post witnesses must falsify
    /// it; inductive witnesses are handled when the candidate is false on the
    /// pre-state or true on both states. Unbound variables read as 1.
    pub fn check(&self, candidate: &Expr) -> Result<Verdict, EvalError> {
        match self {
            CounterExample::Pre { state } => {
                Ok(Verdict::from_bool(holds(candidate, &binding(state))?))
            }
            CounterExample::Post { state } => {
                Ok(Verdict::from_bool(!holds(candidate, &binding(state))?))
            }
            CounterExample::Inductive { pre, post } => {
                if !holds(candidate, &binding(pre))? {
                    return Ok(Verdict::Good);
                }
                Ok(Verdict::from_bool(holds(candidate, &binding(post))?))
            }
        }
    }
}

fn binding(state: &BTreeMap<String, Value>) -> Binding {
    Binding::from_values(state.clone()).with_default(DEFAULT_VALUE)
}

fn fmt_state(f: &mut fmt::Formatter<'_>, state: &BTreeMap<String, Value>) -> fmt::Result {
    for (i, (name, value)) in state.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{name}={value}")?;
    }
    Ok(())
}

impl fmt::Display for CounterExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.kind().marker())?;
        match self {
            CounterExample::Pre { state } | CounterExample::Post { state } => {
                fmt_state(f, state)?;
            }
            CounterExample::Inductive { pre, post } => {
                fmt_state(f, pre)?;
                write!(f, ";")?;
                fmt_state(f, post)?;
            }
        }
        write!(f, "}}")
    }
}

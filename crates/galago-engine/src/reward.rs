//! Two-tier candidate reward: replay proxy first, oracle fallback second.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use galago_expr::{EvalError, Expr};
use galago_ice::{CounterexampleStore, DiagnosticsRegistry, ObligationKind, TaskId};

use crate::config::{EngineOptions, ScoringPolicy, TaskSpec};
use crate::oracle::{oracle_for_task, Oracle, OracleOutcome};

/// Diagnostics event recorded on every reward computation.
pub const REWARD_QUERIES_EVENT: &str = "reward_queries";

/// Diagnostics event recorded on every oracle consultation.
pub const ORACLE_QUERIES_EVENT: &str = "oracle_queries";

/// Base reward for an oracle-verified candidate.
const VERIFIED_BASE: f64 = 3.0;

/// Base reward for a refuted candidate, and the fast-path floor.
const REFUTED_BASE: f64 = -3.0;

/// Fast-path scale applied to the proxy score sum.
const FAST_PATH_SCALE: f64 = 0.49;

/// Resident witnesses required before the fast path may fire.
const FAST_PATH_MIN_OBSERVED: usize = 5;

/// Per-obligation share of the fast-path score threshold.
const NEAR_PERFECT_SCORE: f64 = 0.99;

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] crate::oracle::OracleError),
    #[error("Replay evaluation error: {0}")]
    Replay(#[from] EvalError),
}

/// Per-session reward state: the options, one counterexample store per
/// task, the diagnostics registry, and the rng chain seeding each oracle.
pub struct RewardSession {
    options: EngineOptions,
    stores: IndexMap<TaskId, CounterexampleStore>,
    stats: DiagnosticsRegistry,
    rng: StdRng,
}

impl RewardSession {
    pub fn new(options: EngineOptions) -> Self {
        let rng = match options.replay.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            options,
            stores: IndexMap::new(),
            stats: DiagnosticsRegistry::new(),
            rng,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The task's counterexample store, once a reward has touched it.
    pub fn store(&self, task: &TaskId) -> Option<&CounterexampleStore> {
        self.stores.get(task)
    }

    pub fn diagnostics(&self) -> &DiagnosticsRegistry {
        &self.stats
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticsRegistry {
        &mut self.stats
    }

    /// Score a candidate with the oracle configured for the task.
    pub fn compute_reward(
        &mut self,
        task: &TaskSpec,
        candidate: &Expr,
    ) -> Result<f64, RewardError> {
        let seed = self.rng.gen();
        let mut oracle = oracle_for_task(&self.options, task, Some(seed))?;
        self.compute_reward_with(task, candidate, oracle.as_mut())
    }

    /// Score a candidate with an injected oracle.
    ///
    /// The replay proxy runs first: once enough witnesses are resident and
    /// the candidate scores clearly below perfect, the shaped negative
    /// reward is returned without consulting the oracle at all. Otherwise
    /// the oracle decides. A verified candidate earns the positive base
    /// plus the proxy sum; a refuted one earns the negative base plus the
    /// overridden scores, and its witness joins the task's store.
    pub fn compute_reward_with(
        &mut self,
        task: &TaskSpec,
        candidate: &Expr,
        oracle: &mut dyn Oracle,
    ) -> Result<f64, RewardError> {
        self.stats.add(&task.id, REWARD_QUERIES_EVENT, 1);

        let replay = self.options.replay;
        let store = self
            .stores
            .entry(task.id.clone())
            .or_insert_with(|| CounterexampleStore::new(replay));

        let mut scores = [0.0f64; 3];
        let mut observed = 0usize;
        let mut threshold = 0.0f64;
        for kind in ObligationKind::ALL {
            scores[kind.index()] = store.evaluate(kind, candidate, &task.id, &mut self.stats)?;
            if store.has_memory(kind) {
                observed += store.resident(kind);
                threshold += NEAR_PERFECT_SCORE;
            }
        }

        let proxy_sum: f64 = scores.iter().sum();
        if observed > FAST_PATH_MIN_OBSERVED && proxy_sum < threshold {
            return Ok(REFUTED_BASE + proxy_sum * FAST_PATH_SCALE);
        }

        self.stats.add(&task.id, ORACLE_QUERIES_EVENT, 1);
        let reward = match oracle.check(candidate)? {
            OracleOutcome::Verified => VERIFIED_BASE + proxy_sum,
            OracleOutcome::Refuted { kind, witness } => {
                scores[kind.index()] /= 2.0;
                if self.options.scoring == ScoringPolicy::Ordered {
                    apply_ordered_overrides(&mut scores, kind);
                }
                store.record(witness);
                REFUTED_BASE + scores.iter().sum::<f64>()
            }
        };

        if reward > 0.0 {
            info!(task = %task.id, candidate = %candidate, reward, "verified invariant");
            self.stats.report_once(&task.id);
            if self.options.stop_on_solution {
                std::process::exit(0);
            }
        }
        Ok(reward)
    }
}

/// A refutation under ordered scoring pins the scores around the failing
/// obligation: obligations checked after it were never reached (zero),
/// obligations checked before it already held (one).
fn apply_ordered_overrides(scores: &mut [f64; 3], failed: ObligationKind) {
    match failed {
        ObligationKind::Pre => {
            scores[ObligationKind::Inductive.index()] = 0.0;
            scores[ObligationKind::Post.index()] = 0.0;
        }
        ObligationKind::Inductive => {
            scores[ObligationKind::Pre.index()] = 1.0;
            scores[ObligationKind::Post.index()] = 0.0;
        }
        ObligationKind::Post => {
            scores[ObligationKind::Pre.index()] = 1.0;
            scores[ObligationKind::Inductive.index()] = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_overrides_pin_surrounding_scores() {
        let mut scores = [0.5, 0.5, 0.5];
        apply_ordered_overrides(&mut scores, ObligationKind::Pre);
        assert_eq!(scores, [0.5, 0.0, 0.0]);

        let mut scores = [0.5, 0.5, 0.5];
        apply_ordered_overrides(&mut scores, ObligationKind::Inductive);
        assert_eq!(scores, [1.0, 0.5, 0.0]);

        let mut scores = [0.5, 0.5, 0.5];
        apply_ordered_overrides(&mut scores, ObligationKind::Post);
        assert_eq!(scores, [1.0, 1.0, 0.5]);
    }

    #[test]
    fn fast_path_rewards_stay_negative() {
        // The largest proxy sum still below the threshold.
        let sum = 3.0 * NEAR_PERFECT_SCORE;
        assert!(REFUTED_BASE + sum * FAST_PATH_SCALE < 0.0);
    }
}

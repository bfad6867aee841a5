use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use galago_expr::{EvalError, Expr};

use crate::counterexample::{CounterExample, ObligationKind};
use crate::diagnostics::{DiagnosticsRegistry, TaskId};
use crate::replay::ReplayMemory;

/// Replay memory knobs, shared by every per-task store in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Slots per obligation kind.
    pub capacity: usize,
    /// Witnesses sampled per proxy evaluation.
    pub batch: usize,
    /// When false, proxy scores are pinned to 1.0 and nothing is replayed.
    pub enabled: bool,
    /// Seed for sampling; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            batch: 10,
            enabled: true,
            seed: None,
        }
    }
}

/// Counterexample memories for a single task, one per obligation kind.
///
/// Memories are created lazily on first record; an obligation with no
/// recorded witnesses scores 0.0 so unexplored candidates still reach the
/// oracle.
#[derive(Debug)]
pub struct CounterexampleStore {
    config: ReplayConfig,
    memories: IndexMap<ObligationKind, ReplayMemory>,
    rng: StdRng,
}

impl CounterexampleStore {
    pub fn new(config: ReplayConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            memories: IndexMap::new(),
            rng,
        }
    }

    /// Record an oracle witness. Returns `false` for resident duplicates.
    pub fn record(&mut self, ce: CounterExample) -> bool {
        let capacity = self.config.capacity;
        self.memories
            .entry(ce.kind())
            .or_insert_with(|| ReplayMemory::new(capacity))
            .insert(ce)
    }

    /// Proxy score for one obligation: the fraction of a sampled batch the
    /// candidate handles correctly.
    ///
    /// Returns 1.0 when replay is disabled and 0.0 when the obligation has
    /// no memory yet. Records the batch size under the task's diagnostics.
    pub fn evaluate(
        &mut self,
        kind: ObligationKind,
        candidate: &Expr,
        task: &TaskId,
        stats: &mut DiagnosticsRegistry,
    ) -> Result<f64, EvalError> {
        if !self.config.enabled {
            return Ok(1.0);
        }
        let Some(memory) = self.memories.get(&kind) else {
            return Ok(0.0);
        };
        let samples = memory.sample(self.config.batch, &mut self.rng);
        stats.add(task, kind.replay_event(), samples.len() as u64);
        let mut good = 0usize;
        for ce in &samples {
            if ce.check(candidate)?.is_good() {
                good += 1;
            }
        }
        Ok(good as f64 / samples.len() as f64)
    }

    /// Log the verdict of every sampled witness for one obligation.
    ///
    /// Output only; replay memories are not mutated.
    pub fn evaluate_detail(
        &mut self,
        kind: ObligationKind,
        candidate: &Expr,
    ) -> Result<(), EvalError> {
        let Some(memory) = self.memories.get(&kind) else {
            debug!(obligation = %kind, "no replay memory");
            return Ok(());
        };
        let samples = memory.sample(self.config.batch, &mut self.rng);
        for ce in samples {
            let verdict = ce.check(candidate)?;
            debug!(obligation = %kind, witness = %ce, %verdict, "replay detail");
        }
        Ok(())
    }

    /// Total good verdicts across a fresh batch per populated obligation.
    ///
    /// Diagnostic aggregate; the reward path never consults it.
    pub fn good_count(&mut self, candidate: &Expr) -> Result<usize, EvalError> {
        let mut good = 0usize;
        for kind in ObligationKind::ALL {
            let Some(memory) = self.memories.get(&kind) else {
                continue;
            };
            for ce in memory.sample(self.config.batch, &mut self.rng) {
                if ce.check(candidate)?.is_good() {
                    good += 1;
                }
            }
        }
        Ok(good)
    }

    pub fn has_memory(&self, kind: ObligationKind) -> bool {
        self.memories.contains_key(&kind)
    }

    /// Resident witnesses for one obligation.
    pub fn resident(&self, kind: ObligationKind) -> usize {
        self.memories.get(&kind).map_or(0, ReplayMemory::len)
    }

    /// Resident witnesses across all obligations.
    pub fn total_resident(&self) -> usize {
        self.memories.values().map(ReplayMemory::len).sum()
    }
}

//! Per-task event counters and one-shot diagnostic reports.
//!
//! Everything is owned by the session that creates the registry; nothing is
//! global. Counters use insertion-ordered maps so reports render in the
//! order events first occurred.

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

/// Opaque task identity supplied by the caller driving the learning loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        TaskId(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        TaskId(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counter snapshot for one task, stamped with session wall-clock time.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub task: TaskId,
    pub elapsed_ms: u128,
    pub counters: IndexMap<String, u64>,
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task {} after {}ms:", self.task, self.elapsed_ms)?;
        for (event, count) in &self.counters {
            write!(f, " {event}={count}")?;
        }
        Ok(())
    }
}

/// Session-scoped event counters keyed by task.
pub struct DiagnosticsRegistry {
    counters: IndexMap<TaskId, IndexMap<String, u64>>,
    reported: HashSet<TaskId>,
    started: Instant,
}

impl DiagnosticsRegistry {
    pub fn new() -> Self {
        Self {
            counters: IndexMap::new(),
            reported: HashSet::new(),
            started: Instant::now(),
        }
    }

    /// Bump a named counter for a task.
    pub fn add(&mut self, task: &TaskId, event: &str, delta: u64) {
        *self
            .counters
            .entry(task.clone())
            .or_default()
            .entry(event.to_string())
            .or_insert(0) += delta;
    }

    /// Current counters for a task (empty if none recorded).
    pub fn snapshot(&self, task: &TaskId) -> IndexMap<String, u64> {
        self.counters.get(task).cloned().unwrap_or_default()
    }

    /// Emit and return the task's counter snapshot.
    pub fn report(&self, task: &TaskId) -> DiagnosticsReport {
        let report = DiagnosticsReport {
            task: task.clone(),
            elapsed_ms: self.started.elapsed().as_millis(),
            counters: self.snapshot(task),
        };
        let counters_json = serde_json::to_string(&report.counters).unwrap_or_default();
        info!(
            task = %report.task,
            elapsed_ms = report.elapsed_ms as u64,
            counters = %counters_json,
            "task diagnostics"
        );
        report
    }

    /// Emit the task's snapshot the first time only.
    pub fn report_once(&mut self, task: &TaskId) -> Option<DiagnosticsReport> {
        if !self.reported.insert(task.clone()) {
            return None;
        }
        Some(self.report(task))
    }

    /// Emit and return counters aggregated across every task.
    pub fn report_global(&self) -> IndexMap<String, u64> {
        let mut totals: IndexMap<String, u64> = IndexMap::new();
        for task_counters in self.counters.values() {
            for (event, count) in task_counters {
                *totals.entry(event.clone()).or_insert(0) += count;
            }
        }
        let counters_json = serde_json::to_string(&totals).unwrap_or_default();
        info!(
            tasks = self.counters.len(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            counters = %counters_json,
            "session diagnostics"
        );
        totals
    }
}

impl Default for DiagnosticsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

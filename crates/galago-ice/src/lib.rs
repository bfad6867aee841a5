#![doc = include_str!("../README.md")]

//! Counterexample feedback for candidate loop invariants.
//!
//! Oracles produce witness states that refute one of the three proof
//! obligations; this crate stores them, replays them against later
//! candidates, and keeps per-task diagnostics for the reward engine.

pub mod counterexample;
pub mod diagnostics;
pub mod replay;
pub mod store;

pub use counterexample::{CounterExample, ObligationKind, Verdict, WitnessParseError};
pub use diagnostics::{DiagnosticsRegistry, DiagnosticsReport, TaskId};
pub use replay::ReplayMemory;
pub use store::{CounterexampleStore, ReplayConfig};

#![doc = include_str!("../README.md")]

//! Reward engine for candidate loop invariants.
//!
//! This crate ties the other galago crates together: task configuration,
//! the oracle seam with its symbolic and external-verifier backends, the
//! verifier report classifier, and the two-tier reward session.

pub mod config;
pub mod oracle;
pub mod reward;

pub use config::{
    EngineOptions, OracleChoice, ReplayConfig, ScoringPolicy, SymbolicObligations, TaskSpec,
    VerifierCommand, VerifierTemplates,
};
pub use oracle::{oracle_for_task, Oracle, OracleError, OracleOutcome};
pub use reward::{RewardError, RewardSession};

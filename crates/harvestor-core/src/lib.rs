//! Core types and error definitions for the Harvestor fleet scheduler.
//!
//! This crate provides the foundational types shared across all Harvestor
//! crates: the fleet/target snapshot model, the operation command stream,
//! and unified error handling.
//!
//! # Main types
//!
//! - [`HarvestorError`] — Unified error enum for all Harvestor subsystems.
//! - [`HarvestorResult`] — Convenience alias for `Result<T, HarvestorError>`.
//! - [`WorkerAgent`] — A worker's capacity as read from the fleet snapshot.
//! - [`Target`] — A target's instability/yield state and duration estimates.
//! - [`OpKind`] — The three remote operation kinds (extract, fortify, amplify).
//! - [`Command`] — One entry of a planned command stream.
//! - [`OperationRequirement`] — The four-count tuple a batch must satisfy.

/// Snapshot, command, and requirement types.
pub mod types;

pub use types::{
    Command, OpCommand, OpKind, OperationRequirement, Target, WorkerAgent,
    INSTABILITY_PER_AMPLIFY, INSTABILITY_PER_EXTRACT, STABILITY_PER_FORTIFY,
};

// --- Error types ---

/// Top-level error type for the Harvestor scheduler.
///
/// Structured variants carry the offending quantity so callers can react
/// (shrink the extract dial, wait for capacity) instead of parsing strings.
#[derive(Debug, thiserror::Error)]
pub enum HarvestorError {
    /// The requested extract count makes the growth multiplier undefined
    /// (`requested * fraction >= 1` would drain the target below zero).
    /// Recoverable: the caller must reduce the dial.
    #[error("extract dial {requested} at yield fraction {fraction} would drain the target below zero")]
    Domain {
        /// The extract count that was asked for.
        requested: u64,
        /// The target's per-unit extract yield fraction.
        fraction: f64,
    },

    /// The fleet cannot fit even one full batch this cycle.
    #[error("fleet cannot fit a full batch: {required} units required, {free} free")]
    Infeasible {
        /// Total units one batch requires.
        required: u64,
        /// Total free units across the fleet.
        free: u64,
    },

    /// A snapshot collaborator failed to produce fresh fleet or target state.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`HarvestorError`].
pub type HarvestorResult<T> = Result<T, HarvestorError>;

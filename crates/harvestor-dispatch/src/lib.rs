//! Dispatch loop and collaborator interfaces for the Harvestor scheduler.
//!
//! One logical control task cycles between Planning (read fresh snapshots,
//! compute the cycle's requirement and command stream) and Draining (emit
//! the stream fire-and-forget with rate-limited batch submission), then
//! sleeps past the cycle's dominant duration and replans.
//!
//! # Main types
//!
//! - [`DispatchEngine`] — The planning/draining loop.
//! - [`EngineConfig`] / [`TimingConfig`] — Dial and cadence tunables.
//! - [`FleetSource`] / [`TargetSource`] / [`Dispatcher`] — Collaborator
//!   interfaces the loop consumes.
//! - [`CycleMonitor`] — Per-run counters and last-cycle record.

/// The planning/draining loop.
pub mod engine;
/// Cycle counters and snapshots.
pub mod monitor;
/// Collaborator interfaces for snapshots and dispatch.
pub mod sources;

pub use engine::{DispatchEngine, EngineConfig, TimingConfig};
pub use monitor::{CycleMonitor, CycleRecord, CycleStats};
pub use sources::{Dispatcher, FleetSource, TargetSource};

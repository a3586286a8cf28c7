//! Deterministic planning core for the Harvestor fleet scheduler.
//!
//! Everything in this crate is synchronous, pure computation over its
//! inputs: identical inputs always produce identical plans. Placement is
//! order-dependent by design, so none of it may be parallelized internally.
//!
//! # Main types
//!
//! - [`requirement_for`] — Converts the extract dial into the four-count
//!   batch requirement, bounding the target's instability.
//! - [`pack_batch`] — Places one whole requirement across worker capacity,
//!   or refuses as a unit.
//! - [`plan_cycle`] — Repeats packing against the remaining fleet capacity
//!   to fill a planning cycle.
//! - [`Durations`] — Per-kind duration estimates and start-delay alignment.
//! - [`GrowthModel`] — Collaborator interface for the yield-growth formula.

/// Cycle-level planning: repeated packing until capacity runs out.
pub mod cycle;
/// Single-batch placement across worker capacity.
pub mod packer;
/// Requirement calculation from the extract dial.
pub mod requirement;
/// Duration estimates and completion-alignment delays.
pub mod timing;

pub use cycle::{plan_cycle, CyclePlan};
pub use packer::{pack_batch, Allocation, Shortfall};
pub use requirement::{requirement_for, CompoundGrowth, GrowthModel};
pub use timing::Durations;

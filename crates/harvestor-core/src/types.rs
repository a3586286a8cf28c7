use serde::{Deserialize, Serialize};

use crate::{HarvestorError, HarvestorResult};

/// Instability added to a target per Extract unit.
pub const INSTABILITY_PER_EXTRACT: f64 = 0.002;
/// Instability added to a target per Amplify unit.
pub const INSTABILITY_PER_AMPLIFY: f64 = 0.004;
/// Instability removed from a target per Fortify unit.
pub const STABILITY_PER_FORTIFY: f64 = 0.05;

/// The three remote operation kinds the scheduler dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Drains the target's yield, raises its instability.
    Extract,
    /// Lowers the target's instability.
    Fortify,
    /// Raises the target's yield ceiling, raises its instability.
    Amplify,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Extract => write!(f, "extract"),
            OpKind::Fortify => write!(f, "fortify"),
            OpKind::Amplify => write!(f, "amplify"),
        }
    }
}

/// A worker's capacity as read from the fleet snapshot.
///
/// Read fresh every planning cycle; the scheduler never mutates a worker,
/// it tracks committed units in a cycle-local map instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerAgent {
    /// Worker identity, opaque to the scheduler.
    pub id: String,
    /// Total concurrency units this worker can run.
    pub capacity: u64,
    /// Core count. Influences Amplify efficiency on the worker side; the
    /// planner does not model it further.
    #[serde(default = "default_cores")]
    pub cores: u32,
}

fn default_cores() -> u32 {
    1
}

impl WorkerAgent {
    /// Creates a single-core worker with the given capacity.
    pub fn new(id: impl Into<String>, capacity: u64) -> Self {
        Self {
            id: id.into(),
            capacity,
            cores: 1,
        }
    }
}

/// A target's live state, re-read at every planning cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Target identity, opaque to the scheduler.
    pub id: String,
    /// Current instability.
    pub instability: f64,
    /// Floor the instability can never go below.
    pub min_instability: f64,
    /// Current yield.
    pub yield_current: f64,
    /// Yield ceiling.
    pub yield_max: f64,
    /// Fraction of current yield drained by one Extract unit.
    pub extract_fraction: f64,
    /// Estimated Extract duration, milliseconds. Varies cycle to cycle.
    pub extract_ms: u64,
    /// Estimated Fortify duration, milliseconds.
    pub fortify_ms: u64,
    /// Estimated Amplify duration, milliseconds.
    pub amplify_ms: u64,
}

impl Target {
    /// Checks the snapshot invariants: `min_instability <= instability` and
    /// `yield_current <= yield_max`.
    pub fn validate(&self) -> HarvestorResult<()> {
        if self.instability < self.min_instability {
            return Err(HarvestorError::Snapshot(format!(
                "target {}: instability {} below minimum {}",
                self.id, self.instability, self.min_instability
            )));
        }
        if self.yield_current > self.yield_max {
            return Err(HarvestorError::Snapshot(format!(
                "target {}: yield {} above ceiling {}",
                self.id, self.yield_current, self.yield_max
            )));
        }
        Ok(())
    }
}

/// The four operation counts one batch must fully satisfy.
///
/// The two fortify counts are derived, never chosen: they are exactly the
/// units needed to cancel the instability the extract and amplify groups add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequirement {
    /// Primary dial: Extract units per batch.
    pub extract: u64,
    /// Fortify units cancelling the Extract group's instability.
    pub fortify_for_extract: u64,
    /// Amplify units restoring the yield the Extract group drains.
    pub amplify: u64,
    /// Fortify units cancelling the Amplify group's instability.
    pub fortify_for_amplify: u64,
}

impl OperationRequirement {
    /// Total units one batch occupies across the fleet.
    pub fn total(&self) -> u64 {
        self.extract + self.fortify_for_extract + self.amplify + self.fortify_for_amplify
    }

    /// True when there is nothing to schedule.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One dispatchable operation: which worker runs what, how wide, and how
/// long to hold before starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpCommand {
    /// Worker the operation runs on.
    pub worker_id: String,
    /// Operation kind.
    pub kind: OpKind,
    /// Concurrency units consumed on the worker.
    pub units: u64,
    /// Hold before start so the operation completes at the batch's
    /// coordinated instant.
    pub start_delay_ms: u64,
}

/// One entry of a planned command stream.
///
/// `CycleBreak` is a synthetic marker, not an operation: it tells the
/// dispatch loop a whole batch has been emitted and submission may pause
/// for rate limiting. It never carries units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// A real operation to dispatch.
    Op(OpCommand),
    /// End-of-batch marker for submission rate limiting.
    CycleBreak,
}

impl Command {
    /// The units this command consumes on its worker (0 for `CycleBreak`).
    pub fn units(&self) -> u64 {
        match self {
            Command::Op(op) => op.units,
            Command::CycleBreak => 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_agent_defaults() {
        let worker = WorkerAgent::new("w1", 32);
        assert_eq!(worker.capacity, 32);
        assert_eq!(worker.cores, 1);
    }

    #[test]
    fn test_worker_agent_cores_default_on_deserialize() {
        let worker: WorkerAgent = serde_json::from_str(r#"{"id":"w1","capacity":8}"#).unwrap();
        assert_eq!(worker.cores, 1);
    }

    #[test]
    fn test_target_validate_ok() {
        let target = sample_target();
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_target_validate_instability_below_minimum() {
        let mut target = sample_target();
        target.instability = 0.5;
        target.min_instability = 1.0;
        assert!(target.validate().is_err());
    }

    #[test]
    fn test_target_validate_yield_above_ceiling() {
        let mut target = sample_target();
        target.yield_current = 2e9;
        assert!(target.validate().is_err());
    }

    #[test]
    fn test_requirement_total_and_empty() {
        let req = OperationRequirement {
            extract: 21,
            fortify_for_extract: 1,
            amplify: 60,
            fortify_for_amplify: 5,
        };
        assert_eq!(req.total(), 87);
        assert!(!req.is_empty());

        let zero = OperationRequirement {
            extract: 0,
            fortify_for_extract: 0,
            amplify: 0,
            fortify_for_amplify: 0,
        };
        assert!(zero.is_empty());
    }

    #[test]
    fn test_command_units() {
        let op = Command::Op(OpCommand {
            worker_id: "w1".into(),
            kind: OpKind::Extract,
            units: 4,
            start_delay_ms: 0,
        });
        assert_eq!(op.units(), 4);
        assert_eq!(Command::CycleBreak.units(), 0);
    }

    #[test]
    fn test_command_serialization_is_tagged() {
        let op = Command::Op(OpCommand {
            worker_id: "w1".into(),
            kind: OpKind::Amplify,
            units: 2,
            start_delay_ms: 150,
        });
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""type":"op""#));
        assert!(json.contains(r#""kind":"amplify""#));

        let brk = serde_json::to_string(&Command::CycleBreak).unwrap();
        assert!(brk.contains("cycle_break"));

        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn test_op_kind_display() {
        assert_eq!(OpKind::Extract.to_string(), "extract");
        assert_eq!(OpKind::Fortify.to_string(), "fortify");
        assert_eq!(OpKind::Amplify.to_string(), "amplify");
    }

    fn sample_target() -> Target {
        Target {
            id: "alpha".into(),
            instability: 5.0,
            min_instability: 1.0,
            yield_current: 1e9,
            yield_max: 1e9,
            extract_fraction: 0.002,
            extract_ms: 100,
            fortify_ms: 400,
            amplify_ms: 250,
        }
    }
}

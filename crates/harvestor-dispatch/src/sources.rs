use async_trait::async_trait;
use harvestor_core::{HarvestorResult, OpKind, Target, WorkerAgent};

/// Produces the fleet capacity snapshot at this instant.
///
/// Called once per planning cycle; implementations should return fresh
/// state, not a cached view, since committed capacity from prior cycles is
/// deliberately not tracked across cycles.
#[async_trait]
pub trait FleetSource: Send + Sync {
    /// Reads the current worker list.
    async fn read_workers(&self) -> HarvestorResult<Vec<WorkerAgent>>;
}

/// Produces the target's live instability/yield/duration state.
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// Reads the target identified by `id`.
    async fn read_target(&self, id: &str) -> HarvestorResult<Target>;
}

/// The remote execution primitive: start one operation on a worker.
///
/// Fire-and-forget. The loop observes no return value and never awaits
/// operation completion; implementations swallow and report their own
/// transport failures.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Requests `units` of `kind` on `worker_id`, held for `start_delay_ms`
    /// before starting.
    async fn dispatch(&self, worker_id: &str, kind: OpKind, units: u64, start_delay_ms: u64);
}

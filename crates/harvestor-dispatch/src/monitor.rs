use chrono::{DateTime, Utc};
use harvestor_planner::CyclePlan;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// What one completed cycle looked like.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    /// Cycle identity, for correlating log lines.
    pub id: Uuid,
    /// When the cycle finished draining.
    pub at: DateTime<Utc>,
    /// Batches the cycle committed.
    pub batches: u64,
    /// Operation commands the cycle dispatched.
    pub commands: u64,
}

/// Counters accumulated over a run of the dispatch loop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleStats {
    /// Cycles completed (including infeasible ones).
    pub cycles: u64,
    /// Whole batches committed across all cycles.
    pub batches: u64,
    /// Operation commands dispatched across all cycles.
    pub commands: u64,
    /// Capacity units committed across all cycles.
    pub units: u64,
    /// Cycles that could not fit a single batch.
    pub infeasible_cycles: u64,
    /// The most recent cycle, if any completed yet.
    pub last_cycle: Option<CycleRecord>,
}

/// Tracks dispatch-loop activity for logging and inspection.
///
/// Purely observational: the scheduler never reads it back into planning
/// decisions.
pub struct CycleMonitor {
    stats: Arc<RwLock<CycleStats>>,
}

impl CycleMonitor {
    /// Creates a monitor with zeroed counters.
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(CycleStats::default())),
        }
    }

    /// Folds one drained cycle into the counters.
    pub async fn record_cycle(&self, id: Uuid, plan: &CyclePlan) {
        let op_commands = plan.commands.iter().filter(|c| c.units() > 0).count() as u64;
        let units: u64 = plan.commands.iter().map(|c| c.units()).sum();

        let mut stats = self.stats.write().await;
        stats.cycles += 1;
        stats.batches += plan.batches;
        stats.commands += op_commands;
        stats.units += units;
        if plan.batches == 0 {
            stats.infeasible_cycles += 1;
        }
        stats.last_cycle = Some(CycleRecord {
            id,
            at: Utc::now(),
            batches: plan.batches,
            commands: op_commands,
        });
    }

    /// Snapshot of the counters.
    pub async fn snapshot(&self) -> CycleStats {
        self.stats.read().await.clone()
    }

    /// JSON projection of the counters (status output).
    pub async fn to_json(&self) -> serde_json::Value {
        let stats = self.snapshot().await;
        serde_json::json!({ "dispatch": stats })
    }
}

impl Default for CycleMonitor {
    fn default() -> Self {
        Self::new()
    }
}

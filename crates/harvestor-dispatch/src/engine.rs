use std::sync::Arc;
use std::time::Duration;

use harvestor_core::{Command, HarvestorResult};
use harvestor_planner::{plan_cycle, requirement_for, CyclePlan, Durations, GrowthModel};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::monitor::CycleMonitor;
use crate::sources::{Dispatcher, FleetSource, TargetSource};

/// Cadence tunables for the dispatch loop.
///
/// The margins absorb scheduling jitter between cycles; their defaults
/// match observed fleet behavior but none of them is load-bearing for
/// correctness.
#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    /// Subtracted from the dominant duration when deriving how many batches
    /// may launch this cycle, so every batch lands before the next cycle's
    /// dispatch could overlap it.
    pub safety_margin_ms: u64,
    /// Added to the dominant duration for the end-of-cycle sleep.
    pub settle_margin_ms: u64,
    /// Pause inserted between submission slices while draining.
    pub slice_ms: u64,
    /// Batches launched per slice before the pause.
    pub batches_per_slice: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            safety_margin_ms: 1000,
            settle_margin_ms: 1000,
            slice_ms: 1,
            batches_per_slice: 1,
        }
    }
}

/// The operator-facing dial plus cadence tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target the loop schedules against.
    pub target_id: String,
    /// Extract units per batch. The primary dial.
    pub extract_per_batch: u64,
    /// Cadence tunables.
    pub timing: TimingConfig,
}

/// The dispatch loop: alternating planning and draining until stopped.
///
/// Holds no scheduling state across cycles. Every cycle re-reads the fleet
/// and target snapshots, recomputes the requirement and timings, plans the
/// command stream, and emits it fire-and-forget.
pub struct DispatchEngine {
    config: EngineConfig,
    fleet: Arc<dyn FleetSource>,
    targets: Arc<dyn TargetSource>,
    dispatcher: Arc<dyn Dispatcher>,
    growth: Arc<dyn GrowthModel>,
    monitor: Arc<CycleMonitor>,
}

impl DispatchEngine {
    /// Wires the loop to its collaborators.
    pub fn new(
        config: EngineConfig,
        fleet: Arc<dyn FleetSource>,
        targets: Arc<dyn TargetSource>,
        dispatcher: Arc<dyn Dispatcher>,
        growth: Arc<dyn GrowthModel>,
    ) -> Self {
        Self {
            config,
            fleet,
            targets,
            dispatcher,
            growth,
            monitor: Arc::new(CycleMonitor::new()),
        }
    }

    /// The loop's activity counters.
    pub fn monitor(&self) -> &Arc<CycleMonitor> {
        &self.monitor
    }

    /// Runs cycles until the stop channel flips true (or its sender drops).
    ///
    /// The stop signal is observed cooperatively: at cycle boundaries and
    /// during the settle sleep, never mid-drain.
    ///
    /// # Errors
    ///
    /// Propagates [`HarvestorError::Domain`] (the dial must shrink; the
    /// loop never silently clamps it) and [`HarvestorError::Snapshot`]
    /// (collaborator I/O failed; no retry within the cycle).
    ///
    /// [`HarvestorError::Domain`]: harvestor_core::HarvestorError::Domain
    /// [`HarvestorError::Snapshot`]: harvestor_core::HarvestorError::Snapshot
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> HarvestorResult<()> {
        if self.config.extract_per_batch == 0 {
            info!(target = %self.config.target_id, "extract dial is zero, nothing to schedule");
            return Ok(());
        }

        info!(
            target = %self.config.target_id,
            extract_per_batch = self.config.extract_per_batch,
            "dispatch loop starting"
        );

        loop {
            if *stop.borrow() {
                info!("stop observed, dispatch loop exiting");
                return Ok(());
            }

            let cycle_id = Uuid::new_v4();
            let (plan, durations) = self.plan_phase(cycle_id).await?;
            self.drain_phase(&plan).await;
            self.monitor.record_cycle(cycle_id, &plan).await;

            let settle = durations.dominant_ms() + self.config.timing.settle_margin_ms;
            debug!(cycle = %cycle_id, settle_ms = settle, "cycle drained, settling");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(settle)) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        info!("stop observed during settle, dispatch loop exiting");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Planning: fresh snapshots in, command stream out.
    async fn plan_phase(&self, cycle_id: Uuid) -> HarvestorResult<(CyclePlan, Durations)> {
        let target = self.targets.read_target(&self.config.target_id).await?;
        target.validate()?;
        let workers = self.fleet.read_workers().await?;

        let requirement =
            requirement_for(&target, self.config.extract_per_batch, self.growth.as_ref())?;
        let durations = Durations::of_target(&target);
        let batches_max = durations
            .dominant_ms()
            .saturating_sub(self.config.timing.safety_margin_ms);

        let plan = plan_cycle(&workers, &requirement, batches_max, &durations);

        if plan.batches == 0 {
            // Not fatal: capacity may free up by the next cycle.
            warn!(
                cycle = %cycle_id,
                required = requirement.total(),
                workers = workers.len(),
                "no batch fits free capacity this cycle"
            );
        } else {
            info!(
                cycle = %cycle_id,
                batches = plan.batches,
                commands = plan.commands.len(),
                dominant_ms = durations.dominant_ms(),
                "cycle planned"
            );
        }

        Ok((plan, durations))
    }

    /// Draining: emit the stream, pausing a slice after every
    /// `batches_per_slice` cycle-break markers so completions spread
    /// instead of bursting.
    async fn drain_phase(&self, plan: &CyclePlan) {
        let timing = self.config.timing;
        let mut launched_in_slice = 0u64;

        for command in &plan.commands {
            match command {
                Command::Op(op) => {
                    self.dispatcher
                        .dispatch(&op.worker_id, op.kind, op.units, op.start_delay_ms)
                        .await;
                }
                Command::CycleBreak => {
                    launched_in_slice += 1;
                    if launched_in_slice >= timing.batches_per_slice {
                        launched_in_slice = 0;
                        tokio::time::sleep(Duration::from_millis(timing.slice_ms)).await;
                    }
                }
            }
        }
    }
}

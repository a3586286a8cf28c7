use std::collections::HashMap;

use harvestor_core::{Command, OperationRequirement, WorkerAgent};
use serde::Serialize;

use crate::packer::{pack_batch, Shortfall};
use crate::timing::Durations;

/// The planned command stream for one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CyclePlan {
    /// Concatenated command stream of every committed batch, in dispatch
    /// order.
    pub commands: Vec<Command>,
    /// Whole batches placed. Zero means the fleet could not fit one.
    pub batches: u64,
    /// The shortfall that halted packing, if capacity (not `batches_max`)
    /// was the limit.
    pub shortfall: Option<Shortfall>,
}

/// Fills the cycle with as many whole batches as the fleet holds, up to
/// `batches_max`.
///
/// Each attempt packs the same requirement against the capacity the
/// previous attempts left: on success the consumed units merge into the
/// running committed map and the commands append to the stream; the first
/// shortfall stops the loop outright, a smaller tuple is never retried.
pub fn plan_cycle(
    workers: &[WorkerAgent],
    requirement: &OperationRequirement,
    batches_max: u64,
    durations: &Durations,
) -> CyclePlan {
    let mut commands = Vec::new();
    let mut batches = 0;
    let mut shortfall = None;

    // An empty requirement packs trivially forever; there is nothing to
    // schedule, so the plan stays empty.
    if requirement.is_empty() {
        return CyclePlan {
            commands,
            batches,
            shortfall,
        };
    }

    let mut committed: HashMap<String, u64> = HashMap::new();
    for _ in 0..batches_max {
        match pack_batch(workers, &committed, requirement, durations) {
            Ok(allocation) => {
                for (worker_id, units) in &allocation.consumed {
                    *committed.entry(worker_id.clone()).or_default() += units;
                }
                commands.extend(allocation.commands);
                batches += 1;
            }
            Err(missing) => {
                shortfall = Some(missing);
                break;
            }
        }
    }

    CyclePlan {
        commands,
        batches,
        shortfall,
    }
}

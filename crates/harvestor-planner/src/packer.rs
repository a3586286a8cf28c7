use std::collections::HashMap;

use harvestor_core::{Command, OpCommand, OpKind, OperationRequirement, WorkerAgent};
use serde::Serialize;

use crate::timing::Durations;

/// A fully-placed batch: the ordered command stream and the units it
/// consumed per worker.
///
/// Lives for one packing attempt. The cycle scheduler either commits it
/// whole (merging `consumed` into its running map) or discards it whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Commands in dispatch order, terminated by [`Command::CycleBreak`].
    pub commands: Vec<Command>,
    /// Units consumed per worker id.
    pub consumed: HashMap<String, u64>,
}

/// Per-group units left unplaced when an attempt does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    /// Extract units that found no capacity.
    pub extract: u64,
    /// Fortify-for-Extract units that found no capacity.
    pub fortify_for_extract: u64,
    /// Amplify units that found no capacity.
    pub amplify: u64,
    /// Fortify-for-Amplify units that found no capacity.
    pub fortify_for_amplify: u64,
}

impl Shortfall {
    /// Total unplaced units across the four groups.
    pub fn total(&self) -> u64 {
        self.extract + self.fortify_for_extract + self.amplify + self.fortify_for_amplify
    }
}

/// Worker iteration order for one placement group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillOrder {
    Ascending,
    Descending,
}

/// Places one whole requirement across the fleet's free capacity, or
/// refuses as a unit.
///
/// Placement policy: Extract fills worker-order ascending so the
/// revenue-bearing group co-locates at the head of the list; the three
/// overhead groups (Fortify-for-Extract, Amplify, Fortify-for-Amplify) fill
/// descending, landing on the workers the Extract fill left untouched.
/// Free capacity is `capacity - committed[id]`, so repeated calls with a
/// growing committed map drain the same pool.
///
/// Pure relative to its inputs: identical inputs produce identical
/// allocations. On success the final command is always a
/// [`Command::CycleBreak`]; on shortfall no partial command list escapes.
pub fn pack_batch(
    workers: &[WorkerAgent],
    committed: &HashMap<String, u64>,
    requirement: &OperationRequirement,
    durations: &Durations,
) -> Result<Allocation, Shortfall> {
    let free: Vec<u64> = workers
        .iter()
        .map(|w| {
            w.capacity
                .saturating_sub(committed.get(&w.id).copied().unwrap_or(0))
        })
        .collect();

    let (extract_fill, free, extract_left) =
        place_group(free, FillOrder::Ascending, requirement.extract);
    let (fortify_extract_fill, free, fortify_extract_left) =
        place_group(free, FillOrder::Descending, requirement.fortify_for_extract);
    let (amplify_fill, free, amplify_left) =
        place_group(free, FillOrder::Descending, requirement.amplify);
    let (fortify_amplify_fill, _free, fortify_amplify_left) =
        place_group(free, FillOrder::Descending, requirement.fortify_for_amplify);

    if extract_left + fortify_extract_left + amplify_left + fortify_amplify_left > 0 {
        return Err(Shortfall {
            extract: extract_left,
            fortify_for_extract: fortify_extract_left,
            amplify: amplify_left,
            fortify_for_amplify: fortify_amplify_left,
        });
    }

    let groups = [
        (extract_fill, OpKind::Extract),
        (fortify_extract_fill, OpKind::Fortify),
        (amplify_fill, OpKind::Amplify),
        (fortify_amplify_fill, OpKind::Fortify),
    ];

    let mut commands = Vec::new();
    let mut consumed: HashMap<String, u64> = HashMap::new();
    for (fill, kind) in groups {
        for (index, units) in fill {
            let worker = &workers[index];
            *consumed.entry(worker.id.clone()).or_default() += units;
            commands.push(Command::Op(OpCommand {
                worker_id: worker.id.clone(),
                kind,
                units,
                start_delay_ms: durations.start_delay_ms(kind),
            }));
        }
    }
    commands.push(Command::CycleBreak);

    Ok(Allocation { commands, consumed })
}

/// Pure placement step for one group: walks workers in `order`, assigns
/// `min(remaining, free)` to each, and returns the placements, the free
/// capacity left behind, and the group's unplaced remainder.
fn place_group(
    free: Vec<u64>,
    order: FillOrder,
    count: u64,
) -> (Vec<(usize, u64)>, Vec<u64>, u64) {
    let mut free = free;
    let mut remaining = count;
    let mut placements = Vec::new();

    let indices: Vec<usize> = match order {
        FillOrder::Ascending => (0..free.len()).collect(),
        FillOrder::Descending => (0..free.len()).rev().collect(),
    };

    for index in indices {
        if remaining == 0 {
            break;
        }
        let units = remaining.min(free[index]);
        if units == 0 {
            continue;
        }
        remaining -= units;
        free[index] -= units;
        placements.push((index, units));
    }

    (placements, free, remaining)
}

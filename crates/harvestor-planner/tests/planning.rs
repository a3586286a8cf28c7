//! End-to-end planning test: dial → requirement → packed cycle.
//!
//! Exercises the reference scenario: a 21-unit extract dial against a
//! two-worker fleet whose combined capacity exactly matches one batch.

use std::collections::HashMap;

use harvestor_core::{Command, OpKind, OperationRequirement, Target, WorkerAgent};
use harvestor_planner::{pack_batch, plan_cycle, requirement_for, Durations, GrowthModel};

/// Growth model answering a fixed unit count, like a tabulated formula
/// collaborator would for a single target state.
struct TabulatedGrowth(f64);

impl GrowthModel for TabulatedGrowth {
    fn amplify_units(&self, _target: &Target, _growth: f64) -> f64 {
        self.0
    }
}

fn reference_target() -> Target {
    Target {
        id: "alpha".into(),
        instability: 5.0,
        min_instability: 1.0,
        yield_current: 9.0e8,
        yield_max: 1.0e9,
        extract_fraction: 0.002,
        extract_ms: 100,
        fortify_ms: 400,
        amplify_ms: 250,
    }
}

fn reference_requirement() -> OperationRequirement {
    let target = reference_target();
    requirement_for(&target, 21, &TabulatedGrowth(59.2)).expect("dial is in-domain")
}

#[test]
fn reference_requirement_tuple() {
    let req = reference_requirement();
    assert_eq!(req.extract, 21);
    assert_eq!(req.fortify_for_extract, 1);
    assert_eq!(req.amplify, 60);
    assert_eq!(req.fortify_for_amplify, 5);
    assert_eq!(req.total(), 87);
}

#[test]
fn single_worker_fleet_refuses_the_batch() {
    let fleet = vec![WorkerAgent::new("S1", 21)];
    let durations = Durations::of_target(&reference_target());
    let result = pack_batch(&fleet, &HashMap::new(), &reference_requirement(), &durations);
    assert!(result.is_err(), "21 units cannot hold an 87-unit batch");
}

#[test]
fn two_worker_fleet_packs_the_batch_exactly() {
    let fleet = vec![WorkerAgent::new("S1", 21), WorkerAgent::new("S2", 66)];
    let durations = Durations::of_target(&reference_target());
    let plan = plan_cycle(&fleet, &reference_requirement(), 1, &durations);

    assert_eq!(plan.batches, 1);
    assert_eq!(plan.commands.last(), Some(&Command::CycleBreak));

    // Extract co-locates on S1; the 66 overhead units land S2-first.
    let mut per_worker_extract: HashMap<&str, u64> = HashMap::new();
    let mut overhead_first_target = None;
    for cmd in &plan.commands {
        if let Command::Op(op) = cmd {
            if op.kind == OpKind::Extract {
                *per_worker_extract.entry(op.worker_id.as_str()).or_default() += op.units;
            } else if overhead_first_target.is_none() {
                overhead_first_target = Some(op.worker_id.clone());
            }
        }
    }
    assert_eq!(per_worker_extract["S1"], 21);
    assert_eq!(per_worker_extract.len(), 1);
    assert_eq!(overhead_first_target.as_deref(), Some("S2"));

    // Completion alignment: every operation finishes at the dominant
    // 400 ms instant.
    for cmd in &plan.commands {
        if let Command::Op(op) = cmd {
            let duration = match op.kind {
                OpKind::Extract => 100,
                OpKind::Fortify => 400,
                OpKind::Amplify => 250,
            };
            assert_eq!(op.start_delay_ms + duration, 400);
        }
    }

    // A second batch cannot fit the drained fleet.
    let follow_up = plan_cycle(&fleet, &reference_requirement(), 2, &durations);
    assert_eq!(follow_up.batches, 1);
    assert!(follow_up.shortfall.is_some());
}

#[test]
fn plans_are_reproducible() {
    let fleet = vec![WorkerAgent::new("S1", 21), WorkerAgent::new("S2", 66)];
    let durations = Durations::of_target(&reference_target());
    let first = plan_cycle(&fleet, &reference_requirement(), 3, &durations);
    let second = plan_cycle(&fleet, &reference_requirement(), 3, &durations);
    assert_eq!(first.commands, second.commands);
    assert_eq!(first.batches, second.batches);
}

/*!
 * Allocation Invariant Property Tests
 * Random operation sequences must preserve conservation and status rules
 */

use deadlock_sim::resolution::Snapshot;
use deadlock_sim::{Process, ProcessState, Resource, System};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;

const PROCESSES: u32 = 4;
const RESOURCES: u32 = 3;

#[derive(Debug, Clone)]
enum Op {
    Request { pid: u32, rid: u32, instances: u32 },
    Release { pid: u32, rid: u32, instances: Option<u32> },
    Terminate { pid: u32 },
    Step,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=PROCESSES, 1..=RESOURCES, 0..=3u32)
            .prop_map(|(pid, rid, instances)| Op::Request { pid, rid, instances }),
        3 => (1..=PROCESSES, 1..=RESOURCES, option::of(0..=3u32))
            .prop_map(|(pid, rid, instances)| Op::Release { pid, rid, instances }),
        1 => (1..=PROCESSES).prop_map(|pid| Op::Terminate { pid }),
        2 => Just(Op::Step),
    ]
}

fn capacities_strategy() -> impl Strategy<Value = Vec<u32>> {
    vec(1..=3u32, RESOURCES as usize)
}

fn build(capacities: &[u32]) -> System {
    let mut system = System::new();
    for pid in 1..=PROCESSES {
        system.add_process(Process::new(pid)).unwrap();
    }
    for (index, &instances) in capacities.iter().enumerate() {
        let rid = index as u32 + 1;
        system.add_resource(Resource::new(rid, instances).unwrap()).unwrap();
    }
    system
}

/// Misuse is rejected with an error and must leave the state untouched,
/// so errors are ignored here and the invariants checked regardless
fn apply(system: &mut System, op: &Op) {
    match *op {
        Op::Request { pid, rid, instances } => {
            let _ = system.request(pid, rid, instances);
        }
        Op::Release { pid, rid, instances } => {
            let _ = system.release(pid, rid, instances);
        }
        Op::Terminate { pid } => {
            let _ = system.terminate(pid);
        }
        Op::Step => {
            system.step();
        }
    }
}

fn assert_invariants(system: &System) -> Result<(), TestCaseError> {
    prop_assert_eq!(system.check_conservation(), Ok(()));

    for process in system.processes() {
        let pending = !process.pending_requests().is_empty();
        match process.status() {
            ProcessState::Running => prop_assert!(!pending),
            ProcessState::Waiting => prop_assert!(pending),
            ProcessState::Terminated => {
                prop_assert!(!pending);
                prop_assert!(system.resources_held(process.pid()).is_empty());
            }
        }
    }

    for resource in system.resources() {
        prop_assert!(resource.available_instances() <= resource.total_instances());
        prop_assert!(resource.allocated_to().values().all(|&n| n > 0));
    }
    prop_assert_eq!(system.check_integrity(), Ok(()));
    Ok(())
}

proptest! {
    #[test]
    fn prop_invariants_hold_after_every_operation(
        capacities in capacities_strategy(),
        ops in vec(op_strategy(), 0..60),
    ) {
        let mut system = build(&capacities);
        for op in &ops {
            apply(&mut system, op);
            assert_invariants(&system)?;
        }
    }

    #[test]
    fn prop_failed_operations_leave_state_unchanged(
        capacities in capacities_strategy(),
        ops in vec(op_strategy(), 0..40),
    ) {
        let mut system = build(&capacities);
        for op in &ops {
            let before = system.clone();
            let failed = match *op {
                Op::Request { pid, rid, instances } => system.request(pid, rid, instances).is_err(),
                Op::Release { pid, rid, instances } => system.release(pid, rid, instances).is_err(),
                _ => {
                    apply(&mut system, op);
                    false
                }
            };
            if failed {
                prop_assert_eq!(&system, &before);
            }
        }
    }

    #[test]
    fn prop_snapshot_round_trip_is_identical(
        capacities in capacities_strategy(),
        ops in vec(op_strategy(), 0..40),
    ) {
        let mut system = build(&capacities);
        for op in &ops {
            apply(&mut system, op);
        }

        let snapshot = Snapshot::capture(&system);
        prop_assert_eq!(snapshot.restore().unwrap(), system);
    }
}

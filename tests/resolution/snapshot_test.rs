/*!
 * Snapshot Tests
 * Capture and restore through the resolver
 */

use deadlock_sim::scenarios;
use deadlock_sim::{
    AllocationError, DeadlockResolver, ProcessState, ResolutionError, Snapshot, Strategy,
};
use pretty_assertions::assert_eq;

#[test]
fn test_restore_right_after_take_is_identity() {
    let mut system = scenarios::complex_allocation().unwrap();
    let original = system.clone();
    let mut resolver = DeadlockResolver::new(&mut system);

    let snapshot = resolver.take_snapshot();
    resolver.restore_snapshot(&snapshot).unwrap();

    assert_eq!(resolver.system(), &original);
}

#[test]
fn test_restore_undoes_a_resolution() {
    let mut system = scenarios::simple_deadlock().unwrap();
    system.step();
    let original = system.clone();
    let mut resolver = DeadlockResolver::new(&mut system);

    let snapshot = resolver.take_snapshot();
    resolver.resolve(Strategy::Termination, false).unwrap();
    assert_eq!(resolver.system().status_counts().terminated, 1);

    resolver.restore_snapshot(&snapshot).unwrap();

    assert_eq!(resolver.system(), &original);
    assert_eq!(resolver.system().time(), 1);
    assert!(resolver.detector().detect_via_rag().deadlocked);
}

#[test]
fn test_snapshot_is_not_aliased() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    let snapshot = resolver.take_snapshot();
    let captured = snapshot.clone();
    resolver.resolve(Strategy::Rollback, false).unwrap();

    assert_eq!(snapshot, captured);
    assert_eq!(snapshot.processes[&1].status, ProcessState::Waiting);
    assert_eq!(snapshot.processes[&2].status, ProcessState::Waiting);
}

#[test]
fn test_snapshot_contents() {
    let system = scenarios::simple_deadlock().unwrap();
    let snapshot = Snapshot::capture(&system);

    let p1 = &snapshot.processes[&1];
    assert_eq!(p1.resources_held, vec![1]);
    assert_eq!(p1.resources_requested.keys().copied().collect::<Vec<_>>(), vec![2]);

    let r1 = &snapshot.resources[&1];
    assert_eq!(r1.total_instances, 1);
    assert_eq!(r1.available_instances, 0);
    assert_eq!(r1.allocated_to.get(&1), Some(&1));
}

#[test]
fn test_snapshot_json_round_trip() {
    let system = scenarios::dining_philosophers(3).unwrap();
    let snapshot = Snapshot::capture(&system);

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: Snapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.restore().unwrap(), system);
}

#[test]
fn test_waiting_process_without_requests_is_rejected() {
    let json = r#"{
        "processes": {"1": {"status": "waiting"}},
        "resources": {"1": {"total_instances": 1, "available_instances": 1}},
        "time": 0
    }"#;
    let corrupt: Snapshot = serde_json::from_str(json).unwrap();

    let mut system = scenarios::simple_deadlock().unwrap();
    let original = system.clone();
    let mut resolver = DeadlockResolver::new(&mut system);

    let err = resolver.restore_snapshot(&corrupt).unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::Allocation(AllocationError::InconsistentState(_))
    ));
    assert_eq!(resolver.system(), &original);
}

#[test]
fn test_unbalanced_resource_is_rejected() {
    let json = r#"{
        "processes": {"1": {"status": "running"}},
        "resources": {"1": {
            "total_instances": 2,
            "available_instances": 2,
            "allocated_to": {"1": 1}
        }},
        "time": 3
    }"#;
    let corrupt: Snapshot = serde_json::from_str(json).unwrap();

    assert!(matches!(
        corrupt.restore(),
        Err(AllocationError::InconsistentState(_))
    ));
}

#[test]
fn test_dangling_holder_is_rejected() {
    let json = r#"{
        "processes": {},
        "resources": {"1": {
            "total_instances": 1,
            "available_instances": 0,
            "allocated_to": {"8": 1}
        }},
        "time": 0
    }"#;
    let corrupt: Snapshot = serde_json::from_str(json).unwrap();

    assert_eq!(corrupt.restore(), Err(AllocationError::UnknownProcess(8)));
}

/*!
 * Safety Check Tests
 * Heuristic banker-style scan and its agreement with RAG detection
 */

use deadlock_sim::detection::SafetyMatrices;
use deadlock_sim::scenarios;
use deadlock_sim::{DeadlockDetector, Process, Resource, System};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

#[test]
fn test_simple_deadlock_is_unsafe() {
    let system = scenarios::simple_deadlock().unwrap();
    let report = DeadlockDetector::new(&system).detect_via_safety_check();

    assert!(report.deadlocked);
    assert_eq!(report.processes, vec![1, 2]);
    assert_eq!(report.waiting, vec![1, 2]);
    assert!(report.safe_sequence.is_empty());
}

#[test]
fn test_heuristic_overreports_fully_allocated_system() {
    // Every instance is allocated and the synthesized need is at least one
    // instance of every resource a process does not hold, so nobody fits
    let system = scenarios::no_deadlock().unwrap();
    let analysis = DeadlockDetector::new(&system).analyze();

    assert!(!analysis.rag.deadlocked);
    assert!(analysis.safety.deadlocked);
    assert_eq!(analysis.safety.processes, vec![1, 2, 3]);
    assert!(analysis.safety.waiting.is_empty());
    assert!(!analysis.consensus);
    assert!(!analysis.deadlocked());
}

#[test]
fn test_matrices_follow_allocation_and_pending_requests() {
    let system = scenarios::simple_deadlock().unwrap();
    let matrices = SafetyMatrices::from_system(&system);

    assert_eq!(matrices.processes, vec![1, 2]);
    assert_eq!(matrices.resources, vec![1, 2]);
    assert_eq!(matrices.available, vec![0, 0]);
    assert_eq!(matrices.allocation, vec![vec![1, 0], vec![0, 1]]);
    assert_eq!(matrices.need, vec![vec![0, 1], vec![1, 0]]);
}

#[test]
fn test_unfinished_set_differs_from_waiting_set() {
    // P4 is RUNNING but still cannot finish, so it is reported as
    // unfinished without appearing in the waiting set
    let mut system = scenarios::simple_deadlock().unwrap();
    system.add_process(Process::new(3)).unwrap();
    system.add_process(Process::new(4)).unwrap();
    system.add_resource(Resource::single(3)).unwrap();
    system.request(3, 1, 1).unwrap();
    system.request(4, 3, 1).unwrap();

    let report = DeadlockDetector::new(&system).detect_via_safety_check();

    assert!(report.deadlocked);
    assert_eq!(report.processes, vec![1, 2, 3, 4]);
    assert_eq!(report.waiting, vec![1, 2, 3]);
    assert!(report.safe_sequence.is_empty());
}

#[test]
fn test_waiting_process_can_still_be_safe() {
    let mut system = System::new();
    system.add_process(Process::new(1)).unwrap();
    system.add_process(Process::new(2)).unwrap();
    system.add_resource(Resource::single(1)).unwrap();
    system.request(1, 1, 1).unwrap();
    system.request(2, 1, 1).unwrap();

    let report = DeadlockDetector::new(&system).detect_via_safety_check();
    assert!(report.is_safe());
    assert_eq!(report.safe_sequence, vec![1, 2]);
}

#[test]
fn test_detectors_agree_on_deadlocked_scenarios() {
    let cases = [
        ("simple", scenarios::simple_deadlock().unwrap()),
        ("chain", scenarios::chain_deadlock().unwrap()),
        ("philosophers", scenarios::dining_philosophers(5).unwrap()),
        ("complex", scenarios::complex_allocation().unwrap()),
    ];

    for (name, system) in cases {
        let analysis = DeadlockDetector::new(&system).analyze();
        assert!(analysis.consensus, "{}", name);
        assert!(analysis.deadlocked(), "{}", name);
        assert!(analysis.safety.deadlocked, "{}", name);

        // Every process on the cycle is one the scan could not finish
        let unfinished: BTreeSet<_> = analysis.safety.processes.iter().copied().collect();
        assert!(analysis.rag.process_set().is_subset(&unfinished), "{}", name);
    }
}

#[test]
fn test_terminated_processes_are_ignored() {
    let mut system = scenarios::simple_deadlock().unwrap();
    system.terminate(2).unwrap();

    let report = DeadlockDetector::new(&system).detect_via_safety_check();
    assert!(report.is_safe());
    assert_eq!(report.safe_sequence, vec![1]);
}

/*!
 * Deadlock Resolver Tests
 * Strategy effects, victim selection and verification
 */

use deadlock_sim::scenarios;
use deadlock_sim::{
    DeadlockDetector, DeadlockResolver, ProcessState, ResolutionAction, ResolutionError,
    ResolverConfig, Strategy, VerificationFailure,
};
use pretty_assertions::assert_eq;

#[test]
fn test_termination_resolves_two_process_cycle() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    let outcome = resolver.resolve(Strategy::Termination, false).unwrap();

    assert!(outcome.resolved);
    let victim = outcome.action.victim().unwrap();
    assert!(victim == 1 || victim == 2);
    assert_eq!(
        resolver.system().process(victim).unwrap().status(),
        ProcessState::Terminated
    );

    let detection = resolver.detector().detect_via_rag();
    assert!(!detection.deadlocked);
    assert!(detection.processes.is_empty());
}

#[test]
fn test_preemption_result_matches_redetection() {
    let mut system = scenarios::chain_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    let outcome = resolver.resolve(Strategy::Preemption, false).unwrap();
    let after = resolver.detector().detect_via_rag();

    assert_eq!(outcome.resolved, !after.deadlocked);
    match outcome.action {
        ResolutionAction::Preempted { pid, rid, instances } => {
            assert_eq!(instances, 1);
            assert!(!resolver.system().resources_held(pid).contains(&rid));
            // The victim keeps waiting for what it asked for
            assert_eq!(
                resolver.system().process(pid).unwrap().status(),
                ProcessState::Waiting
            );
        }
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_preemption_keeps_other_holdings() {
    let mut system = scenarios::complex_allocation().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    // P1 holds R1 and R2; exactly one of them is taken
    let outcome = resolver.apply(Strategy::Preemption, &[1], false).unwrap();

    let ResolutionAction::Preempted { pid, rid, .. } = outcome.action else {
        panic!("unexpected action {:?}", outcome.action);
    };
    assert_eq!(pid, 1);
    let held = resolver.system().resources_held(1);
    assert_eq!(held.len(), 1);
    assert!(!held.contains(&rid));
    assert_eq!(outcome.resolved, !resolver.detector().detect_via_rag().deadlocked);
}

#[test]
fn test_rollback_restarts_victim() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let config = ResolverConfig::default().with_priority_based(true);
    let mut resolver = DeadlockResolver::with_config(&mut system, config);

    let outcome = resolver.resolve(Strategy::Rollback, true).unwrap();

    // Both hold one resource, so the first candidate wins the tie
    assert_eq!(
        outcome.action,
        ResolutionAction::RolledBack {
            pid: 1,
            released: 1
        }
    );
    assert!(outcome.resolved);

    let victim = resolver.system().process(1).unwrap();
    assert_eq!(victim.status(), ProcessState::Running);
    assert!(victim.pending_requests().is_empty());
    assert!(resolver.system().resources_held(1).is_empty());
}

#[test]
fn test_resolve_records_history() {
    let mut system = scenarios::chain_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    resolver.resolve(Strategy::Termination, true).unwrap();
    resolver.resolve(Strategy::Termination, true).unwrap();

    let history = resolver.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].strategy, Strategy::Termination);
    assert_eq!(history[0].deadlocked_processes, vec![1, 2, 3]);
    assert_eq!(history[0].time, 0);

    resolver.clear_history();
    assert!(resolver.history().is_empty());
}

#[test]
fn test_unknown_strategy_name() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let before = system.clone();
    let mut resolver = DeadlockResolver::new(&mut system);

    let result = resolver.resolve_named("kill-all", false);

    assert_eq!(
        result,
        Err(ResolutionError::UnknownStrategy("kill-all".to_string()))
    );
    assert!(resolver.history().is_empty());
    assert_eq!(resolver.system(), &before);
}

#[test]
fn test_named_strategy_resolves() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    let outcome = resolver.resolve_named("Termination", false).unwrap();
    assert_eq!(outcome.strategy, Strategy::Termination);
    assert!(outcome.resolved);
}

#[test]
fn test_apply_with_no_candidates_reports_current_state() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);

    let outcome = resolver.apply(Strategy::Termination, &[], false).unwrap();

    assert_eq!(outcome.action, ResolutionAction::NoVictim);
    assert!(!outcome.resolved);
}

#[test]
fn test_verification_after_termination_and_step() {
    let mut system = scenarios::simple_deadlock().unwrap();
    let mut resolver = DeadlockResolver::new(&mut system);
    resolver.resolve(Strategy::Termination, false).unwrap();

    // The survivor still waits until the freed instance is granted
    assert!(matches!(
        resolver.verify_resolution(),
        Err(ResolutionError::Verification(
            VerificationFailure::ProcessWaiting { .. }
        ))
    ));

    drop(resolver);
    system.step();
    let resolver = DeadlockResolver::new(&mut system);
    assert_eq!(resolver.verify_resolution(), Ok(()));
}

#[test]
fn test_verification_reports_remaining_cycle() {
    let mut system = scenarios::dining_philosophers(4).unwrap();
    let resolver = DeadlockResolver::new(&mut system);

    assert_eq!(
        resolver.verify_resolution(),
        Err(ResolutionError::Verification(
            VerificationFailure::CycleRemains {
                processes: vec![1, 2, 3, 4]
            }
        ))
    );
}

#[test]
fn test_termination_breaks_every_philosopher_cycle() {
    for n in [3, 5, 7] {
        let mut system = scenarios::dining_philosophers(n).unwrap();
        let mut resolver = DeadlockResolver::new(&mut system);

        let outcome = resolver.resolve(Strategy::Termination, false).unwrap();
        assert!(outcome.resolved, "{} philosophers", n);
        drop(resolver);

        assert!(!DeadlockDetector::new(&system).detect_via_rag().deadlocked);
        assert_eq!(system.status_counts().terminated, 1);
    }
}

/*!
 * Deadlock Simulator Library
 *
 * Single-threaded model of processes competing for multi-instance
 * resources, with:
 * - Resource-allocation-graph cycle detection
 * - A heuristic banker-style safety check
 * - Victim-based recovery (termination, preemption, rollback)
 * - Snapshots for replaying strategies from one starting state
 */

pub mod core;
pub mod detection;
pub mod monitoring;
pub mod process;
pub mod resolution;
pub mod scenarios;
pub mod simulation;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::types::{Instances, Pid, Rid, Tick};
pub use detection::{DeadlockDetector, Detection, DetectionAnalysis, SafetyReport};
pub use monitoring::{init_tracing, span_phase};
pub use process::{Grant, Process, ProcessState, Resource, StatusCounts, System};
pub use resolution::{
    DeadlockResolver, ResolutionAction, ResolutionOutcome, ResolverConfig, Snapshot, Strategy,
    TrialReport,
};
pub use scenarios::Scenario;
pub use simulation::{Simulation, SimulationConfig, StepRecord};

/*!
 * Deadlock Detector
 * Read-only analysis over a borrowed system
 */

use super::graph::{RagEdge, ResourceAllocationGraph};
use super::safety::SafetyMatrices;
use crate::core::serde::is_empty_vec;
use crate::core::types::Pid;
use crate::process::System;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// RAG detection verdict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub deadlocked: bool,
    /// Processes on the cycle, sorted and deduplicated
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub processes: Vec<Pid>,
    /// The cycle that was found, for diagnostics
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub cycle: Vec<RagEdge>,
}

impl Detection {
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_deadlocked(&self) -> bool {
        self.deadlocked
    }

    pub fn process_set(&self) -> BTreeSet<Pid> {
        self.processes.iter().copied().collect()
    }
}

/// Safety-check verdict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub deadlocked: bool,
    /// Processes the scan could not finish
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub processes: Vec<Pid>,
    /// Processes in WAITING state at call time
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub waiting: Vec<Pid>,
    /// Completion order found by the scan
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub safe_sequence: Vec<Pid>,
}

impl SafetyReport {
    #[inline]
    pub fn is_safe(&self) -> bool {
        !self.deadlocked
    }
}

/// Both detectors side by side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionAnalysis {
    pub rag: Detection,
    pub safety: SafetyReport,
    /// Whether both detectors reached the same verdict
    pub consensus: bool,
}

impl DetectionAnalysis {
    /// RAG is the primary verdict
    pub fn deadlocked(&self) -> bool {
        self.rag.deadlocked
    }
}

/// Deadlock detector over a borrowed system
///
/// Holds no state of its own; every call reflects the system as it stands.
#[derive(Debug, Clone, Copy)]
pub struct DeadlockDetector<'a> {
    system: &'a System,
}

impl<'a> DeadlockDetector<'a> {
    pub fn new(system: &'a System) -> Self {
        Self { system }
    }

    pub fn graph(&self) -> ResourceAllocationGraph {
        ResourceAllocationGraph::from_system(self.system)
    }

    /// Detect a deadlock by searching the allocation graph for a cycle
    #[instrument(level = "debug", skip(self))]
    pub fn detect_via_rag(&self) -> Detection {
        let Some(cycle) = self.graph().find_cycle() else {
            debug!("no cycle in resource allocation graph");
            return Detection::none();
        };

        let processes: Vec<Pid> = cycle
            .iter()
            .flat_map(|edge| [edge.from.as_process(), edge.to.as_process()])
            .flatten()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!(
            processes = ?processes,
            cycle_len = cycle.len(),
            "deadlock detected in resource allocation graph"
        );

        Detection {
            deadlocked: true,
            processes,
            cycle,
        }
    }

    /// Run the heuristic safety check
    #[instrument(level = "debug", skip(self))]
    pub fn detect_via_safety_check(&self) -> SafetyReport {
        let outcome = SafetyMatrices::from_system(self.system).run();

        if outcome.is_safe() {
            debug!(safe_sequence = ?outcome.safe_sequence, "system is in a safe state");
            return SafetyReport {
                deadlocked: false,
                processes: Vec::new(),
                waiting: Vec::new(),
                safe_sequence: outcome.safe_sequence,
            };
        }

        let waiting = self.system.waiting_processes();
        info!(
            unfinished = ?outcome.unfinished,
            waiting = ?waiting,
            "system is not in a safe state"
        );

        SafetyReport {
            deadlocked: true,
            processes: outcome.unfinished,
            waiting,
            safe_sequence: outcome.safe_sequence,
        }
    }

    /// Run both detectors and compare verdicts
    pub fn analyze(&self) -> DetectionAnalysis {
        let rag = self.detect_via_rag();
        let safety = self.detect_via_safety_check();
        let consensus = rag.deadlocked == safety.deadlocked;

        if !consensus {
            info!(
                rag = rag.deadlocked,
                safety = safety.deadlocked,
                "detectors disagree"
            );
        }

        DetectionAnalysis {
            rag,
            safety,
            consensus,
        }
    }
}

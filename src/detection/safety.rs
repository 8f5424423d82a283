/*!
 * Heuristic Safety Check
 *
 * Banker's-style safety scan over matrices derived from the current system.
 * The model never records a declared maximum demand, so it is synthesized:
 *
 *   max_demand[p][r] = max(allocation[p][r] + (1 if p requests r else 0), 1)
 *   need[p][r]       = max_demand[p][r] - allocation[p][r]
 *
 * This is an estimator, not a faithful banker's algorithm; it can over- and
 * under-report unsafe states. The RAG cycle detector is the exact verdict.
 */

use crate::core::types::{Instances, Pid, Rid};
use crate::process::System;
use serde::{Deserialize, Serialize};

/// Matrices consumed by the safety scan
///
/// Rows follow `processes` (pid order, terminated processes excluded),
/// columns follow `resources` (rid order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyMatrices {
    pub processes: Vec<Pid>,
    pub resources: Vec<Rid>,
    pub available: Vec<Instances>,
    pub allocation: Vec<Vec<Instances>>,
    pub need: Vec<Vec<Instances>>,
}

/// Result of one safety scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyOutcome {
    /// Processes in the order they were able to finish
    pub safe_sequence: Vec<Pid>,
    /// Processes that could not finish, in pid order
    pub unfinished: Vec<Pid>,
}

impl SafetyOutcome {
    #[inline]
    pub fn is_safe(&self) -> bool {
        self.unfinished.is_empty()
    }
}

/// `max(allocated + pending, 1) - allocated`, without forming the sum
#[inline]
fn synthesized_need(allocated: Instances, pending: bool) -> Instances {
    Instances::from(pending || allocated == 0)
}

impl SafetyMatrices {
    pub fn from_system(system: &System) -> Self {
        let resources = system.resource_ids();
        let available = system
            .resources()
            .map(|r| r.available_instances())
            .collect();

        let mut processes = Vec::new();
        let mut allocation = Vec::new();
        let mut need = Vec::new();

        for process in system.processes().filter(|p| !p.is_terminated()) {
            let mut alloc_row = Vec::with_capacity(resources.len());
            let mut need_row = Vec::with_capacity(resources.len());

            for resource in system.resources() {
                let allocated = resource.held_by(process.pid());
                alloc_row.push(allocated);
                need_row.push(synthesized_need(allocated, process.has_pending(resource.rid())));
            }

            processes.push(process.pid());
            allocation.push(alloc_row);
            need.push(need_row);
        }

        Self {
            processes,
            resources,
            available,
            allocation,
            need,
        }
    }

    /// Run the scan
    ///
    /// Each pass marks every unfinished process whose need row fits in
    /// `work` and returns its allocation to `work`; passes repeat until one
    /// makes no progress.
    pub fn run(&self) -> SafetyOutcome {
        let mut work = self.available.clone();
        let mut finish = vec![false; self.processes.len()];
        let mut safe_sequence = Vec::with_capacity(self.processes.len());

        loop {
            let mut progressed = false;
            for (i, &pid) in self.processes.iter().enumerate() {
                if finish[i] {
                    continue;
                }
                let fits = self.need[i].iter().zip(&work).all(|(need, w)| need <= w);
                if fits {
                    for (w, alloc) in work.iter_mut().zip(&self.allocation[i]) {
                        *w += alloc;
                    }
                    finish[i] = true;
                    safe_sequence.push(pid);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        let unfinished = self
            .processes
            .iter()
            .zip(&finish)
            .filter(|(_, done)| !**done)
            .map(|(&pid, _)| pid)
            .collect();

        SafetyOutcome {
            safe_sequence,
            unfinished,
        }
    }
}

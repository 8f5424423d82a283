/*!
 * Process Types
 * Process state and the per-process pending-request table
 */

use crate::core::errors::{AllocationError, AllocationResult};
use crate::core::serde::is_empty_map;
use crate::core::types::{Instances, Pid, Rid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Process has no pending requests
    Running,
    /// Process is blocked on at least one pending request
    Waiting,
    /// Process has terminated; it holds and requests nothing
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// A simulated process
///
/// Holdings are not stored here: `Resource::allocated_to` is the single source
/// of truth and `System::resources_held` derives the held set from it. The
/// process owns only what no resource can know about, its pending requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    pid: Pid,
    status: ProcessState,
    /// Pending requests: resource → instances asked for by the first request
    #[serde(default, skip_serializing_if = "is_empty_map")]
    requested: BTreeMap<Rid, Instances>,
}

impl Process {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            status: ProcessState::Running,
            requested: BTreeMap::new(),
        }
    }

    /// Rebuild a process from snapshot data
    pub(crate) fn from_parts(
        pid: Pid,
        status: ProcessState,
        requested: BTreeMap<Rid, Instances>,
    ) -> Self {
        Self {
            pid,
            status,
            requested,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn status(&self) -> ProcessState {
        self.status
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.status == ProcessState::Terminated
    }

    #[inline]
    pub fn is_waiting(&self) -> bool {
        self.status == ProcessState::Waiting
    }

    /// Resources this process is blocked on, in id order
    pub fn resources_requested(&self) -> impl Iterator<Item = Rid> + '_ {
        self.requested.keys().copied()
    }

    /// Pending requests with their instance counts
    pub fn pending_requests(&self) -> &BTreeMap<Rid, Instances> {
        &self.requested
    }

    pub fn has_pending(&self, rid: Rid) -> bool {
        self.requested.contains_key(&rid)
    }

    /// Queue a request; re-queuing an already pending resource keeps the first count
    pub(crate) fn enqueue(&mut self, rid: Rid, instances: Instances) {
        self.requested.entry(rid).or_insert(instances);
        self.refresh_status();
    }

    pub(crate) fn dequeue(&mut self, rid: Rid) {
        self.requested.remove(&rid);
        self.refresh_status();
    }

    pub(crate) fn mark_terminated(&mut self) {
        self.requested.clear();
        self.status = ProcessState::Terminated;
    }

    /// Force the process back to a schedulable state
    pub(crate) fn reset(&mut self) {
        self.requested.clear();
        self.status = ProcessState::Running;
    }

    /// Status agrees with the pending table and every count is positive
    pub(crate) fn check_integrity(&self) -> AllocationResult<()> {
        if let Some(&rid) = self.requested.iter().find(|(_, &n)| n == 0).map(|(rid, _)| rid) {
            return Err(AllocationError::inconsistent(format!(
                "P{} has a pending request for zero instances of R{}",
                self.pid, rid
            )));
        }
        let consistent = match self.status {
            ProcessState::Terminated | ProcessState::Running => self.requested.is_empty(),
            ProcessState::Waiting => !self.requested.is_empty(),
        };
        if !consistent {
            return Err(AllocationError::inconsistent(format!(
                "P{} is {} with {} pending requests",
                self.pid,
                self.status,
                self.requested.len()
            )));
        }
        Ok(())
    }

    /// WAITING exactly when requests are pending; TERMINATED is sticky
    fn refresh_status(&mut self) {
        if self.is_terminated() {
            return;
        }
        self.status = if self.requested.is_empty() {
            ProcessState::Running
        } else {
            ProcessState::Waiting
        };
    }
}

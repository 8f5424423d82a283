/*!
 * System Registry
 * Owns every process and resource and performs all allocation mutations
 */

use super::resource::Resource;
use super::types::{Process, ProcessState};
use crate::core::errors::{AllocationError, AllocationResult, VerificationFailure};
use crate::core::serde::{is_zero_u32, is_zero_u64};
use crate::core::types::{Instances, Pid, Rid, Tick};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A pending request granted by `System::step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub pid: Pid,
    pub rid: Rid,
    pub instances: Instances,
}

/// Process population by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCounts {
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub running: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub waiting: u32,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub terminated: u32,
}

/// The simulated system
///
/// Maps are ordered so every traversal is deterministic (sorted by id).
/// Serialize-only: state comes back in through `Snapshot::restore`, which
/// runs [`System::check_integrity`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct System {
    processes: BTreeMap<Pid, Process>,
    resources: BTreeMap<Rid, Resource>,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    time: Tick,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a system wholesale from snapshot data
    pub(crate) fn from_parts(
        processes: BTreeMap<Pid, Process>,
        resources: BTreeMap<Rid, Resource>,
        time: Tick,
    ) -> Self {
        Self {
            processes,
            resources,
            time,
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    pub fn add_process(&mut self, process: Process) -> AllocationResult<()> {
        let pid = process.pid();
        if self.processes.contains_key(&pid) {
            return Err(AllocationError::DuplicateProcess(pid));
        }
        self.processes.insert(pid, process);
        Ok(())
    }

    pub fn add_resource(&mut self, resource: Resource) -> AllocationResult<()> {
        let rid = resource.rid();
        if self.resources.contains_key(&rid) {
            return Err(AllocationError::DuplicateResource(rid));
        }
        self.resources.insert(rid, resource);
        Ok(())
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn resource(&self, rid: Rid) -> Option<&Resource> {
        self.resources.get(&rid)
    }

    /// Processes in pid order
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    /// Resources in rid order
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn process_ids(&self) -> Vec<Pid> {
        self.processes.keys().copied().collect()
    }

    pub fn resource_ids(&self) -> Vec<Rid> {
        self.resources.keys().copied().collect()
    }

    #[inline]
    pub fn time(&self) -> Tick {
        self.time
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// Resources `pid` currently holds at least one instance of
    pub fn resources_held(&self, pid: Pid) -> BTreeSet<Rid> {
        self.resources
            .values()
            .filter(|r| r.held_by(pid) > 0)
            .map(Resource::rid)
            .collect()
    }

    pub fn held_instances(&self, pid: Pid, rid: Rid) -> Instances {
        self.resources.get(&rid).map_or(0, |r| r.held_by(pid))
    }

    pub fn waiting_processes(&self) -> Vec<Pid> {
        self.processes
            .values()
            .filter(|p| p.is_waiting())
            .map(Process::pid)
            .collect()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.processes
            .values()
            .fold(StatusCounts::default(), |mut counts, p| {
                match p.status() {
                    ProcessState::Running => counts.running += 1,
                    ProcessState::Waiting => counts.waiting += 1,
                    ProcessState::Terminated => counts.terminated += 1,
                }
                counts
            })
    }

    /// First resource violating `allocated + available == total`, if any
    pub fn check_conservation(&self) -> Result<(), VerificationFailure> {
        match self.resources.values().find(|r| !r.is_consistent()) {
            Some(r) => Err(VerificationFailure::InconsistentResource {
                rid: r.rid(),
                allocated: r.allocated_sum(),
                available: r.available_instances(),
                total: r.total_instances(),
            }),
            None => Ok(()),
        }
    }

    /// Every allocation-model invariant, including cross references
    ///
    /// Holders and requested resources must be registered, terminated
    /// processes hold nothing, and each process and resource passes its own
    /// check.
    pub fn check_integrity(&self) -> AllocationResult<()> {
        for (&pid, process) in &self.processes {
            if process.pid() != pid {
                return Err(AllocationError::inconsistent(format!(
                    "process P{} registered under id {}",
                    process.pid(),
                    pid
                )));
            }
            process.check_integrity()?;
            if let Some(rid) = process
                .resources_requested()
                .find(|rid| !self.resources.contains_key(rid))
            {
                return Err(AllocationError::UnknownResource(rid));
            }
        }

        for (&rid, resource) in &self.resources {
            if resource.rid() != rid {
                return Err(AllocationError::inconsistent(format!(
                    "resource R{} registered under id {}",
                    resource.rid(),
                    rid
                )));
            }
            resource.check_integrity()?;
            for pid in resource.holders() {
                let holder = self
                    .processes
                    .get(&pid)
                    .ok_or(AllocationError::UnknownProcess(pid))?;
                if holder.is_terminated() {
                    return Err(AllocationError::inconsistent(format!(
                        "terminated P{} still holds R{}",
                        pid, rid
                    )));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Request `instances` of `rid` for `pid`
    ///
    /// Grants immediately when enough instances are free and returns `true`;
    /// otherwise queues the request (idempotently), marks the process WAITING
    /// and returns `false`.
    pub fn request(&mut self, pid: Pid, rid: Rid, instances: Instances) -> AllocationResult<bool> {
        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(AllocationError::UnknownProcess(pid))?;
        let resource = self
            .resources
            .get_mut(&rid)
            .ok_or(AllocationError::UnknownResource(rid))?;

        if instances < 1 {
            return Err(AllocationError::invalid_request(
                pid,
                rid,
                "at least one instance must be requested",
            ));
        }
        if process.is_terminated() {
            return Err(AllocationError::invalid_request(
                pid,
                rid,
                "process has terminated",
            ));
        }

        if resource.allocate(pid, instances) {
            process.dequeue(rid);
            debug!(pid, rid, instances, "request granted");
            Ok(true)
        } else {
            process.enqueue(rid, instances);
            debug!(
                pid,
                rid,
                instances,
                available = resource.available_instances(),
                "request queued"
            );
            Ok(false)
        }
    }

    /// Release instances of `rid` held by `pid`; `None` releases all of them
    ///
    /// Returns the number of instances released. Freed instances are not
    /// handed to waiters here; see [`System::step`].
    pub fn release(
        &mut self,
        pid: Pid,
        rid: Rid,
        instances: Option<Instances>,
    ) -> AllocationResult<Instances> {
        if !self.processes.contains_key(&pid) {
            return Err(AllocationError::UnknownProcess(pid));
        }
        let resource = self
            .resources
            .get_mut(&rid)
            .ok_or(AllocationError::UnknownResource(rid))?;

        let released = resource.release(pid, instances)?;
        debug!(pid, rid, released, "resource released");
        Ok(released)
    }

    /// Release everything `pid` holds, drop its requests and mark it TERMINATED
    ///
    /// Terminating an already terminated process is a no-op.
    pub fn terminate(&mut self, pid: Pid) -> AllocationResult<()> {
        let already = self
            .processes
            .get(&pid)
            .ok_or(AllocationError::UnknownProcess(pid))?
            .is_terminated();
        if already {
            return Ok(());
        }

        let released = self.release_all(pid)?;
        if let Some(process) = self.processes.get_mut(&pid) {
            process.mark_terminated();
        }
        info!(pid, released, "process terminated");
        Ok(())
    }

    /// Release everything `pid` holds, drop its requests and mark it RUNNING
    ///
    /// Unlike termination the process stays schedulable. Returns the number
    /// of instances released. Terminated processes are left untouched.
    pub(crate) fn rollback(&mut self, pid: Pid) -> AllocationResult<Instances> {
        let process = self
            .processes
            .get(&pid)
            .ok_or(AllocationError::UnknownProcess(pid))?;
        if process.is_terminated() {
            debug!(pid, "rollback skipped for terminated process");
            return Ok(0);
        }

        let released = self.release_all(pid)?;
        if let Some(process) = self.processes.get_mut(&pid) {
            process.reset();
        }
        info!(pid, released, "process rolled back");
        Ok(released)
    }

    /// Advance the logical clock and grant whatever pending requests now fit
    ///
    /// Waiting processes are visited in pid order and their requests in rid
    /// order, so earlier pids win contention for freed instances.
    pub fn step(&mut self) -> Vec<Grant> {
        self.time += 1;

        let mut grants = Vec::new();
        for process in self.processes.values_mut().filter(|p| p.is_waiting()) {
            let pending: Vec<(Rid, Instances)> = process
                .pending_requests()
                .iter()
                .map(|(&rid, &n)| (rid, n))
                .collect();

            for (rid, instances) in pending {
                let granted = self
                    .resources
                    .get_mut(&rid)
                    .is_some_and(|r| r.allocate(process.pid(), instances));
                if granted {
                    process.dequeue(rid);
                    grants.push(Grant {
                        pid: process.pid(),
                        rid,
                        instances,
                    });
                }
            }
        }

        if !grants.is_empty() {
            debug!(time = self.time, granted = grants.len(), "pending requests granted");
        }
        grants
    }

    fn release_all(&mut self, pid: Pid) -> AllocationResult<Instances> {
        let mut released: Instances = 0;
        for resource in self.resources.values_mut() {
            if resource.held_by(pid) > 0 {
                released = released.saturating_add(resource.release(pid, None)?);
            }
        }
        Ok(released)
    }
}

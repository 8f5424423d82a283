/*!
 * System Snapshots
 *
 * Deep value copies of system state. A snapshot shares nothing with the
 * system it was taken from, so one starting state can be restored any
 * number of times for independent strategy trials.
 *
 * Snapshots are also the deserializable form of a system. Restoring one
 * checks every allocation invariant before a system is handed back.
 */

use crate::core::errors::{AllocationError, AllocationResult};
use crate::core::serde::{is_empty_map, is_empty_vec};
use crate::core::types::{Instances, Pid, Rid, Tick};
use crate::process::{Process, ProcessState, Resource, System};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Captured process state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub status: ProcessState,
    /// Derived from the resource tables; restore only checks it agrees
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub resources_held: Vec<Rid>,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub resources_requested: BTreeMap<Rid, Instances>,
}

/// Captured resource state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub total_instances: Instances,
    pub available_instances: Instances,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub allocated_to: BTreeMap<Pid, Instances>,
}

/// Captured system state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub processes: BTreeMap<Pid, ProcessSnapshot>,
    pub resources: BTreeMap<Rid, ResourceSnapshot>,
    pub time: Tick,
}

impl Snapshot {
    pub fn capture(system: &System) -> Self {
        let processes = system
            .processes()
            .map(|p| {
                let snapshot = ProcessSnapshot {
                    status: p.status(),
                    resources_held: system.resources_held(p.pid()).into_iter().collect(),
                    resources_requested: p.pending_requests().clone(),
                };
                (p.pid(), snapshot)
            })
            .collect();

        let resources = system
            .resources()
            .map(|r| {
                let snapshot = ResourceSnapshot {
                    total_instances: r.total_instances(),
                    available_instances: r.available_instances(),
                    allocated_to: r.allocated_to().clone(),
                };
                (r.rid(), snapshot)
            })
            .collect();

        Self {
            processes,
            resources,
            time: system.time(),
        }
    }

    /// Build a fresh system from this snapshot
    ///
    /// Fails with the first broken invariant; listed holdings must agree
    /// with the resource tables.
    pub fn restore(&self) -> AllocationResult<System> {
        let resources = self
            .resources
            .iter()
            .map(|(&rid, r)| {
                let resource = Resource::from_parts(
                    rid,
                    r.total_instances,
                    r.available_instances,
                    r.allocated_to.clone(),
                );
                (rid, resource)
            })
            .collect();

        let processes = self
            .processes
            .iter()
            .map(|(&pid, p)| {
                let process = Process::from_parts(pid, p.status, p.resources_requested.clone());
                (pid, process)
            })
            .collect();

        let system = System::from_parts(processes, resources, self.time);
        system.check_integrity()?;

        for (&pid, p) in &self.processes {
            if let Some(&rid) = p
                .resources_held
                .iter()
                .find(|&&rid| system.held_instances(pid, rid) == 0)
            {
                return Err(AllocationError::inconsistent(format!(
                    "P{} lists R{} as held but the resource has no such holder",
                    pid, rid
                )));
            }
        }
        Ok(system)
    }
}

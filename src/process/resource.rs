/*!
 * Resources
 * Fixed-capacity resources and their per-process allocation table
 */

use crate::core::errors::{AllocationError, AllocationResult};
use crate::core::serde::is_empty_map;
use crate::core::types::{Instances, Pid, Rid};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A resource with a fixed number of identical instances
///
/// `available_instances + sum(allocated_to) == total_instances` holds after
/// every operation. Entries in `allocated_to` are removed when they reach zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    rid: Rid,
    total_instances: Instances,
    available_instances: Instances,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    allocated_to: BTreeMap<Pid, Instances>,
}

impl Resource {
    /// Create a resource with `instances` free instances
    pub fn new(rid: Rid, instances: Instances) -> AllocationResult<Self> {
        if instances == 0 {
            return Err(AllocationError::InvalidCapacity(rid));
        }
        Ok(Self {
            rid,
            total_instances: instances,
            available_instances: instances,
            allocated_to: BTreeMap::new(),
        })
    }

    /// Create a single-instance resource
    pub fn single(rid: Rid) -> Self {
        Self {
            rid,
            total_instances: 1,
            available_instances: 1,
            allocated_to: BTreeMap::new(),
        }
    }

    /// Rebuild a resource from snapshot data
    pub(crate) fn from_parts(
        rid: Rid,
        total_instances: Instances,
        available_instances: Instances,
        allocated_to: BTreeMap<Pid, Instances>,
    ) -> Self {
        Self {
            rid,
            total_instances,
            available_instances,
            allocated_to,
        }
    }

    #[inline]
    pub fn rid(&self) -> Rid {
        self.rid
    }

    #[inline]
    pub fn total_instances(&self) -> Instances {
        self.total_instances
    }

    #[inline]
    pub fn available_instances(&self) -> Instances {
        self.available_instances
    }

    /// Holders and their instance counts, in pid order
    pub fn allocated_to(&self) -> &BTreeMap<Pid, Instances> {
        &self.allocated_to
    }

    /// Instances held by `pid` (zero when not a holder)
    pub fn held_by(&self, pid: Pid) -> Instances {
        self.allocated_to.get(&pid).copied().unwrap_or(0)
    }

    pub fn holders(&self) -> impl Iterator<Item = Pid> + '_ {
        self.allocated_to.keys().copied()
    }

    /// Total allocated instances, saturating on corrupt tables
    pub fn allocated_sum(&self) -> Instances {
        self.allocated_to
            .values()
            .fold(0, |sum, &n| sum.saturating_add(n))
    }

    /// Whether the conservation invariant holds
    pub fn is_consistent(&self) -> bool {
        self.allocated_to
            .values()
            .try_fold(self.available_instances, |sum, &n| sum.checked_add(n))
            == Some(self.total_instances)
    }

    /// Capacity, conservation and no zero-count holders
    pub(crate) fn check_integrity(&self) -> AllocationResult<()> {
        if self.total_instances == 0 {
            return Err(AllocationError::InvalidCapacity(self.rid));
        }
        if let Some(&pid) = self.allocated_to.iter().find(|(_, &n)| n == 0).map(|(pid, _)| pid) {
            return Err(AllocationError::inconsistent(format!(
                "R{} lists P{} as holding zero instances",
                self.rid, pid
            )));
        }
        if !self.is_consistent() {
            return Err(AllocationError::inconsistent(format!(
                "R{}: allocated {} + available {} != total {}",
                self.rid,
                self.allocated_sum(),
                self.available_instances,
                self.total_instances
            )));
        }
        Ok(())
    }

    /// Grant `instances` to `pid` if enough are free; returns whether it did
    pub(crate) fn allocate(&mut self, pid: Pid, instances: Instances) -> bool {
        if self.available_instances < instances {
            return false;
        }
        *self.allocated_to.entry(pid).or_insert(0) += instances;
        self.available_instances -= instances;
        true
    }

    /// Return instances held by `pid`; `None` releases everything it holds
    pub(crate) fn release(
        &mut self,
        pid: Pid,
        instances: Option<Instances>,
    ) -> AllocationResult<Instances> {
        let held = self.held_by(pid);
        if held == 0 {
            return Err(AllocationError::invalid_release(
                pid,
                self.rid,
                "resource is not held by this process",
            ));
        }

        let amount = instances.unwrap_or(held);
        if amount == 0 {
            return Err(AllocationError::invalid_release(
                pid,
                self.rid,
                "cannot release zero instances",
            ));
        }
        if amount > held {
            return Err(AllocationError::invalid_release(
                pid,
                self.rid,
                format!("releasing {} instances but only {} held", amount, held),
            ));
        }

        if amount == held {
            self.allocated_to.remove(&pid);
        } else {
            self.allocated_to.insert(pid, held - amount);
        }
        self.available_instances += amount;
        Ok(amount)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resource {} - Available: {}/{}",
            self.rid, self.available_instances, self.total_instances
        )
    }
}

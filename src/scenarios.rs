/*!
 * Canonical Scenarios
 *
 * Ready-made systems used by the binary, the integration tests and the
 * benchmarks. Every builder goes through the public request API, so the
 * resulting state is reachable by ordinary callers.
 */

use crate::core::errors::{AllocationResult, SimError};
use crate::core::limits::{DEFAULT_PHILOSOPHERS, MIN_PHILOSOPHERS};
use crate::core::types::{Instances, Pid, Rid};
use crate::process::{Process, Resource, System};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

fn register(
    processes: impl IntoIterator<Item = Pid>,
    resources: impl IntoIterator<Item = (Rid, Instances)>,
) -> AllocationResult<System> {
    let mut system = System::new();
    for pid in processes {
        system.add_process(Process::new(pid))?;
    }
    for (rid, instances) in resources {
        system.add_resource(Resource::new(rid, instances)?)?;
    }
    Ok(system)
}

fn request_all(system: &mut System, requests: &[(Pid, Rid)]) -> AllocationResult<()> {
    for &(pid, rid) in requests {
        system.request(pid, rid, 1)?;
    }
    Ok(())
}

/// P1 holds R1 and wants R2, P2 holds R2 and wants R1
pub fn simple_deadlock() -> AllocationResult<System> {
    let mut system = register(1..=2, [(1, 1), (2, 1)])?;
    request_all(&mut system, &[(1, 1), (2, 2), (1, 2), (2, 1)])?;
    Ok(system)
}

/// Three processes each holding one resource and waiting on the one held
/// by the next process around the chain
pub fn chain_deadlock() -> AllocationResult<System> {
    let mut system = register(1..=3, [(1, 1), (2, 1), (3, 1)])?;
    request_all(
        &mut system,
        &[(1, 1), (2, 2), (3, 3), (1, 3), (2, 1), (3, 2)],
    )?;
    Ok(system)
}

/// `n` philosophers holding their left fork and waiting for their right one
///
/// Philosopher `i` holds fork `i` and requests fork `i % n + 1`. Fewer than
/// two philosophers cannot deadlock, so `n` is raised to two.
pub fn dining_philosophers(n: u32) -> AllocationResult<System> {
    let n = n.max(MIN_PHILOSOPHERS);
    let mut system = register(1..=n, (1..=n).map(|rid| (rid, 1)))?;

    for pid in 1..=n {
        system.request(pid, pid, 1)?;
    }
    for pid in 1..=n {
        system.request(pid, pid % n + 1, 1)?;
    }

    debug!(philosophers = n, "dining philosophers seated");
    Ok(system)
}

/// Four processes over multi-instance resources (R1×3, R2×2, R3×2), every
/// instance allocated and every process waiting on something
pub fn complex_allocation() -> AllocationResult<System> {
    let mut system = register(1..=4, [(1, 3), (2, 2), (3, 2)])?;
    request_all(
        &mut system,
        &[
            (1, 1),
            (1, 2),
            (2, 2),
            (2, 3),
            (3, 1),
            (3, 3),
            (4, 1),
            (1, 3),
            (2, 1),
            (3, 2),
            (4, 2),
            (4, 3),
        ],
    )?;
    Ok(system)
}

/// Three processes that each hold one resource and obtain a second instance
/// of a different one; nothing waits
pub fn no_deadlock() -> AllocationResult<System> {
    let mut system = register(1..=3, [(1, 2), (2, 2), (3, 2)])?;
    request_all(
        &mut system,
        &[(1, 1), (2, 2), (3, 3), (1, 2), (2, 3), (3, 1)],
    )?;
    Ok(system)
}

/// Named scenario, parsed from `simple`, `chain`, `philosophers[:N]`,
/// `complex` or `none`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    Simple,
    Chain,
    DiningPhilosophers { philosophers: u32 },
    Complex,
    NoDeadlock,
}

impl Scenario {
    pub fn build(&self) -> AllocationResult<System> {
        match *self {
            Scenario::Simple => simple_deadlock(),
            Scenario::Chain => chain_deadlock(),
            Scenario::DiningPhilosophers { philosophers } => dining_philosophers(philosophers),
            Scenario::Complex => complex_allocation(),
            Scenario::NoDeadlock => no_deadlock(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Simple => "simple",
            Scenario::Chain => "chain",
            Scenario::DiningPhilosophers { .. } => "philosophers",
            Scenario::Complex => "complex",
            Scenario::NoDeadlock => "none",
        }
    }

    /// Whether the built system is expected to contain a cycle
    pub fn expects_deadlock(&self) -> bool {
        !matches!(self, Scenario::NoDeadlock)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::DiningPhilosophers { philosophers } => {
                write!(f, "philosophers:{}", philosophers)
            }
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Scenario {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (name, arg) = match normalized.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (normalized.as_str(), None),
        };

        let scenario = match name.trim() {
            "simple" => Scenario::Simple,
            "chain" => Scenario::Chain,
            "complex" => Scenario::Complex,
            "none" | "no_deadlock" => Scenario::NoDeadlock,
            "philosophers" | "dining_philosophers" => {
                let philosophers = match arg {
                    Some(raw) => raw.parse::<u32>().map_err(|_| {
                        SimError::Configuration(format!(
                            "philosopher count {:?} is not a number",
                            raw
                        ))
                    })?,
                    None => DEFAULT_PHILOSOPHERS,
                };
                return Ok(Scenario::DiningPhilosophers { philosophers });
            }
            _ => {
                return Err(SimError::Configuration(format!(
                    "unknown scenario {:?}",
                    s
                )))
            }
        };

        if arg.is_some() {
            return Err(SimError::Configuration(format!(
                "scenario {:?} takes no argument",
                name
            )));
        }
        Ok(scenario)
    }
}

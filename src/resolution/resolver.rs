/*!
 * Deadlock Resolver
 *
 * Breaks a detected deadlock by acting on one victim process:
 * - termination: terminate the victim
 * - preemption: take one held resource away from the victim
 * - rollback: release everything and restart the victim as RUNNING
 *
 * Strategies mutate the borrowed system in place and report whether the
 * allocation graph is cycle-free afterwards. They never loop until success;
 * callers re-detect or retry explicitly.
 */

use super::config::ResolverConfig;
use super::snapshot::Snapshot;
use super::strategy::Strategy;
use crate::core::errors::ResolutionResult;
use crate::core::types::{Instances, Pid, Rid, Tick};
use crate::detection::{DeadlockDetector, Detection};
use crate::process::System;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// One entry of the resolution audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub strategy: Strategy,
    pub deadlocked_processes: Vec<Pid>,
    pub time: Tick,
}

/// What a strategy did to the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResolutionAction {
    /// Detection found no deadlock; nothing was touched
    NoDeadlock,
    /// The candidate set yielded no victim
    NoVictim,
    Terminated { pid: Pid },
    Preempted { pid: Pid, rid: Rid, instances: Instances },
    /// The victim held nothing that could be preempted
    NothingToPreempt { pid: Pid },
    RolledBack { pid: Pid, released: Instances },
}

impl ResolutionAction {
    pub fn victim(&self) -> Option<Pid> {
        match *self {
            ResolutionAction::NoDeadlock | ResolutionAction::NoVictim => None,
            ResolutionAction::Terminated { pid }
            | ResolutionAction::Preempted { pid, .. }
            | ResolutionAction::NothingToPreempt { pid }
            | ResolutionAction::RolledBack { pid, .. } => Some(pid),
        }
    }
}

/// Result of a resolution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub strategy: Strategy,
    pub action: ResolutionAction,
    /// Whether RAG detection reports no cycle after the attempt
    pub resolved: bool,
}

/// Deadlock resolver over a mutably borrowed system
pub struct DeadlockResolver<'a> {
    pub(super) system: &'a mut System,
    pub(super) config: ResolverConfig,
    rng: StdRng,
    pub(super) history: Vec<ResolutionRecord>,
}

impl<'a> DeadlockResolver<'a> {
    pub fn new(system: &'a mut System) -> Self {
        Self::with_config(system, ResolverConfig::default())
    }

    pub fn with_config(system: &'a mut System, config: ResolverConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            system,
            config,
            history: Vec::new(),
        }
    }

    pub fn system(&self) -> &System {
        &*self.system
    }

    pub(crate) fn system_mut(&mut self) -> &mut System {
        &mut *self.system
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn detector(&self) -> DeadlockDetector<'_> {
        DeadlockDetector::new(&*self.system)
    }

    /// Audit log of resolutions attempted through [`resolve`](Self::resolve)
    pub fn history(&self) -> &[ResolutionRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn take_snapshot(&self) -> Snapshot {
        Snapshot::capture(&*self.system)
    }

    /// Replace the system's processes and resources wholesale
    ///
    /// A snapshot that fails validation leaves the system untouched.
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) -> ResolutionResult<()> {
        *self.system = snapshot.restore()?;
        Ok(())
    }

    /// Pick a victim among `deadlocked`
    ///
    /// Priority-based selection takes the process holding the most distinct
    /// resources, the first one in `deadlocked` order on ties. Otherwise the
    /// victim is drawn from the seeded RNG.
    pub fn select_victim(&mut self, deadlocked: &[Pid], priority_based: bool) -> Option<Pid> {
        if !priority_based {
            return deadlocked.choose(&mut self.rng).copied();
        }

        let mut best: Option<(Pid, usize)> = None;
        for &pid in deadlocked {
            if self.system.process(pid).is_none() {
                continue;
            }
            let held = self.system.resources_held(pid).len();
            if best.map_or(true, |(_, most)| held > most) {
                best = Some((pid, held));
            }
        }
        best.map(|(pid, _)| pid)
    }

    /// Detect via RAG and, if deadlocked, apply `strategy`
    ///
    /// Records the attempt in the history only when a deadlock was found.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(
        &mut self,
        strategy: Strategy,
        priority_based: bool,
    ) -> ResolutionResult<ResolutionOutcome> {
        let detection = self.detector().detect_via_rag();
        if !detection.deadlocked {
            info!("no deadlock to resolve");
            return Ok(ResolutionOutcome {
                strategy,
                action: ResolutionAction::NoDeadlock,
                resolved: true,
            });
        }

        info!(%strategy, processes = ?detection.processes, "resolving deadlock");
        self.history.push(ResolutionRecord {
            strategy,
            deadlocked_processes: detection.processes.clone(),
            time: self.system.time(),
        });

        self.apply(strategy, &detection.processes, priority_based)
    }

    /// [`resolve`](Self::resolve) with the strategy given by name
    pub fn resolve_named(
        &mut self,
        strategy: &str,
        priority_based: bool,
    ) -> ResolutionResult<ResolutionOutcome> {
        let strategy = strategy.parse::<Strategy>()?;
        self.resolve(strategy, priority_based)
    }

    /// Apply `strategy` to an explicit candidate set without detecting first
    pub fn apply(
        &mut self,
        strategy: Strategy,
        deadlocked: &[Pid],
        priority_based: bool,
    ) -> ResolutionResult<ResolutionOutcome> {
        let Some(victim) = self.select_victim(deadlocked, priority_based) else {
            return Ok(self.outcome(strategy, ResolutionAction::NoVictim));
        };

        let action = match strategy {
            Strategy::Termination => {
                info!(pid = victim, "terminating victim");
                self.system.terminate(victim)?;
                ResolutionAction::Terminated { pid: victim }
            }
            Strategy::Preemption => match self.preempt(victim)? {
                Some((rid, instances)) => ResolutionAction::Preempted {
                    pid: victim,
                    rid,
                    instances,
                },
                None => {
                    warn!(pid = victim, "victim holds nothing to preempt");
                    return Ok(ResolutionOutcome {
                        strategy,
                        action: ResolutionAction::NothingToPreempt { pid: victim },
                        resolved: false,
                    });
                }
            },
            Strategy::Rollback => {
                info!(pid = victim, "rolling back victim");
                let released = self.system.rollback(victim)?;
                ResolutionAction::RolledBack {
                    pid: victim,
                    released,
                }
            }
        };

        Ok(self.outcome(strategy, action))
    }

    /// Take every instance of one randomly chosen held resource from `pid`
    fn preempt(&mut self, pid: Pid) -> ResolutionResult<Option<(Rid, Instances)>> {
        let held: Vec<Rid> = self.system.resources_held(pid).into_iter().collect();
        let Some(&rid) = held.choose(&mut self.rng) else {
            return Ok(None);
        };

        let instances = self.system.release(pid, rid, None)?;
        info!(pid, rid, instances, "preempted resource from victim");
        Ok(Some((rid, instances)))
    }

    fn outcome(&self, strategy: Strategy, action: ResolutionAction) -> ResolutionOutcome {
        let after: Detection = self.detector().detect_via_rag();
        ResolutionOutcome {
            strategy,
            action,
            resolved: !after.deadlocked,
        }
    }
}

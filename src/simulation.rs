/*!
 * Simulation Loop
 *
 * Drives a system through discrete ticks. Each tick grants whatever pending
 * requests now fit, runs RAG detection, and on a deadlock makes exactly one
 * resolution attempt with the configured strategy.
 */

use crate::core::errors::ResolutionResult;
use crate::core::serde::{is_empty_vec, is_none};
use crate::core::types::Tick;
use crate::detection::Detection;
use crate::process::{Grant, StatusCounts};
use crate::resolution::{DeadlockResolver, ResolutionOutcome, Strategy};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Simulation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Strategy applied when a tick detects a deadlock
    pub strategy: Strategy,
    pub priority_based: bool,
    /// Stop early once a tick finds no deadlock and nothing waiting
    pub stop_when_resolved: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Termination,
            priority_based: false,
            stop_when_resolved: true,
        }
    }
}

impl SimulationConfig {
    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_priority_based(mut self, priority_based: bool) -> Self {
        self.priority_based = priority_based;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_stop_when_resolved(mut self, stop: bool) -> Self {
        self.stop_when_resolved = stop;
        self
    }
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub time: Tick,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub grants: Vec<Grant>,
    pub detection: Detection,
    #[serde(default, skip_serializing_if = "is_none")]
    pub resolution: Option<ResolutionOutcome>,
    /// Status summary at the end of the tick
    pub statuses: StatusCounts,
}

impl StepRecord {
    /// No deadlock and nobody waiting at the end of the tick
    pub fn is_settled(&self) -> bool {
        !self.detection.deadlocked && self.resolution.is_none() && self.statuses.waiting == 0
    }
}

/// Step loop over a resolver
pub struct Simulation<'r, 'a> {
    resolver: &'r mut DeadlockResolver<'a>,
    config: SimulationConfig,
}

impl<'r, 'a> Simulation<'r, 'a> {
    pub fn new(resolver: &'r mut DeadlockResolver<'a>, config: SimulationConfig) -> Self {
        Self { resolver, config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance one tick
    pub fn tick(&mut self) -> ResolutionResult<StepRecord> {
        let grants = self.resolver.system_mut().step();
        let detection = self.resolver.detector().detect_via_rag();

        let resolution = if detection.deadlocked {
            Some(
                self.resolver
                    .resolve(self.config.strategy, self.config.priority_based)?,
            )
        } else {
            None
        };

        let system = self.resolver.system();
        Ok(StepRecord {
            time: system.time(),
            grants,
            detection,
            resolution,
            statuses: system.status_counts(),
        })
    }

    /// Run up to `steps` ticks
    #[instrument(level = "debug", skip(self), fields(strategy = %self.config.strategy))]
    pub fn run(&mut self, steps: u32) -> ResolutionResult<Vec<StepRecord>> {
        let mut records = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            let record = self.tick()?;
            let settled = record.is_settled();
            records.push(record);

            if settled && self.config.stop_when_resolved {
                info!(time = self.resolver.system().time(), "simulation settled");
                break;
            }
        }
        Ok(records)
    }
}

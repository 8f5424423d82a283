/*!
 * Strategy Trials
 *
 * Applies every strategy to the same starting configuration. Each attempt
 * begins from one shared snapshot, so no strategy sees another's mutations.
 */

use super::resolver::DeadlockResolver;
use super::strategy::Strategy;
use crate::core::errors::{ResolutionError, ResolutionResult};
use crate::core::serde::is_zero_u32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Success count of one strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTrial {
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub successes: u32,
}

impl StrategyTrial {
    /// Fraction of attempts that verified, in `[0, 1]`
    pub fn success_rate(&self, attempts: u32) -> f64 {
        if attempts == 0 {
            return 0.0;
        }
        f64::from(self.successes) / f64::from(attempts)
    }
}

/// Outcome of [`DeadlockResolver::evaluate_strategies`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialReport {
    /// Attempts made per strategy
    pub attempts: u32,
    pub trials: Vec<StrategyTrial>,
}

impl TrialReport {
    pub fn successes(&self, strategy: Strategy) -> u32 {
        self.trials
            .iter()
            .find(|t| t.strategy == strategy)
            .map_or(0, |t| t.successes)
    }

    /// Strategies ordered by success count, most successful first
    pub fn ranking(&self) -> Vec<Strategy> {
        let mut trials = self.trials.clone();
        trials.sort_by(|a, b| b.successes.cmp(&a.successes));
        trials.into_iter().map(|t| t.strategy).collect()
    }
}

impl DeadlockResolver<'_> {
    /// Try every strategy `trial_attempts` times from the current state
    ///
    /// An attempt succeeds when [`verify_resolution`](Self::verify_resolution)
    /// passes after the strategy was applied (and, when configured, after one
    /// settling `System::step`). The system and history are restored to their
    /// starting values before returning.
    #[instrument(level = "debug", skip(self), fields(attempts = self.config.trial_attempts))]
    pub fn evaluate_strategies(&mut self) -> ResolutionResult<TrialReport> {
        let original = self.take_snapshot();
        let attempts = self.config.trial_attempts;
        let priority_based = self.config.priority_based;

        let mut trials = Vec::with_capacity(Strategy::ALL.len());
        for strategy in Strategy::ALL {
            let mut successes = 0;
            for attempt in 0..attempts {
                self.restore_snapshot(&original)?;

                let verified = self.run_trial(strategy, priority_based);
                self.history.clear();

                match verified {
                    Ok(()) => successes += 1,
                    Err(ResolutionError::Verification(failure)) => {
                        debug!(%strategy, attempt, %failure, "trial did not verify");
                    }
                    Err(err) => {
                        self.restore_snapshot(&original)?;
                        return Err(err);
                    }
                }
            }
            info!(%strategy, successes, attempts, "strategy evaluated");
            trials.push(StrategyTrial {
                strategy,
                successes,
            });
        }

        self.restore_snapshot(&original)?;
        self.history.clear();

        Ok(TrialReport { attempts, trials })
    }

    fn run_trial(&mut self, strategy: Strategy, priority_based: bool) -> ResolutionResult<()> {
        self.resolve(strategy, priority_based)?;
        if self.config.settle_before_verify {
            self.system_mut().step();
        }
        self.verify_resolution()
    }
}

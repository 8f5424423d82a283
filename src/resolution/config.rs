/*!
 * Resolver Configuration
 */

use crate::core::errors::{SimError, SimResult};
use crate::core::limits::{
    DEFAULT_RESOLVER_SEED, DEFAULT_TRIAL_ATTEMPTS, ENV_ATTEMPTS, ENV_PRIORITY, ENV_SEED,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Configuration for [`DeadlockResolver`](super::DeadlockResolver)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Seed for random victim and preemption choices
    pub seed: u64,
    /// Default victim policy for strategy trials
    pub priority_based: bool,
    /// Attempts per strategy in `evaluate_strategies`
    pub trial_attempts: u32,
    /// Run one `System::step` after a resolution before verifying it, so
    /// freed instances reach the processes waiting for them
    pub settle_before_verify: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_RESOLVER_SEED,
            priority_based: false,
            trial_attempts: DEFAULT_TRIAL_ATTEMPTS,
            settle_before_verify: true,
        }
    }
}

impl ResolverConfig {
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
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
    pub fn with_trial_attempts(mut self, attempts: u32) -> Self {
        self.trial_attempts = attempts;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_settle_before_verify(mut self, settle: bool) -> Self {
        self.settle_before_verify = settle;
        self
    }

    /// Defaults overridden by `DEADLOCK_SIM_SEED`, `DEADLOCK_SIM_PRIORITY`
    /// and `DEADLOCK_SIM_ATTEMPTS` when set
    pub fn from_env() -> SimResult<Self> {
        let mut config = Self::default();
        if let Some(seed) = env_value::<u64>(ENV_SEED)? {
            config.seed = seed;
        }
        if let Some(raw) = env_raw(ENV_PRIORITY) {
            config.priority_based = parse_flag(ENV_PRIORITY, &raw)?;
        }
        if let Some(attempts) = env_value::<u32>(ENV_ATTEMPTS)? {
            config.trial_attempts = attempts;
        }
        Ok(config)
    }
}

fn env_raw(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_value<T: FromStr>(key: &str) -> SimResult<Option<T>> {
    match env_raw(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SimError::Configuration(format!("{}={:?} is not valid", key, raw))),
        None => Ok(None),
    }
}

pub(crate) fn parse_flag(key: &str, raw: &str) -> SimResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SimError::Configuration(format!(
            "{}={:?} is not a boolean",
            key, raw
        ))),
    }
}

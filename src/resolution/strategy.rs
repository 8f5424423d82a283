/*!
 * Recovery Strategies
 */

use crate::core::errors::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a deadlock is broken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Kill the victim and release everything it holds
    Termination,
    /// Take one held resource away from the victim
    Preemption,
    /// Release everything the victim holds and restart it as RUNNING
    Rollback,
}

impl Strategy {
    /// Every strategy, in evaluation order
    pub const ALL: [Strategy; 3] = [
        Strategy::Termination,
        Strategy::Preemption,
        Strategy::Rollback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Termination => "termination",
            Strategy::Preemption => "preemption",
            Strategy::Rollback => "rollback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "termination" => Ok(Strategy::Termination),
            "preemption" => Ok(Strategy::Preemption),
            "rollback" => Ok(Strategy::Rollback),
            _ => Err(ResolutionError::UnknownStrategy(s.to_string())),
        }
    }
}

/*!
 * Resolution Module
 * Victim selection, recovery strategies, snapshots and verification
 */

pub mod config;
pub mod resolver;
pub mod snapshot;
pub mod strategy;
pub mod trials;
mod verify;

// Re-export for convenience
pub use config::ResolverConfig;
pub use resolver::{DeadlockResolver, ResolutionAction, ResolutionOutcome, ResolutionRecord};
pub use snapshot::{ProcessSnapshot, ResourceSnapshot, Snapshot};
pub use strategy::Strategy;
pub use trials::{StrategyTrial, TrialReport};

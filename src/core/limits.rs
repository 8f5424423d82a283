/*!
 * Simulator Limits and Defaults
 *
 * Centralized location for defaults and thresholds used across the simulator.
 */

// =============================================================================
// RESOLUTION
// =============================================================================

/// Seed for the victim-selection RNG
/// Fixed so that random victim selection is reproducible across runs
pub const DEFAULT_RESOLVER_SEED: u64 = 0;

/// Attempts per strategy when evaluating strategies side by side
pub const DEFAULT_TRIAL_ATTEMPTS: u32 = 3;

// =============================================================================
// SCENARIOS
// =============================================================================

/// Philosophers at the table when none is specified
pub const DEFAULT_PHILOSOPHERS: u32 = 5;

/// Smallest table that still forms a circular wait
pub const MIN_PHILOSOPHERS: u32 = 2;

// =============================================================================
// SIMULATION
// =============================================================================

/// Steps executed by the demonstration binary
pub const DEFAULT_SIMULATION_STEPS: u32 = 3;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Scenario selector for the binary (`simple`, `chain`, `philosophers[:N]`, `complex`, `none`)
pub const ENV_SCENARIO: &str = "DEADLOCK_SIM_SCENARIO";

/// Victim-selection seed override
pub const ENV_SEED: &str = "DEADLOCK_SIM_SEED";

/// Priority-based victim selection toggle
pub const ENV_PRIORITY: &str = "DEADLOCK_SIM_PRIORITY";

/// Attempts per strategy during evaluation
pub const ENV_ATTEMPTS: &str = "DEADLOCK_SIM_ATTEMPTS";

/// JSON log output toggle
pub const ENV_TRACE_JSON: &str = "DEADLOCK_SIM_TRACE_JSON";

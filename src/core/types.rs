/*!
 * Core Types
 * Common types used across the simulator
 */

/// Process ID type
pub type Pid = u32;

/// Resource ID type
pub type Rid = u32;

/// Count of resource instances
pub type Instances = u32;

/// Logical simulation time (advanced only by `System::step`)
pub type Tick = u64;

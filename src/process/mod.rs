/*!
 * Process Module
 * Allocation model: processes, resources, and the system registry
 */

pub mod resource;
pub mod system;
pub mod types;

// Re-export for convenience
pub use resource::Resource;
pub use system::{Grant, StatusCounts, System};
pub use types::{Process, ProcessState};

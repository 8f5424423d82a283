/*!
 * Detection Module
 * Resource-allocation-graph cycle detection and heuristic safety check
 */

pub mod detector;
pub mod graph;
pub mod safety;

// Re-export for convenience
pub use detector::{DeadlockDetector, Detection, DetectionAnalysis, SafetyReport};
pub use graph::{EdgeKind, RagEdge, RagNode, ResourceAllocationGraph};
pub use safety::{SafetyMatrices, SafetyOutcome};

/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{Instances, Pid, Rid};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allocation-model errors with serialization support
///
/// Raised at the point of misuse; callers pre-check feasibility instead of
/// relying on these for control flow.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AllocationError {
    #[error("Invalid request by P{pid} for R{rid}: {reason}")]
    #[diagnostic(
        code(allocation::invalid_request),
        help("Requests need at least one instance and a process that has not terminated.")
    )]
    InvalidRequest { pid: Pid, rid: Rid, reason: String },

    #[error("Invalid release by P{pid} of R{rid}: {reason}")]
    #[diagnostic(
        code(allocation::invalid_release),
        help("A process can only release instances it currently holds.")
    )]
    InvalidRelease { pid: Pid, rid: Rid, reason: String },

    #[error("Process P{0} not found")]
    #[diagnostic(
        code(allocation::unknown_process),
        help("Register the process with System::add_process before using it.")
    )]
    UnknownProcess(Pid),

    #[error("Resource R{0} not found")]
    #[diagnostic(
        code(allocation::unknown_resource),
        help("Register the resource with System::add_resource before using it.")
    )]
    UnknownResource(Rid),

    #[error("Process P{0} already registered")]
    #[diagnostic(code(allocation::duplicate_process), help("Process ids must be unique."))]
    DuplicateProcess(Pid),

    #[error("Resource R{0} already registered")]
    #[diagnostic(code(allocation::duplicate_resource), help("Resource ids must be unique."))]
    DuplicateResource(Rid),

    #[error("Resource R{0} must have at least one instance")]
    #[diagnostic(
        code(allocation::invalid_capacity),
        help("Create resources with a positive instance count.")
    )]
    InvalidCapacity(Rid),

    #[error("Inconsistent system state: {0}")]
    #[diagnostic(
        code(allocation::inconsistent_state),
        help("Restored state must satisfy conservation, and a process must be WAITING exactly when it has pending requests.")
    )]
    InconsistentState(String),
}

impl AllocationError {
    pub(crate) fn invalid_request(pid: Pid, rid: Rid, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            pid,
            rid,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_release(pid: Pid, rid: Rid, reason: impl Into<String>) -> Self {
        Self::InvalidRelease {
            pid,
            rid,
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(reason: impl Into<String>) -> Self {
        Self::InconsistentState(reason.into())
    }
}

/// A broken post-resolution invariant
///
/// Verification failures are programmer-error territory: they are reported,
/// never retried.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "failure", rename_all = "snake_case")]
pub enum VerificationFailure {
    #[error("allocation graph still has a cycle through {processes:?}")]
    #[diagnostic(code(verification::cycle_remains))]
    CycleRemains { processes: Vec<Pid> },

    #[error("safety check reports an unsafe state for {processes:?}")]
    #[diagnostic(code(verification::unsafe_state))]
    UnsafeState { processes: Vec<Pid> },

    #[error("process P{pid} is still waiting")]
    #[diagnostic(
        code(verification::process_waiting),
        help("Run System::step to grant pending requests before verifying.")
    )]
    ProcessWaiting { pid: Pid },

    #[error("resource R{rid} is inconsistent: allocated {allocated} + available {available} != total {total}")]
    #[diagnostic(code(verification::inconsistent_resource))]
    InconsistentResource {
        rid: Rid,
        allocated: Instances,
        available: Instances,
        total: Instances,
    },
}

/// Resolution-engine errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ResolutionError {
    #[error("Unknown strategy: {0}")]
    #[diagnostic(
        code(resolution::unknown_strategy),
        help("Use one of: termination, preemption, rollback.")
    )]
    UnknownStrategy(String),

    #[error("Verification failed: {0}")]
    #[diagnostic(transparent)]
    Verification(#[from] VerificationFailure),

    #[error("Allocation error during resolution: {0}")]
    #[diagnostic(transparent)]
    Allocation(#[from] AllocationError),
}

/// Unified simulator error with miette diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum SimError {
    #[error("Allocation error: {0}")]
    #[diagnostic(transparent)]
    Allocation(#[from] AllocationError),

    #[error("Resolution error: {0}")]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(sim::configuration_error),
        help("Check the DEADLOCK_SIM_* environment variables.")
    )]
    Configuration(String),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(sim::serialization_error))]
    Serialization(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

/// Serializable error representation for reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&SimError> for SerializableError {
    fn from(err: &SimError) -> Self {
        let error_type = match err {
            SimError::Allocation(_) => "allocation_error",
            SimError::Resolution(_) => "resolution_error",
            SimError::Configuration(_) => "configuration_error",
            SimError::Serialization(_) => "serialization_error",
        };
        Self {
            error_type: error_type.to_string(),
            message: err.to_string(),
            code: err.code().map(|c| c.to_string()),
        }
    }
}

/// Result type for allocation-model operations
pub type AllocationResult<T> = std::result::Result<T, AllocationError>;

/// Result type for resolution operations
pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;

/// Result type for the simulator binary and other top-level callers
pub type SimResult<T> = std::result::Result<T, SimError>;

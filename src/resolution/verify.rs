/*!
 * Resolution Verifier
 * Post-condition checks after a resolution attempt
 */

use super::resolver::DeadlockResolver;
use crate::core::errors::{ResolutionError, ResolutionResult, VerificationFailure};
use tracing::{info, warn};

impl DeadlockResolver<'_> {
    /// Check that the system is deadlock-free and consistent
    ///
    /// Checks run in order: no RAG cycle, safe state, no WAITING process,
    /// conservation for every resource. The first broken invariant is
    /// returned as [`ResolutionError::Verification`](crate::core::errors::ResolutionError::Verification).
    pub fn verify_resolution(&self) -> ResolutionResult<()> {
        if let Err(failure) = self.check_invariants() {
            warn!(%failure, "resolution verification failed");
            return Err(ResolutionError::Verification(failure));
        }
        info!("resolution verified");
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), VerificationFailure> {
        let detector = self.detector();

        let rag = detector.detect_via_rag();
        if rag.deadlocked {
            return Err(VerificationFailure::CycleRemains {
                processes: rag.processes,
            });
        }

        let safety = detector.detect_via_safety_check();
        if safety.deadlocked {
            return Err(VerificationFailure::UnsafeState {
                processes: safety.processes,
            });
        }

        if let Some(pid) = self.system().waiting_processes().first() {
            return Err(VerificationFailure::ProcessWaiting { pid: *pid });
        }

        self.system().check_conservation()
    }
}

/*!
 * Structured Tracing
 * Subscriber setup and timed spans for simulator phases
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Phases slower than this are reported at warn level
const SLOW_PHASE_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DEADLOCK_SIM_TRACE_JSON: Enable JSON output (default: false)
///
/// A second call is a no-op; the first subscriber stays installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "tracing initialized");
    }
}

/// Timed span around one simulator phase (detection, trials, step loop)
pub struct PhaseSpan {
    span: Span,
    start: Instant,
    phase: &'static str,
}

impl PhaseSpan {
    pub fn new(phase: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "phase",
            phase = phase,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        span.in_scope(|| debug!(phase, "phase started"));

        Self {
            span,
            start: Instant::now(),
            phase,
        }
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }
}

impl Drop for PhaseSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros());
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_PHASE_MS {
            warn!(
                phase = self.phase,
                duration_ms = duration.as_millis(),
                slow = true,
                "slow phase"
            );
        } else {
            debug!(
                phase = self.phase,
                duration_us = duration.as_micros(),
                "phase completed"
            );
        }
    }
}

/// Helper to open a [`PhaseSpan`]
#[inline]
pub fn span_phase(phase: &'static str) -> PhaseSpan {
    PhaseSpan::new(phase)
}

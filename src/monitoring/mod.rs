/*!
 * Monitoring
 * Tracing setup and phase timing
 */

mod tracer;

pub use tracer::{init_tracing, span_phase, PhaseSpan};

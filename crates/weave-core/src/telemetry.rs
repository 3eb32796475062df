//! Per-frame debug telemetry (spec §4.5 "debugProbe", §4.7 "A debug sink
//! may trace combine calls").
//!
//! Grounded on the teacher's `telemetry` module: small, named, best-effort
//! event emitters rather than a generic structured-logging facade. Unlike
//! the teacher's feature-gated free functions (which write JSONL directly
//! to stdout), this is an injectable `Arc<dyn TelemetrySink>` seam — the
//! executor holds one sink for its whole lifetime and calls it every frame,
//! so a free-function/stdout design would make it impossible for an
//! embedding host to redirect probe output without recompiling. Ambient,
//! non-deterministic-sensitive logging (compile timing, diagnostics) goes
//! through `tracing` instead; this sink is reserved for the
//! deterministic-sensitive per-frame trace data a host may want to capture
//! without perturbing evaluation.

use std::sync::Arc;

use crate::ident::{BusIndex, SigExprId, ValueSlot};

/// Sink for per-frame debug events (spec §4.5 `debugProbe`, §4.7 combine
/// tracing).
///
/// Implementations must not panic and should treat all calls as
/// best-effort; a sink that blocks or errors must not be allowed to abort
/// frame execution.
pub trait TelemetrySink: Send + Sync {
    /// Called once per `debugProbe` step with the slots it sampled and
    /// their current values, in declared order.
    fn probe(&self, slots: &[(ValueSlot, f64)]) {
        let _ = slots;
    }

    /// Called when a `sigCombine`/`fieldCombine` node folds its publisher
    /// terms, reporting the bus, the originating expression, the raw term
    /// values (sorted publisher order), and the folded result.
    fn combine(&self, bus: BusIndex, expr: SigExprId, terms: &[f64], result: f64) {
        let _ = (bus, expr, terms, result);
    }

    /// Called once per executed frame with the absolute frame time.
    fn frame_end(&self, t_abs_ms: f64) {
        let _ = t_abs_ms;
    }
}

/// A [`TelemetrySink`] that discards every event; the default when no host
/// sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {}

/// Convenience constructor for the default no-op sink, boxed the way the
/// executor stores it.
#[must_use]
pub fn null_sink() -> Arc<dyn TelemetrySink> {
    Arc::new(NullTelemetrySink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_accepts_every_event_without_panicking() {
        let sink = null_sink();
        sink.probe(&[(ValueSlot(0), 1.0)]);
        sink.combine(BusIndex(0), SigExprId(0), &[1.0, 2.0], 3.0);
        sink.frame_end(16.6);
    }
}

//! `TimeModel`: the tagged union describing how a program's time root drives
//! `tAbsMs`/`tModelMs`/`phase01`/`wrapEvent` (spec §3 "TimeModel").

/// Cyclic time wrap behavior (spec §3 "cyclic").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclicMode {
    /// Phase wraps `1.0 -> 0.0` and repeats.
    Loop,
    /// Phase bounces `0.0 -> 1.0 -> 0.0` without a discontinuity.
    PingPong,
}

/// The time model extracted from the patch's unique `TimeRoot` block (spec
/// §3, §4.2 pass3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeModel {
    /// Plays once from `0` to `duration_ms`, then clamps.
    Finite {
        /// Total duration in milliseconds.
        duration_ms: f64,
    },
    /// Repeats with a fixed period, emitting `phase01`/`wrapEvent`.
    Cyclic {
        /// Period in milliseconds.
        period_ms: f64,
        /// Loop vs. ping-pong wrap behavior.
        mode: CyclicMode,
    },
    /// Monotonic, unbounded time; no phase or wrap event.
    Infinite {
        /// Optional suggested trailing window, in milliseconds, for hosts
        /// that want to clip history (e.g. a scrolling oscilloscope view).
        /// Purely advisory; never consulted by the compiler or evaluator.
        suggested_ui_window_ms: Option<f64>,
    },
}

impl TimeModel {
    /// Resolves `InfiniteTimeRoot`'s declared ambiguity (spec §9 Open
    /// Questions): treated as cyclic when `period_ms` is set, otherwise a
    /// genuinely unbounded infinite model.
    #[must_use]
    pub fn infinite_or_cyclic(period_ms: Option<f64>, suggested_ui_window_ms: Option<f64>) -> Self {
        match period_ms {
            Some(period_ms) if period_ms > 0.0 => {
                Self::Cyclic { period_ms, mode: CyclicMode::Loop }
            }
            _ => Self::Infinite { suggested_ui_window_ms },
        }
    }

    /// Returns `true` if this model is cyclic (emits `phase01`/`wrapEvent`).
    #[must_use]
    pub const fn is_cyclic(&self) -> bool {
        matches!(self, Self::Cyclic { .. })
    }

    /// Computes `(tModelMs, phase01, wrapEvent)` for absolute time `t_abs_ms`
    /// given the previous frame's `phase01` (spec §4.5 timeDerive, §4.7
    /// "wrapEvent fires on the exact frame where phase wraps", property P5).
    #[must_use]
    pub fn derive(&self, t_abs_ms: f64, prev_phase: Option<f64>) -> (f64, Option<f64>, Option<bool>) {
        match self {
            Self::Finite { duration_ms } => {
                let t_model = t_abs_ms.min(*duration_ms).max(0.0);
                (t_model, None, None)
            }
            Self::Infinite { .. } => (t_abs_ms, None, None),
            Self::Cyclic { period_ms, mode } => {
                let t_model = if t_abs_ms.is_sign_negative() {
                    0.0
                } else {
                    t_abs_ms % period_ms
                };
                let raw_phase = (t_model / period_ms).clamp(0.0, 1.0 - f64::EPSILON);
                let phase = match mode {
                    CyclicMode::Loop => raw_phase,
                    CyclicMode::PingPong => {
                        let doubled = raw_phase * 2.0;
                        if doubled <= 1.0 {
                            doubled
                        } else {
                            2.0 - doubled
                        }
                    }
                };
                let wrapped = prev_phase.is_some_and(|prev| phase < prev);
                (t_model, Some(phase), Some(wrapped))
            }
        }
    }
}

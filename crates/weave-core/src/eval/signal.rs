//! The recursive signal evaluator (spec §4.7 "Signal evaluator").
//!
//! Given a `SigExprId` and a [`SigEnv`], evaluates recursively with a
//! per-frame memo (`SigFrameCache`) keyed by `SigExprId`, so a shared
//! subexpression (the same id referenced from two different parents) is
//! evaluated exactly once per frame regardless of how many parents read it.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::bus::{color_from_lane, color_to_lane, fold_color, fold_numeric};
use crate::const_pool::{ConstPool, ConstValue};
use crate::eval::kernels::{eval_binary, eval_clamp, eval_unary};
use crate::ident::SigExprId;
use crate::ir::{SigOp, SignalIr, StatefulOp};
use crate::state_buffer::{StateBuffer, StateCellLayout};
use crate::telemetry::TelemetrySink;

/// Per-frame time context supplied to every signal evaluation (spec §4.7,
/// "`SigEnv` containing `tAbsMs`, `tModelMs`, `phase01`, a wrap event").
#[derive(Debug, Clone, Copy)]
pub struct TimeContext {
    /// Absolute time in milliseconds since the program started.
    pub t_abs_ms: f64,
    /// Time in milliseconds relative to the active `TimeModel`.
    pub t_model_ms: f64,
    /// Normalized cyclic phase in `[0, 1)`, if the model is cyclic.
    pub phase01: Option<f64>,
    /// Edge-triggered wrap pulse, if the model is cyclic.
    pub wrap_event: Option<bool>,
}

/// Memoizes evaluated signal results for the current frame, so a shared
/// subexpression id is computed once regardless of fan-in.
#[derive(Debug, Clone, Default)]
pub struct SigFrameCache {
    values: FxHashMap<u32, f64>,
}

impl SigFrameCache {
    /// Creates an empty cache (called once per frame before evaluation).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the cache, ready for the next frame.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Evaluates `id` against `ir`, memoizing in `cache` and reading/writing
/// state through `state`. `bus_terms` supplies the already-sorted
/// publisher values for any `SigCombine` node reached during evaluation
/// (resolved by the caller ahead of time since term expressions themselves
/// are plain `SigExprId`s evaluated via ordinary recursion).
#[allow(clippy::too_many_arguments)]
pub fn evaluate(
    ir: &SignalIr,
    id: SigExprId,
    time: TimeContext,
    consts: &ConstPool,
    state: &mut StateBuffer,
    state_layout: &[StateCellLayout],
    cache: &mut SigFrameCache,
    telemetry: &Arc<dyn TelemetrySink>,
) -> f64 {
    if let Some(&cached) = cache.values.get(&id.0) {
        return cached;
    }
    let result = match ir.get(id) {
        SigOp::Const(const_id) => match consts.get(*const_id) {
            ConstValue::Number(n) => *n,
            ConstValue::Bool(b) => f64::from(u8::from(*b)),
            ConstValue::Array(_) | ConstValue::String(_) => 0.0,
        },
        SigOp::TimeAbsMs => time.t_abs_ms,
        SigOp::TimeModelMs => time.t_model_ms,
        SigOp::Phase01 => time.phase01.unwrap_or(0.0),
        SigOp::WrapEvent => f64::from(u8::from(time.wrap_event.unwrap_or(false))),
        SigOp::Map { src, kernel } => {
            let a = evaluate(ir, *src, time, consts, state, state_layout, cache, telemetry);
            eval_unary(*kernel, a)
        }
        SigOp::Zip { a, b, kernel } => {
            let av = evaluate(ir, *a, time, consts, state, state_layout, cache, telemetry);
            let bv = evaluate(ir, *b, time, consts, state, state_layout, cache, telemetry);
            eval_binary(*kernel, av, bv)
        }
        SigOp::Select { cond, t, f } => {
            let c = evaluate(ir, *cond, time, consts, state, state_layout, cache, telemetry);
            if c != 0.0 {
                evaluate(ir, *t, time, consts, state, state_layout, cache, telemetry)
            } else {
                evaluate(ir, *f, time, consts, state, state_layout, cache, telemetry)
            }
        }
        SigOp::Stateful { op, input, state: state_id, params } => {
            let input_val = evaluate(ir, *input, time, consts, state, state_layout, cache, telemetry);
            let param_vals: Vec<f64> = params
                .iter()
                .map(|p| match consts.get(*p) {
                    ConstValue::Number(n) => *n,
                    _ => 0.0,
                })
                .collect();
            let base = state_layout[state_id.0 as usize].offset;
            eval_stateful(*op, input_val, &param_vals, base, time, state)
        }
        SigOp::Transform { src, chain: _ } => {
            // Adapter/lens chains recorded by pass2 are numeric-identity at
            // the signal level today (int<->float widening happens at the
            // value-store storage-class boundary, not inside the evaluator);
            // `chain` is kept for debug provenance.
            evaluate(ir, *src, time, consts, state, state_layout, cache, telemetry)
        }
        SigOp::SigCombine { bus, terms, mode, is_color } => {
            let values: Vec<f64> = terms
                .iter()
                .map(|t| evaluate(ir, *t, time, consts, state, state_layout, cache, telemetry))
                .collect();
            let folded = if *is_color {
                let colors: Vec<_> = values.iter().copied().map(color_from_lane).collect();
                color_to_lane(fold_color(*mode, &colors))
            } else {
                fold_numeric(*mode, &values)
            };
            telemetry.combine(*bus, id, &values, folded);
            folded
        }
    };
    cache.values.insert(id.0, result);
    result
}

fn eval_stateful(
    op: StatefulOp,
    input: f64,
    params: &[f64],
    base: u32,
    time: TimeContext,
    state: &mut StateBuffer,
) -> f64 {
    match op {
        StatefulOp::EnvelopeAd => eval_envelope_ad(input, params, base, time, state),
        StatefulOp::PulseDivider => eval_pulse_divider(input, params, base, state),
    }
}

/// `EnvelopeAD` state machine (spec §4.7, "State-machine example").
///
/// State cells, in order: `triggerTime` (offset 0, init `-inf`),
/// `wasTriggered` (offset 1, init 0). `params`: `[attackMs, decayMs, peak]`.
fn eval_envelope_ad(trigger: f64, params: &[f64], base: u32, time: TimeContext, state: &mut StateBuffer) -> f64 {
    let attack_ms = params.first().copied().unwrap_or(0.0);
    let decay_ms = params.get(1).copied().unwrap_or(0.0);
    let peak = params.get(2).copied().unwrap_or(1.0);

    let mut trigger_time = state.read(base);
    let mut was_triggered = state.read(base + 1) != 0.0;

    if trigger > 0.5 && !was_triggered {
        trigger_time = time.t_abs_ms;
        was_triggered = true;
    } else if trigger <= 0.5 {
        was_triggered = false;
    }
    state.write(base, trigger_time);
    state.write(base + 1, f64::from(u8::from(was_triggered)));

    let elapsed = time.t_abs_ms - trigger_time;
    if elapsed < 0.0 {
        0.0
    } else if elapsed < attack_ms {
        (elapsed / attack_ms) * peak
    } else if elapsed < attack_ms + decay_ms {
        peak * (1.0 - (elapsed - attack_ms) / decay_ms)
    } else {
        0.0
    }
}

/// `PulseDivider` state machine (spec §4.7). State cell: `lastSubPhase`
/// (offset 0, init -1). `params`: `[divisions]`.
fn eval_pulse_divider(phase: f64, params: &[f64], base: u32, state: &mut StateBuffer) -> f64 {
    let divisions = params.first().copied().unwrap_or(1.0);
    let last_sub_phase = state.read(base);
    let sub_phase = libm::floor(phase * divisions);
    let emit = sub_phase != last_sub_phase;
    state.write(base, sub_phase);
    f64::from(u8::from(emit))
}

#[allow(dead_code)]
fn clamp_kernel_passthrough(value: f64, lo: f64, hi: f64) -> f64 {
    eval_clamp(value, lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::const_pool::ConstPool;
    use crate::ident::{ConstId, StateId};
    use crate::ir::Kernel;
    use crate::state_buffer::{StateBuffer, StateCellLayout};
    use crate::telemetry::null_sink;

    fn time_ctx(t: f64) -> TimeContext {
        TimeContext { t_abs_ms: t, t_model_ms: t, phase01: None, wrap_event: None }
    }

    #[test]
    fn const_node_returns_its_pool_value() {
        let mut ir = SignalIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(42.0);
        let id = ir.nodes.len();
        ir.nodes.push(SigOp::Const(c));
        let mut state = StateBuffer::new(&[], &consts).expect("empty state buffer");
        let mut cache = SigFrameCache::new();
        let sink = null_sink();
        let result = evaluate(&ir, SigExprId(id as u32), time_ctx(0.0), &consts, &mut state, &[], &mut cache, &sink);
        assert_eq!(result, 42.0);
    }

    #[test]
    fn map_applies_kernel_to_its_input() {
        let mut ir = SignalIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(-3.0);
        ir.nodes.push(SigOp::Const(c));
        ir.nodes.push(SigOp::Map { src: SigExprId(0), kernel: Kernel::Sub });
        let mut state = StateBuffer::new(&[], &consts).expect("empty state buffer");
        let mut cache = SigFrameCache::new();
        let sink = null_sink();
        let result = evaluate(&ir, SigExprId(1), time_ctx(0.0), &consts, &mut state, &[], &mut cache, &sink);
        assert_eq!(result, 3.0);
    }

    #[test]
    fn shared_subexpression_is_evaluated_once_per_frame() {
        let mut ir = SignalIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(1.0);
        ir.nodes.push(SigOp::Const(c));
        ir.nodes.push(SigOp::Zip { a: SigExprId(0), b: SigExprId(0), kernel: Kernel::Add });
        let mut state = StateBuffer::new(&[], &consts).expect("empty state buffer");
        let mut cache = SigFrameCache::new();
        let sink = null_sink();
        let result = evaluate(&ir, SigExprId(1), time_ctx(0.0), &consts, &mut state, &[], &mut cache, &sink);
        assert_eq!(result, 2.0);
        assert!(cache.values.contains_key(&0));
    }

    #[test]
    fn envelope_ad_rises_then_falls() {
        let mut ir = SignalIr::default();
        let mut consts = ConstPool::new();
        let trigger_const = consts.intern_number(1.0);
        let attack = consts.intern_number(100.0);
        let decay = consts.intern_number(100.0);
        let peak = consts.intern_number(1.0);
        ir.nodes.push(SigOp::Const(trigger_const));
        ir.nodes.push(SigOp::Stateful {
            op: StatefulOp::EnvelopeAd,
            input: SigExprId(0),
            state: StateId(0),
            params: vec![attack, decay, peak],
        });
        let neg_inf = consts.intern_number(f64::NEG_INFINITY);
        let zero = consts.intern_number(0.0);
        let layouts =
            vec![StateCellLayout { offset: 0, len: 1, initial_const_id: neg_inf },
                 StateCellLayout { offset: 1, len: 1, initial_const_id: zero }];
        let mut state = StateBuffer::new(&layouts, &consts).expect("state buffer");
        let mut cache = SigFrameCache::new();
        let sink = null_sink();
        let at_0 = evaluate(&ir, SigExprId(1), time_ctx(0.0), &consts, &mut state, &layouts, &mut cache, &sink);
        cache.clear();
        let at_50 = evaluate(&ir, SigExprId(1), time_ctx(50.0), &consts, &mut state, &layouts, &mut cache, &sink);
        assert!(at_0 <= at_50);
        assert!(at_50 > 0.0 && at_50 <= 1.0);
    }

    #[test]
    fn pulse_divider_emits_once_per_subdivision_change() {
        let mut ir = SignalIr::default();
        let mut consts = ConstPool::new();
        let phase_const = consts.intern_number(0.3);
        let divisions = consts.intern_number(4.0);
        ir.nodes.push(SigOp::Const(phase_const));
        ir.nodes.push(SigOp::Stateful {
            op: StatefulOp::PulseDivider,
            input: SigExprId(0),
            state: StateId(0),
            params: vec![divisions],
        });
        let neg_one = consts.intern_number(-1.0);
        let layouts = vec![StateCellLayout { offset: 0, len: 1, initial_const_id: neg_one }];
        let mut state = StateBuffer::new(&layouts, &consts).expect("state buffer");
        let mut cache = SigFrameCache::new();
        let sink = null_sink();
        let first = evaluate(&ir, SigExprId(1), time_ctx(0.0), &consts, &mut state, &layouts, &mut cache, &sink);
        cache.clear();
        let second = evaluate(&ir, SigExprId(1), time_ctx(16.0), &consts, &mut state, &layouts, &mut cache, &sink);
        assert_eq!(first, 1.0);
        assert_eq!(second, 0.0);
    }
}

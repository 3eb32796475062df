//! Stateful signal blocks (spec §4.7 "EnvelopeAD", "PulseDivider").
//!
//! Both blocks allocate their own state cells at lowering time and emit a
//! single `SigOp::Stateful` node; the actual state-machine logic lives in
//! `crate::eval::signal::eval_stateful` and is exercised there directly —
//! these definitions are just the catalog-facing wiring.

use crate::blocks::util::as_sig;
use crate::catalog::{BlockDef, Capability, DefaultSource, PortDef, ResolvedValue};
use crate::ir::{SigOp, StatefulOp};
use crate::types::{Category, DomainTag, TypeDesc, World};

fn signal_port(port_id: &'static str, label: &'static str, domain: DomainTag, default: Option<DefaultSource>) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Signal, domain, Category::Core), default }
}

/// `EnvelopeAD`: attack/decay envelope triggered by a `Trigger` input.
/// Params: `attackMs`, `decayMs`, `peak`. State cells: `triggerTime`
/// (seed `-inf`), `wasTriggered` (seed `0`).
#[must_use]
pub fn envelope_ad() -> BlockDef {
    BlockDef {
        type_key: "EnvelopeAD",
        inputs: vec![signal_port("trigger", "Trigger", DomainTag::Trigger, Some(DefaultSource::Const(0.0)))],
        outputs: vec![signal_port("out", "Out", DomainTag::Float, None)],
        capability: Capability::State,
        uses_state: true,
        relaxed: false,
        lower: |ctx, inputs| {
            let trigger = as_sig(ctx, inputs.get(0))?;
            let attack = inputs.param("attackMs", 100.0);
            let decay = inputs.param("decayMs", 200.0);
            let peak = inputs.param("peak", 1.0);

            let neg_inf = ctx.builder.intern_number(f64::NEG_INFINITY);
            let zero = ctx.builder.intern_number(0.0);
            let trigger_time_cell = ctx.builder.alloc_state_cell(1, neg_inf);
            let _was_triggered_cell = ctx.builder.alloc_state_cell(1, zero);

            let attack_id = ctx.builder.intern_number(attack);
            let decay_id = ctx.builder.intern_number(decay);
            let peak_id = ctx.builder.intern_number(peak);
            let id = ctx.builder.push_sig(
                SigOp::Stateful {
                    op: StatefulOp::EnvelopeAd,
                    input: trigger,
                    state: trigger_time_cell,
                    params: vec![attack_id, decay_id, peak_id],
                },
                Some(&ctx.block_id),
            );
            Ok(vec![ResolvedValue::Sig(id)])
        },
    }
}

/// `PulseDivider`: emits a trigger pulse every `1/divisions` of the
/// incoming cyclic phase. Param: `divisions`. State cell: `lastSubPhase`
/// (seed `-1`).
#[must_use]
pub fn pulse_divider() -> BlockDef {
    BlockDef {
        type_key: "PulseDivider",
        inputs: vec![signal_port("phase", "Phase", DomainTag::Phase01, Some(DefaultSource::Required))],
        outputs: vec![signal_port("out", "Out", DomainTag::Trigger, None)],
        capability: Capability::State,
        uses_state: true,
        relaxed: false,
        lower: |ctx, inputs| {
            let phase = as_sig(ctx, inputs.get(0))?;
            let divisions = inputs.param("divisions", 4.0);

            let neg_one = ctx.builder.intern_number(-1.0);
            let cell = ctx.builder.alloc_state_cell(1, neg_one);
            let divisions_id = ctx.builder.intern_number(divisions);
            let id = ctx.builder.push_sig(
                SigOp::Stateful {
                    op: StatefulOp::PulseDivider,
                    input: phase,
                    state: cell,
                    params: vec![divisions_id],
                },
                Some(&ctx.block_id),
            );
            Ok(vec![ResolvedValue::Sig(id)])
        },
    }
}

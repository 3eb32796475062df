//! pass8 — schedule build (spec §4.2 "pass8").
//!
//! Turns the frozen [`crate::builder::BuilderProgramIr`]'s pending write
//! lists into a capability-ordered [`Schedule`] via
//! [`Schedule::from_unordered`]; no topological analysis is needed here
//! since every dependency was already resolved recursively during
//! lowering — pass8 only has to rank the *root* writes correctly relative
//! to each other.

use crate::builder::BuilderProgramIr;
use crate::ident::RenderSpecId;
use crate::passes::pass3::TimeRootBinding;
use crate::schedule::{Schedule, StepKind};

/// Builds the final schedule from a lowered program and the resolved time
/// root, in capability-rank order (spec: time, then identity/pure/state,
/// then bus combines, then render).
///
/// A debug probe over the time-derive outputs is always injected (spec
/// §4.2 pass8: "debug probe steps may be injected for time-derive
/// outputs"). When `full_probe` is set (`Settings::emit_ir`), every other
/// write gets its own trailing probe too ("...or after every step in
/// full-probe mode").
#[must_use]
pub fn build_schedule(
    program: &BuilderProgramIr,
    time_root: &TimeRootBinding,
    render_specs: &[RenderSpecId],
    full_probe: bool,
) -> Schedule {
    let mut kinds = Vec::new();

    kinds.push(StepKind::TimeDerive {
        t_abs_slot: time_root.t_abs_slot,
        t_model_slot: time_root.t_model_slot,
        cyclic_slots: time_root.cyclic_slots,
    });

    let mut time_probe_slots = vec![time_root.t_abs_slot, time_root.t_model_slot];
    if let Some((phase_slot, wrap_slot)) = time_root.cyclic_slots {
        time_probe_slots.push(phase_slot);
        time_probe_slots.push(wrap_slot);
    }
    kinds.push(StepKind::DebugProbe { slots: time_probe_slots, after: None });

    for write in &program.sig_writes {
        kinds.push(StepKind::SigEval { expr: write.expr, target: write.target });
        if full_probe {
            kinds.push(StepKind::DebugProbe { slots: vec![write.target], after: None });
        }
    }
    for write in &program.field_writes {
        kinds.push(StepKind::FieldEval { expr: write.expr, domain: write.domain, target: write.target });
        if full_probe {
            kinds.push(StepKind::DebugProbe { slots: vec![write.target], after: None });
        }
    }
    for write in &program.bus_sig_writes {
        kinds.push(StepKind::BusEval { bus: write.bus, sig_expr: Some(write.expr), field_expr: None, target: write.target });
        if full_probe {
            kinds.push(StepKind::DebugProbe { slots: vec![write.target], after: None });
        }
    }
    for write in &program.bus_field_writes {
        kinds.push(StepKind::BusEval { bus: write.bus, sig_expr: None, field_expr: Some(write.expr), target: write.target });
        if full_probe {
            kinds.push(StepKind::DebugProbe { slots: vec![write.target], after: None });
        }
    }

    if !render_specs.is_empty() {
        kinds.push(StepKind::Render { render_specs: render_specs.to_vec() });
    }

    Schedule::from_unordered(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IRBuilder;
    use crate::catalog::ResolvedValue;
    use crate::ir::SigOp;
    use crate::time_model::TimeModel;
    use crate::types::{Category, DomainTag, TypeDesc, World};

    fn infinite_time_root(builder: &mut IRBuilder) -> TimeRootBinding {
        let block_id = weave_abi::patch::BlockId("t".into());
        let t_abs_expr = builder.push_sig(SigOp::TimeAbsMs, Some(&block_id));
        let t_model_expr = builder.push_sig(SigOp::TimeModelMs, Some(&block_id));
        let time_ms_ty = || TypeDesc::scalar(World::Signal, DomainTag::TimeMs, Category::Internal);
        let t_abs_slot = builder.alloc_value_slot(time_ms_ty(), Some(block_id.clone()), None);
        let t_model_slot = builder.alloc_value_slot(time_ms_ty(), Some(block_id.clone()), None);
        TimeRootBinding {
            block_id,
            model: TimeModel::Infinite { suggested_ui_window_ms: None },
            t_abs: ResolvedValue::Sig(t_abs_expr),
            t_model: ResolvedValue::Sig(t_model_expr),
            phase01: None,
            wrap_event: None,
            t_abs_slot,
            t_model_slot,
            cyclic_slots: None,
        }
    }

    #[test]
    fn time_derive_outputs_are_always_probed() {
        let mut builder = IRBuilder::new();
        let time_root = infinite_time_root(&mut builder);
        let program = builder.build();
        let schedule = build_schedule(&program, &time_root, &[], false);
        let probes: Vec<_> = schedule.steps.iter().filter(|s| matches!(s.kind, StepKind::DebugProbe { .. })).collect();
        assert_eq!(probes.len(), 1, "exactly one always-on time-derive probe, no full-probe writes to sample");
    }

    #[test]
    fn full_probe_mode_adds_a_probe_per_write() {
        let mut builder = IRBuilder::new();
        let time_root = infinite_time_root(&mut builder);
        let c = builder.intern_number(1.0);
        let expr = builder.push_sig(SigOp::Const(c), None);
        let ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        builder.schedule_sig(expr, ty, None, None);
        let program = builder.build();
        let schedule = build_schedule(&program, &time_root, &[], true);
        let probes = schedule.steps.iter().filter(|s| matches!(s.kind, StepKind::DebugProbe { .. })).count();
        assert_eq!(probes, 2, "one time-derive probe plus one per signal write");
    }
}

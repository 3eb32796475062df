//! pass3 — time topology (spec §4.2 "pass3", §3 "TimeRoot").
//!
//! Scans for exactly one `Capability::Time` block, builds its
//! [`TimeModel`] from declared params, and allocates the program's single
//! canonical `tAbsMs`/`tModelMs`/`phase01`/`wrapEvent` signal expression
//! nodes. Every other block's reference to the time root's output ports
//! resolves to these same ids (spec: "time is a singleton per program").

use weave_abi::patch::BlockId;

use crate::builder::IRBuilder;
use crate::catalog::{BlockCatalog, Capability, ResolvedValue};
use crate::error::CompileError;
use crate::ident::{SigExprId, ValueSlot};
use crate::ir::SigOp;
use crate::time_model::{CyclicMode, TimeModel};
use crate::types::{Category, DomainTag, TypeDesc, World};

fn param(block: &weave_abi::patch::Block, name: &str, default: f64) -> f64 {
    block.params.get(name).and_then(weave_abi::value::Value::as_number).unwrap_or(default)
}

/// The time root's resolved outputs, keyed by declared port id, plus the
/// program's chosen `TimeModel`.
pub struct TimeRootBinding {
    /// The time root block's author id.
    pub block_id: BlockId,
    /// Resolved `TimeModel` governing `tModelMs`/`phase01`/`wrapEvent`.
    pub model: TimeModel,
    /// `tAbsMs` output, always bound.
    pub t_abs: ResolvedValue,
    /// `tModelMs` output, always bound.
    pub t_model: ResolvedValue,
    /// `phase01` output, bound only under a cyclic model.
    pub phase01: Option<ResolvedValue>,
    /// `wrapEvent` output, bound only under a cyclic model.
    pub wrap_event: Option<ResolvedValue>,
    /// Slot the executor's `TimeDerive` step writes `tAbsMs` into.
    pub t_abs_slot: ValueSlot,
    /// Slot the executor's `TimeDerive` step writes `tModelMs` into.
    pub t_model_slot: ValueSlot,
    /// Slots the executor's `TimeDerive` step writes `phase01`/`wrapEvent`
    /// into, present only under a cyclic model.
    pub cyclic_slots: Option<(ValueSlot, ValueSlot)>,
}

impl TimeRootBinding {
    /// Resolves one of the time root's four declared output ports.
    #[must_use]
    pub fn output(&self, port_id: &str) -> Option<ResolvedValue> {
        match port_id {
            "tAbsMs" => Some(self.t_abs),
            "tModelMs" => Some(self.t_model),
            "phase01" => self.phase01,
            "wrapEvent" => self.wrap_event,
            _ => None,
        }
    }
}

/// Finds the program's one time root and allocates its canonical signal
/// nodes. Returns `MissingTimeRoot`/`MultipleTimeRoots` if zero or more than
/// one `Capability::Time` block is present.
pub fn resolve_time_root(
    blocks: &[weave_abi::patch::Block],
    catalog: &BlockCatalog,
    builder: &mut IRBuilder,
) -> Result<TimeRootBinding, CompileError> {
    let roots: Vec<&weave_abi::patch::Block> = blocks
        .iter()
        .filter(|b| catalog.get(&b.block_type).is_some_and(|def| matches!(def.capability, Capability::Time)))
        .collect();

    match roots.len() {
        0 => return Err(CompileError::MissingTimeRoot),
        1 => {}
        _ => return Err(CompileError::MultipleTimeRoots(roots.into_iter().map(|b| b.id.clone()).collect())),
    }
    let root = roots[0];

    let model = match root.block_type.as_str() {
        "CycleTimeRoot" => {
            let period_ms = param(root, "periodMs", 1000.0);
            let mode = if param(root, "pingPong", 0.0) != 0.0 { CyclicMode::PingPong } else { CyclicMode::Loop };
            TimeModel::Cyclic { period_ms, mode }
        }
        "FiniteTimeRoot" => TimeModel::Finite { duration_ms: param(root, "durationMs", 1000.0) },
        "InfiniteTimeRoot" => {
            let period_ms = root.params.get("periodMs").and_then(weave_abi::value::Value::as_number);
            let window_ms = root.params.get("suggestedUiWindowMs").and_then(weave_abi::value::Value::as_number);
            TimeModel::infinite_or_cyclic(period_ms, window_ms)
        }
        other => {
            return Err(CompileError::InvalidConnection { reason: format!("unknown time root type {other:?}") });
        }
    };

    let t_abs_expr: SigExprId = builder.push_sig(SigOp::TimeAbsMs, Some(&root.id));
    let t_model_expr: SigExprId = builder.push_sig(SigOp::TimeModelMs, Some(&root.id));
    let time_ms_ty = || TypeDesc::scalar(World::Signal, DomainTag::TimeMs, Category::Internal);
    let t_abs_slot = builder.alloc_value_slot(time_ms_ty(), Some(root.id.clone()), Some("tAbsMs".into()));
    let t_model_slot = builder.alloc_value_slot(time_ms_ty(), Some(root.id.clone()), Some("tModelMs".into()));
    let (phase01, wrap_event, cyclic_slots) = if model.is_cyclic() {
        let phase = builder.push_sig(SigOp::Phase01, Some(&root.id));
        let wrap = builder.push_sig(SigOp::WrapEvent, Some(&root.id));
        let phase_ty = TypeDesc::scalar(World::Signal, DomainTag::Phase01, Category::Internal);
        let wrap_ty = TypeDesc::scalar(World::Signal, DomainTag::Trigger, Category::Internal);
        let phase_slot = builder.alloc_value_slot(phase_ty, Some(root.id.clone()), Some("phase01".into()));
        let wrap_slot = builder.alloc_value_slot(wrap_ty, Some(root.id.clone()), Some("wrapEvent".into()));
        (Some(ResolvedValue::Sig(phase)), Some(ResolvedValue::Sig(wrap)), Some((phase_slot, wrap_slot)))
    } else {
        (None, None, None)
    };

    Ok(TimeRootBinding {
        block_id: root.id.clone(),
        model,
        t_abs: ResolvedValue::Sig(t_abs_expr),
        t_model: ResolvedValue::Sig(t_model_expr),
        phase01,
        wrap_event,
        t_abs_slot,
        t_model_slot,
        cyclic_slots,
    })
}

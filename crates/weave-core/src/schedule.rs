//! The compiled schedule (spec §4.2 pass8, §4.5 "Schedule executor").
//!
//! A `Schedule` is the pure function of IR that pass8 computes once at
//! compile time: a topologically-ordered list of [`Step`]s, each tagged
//! with a [`StepKind`] so the executor can dispatch without re-deriving
//! dependency order every frame. Capability ordering (spec §4.2, pass8):
//! time steps first, then identity, then pure+state, then bus combines
//! whose inputs are ready, then render and io; ties break by step id.

use crate::ident::{BusIndex, DomainId, FieldExprId, RenderSpecId, SigExprId, StepId, ValueSlot};

/// What kind of work a schedule step performs.
#[derive(Debug, Clone)]
pub enum StepKind {
    /// Computes `tAbsMs`, `tModelMs`, `phase01` (cyclic models only), and
    /// `wrapEvent` (cyclic models only) into their reserved slots.
    TimeDerive {
        /// Slot receiving absolute time in milliseconds.
        t_abs_slot: ValueSlot,
        /// Slot receiving time-model-relative milliseconds.
        t_model_slot: ValueSlot,
        /// Slots receiving `phase01`/`wrapEvent`, present only under a
        /// cyclic time model.
        cyclic_slots: Option<(ValueSlot, ValueSlot)>,
    },
    /// Evaluates a signal expression subtree and writes its root result.
    SigEval {
        /// Root expression to evaluate.
        expr: SigExprId,
        /// Destination slot(s); width is implied by the expression's type.
        target: ValueSlot,
    },
    /// Materializes a field expression for a domain.
    FieldEval {
        /// Root expression to evaluate.
        expr: FieldExprId,
        /// Domain supplying the element count.
        domain: DomainId,
        /// Destination slot range (object-class handle).
        target: ValueSlot,
    },
    /// A bus combine step. Structurally identical to `SigEval`/`FieldEval`
    /// at execution time (spec §4.5: "busEval — effectively identical...
    /// busRoots is debug metadata only"); kept as a distinct variant purely
    /// for schedule-dump readability.
    BusEval {
        /// Which bus this combine step belongs to (debug only).
        bus: BusIndex,
        /// The underlying signal combine, if this bus is signal-world.
        sig_expr: Option<SigExprId>,
        /// The underlying field combine, if this bus is field-world.
        field_expr: Option<FieldExprId>,
        /// Destination slot.
        target: ValueSlot,
    },
    /// Reads a fixed list of slots and forwards them to the debug sink.
    DebugProbe {
        /// Slots to sample.
        slots: Vec<ValueSlot>,
        /// The step this probe was injected after (for unique-id purposes
        /// and dump readability), if any.
        after: Option<StepId>,
    },
    /// Composes the final `RenderTree` from every render-capability block's
    /// lowered [`crate::render_spec::RenderSpec`], in declaration order.
    Render {
        /// Render specs feeding the final tree.
        render_specs: Vec<RenderSpecId>,
    },
}

impl StepKind {
    /// Capability rank used for pass8's step ordering (spec §4.2: "time
    /// steps first, then identity, then pure+state, then bus combines...
    /// then render and io"). Lower sorts first.
    #[must_use]
    pub const fn capability_rank(&self) -> u8 {
        match self {
            Self::TimeDerive { .. } => 0,
            Self::SigEval { .. } | Self::FieldEval { .. } => 1,
            Self::BusEval { .. } => 2,
            Self::DebugProbe { .. } => 3,
            Self::Render { .. } => 4,
        }
    }
}

/// One scheduled unit of work.
#[derive(Debug, Clone)]
pub struct Step {
    /// Stable id, assigned in final schedule order; used for tie-breaking
    /// and as `DebugProbe::after`'s target.
    pub id: StepId,
    /// What this step does.
    pub kind: StepKind,
}

/// The compiled, topologically-ordered list of steps for one program.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// Steps in final execution order.
    pub steps: Vec<Step>,
}

impl Schedule {
    /// Builds a schedule from already-ordered steps, assigning dense
    /// `StepId`s in list order.
    #[must_use]
    pub fn from_ordered(kinds: Vec<StepKind>) -> Self {
        let steps = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Step { id: StepId(u32::try_from(i).unwrap_or(u32::MAX)), kind })
            .collect();
        Self { steps }
    }

    /// Sorts `kinds` by capability rank (stable, so equal-rank entries keep
    /// their relative input order — the deterministic tie-break by
    /// insertion order referenced in spec §4.2, "ties break by step id").
    #[must_use]
    pub fn from_unordered(mut kinds: Vec<StepKind>) -> Self {
        kinds.sort_by_key(StepKind::capability_rank);
        Self::from_ordered(kinds)
    }

    /// Number of steps in the schedule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the schedule has no steps (only possible for an
    /// empty/failed compile).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_rank_orders_time_before_render() {
        let time = StepKind::TimeDerive {
            t_abs_slot: ValueSlot(0),
            t_model_slot: ValueSlot(1),
            cyclic_slots: None,
        };
        let render = StepKind::Render { render_specs: vec![] };
        assert!(time.capability_rank() < render.capability_rank());
    }

    #[test]
    fn from_unordered_sorts_stably_by_capability_rank() {
        let render = StepKind::Render { render_specs: vec![] };
        let sig_a = StepKind::SigEval { expr: SigExprId(0), target: ValueSlot(2) };
        let sig_b = StepKind::SigEval { expr: SigExprId(1), target: ValueSlot(3) };
        let schedule = Schedule::from_unordered(vec![render, sig_a, sig_b]);
        assert!(matches!(schedule.steps[0].kind, StepKind::SigEval { expr: SigExprId(0), .. }));
        assert!(matches!(schedule.steps[1].kind, StepKind::SigEval { expr: SigExprId(1), .. }));
        assert!(matches!(schedule.steps[2].kind, StepKind::Render { .. }));
    }

    #[test]
    fn step_ids_are_dense_in_final_order() {
        let schedule = Schedule::from_ordered(vec![
            StepKind::Render { render_specs: vec![] },
            StepKind::Render { render_specs: vec![] },
        ]);
        assert_eq!(schedule.steps[0].id, StepId(0));
        assert_eq!(schedule.steps[1].id, StepId(1));
    }
}

//! `IRBuilder`: single responsibility id/const/slot allocation (spec §4.3
//! "IRBuilder contract").
//!
//! Every compiler pass that needs to add an expression, allocate a value
//! slot, or intern a constant goes through one `IRBuilder` instance shared
//! across pass4 (composite expansion may emit new constants), pass6 (block
//! lowering), and pass7 (bus lowering). `build()` freezes the accumulated
//! tables into an immutable [`BuilderProgramIr`].

use std::collections::BTreeMap;

use weave_abi::patch::BlockId;

use crate::const_pool::{ConstPool, ConstValue};
use crate::domain::DomainDesc;
use crate::ident::{
    BusIndex, ConstId, Counter, DomainId, FieldExprId, RenderSpecId, SigExprId, StateId, TransformChainId,
    ValueSlot,
};
use crate::ir::{FieldIr, FieldOp, SigOp, SignalIr};
use crate::render_spec::RenderSpec;
use crate::state_buffer::StateLayoutBuilder;
use crate::types::{Category, DomainTag, TypeDesc, World};

/// One signal expression pass8 must schedule a `SigEval` step for: its root
/// is read back from `ValueStore` by some other consumer (a render spec, a
/// `BroadcastSig` source, a listener lens chain) rather than only ever being
/// reached by ordinary recursive evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SigWrite {
    /// The expression to evaluate.
    pub expr: SigExprId,
    /// Where the result lands.
    pub target: ValueSlot,
}

/// One field expression pass8 must schedule a `FieldEval` step for, so its
/// materialization (and `FieldFrameCache` population) happens at the
/// capability-ordered point pass8 assigns rather than lazily inside the
/// render step.
#[derive(Debug, Clone, Copy)]
pub struct FieldWrite {
    /// The expression to materialize.
    pub expr: FieldExprId,
    /// The domain to materialize it over.
    pub domain: DomainId,
    /// Placeholder slot recorded for debug provenance only; the field's
    /// actual value lives in the `FieldFrameCache`, never `ValueStore`.
    pub target: ValueSlot,
}

/// One bus combine pass8 must schedule a `BusEval` step for (spec §4.2
/// pass7/pass8): mechanically identical to [`SigWrite`]/[`FieldWrite`] but
/// kept in its own list so pass8 can rank it after ordinary pure/state
/// writes and before render, per the capability ordering.
#[derive(Debug, Clone, Copy)]
pub struct BusSigWrite {
    /// Which bus this combine belongs to.
    pub bus: BusIndex,
    /// The combine's root expression.
    pub expr: SigExprId,
    /// Where the result lands.
    pub target: ValueSlot,
}

/// Field-world counterpart to [`BusSigWrite`].
#[derive(Debug, Clone, Copy)]
pub struct BusFieldWrite {
    /// Which bus this combine belongs to.
    pub bus: BusIndex,
    /// The combine's root expression.
    pub expr: FieldExprId,
    /// Domain the combine is materialized over.
    pub domain: DomainId,
    /// Placeholder slot, debug provenance only (see [`FieldWrite::target`]).
    pub target: ValueSlot,
}

/// Debug provenance for one value slot: which block/port produced it and
/// its declared type, for schedule dumps and error messages.
#[derive(Debug, Clone)]
pub struct SlotMeta {
    /// Declared type.
    pub ty: TypeDesc,
    /// Scalar-slot arity (number of consecutive lanes reserved).
    pub arity: u32,
    /// Owning block, for debug dumps (`blockId.slotId`).
    pub owner: Option<BlockId>,
    /// Optional human-readable hint (e.g. a port name).
    pub debug_name: Option<String>,
}

/// Accumulates expression tables, the const pool, state layout, and debug
/// provenance as the compiler passes run; frozen into a
/// [`BuilderProgramIr`] by [`IRBuilder::build`].
#[derive(Default)]
pub struct IRBuilder {
    sig_nodes: Vec<SigOp>,
    field_nodes: Vec<FieldOp>,
    consts: ConstPool,
    state: StateLayoutBuilder,
    slot_counter: Counter,
    domain_counter: Counter,
    bus_counter: Counter,
    chain_counter: Counter,
    slot_meta: BTreeMap<u32, SlotMeta>,
    sig_expr_source: BTreeMap<u32, BlockId>,
    field_expr_source: BTreeMap<u32, BlockId>,
    render_specs: Vec<RenderSpec>,
    domain_descs: BTreeMap<u32, DomainDesc>,
    sig_writes: Vec<SigWrite>,
    field_writes: Vec<FieldWrite>,
    bus_sig_writes: Vec<BusSigWrite>,
    bus_field_writes: Vec<BusFieldWrite>,
}

impl IRBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a signal expression node, returning its id.
    pub fn push_sig(&mut self, node: SigOp, owner: Option<&BlockId>) -> SigExprId {
        let id = SigExprId(u32::try_from(self.sig_nodes.len()).unwrap_or(u32::MAX));
        self.sig_nodes.push(node);
        if let Some(block) = owner {
            self.sig_expr_source.insert(id.0, block.clone());
        }
        id
    }

    /// Appends a field expression node, returning its id.
    pub fn push_field(&mut self, node: FieldOp, owner: Option<&BlockId>) -> FieldExprId {
        let id = FieldExprId(u32::try_from(self.field_nodes.len()).unwrap_or(u32::MAX));
        self.field_nodes.push(node);
        if let Some(block) = owner {
            self.field_expr_source.insert(id.0, block.clone());
        }
        id
    }

    /// Interns a numeric constant, deduplicating structurally.
    pub fn intern_number(&mut self, n: f64) -> ConstId {
        self.consts.intern_number(n)
    }

    /// Interns a constant value, deduplicating structurally.
    pub fn intern_const(&mut self, value: ConstValue) -> ConstId {
        self.consts.intern(value)
    }

    /// Allocates a `ValueSlot` spanning `ty.arity()` consecutive lanes,
    /// recording its metadata (spec §4.3, "`allocValueSlot(type)` advances
    /// the next-slot counter by the type's scalar-slot arity").
    pub fn alloc_value_slot(&mut self, ty: TypeDesc, owner: Option<BlockId>, debug_name: Option<String>) -> ValueSlot {
        let arity = ty.arity();
        let start = self.slot_counter.next_n(arity);
        let slot = ValueSlot(start);
        self.slot_meta.insert(start, SlotMeta { ty, arity, owner, debug_name });
        slot
    }

    /// Allocates a new state cell of `len` elements seeded from
    /// `initial_const_id`.
    pub fn alloc_state_cell(&mut self, len: u32, initial_const_id: ConstId) -> StateId {
        self.state.alloc(len, initial_const_id)
    }

    /// Allocates a new domain id (identity-capability blocks only) and
    /// records its concrete descriptor, so the field materializer and
    /// render step can look it up by `DomainId` at frame-evaluation time.
    pub fn alloc_domain(&mut self, desc: DomainDesc) -> DomainId {
        let id = DomainId(self.domain_counter.next());
        self.domain_descs.insert(id.0, desc);
        id
    }

    /// Allocates a new bus index (pass2, in bus-declaration order).
    pub fn alloc_bus_index(&mut self) -> BusIndex {
        BusIndex(self.bus_counter.next())
    }

    /// Allocates a new transform-chain id (pass2, adapter/lens chains).
    pub fn alloc_transform_chain(&mut self) -> TransformChainId {
        TransformChainId(self.chain_counter.next())
    }

    /// Records a render-capability block's lowered drawing description,
    /// returning its dense id.
    pub fn add_render_spec(&mut self, spec: RenderSpec) -> RenderSpecId {
        let id = RenderSpecId(u32::try_from(self.render_specs.len()).unwrap_or(u32::MAX));
        self.render_specs.push(spec);
        id
    }

    /// Total value-store width allocated so far, in lanes.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.slot_counter.len()
    }

    /// Allocates a slot for `expr`'s value and registers a pending
    /// `SigEval` step to write it there every frame (spec §4.2 pass6/pass8).
    ///
    /// Call this only when some *other* consumer reads the value back via
    /// `ValueStore` (a render spec field, a `BroadcastSig` source) — plain
    /// recursive signal-to-signal consumption never needs a slot.
    pub fn schedule_sig(
        &mut self,
        expr: SigExprId,
        ty: TypeDesc,
        owner: Option<BlockId>,
        debug_name: Option<String>,
    ) -> ValueSlot {
        let slot = self.alloc_value_slot(ty, owner, debug_name);
        self.sig_writes.push(SigWrite { expr, target: slot });
        slot
    }

    /// Registers a pending `FieldEval` step that materializes `expr` over
    /// `domain` at the capability-ordered point pass8 assigns, populating
    /// the `FieldFrameCache` ahead of the render step that needs it.
    pub fn schedule_field(
        &mut self,
        expr: FieldExprId,
        domain: DomainId,
        owner: Option<BlockId>,
        debug_name: Option<String>,
    ) -> ValueSlot {
        let ty = TypeDesc::scalar(World::Special, DomainTag::Float, Category::Internal);
        let slot = self.alloc_value_slot(ty, owner, debug_name);
        self.field_writes.push(FieldWrite { expr, domain, target: slot });
        slot
    }

    /// Allocates a slot for a bus combine's evaluated result and registers
    /// a pending `BusEval` step (pass7), ranked after ordinary pure/state
    /// writes and before render.
    pub fn schedule_bus_sig(
        &mut self,
        bus: BusIndex,
        expr: SigExprId,
        ty: TypeDesc,
        owner: Option<BlockId>,
        debug_name: Option<String>,
    ) -> ValueSlot {
        let slot = self.alloc_value_slot(ty, owner, debug_name);
        self.bus_sig_writes.push(BusSigWrite { bus, expr, target: slot });
        slot
    }

    /// Field-world counterpart to [`Self::schedule_bus_sig`].
    pub fn schedule_bus_field(
        &mut self,
        bus: BusIndex,
        expr: FieldExprId,
        domain: DomainId,
        owner: Option<BlockId>,
        debug_name: Option<String>,
    ) -> ValueSlot {
        let ty = TypeDesc::scalar(World::Special, DomainTag::Float, Category::Internal);
        let slot = self.alloc_value_slot(ty, owner, debug_name);
        self.bus_field_writes.push(BusFieldWrite { bus, expr, domain, target: slot });
        slot
    }

    /// Freezes the builder into an immutable program IR.
    #[must_use]
    pub fn build(self) -> BuilderProgramIr {
        BuilderProgramIr {
            signal_ir: SignalIr { nodes: self.sig_nodes },
            field_ir: FieldIr { nodes: self.field_nodes },
            consts: self.consts,
            state_layout: self.state.build(),
            slot_count: self.slot_counter.len(),
            slot_meta: self.slot_meta,
            sig_expr_source: self.sig_expr_source,
            field_expr_source: self.field_expr_source,
            render_specs: self.render_specs,
            domain_descs: self.domain_descs,
            sig_writes: self.sig_writes,
            field_writes: self.field_writes,
            bus_sig_writes: self.bus_sig_writes,
            bus_field_writes: self.bus_field_writes,
        }
    }
}

/// The immutable program produced by `IRBuilder::build` (spec §4.3,
/// "`build()` returns an immutable `BuilderProgramIR`").
pub struct BuilderProgramIr {
    /// The signal expression table.
    pub signal_ir: SignalIr,
    /// The field expression table.
    pub field_ir: FieldIr,
    /// The deduplicated constant pool.
    pub consts: ConstPool,
    /// State cell layout table.
    pub state_layout: Vec<crate::state_buffer::StateCellLayout>,
    /// Total `ValueStore` width, in lanes.
    pub slot_count: u32,
    /// Debug provenance for every allocated value slot, keyed by its
    /// starting lane.
    pub slot_meta: BTreeMap<u32, SlotMeta>,
    /// Debug index: which block produced each signal expression.
    pub sig_expr_source: BTreeMap<u32, BlockId>,
    /// Debug index: which block produced each field expression.
    pub field_expr_source: BTreeMap<u32, BlockId>,
    /// Render specs recorded by render-capability blocks, indexed by
    /// `RenderSpecId`.
    pub render_specs: Vec<RenderSpec>,
    /// Concrete descriptor for every domain allocated during lowering,
    /// keyed by `DomainId`'s index.
    pub domain_descs: BTreeMap<u32, DomainDesc>,
    /// Pending `SigEval` steps (pass8 consumes these to build the schedule).
    pub sig_writes: Vec<SigWrite>,
    /// Pending `FieldEval` steps.
    pub field_writes: Vec<FieldWrite>,
    /// Pending signal-world `BusEval` steps.
    pub bus_sig_writes: Vec<BusSigWrite>,
    /// Pending field-world `BusEval` steps.
    pub bus_field_writes: Vec<BusFieldWrite>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocating_a_scalar_slot_advances_the_counter_by_one() {
        let mut b = IRBuilder::new();
        let ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let s1 = b.alloc_value_slot(ty.clone(), None, None);
        let s2 = b.alloc_value_slot(ty, None, None);
        assert_eq!(s1, ValueSlot(0));
        assert_eq!(s2, ValueSlot(1));
    }

    #[test]
    fn allocating_a_vec3_slot_advances_the_counter_by_three() {
        let mut b = IRBuilder::new();
        let vec3 = TypeDesc::bundle(World::Signal, DomainTag::Vec3, vec![3], Category::Core);
        let scalar = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let s1 = b.alloc_value_slot(vec3, None, None);
        let s2 = b.alloc_value_slot(scalar, None, None);
        assert_eq!(s1, ValueSlot(0));
        assert_eq!(s2, ValueSlot(3));
    }

    #[test]
    fn interning_the_same_number_twice_reuses_the_const_id() {
        let mut b = IRBuilder::new();
        let a = b.intern_number(2.0);
        let c = b.intern_number(2.0);
        assert_eq!(a, c);
    }

    #[test]
    fn pushing_sig_nodes_yields_dense_sequential_ids() {
        let mut b = IRBuilder::new();
        let c = b.intern_number(1.0);
        let n1 = b.push_sig(SigOp::Const(c), None);
        let n2 = b.push_sig(SigOp::TimeAbsMs, None);
        assert_eq!(n1, SigExprId(0));
        assert_eq!(n2, SigExprId(1));
    }

    #[test]
    fn build_freezes_accumulated_tables() {
        let mut b = IRBuilder::new();
        let c = b.intern_number(1.0);
        b.push_sig(SigOp::Const(c), None);
        let ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        b.alloc_value_slot(ty, None, None);
        let program = b.build();
        assert_eq!(program.signal_ir.nodes.len(), 1);
        assert_eq!(program.slot_count, 1);
    }
}

//! Dense identifier types allocated by the compiler.
//!
//! Author-facing identifiers (`BlockId`, `PortId`, ...) are stable strings
//! owned by `weave-abi::patch`. Everything the compiler allocates for
//! itself — expression nodes, value slots, state cells, constants, steps —
//! is a dense `u32` index into an append-only array, following the same
//! "newtype over a monotonically increasing integer" convention the
//! teacher uses for `CompactRuleId`.

/// Dense index of a block within `pass1`'s normalized block array.
///
/// Assigned in original author-array order (no topological reorder), per
/// spec §4.2 pass1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockIndex(pub u32);

/// Dense index of a signal expression node in `SignalIr::nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SigExprId(pub u32);

/// Dense index of a field expression node in `FieldIr::nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldExprId(pub u32);

/// Dense index into a `ValueStore`'s typed-array slots.
///
/// Bundle types (vec3, rgba, mat4, ...) reserve `lanes.product()` consecutive
/// slots starting at the returned index (spec §3, "ValueSlot").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueSlot(pub u32);

impl ValueSlot {
    /// Returns the slot `offset` positions after this one (for bundle lanes).
    #[must_use]
    pub const fn offset(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

/// Dense index of a state cell in a `StateBuffer`'s layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub u32);

/// Dense index of a deduplicated constant in the `ConstPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstId(pub u32);

/// Dense index of a domain (field element-count handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub u32);

/// Dense index of a schedule step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(pub u32);

/// Dense index of a bus, assigned in `pass2` in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusIndex(pub u32);

/// Dense index of a transform (lens/adapter) chain recorded by the `IRBuilder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransformChainId(pub u32);

/// Dense index of a render spec recorded by a render-capability block's
/// `lower()` (see `crate::render_spec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderSpecId(pub u32);

/// Monotonically-increasing allocator shared by the dense id types above.
///
/// `IRBuilder` owns several of these (one per id namespace); this wrapper
/// exists so each allocation site reads as `self.slots.next()` rather than
/// repeating the "fetch, increment, wrap" pattern five times.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counter(u32);

impl Counter {
    pub(crate) const fn new() -> Self {
        Self(0)
    }

    /// Returns the next value and advances the counter by 1.
    pub(crate) fn next(&mut self) -> u32 {
        let v = self.0;
        self.0 += 1;
        v
    }

    /// Returns the next value and advances the counter by `count`
    /// (used for bundle-arity slot allocation).
    pub(crate) fn next_n(&mut self, count: u32) -> u32 {
        let v = self.0;
        self.0 += count.max(1);
        v
    }

    /// Current count of allocations made so far.
    pub(crate) const fn len(self) -> u32 {
        self.0
    }
}

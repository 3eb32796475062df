//! The IR expression tables (spec §3 "IR expression tables").
//!
//! Two append-only, dense arrays: `SignalIr::nodes[SigExprId]` and
//! `FieldIr::nodes[FieldExprId]`. All nodes are pure functions of their
//! inputs, state cells, constants, and the per-frame time context; sharing
//! is by `SigExprId`/`FieldExprId` reuse.

use crate::ident::{BusIndex, ConstId, DomainId, SigExprId, StateId, TransformChainId, ValueSlot};

/// A numeric opcode usable by `SigOp::Map`/`Zip` and `FieldOp::Map`/`Zip`
/// (spec §4.7, "Opcode kernels").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    /// `a + b` (unary: `a + 0`).
    Add,
    /// `a - b` (unary: negation).
    Sub,
    /// `a * b` (unary: identity).
    Mul,
    /// `a / b` (unary: reciprocal).
    Div,
    /// `min(a, b)` (unary: identity).
    Min,
    /// `max(a, b)` (unary: identity).
    Max,
    /// Clamps `a` into `[b, c]` (the ternary inputs are flattened by the
    /// caller into a single `f64` slice in kernel-specific order).
    Clamp,
    /// `floor(a)`.
    Floor,
    /// `sin(a)`, radians.
    Sin,
    /// `cos(a)`, radians.
    Cos,
}

/// Conflict-free reduction semantics applied by `sigCombine`/`fieldCombine`
/// (spec §4.2 pass7). Mirrors `weave_abi::CombineMode` one-to-one; kept as
/// a separate type so the IR does not depend on the wire DTO crate for its
/// evaluation-time behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Sum of all terms; identity 0.
    Sum,
    /// Product of all terms; identity 1.
    Product,
    /// Arithmetic mean; count taken from the IR term list, not runtime.
    Average,
    /// Element-wise minimum.
    Min,
    /// Element-wise maximum.
    Max,
    /// The right-most term by sorted publisher order.
    Last,
    /// Porter-Duff compositing in sorted publisher order (color only).
    Layer,
    /// Event-world union (fires if any term fires).
    Pulse,
    /// Event-world union (alias used by event-typed buses).
    Merge,
}

/// A signal-world IR node (spec §3).
#[derive(Debug, Clone)]
pub enum SigOp {
    /// A pool-interned constant.
    Const(ConstId),
    /// Absolute time in milliseconds since the program started.
    TimeAbsMs,
    /// Time in milliseconds relative to the `TimeModel` (wraps/clamps per
    /// model kind).
    TimeModelMs,
    /// Normalized cyclic phase in `[0, 1)`; only valid under a cyclic model.
    Phase01,
    /// Edge-triggered pulse on phase wrap; only valid under a cyclic model.
    WrapEvent,
    /// Unary numeric transform of `src`.
    Map {
        /// Input expression.
        src: SigExprId,
        /// Kernel applied.
        kernel: Kernel,
    },
    /// Binary numeric transform of `a` and `b`.
    Zip {
        /// First input.
        a: SigExprId,
        /// Second input.
        b: SigExprId,
        /// Kernel applied.
        kernel: Kernel,
    },
    /// Ternary select: `cond != 0.0 ? t : f`.
    Select {
        /// Condition expression.
        cond: SigExprId,
        /// Value when `cond` is truthy.
        t: SigExprId,
        /// Value when `cond` is falsy.
        f: SigExprId,
    },
    /// A stateful operation reading/writing a state cell.
    Stateful {
        /// Which stateful op to run.
        op: StatefulOp,
        /// Primary input (trigger/phase signal, op-dependent).
        input: SigExprId,
        /// State cell backing this operation's persistent storage.
        state: StateId,
        /// Op-specific numeric parameters, pool-interned.
        params: Vec<ConstId>,
    },
    /// Applies a registered lens/adapter chain to `src`.
    Transform {
        /// Input expression.
        src: SigExprId,
        /// Which transform chain to apply.
        chain: TransformChainId,
    },
    /// Combines a bus's publisher terms per its declared `CombineMode`.
    SigCombine {
        /// Which bus this combine belongs to (debug metadata only).
        bus: BusIndex,
        /// Publisher term expressions, already sorted deterministically.
        terms: Vec<SigExprId>,
        /// Combine semantics.
        mode: CombineMode,
        /// Whether the bus's resolved type is `DomainTag::Color`: each term
        /// is then a packed RGBA8 value reinterpreted losslessly as `f64`,
        /// folded with Porter-Duff `over` instead of numeric reduction.
        is_color: bool,
    },
}

/// Which built-in stateful signal operation a `SigOp::Stateful` node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatefulOp {
    /// Attack/decay envelope generator (spec §4.7 "EnvelopeAD").
    EnvelopeAd,
    /// Divides a cyclic phase into `n` equal sub-pulses (spec §4.7
    /// "PulseDivider").
    PulseDivider,
}

/// A field-world IR node (spec §3).
#[derive(Debug, Clone)]
pub enum FieldOp {
    /// A pool-interned constant, identical for every element.
    Const(ConstId),
    /// Unary per-element transform of `src`.
    Map {
        /// Input field expression.
        src: FieldExprId,
        /// Kernel applied per element.
        kernel: Kernel,
    },
    /// Binary per-element transform of `a` and `b` (same domain).
    Zip {
        /// First input.
        a: FieldExprId,
        /// Second input.
        b: FieldExprId,
        /// Kernel applied per element.
        kernel: Kernel,
    },
    /// Per-element ternary select.
    Select {
        /// Condition field.
        cond: FieldExprId,
        /// Value field when truthy.
        t: FieldExprId,
        /// Value field when falsy.
        f: FieldExprId,
    },
    /// Broadcasts a per-frame scalar signal across every element of a domain.
    BroadcastSig {
        /// Source signal.
        sig: SigExprId,
        /// Value slot the signal was written to (broadcast reads, not
        /// re-evaluates, the signal — spec §4.6 `Broadcast{sigId, domainId}`).
        sig_slot: ValueSlot,
        /// Domain being broadcast over.
        domain: DomainId,
    },
    /// Combines a bus's field-world publisher terms.
    FieldCombine {
        /// Which bus this combine belongs to (debug metadata only).
        bus: BusIndex,
        /// Publisher term expressions, already sorted deterministically.
        terms: Vec<FieldExprId>,
        /// Combine semantics.
        mode: CombineMode,
        /// See `SigOp::SigCombine::is_color`.
        is_color: bool,
    },
    /// Samples a domain's own spatial layout once per element (e.g. a
    /// Grid's per-element x/y coordinate); `signal_slot` is unused by the
    /// grid sampler but kept so a future non-spatial sampler has a signal
    /// input to read without widening the node shape again.
    SampleSignal {
        /// Signal slot providing the sampled value's shared inputs.
        signal_slot: ValueSlot,
        /// Domain supplying element positions.
        domain: DomainId,
        /// Which positional axis to sample (`0` = x, `1` = y).
        axis: u8,
    },
}

/// The append-only signal expression table.
#[derive(Debug, Clone, Default)]
pub struct SignalIr {
    /// Dense node array, indexed by `SigExprId`.
    pub nodes: Vec<SigOp>,
}

impl SignalIr {
    /// Returns the node at `id`.
    #[must_use]
    pub fn get(&self, id: SigExprId) -> &SigOp {
        &self.nodes[id.0 as usize]
    }
}

/// The append-only field expression table.
#[derive(Debug, Clone, Default)]
pub struct FieldIr {
    /// Dense node array, indexed by `FieldExprId`.
    pub nodes: Vec<FieldOp>,
}

impl FieldIr {
    /// Returns the node at `id`.
    #[must_use]
    pub fn get(&self, id: FieldExprId) -> &FieldOp {
        &self.nodes[id.0 as usize]
    }
}

//! Error kinds (spec §7 "Error handling design").
//!
//! Split into [`CompileError`] (graph-shape/typing/compile-internal errors,
//! one of which is attached to each fatal [`weave_abi::Diagnostic`]) and
//! [`RuntimeError`] (frame-abort errors raised by the schedule executor).
//! Modeled as `thiserror` enums the way `warp_core::EngineError` is, one
//! flat enum per failure domain rather than a single catch-all.

use crate::ident::{BusIndex, DomainId, ValueSlot};
use weave_abi::patch::{BlockId, PortId};

/// Catalog-registration and block-definition errors, raised by
/// [`crate::catalog::BlockCatalog::register`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A block type was registered twice.
    #[error("duplicate block type: {type_key}")]
    DuplicateBlockType {
        /// The offending type key.
        type_key: &'static str,
    },
    /// A block definition violates a capability-shape invariant.
    #[error("invalid block definition for {type_key}: {reason}")]
    InvalidBlockDefinition {
        /// The offending type key.
        type_key: &'static str,
        /// Human-readable explanation.
        reason: &'static str,
    },
}

/// Graph-shape, typing, and compile-internal errors (spec §7, "Compilation
/// accumulates all errors; never throws for graph shape").
///
/// Every variant here is surfaced as one [`weave_abi::diagnostics::Diagnostic`]
/// with a matching `code`; compilation keeps running after collecting one so
/// later passes can report further problems in the same `CompileFinished`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    /// The patch has no blocks at all. Not reported as a diagnostic (spec:
    /// "an empty patch is not an error"); `compile()` short-circuits before
    /// any pass runs and reports `CompileFinished{status: Failed, diagnostics: []}`.
    #[error("patch is empty")]
    EmptyPatch,
    /// No block declares `Capability::Time`.
    #[error("no time root block found")]
    MissingTimeRoot,
    /// More than one `Capability::Time` block is present.
    #[error("multiple time root blocks found: {0:?}")]
    MultipleTimeRoots(Vec<BlockId>),
    /// A dependency cycle was found among signal/field expressions.
    #[error("cycle detected among blocks: {0:?}")]
    CycleDetected(Vec<BlockId>),
    /// A required input port has no wire and no default.
    #[error("missing input on {block:?}.{port:?}")]
    MissingInput {
        /// The block with the unmet input.
        block: BlockId,
        /// The unmet port.
        port: PortId,
    },
    /// An edge references a block, port, or bus that does not exist, or
    /// otherwise fails structural validation.
    #[error("invalid connection: {reason}")]
    InvalidConnection {
        /// Human-readable explanation.
        reason: String,
    },
    /// A composite's `inputMap`/output map is missing a required entry.
    #[error("port missing: {reason}")]
    PortMissing {
        /// Human-readable explanation.
        reason: String,
    },
    /// Two connected ports have incompatible `TypeDesc`s with no adapter.
    #[error("port type mismatch on {block:?}.{port:?}: expected {expected}, got {actual}")]
    PortTypeMismatch {
        /// The block with the mismatched input.
        block: BlockId,
        /// The mismatched port.
        port: PortId,
        /// Expected type description (debug string).
        expected: String,
        /// Actual type description (debug string).
        actual: String,
    },
    /// Two connected ports live in different worlds.
    #[error("world mismatch on {block:?}.{port:?}")]
    WorldMismatch {
        /// The block with the mismatched input.
        block: BlockId,
        /// The mismatched port.
        port: PortId,
    },
    /// Two connected ports have incompatible domains with no adapter.
    #[error("domain mismatch on {block:?}.{port:?}")]
    DomainMismatch {
        /// The block with the mismatched input.
        block: BlockId,
        /// The mismatched port.
        port: PortId,
    },
    /// A bus publisher/listener's type is not bus-eligible, or publisher and
    /// listener types cannot be reconciled.
    #[error("bus type error on bus {bus:?}: {reason}")]
    BusTypeError {
        /// The offending bus.
        bus: weave_abi::patch::BusId,
        /// Human-readable explanation.
        reason: String,
    },
    /// A bus's declared `CombineMode` is not valid for its resolved type.
    #[error("unsupported combine mode on bus {bus:?}: {reason}")]
    UnsupportedCombineMode {
        /// The offending bus.
        bus: weave_abi::patch::BusId,
        /// Human-readable explanation.
        reason: String,
    },
    /// A block's `lower()` implementation returned an error.
    #[error("block {block:?} failed to lower: {reason}")]
    UpstreamError {
        /// The failing block.
        block: BlockId,
        /// Human-readable explanation forwarded from the block.
        reason: String,
    },
    /// The final sink did not ultimately resolve to a `RenderTree` output.
    #[error("output wrong type: expected RenderTree, got {actual}")]
    OutputWrongType {
        /// Actual type description (debug string).
        actual: String,
    },
}

impl CompileError {
    /// Stable diagnostic code string matching spec §7's naming.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPatch => "EmptyPatch",
            Self::MissingTimeRoot => "MissingTimeRoot",
            Self::MultipleTimeRoots(_) => "MultipleTimeRoots",
            Self::CycleDetected(_) => "CycleDetected",
            Self::MissingInput { .. } => "MissingInput",
            Self::InvalidConnection { .. } => "InvalidConnection",
            Self::PortMissing { .. } => "PortMissing",
            Self::PortTypeMismatch { .. } => "PortTypeMismatch",
            Self::WorldMismatch { .. } => "WorldMismatch",
            Self::DomainMismatch { .. } => "DomainMismatch",
            Self::BusTypeError { .. } => "BusTypeError",
            Self::UnsupportedCombineMode { .. } => "UnsupportedCombineMode",
            Self::UpstreamError { .. } => "UpstreamError",
            Self::OutputWrongType { .. } => "OutputWrongType",
        }
    }
}

/// Runtime errors raised while executing a compiled schedule (spec §7,
/// "runtime" category).
///
/// Per policy, structural runtime errors abort the current frame (the
/// executor host catches them, logs, and reuses the previous frame's render
/// tree); numeric NaN/Infinity outcomes are not represented here because
/// they propagate as ordinary values rather than errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// A field expression referenced a domain that was never allocated this
    /// frame.
    #[error("invalid domain slot: {domain:?}")]
    InvalidDomainSlot {
        /// The missing domain.
        domain: DomainId,
    },
    /// A signal/field expression id has no corresponding IR node (internal
    /// corruption, should never occur given a correctly built program).
    #[error("unregistered signal expression referenced")]
    UnregisteredSignal,
    /// More than one schedule step attempted to write the same
    /// [`ValueSlot`] in a single frame (spec P1).
    #[error("single-writer violation on slot {slot:?}: previously written by step {first_writer}, conflicting write from step {conflicting_writer}")]
    SingleWriterViolation {
        /// The slot with two writers.
        slot: ValueSlot,
        /// Step index that first claimed the slot.
        first_writer: u32,
        /// Step index that conflicted.
        conflicting_writer: u32,
    },
    /// A `StateBuffer` was asked to initialize a range outside its
    /// allocated storage.
    #[error("state buffer init out of range: offset {offset}, len {len}, capacity {capacity}")]
    StateBufferInitOutOfRange {
        /// Requested offset.
        offset: u32,
        /// Requested length.
        len: u32,
        /// Buffer's actual capacity.
        capacity: u32,
    },
    /// A bus combine step referenced a bus with no registered publishers at
    /// runtime (should have been resolved to the declared default at
    /// compile time; indicates builder/compile disagreement).
    #[error("bus {bus:?} has no resolved terms at runtime")]
    EmptyBusAtRuntime {
        /// The offending bus.
        bus: BusIndex,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_codes_match_spec_names() {
        assert_eq!(CompileError::EmptyPatch.code(), "EmptyPatch");
        assert_eq!(CompileError::MissingTimeRoot.code(), "MissingTimeRoot");
        assert_eq!(
            CompileError::OutputWrongType { actual: "Signal".into() }.code(),
            "OutputWrongType"
        );
    }
}

//! Compile diagnostics (spec §6, "Diagnostics") and compile lifecycle events.

use std::collections::BTreeMap;

use crate::patch::{BlockId, BusId, PortId, WireId};
use crate::value::Value;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    /// Informational; compilation still succeeds.
    Warn,
    /// Compilation fails, but the cause is localized.
    Error,
    /// Compilation fails and downstream passes could not run meaningfully.
    Fatal,
}

/// Which compile stage a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticDomain {
    /// Raised while compiling the patch.
    Compile,
    /// Raised while executing a compiled program.
    Runtime,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PrimaryTarget {
    /// The whole graph (e.g. `EmptyPatch`, `CycleDetected`).
    GraphSpan,
    /// A single block.
    Block(BlockId),
    /// A single port on a block.
    Port(BlockId, PortId),
    /// The (unique, or conflicting) time root block(s).
    TimeRoot(Vec<BlockId>),
    /// A named bus.
    Bus(BusId),
    /// A wire.
    Edge(WireId),
}

/// A structured payload attached to a diagnostic (spec §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticPayload {
    /// No structured payload.
    None,
    /// `typeMismatch{expected, actual}`.
    TypeMismatch {
        /// Human-readable description of the expected type.
        expected: String,
        /// Human-readable description of the actual type.
        actual: String,
    },
    /// Arbitrary key/value detail for less common diagnostics.
    Detail(BTreeMap<String, Value>),
}

/// One diagnostic emitted during compilation or execution.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// Stable error/warning code, e.g. `E_TIME_ROOT_MULTIPLE`, `W_BUS_EMPTY`.
    pub code: String,
    /// Severity.
    pub severity: Severity,
    /// Compile vs. runtime origin.
    pub domain: DiagnosticDomain,
    /// What the diagnostic is about.
    pub primary_target: PrimaryTarget,
    /// Human-readable message.
    pub message: String,
    /// Optional structured payload.
    pub payload: DiagnosticPayload,
}

impl Diagnostic {
    /// Builds a diagnostic with no structured payload.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        severity: Severity,
        domain: DiagnosticDomain,
        primary_target: PrimaryTarget,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            domain,
            primary_target,
            message: message.into(),
            payload: DiagnosticPayload::None,
        }
    }

    /// Returns `true` if this diagnostic alone is enough to fail compilation.
    #[must_use]
    pub fn fails_compile(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }
}

/// What triggered a compile (editor edit, manual recompile, catalog reload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompileTrigger {
    /// A graph edit (block/wire/bus add, remove, or param change).
    GraphEdit,
    /// An explicit recompile request not tied to a specific edit.
    Manual,
    /// The block catalog changed (e.g. a composite definition reloaded).
    CatalogReload,
}

/// Emitted when a compile begins (spec §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompileStarted {
    /// Unique id for this compile invocation.
    pub compile_id: u64,
    /// Patch identifier being compiled.
    pub patch_id: String,
    /// Patch revision being compiled.
    pub patch_revision: u64,
    /// What triggered this compile.
    pub trigger: CompileTrigger,
}

/// Overall compile status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompileStatus {
    /// Compilation produced a usable `CompiledProgram`.
    Ok,
    /// Compilation failed; diagnostics explain why.
    Failed,
}

/// Which kind of `TimeModel` the compiled program uses, for summary metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeModelKind {
    /// `finite{durationMs}`.
    Finite,
    /// `cyclic{periodMs, mode}`.
    Cyclic,
    /// `infinite{windowMs?}`.
    Infinite,
}

/// Which time-root block kind supplied the `TimeModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TimeRootKind {
    /// `CycleTimeRoot`.
    Cycle,
    /// `FiniteTimeRoot`.
    Finite,
    /// `InfiniteTimeRoot`.
    Infinite,
}

/// Coarse summary of bus usage, for `programMeta`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusUsageSummary {
    /// Number of buses with at least one publisher.
    pub buses_with_publishers: u32,
    /// Number of buses with zero publishers (evaluate to their default).
    pub buses_empty: u32,
    /// Number of buses with publishers but no listeners (`W_BUS_EMPTY` sites).
    pub buses_unused: u32,
}

/// Metadata describing a successfully compiled program.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProgramMeta {
    /// Kind of time model in effect.
    pub time_model_kind: TimeModelKind,
    /// Kind of time-root block that produced it.
    pub time_root_kind: TimeRootKind,
    /// Bus usage summary.
    pub bus_usage_summary: BusUsageSummary,
}

/// Emitted when a compile finishes (spec §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompileFinished {
    /// Matches the `CompileStarted.compile_id` for this compile.
    pub compile_id: u64,
    /// Patch revision that was compiled.
    pub patch_revision: u64,
    /// Overall status.
    pub status: CompileStatus,
    /// Wall-clock duration of the compile, in milliseconds.
    pub duration_ms: f64,
    /// All diagnostics accumulated across every pass.
    pub diagnostics: Vec<Diagnostic>,
    /// Present only when `status == Ok`.
    pub program_meta: Option<ProgramMeta>,
}

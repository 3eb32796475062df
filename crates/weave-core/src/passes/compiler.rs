//! The top-level compile orchestration (spec §4.2, the full pass0–pass8
//! pipeline) and its lifecycle events (spec §6).
//!
//! Composite expansion runs before default materialization: pass0 needs a
//! catalog lookup for every unwired port, and only primitive blocks are
//! catalog-registered, so composites must already be gone by then (see
//! `DESIGN.md`, "composite expansion precedes default materialization").

use std::time::Instant;

use weave_abi::diagnostics::{
    BusUsageSummary, CompileFinished, CompileStarted, CompileStatus, CompileTrigger, Diagnostic, DiagnosticDomain,
    PrimaryTarget, ProgramMeta, Severity, TimeModelKind, TimeRootKind,
};
use weave_abi::patch::{BusDirection, Patch};

use crate::builder::{BuilderProgramIr, IRBuilder};
use crate::catalog::BlockCatalog;
use crate::composite::{self, CompositeRegistry};
use crate::error::CompileError;
use crate::graph::TypedPatch;
use crate::passes::{lowering, pass0, pass2, pass3, pass5, pass8};
use crate::schedule::Schedule;
use crate::time_model::TimeModel;

/// A successfully (or partially) lowered program, ready for the executor.
pub struct CompiledProgram {
    /// The frozen IR.
    pub program: BuilderProgramIr,
    /// The capability-ordered execution schedule.
    pub schedule: Schedule,
    /// The resolved time model governing frame-to-frame time derivation.
    pub time_model: TimeModel,
}

/// Everything one `compile()` invocation produces: the two lifecycle
/// events plus the compiled program, if one could be built.
pub struct CompileOutcome {
    /// Emitted before any pass runs.
    pub started: CompileStarted,
    /// Emitted once every pass has run (or short-circuited).
    pub finished: CompileFinished,
    /// `Some` whenever a program was built at all, even with warnings.
    pub compiled: Option<CompiledProgram>,
}

fn error_diagnostic(err: &CompileError) -> Diagnostic {
    let target = match err {
        CompileError::MissingInput { block, port } | CompileError::PortTypeMismatch { block, port, .. } => {
            PrimaryTarget::Port(block.clone(), port.clone())
        }
        CompileError::WorldMismatch { block, port } | CompileError::DomainMismatch { block, port } => {
            PrimaryTarget::Port(block.clone(), port.clone())
        }
        CompileError::UpstreamError { block, .. } => PrimaryTarget::Block(block.clone()),
        CompileError::MultipleTimeRoots(blocks) => PrimaryTarget::TimeRoot(blocks.clone()),
        CompileError::BusTypeError { bus, .. } | CompileError::UnsupportedCombineMode { bus, .. } => {
            PrimaryTarget::Bus(bus.clone())
        }
        _ => PrimaryTarget::GraphSpan,
    };
    Diagnostic::new(err.code(), Severity::Error, DiagnosticDomain::Compile, target, err.to_string())
}

fn time_model_kind(model: &TimeModel) -> TimeModelKind {
    match model {
        TimeModel::Finite { .. } => TimeModelKind::Finite,
        TimeModel::Cyclic { .. } => TimeModelKind::Cyclic,
        TimeModel::Infinite { .. } => TimeModelKind::Infinite,
    }
}

fn time_root_kind(block_type: &str) -> TimeRootKind {
    match block_type {
        "CycleTimeRoot" => TimeRootKind::Cycle,
        "FiniteTimeRoot" => TimeRootKind::Finite,
        _ => TimeRootKind::Infinite,
    }
}

fn bus_usage_summary(patch: &Patch) -> BusUsageSummary {
    let mut with_publishers = 0u32;
    let mut empty = 0u32;
    let mut unused = 0u32;
    for bus in &patch.buses {
        let publishers = patch.bus_connections.iter().filter(|c| c.bus == bus.id && matches!(c.direction, BusDirection::Publish)).count();
        let listeners = patch.bus_connections.iter().filter(|c| c.bus == bus.id && matches!(c.direction, BusDirection::Listen)).count();
        if publishers > 0 {
            with_publishers += 1;
        } else {
            empty += 1;
        }
        if publishers > 0 && listeners == 0 {
            unused += 1;
        }
    }
    BusUsageSummary { buses_with_publishers: with_publishers, buses_empty: empty, buses_unused: unused }
}

fn failed(compile_id: u64, patch: &Patch, start: Instant, diagnostics: Vec<Diagnostic>) -> CompileFinished {
    CompileFinished {
        compile_id,
        patch_revision: patch.revision,
        status: CompileStatus::Failed,
        #[allow(clippy::cast_precision_loss)]
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        diagnostics,
        program_meta: None,
    }
}

/// Runs the full pass0–pass8 pipeline against `patch`.
///
/// An empty patch short-circuits before any pass runs, reporting
/// `CompileFinished{status: Failed, diagnostics: []}` with no
/// `EmptyPatch` diagnostic (spec: "an empty patch is not an error").
#[must_use]
pub fn compile(patch: &Patch, catalog: &BlockCatalog, composites: &CompositeRegistry, compile_id: u64, trigger: CompileTrigger) -> CompileOutcome {
    let start = Instant::now();
    let started = CompileStarted { compile_id, patch_id: patch.patch_id.clone(), patch_revision: patch.revision, trigger };

    if patch.is_empty() {
        return CompileOutcome { started, finished: failed(compile_id, patch, start, vec![]), compiled: None };
    }

    let expanded = match composite::expand_composites(patch, composites) {
        Ok(p) => p,
        Err(e) => {
            let finished = failed(compile_id, patch, start, vec![error_diagnostic(&e)]);
            return CompileOutcome { started, finished, compiled: None };
        }
    };
    let defaulted = pass0::materialize_defaults(&expanded, catalog);
    let typed = TypedPatch::normalize(&defaulted);

    let mut diagnostics = Vec::new();
    diagnostics.extend(pass2::check_edges(&typed, catalog));
    diagnostics.extend(pass2::check_buses(&typed, catalog, &defaulted.buses));

    let mut builder = IRBuilder::new();
    let time_root = match pass3::resolve_time_root(&typed.blocks, catalog, &mut builder) {
        Ok(tr) => tr,
        Err(e) => {
            let finished = failed(compile_id, patch, start, vec![error_diagnostic(&e)]);
            return CompileOutcome { started, finished, compiled: None };
        }
    };

    diagnostics.extend(pass5::validate(&typed, catalog, &defaulted.buses, &defaulted.bus_connections));

    let lowering_result = lowering::lower_program(&typed, catalog, &defaulted.buses, &defaulted.bus_connections, &time_root, builder);
    diagnostics.extend(lowering_result.errors.iter().map(error_diagnostic));

    let schedule =
        pass8::build_schedule(&lowering_result.program, &time_root, &lowering_result.render_specs, patch.settings.emit_ir);

    let status = if diagnostics.iter().any(Diagnostic::fails_compile) { CompileStatus::Failed } else { CompileStatus::Ok };
    let program_meta = matches!(status, CompileStatus::Ok).then(|| {
        let root_type = typed.blocks.iter().find(|b| b.id == time_root.block_id).map_or("InfiniteTimeRoot", |b| b.block_type.as_str());
        ProgramMeta {
            time_model_kind: time_model_kind(&time_root.model),
            time_root_kind: time_root_kind(root_type),
            bus_usage_summary: bus_usage_summary(&defaulted),
        }
    });

    let finished = CompileFinished {
        compile_id,
        patch_revision: patch.revision,
        status,
        #[allow(clippy::cast_precision_loss)]
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        diagnostics,
        program_meta,
    };

    let compiled = Some(CompiledProgram { program: lowering_result.program, schedule, time_model: time_root.model });
    CompileOutcome { started, finished, compiled }
}

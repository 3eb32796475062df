//! pass2 — type resolution (spec §4.2 "pass2").
//!
//! Walks every enabled wire and bus connection and checks the two ends'
//! declared `TypeDesc`s either match directly or are bridgeable by
//! [`crate::adapters::find_adapter`]; emits one fatal diagnostic per
//! mismatch rather than aborting, so a single compile reports every typing
//! problem at once (spec §7, "compilation accumulates all errors").

use weave_abi::diagnostics::{Diagnostic, DiagnosticDomain, PrimaryTarget, Severity};

use crate::adapters::{combine_mode_compatible, find_adapter};
use crate::catalog::BlockCatalog;
use crate::error::CompileError;
use crate::graph::TypedPatch;
use crate::types::TypeDesc;

/// Looks up a declared port's `TypeDesc` by block type and port id.
///
/// Shared with `lowering::lower_bus`, which needs the same publisher/
/// listener type scan this module uses to validate a bus, but to decide
/// *how* to combine rather than whether the bus type-checks.
pub(crate) fn port_type<'a>(catalog: &'a BlockCatalog, block_type: &str, port_id: &str, output: bool) -> Option<&'a TypeDesc> {
    let def = catalog.get(block_type)?;
    let ports = if output { &def.outputs } else { &def.inputs };
    ports.iter().find(|p| p.port_id == port_id).map(|p| &p.ty)
}

fn to_ir_combine_mode(mode: weave_abi::patch::CombineMode) -> crate::ir::CombineMode {
    use crate::ir::CombineMode as Ir;
    use weave_abi::patch::CombineMode as Abi;
    match mode {
        Abi::Sum => Ir::Sum,
        Abi::Product => Ir::Product,
        Abi::Average => Ir::Average,
        Abi::Min => Ir::Min,
        Abi::Max => Ir::Max,
        Abi::Last => Ir::Last,
        Abi::Layer => Ir::Layer,
        Abi::Pulse => Ir::Pulse,
        Abi::Merge => Ir::Merge,
    }
}

fn diagnostic_for(err: &CompileError, block: weave_abi::patch::BlockId, port: weave_abi::patch::PortId) -> Diagnostic {
    Diagnostic::new(
        err.code(),
        Severity::Error,
        DiagnosticDomain::Compile,
        PrimaryTarget::Port(block, port),
        err.to_string(),
    )
}

/// Checks every enabled edge's endpoint types; returns one diagnostic per
/// incompatibility found.
#[must_use]
pub fn check_edges(typed: &TypedPatch, catalog: &BlockCatalog) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for wires in typed.inbound.values() {
        for wire in wires {
            let to_endpoint = &wire.edge.to;
            let Some(to_block_def) = typed.blocks.iter().find(|b| b.id == to_endpoint.block_id) else { continue };
            let Some(from_block_def) = typed.blocks.iter().find(|b| b.id == wire.from_block) else {
                diags.push(diagnostic_for(
                    &CompileError::InvalidConnection { reason: format!("unknown source block {:?}", wire.from_block) },
                    to_endpoint.block_id.clone(),
                    to_endpoint.port_id.clone(),
                ));
                continue;
            };
            let Some(to_ty) = port_type(catalog, &to_block_def.block_type, &to_endpoint.port_id.0, false) else { continue };
            let Some(from_ty) = port_type(catalog, &from_block_def.block_type, &wire.from_port.0, true) else { continue };
            if to_ty.compatible_with(from_ty) {
                continue;
            }
            if find_adapter(from_ty, to_ty).is_some() {
                continue;
            }
            let err = if from_ty.world != to_ty.world {
                CompileError::WorldMismatch { block: to_endpoint.block_id.clone(), port: to_endpoint.port_id.clone() }
            } else {
                CompileError::DomainMismatch { block: to_endpoint.block_id.clone(), port: to_endpoint.port_id.clone() }
            };
            diags.push(diagnostic_for(&err, to_endpoint.block_id.clone(), to_endpoint.port_id.clone()));
        }
    }
    diags
}

/// Checks every bus's publishers/listeners share a bus-eligible type and
/// that the bus's declared `CombineMode` is valid for it.
#[must_use]
pub fn check_buses(typed: &TypedPatch, catalog: &BlockCatalog, buses: &[weave_abi::patch::Bus]) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for bus in buses {
        let mut canonical: Option<TypeDesc> = None;
        for conn in &typed.bus_connections {
            if conn.bus != bus.id {
                continue;
            }
            let output = matches!(conn.direction, weave_abi::patch::BusDirection::Publish);
            let Some(block) = typed.blocks.iter().find(|b| b.id == conn.endpoint.block_id) else { continue };
            let Some(ty) = port_type(catalog, &block.block_type, &conn.endpoint.port_id.0, output) else { continue };
            if !ty.bus_eligible {
                diags.push(Diagnostic::new(
                    CompileError::BusTypeError { bus: bus.id.clone(), reason: "port is not bus-eligible".into() }.code(),
                    Severity::Error,
                    DiagnosticDomain::Compile,
                    PrimaryTarget::Bus(bus.id.clone()),
                    "port is not bus-eligible".into(),
                ));
                continue;
            }
            match &canonical {
                None => canonical = Some(ty.clone()),
                Some(existing) if !existing.bus_compatible_with(ty) => {
                    diags.push(Diagnostic::new(
                        CompileError::BusTypeError { bus: bus.id.clone(), reason: "incompatible publisher/listener types".into() }.code(),
                        Severity::Error,
                        DiagnosticDomain::Compile,
                        PrimaryTarget::Bus(bus.id.clone()),
                        "incompatible publisher/listener types".into(),
                    ));
                }
                Some(_) => {}
            }
        }
        if let Some(ty) = &canonical {
            if !combine_mode_compatible(to_ir_combine_mode(bus.mode), ty) {
                diags.push(Diagnostic::new(
                    CompileError::UnsupportedCombineMode { bus: bus.id.clone(), reason: "combine mode not valid for resolved type".into() }.code(),
                    Severity::Error,
                    DiagnosticDomain::Compile,
                    PrimaryTarget::Bus(bus.id.clone()),
                    "combine mode not valid for resolved type".into(),
                ));
            }
        }
    }
    diags
}

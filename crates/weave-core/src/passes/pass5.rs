//! pass5 — validate (spec §4.2 "pass5").
//!
//! Runs after pass0/pass3 so every optional input already has a default
//! wire and the time root is known; only genuinely unmet `Required` inputs
//! remain to report. Also flags buses with publishers but no listeners
//! (`W_BUS_EMPTY`) — not fatal, just wasted work the author likely meant to
//! wire up.

use weave_abi::diagnostics::{Diagnostic, DiagnosticDomain, PrimaryTarget, Severity};
use weave_abi::patch::{Bus, BusConnection, BusDirection};

use crate::catalog::{BlockCatalog, DefaultSource};
use crate::error::CompileError;
use crate::graph::TypedPatch;

/// Checks every block's declared `Required` inputs are wired (by edge or
/// bus listen), and that every bus has at least one listener for its
/// publishers.
#[must_use]
pub fn validate(typed: &TypedPatch, catalog: &BlockCatalog, buses: &[Bus], bus_connections: &[BusConnection]) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    for block in &typed.blocks {
        let Some(def) = catalog.get(&block.block_type) else { continue };
        for port in &def.inputs {
            if !matches!(port.default, Some(DefaultSource::Required)) {
                continue;
            }
            let has_wire = !typed.inbound_wires(&block.id, &weave_abi::patch::PortId(port.port_id.to_string())).is_empty();
            let has_listen = bus_connections.iter().any(|c| {
                matches!(c.direction, BusDirection::Listen)
                    && c.endpoint.block_id == block.id
                    && c.endpoint.port_id.0 == port.port_id
            });
            if !has_wire && !has_listen {
                let err = CompileError::MissingInput {
                    block: block.id.clone(),
                    port: weave_abi::patch::PortId(port.port_id.to_string()),
                };
                diags.push(Diagnostic::new(
                    err.code(),
                    Severity::Error,
                    DiagnosticDomain::Compile,
                    PrimaryTarget::Port(block.id.clone(), weave_abi::patch::PortId(port.port_id.to_string())),
                    err.to_string(),
                ));
            }
        }
    }

    for bus in buses {
        let publishers = bus_connections.iter().filter(|c| c.bus == bus.id && matches!(c.direction, BusDirection::Publish)).count();
        let listeners = bus_connections.iter().filter(|c| c.bus == bus.id && matches!(c.direction, BusDirection::Listen)).count();
        if publishers > 0 && listeners == 0 {
            diags.push(Diagnostic::new(
                "W_BUS_EMPTY",
                Severity::Warn,
                DiagnosticDomain::Compile,
                PrimaryTarget::Bus(bus.id.clone()),
                format!("bus {:?} has publishers but no listeners", bus.id),
            ));
        }
    }

    diags
}

//! pass0 — materialize defaults (spec §4.2 "pass0").
//!
//! Every declared input port left unwired by the author (no enabled edge,
//! no `Listen` bus connection) and not marked `DefaultSource::Required` gets
//! a synthesized `ConstSignal` provider block and a `Structural`-role...
//! actually `Default`-role edge wiring it in, the same way pass7 synthesizes
//! bus-combine shim edges. Runs after composite expansion (pass4) so every
//! remaining block type is a primitive the catalog actually knows.

use std::collections::BTreeSet;

use weave_abi::patch::{Block, Edge, EdgeRole, Endpoint, Patch, PortId};

use crate::catalog::BlockCatalog;

fn default_value_for(patch: &Patch, block_id: &str, port_id: &str, catalog_default: Option<f64>) -> Option<f64> {
    let key = format!("{block_id}:{port_id}");
    if let Some(v) = patch.default_source_store.get(&key) {
        return v.as_number();
    }
    catalog_default
}

/// Returns a new patch with a `ConstSignal` provider + `Default`-role edge
/// appended for every unwired, non-required, signal-world input port.
#[must_use]
pub fn materialize_defaults(patch: &Patch, catalog: &BlockCatalog) -> Patch {
    let mut wired: BTreeSet<(String, String)> = BTreeSet::new();
    for edge in &patch.edges {
        if edge.enabled {
            wired.insert((edge.to.block_id.0.clone(), edge.to.port_id.0.clone()));
        }
    }
    for conn in &patch.bus_connections {
        if matches!(conn.direction, weave_abi::patch::BusDirection::Listen) {
            wired.insert((conn.endpoint.block_id.0.clone(), conn.endpoint.port_id.0.clone()));
        }
    }

    let mut blocks = patch.blocks.clone();
    let mut edges = patch.edges.clone();
    let mut next_provider = 0usize;

    for block in &patch.blocks {
        let Some(def) = catalog.get(&block.block_type) else { continue };
        for port in &def.inputs {
            if wired.contains(&(block.id.0.clone(), port.port_id.to_string())) {
                continue;
            }
            let catalog_default = match &port.default {
                Some(crate::catalog::DefaultSource::Const(v)) => Some(*v),
                _ => None,
            };
            let Some(value) = default_value_for(patch, &block.id.0, port.port_id, catalog_default) else { continue };
            if port.ty.world != crate::types::World::Signal {
                continue;
            }
            let provider_id = weave_abi::patch::BlockId(format!("__default::{}::{}", block.id.0, next_provider));
            next_provider += 1;
            let mut params = std::collections::BTreeMap::new();
            params.insert("value".to_string(), weave_abi::value::Value::Number(value));
            blocks.push(Block { id: provider_id.clone(), block_type: "ConstSignal".to_string(), params, position: None });
            edges.push(Edge {
                id: weave_abi::patch::WireId(format!("__default_edge::{}", edges.len())),
                from: Endpoint { block_id: provider_id, port_id: PortId("out".to_string()) },
                to: Endpoint { block_id: block.id.clone(), port_id: PortId(port.port_id.to_string()) },
                enabled: true,
                role: EdgeRole::Default,
            });
        }
    }

    Patch {
        patch_id: patch.patch_id.clone(),
        revision: patch.revision,
        blocks,
        edges,
        buses: patch.buses.clone(),
        bus_connections: patch.bus_connections.clone(),
        default_source_store: patch.default_source_store.clone(),
        settings: patch.settings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::builtin_catalog;
    use weave_abi::patch::Settings;

    #[test]
    fn unwired_optional_port_gets_a_const_signal_provider() {
        let catalog = builtin_catalog().expect("catalog");
        let patch = Patch {
            patch_id: "p".into(),
            revision: 0,
            blocks: vec![Block {
                id: weave_abi::patch::BlockId("add1".into()),
                block_type: "Add".into(),
                params: std::collections::BTreeMap::new(),
                position: None,
            }],
            edges: vec![],
            buses: vec![],
            bus_connections: vec![],
            default_source_store: std::collections::BTreeMap::new(),
            settings: Settings { seed: 0, emit_ir: false },
        };
        let expanded = materialize_defaults(&patch, &catalog);
        assert_eq!(expanded.blocks.len(), 3);
        assert_eq!(expanded.edges.len(), 2);
    }
}

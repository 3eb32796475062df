//! Composite block expansion (spec §4.2 pass4 "composite expansion").
//!
//! A composite is a catalog-facing type key that is never itself a
//! [`crate::catalog::BlockDef`]; instead it rewrites 1:1 onto an internal
//! primitive block, the way a `warp_core` macro rule expands to its
//! constituent rewrite rules before the engine ever sees them. Both
//! built-in composites (`GridPoints`, `DotsRenderer`) wrap exactly one
//! internal block, so expansion here only ever needs a boundary-port
//! rename, never a multi-block internal wiring.

use std::collections::BTreeMap;

use weave_abi::patch::{Block, BusConnection, Edge, Endpoint, Patch, PortId};

use crate::error::CompileError;

/// One composite type's boundary-port rewrite map onto a single internal
/// primitive block instance.
pub struct CompositeDef {
    /// The composite's catalog-facing type key (what authors wire to).
    pub type_key: &'static str,
    /// The internal primitive's catalog type key.
    pub internal_type: &'static str,
    /// `(boundary_port, internal_port)` pairs covering every declared
    /// input and output port on the composite.
    pub port_map: &'static [(&'static str, &'static str)],
}

impl CompositeDef {
    fn internal_port(&self, boundary_port: &str) -> Option<&'static str> {
        self.port_map.iter().find(|(b, _)| *b == boundary_port).map(|(_, i)| *i)
    }
}

/// Registry of every known composite type, keyed by `type_key`.
#[derive(Default)]
pub struct CompositeRegistry {
    defs: BTreeMap<&'static str, CompositeDef>,
}

impl CompositeRegistry {
    /// Looks up a composite definition by type key.
    #[must_use]
    pub fn get(&self, type_key: &str) -> Option<&CompositeDef> {
        self.defs.get(type_key)
    }
}

/// `GridPoints` wraps `GridDomain` 1:1; `DotsRenderer` wraps
/// `DotsRendererPrimitive` 1:1 (spec's catalog lists `DotsRenderer` as both
/// a renderer primitive and a composite — resolved by giving the real
/// implementation a distinct internal type key; see `DESIGN.md`).
#[must_use]
pub fn builtin_composites() -> CompositeRegistry {
    let mut defs = BTreeMap::new();
    defs.insert(
        "GridPoints",
        CompositeDef {
            type_key: "GridPoints",
            internal_type: "GridDomain",
            port_map: &[("domain", "domain"), ("positionsX", "positionsX"), ("positionsY", "positionsY")],
        },
    );
    defs.insert(
        "DotsRenderer",
        CompositeDef {
            type_key: "DotsRenderer",
            internal_type: "DotsRendererPrimitive",
            port_map: &[
                ("domain", "domain"),
                ("positionsX", "positionsX"),
                ("positionsY", "positionsY"),
                ("radius", "radius"),
                ("color", "color"),
                ("renderTree", "renderTree"),
            ],
        },
    );
    CompositeRegistry { defs }
}

fn internal_block_id(composite_id: &weave_abi::patch::BlockId) -> weave_abi::patch::BlockId {
    weave_abi::patch::BlockId(format!("{}::inner", composite_id.0))
}

fn rewrite_endpoint(
    endpoint: &Endpoint,
    composites: &BTreeMap<weave_abi::patch::BlockId, &CompositeDef>,
    want_input: bool,
) -> Result<Endpoint, CompileError> {
    let Some(def) = composites.get(&endpoint.block_id) else {
        return Ok(endpoint.clone());
    };
    let Some(internal_port) = def.internal_port(&endpoint.port_id.0) else {
        return Err(CompileError::PortMissing {
            reason: format!(
                "composite {:?} has no boundary {} named {:?}",
                endpoint.block_id,
                if want_input { "input" } else { "output" },
                endpoint.port_id
            ),
        });
    };
    Ok(Endpoint { block_id: internal_block_id(&endpoint.block_id), port_id: PortId(internal_port.to_string()) })
}

/// Expands every composite-typed block in `patch` into its internal
/// primitive, rewriting every edge/bus-connection endpoint that referenced
/// a composite instance's boundary port onto the internal block.
///
/// Returns `Err(CompileError::PortMissing)` if some edge or bus connection
/// references a boundary port the composite does not declare (spec S2,
/// "unmapped listener port").
pub fn expand_composites(patch: &Patch, registry: &CompositeRegistry) -> Result<Patch, CompileError> {
    let mut composites: BTreeMap<weave_abi::patch::BlockId, &CompositeDef> = BTreeMap::new();
    let mut blocks = Vec::with_capacity(patch.blocks.len());

    for block in &patch.blocks {
        if let Some(def) = registry.get(&block.block_type) {
            composites.insert(block.id.clone(), def);
            blocks.push(Block {
                id: internal_block_id(&block.id),
                block_type: def.internal_type.to_string(),
                params: block.params.clone(),
                position: None,
            });
        } else {
            blocks.push(block.clone());
        }
    }

    let mut edges = Vec::with_capacity(patch.edges.len());
    for edge in &patch.edges {
        let from = rewrite_endpoint(&edge.from, &composites, false)?;
        let to = rewrite_endpoint(&edge.to, &composites, true)?;
        edges.push(Edge { id: edge.id.clone(), from, to, enabled: edge.enabled, role: edge.role });
    }

    let mut bus_connections = Vec::with_capacity(patch.bus_connections.len());
    for conn in &patch.bus_connections {
        let want_input = matches!(conn.direction, weave_abi::patch::BusDirection::Listen);
        let endpoint = rewrite_endpoint(&conn.endpoint, &composites, want_input)?;
        bus_connections.push(BusConnection {
            bus: conn.bus.clone(),
            endpoint,
            direction: conn.direction,
            lens: conn.lens.clone(),
        });
    }

    Ok(Patch {
        patch_id: patch.patch_id.clone(),
        revision: patch.revision,
        blocks,
        edges,
        buses: patch.buses.clone(),
        bus_connections,
        default_source_store: patch.default_source_store.clone(),
        settings: patch.settings.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_abi::patch::{EdgeRole, Settings, WireId};

    fn empty_patch() -> Patch {
        Patch {
            patch_id: "p".into(),
            revision: 0,
            blocks: vec![],
            edges: vec![],
            buses: vec![],
            bus_connections: vec![],
            default_source_store: BTreeMap::new(),
            settings: Settings { seed: 0, emit_ir: false },
        }
    }

    #[test]
    fn grid_points_expands_to_grid_domain_with_renamed_block() {
        let mut patch = empty_patch();
        patch.blocks.push(Block {
            id: weave_abi::patch::BlockId("grid".into()),
            block_type: "GridPoints".into(),
            params: BTreeMap::new(),
            position: None,
        });
        let registry = builtin_composites();
        let expanded = expand_composites(&patch, &registry).expect("expands cleanly");
        assert_eq!(expanded.blocks.len(), 1);
        assert_eq!(expanded.blocks[0].block_type, "GridDomain");
        assert_eq!(expanded.blocks[0].id.0, "grid::inner");
    }

    #[test]
    fn unmapped_boundary_port_is_rejected() {
        let mut patch = empty_patch();
        patch.blocks.push(Block {
            id: weave_abi::patch::BlockId("grid".into()),
            block_type: "GridPoints".into(),
            params: BTreeMap::new(),
            position: None,
        });
        patch.edges.push(Edge {
            id: WireId("w1".into()),
            from: Endpoint { block_id: weave_abi::patch::BlockId("grid".into()), port_id: PortId("notAPort".into()) },
            to: Endpoint { block_id: weave_abi::patch::BlockId("other".into()), port_id: PortId("in".into()) },
            enabled: true,
            role: EdgeRole::User,
        });
        let registry = builtin_composites();
        let err = expand_composites(&patch, &registry).unwrap_err();
        assert!(matches!(err, CompileError::PortMissing { .. }));
    }
}

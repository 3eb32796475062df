//! pass1 output: the normalized, indexed graph (spec §4.2 "pass1 —
//! normalize").
//!
//! Assigns every block a stable dense [`crate::ident::BlockIndex`] in
//! original array order (no topological reorder — pass8 is where ordering
//! happens) and groups wires by destination so later passes can resolve an
//! input port's driver in O(1).

use std::collections::BTreeMap;

use weave_abi::patch::{Block, BlockId, BusConnection, Edge, Patch, PortId};

use crate::ident::BlockIndex;

/// A wire grouped under its destination `(BlockId, PortId)`.
#[derive(Debug, Clone)]
pub struct InboundWire {
    /// Source block.
    pub from_block: BlockId,
    /// Source port.
    pub from_port: PortId,
    /// The original edge, kept for diagnostics (id, role, enabled).
    pub edge: Edge,
}

/// The normalized graph produced by pass1.
///
/// `blocks` preserves the author's original array order; every other index
/// (`block_index_of`, `inbound`) is derived from that fixed order, so two
/// compiles of the same `Patch` always produce the same `TypedPatch`
/// (spec property D1, "deterministic recompile").
#[derive(Debug, Clone)]
pub struct TypedPatch {
    /// Blocks in original author order; `BlockIndex(i)` indexes this.
    pub blocks: Vec<Block>,
    /// Maps author-level `BlockId` to its dense index in `blocks`.
    pub block_index_map: BTreeMap<BlockId, BlockIndex>,
    /// Enabled wires grouped by destination, keyed by `(block, port)`.
    pub inbound: BTreeMap<(BlockId, PortId), Vec<InboundWire>>,
    /// Bus publish/listen connections, carried through unchanged; pass2/7
    /// consume this directly.
    pub bus_connections: Vec<BusConnection>,
}

impl TypedPatch {
    /// Normalizes `patch` into dense block indices and destination-grouped
    /// wires.
    ///
    /// Disabled edges (`Edge::enabled == false`) are dropped here; they
    /// never reach pass2 and so can never contribute a type error.
    #[must_use]
    pub fn normalize(patch: &Patch) -> Self {
        let blocks = patch.blocks.clone();
        let mut block_index_map = BTreeMap::new();
        for (i, block) in blocks.iter().enumerate() {
            block_index_map.insert(block.id.clone(), BlockIndex(u32::try_from(i).unwrap_or(u32::MAX)));
        }

        let mut inbound: BTreeMap<(BlockId, PortId), Vec<InboundWire>> = BTreeMap::new();
        for edge in &patch.edges {
            if !edge.enabled {
                continue;
            }
            let key = (edge.to.block_id.clone(), edge.to.port_id.clone());
            inbound.entry(key).or_default().push(InboundWire {
                from_block: edge.from.block_id.clone(),
                from_port: edge.from.port_id.clone(),
                edge: edge.clone(),
            });
        }

        Self { blocks, block_index_map, inbound, bus_connections: patch.bus_connections.clone() }
    }

    /// Looks up a block's dense index by author id.
    #[must_use]
    pub fn block_index_of(&self, id: &BlockId) -> Option<BlockIndex> {
        self.block_index_map.get(id).copied()
    }

    /// Returns the block at a dense index.
    #[must_use]
    pub fn block_at(&self, index: BlockIndex) -> &Block {
        &self.blocks[index.0 as usize]
    }

    /// Returns the (possibly empty) set of wires driving `(block, port)`.
    #[must_use]
    pub fn inbound_wires(&self, block: &BlockId, port: &PortId) -> &[InboundWire] {
        static EMPTY: &[InboundWire] = &[];
        self.inbound
            .get(&(block.clone(), port.clone()))
            .map_or(EMPTY, Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_abi::patch::{BusDirection, CombineMode, Endpoint, EdgeRole, Settings, WireId};

    fn sample_patch() -> Patch {
        let a = Block {
            id: BlockId("a".into()),
            block_type: "ConstSignal".into(),
            params: BTreeMap::new(),
            position: None,
        };
        let b = Block {
            id: BlockId("b".into()),
            block_type: "Add".into(),
            params: BTreeMap::new(),
            position: None,
        };
        let edge = Edge {
            id: WireId("w1".into()),
            from: Endpoint { block_id: BlockId("a".into()), port_id: PortId("out".into()) },
            to: Endpoint { block_id: BlockId("b".into()), port_id: PortId("lhs".into()) },
            enabled: true,
            role: EdgeRole::User,
        };
        Patch {
            patch_id: "p1".into(),
            revision: 1,
            blocks: vec![a, b],
            edges: vec![edge],
            buses: vec![],
            bus_connections: vec![],
            default_source_store: BTreeMap::new(),
            settings: Settings { seed: 0, emit_ir: false },
        }
    }

    #[test]
    fn block_indices_follow_original_array_order() {
        let typed = TypedPatch::normalize(&sample_patch());
        assert_eq!(typed.block_index_of(&BlockId("a".into())), Some(BlockIndex(0)));
        assert_eq!(typed.block_index_of(&BlockId("b".into())), Some(BlockIndex(1)));
    }

    #[test]
    fn enabled_wires_are_grouped_by_destination() {
        let typed = TypedPatch::normalize(&sample_patch());
        let wires = typed.inbound_wires(&BlockId("b".into()), &PortId("lhs".into()));
        assert_eq!(wires.len(), 1);
        assert_eq!(wires[0].from_block, BlockId("a".into()));
    }

    #[test]
    fn disabled_wires_are_dropped() {
        let mut patch = sample_patch();
        patch.edges[0].enabled = false;
        let typed = TypedPatch::normalize(&patch);
        assert!(typed.inbound_wires(&BlockId("b".into()), &PortId("lhs".into())).is_empty());
    }

    #[test]
    fn bus_connections_and_combine_mode_survive_normalize() {
        let mut patch = sample_patch();
        patch.bus_connections.push(BusConnection {
            bus: weave_abi::patch::BusId("energy".into()),
            endpoint: Endpoint { block_id: BlockId("a".into()), port_id: PortId("out".into()) },
            direction: BusDirection::Publish,
            lens: vec![],
        });
        let typed = TypedPatch::normalize(&patch);
        assert_eq!(typed.bus_connections.len(), 1);
        let _ = CombineMode::Sum;
    }
}

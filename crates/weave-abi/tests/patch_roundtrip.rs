use std::collections::BTreeMap;

use weave_abi::{
    Block, BlockId, Bus, BusId, CombineMode, Edge, EdgeRole, Endpoint, Patch, PortId, Settings,
    Value, WireId,
};

fn sample_patch() -> Patch {
    Patch {
        patch_id: "patch-1".into(),
        revision: 3,
        blocks: vec![Block {
            id: BlockId("time".into()),
            block_type: "CycleTimeRoot".into(),
            params: BTreeMap::from([("periodMs".to_string(), Value::Number(2000.0))]),
            position: Some((0.0, 0.0)),
        }],
        edges: vec![Edge {
            id: WireId("w1".into()),
            from: Endpoint { block_id: BlockId("time".into()), port_id: PortId("tAbsMs".into()) },
            to: Endpoint { block_id: BlockId("sink".into()), port_id: PortId("t".into()) },
            enabled: true,
            role: EdgeRole::User,
        }],
        buses: vec![Bus {
            id: BusId("phaseA".into()),
            mode: CombineMode::Sum,
            default_value: Value::Number(0.0),
        }],
        bus_connections: vec![],
        default_source_store: BTreeMap::new(),
        settings: Settings { seed: 1, emit_ir: false },
    }
}

#[test]
fn patch_round_trips_through_cbor() {
    let patch = sample_patch();
    let bytes = weave_abi::encode(&patch).expect("encode");
    let back: Patch = weave_abi::decode(&bytes).expect("decode");
    assert_eq!(patch, back);
}

#[test]
fn empty_patch_reports_is_empty() {
    let mut patch = sample_patch();
    patch.blocks.clear();
    assert!(patch.is_empty());
}

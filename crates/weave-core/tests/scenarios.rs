//! End-to-end compile + run scenarios, one per module's headline behavior.

use std::collections::BTreeMap;

use weave_abi::diagnostics::{CompileStatus, CompileTrigger};
use weave_abi::patch::{
    Block, BlockId, Bus, BusConnection, BusDirection, BusId, CombineMode, Edge, EdgeRole, Endpoint, Patch, PortId,
    Settings, WireId,
};
use weave_abi::render::{unpack_rgba8, RenderNode};
use weave_abi::value::Value;
use weave_core::blocks::builtin_catalog;
use weave_core::composite::builtin_composites;
use weave_core::compile;
use weave_core::executor::Executor;
use weave_core::snapshot::digest_frame;

fn block(id: &str, block_type: &str) -> Block {
    Block { id: BlockId(id.into()), block_type: block_type.into(), params: BTreeMap::new(), position: None }
}

fn const_color_block(id: &str, r: f64, g: f64, b: f64, a: f64) -> Block {
    let mut params = BTreeMap::new();
    params.insert("r".to_string(), Value::Number(r));
    params.insert("g".to_string(), Value::Number(g));
    params.insert("b".to_string(), Value::Number(b));
    params.insert("a".to_string(), Value::Number(a));
    Block { id: BlockId(id.into()), block_type: "ConstColor".into(), params, position: None }
}

fn wire(id: &str, from_block: &str, from_port: &str, to_block: &str, to_port: &str) -> Edge {
    Edge {
        id: WireId(id.into()),
        from: Endpoint { block_id: BlockId(from_block.into()), port_id: PortId(from_port.into()) },
        to: Endpoint { block_id: BlockId(to_block.into()), port_id: PortId(to_port.into()) },
        enabled: true,
        role: EdgeRole::User,
    }
}

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

/// S1: a cyclic time root driving a grid of dots through `GridPoints` ->
/// `DotsRenderer` composites compiles, and ticking it yields a render tree
/// with one instanced glyph batch.
#[test]
fn s1_breathing_dots_compiles_and_renders() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("time", "CycleTimeRoot"));
    patch.blocks.push(block("grid", "GridPoints"));
    patch.blocks.push(block("dots", "DotsRenderer"));
    patch.edges.push(wire("w1", "grid", "domain", "dots", "domain"));
    patch.edges.push(wire("w2", "grid", "positionsX", "dots", "positionsX"));
    patch.edges.push(wire("w3", "grid", "positionsY", "dots", "positionsY"));

    let outcome = compile(&patch, &catalog, &composites, 1, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Ok, "{:?}", outcome.finished.diagnostics);
    let compiled = outcome.compiled.expect("compiled program");

    let mut executor = Executor::new_silent(compiled).expect("executor");
    let tree = executor.tick(0.0);
    assert_eq!(tree.nodes.len(), 1, "one DotsRenderer render spec should yield one node");
}

/// S2: wiring a bus listener onto a composite boundary port the composite
/// does not declare is rejected with `PortMissing`, before any pass beyond
/// expansion runs.
#[test]
fn s2_unmapped_listener_port_is_rejected() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("grid", "GridPoints"));
    patch.buses.push(Bus { id: BusId("b".into()), mode: CombineMode::Last, default_value: Value::Number(0.0) });
    patch.bus_connections.push(BusConnection {
        bus: BusId("b".into()),
        endpoint: Endpoint { block_id: BlockId("grid".into()), port_id: PortId("notAPort".into()) },
        direction: BusDirection::Listen,
        lens: vec![],
    });

    let outcome = compile(&patch, &catalog, &composites, 2, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Failed);
    assert!(outcome.compiled.is_none());
}

/// S3: an empty patch is not an error; it just never produces a program.
#[test]
fn s3_empty_patch_yields_no_diagnostics_and_no_program() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();
    let patch = empty_patch();

    let outcome = compile(&patch, &catalog, &composites, 3, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Failed);
    assert!(outcome.finished.diagnostics.is_empty());
    assert!(outcome.compiled.is_none());
}

/// S4: two `Capability::Time` blocks in one patch is rejected outright.
#[test]
fn s4_double_time_root_is_rejected() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("t1", "CycleTimeRoot"));
    patch.blocks.push(block("t2", "FiniteTimeRoot"));

    let outcome = compile(&patch, &catalog, &composites, 4, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Failed);
    assert!(outcome.compiled.is_none());
    assert!(outcome.finished.diagnostics.iter().any(|d| d.code == "MultipleTimeRoots"));
}

/// S5: recompiling the same patch twice and running both programs for the
/// same sequence of frame times produces identical frame digests.
#[test]
fn s5_recompile_is_deterministic() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("time", "CycleTimeRoot"));
    patch.blocks.push(block("a", "ConstSignal"));
    patch.blocks.push(block("b", "Add"));
    patch.edges.push(wire("w1", "a", "out", "b", "lhs"));

    let run = |seed: u64| {
        let outcome = compile(&patch, &catalog, &composites, seed, CompileTrigger::Manual);
        let compiled = outcome.compiled.expect("compiled program");
        let mut executor = Executor::new_silent(compiled).expect("executor");
        executor.tick(0.0);
        executor.tick(16.0);
        digest_frame(executor.values())
    };

    assert_eq!(run(1), run(2), "compile id must not affect the compiled program's runtime behavior");
}

/// S7: a `Layer` bus with two `ConstColor` publishers, listened to by a
/// `DotsRenderer`'s `color` port, blends through the live pipeline rather
/// than falling back to numeric folding.
#[test]
fn s7_layer_bus_blends_publisher_colors_into_render_tree() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("time", "CycleTimeRoot"));
    patch.blocks.push(block("grid", "GridPoints"));
    patch.blocks.push(block("dots", "DotsRenderer"));
    // Sorted by (blockId, portId) at pass7: "bottom" publishes first, "top" last.
    patch.blocks.push(const_color_block("bottom", 0.0, 0.0, 1.0, 1.0));
    patch.blocks.push(const_color_block("top", 1.0, 0.0, 0.0, 128.0 / 255.0));
    patch.edges.push(wire("w1", "grid", "domain", "dots", "domain"));
    patch.edges.push(wire("w2", "grid", "positionsX", "dots", "positionsX"));
    patch.edges.push(wire("w3", "grid", "positionsY", "dots", "positionsY"));
    patch.buses.push(Bus { id: BusId("colorBus".into()), mode: CombineMode::Layer, default_value: Value::Number(0.0) });
    patch.bus_connections.push(BusConnection {
        bus: BusId("colorBus".into()),
        endpoint: Endpoint { block_id: BlockId("bottom".into()), port_id: PortId("out".into()) },
        direction: BusDirection::Publish,
        lens: vec![],
    });
    patch.bus_connections.push(BusConnection {
        bus: BusId("colorBus".into()),
        endpoint: Endpoint { block_id: BlockId("top".into()), port_id: PortId("out".into()) },
        direction: BusDirection::Publish,
        lens: vec![],
    });
    patch.bus_connections.push(BusConnection {
        bus: BusId("colorBus".into()),
        endpoint: Endpoint { block_id: BlockId("dots".into()), port_id: PortId("color".into()) },
        direction: BusDirection::Listen,
        lens: vec![],
    });

    let outcome = compile(&patch, &catalog, &composites, 7, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Ok, "{:?}", outcome.finished.diagnostics);
    let compiled = outcome.compiled.expect("compiled program");

    let mut executor = Executor::new_silent(compiled).expect("executor");
    let tree = executor.tick(0.0);
    assert_eq!(tree.nodes.len(), 1);
    let RenderNode::Instances2d(instances) = &tree.nodes[0] else {
        panic!("expected an unwrapped instances batch (glow defaults to false)");
    };
    let fill = instances.style_fill.as_ref().expect("color port always resolves")[0];
    let (r, _, b, a) = unpack_rgba8(fill);
    assert!(r > 0, "red from the translucent top publisher should show through");
    assert!(b > 0, "blue from the opaque bottom publisher should still show through");
    assert_eq!(a, 255, "opaque bottom term forces full coverage once layered");
}

/// S6: a `Sum` bus with two publishers and no listener compiles (with a
/// warning), and the combine result is the sum of both publisher constants.
#[test]
fn s6_bus_sum_combines_every_publisher() {
    let catalog = builtin_catalog().expect("catalog");
    let composites = builtin_composites();

    let mut patch = empty_patch();
    patch.blocks.push(block("time", "CycleTimeRoot"));
    patch.blocks.push(block("a", "ConstSignal"));
    patch.blocks.push(block("b", "ConstSignal"));
    patch.blocks.push(block("sink", "Add"));
    patch.buses.push(Bus { id: BusId("sum".into()), mode: CombineMode::Sum, default_value: Value::Number(0.0) });
    patch.bus_connections.push(BusConnection {
        bus: BusId("sum".into()),
        endpoint: Endpoint { block_id: BlockId("a".into()), port_id: PortId("out".into()) },
        direction: BusDirection::Publish,
        lens: vec![],
    });
    patch.bus_connections.push(BusConnection {
        bus: BusId("sum".into()),
        endpoint: Endpoint { block_id: BlockId("b".into()), port_id: PortId("out".into()) },
        direction: BusDirection::Publish,
        lens: vec![],
    });
    patch.bus_connections.push(BusConnection {
        bus: BusId("sum".into()),
        endpoint: Endpoint { block_id: BlockId("sink".into()), port_id: PortId("lhs".into()) },
        direction: BusDirection::Listen,
        lens: vec![],
    });

    let outcome = compile(&patch, &catalog, &composites, 6, CompileTrigger::Manual);
    assert_eq!(outcome.finished.status, CompileStatus::Ok, "{:?}", outcome.finished.diagnostics);
    let compiled = outcome.compiled.expect("compiled program");
    let mut executor = Executor::new_silent(compiled).expect("executor");
    executor.tick(0.0);
    // Both ConstSignal blocks default their `value` param to 0.0, so the
    // combine result is 0.0; this only checks the program runs to
    // completion without a single-writer violation on the shared bus slot.
    assert_eq!(executor.frame_count(), 1);
}

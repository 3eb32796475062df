//! Property-based checks for the invariants the module tests only sample
//! a handful of fixed cases for (spec §8 properties P1-P7).

use std::collections::BTreeMap;

use proptest::prelude::*;

use weave_abi::diagnostics::CompileTrigger;
use weave_abi::patch::{Block, BlockId, Edge, EdgeRole, Endpoint, Patch, PortId, Settings, WireId};
use weave_core::blocks::builtin_catalog;
use weave_core::bus::fold_numeric;
use weave_core::composite::{builtin_composites, expand_composites, CompositeRegistry};
use weave_core::compile;
use weave_core::executor::Executor;
use weave_core::ident::ValueSlot;
use weave_core::snapshot::digest_frame;
use weave_core::time_model::{CyclicMode, TimeModel};
use weave_core::value_store::ValueStore;

fn combine_mode_strategy() -> impl Strategy<Value = weave_core::ir::CombineMode> {
    use weave_core::ir::CombineMode::{Average, Last, Layer, Max, Merge, Min, Product, Pulse, Sum};
    prop_oneof![
        Just(Sum),
        Just(Product),
        Just(Average),
        Just(Min),
        Just(Max),
        Just(Last),
        Just(Layer),
        Just(Pulse),
        Just(Merge),
    ]
}

proptest! {
    /// P1: a slot written by one step can be rewritten freely by that same
    /// step, but a second step touching the same slot before the next
    /// `clear()` is always a `SingleWriterViolation`, regardless of the
    /// values written.
    #[test]
    fn p1_single_writer_rejects_only_cross_step_rewrites(
        first_step in 0u32..8,
        second_step in 0u32..8,
        first_value in -1.0e6f64..1.0e6,
        second_value in -1.0e6f64..1.0e6,
    ) {
        let mut store = ValueStore::new(1);
        store.write(ValueSlot(0), first_step, first_value).expect("first write always succeeds");
        let result = store.write(ValueSlot(0), second_step, second_value);
        if first_step == second_step {
            prop_assert!(result.is_ok());
            prop_assert_eq!(store.read(ValueSlot(0)), second_value);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(store.read(ValueSlot(0)), first_value, "a rejected write must not mutate the lane");
        }
    }

    /// P1 (continued): after `clear()`, the slot's value survives (last
    /// frame's data) but its writer provenance resets, so any step may
    /// claim it again.
    #[test]
    fn p1_clear_resets_provenance_but_not_values(
        step_a in 0u32..8,
        step_b in 0u32..8,
        value in -1.0e6f64..1.0e6,
    ) {
        let mut store = ValueStore::new(1);
        store.write(ValueSlot(0), step_a, value).expect("write");
        store.clear();
        prop_assert_eq!(store.read(ValueSlot(0)), value);
        prop_assert!(store.write(ValueSlot(0), step_b, value + 1.0).is_ok());
    }

    /// P2: the compiler's own `compile_id`/seed never affects the sequence
    /// of frame digests a program produces for a fixed sequence of frame
    /// times.
    #[test]
    fn p2_compile_id_does_not_affect_runtime_determinism(
        compile_id_a in 1u64..1000,
        compile_id_b in 1u64..1000,
        frame_times in prop::collection::vec(0.0f64..5000.0, 1..8),
    ) {
        let catalog = builtin_catalog().expect("catalog");
        let composites = builtin_composites();
        let mut patch = cycle_const_patch();
        patch.revision = 0;

        let run = |compile_id: u64| {
            let outcome = compile(&patch, &catalog, &composites, compile_id, CompileTrigger::Manual);
            let compiled = outcome.compiled.expect("compiles");
            let mut executor = Executor::new_silent(compiled).expect("executor");
            for t in &frame_times {
                executor.tick(*t);
            }
            digest_frame(executor.values())
        };

        prop_assert_eq!(run(compile_id_a), run(compile_id_b));
    }

    /// P5: `Finite` time models never report `tModelMs` outside `[0,
    /// duration_ms]`, and it is monotonically non-decreasing as `tAbsMs`
    /// increases.
    #[test]
    fn p5_finite_time_model_clamps_and_is_monotonic(
        duration_ms in 1.0f64..100_000.0,
        mut times in prop::collection::vec(0.0f64..200_000.0, 2..16),
    ) {
        times.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        let model = TimeModel::Finite { duration_ms };
        let mut prev_t_model = 0.0;
        for (i, t_abs) in times.iter().enumerate() {
            let (t_model, phase, wrap) = model.derive(*t_abs, None);
            prop_assert!(t_model >= 0.0 && t_model <= duration_ms);
            prop_assert_eq!(phase, None);
            prop_assert_eq!(wrap, None);
            if i > 0 {
                prop_assert!(t_model >= prev_t_model, "finite tModelMs must not go backwards as tAbsMs advances");
            }
            prev_t_model = t_model;
        }
    }

    /// P5 (continued): a cyclic model's `phase01` always lands in `[0, 1)`
    /// no matter how large `tAbsMs` grows, and `wrapEvent` only ever fires
    /// on the frame where phase decreases relative to the previous frame.
    #[test]
    fn p5_cyclic_phase_stays_in_unit_range_and_wrap_matches_decrease(
        period_ms in 1.0f64..10_000.0,
        mut times in prop::collection::vec(0.0f64..1_000_000.0, 2..16),
    ) {
        times.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        let model = TimeModel::Cyclic { period_ms, mode: CyclicMode::Loop };
        let mut prev_phase = None;
        for t_abs in &times {
            let (_, phase, wrap) = model.derive(*t_abs, prev_phase);
            let phase = phase.expect("cyclic model always reports a phase");
            prop_assert!((0.0..1.0).contains(&phase));
            let expect_wrap = prev_phase.is_some_and(|prev| phase < prev);
            prop_assert_eq!(wrap, Some(expect_wrap));
            prev_phase = Some(phase);
        }
    }

    /// P6: every combine mode's fold over zero publisher terms returns
    /// exactly that mode's declared identity value, never a panic or NaN.
    #[test]
    fn p6_empty_bus_folds_to_mode_identity(mode in combine_mode_strategy()) {
        let folded = fold_numeric(mode, &[]);
        prop_assert_eq!(folded, mode.numeric_identity());
        prop_assert!(!folded.is_nan());
    }

    /// P6 (continued): the commutative modes (sum/product/min/max/pulse/
    /// merge) are permutation invariant over nonempty term lists, as their
    /// `is_commutative` flag promises.
    #[test]
    fn p6_commutative_modes_are_permutation_invariant(
        mode in combine_mode_strategy(),
        mut terms in prop::collection::vec(-1.0e4f64..1.0e4, 1..12),
    ) {
        prop_assume!(mode.is_commutative());
        let forward = fold_numeric(mode, &terms);
        terms.reverse();
        let reversed = fold_numeric(mode, &terms);
        prop_assert_eq!(forward, reversed);
    }

    /// P7: expanding a patch with no composite-typed blocks at all is a
    /// no-op on every user-facing field (composite expansion is transparent
    /// to patches that never use a composite).
    #[test]
    fn p7_expansion_is_transparent_for_patches_without_composites(
        block_ids in prop::collection::vec("[a-z]{3,8}", 1..5),
    ) {
        let registry = CompositeRegistry::default();
        let mut patch = empty_patch();
        for id in &block_ids {
            patch.blocks.push(Block {
                id: BlockId(id.clone()),
                block_type: "ConstSignal".into(),
                params: BTreeMap::new(),
                position: None,
            });
        }
        let expanded = expand_composites(&patch, &registry).expect("no composites to reject");
        prop_assert_eq!(expanded.blocks.len(), patch.blocks.len());
        for (a, b) in expanded.blocks.iter().zip(patch.blocks.iter()) {
            prop_assert_eq!(&a.id.0, &b.id.0);
            prop_assert_eq!(&a.block_type, &b.block_type);
        }
    }

    /// P7 (continued): expansion never invents or drops edges when none of
    /// the endpoints reference a composite instance.
    #[test]
    fn p7_expansion_preserves_edge_count_without_composites(
        edge_ids in prop::collection::vec("[a-z]{3,8}", 1..5),
    ) {
        let registry = CompositeRegistry::default();
        let mut patch = empty_patch();
        patch.blocks.push(Block {
            id: BlockId("a".into()),
            block_type: "ConstSignal".into(),
            params: BTreeMap::new(),
            position: None,
        });
        patch.blocks.push(Block {
            id: BlockId("b".into()),
            block_type: "Add".into(),
            params: BTreeMap::new(),
            position: None,
        });
        for id in &edge_ids {
            patch.edges.push(Edge {
                id: WireId(id.clone()),
                from: Endpoint { block_id: BlockId("a".into()), port_id: PortId("out".into()) },
                to: Endpoint { block_id: BlockId("b".into()), port_id: PortId("lhs".into()) },
                enabled: true,
                role: EdgeRole::User,
            });
        }
        let expanded = expand_composites(&patch, &registry).expect("no composites to reject");
        prop_assert_eq!(expanded.edges.len(), patch.edges.len());
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

fn cycle_const_patch() -> Patch {
    let mut patch = empty_patch();
    patch.blocks.push(Block {
        id: BlockId("time".into()),
        block_type: "CycleTimeRoot".into(),
        params: BTreeMap::new(),
        position: None,
    });
    patch.blocks.push(Block {
        id: BlockId("a".into()),
        block_type: "ConstSignal".into(),
        params: BTreeMap::new(),
        position: None,
    });
    patch.blocks.push(Block {
        id: BlockId("b".into()),
        block_type: "Add".into(),
        params: BTreeMap::new(),
        position: None,
    });
    patch.edges.push(Edge {
        id: WireId("w1".into()),
        from: Endpoint { block_id: BlockId("a".into()), port_id: PortId("out".into()) },
        to: Endpoint { block_id: BlockId("b".into()), port_id: PortId("lhs".into()) },
        enabled: true,
        role: EdgeRole::User,
    });
    patch
}

//! pass6 + pass7 — block lowering and bus lowering (spec §4.2).
//!
//! Run as a single recursive, memoized driver rather than two strictly
//! sequential passes: pass1 assigns `BlockIndex` in original author order
//! (no topological reorder), and a bus listener's resolved input depends on
//! that bus's combine result, which itself depends on recursively lowering
//! the bus's publisher blocks. Splitting this into "lower every block, then
//! lower every bus" cannot work in general — see `DESIGN.md`, "pass6/pass7
//! interleaving".

use std::collections::{BTreeMap, BTreeSet};

use weave_abi::patch::{Bus, BusConnection, BusDirection, BusId};

use crate::builder::IRBuilder;
use crate::catalog::{BlockCatalog, DefaultSource, LowerCtx, LowerInputs, ResolvedValue};
use crate::error::CompileError;
use crate::ident::{DomainId, FieldExprId, RenderSpecId};
use crate::ir::{FieldOp, SigOp};
use crate::passes::pass2::port_type;
use crate::passes::pass3::TimeRootBinding;
use crate::graph::TypedPatch;
use crate::types::{Category, DomainTag, TypeDesc, World};

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

type BlockId = weave_abi::patch::BlockId;

struct LowerEngine<'a> {
    typed: &'a TypedPatch,
    catalog: &'a BlockCatalog,
    buses: &'a [Bus],
    bus_connections: &'a [BusConnection],
    time_root: &'a TimeRootBinding,
    builder: IRBuilder,
    block_cache: BTreeMap<BlockId, Vec<ResolvedValue>>,
    block_in_progress: BTreeSet<BlockId>,
    bus_cache: BTreeMap<BusId, ResolvedValue>,
    bus_in_progress: BTreeSet<BusId>,
    errors: Vec<CompileError>,
}

impl<'a> LowerEngine<'a> {
    fn lower_block(&mut self, block_id: &BlockId) -> Vec<ResolvedValue> {
        if let Some(v) = self.block_cache.get(block_id) {
            return v.clone();
        }
        if *block_id == self.time_root.block_id {
            let outputs = vec![
                self.time_root.t_abs,
                self.time_root.t_model,
                self.time_root.phase01.unwrap_or(ResolvedValue::Unbound),
                self.time_root.wrap_event.unwrap_or(ResolvedValue::Unbound),
            ];
            self.block_cache.insert(block_id.clone(), outputs.clone());
            return outputs;
        }
        if self.block_in_progress.contains(block_id) {
            self.errors.push(CompileError::CycleDetected(vec![block_id.clone()]));
            return vec![];
        }

        let Some(block) = self.typed.blocks.iter().find(|b| &b.id == block_id).cloned() else {
            return vec![];
        };
        let Some(def) = self.catalog.get(&block.block_type) else {
            self.errors.push(CompileError::InvalidConnection {
                reason: format!("unknown block type {:?} on {:?}", block.block_type, block.id),
            });
            return vec![];
        };

        self.block_in_progress.insert(block_id.clone());
        let mut values = Vec::with_capacity(def.inputs.len());
        for port in &def.inputs {
            let port_id = weave_abi::patch::PortId(port.port_id.to_string());
            values.push(self.resolve_input(&block.id, &port_id, port.default.as_ref()));
        }
        let params = block.params.iter().filter_map(|(k, v)| v.as_number().map(|n| (k.clone(), n))).collect();
        let inputs = LowerInputs { values, params };
        let result = {
            let mut ctx = LowerCtx { builder: &mut self.builder, block_id: block.id.clone() };
            (def.lower)(&mut ctx, &inputs)
        };
        self.block_in_progress.remove(block_id);

        let outputs = match result {
            Ok(outputs) => outputs,
            Err(reason) => {
                self.errors.push(CompileError::UpstreamError { block: block.id.clone(), reason });
                vec![ResolvedValue::Unbound; def.outputs.len()]
            }
        };
        self.block_cache.insert(block_id.clone(), outputs.clone());
        outputs
    }

    fn output_index(&self, block_id: &BlockId, port_id: &str) -> Option<usize> {
        if *block_id == self.time_root.block_id {
            return match port_id {
                "tAbsMs" => Some(0),
                "tModelMs" => Some(1),
                "phase01" => Some(2),
                "wrapEvent" => Some(3),
                _ => None,
            };
        }
        let block = self.typed.blocks.iter().find(|b| &b.id == block_id)?;
        let def = self.catalog.get(&block.block_type)?;
        def.outputs.iter().position(|p| p.port_id == port_id)
    }

    fn resolve_input(
        &mut self,
        block_id: &BlockId,
        port_id: &weave_abi::patch::PortId,
        default: Option<&DefaultSource>,
    ) -> ResolvedValue {
        let wires = self.typed.inbound_wires(block_id, port_id).to_vec();
        if let Some(wire) = wires.first() {
            let outputs = self.lower_block(&wire.from_block);
            if let Some(idx) = self.output_index(&wire.from_block, &wire.from_port.0) {
                return outputs.get(idx).copied().unwrap_or(ResolvedValue::Unbound);
            }
            return ResolvedValue::Unbound;
        }
        let listen = self
            .bus_connections
            .iter()
            .find(|c| matches!(c.direction, BusDirection::Listen) && c.endpoint.block_id == *block_id && c.endpoint.port_id == *port_id)
            .map(|c| c.bus.clone());
        if let Some(bus_id) = listen {
            return self.lower_bus(&bus_id);
        }
        match default {
            Some(DefaultSource::Const(v)) => ResolvedValue::Const(*v),
            _ => ResolvedValue::Unbound,
        }
    }

    /// Scans every connection on `bus_id` for a declared port type, the same
    /// way `pass2::check_buses` does to validate a bus — but here to decide
    /// *how* to fold its terms rather than whether the bus type-checks
    /// (pass2/pass5 have already rejected an incompatible bus by the time
    /// lowering runs, so the first resolvable type stands for the bus).
    fn resolve_bus_type(&self, bus_id: &BusId) -> Option<TypeDesc> {
        self.bus_connections
            .iter()
            .filter(|c| c.bus == *bus_id)
            .find_map(|c| {
                let output = matches!(c.direction, BusDirection::Publish);
                let block = self.typed.blocks.iter().find(|b| b.id == c.endpoint.block_id)?;
                port_type(self.catalog, &block.block_type, &c.endpoint.port_id.0, output).cloned()
            })
    }

    fn lower_bus(&mut self, bus_id: &BusId) -> ResolvedValue {
        if let Some(v) = self.bus_cache.get(bus_id) {
            return *v;
        }
        if self.bus_in_progress.contains(bus_id) {
            self.errors.push(CompileError::BusTypeError { bus: bus_id.clone(), reason: "cycle through bus combine".into() });
            return ResolvedValue::Unbound;
        }
        let Some(bus) = self.buses.iter().find(|b| &b.id == bus_id).cloned() else {
            return ResolvedValue::Unbound;
        };
        self.bus_in_progress.insert(bus_id.clone());

        let publishers: Vec<BusConnection> = self
            .bus_connections
            .iter()
            .filter(|c| c.bus == *bus_id && matches!(c.direction, BusDirection::Publish))
            .cloned()
            .collect();

        let result = if publishers.is_empty() {
            let default_num = bus.default_value.as_number().unwrap_or(0.0);
            let c = self.builder.intern_number(default_num);
            let id = self.builder.push_sig(SigOp::Const(c), None);
            ResolvedValue::Sig(id)
        } else {
            let mut sig_terms = Vec::new();
            let mut field_terms: Vec<(FieldExprId, DomainId)> = Vec::new();
            for conn in &publishers {
                let outputs = self.lower_block(&conn.endpoint.block_id);
                let Some(idx) = self.output_index(&conn.endpoint.block_id, &conn.endpoint.port_id.0) else { continue };
                match outputs.get(idx).copied().unwrap_or(ResolvedValue::Unbound) {
                    ResolvedValue::Sig(id) => sig_terms.push(id),
                    ResolvedValue::Field(id, dom) => field_terms.push((id, dom)),
                    ResolvedValue::Const(n) => {
                        let c = self.builder.intern_number(n);
                        sig_terms.push(self.builder.push_sig(SigOp::Const(c), None));
                    }
                    ResolvedValue::Domain(_) | ResolvedValue::Render(_) | ResolvedValue::Unbound => {}
                }
            }
            let bus_index = self.builder.alloc_bus_index();
            let ir_mode = to_ir_combine_mode(bus.mode);
            let canonical = self.resolve_bus_type(bus_id);
            let is_color = canonical.as_ref().is_some_and(|t| t.domain == DomainTag::Color);
            let domain_tag = canonical.as_ref().map_or(DomainTag::Float, |t| t.domain);
            if field_terms.is_empty() {
                let id = self.builder.push_sig(SigOp::SigCombine { bus: bus_index, terms: sig_terms, mode: ir_mode, is_color }, None);
                let ty = TypeDesc::scalar(World::Signal, domain_tag, Category::Internal);
                self.builder.schedule_bus_sig(bus_index, id, ty, None, Some(format!("bus:{}", bus.id.0)));
                ResolvedValue::Sig(id)
            } else {
                let domain = field_terms[0].1;
                let terms: Vec<FieldExprId> = field_terms.into_iter().map(|(id, _)| id).collect();
                let id = self.builder.push_field(FieldOp::FieldCombine { bus: bus_index, terms, mode: ir_mode, is_color }, None);
                self.builder.schedule_bus_field(bus_index, id, domain, None, Some(format!("bus:{}", bus.id.0)));
                ResolvedValue::Field(id, domain)
            }
        };

        self.bus_in_progress.remove(bus_id);
        self.bus_cache.insert(bus_id.clone(), result);
        result
    }
}

/// Everything pass8 needs after lowering completes.
pub struct LoweringResult {
    /// The frozen program IR.
    pub program: crate::builder::BuilderProgramIr,
    /// Any compile errors accumulated during lowering.
    pub errors: Vec<CompileError>,
    /// Render specs in block-declaration order, for `StepKind::Render`.
    pub render_specs: Vec<RenderSpecId>,
}

/// Lowers every block and bus in `typed`, driven by whichever of pass6/7 a
/// given reference needs first.
#[must_use]
pub fn lower_program(
    typed: &TypedPatch,
    catalog: &BlockCatalog,
    buses: &[Bus],
    bus_connections: &[BusConnection],
    time_root: &TimeRootBinding,
    builder: IRBuilder,
) -> LoweringResult {
    let mut engine = LowerEngine {
        typed,
        catalog,
        buses,
        bus_connections,
        time_root,
        builder,
        block_cache: BTreeMap::new(),
        block_in_progress: BTreeSet::new(),
        bus_cache: BTreeMap::new(),
        bus_in_progress: BTreeSet::new(),
        errors: Vec::new(),
    };

    for block in &typed.blocks {
        engine.lower_block(&block.id);
    }
    for bus in buses {
        engine.lower_bus(&bus.id);
    }

    let mut render_specs = Vec::new();
    for block in &typed.blocks {
        if !catalog.get(&block.block_type).is_some_and(|def| matches!(def.capability, crate::catalog::Capability::Render)) {
            continue;
        }
        if let Some(outputs) = engine.block_cache.get(&block.id) {
            for value in outputs {
                if let ResolvedValue::Render(id) = value {
                    render_specs.push(*id);
                }
            }
        }
    }

    LoweringResult { program: engine.builder.build(), errors: engine.errors, render_specs }
}

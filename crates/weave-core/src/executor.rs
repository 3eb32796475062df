//! The per-frame schedule executor (spec §4.5 "Schedule executor").
//!
//! Owns everything that lives across frames — the [`ValueStore`], the
//! [`StateBuffer`], the field materializer's pool/cache, the signal
//! evaluator's per-frame memo, and the previous frame's cyclic phase — and
//! walks a compiled [`Schedule`] once per `tick()`. A `RuntimeError` aborts
//! just that frame: the host logs it and keeps showing the previous frame's
//! `RenderTree`, rather than propagating a panic up through the embedding
//! renderer (spec §7, "runtime errors abort the current frame").

use std::sync::Arc;

use weave_abi::render::{Affine2, BlendMode, Glyph, Instances2d, RenderNode, RenderTree};

use crate::builder::BuilderProgramIr;
use crate::bus::color_from_lane;
use crate::error::RuntimeError;
use crate::eval::field::{self, FieldBufferPool, FieldFrameCache};
use crate::eval::signal::{self, SigFrameCache, TimeContext};
use crate::ident::ValueSlot;
use crate::passes::CompiledProgram;
use crate::render_spec::GlyphKind;
use crate::schedule::{Schedule, StepKind};
use crate::state_buffer::StateBuffer;
use crate::telemetry::{null_sink, TelemetrySink};
use crate::time_model::TimeModel;
use crate::value_store::ValueStore;

fn to_glyph(kind: GlyphKind) -> Glyph {
    match kind {
        GlyphKind::Circle => Glyph::Circle,
        GlyphKind::Rect => Glyph::Rect,
    }
}

/// Drives one compiled program frame by frame.
pub struct Executor {
    program: BuilderProgramIr,
    schedule: Schedule,
    time_model: TimeModel,
    values: ValueStore,
    state: StateBuffer,
    field_pool: FieldBufferPool,
    field_cache: FieldFrameCache,
    sig_cache: SigFrameCache,
    telemetry: Arc<dyn TelemetrySink>,
    frame: u64,
    prev_phase: Option<f64>,
    last_render: RenderTree,
}

impl Executor {
    /// Builds an executor for `compiled`, seeding the `StateBuffer` from its
    /// const pool and starting with an empty `RenderTree`.
    ///
    /// # Errors
    /// Returns [`RuntimeError::StateBufferInitOutOfRange`] if the program's
    /// state layout references a const id outside its own const pool — an
    /// internal compiler/builder disagreement, not a patch-authoring error.
    pub fn new(compiled: CompiledProgram, telemetry: Arc<dyn TelemetrySink>) -> Result<Self, RuntimeError> {
        let CompiledProgram { program, schedule, time_model } = compiled;
        let state = StateBuffer::new(&program.state_layout, &program.consts)?;
        let values = ValueStore::new(program.slot_count);
        Ok(Self {
            program,
            schedule,
            time_model,
            values,
            state,
            field_pool: FieldBufferPool::new(),
            field_cache: FieldFrameCache::new(),
            sig_cache: SigFrameCache::new(),
            telemetry,
            frame: 0,
            prev_phase: None,
            last_render: RenderTree::empty(),
        })
    }

    /// Convenience constructor with a no-op telemetry sink.
    ///
    /// # Errors
    /// See [`Self::new`].
    pub fn new_silent(compiled: CompiledProgram) -> Result<Self, RuntimeError> {
        Self::new(compiled, null_sink())
    }

    /// Number of frames successfully executed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Direct access to the frame's value store, for snapshotting.
    #[must_use]
    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    /// Advances the program to absolute time `t_abs_ms` and returns the
    /// resulting `RenderTree`.
    ///
    /// A `RuntimeError` raised mid-schedule aborts the rest of this frame's
    /// steps; the previous frame's tree is returned unchanged and the error
    /// is logged, not propagated (spec §7).
    pub fn tick(&mut self, t_abs_ms: f64) -> &RenderTree {
        self.values.clear();
        self.sig_cache.clear();
        self.field_cache.release_frame(&mut self.field_pool);

        match self.run_steps(t_abs_ms) {
            Ok(tree) => {
                self.last_render = tree;
                self.frame += 1;
                self.telemetry.frame_end(t_abs_ms);
            }
            Err(err) => {
                tracing::warn!(frame = self.frame, error = %err, "frame aborted, reusing previous render tree");
            }
        }
        &self.last_render
    }

    fn run_steps(&mut self, t_abs_ms: f64) -> Result<RenderTree, RuntimeError> {
        let mut time_ctx = TimeContext { t_abs_ms, t_model_ms: t_abs_ms, phase01: None, wrap_event: None };
        let mut tree = RenderTree::empty();

        for step in &self.schedule.steps {
            let step_id = step.id.0;
            match &step.kind {
                StepKind::TimeDerive { t_abs_slot, t_model_slot, cyclic_slots } => {
                    let (t_model, phase, wrap) = self.time_model.derive(t_abs_ms, self.prev_phase);
                    self.values.write(*t_abs_slot, step_id, t_abs_ms)?;
                    self.values.write(*t_model_slot, step_id, t_model)?;
                    if let Some((phase_slot, wrap_slot)) = cyclic_slots {
                        self.values.write(*phase_slot, step_id, phase.unwrap_or(0.0))?;
                        self.values.write(*wrap_slot, step_id, f64::from(u8::from(wrap.unwrap_or(false))))?;
                    }
                    time_ctx = TimeContext { t_abs_ms, t_model_ms: t_model, phase01: phase, wrap_event: wrap };
                    self.prev_phase = phase;
                }
                StepKind::SigEval { expr, target } => {
                    let v = signal::evaluate(
                        &self.program.signal_ir,
                        *expr,
                        time_ctx,
                        &self.program.consts,
                        &mut self.state,
                        &self.program.state_layout,
                        &mut self.sig_cache,
                        &self.telemetry,
                    );
                    self.values.write(*target, step_id, v)?;
                }
                StepKind::FieldEval { expr, domain, .. } => {
                    let Some(desc) = self.program.domain_descs.get(&domain.0) else {
                        return Err(RuntimeError::InvalidDomainSlot { domain: *domain });
                    };
                    field::materialize(
                        &self.program.field_ir,
                        *expr,
                        *domain,
                        desc,
                        &self.program.consts,
                        &self.values,
                        &mut self.field_pool,
                        &mut self.field_cache,
                    );
                }
                StepKind::BusEval { sig_expr, field_expr, target, .. } => {
                    if let Some(expr) = sig_expr {
                        let v = signal::evaluate(
                            &self.program.signal_ir,
                            *expr,
                            time_ctx,
                            &self.program.consts,
                            &mut self.state,
                            &self.program.state_layout,
                            &mut self.sig_cache,
                            &self.telemetry,
                        );
                        self.values.write(*target, step_id, v)?;
                    }
                    if let Some(expr) = field_expr {
                        // Domain is recovered from the matching bus_field_writes entry.
                        if let Some(write) = self.program.bus_field_writes.iter().find(|w| w.expr == *expr) {
                            let Some(desc) = self.program.domain_descs.get(&write.domain.0) else {
                                return Err(RuntimeError::InvalidDomainSlot { domain: write.domain });
                            };
                            field::materialize(
                                &self.program.field_ir,
                                *expr,
                                write.domain,
                                desc,
                                &self.program.consts,
                                &self.values,
                                &mut self.field_pool,
                                &mut self.field_cache,
                            );
                        }
                    }
                }
                StepKind::DebugProbe { slots, .. } => {
                    let sampled: Vec<(ValueSlot, f64)> = slots.iter().map(|s| (*s, self.values.read(*s))).collect();
                    self.telemetry.probe(&sampled);
                }
                StepKind::Render { render_specs } => {
                    for render_id in render_specs {
                        let spec = &self.program.render_specs[render_id.0 as usize];
                        let Some(desc) = self.program.domain_descs.get(&spec.domain.0) else {
                            return Err(RuntimeError::InvalidDomainSlot { domain: spec.domain });
                        };
                        let xs = field::materialize(
                            &self.program.field_ir,
                            spec.positions_x,
                            spec.domain,
                            desc,
                            &self.program.consts,
                            &self.values,
                            &mut self.field_pool,
                            &mut self.field_cache,
                        );
                        let ys = field::materialize(
                            &self.program.field_ir,
                            spec.positions_y,
                            spec.domain,
                            desc,
                            &self.program.consts,
                            &self.values,
                            &mut self.field_pool,
                            &mut self.field_cache,
                        );
                        #[allow(clippy::cast_possible_truncation)]
                        let radius = self.values.read(spec.radius_slot) as f32;
                        let color = color_from_lane(self.values.read(spec.color_slot));
                        let count = xs.len().min(ys.len());
                        let mut transforms = Vec::with_capacity(count * 6);
                        for i in 0..count {
                            #[allow(clippy::cast_possible_truncation)]
                            let affine = Affine2::scale_translate(radius, xs[i] as f32, ys[i] as f32);
                            transforms.extend_from_slice(&[affine.a, affine.b, affine.c, affine.d, affine.e, affine.f]);
                        }
                        let instances = Instances2d {
                            glyph: to_glyph(spec.glyph),
                            transforms,
                            style_fill: Some(vec![color; count]),
                            style_stroke: None,
                            stroke_width: None,
                            opacity: Some(vec![spec.opacity; count]),
                        };
                        let node = if spec.glow {
                            RenderNode::Group {
                                transform: None,
                                opacity: None,
                                blend: Some(BlendMode::Add),
                                children: vec![RenderNode::Instances2d(instances)],
                            }
                        } else {
                            RenderNode::Instances2d(instances)
                        };
                        tree.nodes.push(node);
                    }
                }
            }
        }

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::builtin_catalog;
    use crate::composite::builtin_composites;
    use crate::passes::compile;
    use std::collections::BTreeMap;
    use weave_abi::diagnostics::{CompileStatus, CompileTrigger};
    use weave_abi::patch::{Block, BlockId, Patch, Settings};

    fn cycle_patch() -> Patch {
        Patch {
            patch_id: "p".into(),
            revision: 0,
            blocks: vec![Block {
                id: BlockId("time".into()),
                block_type: "CycleTimeRoot".into(),
                params: BTreeMap::new(),
                position: None,
            }],
            edges: vec![],
            buses: vec![],
            bus_connections: vec![],
            default_source_store: BTreeMap::new(),
            settings: Settings { seed: 0, emit_ir: false },
        }
    }

    #[test]
    fn ticking_a_minimal_program_advances_frame_count() {
        let catalog = builtin_catalog().expect("catalog");
        let composites = builtin_composites();
        let patch = cycle_patch();
        let outcome = compile(&patch, &catalog, &composites, 1, CompileTrigger::Manual);
        assert_eq!(outcome.finished.status, CompileStatus::Ok);
        let compiled = outcome.compiled.expect("compiled program");
        let mut executor = Executor::new_silent(compiled).expect("executor");
        executor.tick(0.0);
        executor.tick(16.0);
        assert_eq!(executor.frame_count(), 2);
    }
}

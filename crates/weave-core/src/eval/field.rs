//! The field materializer (spec §4.6 "Field materializer").
//!
//! Fields are lazy: materializing a field expression requires a domain
//! element count and yields one `f64` per element. A buffer pool keyed by
//! `(domain element count)` avoids reallocating per frame; a per-frame
//! handle cache keyed by `(FieldExprId, DomainId)` avoids rematerializing
//! the same field for the same domain twice in one frame. `release_frame()`
//! returns every buffer checked out this frame to the pool and bumps the
//! cache generation, the way the per-frame `SigFrameCache` is cleared for
//! signals.

use rustc_hash::FxHashMap;

use crate::bus::{color_from_lane, color_to_lane, fold_color, fold_numeric};
use crate::const_pool::{ConstPool, ConstValue};
use crate::domain::DomainDesc;
use crate::eval::kernels::{eval_binary, eval_unary};
use crate::ident::{DomainId, FieldExprId};
use crate::ir::{FieldIr, FieldOp};
use crate::value_store::ValueStore;

/// A pool of reusable `Vec<f64>` buffers, keyed by element count, so
/// repeated per-frame materialization does not reallocate (spec §4.6,
/// "buffer pool keyed by (format, layout, length)"; this evaluator only
/// ever materializes the `f64` format, so length alone is the key).
#[derive(Default)]
pub struct FieldBufferPool {
    free: FxHashMap<u32, Vec<Vec<f64>>>,
}

impl FieldBufferPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn checkout(&mut self, len: u32) -> Vec<f64> {
        if let Some(bucket) = self.free.get_mut(&len) {
            if let Some(buf) = bucket.pop() {
                return buf;
            }
        }
        vec![0.0; len as usize]
    }

    fn release(&mut self, buf: Vec<f64>) {
        let len = u32::try_from(buf.len()).unwrap_or(0);
        self.free.entry(len).or_default().push(buf);
    }
}

/// Per-frame cache of already-materialized fields, keyed by
/// `(FieldExprId, DomainId)`.
#[derive(Default)]
pub struct FieldFrameCache {
    handles: FxHashMap<(u32, u32), Vec<f64>>,
    generation: u64,
}

impl FieldFrameCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cache generation, bumped by `release_frame`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns every materialized buffer to `pool` and bumps the
    /// generation, readying the cache for the next frame (spec §4.6,
    /// "at frame end, `releaseFrame()` returns buffers to the pool and
    /// bumps the cache generation").
    pub fn release_frame(&mut self, pool: &mut FieldBufferPool) {
        for (_, buf) in std::mem::take(&mut self.handles) {
            pool.release(buf);
        }
        self.generation += 1;
    }
}

/// Materializes `expr` over `domain`, memoizing in `cache` and allocating
/// scratch buffers from `pool`.
///
/// # Panics
/// Never under correct IR; a `BroadcastSig`/`SampleSignal` node's
/// `sig_slot` is resolved against `signals` which must contain every slot
/// the schedule populated before this field step runs (pass8 orders steps
/// so that invariant always holds).
#[allow(clippy::too_many_arguments)]
pub fn materialize(
    ir: &FieldIr,
    expr: FieldExprId,
    domain_id: DomainId,
    domain: &DomainDesc,
    consts: &ConstPool,
    signals: &ValueStore,
    pool: &mut FieldBufferPool,
    cache: &mut FieldFrameCache,
) -> Vec<f64> {
    let key = (expr.0, domain_id.0);
    if let Some(existing) = cache.handles.get(&key) {
        return existing.clone();
    }
    let count = domain.count;
    let result = match ir.get(expr) {
        FieldOp::Const(const_id) => {
            let v = match consts.get(*const_id) {
                ConstValue::Number(n) => *n,
                ConstValue::Bool(b) => f64::from(u8::from(*b)),
                ConstValue::Array(_) | ConstValue::String(_) => 0.0,
            };
            vec![v; count as usize]
        }
        FieldOp::BroadcastSig { sig_slot, .. } => {
            let v = signals.read(*sig_slot);
            vec![v; count as usize]
        }
        FieldOp::SampleSignal { signal_slot, axis, .. } => {
            // Samples the domain's spatial layout (e.g. a Grid's x/y
            // coordinate per element); a Flat domain has no positions to
            // sample, so every element falls back to the shared signal.
            let v = signals.read(*signal_slot);
            let mut buf = pool.checkout(count);
            for (i, slot) in buf.iter_mut().enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let idx = i as u32;
                *slot = domain.grid_position(idx).map_or(v, |(x, y)| {
                    f64::from(if *axis == 0 { x } else { y })
                });
            }
            buf
        }
        FieldOp::Map { src, kernel } => {
            let input = materialize(ir, *src, domain_id, domain, consts, signals, pool, cache);
            let mut out = pool.checkout(count);
            for (o, i) in out.iter_mut().zip(input.iter()) {
                *o = eval_unary(*kernel, *i);
            }
            out
        }
        FieldOp::Zip { a, b, kernel } => {
            let av = materialize(ir, *a, domain_id, domain, consts, signals, pool, cache);
            let bv = materialize(ir, *b, domain_id, domain, consts, signals, pool, cache);
            let mut out = pool.checkout(count);
            for ((o, x), y) in out.iter_mut().zip(av.iter()).zip(bv.iter()) {
                *o = eval_binary(*kernel, *x, *y);
            }
            out
        }
        FieldOp::Select { cond, t, f } => {
            let cv = materialize(ir, *cond, domain_id, domain, consts, signals, pool, cache);
            let tv = materialize(ir, *t, domain_id, domain, consts, signals, pool, cache);
            let fv = materialize(ir, *f, domain_id, domain, consts, signals, pool, cache);
            let mut out = pool.checkout(count);
            for (((o, c), t), f) in out.iter_mut().zip(cv.iter()).zip(tv.iter()).zip(fv.iter()) {
                *o = if *c != 0.0 { *t } else { *f };
            }
            out
        }
        FieldOp::FieldCombine { terms, mode, is_color, .. } => {
            let term_bufs: Vec<Vec<f64>> = terms
                .iter()
                .map(|t| materialize(ir, *t, domain_id, domain, consts, signals, pool, cache))
                .collect();
            let mut out = pool.checkout(count);
            for (i, slot) in out.iter_mut().enumerate() {
                let values: Vec<f64> = term_bufs.iter().map(|b| b[i]).collect();
                *slot = if *is_color {
                    let colors: Vec<_> = values.iter().copied().map(color_from_lane).collect();
                    color_to_lane(fold_color(*mode, &colors))
                } else {
                    fold_numeric(*mode, &values)
                };
            }
            out
        }
    };
    cache.handles.insert(key, result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Kernel;

    #[test]
    fn const_field_fills_every_element() {
        let mut ir = FieldIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(5.0);
        ir.nodes.push(FieldOp::Const(c));
        let domain = DomainDesc::flat(4);
        let signals = ValueStore::new(1);
        let mut pool = FieldBufferPool::new();
        let mut cache = FieldFrameCache::new();
        let out = materialize(&ir, FieldExprId(0), DomainId(0), &domain, &consts, &signals, &mut pool, &mut cache);
        assert_eq!(out, vec![5.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn map_transforms_each_element() {
        let mut ir = FieldIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(2.0);
        ir.nodes.push(FieldOp::Const(c));
        ir.nodes.push(FieldOp::Map { src: FieldExprId(0), kernel: Kernel::Sub });
        let domain = DomainDesc::flat(3);
        let signals = ValueStore::new(1);
        let mut pool = FieldBufferPool::new();
        let mut cache = FieldFrameCache::new();
        let out = materialize(&ir, FieldExprId(1), DomainId(0), &domain, &consts, &signals, &mut pool, &mut cache);
        assert_eq!(out, vec![-2.0, -2.0, -2.0]);
    }

    #[test]
    fn materializing_twice_in_one_frame_reuses_the_cached_handle() {
        let mut ir = FieldIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(1.0);
        ir.nodes.push(FieldOp::Const(c));
        let domain = DomainDesc::flat(2);
        let signals = ValueStore::new(1);
        let mut pool = FieldBufferPool::new();
        let mut cache = FieldFrameCache::new();
        let first = materialize(&ir, FieldExprId(0), DomainId(0), &domain, &consts, &signals, &mut pool, &mut cache);
        let second = materialize(&ir, FieldExprId(0), DomainId(0), &domain, &consts, &signals, &mut pool, &mut cache);
        assert_eq!(first, second);
    }

    #[test]
    fn release_frame_returns_buffers_and_bumps_generation() {
        let mut ir = FieldIr::default();
        let mut consts = ConstPool::new();
        let c = consts.intern_number(1.0);
        ir.nodes.push(FieldOp::Const(c));
        let domain = DomainDesc::flat(2);
        let signals = ValueStore::new(1);
        let mut pool = FieldBufferPool::new();
        let mut cache = FieldFrameCache::new();
        materialize(&ir, FieldExprId(0), DomainId(0), &domain, &consts, &signals, &mut pool, &mut cache);
        assert_eq!(cache.generation(), 0);
        cache.release_frame(&mut pool);
        assert_eq!(cache.generation(), 1);
    }
}

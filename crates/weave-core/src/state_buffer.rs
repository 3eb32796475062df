//! `StateBuffer`: persistent storage for stateful block cells (spec §4.4,
//! "StateBuffer mirrors this layout for state cells").
//!
//! Unlike [`crate::value_store::ValueStore`], state persists *across*
//! frames by design — `EnvelopeAD` and `PulseDivider` read and write the
//! same cell every frame. Construction seeds every cell from the const
//! pool's `initial_const_id`; a ring-buffer cell of size `n` fills all `n`
//! elements with that one seed value, mirroring a single scalar default
//! broadcast across a small fixed-size window.

use crate::const_pool::{ConstPool, ConstValue};
use crate::error::RuntimeError;
use crate::ident::StateId;

/// One state cell's layout: an offset into the flat `f64` buffer, a width
/// (1 for a plain scalar cell, N for a ring buffer), and the const pool
/// entry supplying its initial value.
#[derive(Debug, Clone)]
pub struct StateCellLayout {
    /// Offset of this cell's first element in the flat buffer.
    pub offset: u32,
    /// Number of `f64` elements this cell occupies.
    pub len: u32,
    /// Const pool id supplying the seed value for every element.
    pub initial_const_id: crate::ident::ConstId,
}

/// Persistent per-cell storage, laid out as one flat `f64` buffer per the
/// cell layout table recorded by the `IRBuilder`.
pub struct StateBuffer {
    values: Vec<f64>,
}

impl StateBuffer {
    /// Builds a `StateBuffer` sized and seeded from `layouts` and `consts`.
    ///
    /// # Errors
    /// Returns [`RuntimeError::StateBufferInitOutOfRange`] if any layout's
    /// `initial_const_id` does not index an entry in `consts` (spec §4.4,
    /// "throws if `initialConstId` is out of range").
    pub fn new(layouts: &[StateCellLayout], consts: &ConstPool) -> Result<Self, RuntimeError> {
        let capacity = layouts.iter().map(|l| l.offset + l.len).max().unwrap_or(0);
        let mut values = vec![0.0; capacity as usize];
        for layout in layouts {
            if layout.initial_const_id.0 as usize >= consts.len() {
                return Err(RuntimeError::StateBufferInitOutOfRange {
                    offset: layout.offset,
                    len: layout.len,
                    capacity: u32::try_from(consts.len()).unwrap_or(u32::MAX),
                });
            }
            let seed = match consts.get(layout.initial_const_id) {
                ConstValue::Number(n) => *n,
                ConstValue::Bool(b) => f64::from(u8::from(*b)),
                _ => 0.0,
            };
            let end = layout.offset + layout.len;
            for i in layout.offset..end {
                values[i as usize] = seed;
            }
        }
        Ok(Self { values })
    }

    /// Reads the cell value at `offset`.
    #[must_use]
    pub fn read(&self, offset: u32) -> f64 {
        self.values[offset as usize]
    }

    /// Writes `value` into the cell at `offset`. State writes are not
    /// subject to the single-writer rule: by design exactly one stateful
    /// block instance owns a given cell, and it may update it every frame.
    pub fn write(&mut self, offset: u32, value: f64) {
        self.values[offset as usize] = value;
    }

    /// Reads `len` contiguous elements starting at `offset` (ring-buffer
    /// cells).
    #[must_use]
    pub fn read_range(&self, offset: u32, len: u32) -> &[f64] {
        let start = offset as usize;
        &self.values[start..start + len as usize]
    }

    /// Total number of `f64` elements across all cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no cells are allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Allocator for [`StateCellLayout`] entries, used by the `IRBuilder` when
/// a block's `lower()` declares a new state cell.
#[derive(Default)]
pub struct StateLayoutBuilder {
    next_offset: u32,
    layouts: Vec<StateCellLayout>,
}

impl StateLayoutBuilder {
    /// Creates an empty layout builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new cell of `len` elements, seeded from `initial_const_id`,
    /// and returns its [`StateId`].
    pub fn alloc(&mut self, len: u32, initial_const_id: crate::ident::ConstId) -> StateId {
        let id = StateId(u32::try_from(self.layouts.len()).unwrap_or(u32::MAX));
        let offset = self.next_offset;
        self.next_offset += len;
        self.layouts.push(StateCellLayout { offset, len, initial_const_id });
        id
    }

    /// Looks up the layout for a previously allocated cell.
    #[must_use]
    pub fn layout(&self, id: StateId) -> &StateCellLayout {
        &self.layouts[id.0 as usize]
    }

    /// Consumes the builder, returning its layout table.
    #[must_use]
    pub fn build(self) -> Vec<StateCellLayout> {
        self.layouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_cell_fills_all_elements_with_the_seed_value() {
        let mut pool = ConstPool::new();
        let seed = pool.intern_number(7.0);
        let layouts = vec![StateCellLayout { offset: 0, len: 4, initial_const_id: seed }];
        let buf = StateBuffer::new(&layouts, &pool).expect("build");
        assert_eq!(buf.read_range(0, 4), &[7.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn out_of_range_initial_const_id_is_rejected() {
        let pool = ConstPool::new();
        let dangling = crate::ident::ConstId(0);
        let layouts = vec![StateCellLayout { offset: 0, len: 1, initial_const_id: dangling }];
        let err = StateBuffer::new(&layouts, &pool).unwrap_err();
        assert!(matches!(err, RuntimeError::StateBufferInitOutOfRange { .. }));
    }

    #[test]
    fn layout_builder_assigns_contiguous_non_overlapping_offsets() {
        let mut pool = ConstPool::new();
        let seed = pool.intern_number(0.0);
        let mut builder = StateLayoutBuilder::new();
        let a = builder.alloc(1, seed);
        let b = builder.alloc(3, seed);
        assert_eq!(builder.layout(a).offset, 0);
        assert_eq!(builder.layout(b).offset, 1);
    }
}

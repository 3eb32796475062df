//! `ValueStore`: typed-array-backed per-frame storage with the
//! single-writer rule (spec §4.4 "ValueStore and single-writer discipline").
//!
//! Every `ValueSlot` is a dense `f64` lane in one flat buffer, the way
//! `warp_core::tick_patch::SlotId` addresses a single flat ledger rather
//! than per-type heaps. A `written_by` table records which schedule step
//! last claimed each slot this frame; a second write from a *different*
//! step before the next `clear()` is `RuntimeError::SingleWriterViolation`
//! (spec property P1). A second write from the *same* step (e.g. a bundle
//! writing several lanes in one call) is allowed.

use crate::error::RuntimeError;
use crate::ident::ValueSlot;

/// Per-frame value storage with single-writer enforcement.
pub struct ValueStore {
    values: Vec<f64>,
    written_by: Vec<Option<u32>>,
}

impl ValueStore {
    /// Allocates a store with `slot_count` lanes, all initialized to `0.0`
    /// and unwritten.
    #[must_use]
    pub fn new(slot_count: u32) -> Self {
        let len = slot_count as usize;
        Self { values: vec![0.0; len], written_by: vec![None; len] }
    }

    /// Writes `value` into `slot` on behalf of `step`, enforcing the
    /// single-writer rule.
    ///
    /// # Errors
    /// Returns [`RuntimeError::SingleWriterViolation`] if `slot` was already
    /// written by a different step this frame.
    pub fn write(&mut self, slot: ValueSlot, step: u32, value: f64) -> Result<(), RuntimeError> {
        let idx = slot.0 as usize;
        match self.written_by[idx] {
            Some(first) if first != step => {
                return Err(RuntimeError::SingleWriterViolation {
                    slot,
                    first_writer: first,
                    conflicting_writer: step,
                })
            }
            _ => {}
        }
        self.values[idx] = value;
        self.written_by[idx] = Some(step);
        Ok(())
    }

    /// Writes a contiguous lane run starting at `slot` (bundle types:
    /// vec3/vec4/mat4/color-channel arrays), one value per lane.
    ///
    /// # Errors
    /// Returns [`RuntimeError::SingleWriterViolation`] on the first
    /// conflicting lane; lanes before that point have already been written.
    pub fn write_bundle(&mut self, slot: ValueSlot, step: u32, values: &[f64]) -> Result<(), RuntimeError> {
        for (i, &v) in values.iter().enumerate() {
            self.write(slot.offset(u32::try_from(i).unwrap_or(0)), step, v)?;
        }
        Ok(())
    }

    /// Reads the current value of `slot`.
    #[must_use]
    pub fn read(&self, slot: ValueSlot) -> f64 {
        self.values[slot.0 as usize]
    }

    /// Reads `len` contiguous lanes starting at `slot`.
    #[must_use]
    pub fn read_bundle(&self, slot: ValueSlot, len: u32) -> &[f64] {
        let start = slot.0 as usize;
        &self.values[start..start + len as usize]
    }

    /// Clears writer provenance for the next frame without zeroing lane
    /// values (spec §4.4: "`clear()` resets the written-set without
    /// zeroing buffers — values persist as last-frame data"). Any step that
    /// does not write its slot this frame will see the prior frame's value
    /// until something writes it again.
    pub fn clear(&mut self) {
        self.written_by.fill(None);
    }

    /// Total number of lanes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store has no lanes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

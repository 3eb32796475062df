//! Frame snapshots: a digest of a frame's `ValueStore` for determinism
//! testing (spec §8, property P2 "same patch + same frame times -> same
//! results").
//!
//! Comparing two `Vec<f64>` buffers directly works, but a content-addressed
//! digest lets property tests assert "two independently executed runs
//! produced the same frame" without carrying the whole buffer around, the
//! way `warp_core::tick_patch` digests a commit's ops instead of re-diffing
//! the graph.

use blake3::Hasher;

use crate::value_store::ValueStore;

/// A 32-byte digest of one frame's written lane values.
pub type Digest = [u8; 32];

/// Hashes every lane in `store`, in slot order, including unwritten lanes
/// (their last-frame value is part of the frame's observable state).
#[must_use]
pub fn digest_frame(store: &ValueStore) -> Digest {
    let mut h = Hasher::new();
    h.update(&(store.len() as u64).to_le_bytes());
    for i in 0..store.len() {
        let slot = crate::ident::ValueSlot(u32::try_from(i).unwrap_or(u32::MAX));
        h.update(&store.read(slot).to_bits().to_le_bytes());
    }
    h.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::ValueSlot;

    #[test]
    fn identical_stores_digest_identically() {
        let mut a = ValueStore::new(4);
        let mut b = ValueStore::new(4);
        a.write(ValueSlot(0), 1, 1.5).expect("write");
        b.write(ValueSlot(0), 1, 1.5).expect("write");
        assert_eq!(digest_frame(&a), digest_frame(&b));
    }

    #[test]
    fn differing_stores_digest_differently() {
        let mut a = ValueStore::new(4);
        let mut b = ValueStore::new(4);
        a.write(ValueSlot(0), 1, 1.5).expect("write");
        b.write(ValueSlot(0), 1, 1.6).expect("write");
        assert_ne!(digest_frame(&a), digest_frame(&b));
    }

    #[test]
    fn negative_and_positive_zero_digest_differently() {
        let mut a = ValueStore::new(1);
        let mut b = ValueStore::new(1);
        a.write(ValueSlot(0), 1, 0.0).expect("write");
        b.write(ValueSlot(0), 1, -0.0).expect("write");
        assert_ne!(digest_frame(&a), digest_frame(&b));
    }
}

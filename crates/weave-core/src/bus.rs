//! Bus combine semantics (spec §4.2 pass7, "Combine-mode semantics").
//!
//! Grounded on `warp_core::materialization::reduce_op::ReduceOp`: a small
//! enum of fold operations split into commutative monoids (permutation
//! invariant, safe to fold in any order) and order-dependent ops (`last`,
//! `layer`) that rely on the caller's canonical term ordering — here,
//! publisher terms already sorted by `(blockId, portId)` at pass7. Empty
//! input returns each op's identity value rather than panicking, exactly as
//! `ReduceOp::apply` does for its byte-string domain.

use weave_abi::render::{pack_rgba8, unpack_rgba8, PackedColor};

use crate::ir::CombineMode;

impl CombineMode {
    /// Returns `true` if folding in a different term order cannot change
    /// the result (spec §4.2: `sum`/`product`/`min`/`max` are permutation
    /// invariant; `last`/`layer` are not).
    #[must_use]
    pub const fn is_commutative(self) -> bool {
        matches!(self, Self::Sum | Self::Product | Self::Min | Self::Max | Self::Pulse | Self::Merge)
    }

    /// The value a combine with zero publisher terms should produce before
    /// the bus's declared `defaultValue` is substituted (spec §4.2, "empty
    /// buses with no publishers emit a const node populated from the bus
    /// defaultValue" — this identity only matters when `fold_numeric` is
    /// invoked directly against already-nonempty IR term lists; pass7 never
    /// calls it on an empty term list).
    #[must_use]
    pub const fn numeric_identity(self) -> f64 {
        match self {
            Self::Sum | Self::Pulse | Self::Merge => 0.0,
            Self::Product => 1.0,
            Self::Min => f64::INFINITY,
            Self::Max => f64::NEG_INFINITY,
            Self::Average | Self::Last | Self::Layer => 0.0,
        }
    }
}

/// Folds `terms` (already sorted by publisher `(blockId, portId)`) under
/// `mode`'s numeric combine semantics.
///
/// # Panics
/// Never; an empty `terms` slice returns `mode`'s identity value. Pass7
/// only calls this with a nonempty term list — empty buses are resolved to
/// a constant before this function is reached — but the identity makes the
/// function total regardless.
#[must_use]
pub fn fold_numeric(mode: CombineMode, terms: &[f64]) -> f64 {
    if terms.is_empty() {
        return mode.numeric_identity();
    }
    match mode {
        CombineMode::Sum | CombineMode::Pulse | CombineMode::Merge => terms.iter().sum(),
        CombineMode::Product => terms.iter().product(),
        #[allow(clippy::cast_precision_loss)]
        CombineMode::Average => terms.iter().sum::<f64>() / terms.len() as f64,
        CombineMode::Min => terms.iter().copied().fold(f64::INFINITY, f64::min),
        CombineMode::Max => terms.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        CombineMode::Last | CombineMode::Layer => *terms.last().unwrap_or(&0.0),
    }
}

/// Folds packed RGBA8 `terms` (already sorted by publisher order) under
/// `mode`. Only `Last` and `Layer` (Porter-Duff "over", applied left to
/// right in term order) are meaningful for color; any other mode reaching
/// here is a pass2 bug (`UnsupportedCombineMode` should have rejected it
/// earlier) and falls back to `Last`.
#[must_use]
pub fn fold_color(mode: CombineMode, terms: &[PackedColor]) -> PackedColor {
    match (mode, terms) {
        (_, []) => 0,
        (CombineMode::Layer, terms) => {
            terms.iter().copied().fold(0u32, |acc, over| porter_duff_over(over, acc))
        }
        (_, terms) => *terms.last().unwrap_or(&0),
    }
}

/// Reinterprets a `ValueStore` lane holding a color-typed signal as the
/// packed RGBA8 value it represents. Exact: every `u32` fits losslessly in
/// an `f64`'s 53-bit mantissa, so this is the inverse of [`color_to_lane`]
/// with no rounding in either direction.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn color_from_lane(v: f64) -> PackedColor {
    v as u32
}

/// The inverse of [`color_from_lane`].
#[must_use]
pub fn color_to_lane(c: PackedColor) -> f64 {
    f64::from(c)
}

/// Composites `over` on top of `under` using the standard Porter-Duff
/// "over" operator in premultiplied-equivalent straight-alpha form.
fn porter_duff_over(over: PackedColor, under: PackedColor) -> PackedColor {
    let (or, og, ob, oa) = unpack_rgba8(over);
    let (ur, ug, ub, ua) = unpack_rgba8(under);
    let oaf = f32::from(oa) / 255.0;
    let uaf = f32::from(ua) / 255.0;
    let out_af = oaf + uaf * (1.0 - oaf);
    if out_af <= f32::EPSILON {
        return 0;
    }
    let blend = |oc: u8, uc: u8| -> u8 {
        let ocf = f32::from(oc) / 255.0;
        let ucf = f32::from(uc) / 255.0;
        let out = (ocf * oaf + ucf * uaf * (1.0 - oaf)) / out_af;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (out.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let out_a = (out_af.clamp(0.0, 1.0) * 255.0).round() as u8;
    pack_rgba8(blend(or, ur), blend(og, ug), blend(ob, ub), out_a)
}

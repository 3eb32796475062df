//! Render specs: the bridge between a `Render`-capability block's lowered
//! IR and the executor's `RenderNode` construction (spec §4.6/§6, "the
//! final render step composes a `RenderTree` from every render sink").
//!
//! The generic IR (`SigOp`/`FieldOp`) has no node shaped like "draw glyphs
//! at these positions" — that is inherently block-specific knowledge, not a
//! pure numeric expression. A render-capability block's `lower()` records
//! one `RenderSpec` describing which domain/fields/signals feed its
//! drawing, and the executor reads it back directly at `StepKind::Render`
//! time instead of routing through `ValueStore` slots.

use crate::ident::{DomainId, FieldExprId, ValueSlot};

/// Which primitive glyph a `RenderSpec` instances (spec §3 `Glyph`,
/// restricted to the shapes this compiler's built-in catalog emits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    /// A filled/stroked circle.
    Circle,
    /// An axis-aligned rectangle.
    Rect,
}

/// One render-capability block's lowered drawing description.
///
/// Positions are modeled as two independent scalar field expressions
/// (`positions_x`/`positions_y`) rather than a single vec2-valued field,
/// since `FieldIr` nodes only ever carry one `f64` lane per element (see
/// `DESIGN.md`, "positions as two scalar fields").
#[derive(Debug, Clone)]
pub struct RenderSpec {
    /// Which glyph every element instances.
    pub glyph: GlyphKind,
    /// The domain supplying element count and iteration order.
    pub domain: DomainId,
    /// Per-element x coordinate.
    pub positions_x: FieldExprId,
    /// Per-element y coordinate.
    pub positions_y: FieldExprId,
    /// Per-frame signal slot supplying the shared glyph radius/half-extent.
    pub radius_slot: ValueSlot,
    /// Per-frame signal slot supplying the shared fill color, packed RGBA8
    /// reinterpreted as an exact `f64` lane (see `bus::color_from_lane`).
    pub color_slot: ValueSlot,
    /// Overall opacity multiplier in `[0, 1]`.
    pub opacity: f32,
    /// Whether this batch renders with an additive glow pass (`DotsRenderer`
    /// `glow` param).
    pub glow: bool,
}

//! `RenderTree` output format (spec §6).
//!
//! Colors are packed as `(r<<24)|(g<<16)|(b<<8)|a` in byte units.
//! Transforms are 2x3 affine matrices `(a, b, c, d, e, f)`. Glyphs are
//! unit-sized at the origin; scale comes from the transform.

/// A packed RGBA8 color: `(r<<24)|(g<<16)|(b<<8)|a`.
pub type PackedColor = u32;

/// Packs four byte channels into a [`PackedColor`].
#[must_use]
pub const fn pack_rgba8(r: u8, g: u8, b: u8, a: u8) -> PackedColor {
    ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32)
}

/// Unpacks a [`PackedColor`] into `(r, g, b, a)` byte channels.
#[must_use]
pub const fn unpack_rgba8(c: PackedColor) -> (u8, u8, u8, u8) {
    (
        ((c >> 24) & 0xFF) as u8,
        ((c >> 16) & 0xFF) as u8,
        ((c >> 8) & 0xFF) as u8,
        (c & 0xFF) as u8,
    )
}

/// A 2x3 affine transform `(a, b, c, d, e, f)`:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Affine2 {
    /// Row-major affine coefficients.
    pub a: f32,
    /// See [`Affine2::a`].
    pub b: f32,
    /// See [`Affine2::a`].
    pub c: f32,
    /// See [`Affine2::a`].
    pub d: f32,
    /// Translation x.
    pub e: f32,
    /// Translation y.
    pub f: f32,
}

impl Affine2 {
    /// The identity transform.
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// Builds a translate-only transform.
    #[must_use]
    pub const fn translate(x: f32, y: f32) -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: x, f: y }
    }

    /// Builds a uniform-scale-then-translate transform.
    #[must_use]
    pub const fn scale_translate(scale: f32, x: f32, y: f32) -> Self {
        Self { a: scale, b: 0.0, c: 0.0, d: scale, e: x, f: y }
    }
}

/// Instanced glyph kind for [`RenderNode::Instances2d`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Glyph {
    /// Unit circle centered at the origin.
    Circle,
    /// Unit square centered at the origin.
    Rect,
    /// A star with `points` spikes and `inner` inner-radius ratio.
    Star {
        /// Number of spikes.
        points: u32,
        /// Inner radius as a fraction of the outer radius.
        inner: f32,
    },
    /// A polyline through the instance's local-space points.
    Polyline {
        /// Whether the polyline is closed into a loop.
        closed: bool,
    },
}

/// A batch of instanced glyphs sharing one draw call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instances2d {
    /// Glyph shared by all instances in this batch.
    pub glyph: Glyph,
    /// Per-instance affine transforms, `6*N` floats flattened.
    pub transforms: Vec<f32>,
    /// Per-instance fill colors, `N` packed RGBA8 values; omitted if unfilled.
    pub style_fill: Option<Vec<PackedColor>>,
    /// Per-instance stroke colors, `N` packed RGBA8 values.
    pub style_stroke: Option<Vec<PackedColor>>,
    /// Per-instance stroke widths, `N` floats.
    pub stroke_width: Option<Vec<f32>>,
    /// Per-instance opacity multipliers, `N` floats.
    pub opacity: Option<Vec<f32>>,
}

impl Instances2d {
    /// Number of instances implied by `transforms.len() / 6`.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.transforms.len() / 6
    }
}

/// Fill/stroke style for [`RenderNode::Path2d`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathStyle {
    /// Optional fill color.
    pub fill: Option<PackedColor>,
    /// Optional stroke color.
    pub stroke: Option<PackedColor>,
    /// Stroke width in local units.
    pub stroke_width: f32,
}

/// A single hand-authored path (grid lines, debug overlays).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Path2d {
    /// `2*N` floats, `(x, y)` pairs.
    pub points: Vec<f32>,
    /// Whether the path loops back to its first point.
    pub closed: bool,
    /// Fill/stroke style.
    pub style: PathStyle,
}

/// Blend mode for a [`RenderNode::Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlendMode {
    /// Standard source-over alpha blending.
    Normal,
    /// Additive blending.
    Add,
    /// Multiplicative blending.
    Multiply,
    /// Screen blending.
    Screen,
}

/// One node of the render tree produced by `program.signal(t, ctx)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RenderNode {
    /// Clears the frame to a solid color.
    Clear {
        /// Clear color.
        color: PackedColor,
    },
    /// A transform/opacity/blend group with nested children.
    Group {
        /// Group-local transform, applied before children are drawn.
        transform: Option<Affine2>,
        /// Group opacity multiplier.
        opacity: Option<f32>,
        /// Group blend mode.
        blend: Option<BlendMode>,
        /// Nested render nodes, drawn in order.
        children: Vec<RenderNode>,
    },
    /// A batch of instanced glyphs.
    Instances2d(Instances2d),
    /// A single hand-authored path.
    Path2d(Path2d),
}

/// The viewport context passed to `program.signal(t, ctx)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Viewport width in CSS pixels.
    pub width: f32,
    /// Viewport height in CSS pixels.
    pub height: f32,
    /// Device pixel ratio.
    pub dpr: f32,
}

/// The terminal output type consumed by the renderer for one frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderTree {
    /// Root-level nodes, drawn in order.
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    /// An empty render tree (no nodes).
    #[must_use]
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }
}

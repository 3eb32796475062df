//! Render-capability primitive blocks (spec §4.6 "render sinks").
//!
//! `DotsRendererPrimitive` is the actual glyph-instancing implementation;
//! the catalog-facing `DotsRenderer` composite (`crate::composite`) is a
//! 1:1 boundary-port passthrough onto this block, so the editor never wires
//! this type key directly (see `DESIGN.md`, "DotsRenderer primitive vs
//! composite").

use crate::catalog::{BlockDef, Capability, PortDef};
use crate::catalog::{DefaultSource, ResolvedValue};
use crate::render_spec::{GlyphKind, RenderSpec};
use crate::types::{Category, DomainTag, TypeDesc, World};
use weave_abi::render::pack_rgba8;

use super::util::{as_domain, as_field, as_sig};

fn domain_port() -> PortDef {
    PortDef {
        port_id: "domain",
        label: "Domain",
        ty: TypeDesc::scalar(World::Special, DomainTag::Domain, Category::Internal),
        default: Some(DefaultSource::Required),
    }
}

fn field_port(port_id: &'static str, label: &'static str) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Field, DomainTag::Float, Category::Core), default: None }
}

fn radius_port() -> PortDef {
    PortDef {
        port_id: "radius",
        label: "Radius",
        ty: TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core),
        default: Some(DefaultSource::Const(4.0)),
    }
}

/// Packed opaque white, the glyph's fallback fill when `color` is unwired.
fn default_color_lane() -> f64 {
    f64::from(pack_rgba8(255, 255, 255, 255))
}

fn color_port() -> PortDef {
    PortDef {
        port_id: "color",
        label: "Color",
        ty: TypeDesc::scalar(World::Signal, DomainTag::Color, Category::Core),
        default: Some(DefaultSource::Const(default_color_lane())),
    }
}

/// `DotsRendererPrimitive`: instances a `Circle` glyph across `domain`'s
/// elements at `(positionsX, positionsY)` with a shared `radius` and a
/// wireable `color` (packed RGBA8, bus-eligible under `Layer` combine).
/// Params: `opacity`, `glow`.
#[must_use]
pub fn dots_renderer_primitive() -> BlockDef {
    BlockDef {
        type_key: "DotsRendererPrimitive",
        inputs: vec![
            domain_port(),
            field_port("positionsX", "Positions X"),
            field_port("positionsY", "Positions Y"),
            radius_port(),
            color_port(),
        ],
        outputs: vec![PortDef {
            port_id: "renderTree",
            label: "Render Tree",
            ty: TypeDesc::scalar(World::Special, DomainTag::RenderTree, Category::Internal),
            default: None,
        }],
        capability: Capability::Render,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            let domain = as_domain(inputs.get(0))?;
            let (positions_x, _) = as_field(inputs.get(1))?;
            let (positions_y, _) = as_field(inputs.get(2))?;
            let radius_expr = as_sig(ctx, inputs.get(3))?;
            let radius_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Internal);
            let radius_slot = ctx.builder.schedule_sig(radius_expr, radius_ty, Some(&ctx.block_id), Some("radius".into()));

            let color_expr = as_sig(ctx, inputs.get(4))?;
            let color_ty = TypeDesc::scalar(World::Signal, DomainTag::Color, Category::Internal);
            let color_slot = ctx.builder.schedule_sig(color_expr, color_ty, Some(&ctx.block_id), Some("color".into()));

            #[allow(clippy::cast_possible_truncation)]
            let opacity = inputs.param("opacity", 1.0) as f32;
            let glow = inputs.param("glow", 0.0) != 0.0;

            let spec = RenderSpec { glyph: GlyphKind::Circle, domain, positions_x, positions_y, radius_slot, color_slot, opacity, glow };
            let id = ctx.builder.add_render_spec(spec);
            Ok(vec![ResolvedValue::Render(id)])
        },
    }
}

//! Identity-capability domain blocks (spec §4.1 catalog supplement:
//! `DomainN`, `GridDomain`).
//!
//! Both blocks allocate a `DomainId` and register its concrete
//! `crate::domain::DomainDesc` with the builder at lowering time, reading
//! the descriptor's shape straight out of their own params; `GridDomain`
//! additionally emits a pair of `SampleSignal` field nodes giving each
//! element's x/y position.

use crate::catalog::{BlockDef, Capability, PortDef, ResolvedValue};
use crate::domain::DomainDesc;
use crate::ir::FieldOp;
use crate::types::{Category, DomainTag, TypeDesc, World};

fn domain_port(port_id: &'static str, label: &'static str) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Special, DomainTag::Domain, Category::Internal), default: None }
}

fn field_float_port(port_id: &'static str, label: &'static str) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Field, DomainTag::Float, Category::Core), default: None }
}

/// `DomainN`: a flat domain of `count` elements, no spatial layout. Param:
/// `count`.
#[must_use]
pub fn domain_n() -> BlockDef {
    BlockDef {
        type_key: "DomainN",
        inputs: vec![],
        outputs: vec![domain_port("domain", "Domain")],
        capability: Capability::Identity,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = inputs.param("count", 1.0).max(0.0) as u32;
            let domain = ctx.builder.alloc_domain(DomainDesc::flat(count));
            Ok(vec![ResolvedValue::Domain(domain)])
        },
    }
}

/// `GridDomain`: a row-major grid domain, plus `positionsX`/`positionsY`
/// sampled fields (spec's single "positions" port modeled as two scalar
/// fields; see `DESIGN.md`). Params: `rows`, `cols`, `spacing`, `originX`,
/// `originY`.
#[must_use]
pub fn grid_domain() -> BlockDef {
    BlockDef {
        type_key: "GridDomain",
        inputs: vec![],
        outputs: vec![
            domain_port("domain", "Domain"),
            field_float_port("positionsX", "Positions X"),
            field_float_port("positionsY", "Positions Y"),
        ],
        capability: Capability::Identity,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rows = inputs.param("rows", 1.0).max(0.0) as u32;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let cols = inputs.param("cols", 1.0).max(0.0) as u32;
            #[allow(clippy::cast_possible_truncation)]
            let spacing = inputs.param("spacing", 1.0) as f32;
            #[allow(clippy::cast_possible_truncation)]
            let origin_x = inputs.param("originX", 0.0) as f32;
            #[allow(clippy::cast_possible_truncation)]
            let origin_y = inputs.param("originY", 0.0) as f32;
            let domain = ctx
                .builder
                .alloc_domain(DomainDesc::grid(rows, cols, spacing, (origin_x, origin_y)));
            let dummy_slot_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Internal);
            let signal_slot = ctx.builder.alloc_value_slot(dummy_slot_ty, Some(ctx.block_id.clone()), None);
            let positions_x = ctx.builder.push_field(
                FieldOp::SampleSignal { signal_slot, domain, axis: 0 },
                Some(&ctx.block_id),
            );
            let positions_y = ctx.builder.push_field(
                FieldOp::SampleSignal { signal_slot, domain, axis: 1 },
                Some(&ctx.block_id),
            );
            Ok(vec![
                ResolvedValue::Domain(domain),
                ResolvedValue::Field(positions_x, domain),
                ResolvedValue::Field(positions_y, domain),
            ])
        },
    }
}

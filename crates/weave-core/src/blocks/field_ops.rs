//! Standalone field operators exposed as catalog blocks (spec §4.1 catalog
//! supplement: `Broadcast`, `SampleSignal`).
//!
//! `GridDomain` (`domain_blocks.rs`) inlines a `SampleSignal` node directly
//! because it always wants exactly the grid's own x/y axes; these two
//! blocks expose the same `FieldOp` variants to arbitrary patch wiring.

use crate::catalog::{BlockDef, Capability, DefaultSource, PortDef, ResolvedValue};
use crate::ir::FieldOp;
use crate::types::{Category, DomainTag, TypeDesc, World};

use super::util::{as_domain, as_sig};

fn signal_float_port(port_id: &'static str, label: &'static str) -> PortDef {
    PortDef {
        port_id,
        label,
        ty: TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core),
        default: Some(DefaultSource::Const(0.0)),
    }
}

fn domain_port() -> PortDef {
    PortDef {
        port_id: "domain",
        label: "Domain",
        ty: TypeDesc::scalar(World::Special, DomainTag::Domain, Category::Internal),
        default: Some(DefaultSource::Required),
    }
}

fn field_float_port(port_id: &'static str, label: &'static str) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Field, DomainTag::Float, Category::Core), default: None }
}

/// `Broadcast`: spreads a single signal value across every element of
/// `domain`, producing a uniform field.
#[must_use]
pub fn broadcast() -> BlockDef {
    BlockDef {
        type_key: "Broadcast",
        inputs: vec![signal_float_port("signal", "Signal"), domain_port()],
        outputs: vec![field_float_port("field", "Field")],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            let sig = as_sig(ctx, inputs.get(0))?;
            let domain = as_domain(inputs.get(1))?;
            let sig_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Internal);
            let sig_slot = ctx.builder.schedule_sig(sig, sig_ty, Some(&ctx.block_id), None);
            let field = ctx.builder.push_field(FieldOp::BroadcastSig { sig, sig_slot, domain }, Some(&ctx.block_id));
            Ok(vec![ResolvedValue::Field(field, domain)])
        },
    }
}

/// `SampleSignal`: samples a per-element axis (`axis` param, `0` or `1`) of
/// `domain`'s layout, evaluated per-element relative to `signal`'s value for
/// flat domains. Param: `axis`.
#[must_use]
pub fn sample_signal() -> BlockDef {
    BlockDef {
        type_key: "SampleSignal",
        inputs: vec![signal_float_port("signal", "Signal"), domain_port()],
        outputs: vec![field_float_port("field", "Field")],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            let sig = as_sig(ctx, inputs.get(0))?;
            let domain = as_domain(inputs.get(1))?;
            let sig_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Internal);
            let signal_slot = ctx.builder.schedule_sig(sig, sig_ty, Some(&ctx.block_id), None);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let axis = inputs.param("axis", 0.0) as u8;
            let field = ctx.builder.push_field(FieldOp::SampleSignal { signal_slot, domain, axis }, Some(&ctx.block_id));
            Ok(vec![ResolvedValue::Field(field, domain)])
        },
    }
}

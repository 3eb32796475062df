//! Pure numeric blocks (spec §4.1 catalog supplement: `ConstSignal`, `Add`,
//! `Mul`, `Clamp`).

use crate::blocks::util::as_sig;
use crate::catalog::{BlockDef, Capability, DefaultSource, LowerCtx, LowerInputs, PortDef, ResolvedValue};
use crate::ir::{Kernel, SigOp};
use crate::types::{Category, DomainTag, TypeDesc, World};
use weave_abi::render::pack_rgba8;

fn signal_float_port(port_id: &'static str, label: &'static str, default: Option<DefaultSource>) -> PortDef {
    PortDef { port_id, label, ty: TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core), default }
}

/// `ConstSignal`: lifts the author-entered `value` param onto the signal
/// world as a const node.
#[must_use]
pub fn const_signal() -> BlockDef {
    BlockDef {
        type_key: "ConstSignal",
        inputs: vec![],
        outputs: vec![signal_float_port("out", "Out", None)],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            let value = inputs.param("value", 0.0);
            let c = ctx.builder.intern_number(value);
            let id = ctx.builder.push_sig(SigOp::Const(c), Some(&ctx.block_id));
            Ok(vec![ResolvedValue::Sig(id)])
        },
    }
}

/// `ConstColor`: packs the author-entered `r`/`g`/`b`/`a` params (each
/// `0.0..=1.0`) into a single Color-typed signal const, the way
/// `ConstSignal` lifts a plain `value` param onto the Float signal world.
/// Exists so a bus-connected `Layer` port has a real publisher to wire to
/// rather than only ever reaching Color types via a renderer's own input.
#[must_use]
pub fn const_color() -> BlockDef {
    BlockDef {
        type_key: "ConstColor",
        inputs: vec![],
        outputs: vec![PortDef {
            port_id: "out",
            label: "Out",
            ty: TypeDesc::scalar(World::Signal, DomainTag::Color, Category::Core),
            default: None,
        }],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            let r = to_u8(inputs.param("r", 1.0));
            let g = to_u8(inputs.param("g", 1.0));
            let b = to_u8(inputs.param("b", 1.0));
            let a = to_u8(inputs.param("a", 1.0));
            let lane = f64::from(pack_rgba8(r, g, b, a));
            let c = ctx.builder.intern_number(lane);
            let id = ctx.builder.push_sig(SigOp::Const(c), Some(&ctx.block_id));
            Ok(vec![ResolvedValue::Sig(id)])
        },
    }
}

fn binary_block(
    type_key: &'static str,
    identity: f64,
    kernel: Kernel,
) -> BlockDef {
    BlockDef {
        type_key,
        inputs: vec![
            signal_float_port("lhs", "Lhs", Some(DefaultSource::Const(identity))),
            signal_float_port("rhs", "Rhs", Some(DefaultSource::Const(identity))),
        ],
        outputs: vec![signal_float_port("out", "Out", None)],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: match kernel {
            Kernel::Add => add_lower,
            Kernel::Mul => mul_lower,
            _ => unreachable!("binary_block only used for Add/Mul"),
        },
    }
}

fn add_lower(ctx: &mut LowerCtx<'_>, inputs: &LowerInputs) -> Result<Vec<ResolvedValue>, String> {
    zip_lower(ctx, inputs, Kernel::Add)
}

fn mul_lower(ctx: &mut LowerCtx<'_>, inputs: &LowerInputs) -> Result<Vec<ResolvedValue>, String> {
    zip_lower(ctx, inputs, Kernel::Mul)
}

fn zip_lower(ctx: &mut LowerCtx<'_>, inputs: &LowerInputs, kernel: Kernel) -> Result<Vec<ResolvedValue>, String> {
    let a = as_sig(ctx, inputs.get(0))?;
    let b = as_sig(ctx, inputs.get(1))?;
    let id = ctx.builder.push_sig(SigOp::Zip { a, b, kernel }, Some(&ctx.block_id));
    Ok(vec![ResolvedValue::Sig(id)])
}

/// `Add`: `lhs + rhs`, unwired inputs default to `0.0` (the additive
/// identity).
#[must_use]
pub fn add() -> BlockDef {
    binary_block("Add", 0.0, Kernel::Add)
}

/// `Mul`: `lhs * rhs`, unwired inputs default to `1.0` (the multiplicative
/// identity).
#[must_use]
pub fn mul() -> BlockDef {
    binary_block("Mul", 1.0, Kernel::Mul)
}

/// `Clamp`: clamps `value` into `[lo, hi]`, params `lo`/`hi` default to
/// `0.0`/`1.0`.
#[must_use]
pub fn clamp() -> BlockDef {
    BlockDef {
        type_key: "Clamp",
        inputs: vec![signal_float_port("value", "Value", Some(DefaultSource::Required))],
        outputs: vec![signal_float_port("out", "Out", None)],
        capability: Capability::Pure,
        uses_state: false,
        relaxed: false,
        lower: |ctx, inputs| {
            let value = as_sig(ctx, inputs.get(0))?;
            let lo = inputs.param("lo", 0.0);
            let hi = inputs.param("hi", 1.0);
            let lo_id = {
                let c = ctx.builder.intern_number(lo);
                ctx.builder.push_sig(SigOp::Const(c), Some(&ctx.block_id))
            };
            let clamped_lo = ctx.builder.push_sig(
                SigOp::Zip { a: value, b: lo_id, kernel: Kernel::Max },
                Some(&ctx.block_id),
            );
            let hi_id = {
                let c = ctx.builder.intern_number(hi);
                ctx.builder.push_sig(SigOp::Const(c), Some(&ctx.block_id))
            };
            let id = ctx.builder.push_sig(
                SigOp::Zip { a: clamped_lo, b: hi_id, kernel: Kernel::Min },
                Some(&ctx.block_id),
            );
            Ok(vec![ResolvedValue::Sig(id)])
        },
    }
}

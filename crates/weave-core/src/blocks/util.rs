//! Shared `lower()` helpers used by the built-in block definitions: lifting
//! a [`ResolvedValue`] onto the IR world a particular op needs.

use crate::catalog::{LowerCtx, ResolvedValue};
use crate::ident::{DomainId, FieldExprId, SigExprId};
use crate::ir::SigOp;

/// Lifts `value` onto a `SigExprId`, interning a fresh `Const` node for a
/// bare literal.
pub fn as_sig(ctx: &mut LowerCtx<'_>, value: ResolvedValue) -> Result<SigExprId, String> {
    match value {
        ResolvedValue::Sig(id) => Ok(id),
        ResolvedValue::Const(n) => {
            let c = ctx.builder.intern_number(n);
            Ok(ctx.builder.push_sig(SigOp::Const(c), Some(&ctx.block_id)))
        }
        ResolvedValue::Unbound => Err("missing required signal input".into()),
        ResolvedValue::Field(..) => Err("expected a signal, got a field".into()),
        ResolvedValue::Domain(_) => Err("expected a signal, got a domain".into()),
        ResolvedValue::Render(_) => Err("expected a signal, got a render spec".into()),
    }
}

/// Extracts a `FieldExprId` and its domain; literals cannot be lifted to a
/// field without a known domain, so this never synthesizes a const field.
pub fn as_field(value: ResolvedValue) -> Result<(FieldExprId, DomainId), String> {
    value.as_field().ok_or_else(|| "expected a field input".to_string())
}

/// Extracts a `DomainId`.
pub fn as_domain(value: ResolvedValue) -> Result<DomainId, String> {
    value.as_domain().ok_or_else(|| "expected a domain input".to_string())
}

//! Built-in adapter chains used by pass2 when two `TypeDesc`s are not
//! directly compatible (spec §3 "an explicit adapter chain converts them",
//! §4.2 pass2 "records adapter chains where declared").
//!
//! The distilled spec names adapters without enumerating them; this is the
//! supplement called for in `SPEC_FULL.md`'s type-system section.

use crate::ir::CombineMode;
use crate::types::{Category, DomainTag, TypeDesc, World};

/// One elementary conversion step in an adapter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStep {
    /// `int` -> `float` widening.
    IntToFloat,
    /// `float` -> `int` via truncation toward zero.
    FloatToInt,
    /// Lifts a `World::Scalar` constant onto the signal world (pass0/pass2
    /// boundary: a `DSConst*` provider's output becomes a real `const` IR
    /// node the first time it drives a `Signal` input).
    ScalarToSignal,
    /// `vec3` -> `vec4` by appending `alpha = 1.0`.
    Vec3ToVec4,
}

/// Looks up a built-in adapter chain from `from` to `to`, if one exists.
///
/// Returns `None` when no built-in conversion applies; pass2 then reports
/// `PortTypeMismatch`/`WorldMismatch`/`DomainMismatch` as appropriate.
#[must_use]
pub fn find_adapter(from: &TypeDesc, to: &TypeDesc) -> Option<Vec<AdapterStep>> {
    if from.world == World::Scalar && to.world == World::Signal && from.domain == to.domain {
        return Some(vec![AdapterStep::ScalarToSignal]);
    }
    if from.world != to.world {
        return None;
    }
    match (from.domain, to.domain) {
        (DomainTag::Int, DomainTag::Float) => Some(vec![AdapterStep::IntToFloat]),
        (DomainTag::Float, DomainTag::Int) => Some(vec![AdapterStep::FloatToInt]),
        (DomainTag::Vec3, DomainTag::Vec4) => Some(vec![AdapterStep::Vec3ToVec4]),
        _ => None,
    }
}

/// Widens a bus's declared `TypeDesc` to accommodate a listener that
/// requires a broader numeric domain (spec §4.2 pass2, "widens numeric
/// buses if listeners require a broader domain").
///
/// Only `Int -> Float` widening is supported; any other mismatch is left
/// for the caller to report as `BusTypeError`.
#[must_use]
pub fn widen_for_listener(bus_ty: &TypeDesc, listener_ty: &TypeDesc) -> Option<TypeDesc> {
    if bus_ty.world != listener_ty.world {
        return None;
    }
    if bus_ty.domain == listener_ty.domain {
        return Some(bus_ty.clone());
    }
    if bus_ty.domain == DomainTag::Int && listener_ty.domain == DomainTag::Float {
        return Some(TypeDesc {
            domain: DomainTag::Float,
            ..bus_ty.clone()
        });
    }
    None
}

/// Returns `true` if `mode`-style combine semantics are valid for `ty`
/// (spec §4.2 pass7, "Combine mode must be compatible with both world and
/// domain"). `average`/`sum`/`product`/`min`/`max` require numeric worlds;
/// `layer` requires color; `last` applies to anything; `pulse`/`merge`
/// require the event world.
#[must_use]
pub fn numeric_domain(domain: DomainTag) -> bool {
    matches!(
        domain,
        DomainTag::Float
            | DomainTag::Int
            | DomainTag::Vec2
            | DomainTag::Vec3
            | DomainTag::Vec4
            | DomainTag::TimeMs
            | DomainTag::Phase01
    )
}

/// Returns `true` if `mode` is a valid combine semantics for a bus of type
/// `ty` (spec §4.2 pass7 / pass5 `UnsupportedCombineMode`). `sum`/`product`/
/// `average`/`min`/`max` require a numeric domain; `layer` requires color;
/// `last` applies to anything bus-eligible; `pulse`/`merge` require the
/// event world (trigger domain).
#[must_use]
pub fn combine_mode_compatible(mode: CombineMode, ty: &TypeDesc) -> bool {
    match mode {
        CombineMode::Sum | CombineMode::Product | CombineMode::Average | CombineMode::Min | CombineMode::Max => {
            numeric_domain(ty.domain)
        }
        CombineMode::Layer => ty.domain == DomainTag::Color,
        CombineMode::Last => true,
        CombineMode::Pulse | CombineMode::Merge => ty.world == World::Event || ty.domain == DomainTag::Trigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_to_signal_adapter_exists_for_matching_domain() {
        let from = TypeDesc::scalar(World::Scalar, DomainTag::Float, Category::Core);
        let to = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        assert_eq!(find_adapter(&from, &to), Some(vec![AdapterStep::ScalarToSignal]));
    }

    #[test]
    fn int_to_float_widens_bus_for_listener() {
        let bus_ty = TypeDesc::scalar(World::Signal, DomainTag::Int, Category::Core);
        let listener_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let widened = widen_for_listener(&bus_ty, &listener_ty).expect("widen");
        assert_eq!(widened.domain, DomainTag::Float);
    }

    #[test]
    fn mismatched_world_has_no_adapter() {
        let from = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let to = TypeDesc::scalar(World::Field, DomainTag::Float, Category::Core);
        assert_eq!(find_adapter(&from, &to), None);
    }

    #[test]
    fn layer_requires_color() {
        let float_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let color_ty = TypeDesc::scalar(World::Signal, DomainTag::Color, Category::Core);
        assert!(!combine_mode_compatible(CombineMode::Layer, &float_ty));
        assert!(combine_mode_compatible(CombineMode::Layer, &color_ty));
    }

    #[test]
    fn pulse_requires_event_world_or_trigger_domain() {
        let trigger_ty = TypeDesc::scalar(World::Signal, DomainTag::Trigger, Category::Core);
        let float_ty = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        assert!(combine_mode_compatible(CombineMode::Pulse, &trigger_ty));
        assert!(!combine_mode_compatible(CombineMode::Pulse, &float_ty));
    }
}

//! Time-root block definitions (spec §3 "TimeRoot", §4.2 pass3).
//!
//! A time root's outputs are never produced by calling `lower()` — pass3
//! allocates the program's one set of canonical `tAbsMs`/`tModelMs`/
//! `phase01`/`wrapEvent` signal nodes directly and every time-root output
//! port resolves to those shared ids (see `crate::passes::pass3`). The
//! `lower` field below is therefore unreachable in a correctly compiled
//! program; it exists only so `BlockDef` stays a single uniform shape.

use crate::catalog::{BlockDef, Capability, PortDef};
use crate::types::{Category, DomainTag, TypeDesc, World};

fn unreachable_lower(
    _ctx: &mut crate::catalog::LowerCtx<'_>,
    _inputs: &crate::catalog::LowerInputs,
) -> Result<crate::catalog::LowerOutputs, String> {
    Err("time root outputs are resolved by pass3, never lowered directly".into())
}

fn time_outputs() -> Vec<PortDef> {
    vec![
        PortDef {
            port_id: "tAbsMs",
            label: "Absolute time (ms)",
            ty: TypeDesc::scalar(World::Signal, DomainTag::TimeMs, Category::Core),
            default: None,
        },
        PortDef {
            port_id: "tModelMs",
            label: "Model time (ms)",
            ty: TypeDesc::scalar(World::Signal, DomainTag::TimeMs, Category::Core),
            default: None,
        },
        PortDef {
            port_id: "phase01",
            label: "Phase",
            ty: TypeDesc::scalar(World::Signal, DomainTag::Phase01, Category::Core),
            default: None,
        },
        PortDef {
            port_id: "wrapEvent",
            label: "Wrap event",
            ty: TypeDesc::scalar(World::Signal, DomainTag::Trigger, Category::Core),
            default: None,
        },
    ]
}

/// `CycleTimeRoot`: always cyclic, period given by the `periodMs` param.
#[must_use]
pub fn cycle_time_root() -> BlockDef {
    BlockDef {
        type_key: "CycleTimeRoot",
        inputs: vec![],
        outputs: time_outputs(),
        capability: Capability::Time,
        uses_state: false,
        relaxed: false,
        lower: unreachable_lower,
    }
}

/// `FiniteTimeRoot`: plays once to `durationMs`, then clamps.
#[must_use]
pub fn finite_time_root() -> BlockDef {
    BlockDef {
        type_key: "FiniteTimeRoot",
        inputs: vec![],
        outputs: time_outputs(),
        capability: Capability::Time,
        uses_state: false,
        relaxed: false,
        lower: unreachable_lower,
    }
}

/// `InfiniteTimeRoot`: unbounded, or cyclic if `periodMs` is declared (spec
/// §9 Open Questions; resolved by [`crate::time_model::TimeModel::infinite_or_cyclic`]).
#[must_use]
pub fn infinite_time_root() -> BlockDef {
    BlockDef {
        type_key: "InfiniteTimeRoot",
        inputs: vec![],
        outputs: time_outputs(),
        capability: Capability::Time,
        uses_state: false,
        relaxed: false,
        lower: unreachable_lower,
    }
}

//! Built-in block catalog (spec §4.1).
//!
//! Each submodule groups blocks by capability/family the way
//! `warp_core::rules` groups its built-in rewrite rules into one file per
//! concern; [`builtin_catalog`] wires every one of them into a single
//! [`crate::catalog::BlockCatalog`].

pub mod domain_blocks;
pub mod field_ops;
pub mod math;
pub mod render_blocks;
pub mod stateful;
pub mod time_roots;
pub mod util;

use crate::catalog::BlockCatalog;
use crate::error::CoreError;

/// Registers every built-in block type into a fresh catalog.
///
/// Composite type keys (`GridPoints`, `DotsRenderer`) are *not* registered
/// here — they never reach pass6's `lower()` dispatch directly; pass4
/// expands them into their internal primitives first (see
/// `crate::composite::builtin_composites`).
pub fn builtin_catalog() -> Result<BlockCatalog, CoreError> {
    let mut cat = BlockCatalog::new();
    cat.register(domain_blocks::domain_n())?;
    cat.register(domain_blocks::grid_domain())?;
    cat.register(math::const_signal())?;
    cat.register(math::const_color())?;
    cat.register(math::add())?;
    cat.register(math::mul())?;
    cat.register(math::clamp())?;
    cat.register(stateful::envelope_ad())?;
    cat.register(stateful::pulse_divider())?;
    cat.register(time_roots::cycle_time_root())?;
    cat.register(time_roots::finite_time_root())?;
    cat.register(time_roots::infinite_time_root())?;
    cat.register(render_blocks::dots_renderer_primitive())?;
    cat.register(field_ops::broadcast())?;
    cat.register(field_ops::sample_signal())?;
    Ok(cat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_registers_without_conflicts() {
        let cat = builtin_catalog().expect("builtin catalog registers cleanly");
        assert!(cat.get("Add").is_some());
        assert!(cat.get("DotsRendererPrimitive").is_some());
        assert!(cat.get("CycleTimeRoot").is_some());
    }
}

//! The block catalog (spec §4.1 "Block catalog").
//!
//! A `BlockDef` describes one block type's port contract, capability, and
//! `lower()` function; `BlockCatalog` is the registry pass1/pass6 consult to
//! resolve a patch's `block_type` strings into typed definitions. Registered
//! the way `warp-core::Engine::register_rule` registers a `RewriteRule`:
//! keyed by a stable name, duplicate registration is a hard error rather
//! than silently overwriting the previous definition.

use std::collections::BTreeMap;

use crate::builder::IRBuilder;
use crate::error::CoreError;
use crate::ident::{DomainId, FieldExprId, RenderSpecId, SigExprId, ValueSlot};
use crate::types::TypeDesc;
use weave_abi::patch::BlockId;

/// What capability class a block belongs to (spec §4.1 "capability").
///
/// Determines which Non-goal/invariant checks apply: only `Render` and
/// `Identity` blocks may produce `Special`-world artifacts; only `State`
/// blocks may declare state cells; `Time` blocks are restricted to pass1's
/// time-root scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// A pure function of its inputs; no state, no time, no I/O.
    Pure,
    /// Produces a `Special`-world artifact that is not a render output
    /// (e.g. `Domain`).
    Identity,
    /// A time root: only valid in pass1's time-root scan, never wired as a
    /// normal input.
    Time,
    /// Declares and mutates a persistent state cell.
    State,
    /// Produces a `RenderTree`/`RenderNode` artifact.
    Render,
    /// Reserved for future external-I/O blocks (spec Non-goals excludes
    /// implementing any today; the tag exists so pass1/pass6 have a place
    /// to route one without a catalog-wide redesign).
    Io,
}

/// One declared input or output port on a `BlockDef`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDef {
    /// Stable port identifier referenced by patch edges.
    pub port_id: &'static str,
    /// Editor-facing label.
    pub label: &'static str,
    /// The port's type.
    pub ty: TypeDesc,
    /// Optional default value supplied when nothing is wired (spec §4.1
    /// "unwired inputs fall back to a declared default, if any").
    pub default: Option<DefaultSource>,
}

/// A port's unwired-input fallback value.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultSource {
    /// A constant literal, interned into the const pool at lowering time.
    Const(f64),
    /// No fallback; an unwired required input is a `MissingInput` error.
    Required,
}

/// One resolved input value a block's `lower()` sees at pass6: the upstream
/// wire has already been walked and, if its producer was itself a block,
/// lowered into IR — `lower()` only ever consumes already-allocated ids.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedValue {
    /// A signal-world expression.
    Sig(SigExprId),
    /// A field-world expression evaluated over the given domain.
    Field(FieldExprId, DomainId),
    /// A domain handle (identity-capability output).
    Domain(DomainId),
    /// A render-capability block's recorded drawing description.
    Render(RenderSpecId),
    /// A bare author-entered literal that never needed lifting onto the IR
    /// (e.g. a composite's own param forwarded straight through).
    Const(f64),
    /// The input port has no driver (only valid for non-`Required` ports;
    /// pass5 rejects an `Unbound` reaching a `Required` port before pass6
    /// ever runs).
    Unbound,
}

impl ResolvedValue {
    /// Extracts the signal expression id, if this is [`Self::Sig`].
    #[must_use]
    pub const fn as_sig(&self) -> Option<SigExprId> {
        match self {
            Self::Sig(id) => Some(*id),
            _ => None,
        }
    }

    /// Extracts the field expression id and its domain, if this is
    /// [`Self::Field`].
    #[must_use]
    pub const fn as_field(&self) -> Option<(FieldExprId, DomainId)> {
        match self {
            Self::Field(id, domain) => Some((*id, *domain)),
            _ => None,
        }
    }

    /// Extracts the domain handle, if this is [`Self::Domain`].
    #[must_use]
    pub const fn as_domain(&self) -> Option<DomainId> {
        match self {
            Self::Domain(id) => Some(*id),
            _ => None,
        }
    }

    /// Extracts a bare numeric literal, if this is [`Self::Const`].
    #[must_use]
    pub const fn as_const(&self) -> Option<f64> {
        match self {
            Self::Const(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the render spec id, if this is [`Self::Render`].
    #[must_use]
    pub const fn as_render(&self) -> Option<RenderSpecId> {
        match self {
            Self::Render(id) => Some(*id),
            _ => None,
        }
    }
}

/// The inputs visible to a block's `lower()` function at pass6.
#[derive(Debug, Clone)]
pub struct LowerInputs {
    /// Resolved input values, positional (editor port order, or declared
    /// order if `relaxed`), one entry per declared input port.
    pub values: Vec<ResolvedValue>,
    /// Author-entered parameter values (`Block::params`), carried through
    /// from the patch unchanged.
    pub params: BTreeMap<String, f64>,
}

impl LowerInputs {
    /// Returns the resolved value at positional input index `i`, or
    /// [`ResolvedValue::Unbound`] if `i` is out of range (should not happen
    /// for a catalog-validated block, but keeps `lower()` implementations
    /// panic-free).
    #[must_use]
    pub fn get(&self, i: usize) -> ResolvedValue {
        self.values.get(i).copied().unwrap_or(ResolvedValue::Unbound)
    }

    /// Returns a declared param as `f64`, or `default` if absent.
    #[must_use]
    pub fn param(&self, name: &str, default: f64) -> f64 {
        self.params.get(name).copied().unwrap_or(default)
    }
}

/// What a block's `lower()` call produced: one [`ResolvedValue`] per
/// declared output port, positional.
pub type LowerOutputs = Vec<ResolvedValue>;

/// The context a `lower()` function allocates IR against: the shared
/// `IRBuilder` plus the instance's own id, for debug provenance.
pub struct LowerCtx<'a> {
    /// The shared program builder.
    pub builder: &'a mut IRBuilder,
    /// The block instance currently being lowered.
    pub block_id: BlockId,
}

/// A block type's `lower()` implementation: resolves inputs into new IR
/// nodes/slots and returns one value per declared output port.
///
/// A plain `fn` pointer, not a boxed closure, mirroring
/// `warp_core::rule::ExecuteFn` — every built-in block's lowering behavior
/// is a static, stateless function of its inputs and params.
pub type LowerFn = fn(&mut LowerCtx<'_>, &LowerInputs) -> Result<LowerOutputs, String>;

/// A block type's complete definition in the catalog.
pub struct BlockDef {
    /// Stable type key (matches `Block::block_type` in the wire DTO).
    pub type_key: &'static str,
    /// Declared input ports, in canonical order.
    pub inputs: Vec<PortDef>,
    /// Declared output ports, in canonical order.
    pub outputs: Vec<PortDef>,
    /// Capability class.
    pub capability: Capability,
    /// Whether this block declares and owns a persistent state cell.
    pub uses_state: bool,
    /// Opts out of the port-order contract check (spec §4.1, P4): when
    /// `true`, pass6 may reorder inputs relative to the editor's declared
    /// order without raising `InvalidConnection`. Used by variadic-input
    /// blocks such as bus combine shims.
    pub relaxed: bool,
    /// Lowering behavior invoked by pass6.
    pub lower: LowerFn,
}

impl std::fmt::Debug for BlockDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockDef")
            .field("type_key", &self.type_key)
            .field("capability", &self.capability)
            .field("uses_state", &self.uses_state)
            .field("relaxed", &self.relaxed)
            .finish_non_exhaustive()
    }
}

impl BlockDef {
    /// Validates the Non-goal-adjacent invariant that only `Render`/
    /// `Identity` capability blocks may declare a `Special`-world output
    /// (spec §4.1, pure-block validator).
    fn validate_capability_shape(&self) -> Result<(), CoreError> {
        let has_special_output = self
            .outputs
            .iter()
            .any(|p| matches!(p.ty.world, crate::types::World::Special));
        if has_special_output
            && !matches!(self.capability, Capability::Render | Capability::Identity)
        {
            return Err(CoreError::InvalidBlockDefinition {
                type_key: self.type_key,
                reason: "only render/identity capability blocks may produce special-world outputs",
            });
        }
        if self.uses_state && !matches!(self.capability, Capability::State) {
            return Err(CoreError::InvalidBlockDefinition {
                type_key: self.type_key,
                reason: "uses_state blocks must declare Capability::State",
            });
        }
        Ok(())
    }
}

/// Registry of every known block type, keyed by `type_key`.
///
/// Grounded on `warp_core::Engine::register_rule`'s duplicate-registration
/// semantics: re-registering an existing key is always rejected, even with
/// an identical definition, so catalog construction order is meaningful and
/// reproducible diagnostics can name the exact offending key.
#[derive(Default)]
pub struct BlockCatalog {
    defs: BTreeMap<&'static str, BlockDef>,
}

impl BlockCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `def`, rejecting a duplicate `type_key`.
    pub fn register(&mut self, def: BlockDef) -> Result<(), CoreError> {
        def.validate_capability_shape()?;
        if self.defs.contains_key(def.type_key) {
            return Err(CoreError::DuplicateBlockType { type_key: def.type_key });
        }
        self.defs.insert(def.type_key, def);
        Ok(())
    }

    /// Looks up a block definition by type key.
    #[must_use]
    pub fn get(&self, type_key: &str) -> Option<&BlockDef> {
        self.defs.get(type_key)
    }

    /// Number of registered block types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns `true` if no block types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates registered definitions in deterministic (`type_key`-sorted)
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, DomainTag, World};

    fn minimal_pure_def(type_key: &'static str) -> BlockDef {
        BlockDef {
            type_key,
            inputs: vec![],
            outputs: vec![PortDef {
                port_id: "out",
                label: "Out",
                ty: TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core),
                default: None,
            }],
            capability: Capability::Pure,
            uses_state: false,
            relaxed: false,
            lower: |_ctx, _inputs| Ok(vec![]),
        }
    }

    #[test]
    fn registering_a_new_block_type_succeeds() {
        let mut cat = BlockCatalog::new();
        cat.register(minimal_pure_def("add")).expect("register");
        assert_eq!(cat.len(), 1);
        assert!(cat.get("add").is_some());
    }

    #[test]
    fn registering_duplicate_type_key_is_rejected() {
        let mut cat = BlockCatalog::new();
        cat.register(minimal_pure_def("add")).expect("first register");
        let err = cat.register(minimal_pure_def("add")).unwrap_err();
        match err {
            CoreError::DuplicateBlockType { type_key } => assert_eq!(type_key, "add"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pure_capability_block_cannot_declare_special_world_output() {
        let mut def = minimal_pure_def("bad_render");
        def.outputs[0].ty = TypeDesc::scalar(World::Special, DomainTag::Color, Category::Internal);
        let mut cat = BlockCatalog::new();
        let err = cat.register(def).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBlockDefinition { .. }));
    }

    #[test]
    fn state_flag_requires_state_capability() {
        let mut def = minimal_pure_def("bad_state");
        def.uses_state = true;
        let mut cat = BlockCatalog::new();
        let err = cat.register(def).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBlockDefinition { .. }));
    }
}

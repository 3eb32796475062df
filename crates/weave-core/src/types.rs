//! The type system (spec §3 "TypeDesc", §4.1).

/// The "world" a value lives in: how it varies over a frame/domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum World {
    /// A single author-entered literal, not yet lifted onto the signal graph.
    /// Produced only by pass0's `DSConst*` providers before pass2 lifts it.
    Scalar,
    /// Varies once per frame (a function of time).
    Signal,
    /// Varies once per domain element, per frame.
    Field,
    /// An edge-triggered, momentary occurrence.
    Event,
    /// An author-time-only configuration value (never touches the IR).
    Config,
    /// An engine-internal artifact (`RenderTree`, `Domain`, ...) that is
    /// valid only at specific capability boundaries.
    Special,
}

/// Primitive type tag (spec §3 "domain").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainTag {
    /// IEEE-754 single precision float.
    Float,
    /// Signed 32-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// Packed RGBA8 color.
    Color,
    /// 2-component vector.
    Vec2,
    /// 3-component vector.
    Vec3,
    /// 4-component vector.
    Vec4,
    /// Quaternion.
    Quat,
    /// 4x4 matrix.
    Mat4,
    /// Edge-triggered trigger pulse.
    Trigger,
    /// Milliseconds since an unspecified epoch (time signals).
    TimeMs,
    /// Normalized phase in `[0, 1)`.
    Phase01,
    /// A domain handle (element-count reference).
    Domain,
    /// A 2D path (point list).
    Path,
    /// A UTF-8 string (author-time only; never reaches a `Field`/`Signal`).
    String,
    /// A render tree artifact (`World::Special` outputs only).
    RenderTree,
}

/// Whether a type may appear on a bus-eligible edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// May be published to / listened from a bus.
    Core,
    /// Engine-internal; never crosses a bus boundary.
    Internal,
}

/// Declared semantic range/role hint for a value (e.g. `phase(0..1)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Semantics {
    /// A cyclic phase in `[0, 1)`.
    Phase01,
    /// An unconstrained, linear quantity.
    Linear,
    /// A quantity in decibels.
    Decibels,
}

/// Immutable type descriptor (spec §3 "TypeDesc").
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDesc {
    /// Which world the value lives in.
    pub world: World,
    /// Primitive type tag.
    pub domain: DomainTag,
    /// Scalar-slot arity per lane dimension; `[]`/`[1]` for scalars, `[3]`
    /// for vec3, `[16]` for mat4.
    pub lanes: Vec<u32>,
    /// Bus-eligibility category.
    pub category: Category,
    /// Whether publishers/listeners may reference this type on a bus.
    pub bus_eligible: bool,
    /// Optional semantic hint (e.g. phase range).
    pub semantics: Option<Semantics>,
    /// Optional physical unit label (e.g. `"ms"`, `"deg"`).
    pub unit: Option<&'static str>,
}

impl TypeDesc {
    /// Builds a scalar-arity `TypeDesc` (lanes defaults to `[1]`).
    #[must_use]
    pub fn scalar(world: World, domain: DomainTag, category: Category) -> Self {
        let bus_eligible = matches!(category, Category::Core);
        Self {
            world,
            domain,
            lanes: vec![1],
            category,
            bus_eligible,
            semantics: None,
            unit: None,
        }
    }

    /// Builds a bundle `TypeDesc` with explicit `lanes`.
    #[must_use]
    pub fn bundle(world: World, domain: DomainTag, lanes: Vec<u32>, category: Category) -> Self {
        debug_assert!(!lanes.is_empty(), "bundle TypeDesc must declare at least one lane dim");
        let bus_eligible = matches!(category, Category::Core);
        Self { world, domain, lanes, category, bus_eligible, semantics: None, unit: None }
    }

    /// Total consecutive-slot arity implied by `lanes` (product of all dims).
    ///
    /// Invariant (spec §3): `lanes` product equals scalar-slot arity.
    #[must_use]
    pub fn arity(&self) -> u32 {
        self.lanes.iter().product::<u32>().max(1)
    }

    /// Two `TypeDesc`s are compatible iff `world` and `domain` match, or an
    /// explicit adapter chain converts one to the other (spec §3 invariants).
    ///
    /// This only reports *direct* compatibility; see
    /// [`crate::adapters::find_adapter`] for the adapter-chain lookup used
    /// by pass2 when this returns `false`.
    #[must_use]
    pub fn compatible_with(&self, other: &Self) -> bool {
        self.world == other.world && self.domain == other.domain
    }

    /// Returns `true` if both `self` and `other` are bus-eligible and share
    /// an exactly-matching `TypeDesc` after reconciliation (spec §3, "bus
    /// publishers and listeners must share a bus-eligible TypeDesc").
    #[must_use]
    pub fn bus_compatible_with(&self, other: &Self) -> bool {
        self.bus_eligible && other.bus_eligible && self.compatible_with(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_arity_is_three() {
        let t = TypeDesc::bundle(World::Signal, DomainTag::Vec3, vec![3], Category::Core);
        assert_eq!(t.arity(), 3);
    }

    #[test]
    fn mat4_arity_is_sixteen() {
        let t = TypeDesc::bundle(World::Signal, DomainTag::Mat4, vec![16], Category::Internal);
        assert_eq!(t.arity(), 16);
    }

    #[test]
    fn scalar_arity_is_one() {
        let t = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        assert_eq!(t.arity(), 1);
    }

    #[test]
    fn compatible_requires_matching_world_and_domain() {
        let a = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        let b = TypeDesc::scalar(World::Field, DomainTag::Float, Category::Core);
        assert!(!a.compatible_with(&b));
        let c = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Core);
        assert!(a.compatible_with(&c));
    }

    #[test]
    fn internal_category_is_never_bus_eligible_by_default() {
        let t = TypeDesc::scalar(World::Signal, DomainTag::Float, Category::Internal);
        assert!(!t.bus_eligible);
    }
}

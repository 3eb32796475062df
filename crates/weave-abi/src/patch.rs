//! The inbound `Patch` format (spec §6, "Inbound from editor").

use std::collections::BTreeMap;

use crate::value::Value;

/// Author-level stable identifier for a block instance.
///
/// Assigned by the editor and expected to remain stable across edits to
/// unrelated parts of the graph; the compiler relies on this for
/// deterministic-recompile stability (spec §3 "Lifecycle", property D2).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct BlockId(pub String);

/// Author-level stable identifier for a port on a block type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct PortId(pub String);

/// Author-level stable identifier for a wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct WireId(pub String);

/// Author-level stable identifier for a bus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct BusId(pub String);

/// A single block instance in the author graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// Stable author identifier.
    pub id: BlockId,
    /// Key into the block catalog.
    pub block_type: String,
    /// Author-supplied parameters, keyed by param name.
    pub params: BTreeMap<String, Value>,
    /// Editor-only placement hint; never consulted by the compiler.
    pub position: Option<(f64, f64)>,
}

/// Why a wire exists (spec §3, "Wire (Edge)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EdgeRole {
    /// Authored by a human in the editor.
    User,
    /// Synthesized by pass0 to materialize an unwired port default.
    Default,
    /// Synthesized by pass4 composite expansion or pass7 bus lowering.
    Structural,
}

/// An endpoint `(blockId, portId)` on either side of a wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Endpoint {
    /// The block the port belongs to.
    pub block_id: BlockId,
    /// The port identifier on that block.
    pub port_id: PortId,
}

/// A directed connection between two block ports.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    /// Stable author identifier.
    pub id: WireId,
    /// Source endpoint (an output port).
    pub from: Endpoint,
    /// Destination endpoint (an input port).
    pub to: Endpoint,
    /// Whether this wire currently participates in compilation.
    pub enabled: bool,
    /// Provenance of this edge.
    pub role: EdgeRole,
}

/// A named pub/sub bus connection: either a publisher term or a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BusDirection {
    /// The connected port publishes into the bus.
    Publish,
    /// The connected port listens to the bus's combined result.
    Listen,
}

/// A connection between a block port and a named bus.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BusConnection {
    /// Bus being connected to.
    pub bus: BusId,
    /// Block/port endpoint.
    pub endpoint: Endpoint,
    /// Publish or listen.
    pub direction: BusDirection,
    /// Optional lens/adapter chain applied at this connection only
    /// (spec §3, "optional listener lens/adapter chains").
    pub lens: Vec<LensStep>,
}

/// One step of a listener lens/adapter chain (e.g. `scale`, `offset`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LensStep {
    /// Name of the lens operation (`scale`, `offset`, `clamp`, ...).
    pub op: String,
    /// Operation parameters.
    pub params: BTreeMap<String, Value>,
}

/// Combine semantics for a named bus (spec §3, "Bus").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CombineMode {
    /// Sum of all publisher terms; identity 0.
    Sum,
    /// Product of all publisher terms; identity 1.
    Product,
    /// Arithmetic mean of all publisher terms.
    Average,
    /// Element-wise minimum.
    Min,
    /// Element-wise maximum.
    Max,
    /// The right-most term by sorted publisher order.
    Last,
    /// Porter-Duff compositing in sorted publisher order (color only).
    Layer,
    /// Event-world union, firing when any publisher fires.
    Pulse,
    /// Event-world union (alias of `Pulse` used by event-typed buses).
    Merge,
}

/// A named pub/sub channel declared in the author graph.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bus {
    /// Stable identifier.
    pub id: BusId,
    /// Combine semantics.
    pub mode: CombineMode,
    /// Value used when the bus has zero publishers (spec P6).
    pub default_value: Value,
}

/// Global settings accompanying a patch (spec §6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    /// Seed for any seeded randomness a block may use.
    pub seed: i64,
    /// Full-probe mode: when set, pass8 injects a `DebugProbe` step after
    /// every scheduled write (not just the always-on time-derive probe),
    /// so every slot a frame touches reaches the `TelemetrySink`.
    pub emit_ir: bool,
}

/// The complete author-level graph handed to the compiler.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Patch {
    /// Stable patch identifier (used in `CompileStarted`/`CompileFinished`).
    pub patch_id: String,
    /// Monotonically increasing revision, bumped by the editor on every edit.
    pub revision: u64,
    /// Block instances, in author (insertion) order.
    pub blocks: Vec<Block>,
    /// Wires, in author (insertion) order.
    pub edges: Vec<Edge>,
    /// Declared buses.
    pub buses: Vec<Bus>,
    /// Bus connections (publishers and listeners).
    pub bus_connections: Vec<BusConnection>,
    /// Default-source store: `"blockId:portId"` -> literal value, used by
    /// pass0 when a port has no wire and no catalog-declared default.
    pub default_source_store: BTreeMap<String, Value>,
    /// Compiler settings.
    pub settings: Settings,
}

impl Patch {
    /// Returns `true` if the patch contains no blocks (spec S3, `EmptyPatch`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

// SPDX-License-Identifier: Apache-2.0
//! Wire-level DTOs shared across the Weave patch compiler boundary.
//!
//! This crate is intentionally inert: it carries the inbound `Patch`
//! format, outbound `Diagnostic`/compile-event types, and the
//! `RenderTree` output format (spec §6 of the design), encoded
//! deterministically via CBOR. `weave-core` owns all behaviour.
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod diagnostics;
pub mod patch;
pub mod render;
pub mod value;

pub use codec::{decode, encode, CodecError};
pub use diagnostics::{
    BusUsageSummary, CompileFinished, CompileStarted, CompileStatus, CompileTrigger, Diagnostic,
    DiagnosticDomain, DiagnosticPayload, PrimaryTarget, ProgramMeta, Severity, TimeModelKind,
    TimeRootKind,
};
pub use patch::{
    Block, BlockId, Bus, BusConnection, BusDirection, BusId, CombineMode, Edge, EdgeRole,
    Endpoint, LensStep, Patch, PortId, Settings, WireId,
};
pub use render::{
    pack_rgba8, unpack_rgba8, Affine2, BlendMode, Glyph, Instances2d, PackedColor, Path2d,
    PathStyle, RenderNode, RenderTree, Viewport,
};
pub use value::Value;

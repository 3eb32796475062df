//! Weave core: the patch compiler and deterministic frame executor.
//!
//! The crate is organized the way `warp_core` lays out its own pipeline:
//! a typed IR (`ir`, `ident`, `types`, `catalog`) built by a single mutable
//! `builder`, a fixed sequence of compiler passes (`passes`) that lower an
//! author-facing `weave_abi::Patch` onto that IR, and a frame-by-frame
//! `executor` that walks the compiled `schedule::Schedule` against a
//! `value_store::ValueStore`.

#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![warn(clippy::all)]

pub mod adapters;
pub mod blocks;
pub mod builder;
pub mod bus;
pub mod catalog;
pub mod composite;
pub mod const_pool;
pub mod domain;
pub mod error;
pub mod eval;
pub mod executor;
pub mod graph;
pub mod ident;
pub mod ir;
pub mod passes;
pub mod render_spec;
pub mod schedule;
pub mod snapshot;
pub mod state_buffer;
pub mod telemetry;
pub mod time_model;
pub mod types;
pub mod value_store;

pub use error::{CompileError, CoreError, RuntimeError};
pub use executor::Executor;
pub use passes::{compile, CompiledProgram};

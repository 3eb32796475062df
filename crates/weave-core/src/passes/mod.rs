//! The compile pipeline, one module per pass (spec §4.2).
//!
//! pass1 (normalize) and pass4 (composite expansion) have no dedicated
//! module: pass1 is [`crate::graph::TypedPatch::normalize`] and pass4 is
//! [`crate::composite::expand_composites`], both reused directly by
//! [`compiler::compile`].

pub mod compiler;
pub mod lowering;
pub mod pass0;
pub mod pass2;
pub mod pass3;
pub mod pass5;
pub mod pass8;

pub use compiler::{compile, CompileOutcome, CompiledProgram};

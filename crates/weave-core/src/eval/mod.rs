//! Signal and field evaluation (spec §4.6, §4.7).

pub mod field;
pub mod kernels;
pub mod signal;

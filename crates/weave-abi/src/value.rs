//! A small, deterministic-enough value type for author-supplied defaults.
//!
//! The patch format needs to carry arbitrary author-entered numbers,
//! colors, strings, and small arrays (e.g. a default color, a default
//! grid spacing). `serde_json::Value` would pull in a dependency the
//! rest of this workspace treats as banned for anything that crosses
//! the deterministic compiler boundary (see `weave-core`'s `ConstPool`,
//! which hashes these values). `Value` covers the same cases with a
//! closed, `Ord`-free but `PartialEq`-able enum instead.

use std::collections::BTreeMap;

/// An author-supplied literal value (port default, bus default, block param).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// A boolean literal.
    Bool(bool),
    /// A numeric literal. Stored as `f64`; integer-typed ports truncate
    /// on consumption rather than at the DTO boundary.
    Number(f64),
    /// A UTF-8 string literal (paths, names, units).
    String(String),
    /// A fixed-size numeric tuple (vec2/vec3/vec4/quat/mat4/color components).
    Array(Vec<f64>),
    /// A nested object, used only by composite params that fan out to
    /// multiple internal block params.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the value as `f64` if it is a `Number`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as a numeric array if it is an `Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

//! Deterministic CBOR (de)serialization for the DTOs in this crate.
//!
//! Mirrors `echo-wasm-abi::codec`'s choice of `ciborium` over `serde_json`
//! for anything that crosses a determinism-sensitive boundary: map key
//! order and float encoding in CBOR are well-defined, whereas JSON object
//! key order is not guaranteed stable across serializer versions.

use serde::{Deserialize, Serialize};

/// Errors produced while encoding or decoding a DTO.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be serialized to CBOR.
    #[error("cbor encode failed: {0}")]
    Encode(String),
    /// The bytes could not be deserialized from CBOR.
    #[error("cbor decode failed: {0}")]
    Decode(String),
}

/// Encodes `value` to CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out)
}

/// Decodes CBOR `bytes` into `T`.
pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Settings};

    #[test]
    fn round_trips_settings() {
        let s = Settings { seed: 42, emit_ir: true };
        let bytes = encode(&s).expect("encode");
        let back: Settings = decode(&bytes).expect("decode");
        assert_eq!(s, back);
    }
}

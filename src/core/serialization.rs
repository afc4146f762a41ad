//! # Payload Serialization
//!
//! Bincode helpers for shapes whose payload is a serde struct.
//!
//! Shapes are free to pick any payload encoding; these helpers are what the
//! bundled overlay shapes use. Decoding is strict: a payload must be consumed
//! completely, so garbage appended to a valid payload is rejected instead of
//! silently ignored.
//!
//! ## Usage
//! ```ignore
//! impl Shape for FindNodeRequest {
//!     const NAME: &'static str = "FindNodeRequest";
//!
//!     fn marshal(&self) -> Result<Vec<u8>> {
//!         to_payload(Self::NAME, self)
//!     }
//!
//!     fn unmarshal(payload: &[u8]) -> Result<Self> {
//!         from_payload(Self::NAME, payload)
//!     }
//! }
//! ```

use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ProtocolError, Result};

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .reject_trailing_bytes()
}

/// Serialize a payload struct, naming the shape in any error.
pub fn to_payload<T: Serialize>(shape: &'static str, value: &T) -> Result<Vec<u8>> {
    options()
        .serialize(value)
        .map_err(|e| ProtocolError::UnencodablePayload {
            shape,
            reason: e.to_string(),
        })
}

/// Deserialize a payload struct, naming the shape in any error.
pub fn from_payload<T: DeserializeOwned>(shape: &'static str, payload: &[u8]) -> Result<T> {
    options()
        .deserialize(payload)
        .map_err(|e| ProtocolError::MalformedPayload {
            shape,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use serde::ser::{SerializeSeq, Serializer};
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
    struct Sample {
        id: u64,
        tag: String,
    }

    /// Sequence without a known length, which bincode refuses to write.
    struct Unsized(Vec<u8>);

    impl Serialize for Unsized {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(None)?;
            for byte in &self.0 {
                seq.serialize_element(byte)?;
            }
            seq.end()
        }
    }

    #[test]
    fn test_payload_roundtrip() {
        let value = Sample {
            id: 42,
            tag: "node".into(),
        };
        let bytes = to_payload("Sample", &value).unwrap();
        let back: Sample = from_payload("Sample", &bytes).expect("decode");
        assert_eq!(back, value);
    }

    #[test]
    fn test_fixed_int_big_endian() {
        let bytes = to_payload("Sample", &Sample { id: 1, tag: String::new() }).unwrap();
        // u64 id, then u64 string length
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = to_payload("Sample", &Sample::default()).unwrap();
        bytes.push(0xFF);
        let err = from_payload::<Sample>("Sample", &bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { shape: "Sample", .. }));
    }

    #[test]
    fn test_short_payload_rejected() {
        let err = from_payload::<Sample>("Sample", &[0, 1]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload { .. }));
    }

    #[test]
    fn test_serialize_failure_is_reported() {
        let err = to_payload("Unsized", &Unsized(vec![1, 2, 3])).unwrap_err();
        assert!(matches!(err, ProtocolError::UnencodablePayload { shape: "Unsized", .. }));
        assert!(!err.should_disconnect());
    }
}

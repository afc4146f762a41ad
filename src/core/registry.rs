//! # Shape Registry
//!
//! Bidirectional table between shape names and opcodes, and between opcodes
//! and the decoder that rebuilds a message from its payload.
//!
//! Both views live behind one `RwLock` and are always read or written as a
//! pair. Registration takes the write guard only to insert, after the
//! decoder has been checked, and only happens while a node is being
//! assembled; after that the table is effectively read-only and every
//! connection handler shares the read guard.
//!
//! Entries are never replaced or removed. A rejected registration leaves the
//! table exactly as it was.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::core::opcode::{opcode_for, DEFAULT_REGISTRY_CAPACITY};
use crate::core::shape::Wire;
use crate::error::{constants, ProtocolError, RegistrationError, Result};

/// Reconstruction function registered for one shape.
pub type DecodeFn<M> = dyn Fn(&[u8]) -> Result<M> + Send + Sync + 'static;

struct Entry<M> {
    shape: &'static str,
    decoder: Box<DecodeFn<M>>,
}

struct Tables<M> {
    opcodes: HashMap<&'static str, u32>,
    decoders: HashMap<u32, Entry<M>>,
}

/// Registry of message shapes for one node.
pub struct Registry<M> {
    tables: RwLock<Tables<M>>,
}

impl<M: Wire> Default for Registry<M> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}

impl<M: Wire> Registry<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with room for `capacity` shapes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tables: RwLock::new(Tables {
                opcodes: HashMap::with_capacity(capacity),
                decoders: HashMap::with_capacity(capacity),
            }),
        }
    }

    /// Register the shape of `sample` together with its decoder.
    ///
    /// `sample` only contributes its shape name and its own serialization:
    /// the decoder is run on `sample.marshal()` and must hand back a value
    /// of the same shape, which is how a decoder wired to the wrong shape is
    /// caught before any traffic flows.
    ///
    /// That check runs without holding any lock, so a decoder that panics on
    /// its sample cannot poison the registry.
    ///
    /// Returns the assigned opcode. Any error is a configuration mistake and
    /// leaves the registry untouched.
    pub fn register<F>(
        &self,
        sample: &M,
        decoder: F,
    ) -> std::result::Result<u32, RegistrationError>
    where
        F: Fn(&[u8]) -> Result<M> + Send + Sync + 'static,
    {
        let shape = sample.shape_name();
        let opcode = opcode_for(shape);

        {
            let tables = self
                .tables
                .read()
                .map_err(|_| RegistrationError::LockPoisoned(constants::ERR_REGISTRY_READ_LOCK))?;
            Self::check_duplicate(&tables, shape)?;
        }

        Self::check_decoder(shape, sample, &decoder)?;

        let mut tables = self
            .tables
            .write()
            .map_err(|_| RegistrationError::LockPoisoned(constants::ERR_REGISTRY_WRITE_LOCK))?;

        // another registration may have won the race while the decoder was checked
        Self::check_duplicate(&tables, shape)?;

        if let Some(entry) = tables.decoders.get(&opcode) {
            warn!(shape, existing = entry.shape, opcode, "Opcode collision");
            return Err(RegistrationError::OpcodeCollision {
                shape: shape.to_string(),
                existing: entry.shape.to_string(),
                opcode,
            });
        }

        tables.opcodes.insert(shape, opcode);
        tables.decoders.insert(
            opcode,
            Entry {
                shape,
                decoder: Box::new(decoder),
            },
        );

        debug!(shape, opcode, "Registered message shape");
        Ok(opcode)
    }

    fn check_duplicate(
        tables: &Tables<M>,
        shape: &'static str,
    ) -> std::result::Result<(), RegistrationError> {
        match tables.opcodes.get(shape) {
            Some(&existing) => {
                warn!(shape, opcode = existing, "Duplicate shape registration");
                Err(RegistrationError::DuplicateShape {
                    shape: shape.to_string(),
                    opcode: existing,
                })
            }
            None => Ok(()),
        }
    }

    fn check_decoder<F>(
        shape: &'static str,
        sample: &M,
        decoder: &F,
    ) -> std::result::Result<(), RegistrationError>
    where
        F: Fn(&[u8]) -> Result<M>,
    {
        let payload = sample.marshal().map_err(|e| {
            warn!(shape, error = %e, "Sample could not be serialized");
            RegistrationError::UnencodableSample {
                shape: shape.to_string(),
                reason: e.to_string(),
            }
        })?;

        match decoder(&payload) {
            Ok(decoded) if decoded.shape_name() == shape => Ok(()),
            Ok(decoded) => {
                warn!(shape, produced = decoded.shape_name(), "Decoder produced wrong shape");
                Err(RegistrationError::DecoderMismatch {
                    shape: shape.to_string(),
                    produced: decoded.shape_name().to_string(),
                })
            }
            Err(e) => {
                warn!(shape, error = %e, "Decoder rejected its own sample");
                Err(RegistrationError::DecoderRejectedSample {
                    shape: shape.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Opcode assigned to `shape`, if it was registered.
    pub fn opcode_of(&self, shape: &str) -> Result<Option<u32>> {
        let tables = self.read()?;
        Ok(tables.opcodes.get(shape).copied())
    }

    /// Shape name owning `opcode`, if any.
    pub fn shape_of(&self, opcode: u32) -> Result<Option<&'static str>> {
        let tables = self.read()?;
        Ok(tables.decoders.get(&opcode).map(|entry| entry.shape))
    }

    /// Run the decoder registered for `opcode` on `payload`.
    ///
    /// The decoder's own error is passed through untouched.
    pub fn decode_with(&self, opcode: u32, payload: &[u8]) -> Result<M> {
        let tables = self.read()?;
        let entry = tables
            .decoders
            .get(&opcode)
            .ok_or(ProtocolError::UnregisteredOpcode(opcode))?;
        (entry.decoder)(payload)
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.read().map(|t| t.opcodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of `(shape, opcode)` pairs sorted by shape name.
    pub fn shapes(&self) -> Result<Vec<(&'static str, u32)>> {
        let tables = self.read()?;
        let mut shapes: Vec<_> = tables.opcodes.iter().map(|(s, o)| (*s, *o)).collect();
        shapes.sort_unstable_by_key(|(shape, _)| *shape);
        Ok(shapes)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables<M>>> {
        self.tables
            .read()
            .map_err(|_| ProtocolError::LockPoisoned(constants::ERR_REGISTRY_READ_LOCK))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Msg {
        Alpha(Vec<u8>),
        Beta(Vec<u8>),
    }

    impl Wire for Msg {
        fn shape_name(&self) -> &'static str {
            match self {
                Msg::Alpha(_) => "Alpha",
                Msg::Beta(_) => "Beta",
            }
        }

        fn marshal(&self) -> Result<Vec<u8>> {
            match self {
                Msg::Alpha(b) | Msg::Beta(b) => Ok(b.clone()),
            }
        }
    }

    fn alpha(b: &[u8]) -> Result<Msg> {
        Ok(Msg::Alpha(b.to_vec()))
    }

    fn beta(b: &[u8]) -> Result<Msg> {
        Ok(Msg::Beta(b.to_vec()))
    }

    #[test]
    fn test_register_populates_both_views() {
        let registry = Registry::new();
        let opcode = registry.register(&Msg::Alpha(vec![]), alpha).unwrap();

        assert_eq!(opcode, opcode_for("Alpha"));
        assert_eq!(registry.opcode_of("Alpha").unwrap(), Some(opcode));
        assert_eq!(registry.shape_of(opcode).unwrap(), Some("Alpha"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_keeps_first_entry() {
        let registry = Registry::new();
        registry.register(&Msg::Alpha(vec![]), alpha).unwrap();

        let err = registry
            .register(&Msg::Alpha(vec![1]), |b: &[u8]| {
                Ok(Msg::Alpha(b.iter().rev().copied().collect()))
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::DuplicateShape { ref shape, .. } if shape == "Alpha"
        ));

        let decoded = registry.decode_with(opcode_for("Alpha"), &[1, 2]).unwrap();
        assert_eq!(decoded, Msg::Alpha(vec![1, 2]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_decoder_for_wrong_shape_rejected() {
        let registry = Registry::new();
        let err = registry.register(&Msg::Alpha(vec![]), beta).unwrap_err();

        assert_eq!(
            err,
            RegistrationError::DecoderMismatch {
                shape: "Alpha".into(),
                produced: "Beta".into(),
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_decoder_rejecting_sample() {
        let registry = Registry::new();
        let err = registry
            .register(&Msg::Alpha(vec![]), |_: &[u8]| {
                Err(ProtocolError::MalformedPayload {
                    shape: "Alpha",
                    reason: "always".into(),
                })
            })
            .unwrap_err();

        assert!(matches!(err, RegistrationError::DecoderRejectedSample { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_opcode() {
        let registry: Registry<Msg> = Registry::new();
        let err = registry.decode_with(42, &[]).unwrap_err();
        assert!(matches!(err, ProtocolError::UnregisteredOpcode(42)));
    }

    #[test]
    fn test_shapes_sorted() {
        let registry = Registry::new();
        registry.register(&Msg::Beta(vec![]), beta).unwrap();
        registry.register(&Msg::Alpha(vec![]), alpha).unwrap();

        let shapes = registry.shapes().unwrap();
        assert_eq!(shapes[0].0, "Alpha");
        assert_eq!(shapes[1].0, "Beta");
    }

    #[test]
    fn test_panicking_decoder_leaves_registry_usable() {
        let registry = Registry::new();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.register(&Msg::Alpha(vec![]), |_: &[u8]| -> Result<Msg> {
                panic!("decoder bug")
            })
        }));
        assert!(outcome.is_err());

        registry.register(&Msg::Beta(vec![]), beta).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.opcode_of("Alpha").unwrap(), None);
        assert_eq!(
            registry.decode_with(opcode_for("Beta"), &[9]).unwrap(),
            Msg::Beta(vec![9])
        );
    }
}

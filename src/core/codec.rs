//! # Envelope Codec
//!
//! Turns a message into `[opcode][payload]` bytes and back.
//!
//! The codec keeps no per-call state. `encode` and `decode` only take the
//! registry's read guard, so any number of connection tasks can share one
//! codec behind an `Arc`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::core::opcode::{DEFAULT_REGISTRY_CAPACITY, OPCODE_SIZE};
use crate::core::registry::Registry;
use crate::core::shape::{Shape, Wire};
use crate::error::{ProtocolError, RegistrationError, Result};

/// Envelope codec over the message union `M`.
pub struct Codec<M> {
    registry: Registry<M>,
}

impl<M: Wire> Default for Codec<M> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}

impl<M: Wire> Codec<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Registry::with_capacity(capacity),
        }
    }

    /// Register a shape by sample value and decoder. See [`Registry::register`].
    pub fn register<F>(
        &self,
        sample: &M,
        decoder: F,
    ) -> std::result::Result<u32, RegistrationError>
    where
        F: Fn(&[u8]) -> Result<M> + Send + Sync + 'static,
    {
        self.registry.register(sample, decoder)
    }

    /// Register a [`Shape`] using its default value as the sample and
    /// [`Shape::unmarshal`] as the decoder.
    pub fn register_shape<S>(&self) -> std::result::Result<u32, RegistrationError>
    where
        S: Shape + Default + Into<M> + 'static,
    {
        self.registry.register(&S::default().into(), |payload: &[u8]| {
            S::unmarshal(payload).map(Into::into)
        })
    }

    /// Encode `msg` into a fresh envelope.
    ///
    /// Fails with [`ProtocolError::UnregisteredType`] when the message's shape
    /// was never registered, and with whatever error the shape's `marshal`
    /// returned when its payload cannot be serialized.
    pub fn encode(&self, msg: &M) -> Result<Bytes> {
        let shape = msg.shape_name();
        let opcode = self
            .registry
            .opcode_of(shape)?
            .ok_or_else(|| ProtocolError::UnregisteredType(shape.to_string()))?;

        let payload = msg.marshal()?;
        let mut buf = BytesMut::with_capacity(OPCODE_SIZE + payload.len());
        buf.put_u32(opcode);
        buf.put_slice(&payload);

        trace!(shape, opcode, len = buf.len(), "Encoded envelope");
        Ok(buf.freeze())
    }

    /// Decode one envelope.
    ///
    /// Envelopes shorter than the opcode fail with
    /// [`ProtocolError::TruncatedEnvelope`] before anything else is looked at.
    /// Unknown opcodes fail with [`ProtocolError::UnregisteredOpcode`]; decoder
    /// errors are returned as the decoder produced them.
    pub fn decode(&self, data: &[u8]) -> Result<M> {
        if data.len() < OPCODE_SIZE {
            return Err(ProtocolError::TruncatedEnvelope(data.len()));
        }

        let (mut header, payload) = data.split_at(OPCODE_SIZE);
        let opcode = header.get_u32();

        let msg = self.registry.decode_with(opcode, payload)?;
        trace!(shape = msg.shape_name(), opcode, len = data.len(), "Decoded envelope");
        Ok(msg)
    }

    /// Read-only view of the underlying registry.
    pub fn registry(&self) -> &Registry<M> {
        &self.registry
    }
}

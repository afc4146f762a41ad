//! Message shape traits.
//!
//! [`Wire`] is implemented by a message union (one enum per protocol stack)
//! and is what the codec works with. [`Shape`] is implemented by each concrete
//! payload struct inside that union, and lets a shape be registered without
//! spelling out its decoder by hand.

use crate::error::Result;

/// A value the codec can put on the wire.
pub trait Wire: Send + Sync + 'static {
    /// Stable shape name; the opcode is derived from it.
    fn shape_name(&self) -> &'static str;

    /// Shape-specific payload bytes, without the opcode.
    ///
    /// Fails with [`ProtocolError::UnencodablePayload`] when the value cannot
    /// be serialized; nothing is written to the wire in that case.
    ///
    /// [`ProtocolError::UnencodablePayload`]: crate::error::ProtocolError::UnencodablePayload
    fn marshal(&self) -> Result<Vec<u8>>;
}

/// A single concrete message shape.
pub trait Shape: Sized {
    /// Stable name shared by every implementation that wants to interoperate.
    const NAME: &'static str;

    /// Serialize the payload.
    fn marshal(&self) -> Result<Vec<u8>>;

    /// Rebuild the payload from the bytes following the opcode.
    fn unmarshal(payload: &[u8]) -> Result<Self>;
}

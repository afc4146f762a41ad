//! # Error Types
//!
//! Error handling for the envelope codec and the node that drives it.
//!
//! Errors are split into two tiers that never mix:
//! - **Registration errors** ([`RegistrationError`]): raised while overlay
//!   protocols register their message shapes at startup. These are programming
//!   mistakes (duplicate shapes, colliding opcodes, mismatched decoders) and
//!   must stop the node before it accepts any traffic.
//! - **Protocol errors** ([`ProtocolError`]): raised per message while encoding
//!   or decoding traffic. These are recoverable; the worst a caller should do is
//!   drop the offending peer.
//!
//! ## Example Usage
//! ```rust
//! use peerwire::error::ProtocolError;
//! use tracing::warn;
//!
//! fn on_decode_failure(err: &ProtocolError) -> bool {
//!     warn!(error = %err, "Dropping envelope");
//!     err.should_disconnect()
//! }
//! ```

use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry lock errors
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on registry";

    /// Dispatcher lock errors
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Payload errors
    pub const ERR_GOSSIP_TOO_LARGE: &str = "Gossip payload exceeds configured maximum";
}

/// ProtocolError is the runtime error type for all traffic-path operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Fewer than four bytes were supplied, so no opcode can be read.
    #[error("Truncated envelope: {0} bytes, need at least 4")]
    TruncatedEnvelope(usize),

    /// A message of this shape was encoded but nobody registered it.
    #[error("Unregistered message type: {0}")]
    UnregisteredType(String),

    /// An inbound envelope carried an opcode this node does not know.
    #[error("Unregistered opcode: {0:#010x}")]
    UnregisteredOpcode(u32),

    /// A shape decoder refused its payload.
    #[error("Malformed {shape} payload: {reason}")]
    MalformedPayload { shape: &'static str, reason: String },

    /// A shape failed to serialize its own payload on the way out.
    #[error("Cannot encode {shape} payload: {reason}")]
    UnencodablePayload { shape: &'static str, reason: String },

    #[error("Envelope too large: {size} bytes (max {max})")]
    OversizedEnvelope { size: usize, max: usize },

    #[error("No handler registered for message type: {0}")]
    UnexpectedMessage(String),

    /// An overlay handler decided the sending peer misbehaved.
    #[error("Peer rejected: {0}")]
    PeerRejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),

    #[error("Synchronization primitive poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl ProtocolError {
    /// Whether the transport should drop the connection this error came from.
    ///
    /// Everything caused by the remote side's bytes counts; local mistakes
    /// such as encoding an unregistered type do not.
    pub fn should_disconnect(&self) -> bool {
        matches!(
            self,
            ProtocolError::TruncatedEnvelope(_)
                | ProtocolError::UnregisteredOpcode(_)
                | ProtocolError::MalformedPayload { .. }
                | ProtocolError::OversizedEnvelope { .. }
                | ProtocolError::UnexpectedMessage(_)
                | ProtocolError::PeerRejected(_)
        )
    }
}

/// Startup-time registration failure.
///
/// Every variant is unrecoverable: the registry is left exactly as it was
/// before the failed call, and the node must not go on to accept traffic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(
        "attempted to register type {shape} which is already registered \
         under opcode {opcode:#010x}"
    )]
    DuplicateShape { shape: String, opcode: u32 },

    #[error(
        "attempted to register type {shape} whose opcode {opcode:#010x} \
         collides with already registered type {existing}"
    )]
    OpcodeCollision {
        shape: String,
        existing: String,
        opcode: u32,
    },

    #[error("provided decoder for type {shape} produced a {produced}")]
    DecoderMismatch { shape: String, produced: String },

    #[error("provided decoder for type {shape} rejected its own sample: {reason}")]
    DecoderRejectedSample { shape: String, reason: String },

    #[error("sample of type {shape} could not be serialized: {reason}")]
    UnencodableSample { shape: String, reason: String },

    #[error("Synchronization primitive poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl RegistrationError {
    /// Registration errors are always fatal to the node being assembled.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Shape name the failed registration was about, if any.
    pub fn shape(&self) -> Option<&str> {
        match self {
            RegistrationError::DuplicateShape { shape, .. }
            | RegistrationError::OpcodeCollision { shape, .. }
            | RegistrationError::DecoderMismatch { shape, .. }
            | RegistrationError::DecoderRejectedSample { shape, .. }
            | RegistrationError::UnencodableSample { shape, .. } => Some(shape),
            RegistrationError::LockPoisoned(_) => None,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traffic_errors_disconnect() {
        assert!(ProtocolError::TruncatedEnvelope(2).should_disconnect());
        assert!(ProtocolError::UnregisteredOpcode(7).should_disconnect());
        assert!(!ProtocolError::UnregisteredType("Ping".into()).should_disconnect());
        assert!(!ProtocolError::ConfigError("x".into()).should_disconnect());
        assert!(!ProtocolError::UnencodablePayload {
            shape: "Ping",
            reason: "x".into()
        }
        .should_disconnect());
    }

    #[test]
    fn test_registration_error_names_shape_and_opcode() {
        let err = RegistrationError::OpcodeCollision {
            shape: "StoreValue".into(),
            existing: "FindValue".into(),
            opcode: 0xdead_beef,
        };
        let text = err.to_string();
        assert!(text.contains("StoreValue"));
        assert!(text.contains("FindValue"));
        assert!(text.contains("0xdeadbeef"));
        assert!(err.is_fatal());
        assert_eq!(err.shape(), Some("StoreValue"));
    }

    #[test]
    fn test_duplicate_message_on_one_line() {
        let err = RegistrationError::DuplicateShape {
            shape: "Ping".into(),
            opcode: 0x85e7_92c3,
        };
        assert_eq!(
            err.to_string(),
            "attempted to register type Ping which is already registered under opcode 0x85e792c3"
        );
    }

    #[test]
    fn test_opcode_formatting() {
        let err = ProtocolError::UnregisteredOpcode(0x1f);
        assert_eq!(err.to_string(), "Unregistered opcode: 0x0000001f");
    }
}

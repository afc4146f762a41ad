//! # Core Codec Components
//!
//! Opcode derivation, the shape registry and the envelope codec built on it.
//!
//! Every overlay protocol funnels its traffic through this module: shapes are
//! registered once at startup, then encoded and decoded concurrently by every
//! connection the node serves.
//!
//! ## Wire Format
//! ```text
//! [Opcode(4, big-endian)] [Payload(N)]
//! ```
//!
//! The envelope carries no length prefix. Splitting a byte stream into
//! envelopes is the transport's job.
//!
//! ## Opcodes
//! An opcode is the CRC-32 (IEEE) of the shape's UTF-8 name, so two
//! independent implementations interoperate as long as they agree on names.

pub mod codec;
pub mod opcode;
pub mod registry;
pub mod serialization;
pub mod shape;

pub use codec::Codec;
pub use opcode::{opcode_for, OPCODE_SIZE};
pub use registry::Registry;
pub use shape::{Shape, Wire};

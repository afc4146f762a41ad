//! # peerwire
//!
//! Opcode-registered envelope codec for peer-to-peer protocol stacks.
//!
//! Overlay protocols (a Kademlia-style DHT, gossip) register their message
//! shapes with a node at startup. Every message then travels as an envelope:
//! a 4-byte big-endian opcode, derived from the shape's name with CRC-32,
//! followed by the shape's own payload bytes.
//!
//! ## Modules
//! - [`core`]: opcode derivation, shape registry, envelope codec
//! - [`protocol`]: message union, dispatcher, bundled overlays
//! - [`service`]: node assembly and inbound handling
//! - [`config`]: TOML/env configuration
//! - [`utils`]: logging and metrics
//!
//! ## Example
//! ```rust
//! use peerwire::config::NetworkConfig;
//! use peerwire::protocol::kademlia::{Kademlia, Ping, Pong};
//! use peerwire::protocol::message::{Message, PeerId};
//! use peerwire::service::NodeBuilder;
//!
//! let node = NodeBuilder::new(NetworkConfig::default())
//!     .bind(Kademlia::new())
//!     .build()
//!     .expect("shapes register cleanly");
//!
//! let wire = node.encode(&Message::Ping(Ping { nonce: 1 })).unwrap();
//! let reply = node.handle_inbound(&PeerId::random(), &wire).unwrap().unwrap();
//! assert_eq!(node.decode(&reply).unwrap(), Message::Pong(Pong { nonce: 1 }));
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::core::{opcode_for, Codec, Registry, Shape, Wire, OPCODE_SIZE};
pub use crate::error::{ProtocolError, RegistrationError, Result};
pub use crate::protocol::message::{Message, PeerId};
pub use crate::service::{Node, NodeBuilder};

//! # Overlay Protocols
//!
//! The message union, the dispatcher that routes decoded messages, and the
//! overlays bundled with the crate.
//!
//! ## Components
//! - **Message**: closed union of every shape the bundled overlays speak
//! - **Dispatcher**: shape name to handler routing
//! - **Kademlia**: ping and find-node shapes
//! - **Gossip**: opaque gossip payloads and the receive hook
//!
//! ## Binding
//! An overlay implements [`Protocol`]. While a node is assembled, each bound
//! overlay is handed the node's config and then registers its shapes with
//! the node's codec and its handlers with the node's dispatcher. Any [`RegistrationError`] aborts the assembly.

use crate::config::NetworkConfig;
use crate::core::codec::Codec;
use crate::error::RegistrationError;

pub mod dispatcher;
pub mod gossip;
pub mod kademlia;
pub mod message;

use dispatcher::Dispatcher;
use message::Message;

/// An overlay protocol that can be bound to a node.
pub trait Protocol: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pick up settings from the config of the node this overlay is bound to.
    /// Runs once, before [`Protocol::register`].
    fn configure(&mut self, _config: &NetworkConfig) {}

    /// Register this overlay's shapes and handlers.
    fn register(
        &self,
        codec: &Codec<Message>,
        dispatcher: &Dispatcher<Message>,
    ) -> Result<(), RegistrationError>;
}

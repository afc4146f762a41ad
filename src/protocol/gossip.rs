//! Gossip overlay shape and receive hook.
//!
//! A gossip payload goes on the wire as-is, with no framing of its own.
//! Fan-out and duplicate suppression belong to the dissemination layer that
//! sits on top of this binding.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{GossipConfig, NetworkConfig, MAX_GOSSIP_SIZE};
use crate::core::codec::Codec;
use crate::core::shape::Shape;
use crate::error::{constants, ProtocolError, RegistrationError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::{Message, PeerId};
use crate::protocol::Protocol;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GossipMessage {
    pub data: Vec<u8>,
}

impl Shape for GossipMessage {
    const NAME: &'static str = "Gossip";

    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }

    fn unmarshal(payload: &[u8]) -> Result<Self> {
        Ok(GossipMessage {
            data: payload.to_vec(),
        })
    }
}

/// Hook invoked with every gossip payload received from the network.
///
/// Returning an error marks the sender as misbehaving; the node surfaces it
/// as [`ProtocolError::PeerRejected`] so the transport drops that peer.
pub type GossipHandler = Arc<dyn Fn(&PeerId, &[u8]) -> Result<()> + Send + Sync>;

/// Callbacks hooked into the gossip overlay.
#[derive(Clone, Default)]
pub struct Events {
    pub on_gossip_received: Option<GossipHandler>,
}

/// Gossip overlay binding.
///
/// Bound to a node, the payload limit comes from the node's
/// [`GossipConfig`] unless one was set with [`Gossip::with_max_size`] or
/// [`Gossip::from_config`]. Registered directly on a codec without a limit,
/// it falls back to [`MAX_GOSSIP_SIZE`].
#[derive(Clone, Default)]
pub struct Gossip {
    events: Events,
    max_size: Option<usize>,
}

impl Gossip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GossipConfig) -> Self {
        Self::new().with_max_size(config.max_gossip_size)
    }

    /// Register a batch of callbacks.
    pub fn with_events(mut self, events: Events) -> Self {
        self.events = events;
        self
    }

    /// Largest payload accepted from a peer.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Payload limit the decoder will enforce.
    pub fn max_size(&self) -> usize {
        self.max_size.unwrap_or(MAX_GOSSIP_SIZE)
    }

    /// Build an outbound gossip message.
    pub fn message(data: impl Into<Vec<u8>>) -> Message {
        Message::Gossip(GossipMessage { data: data.into() })
    }
}

impl Protocol for Gossip {
    fn name(&self) -> &'static str {
        "gossip"
    }

    fn configure(&mut self, config: &NetworkConfig) {
        self.max_size.get_or_insert(config.gossip.max_gossip_size);
    }

    fn register(
        &self,
        codec: &Codec<Message>,
        dispatcher: &Dispatcher<Message>,
    ) -> std::result::Result<(), RegistrationError> {
        let max_size = self.max_size();
        codec.register(&GossipMessage::default().into(), move |payload: &[u8]| {
            if payload.len() > max_size {
                return Err(ProtocolError::MalformedPayload {
                    shape: GossipMessage::NAME,
                    reason: format!(
                        "{}: {} > {}",
                        constants::ERR_GOSSIP_TOO_LARGE,
                        payload.len(),
                        max_size
                    ),
                });
            }
            GossipMessage::unmarshal(payload).map(Message::Gossip)
        })?;

        let on_received = self.events.on_gossip_received.clone();
        dispatcher.register(GossipMessage::NAME, move |peer: &PeerId, msg: &Message| {
            let Message::Gossip(gossip) = msg else {
                return Ok(None);
            };
            debug!(peer = %peer, len = gossip.data.len(), "Gossip received");

            if let Some(cb) = &on_received {
                cb(peer, &gossip.data).map_err(|e| {
                    warn!(peer = %peer, error = %e, "Gossip rejected by handler");
                    ProtocolError::PeerRejected(e.to_string())
                })?;
            }
            Ok(None)
        })?;

        Ok(())
    }
}

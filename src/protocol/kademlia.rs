//! Kademlia overlay shapes and their handlers.
//!
//! Only the message surface lives here. The routing table and the iterative
//! lookup are supplied by the embedder through [`PeerLookup`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::codec::Codec;
use crate::core::serialization::{from_payload, to_payload};
use crate::core::shape::Shape;
use crate::error::{RegistrationError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::{Message, PeerId, PeerInfo};
use crate::protocol::Protocol;

/// Upper bound on peers returned in one `FindNodeResponse`.
pub const BUCKET_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ping {
    pub nonce: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pong {
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindNodeRequest {
    pub target: PeerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindNodeResponse {
    pub results: Vec<PeerInfo>,
}

macro_rules! bincode_shape {
    ($($shape:ident),* $(,)?) => {
        $(
            impl Shape for $shape {
                const NAME: &'static str = stringify!($shape);

                fn marshal(&self) -> Result<Vec<u8>> {
                    to_payload(Self::NAME, self)
                }

                fn unmarshal(payload: &[u8]) -> Result<Self> {
                    from_payload(Self::NAME, payload)
                }
            }
        )*
    };
}

bincode_shape!(Ping, Pong, FindNodeRequest, FindNodeResponse);

/// Source of the peers closest to a target, usually a routing table.
pub trait PeerLookup: Send + Sync + 'static {
    fn closest(&self, target: &PeerId, limit: usize) -> Vec<PeerInfo>;
}

impl<F> PeerLookup for F
where
    F: Fn(&PeerId, usize) -> Vec<PeerInfo> + Send + Sync + 'static,
{
    fn closest(&self, target: &PeerId, limit: usize) -> Vec<PeerInfo> {
        self(target, limit)
    }
}

/// Callbacks for responses arriving from remote peers.
#[derive(Clone, Default)]
pub struct Events {
    /// Called for every inbound `Pong`.
    pub on_pong: Option<Arc<dyn Fn(&PeerId, &Pong) + Send + Sync>>,
    /// Called with the peers carried by every inbound `FindNodeResponse`.
    pub on_peers_found: Option<Arc<dyn Fn(&PeerId, &[PeerInfo]) + Send + Sync>>,
}

/// Kademlia overlay binding.
#[derive(Clone)]
pub struct Kademlia {
    lookup: Arc<dyn PeerLookup>,
    events: Events,
}

impl Default for Kademlia {
    fn default() -> Self {
        Self::new()
    }
}

impl Kademlia {
    /// Overlay answering every lookup with no peers.
    pub fn new() -> Self {
        Self {
            lookup: Arc::new(|_: &PeerId, _: usize| Vec::<PeerInfo>::new()),
            events: Events::default(),
        }
    }

    pub fn with_lookup<L: PeerLookup>(mut self, lookup: L) -> Self {
        self.lookup = Arc::new(lookup);
        self
    }

    pub fn with_events(mut self, events: Events) -> Self {
        self.events = events;
        self
    }
}

impl Protocol for Kademlia {
    fn name(&self) -> &'static str {
        "kademlia"
    }

    fn register(
        &self,
        codec: &Codec<Message>,
        dispatcher: &Dispatcher<Message>,
    ) -> std::result::Result<(), RegistrationError> {
        codec.register_shape::<Ping>()?;
        codec.register_shape::<Pong>()?;
        codec.register_shape::<FindNodeRequest>()?;
        codec.register_shape::<FindNodeResponse>()?;

        dispatcher.register(Ping::NAME, |peer: &PeerId, msg: &Message| match msg {
            Message::Ping(ping) => {
                debug!(peer = %peer, nonce = ping.nonce, "Ping");
                Ok(Some(Message::Pong(Pong { nonce: ping.nonce })))
            }
            _ => Ok(None),
        })?;

        let on_pong = self.events.on_pong.clone();
        dispatcher.register(Pong::NAME, move |peer: &PeerId, msg: &Message| {
            if let (Message::Pong(pong), Some(cb)) = (msg, &on_pong) {
                cb(peer, pong);
            }
            Ok(None)
        })?;

        let lookup = self.lookup.clone();
        dispatcher.register(
            FindNodeRequest::NAME,
            move |peer: &PeerId, msg: &Message| match msg {
                Message::FindNodeRequest(req) => {
                    let mut results = lookup.closest(&req.target, BUCKET_SIZE);
                    results.truncate(BUCKET_SIZE);
                    debug!(
                        peer = %peer,
                        lookup_target = %req.target,
                        found = results.len(),
                        "FindNode"
                    );
                    Ok(Some(Message::FindNodeResponse(FindNodeResponse { results })))
                }
                _ => Ok(None),
            },
        )?;

        let on_peers_found = self.events.on_peers_found.clone();
        dispatcher.register(
            FindNodeResponse::NAME,
            move |peer: &PeerId, msg: &Message| {
                if let (Message::FindNodeResponse(resp), Some(cb)) = (msg, &on_peers_found) {
                    cb(peer, &resp.results);
                }
                Ok(None)
            },
        )?;

        Ok(())
    }
}

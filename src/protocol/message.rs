//! Message union shared by every overlay bound to a node.
//!
//! Each variant wraps one registered shape. Inbound envelopes come back out
//! of the codec as a `Message`, and the node routes them by variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::shape::{Shape, Wire};
use crate::error::Result;
use crate::protocol::gossip::GossipMessage;
use crate::protocol::kademlia::{FindNodeRequest, FindNodeResponse, Ping, Pong};

/// 256-bit peer identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 32]);

impl PeerId {
    /// Generate a random identifier.
    pub fn random() -> Self {
        PeerId(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// XOR distance to `other`, compared lexicographically.
    pub fn distance(&self, other: &PeerId) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        out
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({self})")
    }
}

/// A peer's identity and dialable address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: PeerId,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ping(Ping),
    Pong(Pong),
    FindNodeRequest(FindNodeRequest),
    FindNodeResponse(FindNodeResponse),
    Gossip(GossipMessage),
}

impl Wire for Message {
    fn shape_name(&self) -> &'static str {
        match self {
            Message::Ping(_) => Ping::NAME,
            Message::Pong(_) => Pong::NAME,
            Message::FindNodeRequest(_) => FindNodeRequest::NAME,
            Message::FindNodeResponse(_) => FindNodeResponse::NAME,
            Message::Gossip(_) => GossipMessage::NAME,
        }
    }

    fn marshal(&self) -> Result<Vec<u8>> {
        match self {
            Message::Ping(m) => m.marshal(),
            Message::Pong(m) => m.marshal(),
            Message::FindNodeRequest(m) => m.marshal(),
            Message::FindNodeResponse(m) => m.marshal(),
            Message::Gossip(m) => m.marshal(),
        }
    }
}

macro_rules! impl_from_shape {
    ($($variant:ident => $shape:ty),* $(,)?) => {
        $(
            impl From<$shape> for Message {
                fn from(m: $shape) -> Self {
                    Message::$variant(m)
                }
            }
        )*
    };
}

impl_from_shape! {
    Ping => Ping,
    Pong => Pong,
    FindNodeRequest => FindNodeRequest,
    FindNodeResponse => FindNodeResponse,
    Gossip => GossipMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_display_is_prefix() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xAB;
        bytes[7] = 0x01;
        let id = PeerId(bytes);
        assert_eq!(id.to_string(), "ab00000000000001");
        assert_eq!(format!("{id:?}"), "PeerId(ab00000000000001)");
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = PeerId::random();
        let b = PeerId::random();
        assert_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&a), [0u8; 32]);
    }

    #[test]
    fn test_shape_names_are_distinct() {
        let names = [
            Message::Ping(Ping::default()).shape_name(),
            Message::Pong(Pong::default()).shape_name(),
            Message::FindNodeRequest(FindNodeRequest::default()).shape_name(),
            Message::FindNodeResponse(FindNodeResponse::default()).shape_name(),
            Message::Gossip(GossipMessage::default()).shape_name(),
        ];
        let mut sorted = names.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }
}

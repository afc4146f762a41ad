use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::{NetworkConfig, NodeConfig};
use crate::core::codec::Codec;
use crate::core::opcode::OPCODE_SIZE;
use crate::core::shape::Wire;
use crate::error::{ProtocolError, RegistrationError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::message::{Message, PeerId};
use crate::protocol::Protocol;
use crate::utils::metrics::Metrics;

/// Assembles a [`Node`] from a config and the overlays bound to it.
///
/// Every overlay first sees the node's config through
/// [`Protocol::configure`], then overlays register in bind order. The first
/// [`RegistrationError`] aborts the build; the partially populated codec is
/// dropped with the builder.
pub struct NodeBuilder {
    config: NetworkConfig,
    protocols: Vec<Box<dyn Protocol>>,
}

impl NodeBuilder {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            protocols: Vec::new(),
        }
    }

    /// Bind an overlay protocol.
    pub fn bind<P: Protocol + 'static>(mut self, protocol: P) -> Self {
        self.protocols.push(Box::new(protocol));
        self
    }

    #[instrument(skip(self), fields(protocols = self.protocols.len()))]
    pub fn build(mut self) -> std::result::Result<Node, RegistrationError> {
        let codec = Codec::with_capacity(self.config.node.registry_capacity);
        let dispatcher = Dispatcher::new();
        let mut names = Vec::with_capacity(self.protocols.len());

        for protocol in &mut self.protocols {
            protocol.configure(&self.config);
        }

        for protocol in &self.protocols {
            protocol.register(&codec, &dispatcher).map_err(|e| {
                warn!(protocol = protocol.name(), error = %e, "Failed to bind protocol");
                e
            })?;
            debug!(protocol = protocol.name(), "Bound protocol");
            names.push(protocol.name());
        }

        let node = Node {
            id: PeerId::random(),
            config: Arc::new(self.config.node),
            codec: Arc::new(codec),
            dispatcher: Arc::new(dispatcher),
            metrics: Arc::new(Metrics::new()),
            protocols: Arc::from(names),
        };

        info!(
            id = %node.id,
            shapes = node.codec.registry().len(),
            protocols = ?node.protocols,
            "Node assembled"
        );
        Ok(node)
    }
}

/// A running node: one codec, one dispatcher, the overlays bound to them.
///
/// Cloning is cheap and every clone shares the same registry, so each
/// connection task can hold its own handle.
#[derive(Clone)]
pub struct Node {
    id: PeerId,
    config: Arc<NodeConfig>,
    codec: Arc<Codec<Message>>,
    dispatcher: Arc<Dispatcher<Message>>,
    metrics: Arc<Metrics>,
    protocols: Arc<[&'static str]>,
}

impl Node {
    pub fn builder(config: NetworkConfig) -> NodeBuilder {
        NodeBuilder::new(config)
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn codec(&self) -> &Arc<Codec<Message>> {
        &self.codec
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Names of the bound overlays, in bind order.
    pub fn protocols(&self) -> &[&'static str] {
        &self.protocols
    }

    /// Encode an outbound message.
    pub fn encode(&self, msg: &Message) -> Result<Bytes> {
        match self.codec.encode(msg) {
            Ok(bytes) => {
                self.metrics.message_encoded(bytes.len() as u64);
                Ok(bytes)
            }
            Err(e) => {
                self.metrics.encode_failed();
                Err(e)
            }
        }
    }

    /// Decode one inbound envelope, enforcing the configured size limit.
    ///
    /// Input too short to carry an opcode is always reported as truncated,
    /// whatever the limit.
    pub fn decode(&self, data: &[u8]) -> Result<Message> {
        let result = if data.len() < OPCODE_SIZE {
            Err(ProtocolError::TruncatedEnvelope(data.len()))
        } else if data.len() > self.config.max_envelope_size {
            Err(ProtocolError::OversizedEnvelope {
                size: data.len(),
                max: self.config.max_envelope_size,
            })
        } else {
            self.codec.decode(data)
        };

        match &result {
            Ok(_) => self.metrics.message_decoded(data.len() as u64),
            Err(e) => self.metrics.decode_failed(e),
        }
        result
    }

    /// Handle one envelope received from `peer`.
    ///
    /// Decodes it, runs the handler bound to its shape and encodes the
    /// handler's reply, if any. An error means the envelope was dropped;
    /// [`ProtocolError::should_disconnect`] says whether the peer goes with it.
    #[instrument(skip(self, data), fields(peer = %peer, len = data.len()))]
    pub fn handle_inbound(&self, peer: &PeerId, data: &[u8]) -> Result<Option<Bytes>> {
        let msg = self.decode(data).map_err(|e| {
            warn!(error = %e, "Dropping inbound envelope");
            e
        })?;

        let reply = self.dispatcher.dispatch(peer, &msg).map_err(|e| {
            self.metrics.dispatch_failed();
            warn!(shape = msg.shape_name(), error = %e, "Handler failed");
            e
        })?;

        reply.map(|reply| self.encode(&reply)).transpose()
    }
}

use crate::core::shape::Wire;
use crate::error::{constants, ProtocolError, RegistrationError, Result};
use crate::protocol::message::PeerId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::RwLock;

type HandlerFn<M> = dyn Fn(&PeerId, &M) -> Result<Option<M>> + Send + Sync + 'static;

/// Routes decoded messages to the overlay handler bound to their shape.
/// Keys borrow the shape's static name, so routing never allocates.
pub struct Dispatcher<M> {
    handlers: RwLock<HashMap<Cow<'static, str>, Box<HandlerFn<M>>>>,
}

impl<M: Wire> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Wire> Dispatcher<M> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `handler` to `shape`. A later handler for the same shape replaces
    /// the earlier one; wire identity lives in the registry, not here.
    pub fn register<S, F>(
        &self,
        shape: S,
        handler: F,
    ) -> std::result::Result<(), RegistrationError>
    where
        S: Into<Cow<'static, str>>,
        F: Fn(&PeerId, &M) -> Result<Option<M>> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| RegistrationError::LockPoisoned(constants::ERR_DISPATCHER_WRITE_LOCK))?;

        handlers.insert(shape.into(), Box::new(handler));
        Ok(())
    }

    /// Run the handler for `msg`'s shape, returning its optional reply.
    pub fn dispatch(&self, peer: &PeerId, msg: &M) -> Result<Option<M>> {
        let shape = msg.shape_name();

        let handlers = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::LockPoisoned(constants::ERR_DISPATCHER_READ_LOCK))?;

        handlers
            .get(shape)
            .ok_or_else(|| ProtocolError::UnexpectedMessage(shape.to_string()))
            .and_then(|handler| handler(peer, msg))
    }

    pub fn handles(&self, shape: &str) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(shape))
            .unwrap_or(false)
    }
}

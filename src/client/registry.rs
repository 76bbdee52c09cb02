//! Subscription registry: per-channel handler sets.
//!
//! The registry is the source of truth for what the server should be
//! streaming. A channel entry exists iff it holds at least one handler, and
//! the empty/non-empty transitions are exactly what drive wire-level
//! subscribe/unsubscribe commands. Handlers are kept in registration order
//! and dispatched over a snapshot, so a handler that unsubscribes itself
//! mid-event cannot corrupt an in-progress fan-out.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::types::Channel;

/// Callback receiving the payload of one inbound event
pub type Handler = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Identifies one registered handler within its channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Per-channel sets of interested handlers
#[derive(Default)]
pub struct SubscriptionRegistry {
    channels: FxHashMap<Channel, Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to a channel
    ///
    /// Returns the handler's id and whether it is the first handler for the
    /// channel (the caller emits the wire subscribe command on `true`).
    pub fn subscribe(&mut self, channel: Channel, handler: Handler) -> (HandlerId, bool) {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        let handlers = self.channels.entry(channel).or_default();
        let first = handlers.is_empty();
        handlers.push((id, handler));
        (id, first)
    }

    /// Remove a handler from a channel
    ///
    /// Returns `true` when this removed the last handler and the channel
    /// entry was deleted (the caller emits the wire unsubscribe command).
    /// Unknown channels and already-removed handlers are silent no-ops.
    pub fn unsubscribe(&mut self, channel: &Channel, id: HandlerId) -> bool {
        let Some(handlers) = self.channels.get_mut(channel) else {
            return false;
        };
        handlers.retain(|(handler_id, _)| *handler_id != id);
        if handlers.is_empty() {
            self.channels.remove(channel);
            return true;
        }
        false
    }

    /// Snapshot of a channel's handlers, in registration order
    pub fn handlers(&self, channel: &Channel) -> Option<Vec<Handler>> {
        self.channels
            .get(channel)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
    }

    /// Channels currently holding at least one handler
    ///
    /// This is what the resubscription sweep replays after a reconnect.
    pub fn active_channels(&self) -> Vec<Channel> {
        self.channels.keys().cloned().collect()
    }

    /// Whether no channels are registered
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Drop every channel and handler
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

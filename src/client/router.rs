//! Inbound event router.
//!
//! Parses raw text frames, discards keepalive acknowledgements, computes the
//! dispatch key, and fans the payload out to every handler registered for
//! that key. Malformed frames are logged and dropped without affecting the
//! session.

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::client::registry::SubscriptionRegistry;
use crate::types::InboundFrame;

/// Route one raw frame to the registered handlers
///
/// Handlers run in registration order over a snapshot of the channel's
/// handler set taken before iteration; the registry lock is not held while
/// handlers execute, so a handler may subscribe or unsubscribe freely.
pub fn route(registry: &Mutex<SubscriptionRegistry>, raw: &str) {
    let frame = match InboundFrame::parse(raw) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "dropping malformed frame");
            return;
        }
    };

    let event = match frame {
        InboundFrame::Pong => {
            trace!("keepalive acknowledged");
            return;
        }
        InboundFrame::Event(event) => event,
    };

    let key = event.dispatch_key();
    let Some(handlers) = registry.lock().handlers(&key) else {
        trace!(channel = %key, "no handlers for inbound event");
        return;
    };

    for handler in handlers {
        handler(event.payload.clone());
    }
}

//! Outbound command queue.
//!
//! Commands produced while the connection is down are buffered here and
//! flushed in enqueue order once the transport opens. Delivery is
//! best-effort: a command lost to a mid-transmission failure is not retried
//! at this layer, it is only recovered implicitly if it corresponds to a
//! still-active subscription replayed by the next resubscription sweep.

use std::collections::VecDeque;

use crate::types::{Channel, Command};

/// Unbounded FIFO of commands awaiting transmission
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: VecDeque<Command>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command at the tail
    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Pop the next command to transmit, in enqueue order
    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    /// Number of buffered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether a subscribe command for this channel is already buffered
    ///
    /// Used by the resubscription sweep to avoid duplicating a subscribe
    /// that was queued while the connection was down.
    pub fn has_pending_subscribe(&self, channel: &Channel) -> bool {
        self.commands
            .iter()
            .any(|cmd| matches!(cmd, Command::Subscribe { channel: c } if c == channel))
    }

    /// Drop all buffered commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

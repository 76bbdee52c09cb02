//! The streaming client and its internal machinery.
//!
//! This module contains:
//!
//! - [`stream`] - The [`TradingSocket`] session supervisor and typed
//!   subscription API
//! - [`registry`] - Per-channel handler sets
//! - [`queue`] - Outbound command FIFO
//! - [`router`] - Inbound frame parsing and handler fan-out
//! - [`transport`] - Transport abstraction and the tokio-tungstenite
//!   implementation
//!
//! [`TradingSocket`]: stream::TradingSocket

pub mod queue;
pub mod registry;
pub mod router;
pub mod stream;
pub mod transport;

pub use stream::{ConnectionState, Subscription, TradingSocket};
pub use transport::{Connection, Transport, WsTransport};

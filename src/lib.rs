//! # trading-stream
//!
//! Realtime event-streaming client for trading dashboards: one multiplexed
//! WebSocket connection serving many independent subscriptions (price ticks,
//! order-book deltas, trade prints, account/order/position events), with
//! transparent reconnection and per-channel handler fan-out.
//!
//! ## Features
//!
//! - **Single logical connection** - Every subscription in the process shares
//!   one transport session
//! - **Transparent recovery** - Unexpected disconnects are retried on a fixed
//!   delay and active channels are resubscribed automatically
//! - **Offline buffering** - Commands issued while disconnected are queued
//!   and flushed in order once the transport opens
//! - **Typed subscriptions** - Per-family helpers returning decoded payloads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trading_stream::{Config, TradingSocket};
//!
//! #[tokio::main]
//! async fn main() -> trading_stream::Result<()> {
//!     let socket = TradingSocket::new(Config::new("wss://stream.example.com/ws"));
//!
//!     // Subscriptions may be taken before the connection exists; the
//!     // subscribe commands are buffered and sent on connect.
//!     let ticker = socket.subscribe_ticker("BTCUSDT", |update| {
//!         println!("{}: {}", update.symbol, update.price);
//!     });
//!
//!     socket.connect(Some("bearer-token")).await?;
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(60)).await;
//!     ticker.unsubscribe();
//!     socket.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - Session supervisor, registry, queue, router, transport
//! - [`types`] - Channel keys, wire frames, typed event payloads
//! - [`config`] - Server address and timing policy
//! - [`error`] - Error types for the crate
//!
//! The transport is exclusively owned by a spawned driver task; the public
//! handle only touches the subscription registry and the outbound queue, so
//! `subscribe`/`unsubscribe` are non-blocking from any task. The bearer
//! credential is consumed as-is and appended to the connection URL; obtaining
//! and refreshing it is the auth collaborator's job.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export main types at crate root for convenience
pub use client::{ConnectionState, Subscription, TradingSocket};
pub use config::Config;
pub use error::Error;
pub use types::{
    AccountFamily, Channel, MarketFamily, OrderBookUpdate, OrderUpdate, PositionUpdate,
    PriceUpdate, TradeSide, TradeUpdate,
};

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

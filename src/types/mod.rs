//! Wire types for the streaming protocol.
//!
//! - [`channel`] - Canonical channel keys and family constructors
//! - [`messages`] - Outbound commands, inbound frames, typed event payloads

pub mod channel;
pub mod messages;

pub use channel::{AccountFamily, Channel, MarketFamily};
pub use messages::{
    Command, EventFrame, InboundFrame, OrderBookUpdate, OrderUpdate, PositionUpdate, PriceUpdate,
    TradeSide, TradeUpdate,
};

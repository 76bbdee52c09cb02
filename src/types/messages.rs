//! Wire message types.
//!
//! This module contains the outbound command frames sent to the streaming
//! server and the inbound event frames received from it, plus the typed
//! payloads carried on the market-data and account channels.

use serde::{Deserialize, Serialize};

use super::channel::Channel;

/// Outbound command sent to the streaming server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Command {
    /// Register interest in a channel
    Subscribe {
        /// Channel key
        channel: Channel,
    },
    /// Drop interest in a channel
    Unsubscribe {
        /// Channel key
        channel: Channel,
    },
    /// Keepalive; the server answers with a `pong` frame
    Ping,
}

/// Raw inbound frame shape as it arrives on the wire
///
/// Servers are loose about framing: some events carry an explicit `channel`,
/// some only a `kind` plus `symbol`, some only a `kind`. All fields besides
/// `kind` are optional.
#[derive(Debug, Clone, Deserialize)]
struct RawFrame {
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
    channel: Option<String>,
    symbol: Option<String>,
}

/// One inbound frame, classified
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// Keepalive acknowledgement; consumed internally, never dispatched
    Pong,
    /// An event to fan out to subscribed handlers
    Event(EventFrame),
}

/// An inbound event destined for handler dispatch
#[derive(Debug, Clone)]
pub struct EventFrame {
    /// Event kind, e.g. `ticker` or `orders`
    pub kind: String,
    /// Opaque payload forwarded to handlers
    pub payload: serde_json::Value,
    /// Explicit channel key, when the server provides one
    pub channel: Option<String>,
    /// Trading symbol, for market-data events framed as kind + symbol
    pub symbol: Option<String>,
}

impl InboundFrame {
    /// Parse a raw text frame
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let frame: RawFrame = serde_json::from_str(raw)?;
        if frame.kind == "pong" {
            return Ok(InboundFrame::Pong);
        }
        Ok(InboundFrame::Event(EventFrame {
            kind: frame.kind,
            payload: frame.payload,
            channel: frame.channel,
            symbol: frame.symbol,
        }))
    }
}

impl EventFrame {
    /// Compute the dispatch key for this event
    ///
    /// Uses the explicit `channel` field if present; otherwise derives
    /// `kind.SYMBOL` when a symbol is present; otherwise falls back to the
    /// kind alone.
    pub fn dispatch_key(&self) -> Channel {
        if let Some(channel) = &self.channel {
            return Channel::raw(channel.clone());
        }
        match &self.symbol {
            Some(symbol) => Channel::raw(format!("{}.{}", self.kind, symbol.to_uppercase())),
            None => Channel::raw(self.kind.clone()),
        }
    }
}

/// Price ticker update
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    /// Trading symbol
    pub symbol: String,
    /// Last traded price
    pub price: f64,
    /// Event timestamp (Unix ms)
    pub timestamp: u64,
    /// 24h traded volume
    #[serde(default)]
    pub volume24h: f64,
    /// 24h price change (percent)
    #[serde(default)]
    pub change24h: f64,
    /// 24h high
    #[serde(default)]
    pub high24h: f64,
    /// 24h low
    #[serde(default)]
    pub low24h: f64,
}

/// Order-book update: absolute price levels for both sides
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookUpdate {
    /// Trading symbol
    pub symbol: String,
    /// Bid levels as [price, quantity] pairs, best first
    pub bids: Vec<[f64; 2]>,
    /// Ask levels as [price, quantity] pairs, best first
    pub asks: Vec<[f64; 2]>,
    /// Event timestamp (Unix ms)
    pub timestamp: u64,
}

/// Taker side of a trade print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Buyer was the taker
    Buy,
    /// Seller was the taker
    Sell,
}

/// Executed trade print
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeUpdate {
    /// Trade identifier
    pub id: String,
    /// Trading symbol
    pub symbol: String,
    /// Execution price
    pub price: f64,
    /// Executed quantity
    pub quantity: f64,
    /// Taker side
    pub side: TradeSide,
    /// Event timestamp (Unix ms)
    pub timestamp: u64,
}

/// Order lifecycle event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    /// Order identifier
    pub id: String,
    /// Trading pair symbol
    pub trading_pair_symbol: String,
    /// Order type (market, limit, ...)
    pub order_type: String,
    /// Order side (buy/sell)
    pub side: String,
    /// Limit price, when applicable
    #[serde(default)]
    pub price: f64,
    /// Ordered quantity
    pub quantity: f64,
    /// Quantity filled so far
    #[serde(default)]
    pub filled_quantity: f64,
    /// Quantity still open
    #[serde(default)]
    pub remaining_quantity: f64,
    /// Current order status
    pub status: String,
    /// Creation timestamp (RFC 3339)
    #[serde(default)]
    pub created_at: String,
}

/// Position lifecycle event
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    /// Position identifier
    pub id: String,
    /// Trading symbol
    pub symbol: String,
    /// Position side (long/short)
    pub side: String,
    /// Average entry price
    pub entry_price: f64,
    /// Position size
    pub quantity: f64,
    /// Applied leverage
    #[serde(default)]
    pub leverage: f64,
    /// Allocated margin
    #[serde(default)]
    pub margin: f64,
    /// Liquidation price
    #[serde(default)]
    pub liquidation_price: f64,
    /// Unrealized profit and loss
    #[serde(default, rename = "unrealizedPnL")]
    pub unrealized_pnl: f64,
    /// Current mark price
    #[serde(default)]
    pub current_price: f64,
    /// Position status
    pub status: String,
    /// Open timestamp (RFC 3339)
    #[serde(default)]
    pub opened_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::channel::MarketFamily;

    #[test]
    fn test_subscribe_command_serialization() {
        let cmd = Command::Subscribe {
            channel: Channel::market(MarketFamily::Ticker, "btcusdt"),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["action"], "subscribe");
        assert_eq!(json["channel"], "ticker.BTCUSDT");
    }

    #[test]
    fn test_ping_command_serialization() {
        let json = serde_json::to_string(&Command::Ping).unwrap();
        assert_eq!(json, r#"{"action":"ping"}"#);
    }

    #[test]
    fn test_parse_pong() {
        let frame = InboundFrame::parse(r#"{"kind":"pong"}"#).unwrap();
        assert!(matches!(frame, InboundFrame::Pong));
    }

    #[test]
    fn test_parse_event_with_missing_payload() {
        let frame = InboundFrame::parse(r#"{"kind":"heartbeat"}"#).unwrap();
        match frame {
            InboundFrame::Event(event) => {
                assert_eq!(event.kind, "heartbeat");
                assert!(event.payload.is_null());
            }
            InboundFrame::Pong => panic!("expected event"),
        }
    }

    #[test]
    fn test_parse_failure_on_malformed_json() {
        assert!(InboundFrame::parse("not json").is_err());
        assert!(InboundFrame::parse(r#"{"payload":{}}"#).is_err());
    }

    #[test]
    fn test_dispatch_key_prefers_explicit_channel() {
        let frame = InboundFrame::parse(
            r#"{"kind":"ticker","channel":"ticker.BTCUSDT","symbol":"ethusdt","payload":{}}"#,
        )
        .unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.dispatch_key().as_str(), "ticker.BTCUSDT");
    }

    #[test]
    fn test_dispatch_key_from_kind_and_symbol() {
        let frame =
            InboundFrame::parse(r#"{"kind":"trades","symbol":"btcusdt","payload":{}}"#).unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.dispatch_key().as_str(), "trades.BTCUSDT");
    }

    #[test]
    fn test_dispatch_key_falls_back_to_kind() {
        let frame = InboundFrame::parse(r#"{"kind":"announcement","payload":{}}"#).unwrap();
        let InboundFrame::Event(event) = frame else {
            panic!("expected event");
        };
        assert_eq!(event.dispatch_key().as_str(), "announcement");
    }

    #[test]
    fn test_price_update_deserialization() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "price": 43250.5,
            "timestamp": 1700000000000,
            "volume24h": 1234.5,
            "change24h": -2.1,
            "high24h": 44000.0,
            "low24h": 42800.0
        }"#;
        let update: PriceUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.symbol, "BTCUSDT");
        assert!((update.price - 43250.5).abs() < f64::EPSILON);
        assert!((update.change24h - (-2.1)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_trade_update_deserialization() {
        let json = r#"{
            "id": "t-1",
            "symbol": "ETHUSDT",
            "price": 2250.0,
            "quantity": 0.5,
            "side": "sell",
            "timestamp": 1700000000001
        }"#;
        let trade: TradeUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.id, "t-1");
    }

    #[test]
    fn test_position_update_pnl_field_name() {
        let json = r#"{
            "id": "p-1",
            "symbol": "BTCUSDT",
            "side": "long",
            "entryPrice": 43000.0,
            "quantity": 0.1,
            "unrealizedPnL": 25.05,
            "status": "Open"
        }"#;
        let position: PositionUpdate = serde_json::from_str(json).unwrap();
        assert!((position.unrealized_pnl - 25.05).abs() < f64::EPSILON);
    }
}

//! Channel keys identifying subscribable event streams.
//!
//! A channel is a canonical string key of the form `family.SYMBOL` for
//! market-data streams (symbol upper-cased) or `family.accountId` for
//! account-scoped streams. All canonicalization happens in the constructors
//! here, so call sites with mixed-case symbols cannot produce duplicate
//! channels and duplicate wire subscriptions.

use std::fmt;

use serde::Serialize;

/// Market-data channel families, scoped to a trading symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketFamily {
    /// Price ticker updates
    Ticker,
    /// Order-book deltas
    Orderbook,
    /// Executed trade prints
    Trades,
}

impl MarketFamily {
    /// Wire name of the family
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketFamily::Ticker => "ticker",
            MarketFamily::Orderbook => "orderbook",
            MarketFamily::Trades => "trades",
        }
    }
}

/// Account-scoped channel families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFamily {
    /// Account balance updates
    Account,
    /// Order lifecycle events
    Orders,
    /// Position lifecycle events
    Positions,
}

impl AccountFamily {
    /// Wire name of the family
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountFamily::Account => "account",
            AccountFamily::Orders => "orders",
            AccountFamily::Positions => "positions",
        }
    }
}

/// Canonical key identifying one subscribable event stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Build a market-data channel key, e.g. `ticker.BTCUSDT`
    ///
    /// The symbol is upper-cased so distinct casings map to one channel.
    pub fn market(family: MarketFamily, symbol: &str) -> Self {
        Channel(format!("{}.{}", family.as_str(), symbol.to_uppercase()))
    }

    /// Build an account-scoped channel key, e.g. `orders.acct-123`
    ///
    /// Account identifiers are opaque and used verbatim.
    pub fn account(family: AccountFamily, account_id: &str) -> Self {
        Channel(format!("{}.{}", family.as_str(), account_id))
    }

    /// Build a channel from a raw key, used verbatim
    ///
    /// This is the escape hatch for streams the typed constructors do not
    /// cover and for keys arriving on inbound frames.
    pub fn raw(key: impl Into<String>) -> Self {
        Channel(key.into())
    }

    /// The canonical key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

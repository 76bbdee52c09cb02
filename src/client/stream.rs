//! The streaming client: session lifecycle and the public subscription API.
//!
//! [`TradingSocket`] multiplexes every subscription of the process over one
//! logical WebSocket connection. A spawned driver task exclusively owns the
//! transport; the public handle records handlers in the registry and pushes
//! commands through the outbound queue, so `subscribe`/`unsubscribe` never
//! block. Unexpected disconnects are recovered by a supervised retry loop
//! with a fixed delay, followed by a full resubscription sweep; collaborators
//! simply stop and resume receiving events.
//!
//! # Example
//!
//! ```rust,no_run
//! use trading_stream::{Config, TradingSocket};
//!
//! # async fn example() -> trading_stream::Result<()> {
//! let socket = TradingSocket::new(Config::new("wss://stream.example.com/ws"));
//! socket.connect(Some("bearer-token")).await?;
//!
//! let sub = socket.subscribe_ticker("btcusdt", |update| {
//!     println!("{} @ {}", update.symbol, update.price);
//! });
//!
//! // later
//! sub.unsubscribe();
//! socket.disconnect();
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::{oneshot, watch, Notify};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::client::queue::CommandQueue;
use crate::client::registry::{Handler, HandlerId, SubscriptionRegistry};
use crate::client::router;
use crate::client::transport::{Connection, Transport, WsTransport};
use crate::config::Config;
use crate::error::Error;
use crate::types::{
    AccountFamily, Channel, Command, MarketFamily, OrderBookUpdate, OrderUpdate, PositionUpdate,
    PriceUpdate, TradeUpdate,
};

/// Observable lifecycle state of the streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No session has been started
    #[default]
    Disconnected,
    /// A connection attempt is in flight
    Connecting,
    /// The transport is open and events are flowing
    Connected,
    /// The transport was lost; a reconnect is scheduled
    Reconnecting,
    /// Explicitly shut down; terminal until a fresh `connect`
    Closed,
}

/// State shared between the public handle, subscriptions, and the driver task
struct Shared {
    registry: Mutex<SubscriptionRegistry>,
    queue: Mutex<CommandQueue>,
    /// Wakes the driver when outbound work is queued
    wake: Notify,
    state: watch::Sender<ConnectionState>,
    /// Terminal intent flag for the current session's driver
    shutdown: Mutex<watch::Sender<bool>>,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: Mutex::new(SubscriptionRegistry::new()),
            queue: Mutex::new(CommandQueue::new()),
            wake: Notify::new(),
            state,
            shutdown: Mutex::new(shutdown),
        }
    }

    /// Queue a command and wake the driver; buffered while disconnected
    fn send(&self, command: Command) {
        self.queue.lock().push(command);
        self.wake.notify_one();
    }

    fn unsubscribe(&self, channel: &Channel, id: HandlerId) {
        let emptied = self.registry.lock().unsubscribe(channel, id);
        if emptied {
            self.send(Command::Unsubscribe {
                channel: channel.clone(),
            });
        }
    }

    /// Set the driver-observed state unless the session was closed
    fn transition(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == ConnectionState::Closed {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// One registered handler's interest in a channel
///
/// Returned by every subscribe method. Calling [`unsubscribe`] removes the
/// handler; when it was the channel's last handler, a wire unsubscribe
/// command is emitted. Dropping the handle without calling `unsubscribe`
/// keeps the handler registered for the lifetime of the client.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[must_use = "dropping a Subscription silently keeps its handler registered"]
pub struct Subscription {
    shared: Arc<Shared>,
    channel: Channel,
    id: HandlerId,
}

impl Subscription {
    /// The channel this subscription listens on
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Remove the handler; emits a wire unsubscribe if it was the last one
    pub fn unsubscribe(self) {
        self.shared.unsubscribe(&self.channel, self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish()
    }
}

/// Realtime streaming client multiplexing many subscriptions over one
/// WebSocket connection
///
/// Cheap to share: wrap in `Arc` (or clone the typed subscription helpers'
/// returned handles) and hand it to every UI-state collaborator. All public
/// operations except [`connect`] are non-blocking and synchronous.
///
/// [`connect`]: TradingSocket::connect
pub struct TradingSocket<T: Transport = WsTransport> {
    transport: Arc<T>,
    shared: Arc<Shared>,
    config: Config,
}

impl<T: Transport> fmt::Debug for TradingSocket<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingSocket")
            .field("url", &self.config.url())
            .field("state", &*self.shared.state.borrow())
            .finish()
    }
}

impl TradingSocket<WsTransport> {
    /// Create a client using the production WebSocket transport
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, WsTransport)
    }
}

impl<T: Transport> TradingSocket<T> {
    /// Create a client over a custom transport (used by the test suite)
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared::new()),
            config,
        }
    }

    /// Current session state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Observable session state for the UI layer
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Establish the streaming session
    ///
    /// Resolves (or fails) only for this attempt. After the transport opens
    /// once, connectivity is supervised internally: unexpected disconnects
    /// are retried every [`Config::reconnect_delay`] until [`disconnect`] is
    /// called, and active channels are resubscribed after each reconnect.
    /// If this first attempt fails the error is returned here, but the
    /// supervisor keeps retrying in the background all the same.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionActive`] if a session is already running, or
    /// the transport error of the initial attempt.
    ///
    /// [`disconnect`]: TradingSocket::disconnect
    pub async fn connect(&self, credential: Option<&str>) -> Result<(), Error> {
        let started = self.shared.state.send_if_modified(|state| {
            if matches!(
                *state,
                ConnectionState::Disconnected | ConnectionState::Closed
            ) {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(Error::SessionActive);
        }

        // Fresh terminal-intent flag for this session; a driver from a
        // previous session keeps its own receiver and still observes the
        // `true` its disconnect sent.
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *self.shared.shutdown.lock() = shutdown_tx;

        let (first_tx, first_rx) = oneshot::channel();
        tokio::spawn(run_session(
            Arc::clone(&self.transport),
            Arc::clone(&self.shared),
            self.config.clone(),
            credential.map(String::from),
            shutdown_rx,
            first_tx,
        ));

        first_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Shut the session down
    ///
    /// Cancels any pending reconnect and the keepalive timer, closes the
    /// transport, and clears all subscriptions and queued commands.
    /// Idempotent and irreversible; a new session requires a fresh
    /// [`connect`].
    ///
    /// [`connect`]: TradingSocket::connect
    pub fn disconnect(&self) {
        let _ = self.shared.shutdown.lock().send(true);
        self.shared.state.send_replace(ConnectionState::Closed);
        self.shared.registry.lock().clear();
        self.shared.queue.lock().clear();
    }

    /// Register a handler for an arbitrary channel, receiving raw payloads
    ///
    /// The first handler on a channel emits a wire subscribe command
    /// (buffered while disconnected); later handlers piggyback on the
    /// existing subscription.
    pub fn subscribe_raw(
        &self,
        channel: Channel,
        handler: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Subscription {
        let handler: Handler = Arc::new(handler);
        let (id, first) = self.shared.registry.lock().subscribe(channel.clone(), handler);
        if first {
            self.shared.send(Command::Subscribe {
                channel: channel.clone(),
            });
        }
        Subscription {
            shared: Arc::clone(&self.shared),
            channel,
            id,
        }
    }

    /// Subscribe to price ticker updates for a symbol
    pub fn subscribe_ticker(
        &self,
        symbol: &str,
        handler: impl Fn(PriceUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(
            Channel::market(MarketFamily::Ticker, symbol),
            decoded("ticker", handler),
        )
    }

    /// Subscribe to order-book updates for a symbol
    pub fn subscribe_orderbook(
        &self,
        symbol: &str,
        handler: impl Fn(OrderBookUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(
            Channel::market(MarketFamily::Orderbook, symbol),
            decoded("orderbook", handler),
        )
    }

    /// Subscribe to trade prints for a symbol
    pub fn subscribe_trades(
        &self,
        symbol: &str,
        handler: impl Fn(TradeUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(
            Channel::market(MarketFamily::Trades, symbol),
            decoded("trades", handler),
        )
    }

    /// Subscribe to balance updates for a trading account
    ///
    /// The backend attaches no fixed schema to account events, so the
    /// payload is forwarded as raw JSON.
    pub fn subscribe_account(
        &self,
        account_id: &str,
        handler: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(Channel::account(AccountFamily::Account, account_id), handler)
    }

    /// Subscribe to order lifecycle events for a trading account
    pub fn subscribe_orders(
        &self,
        account_id: &str,
        handler: impl Fn(OrderUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(
            Channel::account(AccountFamily::Orders, account_id),
            decoded("orders", handler),
        )
    }

    /// Subscribe to position lifecycle events for a trading account
    pub fn subscribe_positions(
        &self,
        account_id: &str,
        handler: impl Fn(PositionUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe_raw(
            Channel::account(AccountFamily::Positions, account_id),
            decoded("positions", handler),
        )
    }
}

/// Wrap a typed callback so it decodes the raw payload, dropping (with a
/// log line) payloads that do not match the expected shape
fn decoded<P: DeserializeOwned>(
    family: &'static str,
    handler: impl Fn(P) + Send + Sync + 'static,
) -> impl Fn(serde_json::Value) + Send + Sync + 'static {
    move |payload| match serde_json::from_value(payload) {
        Ok(update) => handler(update),
        Err(e) => warn!(family, error = %e, "dropping payload that failed to decode"),
    }
}

/// How a connection epoch ended
enum EpochEnd {
    /// Explicit shutdown; the session is over
    Shutdown,
    /// Transport loss; schedule a reconnect
    ConnectionLost,
}

/// Session supervisor: owns the transport for the lifetime of one session
///
/// The first attempt's outcome is reported through `first`; every later
/// attempt is a supervised retry whose failures are logged, never surfaced.
async fn run_session<T: Transport>(
    transport: Arc<T>,
    shared: Arc<Shared>,
    config: Config,
    credential: Option<String>,
    mut shutdown: watch::Receiver<bool>,
    first: oneshot::Sender<Result<(), Error>>,
) {
    let mut first = Some(first);
    // The resubscription sweep runs after reconnects only; the initial open
    // relies on commands queued while disconnected.
    let mut reconnecting = false;

    loop {
        if *shutdown.borrow() {
            return;
        }
        shared.transition(ConnectionState::Connecting);

        match transport.connect(config.url(), credential.as_deref()).await {
            Ok(mut conn) => {
                // The session may have been shut down while this attempt was
                // in flight; the shared registry and queue now belong to a
                // successor session, so touch neither.
                if *shutdown.borrow() {
                    conn.close().await;
                    return;
                }
                debug!(url = config.url(), "transport open");
                shared.transition(ConnectionState::Connected);
                if let Some(tx) = first.take() {
                    let _ = tx.send(Ok(()));
                }
                if reconnecting {
                    enqueue_resubscriptions(&shared);
                }

                let end = run_epoch(&shared, &mut shutdown, &mut conn, &config).await;
                conn.close().await;
                if matches!(end, EpochEnd::Shutdown) {
                    return;
                }
                debug!("connection lost, scheduling reconnect");
            }
            Err(e) => match first.take() {
                Some(tx) => {
                    let _ = tx.send(Err(e));
                }
                None => warn!(error = %e, "reconnect attempt failed"),
            },
        }

        reconnecting = true;
        shared.transition(ConnectionState::Reconnecting);
        tokio::select! {
            _ = time::sleep(config.reconnect_delay()) => {}
            _ = shutdown.wait_for(|stop| *stop) => return,
        }
    }
}

/// Queue one fresh subscribe per active channel, skipping channels whose
/// subscribe is already buffered from the disconnected period
fn enqueue_resubscriptions(shared: &Shared) {
    let channels = shared.registry.lock().active_channels();
    let mut queue = shared.queue.lock();
    for channel in channels {
        if !queue.has_pending_subscribe(&channel) {
            queue.push(Command::Subscribe { channel });
        }
    }
}

/// Drive one open connection until shutdown or transport loss
async fn run_epoch<C: Connection>(
    shared: &Shared,
    shutdown: &mut watch::Receiver<bool>,
    conn: &mut C,
    config: &Config,
) -> EpochEnd {
    if *shutdown.borrow() {
        return EpochEnd::Shutdown;
    }
    // Flush everything buffered while disconnected, in enqueue order
    if drain_queue(shared, conn).await.is_err() {
        return EpochEnd::ConnectionLost;
    }

    let mut keepalive = time::interval_at(
        Instant::now() + config.keepalive_interval(),
        config.keepalive_interval(),
    );

    loop {
        enum Step {
            Shutdown,
            Outbound,
            Keepalive,
            Inbound(Option<Result<String, Error>>),
        }

        // The select only picks the step; sends happen after it resolves so
        // the connection is not mutably borrowed by two arms at once.
        let step = tokio::select! {
            _ = shutdown.wait_for(|stop| *stop) => Step::Shutdown,
            _ = shared.wake.notified() => Step::Outbound,
            _ = keepalive.tick() => Step::Keepalive,
            frame = conn.recv() => Step::Inbound(frame),
        };

        match step {
            Step::Shutdown => return EpochEnd::Shutdown,
            Step::Outbound => {
                if drain_queue(shared, conn).await.is_err() {
                    return EpochEnd::ConnectionLost;
                }
            }
            Step::Keepalive => {
                let Ok(frame) = serde_json::to_string(&Command::Ping) else {
                    continue;
                };
                if conn.send(frame).await.is_err() {
                    return EpochEnd::ConnectionLost;
                }
            }
            Step::Inbound(Some(Ok(text))) => router::route(&shared.registry, &text),
            Step::Inbound(Some(Err(e))) => {
                warn!(error = %e, "transport fault");
                return EpochEnd::ConnectionLost;
            }
            Step::Inbound(None) => {
                debug!("transport closed by server");
                return EpochEnd::ConnectionLost;
            }
        }
    }
}

/// Transmit buffered commands in enqueue order
///
/// A command that fails mid-transmission is lost, not retried; if it was a
/// subscribe for a still-active channel the next resubscription sweep
/// replays it.
async fn drain_queue<C: Connection>(shared: &Shared, conn: &mut C) -> Result<(), Error> {
    loop {
        let command = shared.queue.lock().pop();
        let Some(command) = command else {
            return Ok(());
        };
        let frame = serde_json::to_string(&command)?;
        if let Err(e) = conn.send(frame).await {
            warn!(error = %e, "command lost to transport failure");
            return Err(e);
        }
    }
}

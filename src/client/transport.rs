//! Transport abstraction over the duplex text-frame stream.
//!
//! The session driver is generic over [`Transport`] so the whole client can
//! run against an in-memory transport under test. The production
//! implementation, [`WsTransport`], is a thin wrapper over tokio-tungstenite
//! that appends the bearer credential as a `token` query parameter and
//! normalizes the message stream to text frames.

use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Factory for transport connections
///
/// One `connect` call corresponds to one connection epoch; the driver calls
/// it again for every reconnection attempt with the credential supplied at
/// the most recent caller-initiated connect.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport
    type Conn: Connection;

    /// Open a new connection to `url`, authenticating with `credential`
    fn connect(
        &self,
        url: &str,
        credential: Option<&str>,
    ) -> impl Future<Output = Result<Self::Conn, Error>> + Send;
}

/// One established duplex connection
pub trait Connection: Send {
    /// Transmit one text frame
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), Error>> + Send;

    /// Receive the next text frame
    ///
    /// Returns `None` once the connection is closed. A `Some(Err(_))` is a
    /// transport fault and ends the connection epoch.
    fn recv(&mut self) -> impl Future<Output = Option<Result<String, Error>>> + Send;

    /// Close the connection; errors on an already-dead socket are ignored
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Production WebSocket transport backed by tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Conn = WsConnection;

    fn connect(
        &self,
        url: &str,
        credential: Option<&str>,
    ) -> impl Future<Output = Result<Self::Conn, Error>> + Send {
        let request = build_url(url, credential);
        async move {
            let (ws_stream, _response) =
                tokio_tungstenite::connect_async(request?.as_str()).await?;
            let (write, read) = ws_stream.split();
            Ok(WsConnection { write, read })
        }
    }
}

fn build_url(url: &str, credential: Option<&str>) -> Result<Url, Error> {
    let mut url = Url::parse(url)?;
    if let Some(token) = credential {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// One live WebSocket connection
#[derive(Debug)]
pub struct WsConnection {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl Connection for WsConnection {
    fn send(&mut self, frame: String) -> impl Future<Output = Result<(), Error>> + Send {
        async move {
            self.write.send(Message::Text(frame)).await?;
            Ok(())
        }
    }

    fn recv(&mut self) -> impl Future<Output = Option<Result<String, Error>>> + Send {
        async move {
            loop {
                match self.read.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Ping(data)) => {
                        // Answer protocol-level pings in place
                        if let Err(e) = self.write.send(Message::Pong(data)).await {
                            return Some(Err(e.into()));
                        }
                    }
                    Ok(Message::Close(_)) => return None,
                    // Binary, Pong, and raw frames are not part of the protocol
                    Ok(_) => continue,
                    Err(e) => return Some(Err(e.into())),
                }
            }
        }
    }

    fn close(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            let _ = self.write.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_appends_token() {
        let url = build_url("wss://stream.example.com/ws", Some("jwt-abc")).unwrap();
        assert_eq!(url.as_str(), "wss://stream.example.com/ws?token=jwt-abc");
    }

    #[test]
    fn test_build_url_without_token() {
        let url = build_url("ws://localhost:5193", None).unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(build_url("not a url", None).is_err());
    }
}

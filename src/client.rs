//! The WebSocket client: connects to a feed, decodes frames into
//! [`Snapshot`]s, and publishes each new one atomically to subscribers.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::credentials::Credentials;
use crate::logging::Logger;
use crate::model::Session;
use crate::snapshot::Snapshot;

/// An error connecting to or communicating with the feed.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid feed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
    #[error("invalid Sec-WebSocket-Key '{0}'")]
    InvalidKey(String),
    #[error("connecting to feed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("already connected")]
    AlreadyConnected,
}

enum State {
    Disconnected,
    Connected {
        task: JoinHandle<()>,
        shutdown: oneshot::Sender<()>,
    },
}

/// A live feed connection.
///
/// `connect`/`disconnect` manage a single background receive loop;
/// [`Client::snapshots`] hands out a [`watch::Receiver`] that always holds
/// the most recently published [`Snapshot`], wrapped in an [`Arc`] so
/// publishing a new one never blocks or copies the tables themselves.
pub struct Client {
    snapshots_tx: watch::Sender<Arc<Snapshot>>,
    state: Arc<Mutex<State>>,
}

impl Default for Client {
    fn default() -> Self {
        Client::new()
    }
}

impl Client {
    pub fn new() -> Self {
        let (snapshots_tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Client {
            snapshots_tx,
            state: Arc::new(Mutex::new(State::Disconnected)),
        }
    }

    /// A receiver that always observes the most recent snapshot, and is
    /// notified whenever a new one is published.
    pub fn snapshots(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots_tx.subscribe()
    }

    /// Connects to the feed and starts the background receive loop.
    ///
    /// Idempotent in the sense that it never opens a second socket while
    /// one is already running: a second call while connected is rejected
    /// with [`ClientError::AlreadyConnected`] rather than disturbing the
    /// existing connection.
    pub async fn connect(
        &self,
        credentials: &Credentials,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Connected { .. }) {
            return Err(ClientError::AlreadyConnected);
        }

        let request = build_request(credentials)?;
        let (ws, _response) = tokio_tungstenite::connect_async(request).await?;
        logger.info("connected to feed", &[("feed_url", &credentials.feed_url)]);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let snapshots_tx = self.snapshots_tx.clone();
        let state_handle = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            receive_loop(ws, snapshots_tx, logger, shutdown_rx).await;
            // The loop can exit on its own (server close, transport error, close
            // frame) with no `disconnect()` call in sight — reset `state` here
            // so `is_connected()`/a later `connect()` observe the dead socket
            // instead of the stale `Connected` value. If `disconnect()` already
            // raced us to the lock and swapped it out, there is nothing to do.
            let mut state = state_handle.lock().await;
            if matches!(*state, State::Connected { .. }) {
                *state = State::Disconnected;
            }
        });

        *state = State::Connected {
            task,
            shutdown: shutdown_tx,
        };
        Ok(())
    }

    /// Signals the background receive loop to stop and waits for it to
    /// finish. A no-op if not currently connected.
    pub async fn disconnect(&self) {
        // Take the old state and drop the guard before awaiting the task:
        // the task's own completion also locks `state` (to reset itself to
        // `Disconnected` on an organic exit), so holding the guard across
        // `task.await` here would deadlock against it.
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut *state, State::Disconnected)
        };
        if let State::Connected { task, shutdown } = previous {
            let _ = shutdown.send(());
            let _ = task.await;
        }
    }

    /// `true` while the background receive loop is running.
    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, State::Connected { .. })
    }
}

/// The upstream feed ties each connection to a specific, pre-captured
/// `Sec-WebSocket-Key` rather than accepting a freshly generated one per
/// connection, so the auto-generated key from `IntoClientRequest` is
/// overwritten with the one from `credentials`.
fn build_request(
    credentials: &Credentials,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, ClientError> {
    let mut request = credentials
        .feed_url
        .as_str()
        .into_client_request()
        .map_err(|source| ClientError::InvalidUrl {
            url: credentials.feed_url.clone(),
            source,
        })?;

    let key_value = credentials
        .websocket_key
        .parse()
        .map_err(|_| ClientError::InvalidKey(credentials.websocket_key.clone()))?;
    request
        .headers_mut()
        .insert("Sec-WebSocket-Key", key_value);

    Ok(request)
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn receive_loop(
    mut ws: WsStream,
    snapshots_tx: watch::Sender<Arc<Snapshot>>,
    logger: Arc<dyn Logger + Send + Sync>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut session = Session::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                logger.info("disconnect requested, closing feed connection", &[]);
                let _ = ws.close(None).await;
                break;
            }
            frame = ws.next() => {
                match frame {
                    None => {
                        logger.warning("feed connection closed by server", &[]);
                        break;
                    }
                    Some(Err(e)) => {
                        logger.error("feed connection error", &[("error", &e.to_string())]);
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        if let Some(snapshot) = crate::batch::process(&mut session, &text) {
                            let _ = snapshots_tx.send(Arc::new(snapshot));
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        logger.info("feed sent close frame", &[]);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentialProvider;

    #[tokio::test]
    async fn organic_exit_resets_state_to_disconnected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            // No disconnect() call anywhere in this test — the server just
            // closes the stream out from under the client's receive loop.
            let _ = ws.close(None).await;
        });

        let client = Client::new();
        let credentials = Credentials {
            feed_url: format!("ws://{addr}"),
            websocket_key: "dGhlIHNhbXBsZQ==".to_owned(),
        };
        let logger: Arc<dyn Logger + Send + Sync> =
            Arc::new(crate::logging::StdLogger::with_generated_id());
        client.connect(&credentials, logger).await.unwrap();
        assert!(client.is_connected().await);

        let mut observed_disconnected = false;
        for _ in 0..50 {
            if !client.is_connected().await {
                observed_disconnected = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }

        assert!(
            observed_disconnected,
            "client should observe not-running state after the server closes the feed"
        );

        // A fresh connect is accepted, not rejected with AlreadyConnected.
        let listener2 = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr2 = listener2.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener2.accept().await.unwrap();
            let _ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            std::future::pending::<()>().await;
        });
        let credentials2 = Credentials {
            feed_url: format!("ws://{addr2}"),
            websocket_key: "dGhlIHNhbXBsZQ==".to_owned(),
        };
        let logger2: Arc<dyn Logger + Send + Sync> =
            Arc::new(crate::logging::StdLogger::with_generated_id());
        client.connect(&credentials2, logger2).await.unwrap();
        client.disconnect().await;
    }

    #[tokio::test]
    async fn new_client_has_no_subscribers_snapshot_yet() {
        let client = Client::new();
        let snap = client.snapshots().borrow().clone();
        assert!(snap.competitors.is_empty());
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn disconnect_without_connect_is_a_no_op() {
        let client = Client::new();
        client.disconnect().await;
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn connect_while_already_connected_is_rejected() {
        let (_snapshots_tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let _ = shutdown_rx.await;
        });
        let client = Client {
            snapshots_tx: _snapshots_tx,
            state: Arc::new(Mutex::new(State::Connected {
                task,
                shutdown: shutdown_tx,
            })),
        };

        assert!(client.is_connected().await);
        let credentials = Credentials {
            feed_url: "wss://example.test/feed".to_owned(),
            websocket_key: "dGhlIHNhbXBsZQ==".to_owned(),
        };
        let logger: Arc<dyn Logger + Send + Sync> = Arc::new(crate::logging::StdLogger::with_generated_id());
        let err = client.connect(&credentials, logger).await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadyConnected));

        client.disconnect().await;
        assert!(!client.is_connected().await);
    }

    #[test]
    fn build_request_overwrites_the_websocket_key_header() {
        let provider = StaticCredentialProvider::new("wss://example.test/feed", "dGhlIHNhbXBsZQ==");
        let credentials = crate::credentials::CredentialProvider::credentials(&provider).unwrap();
        let request = build_request(&credentials).unwrap();
        let header = request
            .headers()
            .get("Sec-WebSocket-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(header, "dGhlIHNhbXBsZQ==");
    }

    #[test]
    fn build_request_rejects_an_invalid_url() {
        let credentials = Credentials {
            feed_url: "not a url".to_owned(),
            websocket_key: "dGhlIHNhbXBsZQ==".to_owned(),
        };
        assert!(matches!(
            build_request(&credentials),
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}

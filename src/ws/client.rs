//! WebSocket client with lifecycle events and optional reconnection

use super::types::{CloseHandle, WsConfig, WsError, WsMessage, WsSession};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// WebSocket client that reports its lifecycle on the message channel
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Connect and return the session
    ///
    /// This spawns a background task that owns the socket. Every lifecycle
    /// change is reported on the session's receiver: `Connected` once the
    /// handshake completes, `Error` on any failure, `Reconnecting` before each
    /// retry (only when reconnects are enabled) and a final `Disconnected`.
    pub fn connect(&self) -> WsSession {
        let (tx, events) = mpsc::channel(1024);
        let (handle, closed) = CloseHandle::new();
        let config = self.config.clone();

        tokio::spawn(async move {
            Self::run_connection_loop(config, tx, closed).await;
        });

        WsSession { events, handle }
    }

    /// Resolves once a close was requested or the handle was dropped
    async fn close_requested(closed: &mut watch::Receiver<bool>) {
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Run the connection loop, reconnecting while attempts remain
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        mut closed: watch::Receiver<bool>,
    ) {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &tx, &mut closed).await {
                Ok(()) => {
                    tracing::info!(url = %config.url, "WebSocket connection closed cleanly");
                    break;
                }
                Err(e) => {
                    tracing::warn!(url = %config.url, error = %e, "WebSocket connection error");

                    if tx.send(WsMessage::Error(e)).await.is_err() {
                        tracing::debug!("Receiver dropped, stopping connection loop");
                        return;
                    }

                    if reconnect_attempts >= config.max_reconnect_attempts {
                        if config.max_reconnect_attempts > 0 {
                            tracing::error!(url = %config.url, "Max reconnection attempts reached");
                        }
                        break;
                    }

                    reconnect_attempts += 1;
                    let _ = tx
                        .send(WsMessage::Reconnecting {
                            attempt: reconnect_attempts,
                        })
                        .await;

                    tokio::select! {
                        _ = sleep(reconnect_delay) => {}
                        _ = Self::close_requested(&mut closed) => break,
                    }
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                }
            }
        }

        let _ = tx.send(WsMessage::Disconnected).await;
    }

    /// Connect to WebSocket and stream messages until closed or failed
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        closed: &mut watch::Receiver<bool>,
    ) -> Result<(), WsError> {
        if *closed.borrow() {
            return Ok(());
        }

        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = tokio::select! {
            result = connect_async(config.url.as_str()) => {
                result.map_err(|e| WsError::ConnectionFailed(e.to_string()))?
            }
            _ = Self::close_requested(closed) => return Ok(()),
        };

        let (mut write, mut read) = ws_stream.split();

        tracing::info!(url = %config.url, "WebSocket connected");

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!(url = %config.url, "Received close frame");
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(WsError::StreamFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::StreamFailed("Stream ended unexpectedly".into()));
                        }
                        _ => {}
                    }
                }

                _ = Self::close_requested(closed) => {
                    tracing::debug!(url = %config.url, "Close requested");
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::StreamFailed("Pong timeout".into()));
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_ws_client_creation() {
        let client = WsClient::with_url("wss://example.com");
        assert_eq!(client.url(), "wss://example.com");
    }

    #[test]
    fn test_ws_client_with_config() {
        let config = WsConfig::new("wss://test.com")
            .max_reconnects(5)
            .ping_interval(Duration::from_secs(15));

        let client = WsClient::new(config);
        assert_eq!(client.url(), "wss://test.com");
        assert_eq!(client.config.max_reconnect_attempts, 5);
        assert_eq!(client.config.ping_interval, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_disconnect() {
        // nothing listens on port 1
        let client = WsClient::new(WsConfig::new("ws://127.0.0.1:1"));
        let mut session = client.connect();

        let events = tokio::time::timeout(Duration::from_secs(5), async {
            let mut events = Vec::new();
            while let Some(msg) = session.events.recv().await {
                events.push(msg);
            }
            events
        })
        .await
        .expect("Test timed out");

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], WsMessage::Error(WsError::ConnectionFailed(_))));
        assert!(matches!(events[1], WsMessage::Disconnected));
    }

    #[tokio::test]
    async fn test_reconnect_attempts_are_announced() {
        let client = WsClient::new(
            WsConfig::new("ws://127.0.0.1:1")
                .max_reconnects(2)
                .initial_delay(Duration::from_millis(10)),
        );
        let mut session = client.connect();

        let mut attempts = Vec::new();
        let mut errors = 0;
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(msg) = session.events.recv().await {
                match msg {
                    WsMessage::Reconnecting { attempt } => attempts.push(attempt),
                    WsMessage::Error(_) => errors += 1,
                    WsMessage::Disconnected => break,
                    _ => {}
                }
            }
        })
        .await
        .expect("Test timed out");

        assert_eq!(attempts, vec![1, 2]);
        assert_eq!(errors, 3);
    }

    #[tokio::test]
    async fn test_close_before_connect() {
        let client = WsClient::with_url("ws://127.0.0.1:1");
        let mut session = client.connect();
        session.handle.close();

        let mut saw_disconnect = false;
        tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(msg) = session.events.recv().await {
                if matches!(msg, WsMessage::Disconnected) {
                    saw_disconnect = true;
                }
            }
        })
        .await
        .expect("Test timed out");

        assert!(saw_disconnect);
    }
}

//! WebSocket types and configuration

use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Reconnection attempts after a failure (0 = never reconnect)
    pub max_reconnect_attempts: u32,
    /// Initial delay before first reconnection attempt
    pub initial_reconnect_delay: Duration,
    /// Maximum delay between reconnection attempts
    pub max_reconnect_delay: Duration,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 0,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Same settings, different URL
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }

    /// Set maximum reconnection attempts
    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    /// Set initial reconnection delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    /// Set maximum reconnection delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }
}

/// Transport lifecycle events and payloads
#[derive(Debug, Clone)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Connection established
    Connected,
    /// Connection attempt or live stream failed
    Error(WsError),
    /// Reconnecting after failure
    Reconnecting { attempt: u32 },
    /// Connection closed for good
    Disconnected,
}

/// WebSocket errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WsError {
    /// Could not establish the connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Established stream broke
    #[error("Stream failed: {0}")]
    StreamFailed(String),
    /// Send failed
    #[error("Send failed: {0}")]
    SendFailed(String),
}

/// Requests a graceful close of one transport session
#[derive(Debug)]
pub struct CloseHandle {
    tx: watch::Sender<bool>,
}

impl CloseHandle {
    /// Create a handle and the signal the transport task listens on
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    /// Ask the transport to close; repeated calls are no-ops
    pub fn close(&self) {
        self.tx.send_if_modified(|closed| !std::mem::replace(closed, true));
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// One open transport: its event stream plus the handle that closes it
#[derive(Debug)]
pub struct WsSession {
    pub events: mpsc::Receiver<WsMessage>,
    pub handle: CloseHandle,
}

impl WsSession {
    /// Build a session not backed by a socket, returning the far ends
    ///
    /// Used by in-process transports: the sender injects events and the
    /// receiver observes close requests.
    pub fn channel(capacity: usize) -> (Self, mpsc::Sender<WsMessage>, watch::Receiver<bool>) {
        let (tx, events) = mpsc::channel(capacity);
        let (handle, closed) = CloseHandle::new();
        (Self { events, handle }, tx, closed)
    }
}

//! WebSocket transport
//!
//! Provides the `Transport` seam the engine opens per-symbol sessions through,
//! and the tungstenite-backed client behind the production implementation.

mod client;
mod types;

pub use client::WsClient;
pub use types::{CloseHandle, WsConfig, WsError, WsMessage, WsSession};

use async_trait::async_trait;

/// Opens streaming sessions to an endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Begin connecting to `url`; progress is reported on the session's events
    async fn open(&self, url: &str) -> WsSession;
}

/// Transport backed by real WebSocket connections
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    /// Settings shared by every session; the URL is replaced per session
    config: WsConfig,
}

impl WsTransport {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> WsSession {
        WsClient::new(self.config.with_url(url)).connect()
    }
}

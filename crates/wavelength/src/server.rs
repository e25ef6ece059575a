//! `WavelengthServer` builder and server loop.
//!
//! This is the entry point for running a Wavelength server. It ties
//! together all the layers: transport → protocol → session → room, and
//! serves the health endpoint next to them.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use wavelength_room::{CardSourceFactory, RoomConfig};
use wavelength_session::SessionConfig;
use wavelength_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::health::health_router;
use crate::{ServerConfig, ServerContext, WavelengthError};

/// Builder for configuring and starting a Wavelength server.
///
/// # Example
///
/// ```rust,no_run
/// use wavelength::prelude::*;
///
/// # async fn start() -> Result<(), WavelengthError> {
/// let server = WavelengthServer::builder()
///     .bind("0.0.0.0:3000")
///     .health_bind("0.0.0.0:3001")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct WavelengthServerBuilder {
    bind_addr: String,
    health_addr: String,
    room_config: RoomConfig,
    session_config: SessionConfig,
    card_source: Option<CardSourceFactory>,
}

impl WavelengthServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Creates a builder listening where `config` says.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_address.clone(),
            health_addr: config.health_bind_address.clone(),
            room_config: RoomConfig::default(),
            session_config: SessionConfig::default(),
            card_source: None,
        }
    }

    /// Sets the WebSocket address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the health endpoint address to bind to.
    pub fn health_bind(mut self, addr: &str) -> Self {
        self.health_addr = addr.to_string();
        self
    }

    /// Sets the rules every new room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Replaces the built-in spectrum deck.
    pub fn card_source(mut self, factory: CardSourceFactory) -> Self {
        self.card_source = Some(factory);
        self
    }

    /// Binds both listeners.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`, which is what the browser
    /// client speaks.
    pub async fn build(self) -> Result<WavelengthServer, WavelengthError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let health = TcpListener::bind(&self.health_addr)
            .await
            .map_err(|source| WavelengthError::Health {
                addr: self.health_addr.clone(),
                source,
            })?;

        let ctx = Arc::new(ServerContext::new(
            self.room_config,
            self.session_config,
            self.card_source,
        ));

        Ok(WavelengthServer {
            transport,
            health,
            ctx,
        })
    }
}

impl Default for WavelengthServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Wavelength server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WavelengthServer {
    transport: WebSocketTransport,
    health: TcpListener,
    ctx: Arc<ServerContext>,
}

impl WavelengthServer {
    /// Creates a new builder.
    pub fn builder() -> WavelengthServerBuilder {
        WavelengthServerBuilder::new()
    }

    /// Returns the WebSocket address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the health endpoint address.
    pub fn health_addr(&self) -> std::io::Result<SocketAddr> {
        self.health.local_addr()
    }

    /// Shared state, for inspection.
    pub fn context(&self) -> Arc<ServerContext> {
        Arc::clone(&self.ctx)
    }

    /// Runs the server accept loop.
    ///
    /// Serves `GET /health` on its own task, then accepts incoming
    /// connections and spawns a handler task for each. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), WavelengthError> {
        let health_addr = self.health_addr().ok();
        let app = health_router(Arc::clone(&self.ctx));
        let listener = self.health;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "health endpoint stopped");
            }
        });

        tracing::info!(
            addr = ?self.transport.local_addr().ok(),
            health_addr = ?health_addr,
            "Wavelength server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, ctx).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

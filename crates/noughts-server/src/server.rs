//! Core server: accepts WebSocket connections and feeds them to the router.
//!
//! Each connection runs as two tasks. The reader decodes inbound frames and
//! dispatches them; the writer drains the connection's outbound queue onto
//! the socket, so a slow peer never stalls another connection's handler.

use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionRegistry};
use crate::router::ActionRouter;
use crate::session::SessionRegistry;
use crate::transport::websocket;
use futures_util::{SinkExt, StreamExt};
use noughts_core::{codec, NoughtsResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The noughts server instance.
pub struct NoughtsServer {
    config: ServerConfig,
    router: Arc<ActionRouter>,
}

impl NoughtsServer {
    pub fn new(config: ServerConfig) -> Self {
        let sessions = Arc::new(SessionRegistry::new(config.board_size, config.max_sessions));
        let connections = Arc::new(ConnectionRegistry::new());
        Self {
            config,
            router: Arc::new(ActionRouter::new(sessions, connections)),
        }
    }

    /// Bind the configured address and serve until the listener closes.
    pub async fn run(self) -> NoughtsResult<()> {
        let (addr, ws_rx) = websocket::start_listener(self.config.bind_addr()?).await?;
        info!(
            addr = %addr,
            board_size = self.config.board_size,
            max_sessions = self.config.max_sessions,
            "noughts-server ready"
        );
        self.serve(ws_rx).await
    }

    /// Serve connections yielded by an already started listener.
    pub async fn serve(self, mut ws_rx: mpsc::Receiver<websocket::WebSocketConnection>) -> NoughtsResult<()> {
        let server = Arc::new(self);
        while let Some(ws_conn) = ws_rx.recv().await {
            let srv = server.clone();
            tokio::spawn(async move {
                srv.handle_websocket(ws_conn).await;
            });
        }
        info!("listener closed, shutting down");
        Ok(())
    }

    async fn handle_websocket(&self, conn: websocket::WebSocketConnection) {
        let remote = conn.remote_addr;
        let (connection, mut outbound_rx) = Connection::channel(self.router.connections().next_id());
        let conn_id = connection.id();
        info!(remote = %remote, conn_id = %conn_id, "client connected");

        let (mut sink, mut stream) = conn.ws_stream.split();

        let writer = tokio::spawn(async move {
            while let Some(envelope) = outbound_rx.recv().await {
                let text = match codec::encode(&envelope) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(conn_id = %conn_id, error = %e, "failed to encode envelope");
                        continue;
                    }
                };
                if let Err(e) = websocket::ws_send_text(&mut sink, text).await {
                    debug!(conn_id = %conn_id, error = %e, "writer stopped");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        self.router.on_connect(connection.clone()).await;

        loop {
            match websocket::ws_recv_text(&mut stream).await {
                Ok(Some(text)) => self.router.dispatch(&connection, &text).await,
                Ok(None) => {
                    debug!(conn_id = %conn_id, "peer closed");
                    break;
                }
                Err(e) => {
                    debug!(conn_id = %conn_id, error = %e, "read loop ended");
                    break;
                }
            }
        }

        self.router.on_disconnect(&connection).await;
        // Last sender gone: the writer flushes what is queued and exits.
        drop(connection);
        if let Err(e) = writer.await {
            debug!(conn_id = %conn_id, error = %e, "writer task failed");
        }
        info!(remote = %remote, conn_id = %conn_id, "client disconnected");
    }
}

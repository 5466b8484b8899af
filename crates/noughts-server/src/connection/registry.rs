//! Registry of live connections.
//!
//! Tracks every accepted socket by [`ConnectionId`] and fans envelopes out
//! to all of them, optionally excluding some.

use super::{Connection, ConnectionId};
use noughts_core::Envelope;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate a fresh connection id.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Start tracking a connection.
    pub async fn connect(&self, connection: Connection) {
        let id = connection.id();
        self.connections.write().await.insert(id, connection);
        debug!(conn_id = %id, "connection registered");
    }

    /// Stop tracking a connection. Returns `false` if it was not tracked.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(&id).is_some();
        if removed {
            debug!(conn_id = %id, "connection unregistered");
        }
        removed
    }

    /// Send `envelope` to every tracked connection not in `exclude`.
    ///
    /// Works on a snapshot taken at call time, so the lock is not held
    /// across sends. Delivery is best effort: a peer with a full queue misses
    /// this envelope, and a closed peer is dropped from the registry.
    /// Returns the number of successful deliveries.
    pub async fn broadcast(&self, envelope: &Envelope, exclude: &[ConnectionId]) -> usize {
        let targets: Vec<Connection> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|c| !exclude.contains(&c.id()))
                .cloned()
                .collect()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for connection in &targets {
            match connection.send(envelope.clone()) {
                Ok(()) => delivered += 1,
                Err(e) if connection.is_closed() => {
                    debug!(conn_id = %connection.id(), error = %e, "broadcast to closed connection, dropping it");
                    dead.push(connection.id());
                }
                Err(e) => {
                    debug!(conn_id = %connection.id(), error = %e, "broadcast skipped");
                }
            }
        }

        if !dead.is_empty() {
            let mut connections = self.connections.write().await;
            for id in &dead {
                connections.remove(id);
            }
        }

        delivered
    }

    /// Number of tracked connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::OUTBOUND_QUEUE;
    use noughts_core::ServerAction;

    #[tokio::test]
    async fn connect_and_disconnect() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = Connection::channel(registry.next_id());
        let id = conn.id();
        registry.connect(conn).await;
        assert_eq!(registry.count().await, 1);

        assert!(registry.disconnect(id).await);
        assert!(!registry.disconnect(id).await);
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = ConnectionRegistry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn broadcast_skips_excluded() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = Connection::channel(registry.next_id());
        let (b, mut rx_b) = Connection::channel(registry.next_id());
        let a_id = a.id();
        registry.connect(a).await;
        registry.connect(b).await;

        // Registered after the first two, but before the broadcast.
        let (c, mut rx_c) = Connection::channel(registry.next_id());
        registry.connect(c).await;

        let env = Envelope::with_games(ServerAction::Create, vec!["g1".into()]);
        let delivered = registry.broadcast(&env, &[a_id]).await;

        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), env);
        assert_eq!(rx_c.try_recv().unwrap(), env);
    }

    #[tokio::test]
    async fn broadcast_drops_closed_connections() {
        let registry = ConnectionRegistry::new();
        let (alive, mut rx_alive) = Connection::channel(registry.next_id());
        let (gone, rx_gone) = Connection::channel(registry.next_id());
        registry.connect(alive).await;
        registry.connect(gone).await;
        drop(rx_gone);

        let delivered = registry.broadcast(&Envelope::online(2), &[]).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx_alive.try_recv().unwrap(), Envelope::online(2));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn broadcast_skips_stalled_reader_without_waiting() {
        let registry = ConnectionRegistry::new();
        let (stalled, _rx_stalled) = Connection::channel(registry.next_id());
        let (reader, mut rx_reader) = Connection::channel(registry.next_id());
        for _ in 0..OUTBOUND_QUEUE {
            stalled.send(Envelope::online(0)).unwrap();
        }
        registry.connect(stalled).await;
        registry.connect(reader).await;

        let delivered = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            registry.broadcast(&Envelope::online(2), &[]),
        )
        .await
        .expect("broadcast waited on a full queue");

        assert_eq!(delivered, 1);
        assert_eq!(rx_reader.try_recv().unwrap(), Envelope::online(2));
        // Still connected; it only missed one envelope.
        assert_eq!(registry.count().await, 2);
    }
}

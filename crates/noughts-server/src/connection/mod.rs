//! Live client connections: outbound handles and the registry that tracks them.

pub mod registry;

pub use registry::ConnectionRegistry;

use noughts_core::{Envelope, NoughtsError, NoughtsResult};
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Capacity of each connection's outbound queue.
pub const OUTBOUND_QUEUE: usize = 64;

/// Stable token identifying one accepted socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cloneable handle used to address one connection.
///
/// Sending only enqueues the envelope; the connection's writer task
/// serializes it onto the socket. Enqueueing never waits, so callers may
/// send while holding a game or registry lock.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Envelope>,
}

impl Connection {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Envelope>) -> Self {
        Self { id, tx }
    }

    /// Build a connection together with the receiving end of its queue.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        (Self::new(id, tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an envelope for delivery.
    ///
    /// A full queue means the peer stopped reading; the envelope is dropped
    /// and the call fails instead of waiting for room.
    pub fn send(&self, envelope: Envelope) -> NoughtsResult<()> {
        self.tx.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => {
                NoughtsError::Transport(format!("connection {} outbound queue full", self.id))
            }
            TrySendError::Closed(_) => {
                NoughtsError::Transport(format!("connection {} closed", self.id))
            }
        })
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

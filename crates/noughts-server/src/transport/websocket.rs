//! WebSocket listener using tokio-tungstenite.
//!
//! Every accepted socket carries one JSON envelope per text frame.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use noughts_core::{NoughtsError, NoughtsResult, MAX_FRAME_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

/// Upgrades still pending after this long are abandoned.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepted sockets waiting for the server to pick them up.
const ACCEPT_BACKLOG: usize = 64;

/// A handle to an accepted WebSocket connection.
pub struct WebSocketConnection {
    pub ws_stream: WebSocketStream<TcpStream>,
    pub remote_addr: SocketAddr,
}

/// Bind `bind_addr` and start accepting players.
///
/// Returns the bound address (port 0 resolves here) and a receiver that
/// yields connections whose upgrade has completed. Each upgrade runs on its
/// own task so a client stuck mid-handshake does not hold up the lobby.
pub async fn start_listener(
    bind_addr: SocketAddr,
) -> NoughtsResult<(SocketAddr, mpsc::Receiver<WebSocketConnection>)> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| NoughtsError::Transport(format!("bind {bind_addr} failed: {e}")))?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "accepting players");

    let (tx, rx) = mpsc::channel(ACCEPT_BACKLOG);
    tokio::spawn(async move {
        while !tx.is_closed() {
            match listener.accept().await {
                Ok((stream, remote)) => {
                    tokio::spawn(upgrade(stream, remote, tx.clone()));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            }
        }
        debug!(addr = %local_addr, "server gone, listener stopped");
    });

    Ok((local_addr, rx))
}

async fn upgrade(stream: TcpStream, remote: SocketAddr, tx: mpsc::Sender<WebSocketConnection>) {
    let ws_stream = match timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::accept_async(stream)).await {
        Ok(Ok(ws_stream)) => ws_stream,
        Ok(Err(e)) => {
            debug!(remote = %remote, error = %e, "not a WebSocket client");
            return;
        }
        Err(_) => {
            debug!(remote = %remote, "WebSocket upgrade timed out");
            return;
        }
    };
    let conn = WebSocketConnection {
        ws_stream,
        remote_addr: remote,
    };
    if tx.send(conn).await.is_err() {
        debug!(remote = %remote, "server gone, dropping upgraded socket");
    }
}

/// Send one text frame.
pub async fn ws_send_text<S>(sink: &mut S, text: String) -> NoughtsResult<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| NoughtsError::Transport(format!("WS send failed: {e}")))
}

/// Receive the next text frame.
///
/// Returns `None` once the peer closes. Binary frames are skipped; pings are
/// answered by tungstenite on the next read or write. Text longer than
/// [`MAX_FRAME_SIZE`] is an error.
pub async fn ws_recv_text<S>(stream: &mut S) -> NoughtsResult<Option<String>>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if text.len() > MAX_FRAME_SIZE {
                    return Err(NoughtsError::Codec(format!(
                        "WS frame too large: {} bytes (max {})",
                        text.len(),
                        MAX_FRAME_SIZE
                    )));
                }
                return Ok(Some(text.to_string()));
            }
            Some(Ok(Message::Close(_))) => return Ok(None),
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                return Err(NoughtsError::Transport(format!("WS recv failed: {e}")));
            }
            None => return Ok(None),
        }
    }
}

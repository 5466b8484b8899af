//! Session lifecycle management.
//!
//! Owns every [`GameSession`], keyed by game id in insertion order. The map
//! sits behind one lock covering create, join, remove and clear; each game
//! additionally has its own lock for move processing. Lock order is always
//! registry first, then game.

use super::game::{GameSession, Player};
use crate::connection::Connection;
use indexmap::IndexMap;
use noughts_core::{NoughtsError, NoughtsResult, DEFAULT_BOARD_SIZE};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default cap on concurrently registered games.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// A registered game, shared between the registry and in-flight handlers.
pub type SharedSession = Arc<Mutex<GameSession>>;

pub struct SessionRegistry {
    sessions: Mutex<IndexMap<String, SharedSession>>,
    board_size: usize,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(board_size: usize, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(IndexMap::new()),
            board_size,
            max_sessions,
        }
    }

    /// Register a new game with `connection` as its X player.
    ///
    /// An id that is already registered is rejected rather than replaced.
    pub async fn create(&self, connection: Connection, session_id: &str) -> NoughtsResult<SharedSession> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(session_id) {
            return Err(NoughtsError::DuplicateSessionId(session_id.to_string()));
        }
        if sessions.len() >= self.max_sessions {
            return Err(NoughtsError::TooManySessions(self.max_sessions));
        }

        let owner = connection.id();
        let session = Arc::new(Mutex::new(GameSession::new(
            session_id,
            connection,
            self.board_size,
        )));
        sessions.insert(session_id.to_string(), session.clone());
        info!(game_id = %session_id, conn_id = %owner, "game created");

        Ok(session)
    }

    /// Seat `connection` as the O player of an existing game.
    pub async fn join(&self, session_id: &str, connection: Connection) -> NoughtsResult<SharedSession> {
        let sessions = self.sessions.lock().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| NoughtsError::SessionNotFound(session_id.to_string()))?
            .clone();

        let conn_id = connection.id();
        session.lock().await.add_player(connection)?;
        info!(game_id = %session_id, conn_id = %conn_id, "player joined");

        Ok(session)
    }

    /// Look up a game by id.
    pub async fn get(&self, session_id: &str) -> NoughtsResult<SharedSession> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| NoughtsError::SessionNotFound(session_id.to_string()))
    }

    /// Remove a game. Missing ids are ignored.
    pub async fn remove(&self, session_id: &str) {
        if self.sessions.lock().await.shift_remove(session_id).is_some() {
            info!(game_id = %session_id, "game removed");
        }
    }

    /// Remove every game the connection plays in.
    ///
    /// Returns all players of the removed games, including the departing
    /// one, so the caller can notify whoever is left behind.
    pub async fn clear(&self, connection: &Connection) -> Vec<Player> {
        let mut sessions = self.sessions.lock().await;

        let mut doomed = Vec::new();
        for (id, session) in sessions.iter() {
            let game = session.lock().await;
            if game.player_for(connection.id()).is_some() {
                doomed.push((id.clone(), game.players().to_vec()));
            }
        }

        let mut players = Vec::new();
        for (id, game_players) in doomed {
            sessions.shift_remove(&id);
            debug!(game_id = %id, conn_id = %connection.id(), "game cleared");
            players.extend(game_players);
        }

        players
    }

    /// Registered game ids in insertion order.
    pub async fn list_ids(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    /// Number of registered games.
    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE, DEFAULT_MAX_SESSIONS)
    }
}

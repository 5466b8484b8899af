//! Action routing: decodes client envelopes and runs the matching handler.
//!
//! Every handler failure is turned into an `error` reply to the sender;
//! nothing here closes a connection.

use crate::connection::{Connection, ConnectionRegistry};
use crate::session::{Player, SessionRegistry};
use noughts_core::messages::ServerAction;
use noughts_core::{codec, notice, Action, ClientEnvelope, Envelope, NoughtsError, NoughtsResult, Symbol};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ActionRouter {
    sessions: Arc<SessionRegistry>,
    connections: Arc<ConnectionRegistry>,
}

impl ActionRouter {
    pub fn new(sessions: Arc<SessionRegistry>, connections: Arc<ConnectionRegistry>) -> Self {
        Self {
            sessions,
            connections,
        }
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Register a freshly accepted connection and announce the new count.
    pub async fn on_connect(&self, connection: Connection) {
        self.connections.connect(connection).await;
        self.broadcast_online().await;
    }

    /// Tear down everything bound to a closed connection.
    ///
    /// Opponents in the removed games get an abandonment notice, then the
    /// connection is unregistered and the new count is announced.
    pub async fn on_disconnect(&self, connection: &Connection) {
        let players = self.sessions.clear(connection).await;
        if !players.is_empty() {
            let games = self.sessions.list_ids().await;
            for opponent in players.iter().filter(|p| !p.is_bound_to(connection.id())) {
                let departed = opponent.symbol.opposite();
                let envelope = Envelope::with_games(ServerAction::Close, games.clone())
                    .message(notice::player_left(departed));
                notify(&opponent.connection, envelope);
            }
        }

        self.connections.disconnect(connection.id()).await;
        self.broadcast_online().await;
    }

    /// Handle one inbound text frame from `connection`.
    pub async fn dispatch(&self, connection: &Connection, text: &str) {
        let envelope: ClientEnvelope = match codec::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(conn_id = %connection.id(), error = %e, "undecodable message");
                notify(connection, Envelope::error(notice::INVALID_MESSAGE));
                return;
            }
        };

        let action = match envelope.action() {
            Ok(action) => action,
            Err(e) => {
                self.action_not_allowed(connection, &e);
                return;
            }
        };

        let result = match action {
            Action::New => self.handle_new(connection).await,
            Action::Create => self.handle_create(connection, &envelope).await,
            Action::Join => self.handle_join(connection, &envelope).await,
            Action::Move => self.handle_move(connection, &envelope).await,
            Action::Close => self.handle_close(connection, &envelope).await,
        };

        if let Err(e) = result {
            debug!(conn_id = %connection.id(), %action, error = %e, "action rejected");
            notify(connection, Envelope::error(rejection(action, &e)));
        }
    }

    /// Fallback for unknown actions.
    fn action_not_allowed(&self, connection: &Connection, error: &NoughtsError) {
        warn!(conn_id = %connection.id(), error = %error, "invalid action");
        notify(connection, Envelope::error(error.to_string()));
    }

    async fn handle_new(&self, connection: &Connection) -> NoughtsResult<()> {
        let games = self.sessions.list_ids().await;
        notify(connection, Envelope::with_games(ServerAction::New, games));
        Ok(())
    }

    async fn handle_create(&self, connection: &Connection, envelope: &ClientEnvelope) -> NoughtsResult<()> {
        let game_id = envelope.require_game_id()?;
        self.sessions.create(connection.clone(), game_id).await?;

        let listing = Envelope::with_games(ServerAction::Create, self.sessions.list_ids().await);
        let delivered = self.connections.broadcast(&listing, &[connection.id()]).await;
        debug!(game_id, delivered, "lobby listing broadcast");
        Ok(())
    }

    async fn handle_join(&self, connection: &Connection, envelope: &ClientEnvelope) -> NoughtsResult<()> {
        let game_id = envelope.require_game_id()?;
        let session = self.sessions.join(game_id, connection.clone()).await?;
        let games = self.sessions.list_ids().await;

        let game = session.lock().await;
        for player in game.players() {
            let mut start = Envelope::with_games(ServerAction::Join, games.clone())
                .message(notice::turn(player.symbol, Symbol::X));
            start.player = Some(player.symbol);
            start.other_player = Some(player.symbol.opposite());
            start.is_player_move = Some(player.symbol == Symbol::X);
            notify(&player.connection, start);
        }
        info!(game_id, "game started");
        Ok(())
    }

    async fn handle_move(&self, connection: &Connection, envelope: &ClientEnvelope) -> NoughtsResult<()> {
        let game_id = envelope.require_game_id()?;
        let cell = envelope.require_cell()?;
        let session = self.sessions.get(game_id).await?;
        // Listing first: the registry lock is never taken under a game lock.
        let games = self.sessions.list_ids().await;

        // The game lock is held through the notifications so both players
        // see moves in the order they were applied. Sends never wait.
        let mut game = session.lock().await;
        let own = game
            .player_for(connection.id())
            .map(|p| p.symbol)
            .ok_or_else(|| NoughtsError::NotAPlayer(game_id.to_string()))?;
        let symbol = envelope.state.unwrap_or(own);
        if symbol != own {
            return Err(NoughtsError::NotYourTurn(symbol));
        }

        let applied = game.process_move(cell, symbol)?;
        let is_tied = game.is_tied();
        debug!(game_id, cell, %symbol, row = applied.row, col = applied.col, "move applied");

        let to_move = symbol.opposite();
        for player in game.players() {
            let mut echo = Envelope::with_games(ServerAction::Move, games.clone())
                .message(notice::turn(player.symbol, to_move));
            echo.is_player_move = Some(!player.is_bound_to(connection.id()));
            echo.cell = Some(cell);
            echo.state = applied.symbol;
            notify(&player.connection, echo);
        }

        if game.is_active() {
            return Ok(());
        }

        let winner = game.winner().map(|p| p.symbol);
        info!(game_id, winner = ?winner, is_tied, line = ?game.winning_combo(), "game finished");
        for player in game.players() {
            let message = match winner {
                _ if is_tied => notice::GAME_TIED.to_string(),
                Some(w) if w == player.symbol => notice::winner(w),
                Some(w) => notice::loser(w),
                None => notice::GAME_TIED.to_string(),
            };
            let mut finish = Envelope::with_games(ServerAction::Finish, games.clone()).message(message);
            finish.is_player_move = Some(false);
            finish.winner = winner;
            finish.has_winner = Some(game.has_winner());
            finish.is_tied = Some(is_tied);
            notify(&player.connection, finish);
        }
        Ok(())
    }

    async fn handle_close(&self, connection: &Connection, envelope: &ClientEnvelope) -> NoughtsResult<()> {
        let game_id = envelope.require_game_id()?;
        let session = self.sessions.get(game_id).await?;

        let (departing, abandoned): (Option<Player>, Option<Player>) = {
            let game = session.lock().await;
            let departing = match envelope.state {
                Some(symbol) => game.find_player(symbol),
                None => game.player_for(connection.id()),
            }
            .cloned();
            let abandoned = departing
                .as_ref()
                .and_then(|d| game.find_player(d.symbol.opposite()))
                .cloned();
            (departing, abandoned)
        };

        self.sessions.remove(game_id).await;
        let games = self.sessions.list_ids().await;

        let ack_to = departing.as_ref().map_or(connection, |p| &p.connection);
        notify(ack_to, Envelope::with_games(ServerAction::Close, games.clone()));

        if let (Some(departing), Some(abandoned)) = (departing, abandoned) {
            let envelope = Envelope::with_games(ServerAction::Close, games)
                .message(notice::player_left(departing.symbol));
            notify(&abandoned.connection, envelope);
        }
        Ok(())
    }

    async fn broadcast_online(&self) {
        let count = self.connections.count().await;
        self.connections.broadcast(&Envelope::online(count), &[]).await;
    }
}

/// Text of the `error` reply for a failed action.
fn rejection(action: Action, error: &NoughtsError) -> String {
    match (action, error) {
        (Action::Move | Action::Close, NoughtsError::SessionNotFound(_)) => notice::GAME_CLOSED.to_string(),
        (_, NoughtsError::SessionNotFound(_)) => notice::GAME_NOT_FOUND.to_string(),
        (_, NoughtsError::SessionFull(_)) => notice::GAME_ALREADY_STARTED.to_string(),
        (_, NoughtsError::DuplicatePlayer(_)) => notice::ALREADY_IN_GAME.to_string(),
        (_, NoughtsError::DuplicateSessionId(_)) => notice::GAME_ID_TAKEN.to_string(),
        (_, NoughtsError::NotAPlayer(_)) => notice::NOT_A_PLAYER.to_string(),
        (_, other) => other.to_string(),
    }
}

/// Best-effort send; a closed peer is cleaned up by its own disconnect.
fn notify(connection: &Connection, envelope: Envelope) {
    if let Err(e) = connection.send(envelope) {
        debug!(conn_id = %connection.id(), error = %e, "notification dropped");
    }
}

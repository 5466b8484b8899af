//! A single two-player game: board, players, and the win/tie state machine.
//!
//! `WaitingForPlayer → Active → Won | Tied`. Closing a game is handled by
//! the registry, which simply drops it.

use crate::connection::{Connection, ConnectionId};
use noughts_core::{Board, Coord, Move, NoughtsError, NoughtsResult, Symbol};

/// Maximum number of players in one game.
pub const MAX_PLAYERS: usize = 2;

/// A participant in one game.
///
/// Equality is by symbol; the connection is only used for addressing.
#[derive(Debug, Clone)]
pub struct Player {
    pub symbol: Symbol,
    pub connection: Connection,
}

impl Player {
    pub fn new(symbol: Symbol, connection: Connection) -> Self {
        Self { symbol, connection }
    }

    /// Whether this player is bound to the given connection.
    pub fn is_bound_to(&self, id: ConnectionId) -> bool {
        self.connection.id() == id
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Player {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForPlayer,
    Active,
    Won,
    Tied,
}

#[derive(Debug)]
pub struct GameSession {
    id: String,
    board: Board,
    players: Vec<Player>,
    phase: Phase,
    current_player: Option<Symbol>,
    winner: Option<Player>,
    winning_combo: Option<Vec<Coord>>,
}

impl GameSession {
    /// Start a game with its first (X) player.
    pub fn new(id: impl Into<String>, connection: Connection, board_size: usize) -> Self {
        Self {
            id: id.into(),
            board: Board::new(board_size),
            players: vec![Player::new(Symbol::X, connection)],
            phase: Phase::WaitingForPlayer,
            current_player: None,
            winner: None,
            winning_combo: None,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[cfg(test)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn has_winner(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<&Player> {
        self.winner.as_ref()
    }

    pub fn winning_combo(&self) -> Option<&[Coord]> {
        self.winning_combo.as_deref()
    }

    /// Symbol of the player who moved last.
    #[cfg(test)]
    pub fn current_player(&self) -> Option<Symbol> {
        self.current_player
    }

    /// Symbol expected to move next. X always opens.
    pub fn next_symbol(&self) -> Symbol {
        self.current_player.map_or(Symbol::X, Symbol::opposite)
    }

    pub fn find_player(&self, symbol: Symbol) -> Option<&Player> {
        self.players.iter().find(|p| p.symbol == symbol)
    }

    /// The player bound to a connection, if any.
    pub fn player_for(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.is_bound_to(id))
    }

    /// Seat the second (O) player and activate the game.
    ///
    /// Callers hold the registry lock, so the full/duplicate checks and the
    /// insert happen atomically.
    pub fn add_player(&mut self, connection: Connection) -> NoughtsResult<&Player> {
        if self.is_full() {
            return Err(NoughtsError::SessionFull(self.id.clone()));
        }
        if self.player_for(connection.id()).is_some() {
            return Err(NoughtsError::DuplicatePlayer(self.id.clone()));
        }

        self.players.push(Player::new(Symbol::O, connection));
        if self.players.len() == MAX_PLAYERS {
            self.phase = Phase::Active;
        }
        Ok(&self.players[self.players.len() - 1])
    }

    /// Apply `symbol` to `cell` and run the win scan.
    ///
    /// Rejects moves on a game that is not active, out of turn, outside the
    /// board, or onto an occupied cell. On a win the game leaves the active
    /// phase before this returns.
    pub fn process_move(&mut self, cell: usize, symbol: Symbol) -> NoughtsResult<Move> {
        if !self.is_active() {
            return Err(NoughtsError::GameNotActive(self.id.clone()));
        }
        if symbol != self.next_symbol() {
            return Err(NoughtsError::NotYourTurn(symbol));
        }

        let applied = self.board.place(cell, symbol)?;
        self.current_player = Some(symbol);

        if let Some((line_symbol, line)) = self.board.winning_line() {
            let line = line.to_vec();
            self.phase = Phase::Won;
            self.winner = self.find_player(line_symbol).cloned();
            self.winning_combo = Some(line);
        }

        Ok(applied)
    }

    /// True when nobody has won and the board is full; marks the game tied.
    ///
    /// Only meaningful after [`process_move`](Self::process_move) has run its
    /// win scan.
    pub fn is_tied(&mut self) -> bool {
        let tied = !self.has_winner() && self.board.is_full();
        if tied {
            self.phase = Phase::Tied;
        }
        tied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: u64) -> Connection {
        Connection::channel(ConnectionId(id)).0
    }

    fn active_game() -> GameSession {
        let mut game = GameSession::new("g1", conn(1), 3);
        game.add_player(conn(2)).unwrap();
        game
    }

    /// Play `(row, col)` moves, alternating from X.
    fn play(game: &mut GameSession, moves: &[(usize, usize)]) {
        for &(row, col) in moves {
            let symbol = game.next_symbol();
            game.process_move(row * 3 + col, symbol).unwrap();
        }
    }

    #[test]
    fn new_game_waits_for_second_player() {
        let game = GameSession::new("g1", conn(1), 3);
        assert_eq!(game.phase(), Phase::WaitingForPlayer);
        assert!(!game.is_active());
        assert_eq!(game.players().len(), 1);
        assert_eq!(game.players()[0].symbol, Symbol::X);
    }

    #[test]
    fn second_player_is_o_and_activates() {
        let game = active_game();
        assert!(game.is_active());
        assert_eq!(game.players()[1].symbol, Symbol::O);
        assert!(game.player_for(ConnectionId(2)).is_some());
    }

    #[test]
    fn third_player_rejected() {
        let mut game = active_game();
        let err = game.add_player(conn(3)).unwrap_err();
        assert!(matches!(err, NoughtsError::SessionFull(_)));
        assert_eq!(game.players().len(), 2);
    }

    #[test]
    fn creator_cannot_join_own_game() {
        let mut game = GameSession::new("g1", conn(1), 3);
        let err = game.add_player(conn(1)).unwrap_err();
        assert!(matches!(err, NoughtsError::DuplicatePlayer(_)));
        assert!(!game.is_active());
    }

    #[test]
    fn top_row_win_ends_game_immediately() {
        let mut game = active_game();
        play(&mut game, &[(0, 0), (1, 1), (0, 1), (2, 2)]);
        assert!(game.is_active());

        assert_eq!(game.current_player(), Some(Symbol::O));
        let mv = game.process_move(2, Symbol::X).unwrap();
        assert_eq!((mv.row, mv.col, mv.symbol), (0, 2, Some(Symbol::X)));

        assert!(!game.is_active());
        assert_eq!(game.phase(), Phase::Won);
        assert!(game.has_winner());
        assert_eq!(game.winner().unwrap().symbol, Symbol::X);
        assert_eq!(game.winning_combo().unwrap(), &[(0, 0), (0, 1), (0, 2)]);
        assert!(!game.is_tied());
        assert_eq!(game.phase(), Phase::Won);
    }

    #[test]
    fn full_board_without_line_is_tied() {
        let mut game = active_game();
        // X O X / X O O / O X X
        play(
            &mut game,
            &[(0, 0), (0, 1), (0, 2), (1, 1), (1, 0), (1, 2), (2, 1), (2, 0), (2, 2)],
        );
        assert!(!game.has_winner());
        assert!(game.is_tied());
        assert_eq!(game.phase(), Phase::Tied);
        assert!(!game.is_active());
    }

    #[test]
    fn winning_last_move_is_not_a_tie() {
        let mut game = active_game();
        // X O X / O X O / O X X: the final X completes the diagonal.
        play(
            &mut game,
            &[(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (2, 1), (2, 0), (2, 2)],
        );
        assert!(game.has_winner());
        assert!(!game.is_tied());
        assert_eq!(game.winning_combo().unwrap(), &[(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn occupied_cell_rejected_without_overwrite() {
        let mut game = active_game();
        game.process_move(4, Symbol::X).unwrap();
        let err = game.process_move(4, Symbol::O).unwrap_err();
        assert!(matches!(err, NoughtsError::CellOccupied(4)));
        assert_eq!(game.board().get(1, 1).unwrap().symbol, Some(Symbol::X));
        // O still has the turn.
        assert_eq!(game.next_symbol(), Symbol::O);
    }

    #[test]
    fn out_of_turn_and_out_of_range_rejected() {
        let mut game = active_game();
        assert!(matches!(
            game.process_move(0, Symbol::O),
            Err(NoughtsError::NotYourTurn(Symbol::O))
        ));
        assert!(matches!(
            game.process_move(9, Symbol::X),
            Err(NoughtsError::InvalidCell(9))
        ));
    }

    #[test]
    fn moves_rejected_before_join_and_after_finish() {
        let mut waiting = GameSession::new("g1", conn(1), 3);
        assert!(matches!(
            waiting.process_move(0, Symbol::X),
            Err(NoughtsError::GameNotActive(_))
        ));

        let mut game = active_game();
        play(&mut game, &[(0, 0), (1, 1), (0, 1), (2, 2), (0, 2)]);
        assert!(matches!(
            game.process_move(5, Symbol::O),
            Err(NoughtsError::GameNotActive(_))
        ));
    }

    #[test]
    fn player_equality_is_by_symbol() {
        assert_eq!(Player::new(Symbol::X, conn(1)), Player::new(Symbol::X, conn(9)));
        assert_ne!(Player::new(Symbol::X, conn(1)), Player::new(Symbol::O, conn(1)));
    }
}

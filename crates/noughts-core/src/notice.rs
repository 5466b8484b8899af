//! Human-readable status lines shown to players.

use crate::messages::Symbol;

pub const GAME_TIED: &str = "The game is tied. Try again!";
pub const GAME_CLOSED: &str = "The game was closed";
pub const GAME_ALREADY_STARTED: &str = "The game has been started";
pub const GAME_NOT_FOUND: &str = "The game does not exist";
pub const ALREADY_IN_GAME: &str = "You are already in this game";
pub const GAME_ID_TAKEN: &str = "A game with this id already exists";
pub const NOT_A_PLAYER: &str = "You are not a player in this game";
pub const INVALID_MESSAGE: &str = "Invalid message";

/// Sent to the player who won.
pub fn winner(symbol: Symbol) -> String {
    format!("You won, player {symbol}!")
}

/// Sent to the player who lost.
pub fn loser(winner: Symbol) -> String {
    format!("The player {winner} won!")
}

/// Sent to the player left behind when `symbol` leaves.
pub fn player_left(symbol: Symbol) -> String {
    format!("{symbol} player left the game!")
}

/// Sent to the player whose turn it is.
pub fn your_move(symbol: Symbol) -> String {
    format!("Next move is yours {symbol}")
}

/// Sent to the player waiting for `symbol` to move.
pub fn next_move_for(symbol: Symbol) -> String {
    format!("Next move for player {symbol}")
}

/// Turn line for `recipient` when `to_move` plays next.
pub fn turn(recipient: Symbol, to_move: Symbol) -> String {
    if recipient == to_move {
        your_move(to_move)
    } else {
        next_move_for(to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_lines() {
        assert_eq!(turn(Symbol::X, Symbol::X), "Next move is yours X");
        assert_eq!(turn(Symbol::O, Symbol::X), "Next move for player X");
    }

    #[test]
    fn outcome_lines() {
        assert_eq!(winner(Symbol::O), "You won, player O!");
        assert_eq!(loser(Symbol::O), "The player O won!");
        assert_eq!(player_left(Symbol::X), "X player left the game!");
    }
}

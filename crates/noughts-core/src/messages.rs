//! noughts wire messages.
//!
//! Clients send [`ClientEnvelope`]s tagged with an [`Action`]; the server
//! answers with [`Envelope`]s tagged with a [`ServerAction`]. Optional fields
//! are omitted from the JSON when unset.

use crate::error::NoughtsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A player's mark on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// The symbol of the other player.
    pub fn opposite(self) -> Symbol {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::X => "X",
            Symbol::O => "O",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions a client may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    New,
    Create,
    Join,
    Move,
    Close,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::New,
        Action::Create,
        Action::Join,
        Action::Move,
        Action::Close,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::New => "new",
            Action::Create => "create",
            Action::Join => "join",
            Action::Move => "move",
            Action::Close => "close",
        }
    }
}

impl FromStr for Action {
    type Err = NoughtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| NoughtsError::InvalidAction(s.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound message from a client.
///
/// `action` stays a raw string so that unknown actions still decode and can
/// be answered with a rejection instead of a codec error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Symbol>,
}

impl ClientEnvelope {
    pub fn new(action: Action) -> Self {
        Self {
            action: action.as_str().to_string(),
            game_id: None,
            cell: None,
            state: None,
        }
    }

    /// Parse the action tag.
    pub fn action(&self) -> Result<Action, NoughtsError> {
        self.action.parse()
    }

    /// The `game_id` field, required by every action except `new`.
    pub fn require_game_id(&self) -> Result<&str, NoughtsError> {
        self.game_id
            .as_deref()
            .ok_or(NoughtsError::MissingField("game_id"))
    }

    pub fn require_cell(&self) -> Result<usize, NoughtsError> {
        self.cell.ok_or(NoughtsError::MissingField("cell"))
    }

    pub fn with_game_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_cell(mut self, cell: usize) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_state(mut self, state: Symbol) -> Self {
        self.state = Some(state);
        self
    }
}

/// Actions tagging server-originated envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerAction {
    New,
    Create,
    Join,
    Move,
    Finish,
    Close,
    Online,
    Error,
}

/// Outbound message to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub action: ServerAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_player: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_player_move: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_winner: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Symbol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Envelope {
    /// A bare envelope with only the action set.
    pub fn new(action: ServerAction) -> Self {
        Self {
            action,
            games: None,
            player: None,
            other_player: None,
            is_player_move: None,
            winner: None,
            has_winner: None,
            is_tied: None,
            message: None,
            cell: None,
            state: None,
            count: None,
        }
    }

    /// An envelope carrying the current lobby listing.
    pub fn with_games(action: ServerAction, games: Vec<String>) -> Self {
        Self {
            games: Some(games),
            ..Self::new(action)
        }
    }

    /// `{action: "online", count}`.
    pub fn online(count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::new(ServerAction::Online)
        }
    }

    /// `{action: "error", message}`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(ServerAction::Error)
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_known_names() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_invalid() {
        let err = "finish".parse::<Action>().unwrap_err();
        assert!(matches!(err, NoughtsError::InvalidAction(ref a) if a == "finish"));
    }

    #[test]
    fn symbol_opposite() {
        assert_eq!(Symbol::X.opposite(), Symbol::O);
        assert_eq!(Symbol::O.opposite(), Symbol::X);
        assert_eq!(Symbol::O.to_string(), "O");
    }

    #[test]
    fn client_envelope_from_browser_json() {
        let json = r#"{"action":"move","cell":4,"state":"X","game_id":"abc"}"#;
        let env: ClientEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.action().unwrap(), Action::Move);
        assert_eq!(env.require_game_id().unwrap(), "abc");
        assert_eq!(env.require_cell().unwrap(), 4);
        assert_eq!(env.state, Some(Symbol::X));
    }

    #[test]
    fn client_envelope_missing_fields() {
        let env: ClientEnvelope = serde_json::from_str(r#"{"action":"new"}"#).unwrap();
        assert!(matches!(
            env.require_game_id(),
            Err(NoughtsError::MissingField("game_id"))
        ));
        assert!(matches!(env.require_cell(), Err(NoughtsError::MissingField("cell"))));
    }

    #[test]
    fn envelope_omits_unset_fields() {
        let json = serde_json::to_value(Envelope::online(3)).unwrap();
        assert_eq!(json, serde_json::json!({"action": "online", "count": 3}));

        let mut env = Envelope::with_games(ServerAction::Finish, vec!["g1".into()]);
        env.has_winner = Some(false);
        env.is_tied = Some(true);
        let json = serde_json::to_value(env).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "finish",
                "games": ["g1"],
                "has_winner": false,
                "is_tied": true,
            })
        );
    }
}

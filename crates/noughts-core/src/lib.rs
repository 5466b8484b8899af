//! noughts-core: shared protocol library for noughts.
//!
//! Provides the JSON envelope types and codec, the error taxonomy, and the
//! board engine (winning combos, cell mapping, win and full-board checks).

pub mod board;
pub mod codec;
pub mod error;
pub mod messages;
pub mod notice;

// Re-export commonly used items at crate root.
pub use board::{Board, Coord, Move, DEFAULT_BOARD_SIZE};
pub use codec::{decode, encode, MAX_FRAME_SIZE};
pub use error::{NoughtsError, NoughtsResult};
pub use messages::{Action, ClientEnvelope, Envelope, ServerAction, Symbol};

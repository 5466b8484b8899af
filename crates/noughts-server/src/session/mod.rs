//! Games and the registry that owns them.

pub mod game;
pub mod registry;

pub use game::Player;
pub use registry::SessionRegistry;

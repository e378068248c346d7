//! Shared chess game data model and PGN utilities.

pub mod game_data;
pub mod opening;
pub mod pgn;

pub use game_data::{GameData, GameMetadata, PlayerColor};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub opening: Option<String>,
    pub white_elo: Option<i32>,
    pub black_elo: Option<i32>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    /// Source game id (e.g. the Lichess id), empty when unknown.
    pub id: String,
    pub metadata: GameMetadata,
    pub moves: Vec<String>, // SAN notation
    pub pgn: String,
    /// Game start in epoch milliseconds, when the source supplies it.
    pub created_at: Option<i64>,
}

impl GameData {
    /// Which color the given player had, if they played in this game.
    pub fn color_of(&self, player: &str) -> Option<PlayerColor> {
        if self.metadata.white.eq_ignore_ascii_case(player) {
            Some(PlayerColor::White)
        } else if self.metadata.black.eq_ignore_ascii_case(player) {
            Some(PlayerColor::Black)
        } else {
            None
        }
    }

    /// The opponent of the given player, if they played in this game.
    pub fn opponent_of(&self, player: &str) -> Option<&str> {
        match self.color_of(player)? {
            PlayerColor::White => Some(&self.metadata.black),
            PlayerColor::Black => Some(&self.metadata.white),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    White,
    Black,
}

impl PlayerColor {
    pub fn other(self) -> Self {
        match self {
            PlayerColor::White => PlayerColor::Black,
            PlayerColor::Black => PlayerColor::White,
        }
    }
}

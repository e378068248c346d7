//! Lichess API client: game export endpoints, NDJSON parsing.

use reqwest::Client;
use serde_json::Value;

use chess_core::{pgn, GameData};
use insight_core::SkippedGame;

use crate::error::CliError;

const API_BASE: &str = "https://lichess.org";

/// Filters for a player's game export.
#[derive(Debug, Clone, Default)]
pub struct GameQuery {
    pub max_games: Option<usize>,
    /// Lichess perf type: "bullet", "blitz", "rapid", "classical", ...
    pub perf_type: Option<String>,
    /// Only games started after this epoch-millisecond timestamp.
    pub since_ms: Option<i64>,
    pub rated: Option<bool>,
}

/// Games fetched from the API, with the ones that could not be parsed.
/// Unparsable games are reported, never silently dropped.
#[derive(Debug, Default)]
pub struct FetchedGames {
    pub games: Vec<GameData>,
    pub skipped: Vec<SkippedGame>,
}

pub struct LichessClient {
    client: Client,
    token: Option<String>,
}

impl LichessClient {
    pub fn new(token: Option<String>) -> Result<Self, CliError> {
        let client = Client::builder()
            .user_agent("chess-insight/0.1")
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self { client, token })
    }

    /// Fetch a user's games, newest first, as the Lichess NDJSON export.
    pub async fn fetch_user_games(
        &self,
        username: &str,
        query: &GameQuery,
    ) -> Result<FetchedGames, CliError> {
        let url = format!("{API_BASE}/api/games/user/{username}");

        let mut params = vec![
            ("pgnInJson", "true".to_string()),
            ("opening", "true".to_string()),
            ("clocks", "false".to_string()),
        ];
        if let Some(max) = query.max_games {
            params.push(("max", max.to_string()));
        }
        if let Some(ref perf) = query.perf_type {
            params.push(("perfType", perf.clone()));
        }
        if let Some(since) = query.since_ms {
            params.push(("since", since.to_string()));
        }
        if let Some(rated) = query.rated {
            params.push(("rated", rated.to_string()));
        }

        // Rate limit
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;

        let mut request = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/x-ndjson");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CliError::Lichess(format!("user not found: {username}")));
        }
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CliError::Lichess("rate limited, try again later".into()));
        }
        if !resp.status().is_success() {
            return Err(CliError::Lichess(format!("HTTP {}", resp.status())));
        }

        let text = resp.text().await?;

        let mut fetched = FetchedGames::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line) {
                Ok(value) => match game_from_json(&value) {
                    Some(game) => fetched.games.push(game),
                    None => fetched.skipped.push(SkippedGame {
                        game_id: value
                            .get("id")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown")
                            .to_string(),
                        reason: "no parsable PGN in API response".to_string(),
                    }),
                },
                Err(e) => {
                    tracing::warn!(error = %e, "unparsable NDJSON line from Lichess");
                    fetched.skipped.push(SkippedGame {
                        game_id: "unknown".to_string(),
                        reason: format!("invalid JSON from API: {e}"),
                    });
                }
            }
        }

        Ok(fetched)
    }

    /// Fetch a single game by id.
    pub async fn fetch_game(&self, game_id: &str) -> Result<GameData, CliError> {
        let url = format!("{API_BASE}/game/export/{game_id}");
        let params = [("pgnInJson", "true"), ("opening", "true")];

        let mut request = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CliError::Lichess(format!("game not found: {game_id}")));
        }
        if !resp.status().is_success() {
            return Err(CliError::Lichess(format!("HTTP {}", resp.status())));
        }

        let value: Value = resp.json().await?;
        game_from_json(&value)
            .ok_or_else(|| CliError::Lichess(format!("game {game_id} has no parsable PGN")))
    }
}

/// Build a GameData from one Lichess export object. None when the PGN
/// is missing or unparsable.
fn game_from_json(value: &Value) -> Option<GameData> {
    let pgn_text = value.get("pgn")?.as_str()?;
    if pgn_text.is_empty() {
        return None;
    }

    let mut game = pgn::parse_pgn(pgn_text)?;
    game.id = value
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    game.created_at = value.get("createdAt").and_then(|v| v.as_i64());

    // The JSON carries richer metadata than PGN headers for some fields.
    if game.metadata.opening.is_none() {
        game.metadata.opening = value
            .get("opening")
            .and_then(|o| o.get("name"))
            .and_then(|v| v.as_str())
            .map(String::from);
    }
    if game.metadata.time_control.is_none() {
        game.metadata.time_control = value
            .get("speed")
            .and_then(|v| v.as_str())
            .map(String::from);
    }

    Some(game)
}

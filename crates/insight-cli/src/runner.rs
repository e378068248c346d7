//! Batch analysis driver: an engine pool, one task per game, partial
//! results preserved on interruption.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use chess_core::{opening, GameData, PlayerColor};
use insight_core::{
    classify_move, sequence_game, AnalysisSettings, GameMeta, GameResult, GameStats, SkippedGame,
    StockfishEngine,
};

use crate::cache::AnalysisCache;
use crate::error::CliError;

/// Result of a batch run. Skipped games are part of the outcome, not an
/// error: the report always shows what was left out and why.
pub struct BatchOutcome {
    pub analyzed: Vec<(GameMeta, GameStats)>,
    pub skipped: Vec<SkippedGame>,
    pub cancelled: bool,
}

/// Analyze a set of games for one player. Games run concurrently across
/// an engine pool; moves within a game stay strictly sequential, so ply
/// order is preserved no matter how many games are in flight. Ctrl-C
/// stops the batch at a game boundary — finished games remain valid.
pub async fn run_batch(
    stockfish_path: &str,
    settings: &AnalysisSettings,
    player: &str,
    games: Vec<GameData>,
    jobs: usize,
    cache: Option<Arc<AnalysisCache>>,
) -> Result<BatchOutcome, CliError> {
    let mut outcome = BatchOutcome {
        analyzed: Vec::new(),
        skipped: Vec::new(),
        cancelled: false,
    };
    if games.is_empty() {
        return Ok(outcome);
    }

    let jobs = jobs.clamp(1, games.len());
    info!(jobs, games = games.len(), "starting batch analysis");

    let mut engines: Vec<Arc<Mutex<StockfishEngine>>> = Vec::with_capacity(jobs);
    for i in 0..jobs {
        let engine =
            StockfishEngine::new(stockfish_path, settings.nodes_per_position, settings.eval_timeout_ms)
                .await?;
        info!(engine_id = i, "engine ready");
        engines.push(Arc::new(Mutex::new(engine)));
    }

    let semaphore = Arc::new(Semaphore::new(jobs));
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight games");
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut handles = Vec::with_capacity(games.len());
    let mut games = games.into_iter().enumerate();

    for (i, game) in games.by_ref() {
        if cancel.load(Ordering::SeqCst) {
            outcome.skipped.push(SkippedGame {
                game_id: display_id(&game),
                reason: "cancelled before analysis".to_string(),
            });
            break;
        }

        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let engine = engines[i % jobs].clone();
        let settings = settings.clone();
        let player = player.to_string();
        let cache = cache.clone();

        handles.push(tokio::spawn(async move {
            let _permit = permit; // hold until done
            let mut engine = engine.lock().await;
            analyze_one(&mut engine, &settings, &player, &game, cache.as_deref()).await
        }));
    }

    // Anything still unconsumed was abandoned at the cancellation point.
    for (_, game) in games {
        outcome.skipped.push(SkippedGame {
            game_id: display_id(&game),
            reason: "cancelled before analysis".to_string(),
        });
    }
    outcome.cancelled = cancel.load(Ordering::SeqCst);

    for handle in handles {
        match handle.await {
            Ok(Ok(analyzed)) => outcome.analyzed.push(analyzed),
            Ok(Err(skipped)) => {
                warn!(game_id = %skipped.game_id, reason = %skipped.reason, "game skipped");
                outcome.skipped.push(skipped);
            }
            Err(e) => {
                warn!(error = %e, "analysis task failed");
                outcome.skipped.push(SkippedGame {
                    game_id: "unknown".to_string(),
                    reason: format!("analysis task failed: {e}"),
                });
            }
        }
    }

    info!("shutting down engines");
    for engine in engines {
        let mut engine = engine.lock().await;
        engine.quit().await;
    }

    Ok(outcome)
}

/// Analyze one game for the given player's side. Per-game failures
/// become a SkippedGame; they never poison the batch.
async fn analyze_one(
    engine: &mut StockfishEngine,
    settings: &AnalysisSettings,
    player: &str,
    game: &GameData,
    cache: Option<&AnalysisCache>,
) -> Result<(GameMeta, GameStats), SkippedGame> {
    let game_id = display_id(game);

    let Some(color) = game.color_of(player) else {
        return Err(SkippedGame {
            game_id,
            reason: format!("{player} did not play in this game"),
        });
    };
    let meta = meta_for(game, player, color, settings);

    if let Some(cache) = cache {
        if let Some(stats) = cache.get(&game.pgn, color, settings) {
            return Ok((meta, stats));
        }
    }

    info!(game_id = %game_id, moves = game.moves.len(), "analyzing game");
    let records = sequence_game(engine, settings, &game.moves)
        .await
        .map_err(|e| SkippedGame {
            game_id: game_id.clone(),
            reason: e.to_string(),
        })?;

    let classified: Vec<_> = records
        .into_iter()
        .filter(|r| r.mover == color)
        .map(|r| classify_move(r, &settings.thresholds))
        .collect();
    let stats = GameStats::from_moves(game_id, &classified);

    if let Some(cache) = cache {
        cache.put(&game.pgn, color, settings, &stats);
    }
    Ok((meta, stats))
}

/// Analyze one game for both sides (single-game mode).
pub async fn analyze_single(
    engine: &mut StockfishEngine,
    settings: &AnalysisSettings,
    game: &GameData,
) -> Result<(GameStats, GameStats), CliError> {
    let records = sequence_game(engine, settings, &game.moves).await?;

    let game_id = display_id(game);
    let (white, black): (Vec<_>, Vec<_>) = records
        .into_iter()
        .map(|r| classify_move(r, &settings.thresholds))
        .partition(|m| m.record.mover == PlayerColor::White);

    Ok((
        GameStats::from_moves(game_id.clone(), &white),
        GameStats::from_moves(game_id, &black),
    ))
}

fn meta_for(
    game: &GameData,
    player: &str,
    color: PlayerColor,
    settings: &AnalysisSettings,
) -> GameMeta {
    GameMeta {
        game_id: display_id(game),
        opponent: game
            .opponent_of(player)
            .unwrap_or("unknown")
            .to_string(),
        player_color: color,
        result: GameResult::from_pgn(&game.metadata.result, color),
        opening: opening::opening_signature(&game.moves, settings.opening_plies),
        opening_name: game.metadata.opening.clone(),
        time_control: game.metadata.time_control.clone(),
        played_at_ms: game.created_at,
    }
}

/// Stable identifier for reports: the source id when present, otherwise
/// the pairing.
fn display_id(game: &GameData) -> String {
    if game.id.is_empty() {
        format!("{} vs {}", game.metadata.white, game.metadata.black)
    } else {
        game.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::GameMetadata;

    fn game(white: &str, black: &str, result: &str, moves: &[&str]) -> GameData {
        GameData {
            id: "gid1".to_string(),
            metadata: GameMetadata {
                white: white.to_string(),
                black: black.to_string(),
                result: result.to_string(),
                date: None,
                time_control: Some("blitz".to_string()),
                eco: None,
                opening: Some("King's Pawn".to_string()),
                white_elo: None,
                black_elo: None,
                link: None,
            },
            moves: moves.iter().map(|m| m.to_string()).collect(),
            pgn: String::new(),
            created_at: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn test_meta_for_black_player() {
        let g = game("alice", "bob", "1-0", &["e4", "e5", "Nf3"]);
        let settings = AnalysisSettings::default();
        let meta = meta_for(&g, "bob", PlayerColor::Black, &settings);

        assert_eq!(meta.opponent, "alice");
        assert_eq!(meta.result, Some(GameResult::Loss));
        assert_eq!(meta.opening, "e4 e5 Nf3");
        assert_eq!(meta.opening_name.as_deref(), Some("King's Pawn"));
        assert_eq!(meta.played_at_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn test_display_id_falls_back_to_pairing() {
        let mut g = game("alice", "bob", "*", &[]);
        g.id = String::new();
        assert_eq!(display_id(&g), "alice vs bob");
    }
}

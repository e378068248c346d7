//! Move-evaluation sequencing: replay a game against the chess library,
//! scoring each position with the evaluation source before and after
//! every move.

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, san::San, CastlingMode, Chess, EnPassantMode, Position};
use tracing::warn;

use chess_core::PlayerColor;

use crate::error::AnalysisError;
use crate::eval::EvaluationSource;
use crate::settings::AnalysisSettings;

/// One replayed move with both evaluations normalized to the mover's
/// perspective (positive = good for the side that played the move).
/// Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 1-based ply index.
    pub ply: u32,
    pub san: String,
    pub uci: String,
    pub mover: PlayerColor,
    /// Centipawns before the move; None when the engine call failed.
    pub eval_before: Option<i32>,
    /// Centipawns after the move; None when the engine call failed.
    pub eval_after: Option<i32>,
    /// Engine's preferred move in the pre-move position.
    pub best_move: Option<String>,
}

/// Replay `moves` from the standard start position, producing one
/// MoveRecord per ply. A failed evaluation leaves a hole in that record
/// rather than aborting the game; an illegal or unparsable move aborts
/// this game only (MalformedGame). The input move list is never mutated.
pub async fn sequence_game<E: EvaluationSource>(
    source: &mut E,
    settings: &AnalysisSettings,
    moves: &[String],
) -> Result<Vec<MoveRecord>, AnalysisError> {
    let mut pos = Chess::default();
    let mut records = Vec::with_capacity(moves.len());

    // Evaluation of the current position from the side to move's
    // perspective, shared between one move's "after" and the next
    // move's "before" when the call succeeded.
    let mut carried: Option<(i32, Option<String>)> = None;
    if !moves.is_empty() {
        carried = try_evaluate(source, settings, &fen_of(&pos)).await;
    }

    for (idx, san_str) in moves.iter().enumerate() {
        let ply = idx as u32 + 1;
        let mover = color_of(pos.turn());

        // Score the position before the move. If the previous attempt at
        // this position failed, ask again instead of smearing one failure
        // across two adjacent records.
        let before = match carried.take() {
            Some(v) => Some(v),
            None => try_evaluate(source, settings, &fen_of(&pos)).await,
        };

        // Apply the move; legality is the chess library's call.
        let san: San = san_str.parse::<San>().map_err(|e| AnalysisError::MalformedGame {
            ply,
            san: san_str.clone(),
            reason: e.to_string(),
        })?;
        let mv = san.to_move(&pos).map_err(|e| AnalysisError::MalformedGame {
            ply,
            san: san_str.clone(),
            reason: e.to_string(),
        })?;
        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        pos.play_unchecked(mv);

        // Score the resulting position. Decided positions need no engine:
        // a delivered mate is the full cap against the side to move, a
        // dead draw is level.
        let after = if pos.is_checkmate() {
            Some((-settings.mate_cap, None))
        } else if pos.is_stalemate() || pos.is_insufficient_material() {
            Some((0, None))
        } else {
            try_evaluate(source, settings, &fen_of(&pos)).await
        };

        records.push(MoveRecord {
            ply,
            san: san_str.clone(),
            uci,
            mover,
            eval_before: before.as_ref().map(|(cp, _)| *cp),
            // The raw "after" score is the opponent's perspective; flip it.
            eval_after: after.as_ref().map(|(cp, _)| -cp),
            best_move: before.and_then(|(_, bm)| bm),
        });

        carried = after;
    }

    Ok(records)
}

/// Evaluate one position, retrying a bounded number of times. Exhausted
/// retries collapse to None — the null-evaluation path, never an abort.
async fn try_evaluate<E: EvaluationSource>(
    source: &mut E,
    settings: &AnalysisSettings,
    fen: &str,
) -> Option<(i32, Option<String>)> {
    let attempts = settings.max_eval_retries + 1;
    for attempt in 1..=attempts {
        match source.evaluate(fen).await {
            Ok(raw) => {
                let best = raw.best_move().map(str::to_string);
                return raw.to_signed_cp(settings.mate_cap).map(|cp| (cp, best));
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, "position evaluation failed");
            }
        }
    }
    None
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(&pos.clone(), EnPassantMode::Legal).to_string()
}

fn color_of(color: shakmaty::Color) -> PlayerColor {
    match color {
        shakmaty::Color::White => PlayerColor::White,
        shakmaty::Color::Black => PlayerColor::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::eval::RawEval;
    use std::collections::VecDeque;

    /// Evaluation source fed from a script of canned responses.
    struct ScriptedSource {
        responses: VecDeque<Result<RawEval, EngineError>>,
        calls: u32,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<RawEval, EngineError>>) -> Self {
            Self {
                responses: responses.into(),
                calls: 0,
            }
        }
    }

    impl EvaluationSource for ScriptedSource {
        async fn evaluate(&mut self, _fen: &str) -> Result<RawEval, EngineError> {
            self.calls += 1;
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(EngineError::Io("script exhausted".into())))
        }
    }

    fn cp(v: i32) -> Result<RawEval, EngineError> {
        Ok(RawEval {
            cp: Some(v),
            mate: None,
            best_move: "e2e4".to_string(),
        })
    }

    fn failure() -> Result<RawEval, EngineError> {
        Err(EngineError::Timeout(10))
    }

    fn san(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|m| m.to_string()).collect()
    }

    fn settings() -> AnalysisSettings {
        AnalysisSettings {
            max_eval_retries: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_post_move_eval_is_flipped_to_mover_perspective() {
        // Raw evals are side-to-move perspective: +30 for White at the
        // start, -25 for Black after 1.e4.
        let mut source = ScriptedSource::new(vec![cp(30), cp(-25)]);
        let records = sequence_game(&mut source, &settings(), &san(&["e4"]))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ply, 1);
        assert_eq!(records[0].mover, PlayerColor::White);
        assert_eq!(records[0].eval_before, Some(30));
        assert_eq!(records[0].eval_after, Some(25));
        assert_eq!(records[0].uci, "e2e4");
    }

    #[tokio::test]
    async fn test_shared_eval_links_consecutive_records() {
        let mut source = ScriptedSource::new(vec![cp(20), cp(-15), cp(10)]);
        let records = sequence_game(&mut source, &settings(), &san(&["e4", "e5"]))
            .await
            .unwrap();

        // Each position is scored once: 3 calls for 2 moves.
        assert_eq!(source.calls, 3);
        assert_eq!(records[0].eval_after, Some(15));
        // Black's "before" is the same raw score, unflipped.
        assert_eq!(records[1].eval_before, Some(-15));
        assert_eq!(records[1].mover, PlayerColor::Black);
    }

    #[tokio::test]
    async fn test_failed_eval_leaves_hole_and_is_reattempted_for_next_move() {
        // Position after 1.e4 fails once, then succeeds when re-asked as
        // move 2's pre-move position.
        let mut source = ScriptedSource::new(vec![cp(20), failure(), cp(-15), cp(10)]);
        let records = sequence_game(&mut source, &settings(), &san(&["e4", "e5"]))
            .await
            .unwrap();

        assert_eq!(records[0].eval_before, Some(20));
        assert_eq!(records[0].eval_after, None);
        assert_eq!(records[1].eval_before, Some(-15));
        assert_eq!(records[1].eval_after, Some(-10));
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let s = AnalysisSettings {
            max_eval_retries: 2,
            ..Default::default()
        };
        let mut source =
            ScriptedSource::new(vec![failure(), failure(), failure(), cp(-10), cp(5)]);
        let records = sequence_game(&mut source, &s, &san(&["e4"])).await.unwrap();

        // Start position: 3 failed attempts, then give up; the pre-move
        // score is re-asked once more (and succeeds) for move 1.
        assert_eq!(records[0].eval_before, Some(-10));
        assert_eq!(records[0].eval_after, Some(-5));
    }

    #[tokio::test]
    async fn test_illegal_move_is_malformed_game() {
        let mut source = ScriptedSource::new(vec![cp(0), cp(0), cp(0)]);
        // The d1 queen cannot reach d5 through its own pawn.
        let err = sequence_game(&mut source, &settings(), &san(&["e4", "Qd5"]))
            .await
            .unwrap_err();
        match err {
            AnalysisError::MalformedGame { ply, san, .. } => {
                assert_eq!(ply, 2);
                assert_eq!(san, "Qd5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_checkmate_needs_no_engine_call() {
        // Fool's mate: the final position is decided, so only the four
        // preceding positions reach the engine.
        let moves = san(&["f3", "e5", "g4", "Qh4#"]);
        let mut source = ScriptedSource::new(vec![cp(0), cp(30), cp(-50), cp(200)]);
        let records = sequence_game(&mut source, &settings(), &moves).await.unwrap();

        assert_eq!(source.calls, 4);
        let last = records.last().unwrap();
        assert_eq!(last.mover, PlayerColor::Black);
        // Mate delivered by the mover scores the full cap in their favor.
        assert_eq!(last.eval_after, Some(AnalysisSettings::default().mate_cap));
    }

    #[tokio::test]
    async fn test_empty_game_makes_no_engine_calls() {
        let mut source = ScriptedSource::new(vec![]);
        let records = sequence_game(&mut source, &settings(), &[]).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(source.calls, 0);
    }
}

//! End-to-end pipeline tests: replay a game against a scripted
//! evaluation source, classify every move, and fold the results up to a
//! player profile.

use std::collections::VecDeque;

use chess_core::PlayerColor;
use insight_core::{
    build_profile, classify_move, sequence_game, AnalysisSettings, EngineError, EvaluationSource,
    GameMeta, GameResult, GameStats, RawEval, Severity,
};

/// Evaluation source fed from a script of canned responses.
struct ScriptedSource {
    responses: VecDeque<Result<RawEval, EngineError>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<RawEval, EngineError>>) -> Self {
        Self {
            responses: responses.into(),
        }
    }
}

impl EvaluationSource for ScriptedSource {
    async fn evaluate(&mut self, _fen: &str) -> Result<RawEval, EngineError> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::Io("script exhausted".into())))
    }
}

fn cp(v: i32) -> Result<RawEval, EngineError> {
    Ok(RawEval {
        cp: Some(v),
        mate: None,
        best_move: "a2a3".to_string(),
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

fn meta(game_id: &str, opponent: &str, opening: &str, result: Option<GameResult>) -> GameMeta {
    GameMeta {
        game_id: game_id.to_string(),
        opponent: opponent.to_string(),
        player_color: PlayerColor::White,
        result,
        opening: opening.to_string(),
        opening_name: None,
        time_control: None,
        played_at_ms: None,
    }
}

/// Replay + classify + per-game fold, for White's moves only.
async fn analyze(
    source: &mut ScriptedSource,
    moves: &[String],
    game_id: &str,
) -> GameStats {
    let s = settings();
    let records = sequence_game(source, &s, moves).await.unwrap();
    let classified: Vec<_> = records
        .into_iter()
        .filter(|r| r.mover == PlayerColor::White)
        .map(|r| classify_move(r, &s.thresholds))
        .collect();
    GameStats::from_moves(game_id, &classified)
}

#[tokio::test]
async fn test_full_pipeline_classifies_a_white_blunder() {
    // 1.e4 e5 2.Qh5 Nc6: raw side-to-move evals scripted so that White's
    // second move throws away 330 centipawns.
    //
    //   start (White): +100 -> before(e4) = 100
    //   after e4 (Black): -80 -> e4 from White's view = +80
    //   after e5 (White): +80 -> before(Qh5) = 80
    //   after Qh5 (Black): +250 -> Qh5 from White's view = -250
    //   after Nc6 (White): -250 (not scored further; game ends here)
    let mut source = ScriptedSource::new(vec![cp(100), cp(-80), cp(80), cp(250), cp(-250)]);
    let moves = san(&["e4", "e5", "Qh5", "Nc6"]);

    let stats = analyze(&mut source, &moves, "g1").await;

    // White played two moves: e4 lost 20, Qh5 lost 330.
    assert_eq!(stats.moves_analyzed, 2);
    assert_eq!(stats.counts.ok, 1);
    assert_eq!(stats.counts.blunder, 1);
    assert_eq!(stats.flagged.len(), 1);
    assert_eq!(stats.flagged[0].record.san, "Qh5");
    assert_eq!(stats.flagged[0].cp_loss, Some(330));
    assert_eq!(stats.flagged[0].severity, Severity::Blunder);
    assert!((stats.avg_cp_loss - 175.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_engine_failure_mid_game_does_not_abort_analysis() {
    // The position after 2.Qh5 never gets a score (failure twice: once as
    // Qh5's "after", once re-asked as Nc6's "before").
    let mut source = ScriptedSource::new(vec![
        cp(100),
        cp(-80),
        cp(80),
        failure(),
        failure(),
        cp(-250),
    ]);
    let moves = san(&["e4", "e5", "Qh5", "Nc6"]);

    let s = settings();
    let records = sequence_game(&mut source, &s, &moves).await.unwrap();
    let classified: Vec<_> = records
        .into_iter()
        .map(|r| classify_move(r, &s.thresholds))
        .collect();
    let stats = GameStats::from_moves("g2", &classified);

    // All four moves are retained; exactly two lost their loss value.
    assert_eq!(stats.moves_analyzed, 4);
    assert_eq!(stats.scored_moves, 2);
    // The unscored moves classify as Ok rather than biasing the average.
    assert_eq!(stats.counts.ok, 4);
}

#[tokio::test]
async fn test_profile_over_two_games_weights_by_moves() {
    // Two one-sided fixtures built directly from classified moves via
    // the public fold; the profile must weight by scored move count.
    let thresholds = settings().thresholds;
    let mk = |game_id: &str, n: u32, loss: i32| {
        let classified: Vec<_> = (1..=n)
            .map(|ply| {
                classify_move(
                    insight_core::MoveRecord {
                        ply,
                        san: format!("m{ply}"),
                        uci: String::new(),
                        mover: PlayerColor::White,
                        eval_before: Some(loss),
                        eval_after: Some(0),
                        best_move: None,
                    },
                    &thresholds,
                )
            })
            .collect();
        GameStats::from_moves(game_id, &classified)
    };

    let games = vec![
        (meta("a", "rival", "e4 e5", Some(GameResult::Win)), mk("a", 20, 40)),
        (meta("b", "rival", "e4 e5", Some(GameResult::Loss)), mk("b", 60, 100)),
    ];
    let profile = build_profile("me", &games, vec![], 2);

    assert!((profile.overall.avg_cp_loss - 85.0).abs() < 1e-9);
    assert_eq!(profile.overall.games, 2);
    assert_eq!(profile.opponents["rival"].games, 2);
    assert!((profile.opponents["rival"].avg_cp_loss - 85.0).abs() < 1e-9);
}

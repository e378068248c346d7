//! Cross-game aggregation: fold many games' statistics into a
//! player-level profile with opening, opponent, and recurring-pattern
//! breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use chess_core::PlayerColor;

use crate::classify::Severity;
use crate::stats::{accuracy_from_acpl, GameStats, SeverityCounts};

/// Game result from the profiled player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    /// Map a PGN result tag to the player's outcome. Unfinished or
    /// unknown results ("*") yield None.
    pub fn from_pgn(result: &str, color: PlayerColor) -> Option<Self> {
        match (result, color) {
            ("1-0", PlayerColor::White) | ("0-1", PlayerColor::Black) => Some(GameResult::Win),
            ("1-0", PlayerColor::Black) | ("0-1", PlayerColor::White) => Some(GameResult::Loss),
            ("1/2-1/2", _) => Some(GameResult::Draw),
            _ => None,
        }
    }
}

/// Metadata tag carried alongside each game's statistics into the fold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMeta {
    pub game_id: String,
    pub opponent: String,
    pub player_color: PlayerColor,
    pub result: Option<GameResult>,
    /// Opening signature: the game's earliest moves, truncated to a
    /// fixed ply depth (the grouping key).
    pub opening: String,
    /// Human-readable opening name when the game source supplied one.
    pub opening_name: Option<String>,
    pub time_control: Option<String>,
    /// Game start in epoch milliseconds, when known.
    pub played_at_ms: Option<i64>,
}

/// Summed statistics for a group of games (everything, one opening, one
/// opponent). The fold is plain addition, so grouping and merge order
/// never change the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Wins over games, in percent.
    pub win_rate: f64,
    pub moves_analyzed: u32,
    pub scored_moves: u32,
    pub total_cp_loss: i64,
    pub counts: SeverityCounts,
    /// Average loss weighted by scored move count, not by game count.
    pub avg_cp_loss: f64,
    pub accuracy: f64,
}

impl GroupSummary {
    fn absorb(&mut self, meta: &GameMeta, stats: &GameStats) {
        self.games += 1;
        match meta.result {
            Some(GameResult::Win) => self.wins += 1,
            Some(GameResult::Loss) => self.losses += 1,
            Some(GameResult::Draw) => self.draws += 1,
            None => {}
        }
        self.moves_analyzed += stats.moves_analyzed;
        self.scored_moves += stats.scored_moves;
        self.total_cp_loss += stats.total_cp_loss;
        self.counts.merge(&stats.counts);
    }

    fn finalize(&mut self) {
        self.win_rate = if self.games > 0 {
            f64::from(self.wins) / f64::from(self.games) * 100.0
        } else {
            0.0
        };
        self.avg_cp_loss = if self.scored_moves > 0 {
            self.total_cp_loss as f64 / f64::from(self.scored_moves)
        } else {
            0.0
        };
        self.accuracy = accuracy_from_acpl(self.avg_cp_loss);
    }
}

/// A move the player keeps getting wrong: the same notation flagged at
/// Mistake-or-worse across multiple games, with its observed loss range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringBlunder {
    pub san: String,
    pub occurrences: u32,
    pub min_loss: i32,
    pub max_loss: i32,
}

/// Where in the game flagged moves cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub opening: u32,
    pub middlegame: u32,
    pub endgame: u32,
}

/// Phase boundaries in plies (10 and 25 full moves).
const OPENING_PLIES: u32 = 20;
const MIDDLEGAME_PLIES: u32 = 50;

impl PhaseCounts {
    fn bump(&mut self, ply: u32) {
        if ply <= OPENING_PLIES {
            self.opening += 1;
        } else if ply <= MIDDLEGAME_PLIES {
            self.middlegame += 1;
        } else {
            self.endgame += 1;
        }
    }
}

/// A game the batch could not analyze, with the reason it was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedGame {
    pub game_id: String,
    pub reason: String,
}

/// Player-level aggregate across many analyzed games. Plain serde data:
/// any formatter (text, JSON, CSV, chat) can consume it without the
/// aggregation logic leaking out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player: String,
    pub overall: GroupSummary,
    /// Keyed by opening signature.
    pub openings: BTreeMap<String, GroupSummary>,
    /// Keyed by opponent identifier.
    pub opponents: BTreeMap<String, GroupSummary>,
    pub recurring_blunders: Vec<RecurringBlunder>,
    pub flagged_by_phase: PhaseCounts,
    /// Games that could not be analyzed; always reported, never dropped.
    pub skipped: Vec<SkippedGame>,
    /// Moves whose evaluation failed across all analyzed games.
    pub failed_positions: u32,
}

/// Fold tagged game statistics into a PlayerProfile. Pure grouping and
/// sorting: the same input set yields the same profile in any order.
pub fn build_profile(
    player: &str,
    games: &[(GameMeta, GameStats)],
    skipped: Vec<SkippedGame>,
    min_recurrence: u32,
) -> PlayerProfile {
    let mut overall = GroupSummary::default();
    let mut openings: BTreeMap<String, GroupSummary> = BTreeMap::new();
    let mut opponents: BTreeMap<String, GroupSummary> = BTreeMap::new();
    let mut flagged_by_phase = PhaseCounts::default();
    let mut failed_positions = 0u32;

    for (meta, stats) in games {
        overall.absorb(meta, stats);
        openings
            .entry(meta.opening.clone())
            .or_default()
            .absorb(meta, stats);
        opponents
            .entry(meta.opponent.clone())
            .or_default()
            .absorb(meta, stats);
        failed_positions += stats.moves_analyzed - stats.scored_moves;
        for flagged in &stats.flagged {
            flagged_by_phase.bump(flagged.record.ply);
        }
    }

    overall.finalize();
    for summary in openings.values_mut() {
        summary.finalize();
    }
    for summary in opponents.values_mut() {
        summary.finalize();
    }

    PlayerProfile {
        player: player.to_string(),
        overall,
        openings,
        opponents,
        recurring_blunders: recurring_blunders(games, min_recurrence),
        flagged_by_phase,
        skipped,
        failed_positions,
    }
}

/// Group Mistake-or-worse moves across all games by notation, keep
/// groups seen at least `min_recurrence` times, and order them by
/// occurrence count desc, max loss desc, then notation — fully
/// deterministic under input permutation.
fn recurring_blunders(
    games: &[(GameMeta, GameStats)],
    min_recurrence: u32,
) -> Vec<RecurringBlunder> {
    let mut groups: BTreeMap<&str, RecurringBlunder> = BTreeMap::new();

    for (_, stats) in games {
        for flagged in &stats.flagged {
            debug_assert!(flagged.severity >= Severity::Mistake);
            let Some(loss) = flagged.cp_loss else { continue };
            groups
                .entry(flagged.record.san.as_str())
                .and_modify(|g| {
                    g.occurrences += 1;
                    g.min_loss = g.min_loss.min(loss);
                    g.max_loss = g.max_loss.max(loss);
                })
                .or_insert_with(|| RecurringBlunder {
                    san: flagged.record.san.clone(),
                    occurrences: 1,
                    min_loss: loss,
                    max_loss: loss,
                });
        }
    }

    let mut recurring: Vec<RecurringBlunder> = groups
        .into_values()
        .filter(|g| g.occurrences >= min_recurrence)
        .collect();
    recurring.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then(b.max_loss.cmp(&a.max_loss))
            .then(a.san.cmp(&b.san))
    });
    recurring
}

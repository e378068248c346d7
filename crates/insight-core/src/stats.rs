//! Per-game aggregation of classified moves.

use serde::{Deserialize, Serialize};

use crate::classify::{ClassifiedMove, Severity};

/// Tallies per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub ok: u32,
    pub inaccuracy: u32,
    pub mistake: u32,
    pub blunder: u32,
}

impl SeverityCounts {
    pub fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Ok => self.ok += 1,
            Severity::Inaccuracy => self.inaccuracy += 1,
            Severity::Mistake => self.mistake += 1,
            Severity::Blunder => self.blunder += 1,
        }
    }

    pub fn merge(&mut self, other: &SeverityCounts) {
        self.ok += other.ok;
        self.inaccuracy += other.inaccuracy;
        self.mistake += other.mistake;
        self.blunder += other.blunder;
    }

    pub fn total(&self) -> u32 {
        self.ok + self.inaccuracy + self.mistake + self.blunder
    }

    /// Mistake-or-worse tally.
    pub fn flagged(&self) -> u32 {
        self.mistake + self.blunder
    }
}

/// Statistics for one analyzed game. Immutable after construction;
/// serializes field-for-field so callers can persist and reload it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStats {
    pub game_id: String,
    pub counts: SeverityCounts,
    /// Every replayed move, including those with a missing evaluation.
    pub moves_analyzed: u32,
    /// Moves with an evaluation on both ends — the loss-average denominator.
    pub scored_moves: u32,
    pub total_cp_loss: i64,
    pub avg_cp_loss: f64,
    /// 0-100; 100 for a game with no measured loss (including zero moves).
    pub accuracy: f64,
    /// Mistake-or-worse moves, in ply order.
    pub flagged: Vec<ClassifiedMove>,
}

impl GameStats {
    /// Fold a game's classified moves into its statistics.
    pub fn from_moves(game_id: impl Into<String>, moves: &[ClassifiedMove]) -> Self {
        let mut counts = SeverityCounts::default();
        let mut scored_moves = 0u32;
        let mut total_cp_loss = 0i64;
        let mut flagged = Vec::new();

        for m in moves {
            counts.bump(m.severity);
            if let Some(loss) = m.cp_loss {
                scored_moves += 1;
                total_cp_loss += i64::from(loss);
            }
            if m.severity >= Severity::Mistake {
                flagged.push(m.clone());
            }
        }

        let avg_cp_loss = if scored_moves > 0 {
            total_cp_loss as f64 / f64::from(scored_moves)
        } else {
            0.0
        };

        Self {
            game_id: game_id.into(),
            counts,
            moves_analyzed: moves.len() as u32,
            scored_moves,
            total_cp_loss,
            avg_cp_loss,
            accuracy: accuracy_from_acpl(avg_cp_loss),
            flagged,
        }
    }
}

/// Accuracy as a function of average centipawn loss: 100 at zero loss,
/// strictly decreasing, bounded to [0, 100].
pub fn accuracy_from_acpl(acpl: f64) -> f64 {
    (100.0 * (1.0 / (1.0 + acpl / 100.0)).sqrt()).clamp(0.0, 100.0)
}

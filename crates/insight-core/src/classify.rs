//! Move classification — pure functions only
//! (No Position/Engine/Game dependencies)

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::sequencer::MoveRecord;

/// Move quality, ordered from harmless to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Inaccuracy,
    Mistake,
    Blunder,
}

/// Centipawn-loss cutoffs for each severity tier. Each threshold is an
/// inclusive lower bound: a loss exactly at `blunder` is a blunder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub inaccuracy: i32,
    pub mistake: i32,
    pub blunder: i32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            inaccuracy: 50,
            mistake: 100,
            blunder: 300,
        }
    }
}

impl SeverityThresholds {
    /// Thresholds must be strictly increasing and positive, otherwise
    /// every move would be silently misclassified.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.inaccuracy <= 0 {
            return Err(AnalysisError::Settings(
                "inaccuracy threshold must be positive",
            ));
        }
        if self.mistake <= self.inaccuracy {
            return Err(AnalysisError::Settings(
                "mistake threshold must exceed inaccuracy threshold",
            ));
        }
        if self.blunder <= self.mistake {
            return Err(AnalysisError::Settings(
                "blunder threshold must exceed mistake threshold",
            ));
        }
        Ok(())
    }

    pub fn classify(&self, cp_loss: i32) -> Severity {
        if cp_loss >= self.blunder {
            Severity::Blunder
        } else if cp_loss >= self.mistake {
            Severity::Mistake
        } else if cp_loss >= self.inaccuracy {
            Severity::Inaccuracy
        } else {
            Severity::Ok
        }
    }
}

/// Centipawn loss of a move given both evaluations in the mover's
/// perspective. An improvement is loss 0, never negative.
pub fn centipawn_loss(eval_before: i32, eval_after: i32) -> i32 {
    (eval_before - eval_after).max(0)
}

/// A move record together with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedMove {
    pub record: MoveRecord,
    /// None when either evaluation is missing; such moves are counted
    /// but excluded from loss averages.
    pub cp_loss: Option<i32>,
    pub severity: Severity,
}

/// Classify a single move. Deterministic and stateless.
pub fn classify_move(record: MoveRecord, thresholds: &SeverityThresholds) -> ClassifiedMove {
    match (record.eval_before, record.eval_after) {
        (Some(before), Some(after)) => {
            let loss = centipawn_loss(before, after);
            ClassifiedMove {
                record,
                cp_loss: Some(loss),
                severity: thresholds.classify(loss),
            }
        }
        _ => ClassifiedMove {
            record,
            cp_loss: None,
            severity: Severity::Ok,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_is_never_negative() {
        assert_eq!(centipawn_loss(100, 80), 20);
        assert_eq!(centipawn_loss(80, 100), 0);
        assert_eq!(centipawn_loss(-50, 30), 0);
        assert_eq!(centipawn_loss(-30, -300), 270);
        assert_eq!(centipawn_loss(0, 0), 0);
    }

    #[test]
    fn test_thresholds_are_inclusive_lower_bounds() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(49), Severity::Ok);
        assert_eq!(t.classify(50), Severity::Inaccuracy);
        assert_eq!(t.classify(99), Severity::Inaccuracy);
        assert_eq!(t.classify(100), Severity::Mistake);
        assert_eq!(t.classify(299), Severity::Mistake);
        assert_eq!(t.classify(300), Severity::Blunder);
        assert_eq!(t.classify(10_000), Severity::Blunder);
    }

    #[test]
    fn test_severity_is_monotonic_in_loss() {
        let t = SeverityThresholds::default();
        let mut last = Severity::Ok;
        for loss in 0..400 {
            let s = t.classify(loss);
            assert!(s >= last, "severity decreased at loss {loss}");
            last = s;
        }
    }

    #[test]
    fn test_validate_rejects_non_monotonic_thresholds() {
        let t = SeverityThresholds {
            inaccuracy: 100,
            mistake: 50,
            blunder: 300,
        };
        assert!(t.validate().is_err());

        let t = SeverityThresholds {
            inaccuracy: 50,
            mistake: 100,
            blunder: 100,
        };
        assert!(t.validate().is_err());

        assert!(SeverityThresholds::default().validate().is_ok());
    }
}

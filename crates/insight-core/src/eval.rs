//! Raw engine evaluations and their normalization to signed centipawns.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Result of a single position evaluation, as the engine reports it:
/// the score is from the perspective of the side to move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEval {
    /// Centipawn score; absent when the engine reported a mate instead.
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates).
    pub mate: Option<i32>,
    /// Best move in UCI notation, empty if the engine gave none.
    pub best_move: String,
}

impl RawEval {
    /// Collapse to a single signed centipawn value, still from the side
    /// to move's perspective. Mate scores map to a finite magnitude near
    /// `mate_cap` with sign preserved, shaded by distance so a faster
    /// mate scores higher. Returns None when the engine reported
    /// neither a score nor a mate.
    pub fn to_signed_cp(&self, mate_cap: i32) -> Option<i32> {
        if let Some(m) = self.mate {
            Some(if m > 0 {
                mate_cap - m * 10
            } else {
                -mate_cap - m * 10
            })
        } else {
            self.cp
        }
    }

    pub fn best_move(&self) -> Option<&str> {
        if self.best_move.is_empty() {
            None
        } else {
            Some(&self.best_move)
        }
    }
}

/// Anything that can score a position: a live UCI engine in production,
/// a scripted stand-in under test.
pub trait EvaluationSource {
    fn evaluate(
        &mut self,
        fen: &str,
    ) -> impl std::future::Future<Output = Result<RawEval, EngineError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(v: i32) -> RawEval {
        RawEval {
            cp: Some(v),
            mate: None,
            best_move: String::new(),
        }
    }

    fn mate(n: i32) -> RawEval {
        RawEval {
            cp: None,
            mate: Some(n),
            best_move: String::new(),
        }
    }

    #[test]
    fn test_cp_score_passes_through() {
        assert_eq!(cp(35).to_signed_cp(10_000), Some(35));
        assert_eq!(cp(-120).to_signed_cp(10_000), Some(-120));
    }

    #[test]
    fn test_mate_normalizes_to_finite_cap_with_sign() {
        assert_eq!(mate(1).to_signed_cp(10_000), Some(9_990));
        assert_eq!(mate(3).to_signed_cp(10_000), Some(9_970));
        assert_eq!(mate(-2).to_signed_cp(10_000), Some(-9_980));
    }

    #[test]
    fn test_faster_mate_scores_higher() {
        let fast = mate(1).to_signed_cp(10_000).unwrap();
        let slow = mate(8).to_signed_cp(10_000).unwrap();
        assert!(fast > slow);
    }

    #[test]
    fn test_empty_eval_is_none() {
        assert_eq!(RawEval::default().to_signed_cp(10_000), None);
    }
}

//! Analysis settings — explicit configuration passed into the pipeline,
//! never process-wide state, so concurrent analyses with different
//! thresholds cannot interfere.

use crate::classify::SeverityThresholds;
use crate::error::AnalysisError;

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub thresholds: SeverityThresholds,

    /// Finite magnitude that mate-in-N scores normalize to, sign preserved.
    pub mate_cap: i32,

    /// Search nodes per position evaluation.
    pub nodes_per_position: u32,

    /// Wall-clock budget for a single evaluation call.
    pub eval_timeout_ms: u64,

    /// Extra attempts after a failed evaluation call before the position
    /// is recorded as unevaluated.
    pub max_eval_retries: u32,

    /// Plies kept in the opening signature used as a grouping key.
    pub opening_plies: usize,

    /// Minimum occurrences before a flagged move counts as recurring.
    pub min_recurrence: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            mate_cap: 10_000,
            nodes_per_position: 100_000,
            eval_timeout_ms: 10_000,
            max_eval_retries: 1,
            opening_plies: chess_core::opening::DEFAULT_SIGNATURE_PLIES,
            min_recurrence: 2,
        }
    }
}

impl AnalysisSettings {
    /// Validated before any analysis begins; invalid settings are fatal.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.thresholds.validate()?;
        if self.mate_cap <= self.thresholds.blunder {
            return Err(AnalysisError::Settings(
                "mate cap must exceed the blunder threshold",
            ));
        }
        if self.nodes_per_position == 0 {
            return Err(AnalysisError::Settings(
                "nodes per position must be positive",
            ));
        }
        if self.eval_timeout_ms == 0 {
            return Err(AnalysisError::Settings("evaluation timeout must be positive"));
        }
        if self.opening_plies == 0 {
            return Err(AnalysisError::Settings("opening signature needs at least one ply"));
        }
        Ok(())
    }
}

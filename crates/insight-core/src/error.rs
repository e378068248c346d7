//! Analysis error types

use thiserror::Error;

/// Failures talking to the evaluation engine. Always recoverable at the
/// call site: a failed evaluation becomes a missing value, never a
/// batch abort.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine: {0}")]
    Spawn(String),

    #[error("engine I/O error: {0}")]
    Io(String),

    #[error("engine timed out after {0}ms")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Invalid settings. Fatal before any analysis begins.
    #[error("configuration error: {0}")]
    Settings(&'static str),

    /// Move list inconsistent with legal play. Skips the game, not the batch.
    #[error("malformed game data at ply {ply} ({san}): {reason}")]
    MalformedGame {
        ply: u32,
        san: String,
        reason: String,
    },
}

//! Engine-backed chess game analysis.
//!
//! The pipeline runs one way: a game's moves are replayed and scored by
//! an [`EvaluationSource`] ([`sequencer`]), each evaluation pair becomes
//! a centipawn loss and severity ([`classify`]), a game's classified
//! moves fold into [`stats::GameStats`], and many tagged games fold into
//! a [`profile::PlayerProfile`].

pub mod classify;
pub mod error;
pub mod eval;
pub mod profile;
pub mod sequencer;
pub mod settings;
pub mod stats;
pub mod stockfish;

pub use classify::{classify_move, ClassifiedMove, Severity, SeverityThresholds};
pub use error::{AnalysisError, EngineError};
pub use eval::{EvaluationSource, RawEval};
pub use profile::{
    build_profile, GameMeta, GameResult, PlayerProfile, RecurringBlunder, SkippedGame,
};
pub use sequencer::{sequence_game, MoveRecord};
pub use settings::AnalysisSettings;
pub use stats::{GameStats, SeverityCounts};
pub use stockfish::StockfishEngine;

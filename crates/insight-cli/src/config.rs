//! Configuration from environment variables (with .env support via
//! dotenvy in main). CLI flags override these at the call sites.

use std::env;
use std::path::PathBuf;

use insight_core::{AnalysisSettings, SeverityThresholds};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Lichess personal API token. Optional: the public export
    /// endpoints work anonymously at a lower rate limit.
    pub lichess_token: Option<String>,

    /// Default username to analyze when no --username flag is given.
    pub username: Option<String>,

    /// Path to the Stockfish binary.
    pub stockfish_path: String,

    /// Search nodes per position evaluation.
    pub nodes_per_position: u32,

    /// Wall-clock budget per evaluation call.
    pub eval_timeout_ms: u64,

    /// Games fetched when --games is not given.
    pub default_num_games: usize,

    /// Directory for reports, exports, and saved profiles.
    pub output_dir: PathBuf,

    /// Directory for cached per-game analysis; None disables caching.
    pub cache_dir: Option<PathBuf>,

    /// Severity cutoffs, overridable per tier from the environment.
    pub thresholds: SeverityThresholds,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = SeverityThresholds::default();

        let cache_dir = match env::var("ANALYSIS_CACHE_DIR") {
            Ok(v) if v.is_empty() || v == "off" => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => Some(PathBuf::from(".analysis_cache")),
        };

        Self {
            lichess_token: env::var("LICHESS_API_TOKEN").ok().filter(|t| !t.is_empty()),
            username: env::var("LICHESS_USERNAME").ok().filter(|u| !u.is_empty()),
            stockfish_path: env::var("STOCKFISH_PATH")
                .unwrap_or_else(|_| "stockfish".to_string()),
            nodes_per_position: env::var("NODES_PER_POSITION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100_000),
            eval_timeout_ms: env::var("EVAL_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            default_num_games: env::var("DEFAULT_NUM_GAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            output_dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("analysis_results")),
            cache_dir,
            thresholds: SeverityThresholds {
                inaccuracy: env::var("INACCURACY_CP")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.inaccuracy),
                mistake: env::var("MISTAKE_CP")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.mistake),
                blunder: env::var("BLUNDER_CP")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.blunder),
            },
        }
    }

    /// Analysis settings for this run. Validation happens in main,
    /// before any game is fetched or any engine spawned.
    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            thresholds: self.thresholds,
            nodes_per_position: self.nodes_per_position,
            eval_timeout_ms: self.eval_timeout_ms,
            ..Default::default()
        }
    }
}

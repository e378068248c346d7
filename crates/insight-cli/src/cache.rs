//! Analysis cache for faster re-runs: per-game statistics keyed by the
//! PGN and the engine settings that produced them, stored as JSON files.

use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use chess_core::PlayerColor;
use insight_core::{AnalysisSettings, GameStats};

pub struct AnalysisCache {
    dir: PathBuf,
}

impl AnalysisCache {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Cache key: any input that changes the result is hashed in — the
    /// game itself, the side being scored, and the settings that steer
    /// the engine and the classifier.
    fn key(pgn: &str, color: PlayerColor, settings: &AnalysisSettings) -> String {
        let mut hasher = Sha256::new();
        hasher.update(pgn.as_bytes());
        hasher.update([match color {
            PlayerColor::White => b'w',
            PlayerColor::Black => b'b',
        }]);
        hasher.update(settings.nodes_per_position.to_le_bytes());
        hasher.update(settings.mate_cap.to_le_bytes());
        hasher.update(settings.thresholds.inaccuracy.to_le_bytes());
        hasher.update(settings.thresholds.mistake.to_le_bytes());
        hasher.update(settings.thresholds.blunder.to_le_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    fn path_for(&self, pgn: &str, color: PlayerColor, settings: &AnalysisSettings) -> PathBuf {
        self.dir
            .join(format!("{}.json", Self::key(pgn, color, settings)))
    }

    pub fn get(
        &self,
        pgn: &str,
        color: PlayerColor,
        settings: &AnalysisSettings,
    ) -> Option<GameStats> {
        let path = self.path_for(pgn, color, settings);
        let data = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(stats) => {
                debug!(path = %path.display(), "analysis cache hit");
                Some(stats)
            }
            Err(e) => {
                // Corrupt entry: drop it and recompute.
                warn!(path = %path.display(), error = %e, "removing corrupt cache entry");
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Best-effort write; a failed cache store never fails the analysis.
    pub fn put(
        &self,
        pgn: &str,
        color: PlayerColor,
        settings: &AnalysisSettings,
        stats: &GameStats,
    ) {
        let path = self.path_for(pgn, color, settings);
        match serde_json::to_string(stats) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!(path = %path.display(), error = %e, "failed to store cache entry");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize cache entry"),
        }
    }

    pub fn clear(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(game_id: &str) -> GameStats {
        GameStats::from_moves(game_id, &[])
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path()).unwrap();
        let settings = AnalysisSettings::default();

        assert!(cache.get("pgn", PlayerColor::White, &settings).is_none());
        cache.put("pgn", PlayerColor::White, &settings, &stats("g1"));

        let back = cache.get("pgn", PlayerColor::White, &settings).unwrap();
        assert_eq!(back.game_id, "g1");
    }

    #[test]
    fn test_key_depends_on_color_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path()).unwrap();
        let settings = AnalysisSettings::default();
        cache.put("pgn", PlayerColor::White, &settings, &stats("g1"));

        // Other side of the same game: different entry.
        assert!(cache.get("pgn", PlayerColor::Black, &settings).is_none());

        // Deeper search: different entry.
        let deeper = AnalysisSettings {
            nodes_per_position: 500_000,
            ..Default::default()
        };
        assert!(cache.get("pgn", PlayerColor::White, &deeper).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path()).unwrap();
        let settings = AnalysisSettings::default();

        let path = cache.path_for("pgn", PlayerColor::White, &settings);
        fs::write(&path, "not json").unwrap();

        assert!(cache.get("pgn", PlayerColor::White, &settings).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path()).unwrap();
        let settings = AnalysisSettings::default();
        cache.put("a", PlayerColor::White, &settings, &stats("a"));
        cache.put("b", PlayerColor::White, &settings, &stats("b"));

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(cache.get("a", PlayerColor::White, &settings).is_none());
    }
}

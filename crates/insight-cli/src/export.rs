//! JSON and CSV export of analysis results.

use std::fs;
use std::path::Path;

use insight_core::{GameMeta, GameStats, PlayerProfile};

use crate::error::CliError;
use crate::report::format_date;

/// Persist a profile as pretty JSON. Round-trips every field, so a
/// saved profile can be reloaded and re-rendered later.
pub fn write_profile_json(path: &Path, profile: &PlayerProfile) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn read_profile_json(path: &Path) -> Result<PlayerProfile, CliError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// One CSV row per analyzed game.
pub fn write_games_csv(
    path: &Path,
    games: &[(GameMeta, GameStats)],
) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "game_id",
        "date",
        "opponent",
        "color",
        "result",
        "time_control",
        "moves",
        "accuracy",
        "avg_cp_loss",
        "inaccuracies",
        "mistakes",
        "blunders",
    ])?;

    for (meta, stats) in games {
        let row = vec![
            meta.game_id.clone(),
            format_date(meta.played_at_ms),
            meta.opponent.clone(),
            format!("{:?}", meta.player_color).to_lowercase(),
            meta.result
                .map(|r| format!("{r:?}").to_lowercase())
                .unwrap_or_default(),
            meta.time_control.clone().unwrap_or_default(),
            stats.moves_analyzed.to_string(),
            format!("{:.1}", stats.accuracy),
            format!("{:.1}", stats.avg_cp_loss),
            stats.counts.inaccuracy.to_string(),
            stats.counts.mistake.to_string(),
            stats.counts.blunder.to_string(),
        ];
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

//! Text report rendering over the analysis records. Reads GameStats and
//! PlayerProfile as plain data; no analysis logic lives here.

use std::fmt::Write;

use chrono::{TimeZone, Utc};

use chess_core::GameData;
use insight_core::{ClassifiedMove, GameStats, PlayerProfile};

const RULE: &str = "============================================================";

/// Feedback for a single analyzed game, both sides.
pub fn game_report(game: &GameData, white: &GameStats, black: &GameStats) -> String {
    let meta = &game.metadata;
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "GAME ANALYSIS: {} vs {} ({})",
        meta.white, meta.black, meta.result
    );
    let _ = writeln!(out, "{RULE}");
    if let Some(ref tc) = meta.time_control {
        let _ = writeln!(out, "Time control: {tc}");
    }
    if let Some(ref opening) = meta.opening {
        let _ = writeln!(out, "Opening: {opening}");
    }
    let _ = writeln!(out);

    side_summary(&mut out, &format!("White ({})", meta.white), white);
    side_summary(&mut out, &format!("Black ({})", meta.black), black);

    let mut flagged: Vec<&ClassifiedMove> =
        white.flagged.iter().chain(black.flagged.iter()).collect();
    flagged.sort_by_key(|m| m.record.ply);

    if !flagged.is_empty() {
        let _ = writeln!(out, "Key mistakes:");
        for m in flagged.iter().take(5) {
            let loss = m
                .cp_loss
                .map(|l| format!("{l}cp"))
                .unwrap_or_else(|| "?".to_string());
            let best = m
                .record
                .best_move
                .as_deref()
                .map(|b| format!(" (best {b})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  ply {:>3}  {:<7} {}, lost {}{}",
                m.record.ply,
                m.record.san,
                severity_label(m.severity),
                loss,
                best
            );
        }
    }

    out
}

fn severity_label(severity: insight_core::Severity) -> &'static str {
    match severity {
        insight_core::Severity::Ok => "ok",
        insight_core::Severity::Inaccuracy => "inaccuracy",
        insight_core::Severity::Mistake => "mistake",
        insight_core::Severity::Blunder => "blunder",
    }
}

fn side_summary(out: &mut String, label: &str, stats: &GameStats) {
    let _ = writeln!(
        out,
        "{label}: accuracy {:.1}%, avg loss {:.1}cp over {} moves",
        stats.accuracy, stats.avg_cp_loss, stats.moves_analyzed
    );
    let _ = writeln!(
        out,
        "  inaccuracies {}, mistakes {}, blunders {}",
        stats.counts.inaccuracy, stats.counts.mistake, stats.counts.blunder
    );
}

/// The overall performance report across every analyzed game.
pub fn profile_report(profile: &PlayerProfile) -> String {
    let mut out = String::new();
    let overall = &profile.overall;

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "PERFORMANCE REPORT: {}", profile.player);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Games analyzed: {} ({}W/{}L/{}D, {:.1}% win rate)",
        overall.games, overall.wins, overall.losses, overall.draws, overall.win_rate
    );
    let _ = writeln!(
        out,
        "Accuracy: {:.1}% | Average loss: {:.1}cp over {} scored moves",
        overall.accuracy, overall.avg_cp_loss, overall.scored_moves
    );
    let _ = writeln!(
        out,
        "Move quality: {} ok, {} inaccuracies, {} mistakes, {} blunders",
        overall.counts.ok,
        overall.counts.inaccuracy,
        overall.counts.mistake,
        overall.counts.blunder
    );
    if profile.failed_positions > 0 {
        let _ = writeln!(
            out,
            "Positions without an evaluation: {}",
            profile.failed_positions
        );
    }
    let _ = writeln!(out);

    if !profile.openings.is_empty() {
        let _ = writeln!(out, "OPENINGS (by games played):");
        let mut openings: Vec<_> = profile.openings.iter().collect();
        openings.sort_by(|a, b| b.1.games.cmp(&a.1.games).then(a.0.cmp(b.0)));
        for (line, summary) in openings.iter().take(5) {
            let _ = writeln!(
                out,
                "  {:<40} {} games, {:.1}% wins, {:.1}cp avg loss",
                truncate(line, 40),
                summary.games,
                summary.win_rate,
                summary.avg_cp_loss
            );
        }
        let _ = writeln!(out);
    }

    if !profile.opponents.is_empty() {
        let _ = writeln!(out, "OPPONENTS:");
        let mut opponents: Vec<_> = profile.opponents.iter().collect();
        opponents.sort_by(|a, b| b.1.games.cmp(&a.1.games).then(a.0.cmp(b.0)));
        for (name, summary) in opponents.iter().take(5) {
            let _ = writeln!(
                out,
                "  {:<20} {}-{}-{} ({:.1}% wins), accuracy {:.1}%",
                name, summary.wins, summary.losses, summary.draws, summary.win_rate,
                summary.accuracy
            );
        }
        let _ = writeln!(out);
    }

    if !profile.recurring_blunders.is_empty() {
        let _ = writeln!(out, "RECURRING MISTAKES:");
        for r in profile.recurring_blunders.iter().take(5) {
            let range = if r.min_loss == r.max_loss {
                format!("{}cp", r.max_loss)
            } else {
                format!("{}-{}cp", r.min_loss, r.max_loss)
            };
            let _ = writeln!(out, "  {:<7} {} times, losing {}", r.san, r.occurrences, range);
        }
        let _ = writeln!(out);
    }

    let phases = &profile.flagged_by_phase;
    if phases.opening + phases.middlegame + phases.endgame > 0 {
        let _ = writeln!(
            out,
            "MISTAKE TIMING: opening {}, middlegame {}, endgame {}",
            phases.opening, phases.middlegame, phases.endgame
        );
        let _ = writeln!(out);
    }

    if !profile.skipped.is_empty() {
        let _ = writeln!(out, "SKIPPED GAMES ({}):", profile.skipped.len());
        for s in &profile.skipped {
            let _ = writeln!(out, "  {}: {}", s.game_id, s.reason);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "RECOMMENDATIONS:");
    for rec in recommendations(profile) {
        let _ = writeln!(out, "  - {rec}");
    }

    out
}

/// Rule-based training advice derived from the aggregate numbers.
fn recommendations(profile: &PlayerProfile) -> Vec<String> {
    let overall = &profile.overall;
    let mut recs = Vec::new();

    if overall.counts.blunder > overall.games {
        recs.push("Focus on tactical puzzles to reduce blunders".to_string());
    }

    if overall.accuracy < 75.0 {
        recs.push("Work on calculation skills to improve accuracy".to_string());
    } else if overall.accuracy < 85.0 {
        recs.push("Good accuracy - focus on positional understanding".to_string());
    }

    if overall.games >= 3 {
        if overall.win_rate < 40.0 {
            recs.push("Study fundamental endgames and opening principles".to_string());
        } else if overall.win_rate > 60.0 {
            recs.push("Excellent results - challenge stronger opponents".to_string());
        }
    }

    if let Some(worst) = profile
        .recurring_blunders
        .first()
        .filter(|r| r.occurrences >= 3)
    {
        recs.push(format!(
            "The move {} keeps costing you material - review those positions",
            worst.san
        ));
    }

    let phases = &profile.flagged_by_phase;
    if phases.endgame > phases.opening && phases.endgame > phases.middlegame {
        recs.push("Most mistakes come in the endgame - improve technique there".to_string());
    } else if phases.opening > phases.middlegame && phases.opening > phases.endgame {
        recs.push("Most mistakes come in the opening - tighten your repertoire".to_string());
    }

    if recs.is_empty() {
        recs.push("Continue your current training regimen".to_string());
    }
    recs
}

/// Human-readable timestamp for exports.
pub fn format_date(played_at_ms: Option<i64>) -> String {
    played_at_ms
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

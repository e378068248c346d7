//! chess-insight: fetch a player's Lichess games, score every move with
//! a local Stockfish, and report blunders, accuracy, and recurring
//! weaknesses.

mod cache;
mod clients;
mod config;
mod error;
mod export;
mod report;
mod runner;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use insight_core::{build_profile, StockfishEngine};

use crate::cache::AnalysisCache;
use crate::clients::lichess::{GameQuery, LichessClient};
use crate::config::AppConfig;
use crate::error::CliError;

#[derive(Parser)]
#[command(
    name = "chess-insight",
    version,
    about = "Analyze Lichess games with Stockfish: blunder detection and performance reports"
)]
struct Cli {
    /// Lichess username to analyze (overrides LICHESS_USERNAME)
    #[arg(short, long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze recent games and build a performance profile
    Recent {
        /// Number of games to fetch
        #[arg(short, long)]
        games: Option<usize>,

        /// Filter by perf type (bullet, blitz, rapid, classical)
        #[arg(short, long)]
        time_control: Option<String>,

        /// Only games from the last N days
        #[arg(short, long)]
        days: Option<i64>,

        /// Rated games only
        #[arg(long)]
        rated: bool,

        /// Concurrent engine processes (default: CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Write per-game rows to a CSV file in the output directory
        #[arg(long)]
        export_csv: bool,

        /// Save the profile as JSON in the output directory
        #[arg(long)]
        save: bool,

        /// Bypass the analysis cache for this run
        #[arg(long)]
        no_cache: bool,
    },

    /// Analyze a single game by Lichess id
    Game {
        id: String,
    },

    /// Render the report for a previously saved profile
    Load {
        path: PathBuf,
    },

    /// Remove all cached per-game analysis
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load .env for local use
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Command::Recent {
            games,
            time_control,
            days,
            rated,
            jobs,
            export_csv,
            save,
            no_cache,
        } => {
            run_recent(
                &config,
                cli.username,
                RecentOpts {
                    games,
                    time_control,
                    days,
                    rated,
                    jobs,
                    export_csv,
                    save,
                    no_cache,
                },
            )
            .await
        }
        Command::Game { id } => run_game(&config, &id).await,
        Command::Load { path } => {
            let profile = export::read_profile_json(&path)?;
            println!("{}", report::profile_report(&profile));
            Ok(())
        }
        Command::ClearCache => {
            let Some(ref dir) = config.cache_dir else {
                println!("Analysis cache is disabled");
                return Ok(());
            };
            let removed = AnalysisCache::new(dir)?.clear()?;
            println!("Removed {removed} cached analyses");
            Ok(())
        }
    }
}

struct RecentOpts {
    games: Option<usize>,
    time_control: Option<String>,
    days: Option<i64>,
    rated: bool,
    jobs: Option<usize>,
    export_csv: bool,
    save: bool,
    no_cache: bool,
}

async fn run_recent(
    config: &AppConfig,
    username: Option<String>,
    opts: RecentOpts,
) -> anyhow::Result<()> {
    let username = username
        .or_else(|| config.username.clone())
        .ok_or(CliError::Config(
            "username required: pass --username or set LICHESS_USERNAME",
        ))?;

    // Settings are validated before anything is fetched or spawned.
    let settings = config.settings();
    settings.validate()?;

    let client = LichessClient::new(config.lichess_token.clone())?;
    let max_games = opts.games.unwrap_or(config.default_num_games);
    let query = GameQuery {
        max_games: Some(max_games),
        perf_type: opts.time_control,
        since_ms: opts
            .days
            .map(|d| (Utc::now() - chrono::Duration::days(d)).timestamp_millis()),
        rated: opts.rated.then_some(true),
    };

    println!("Fetching up to {max_games} games for {username}...");
    let fetched = client.fetch_user_games(&username, &query).await?;
    if fetched.games.is_empty() {
        println!("No games found");
        return Ok(());
    }
    println!("Found {} games, analyzing...", fetched.games.len());

    let cache = match (&config.cache_dir, opts.no_cache) {
        (Some(dir), false) => Some(Arc::new(AnalysisCache::new(dir)?)),
        _ => None,
    };
    let jobs = opts.jobs.unwrap_or_else(num_cpus::get);

    let outcome = runner::run_batch(
        &config.stockfish_path,
        &settings,
        &username,
        fetched.games,
        jobs,
        cache,
    )
    .await?;

    let mut skipped = fetched.skipped;
    skipped.extend(outcome.skipped);
    let profile = build_profile(&username, &outcome.analyzed, skipped, settings.min_recurrence);

    println!("{}", report::profile_report(&profile));
    if outcome.cancelled {
        println!("Interrupted: games past the last boundary were skipped; everything above is complete.");
    }

    if opts.export_csv {
        let path = config
            .output_dir
            .join(format!("{username}_{}_games.csv", timestamp()));
        export::write_games_csv(&path, &outcome.analyzed)?;
        println!("Exported CSV to {}", path.display());
    }
    if opts.save {
        let path = config
            .output_dir
            .join(format!("{username}_{}_profile.json", timestamp()));
        export::write_profile_json(&path, &profile)?;
        println!("Saved profile to {}", path.display());
    }

    Ok(())
}

async fn run_game(config: &AppConfig, game_id: &str) -> anyhow::Result<()> {
    let settings = config.settings();
    settings.validate()?;

    let client = LichessClient::new(config.lichess_token.clone())?;
    println!("Fetching game {game_id}...");
    let game = client.fetch_game(game_id).await?;
    info!(moves = game.moves.len(), "game fetched");

    let mut engine = StockfishEngine::new(
        &config.stockfish_path,
        settings.nodes_per_position,
        settings.eval_timeout_ms,
    )
    .await?;
    let result = runner::analyze_single(&mut engine, &settings, &game).await;
    // The engine is released before the analysis result is unwrapped.
    engine.quit().await;

    let (white, black) = result?;
    println!("{}", report::game_report(&game, &white, &black));
    Ok(())
}

fn timestamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

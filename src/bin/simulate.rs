use anyhow::Context;
use chess_quest_engine::catalog::LevelCatalog;
use chess_quest_engine::catalog_store::resolve_catalog;
use chess_quest_engine::constants::{DEFAULT_PLAYOUTS, DEFAULT_PLAYOUT_MAX_MOVES};
use chess_quest_engine::level::{validate, Level, OverlapPolicy};
use chess_quest_engine::session::{MoveOutcome, PuzzleSession};
use chess_quest_engine::solver::{solve, SolveOutcome, SolverLimits};
use chess_quest_engine::types::{GameState, PieceType, Position};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Level pack to check instead of the built-in curriculum.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Only check these level ids (repeatable).
    #[arg(long = "level")]
    levels: Vec<String>,
    /// Only check levels played with this piece.
    #[arg(long)]
    piece: Option<String>,
    #[arg(long, default_value_t = DEFAULT_PLAYOUTS)]
    playouts: usize,
    #[arg(long, default_value_t = DEFAULT_PLAYOUT_MAX_MOVES)]
    max_moves: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Treat overlapping entities as an error.
    #[arg(long)]
    strict_overlaps: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum PlayoutEnd {
    Won,
    Lost,
    Stuck,
    Exhausted,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
struct PlayoutStats {
    won: usize,
    lost: usize,
    stuck: usize,
    exhausted: usize,
}

impl PlayoutStats {
    fn record(&mut self, end: PlayoutEnd) {
        match end {
            PlayoutEnd::Won => self.won += 1,
            PlayoutEnd::Lost => self.lost += 1,
            PlayoutEnd::Stuck => self.stuck += 1,
            PlayoutEnd::Exhausted => self.exhausted += 1,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct LevelResultLine {
    #[serde(rename = "levelId")]
    level_id: String,
    #[serde(rename = "levelNumber")]
    level_number: u32,
    #[serde(rename = "worldId")]
    world_id: String,
    piece: PieceType,
    seed: u64,
    solved: bool,
    #[serde(rename = "solutionLength", skip_serializing_if = "Option::is_none")]
    solution_length: Option<usize>,
    solution: Vec<Position>,
    #[serde(rename = "statesExplored")]
    states_explored: usize,
    playouts: PlayoutStats,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "levelCount")]
    level_count: usize,
    #[serde(rename = "solvedCount")]
    solved_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageSolutionLength")]
    average_solution_length: f64,
    #[serde(rename = "playoutTotals")]
    playout_totals: BTreeMap<String, usize>,
    levels: Vec<LevelResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "levelId", skip_serializing_if = "Option::is_none")]
    level_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    details: Value,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_quest_engine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let catalog = resolve_catalog(cli.catalog.as_deref()).context("failed to load level catalog")?;
    let piece = cli
        .piece
        .as_deref()
        .map(|name| PieceType::parse(name).with_context(|| format!("unknown piece {name:?}")))
        .transpose()?;
    let levels = select_levels(&catalog, &cli.levels, piece)?;
    let base_seed = cli.seed.unwrap_or_else(rand::random);
    let started_at = now_rfc3339();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, Utc::now().timestamp_millis()));
    let policy = if cli.strict_overlaps {
        OverlapPolicy::Reject
    } else {
        OverlapPolicy::Warn
    };

    let mut results = Vec::new();
    for (index, level) in levels.iter().enumerate() {
        let seed = level_seed(base_seed, index);
        emit_log(
            "info",
            "level_started",
            &run_id,
            Some(&level.id),
            Some(seed),
            json!({
                "piece": level.player.piece_type,
                "boardSize": level.board_size,
                "squares": level.board_size.area(),
                "enemies": level.enemies.len(),
            }),
        );

        let result = check_level(level, seed, &cli, policy);
        for anomaly in &result.anomalies {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&level.id),
                Some(seed),
                json!({ "message": anomaly }),
            );
        }
        emit_log(
            "info",
            "level_finished",
            &run_id,
            Some(&level.id),
            Some(seed),
            json!({
                "solved": result.solved,
                "solutionLength": result.solution_length,
                "playouts": result.playouts,
            }),
        );

        println!("{}", serde_json::to_string(&result)?);
        results.push(result);
    }

    let summary = build_run_summary(run_id.clone(), started_at, now_rfc3339(), results);
    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "levelCount": summary.level_count,
            "solvedCount": summary.solved_count,
            "anomalyCount": summary.anomaly_count,
            "playoutTotals": summary.playout_totals,
            "summaryOut": summary_out_written,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn select_levels(
    catalog: &LevelCatalog,
    ids: &[String],
    piece: Option<PieceType>,
) -> anyhow::Result<Vec<Level>> {
    let levels: Vec<Level> = if ids.is_empty() {
        catalog.levels().to_vec()
    } else {
        ids.iter()
            .map(|id| {
                catalog
                    .get_level_by_id(id)
                    .cloned()
                    .with_context(|| format!("unknown level id {id:?}"))
            })
            .collect::<anyhow::Result<_>>()?
    };
    Ok(levels
        .into_iter()
        .filter(|level| piece.map_or(true, |piece| level.player.piece_type == piece))
        .collect())
}

fn check_level(level: &Level, seed: u64, cli: &Cli, policy: OverlapPolicy) -> LevelResultLine {
    let mut result = LevelResultLine {
        level_id: level.id.clone(),
        level_number: level.level_number,
        world_id: level.world_id.clone(),
        piece: level.player.piece_type,
        seed,
        solved: false,
        solution_length: None,
        solution: Vec::new(),
        states_explored: 0,
        playouts: PlayoutStats::default(),
        anomalies: Vec::new(),
    };

    if let Err(error) = validate(level, policy) {
        result.anomalies.push(format!("invalid level: {error}"));
        return result;
    }

    match solve(level, SolverLimits::default()) {
        Ok(outcome) => {
            result.states_explored = outcome.explored();
            match outcome {
                SolveOutcome::Solved { moves, .. } => {
                    result.solved = true;
                    result.solution_length = Some(moves.len());
                    result.solution = moves;
                }
                SolveOutcome::Unsolvable { explored } => result
                    .anomalies
                    .push(format!("no winning sequence after {explored} states")),
                SolveOutcome::LimitReached { explored } => result
                    .anomalies
                    .push(format!("solver limit reached after {explored} states")),
            }
        }
        Err(error) => result.anomalies.push(format!("solver refused level: {error}")),
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..cli.playouts {
        match run_playout(level, &mut rng, cli.max_moves) {
            Ok(end) => result.playouts.record(end),
            Err(message) => {
                push_anomaly(&mut result.anomalies, message);
            }
        }
    }
    result
}

/// Plays uniformly random legal moves until the level ends or stalls.
fn run_playout(level: &Level, rng: &mut StdRng, max_moves: usize) -> Result<PlayoutEnd, String> {
    let mut session =
        PuzzleSession::new(level.clone()).map_err(|error| format!("session refused level: {error}"))?;
    for _ in 0..max_moves {
        let moves = session.valid_moves();
        if moves.is_empty() {
            return Ok(PlayoutEnd::Stuck);
        }
        let to = moves[rng.random_range(0..moves.len())];
        match session.move_player(to) {
            MoveOutcome::Rejected => {
                return Err(format!("offered move to {to} was rejected"));
            }
            MoveOutcome::Accepted(GameState::Won) => return Ok(PlayoutEnd::Won),
            MoveOutcome::Accepted(GameState::Lost) => return Ok(PlayoutEnd::Lost),
            MoveOutcome::Accepted(_) => {}
        }
        if let Some(message) = collect_session_anomalies(&session).into_iter().next() {
            return Err(message);
        }
    }
    Ok(PlayoutEnd::Exhausted)
}

fn collect_session_anomalies(session: &PuzzleSession) -> Vec<String> {
    let mut anomalies = Vec::new();
    let size = session.board_size();
    for entity in session.board() {
        if !size.contains(entity.position) {
            anomalies.push(format!("{} left the board at {}", entity.id, entity.position));
        }
    }
    if session.items_collected() > session.total_collectibles() {
        anomalies.push(format!(
            "collected {} of {} collectibles",
            session.items_collected(),
            session.total_collectibles()
        ));
    }
    let mut enemy_squares = Vec::new();
    for enemy in session.enemies() {
        if enemy_squares.contains(&enemy.position) {
            anomalies.push(format!("two enemies share {}", enemy.position));
        }
        enemy_squares.push(enemy.position);
    }
    anomalies
}

fn push_anomaly(anomalies: &mut Vec<String>, message: String) {
    if !anomalies.contains(&message) {
        anomalies.push(message);
    }
}

fn level_seed(base_seed: u64, index: usize) -> u64 {
    base_seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn default_run_id(seed: u64, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    levels: Vec<LevelResultLine>,
) -> RunSummary {
    let level_count = levels.len();
    let solved: Vec<usize> = levels
        .iter()
        .filter_map(|level| level.solution_length)
        .collect();
    let average_solution_length = if solved.is_empty() {
        0.0
    } else {
        solved.iter().sum::<usize>() as f64 / solved.len() as f64
    };
    let mut playout_totals: BTreeMap<String, usize> = BTreeMap::new();
    for level in &levels {
        *playout_totals.entry("won".to_string()).or_insert(0) += level.playouts.won;
        *playout_totals.entry("lost".to_string()).or_insert(0) += level.playouts.lost;
        *playout_totals.entry("stuck".to_string()).or_insert(0) += level.playouts.stuck;
        *playout_totals.entry("exhausted".to_string()).or_insert(0) += level.playouts.exhausted;
    }
    RunSummary {
        run_id,
        started_at,
        finished_at,
        level_count,
        solved_count: solved.len(),
        anomaly_count: levels.iter().map(|level| level.anomalies.len()).sum(),
        average_solution_length,
        playout_totals,
        levels,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    level_id: Option<&str>,
    seed: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        level_id: level_id.map(|value| value.to_string()),
        seed,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => tracing::error!(%error, event, "structured log did not serialize"),
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

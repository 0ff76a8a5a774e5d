use chrono::{SecondsFormat, Utc};
use clap::Parser;
use duo_maze_chase::constants::{
    GHOST_RESPAWN_COOLDOWN, GRID_COLS, GRID_ROWS, STARTING_LIVES, TICK_MS, TICK_RATE,
};
use duo_maze_chase::engine::{RoundOptions, RoundState};
use duo_maze_chase::error::RoundError;
use duo_maze_chase::rng::Rng;
use duo_maze_chase::types::{Direction, PlayerId, PlayerInput, RoundEvent, RoundOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

const BOT_SEED_SALT: u32 = 0x9e37_79b9;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 3)]
    rounds: usize,
    #[arg(long, default_value_t = (TICK_RATE as u64) * 60 * 3)]
    max_ticks: u64,
    #[arg(long, default_value_t = GRID_ROWS)]
    rows: i32,
    #[arg(long, default_value_t = GRID_COLS)]
    cols: i32,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RoundPlan {
    name: String,
    seed: u32,
    rows: i32,
    cols: i32,
    #[serde(rename = "maxTicks")]
    max_ticks: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventCounts {
    #[serde(rename = "dotsCollected")]
    dots_collected: usize,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: usize,
    hurts: usize,
    eliminations: usize,
    #[serde(rename = "playerMoves")]
    player_moves: usize,
    #[serde(rename = "ghostMoves")]
    ghost_moves: usize,
}

impl EventCounts {
    fn record(&mut self, event: &RoundEvent) {
        match event {
            RoundEvent::DotCollected { .. } => self.dots_collected += 1,
            RoundEvent::GhostEaten { .. } => self.ghosts_eaten += 1,
            RoundEvent::PlayerHurt { .. } => self.hurts += 1,
            RoundEvent::PlayerEliminated { .. } => self.eliminations += 1,
            RoundEvent::PlayerMoved { .. } => self.player_moves += 1,
            RoundEvent::GhostMoved { .. } => self.ghost_moves += 1,
            RoundEvent::RoundWon | RoundEvent::RoundLost => {}
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct RoundResultLine {
    round: String,
    seed: u32,
    outcome: String,
    ticks: u64,
    leader: Option<PlayerId>,
    scores: Vec<u32>,
    lives: Vec<u32>,
    #[serde(rename = "dotsTotal")]
    dots_total: usize,
    #[serde(rename = "dotsRemaining")]
    dots_remaining: usize,
    events: EventCounts,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RoundRunResult {
    #[serde(flatten)]
    result: RoundResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "roundCount")]
    round_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    rounds: Vec<RoundResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    round: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Random steering for both players; each re-rolls its heading after a random
/// number of ticks.
struct InputBot {
    rng: Rng,
    next_turn_at: [u64; 2],
}

impl InputBot {
    fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed ^ BOT_SEED_SALT),
            next_turn_at: [0; 2],
        }
    }

    fn inputs(&mut self, tick: u64) -> Vec<PlayerInput> {
        let mut inputs = Vec::new();
        for player in PlayerId::ALL {
            let slot = &mut self.next_turn_at[player.index()];
            if tick < *slot {
                continue;
            }
            *slot = tick + self.rng.int(12, 90) as u64;
            let direction = Direction::ALL[self.rng.pick_index(Direction::ALL.len())];
            inputs.push(PlayerInput { player, direction });
        }
        inputs
    }
}

fn main() {
    let cli = Cli::parse();
    let plans = resolve_plans(&cli);
    let started_at = rfc3339_now();
    let seed_hint = plans.first().map(|plan| plan.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, Utc::now().timestamp_millis()));
    let mut has_anomaly = false;
    let mut round_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for plan in plans {
        emit_log(
            "info",
            "round_started",
            &run_id,
            Some(&plan.name),
            Some(plan.seed),
            None,
            json!({
                "rows": plan.rows,
                "cols": plan.cols,
                "maxTicks": plan.max_ticks,
            }),
        );

        let round_run = match run_round(&plan) {
            Ok(round_run) => round_run,
            Err(error) => {
                emit_log(
                    "error",
                    "round_failed",
                    &run_id,
                    Some(&plan.name),
                    Some(plan.seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &round_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&plan.name),
                Some(plan.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !round_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += round_run.anomaly_records.len();
        total_ticks += round_run.result.ticks;
        *outcome_counts
            .entry(round_run.result.outcome.clone())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "round_finished",
            &run_id,
            Some(&plan.name),
            Some(plan.seed),
            Some(round_run.result.ticks),
            json!({
                "outcome": round_run.result.outcome,
                "leader": round_run.result.leader,
                "scores": round_run.result.scores,
                "simulatedMs": round_run.result.ticks * TICK_MS,
                "anomalyCount": round_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&round_run.result).expect("round result should serialize")
        );
        round_results.push(round_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at,
        rfc3339_now(),
        round_results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
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
        None,
        json!({
            "roundCount": summary.round_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_round(plan: &RoundPlan) -> Result<RoundRunResult, RoundError> {
    let mut round = RoundState::new(RoundOptions {
        rows: plan.rows,
        cols: plan.cols,
        seed: plan.seed,
        ..RoundOptions::default()
    })?;
    let mut bot = InputBot::new(plan.seed);
    let mut counts = EventCounts::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for message in collect_maze_anomalies(&round) {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            0,
            message,
        );
    }

    while round.is_running() && round.tick_count() < plan.max_ticks {
        let inputs = bot.inputs(round.tick_count());
        for event in round.tick(&inputs)? {
            counts.record(&event);
        }
        for message in collect_round_anomalies(&round) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                round.tick_count(),
                message,
            );
        }
    }

    let dots_total = round.dots().len();
    let dots_remaining = round.dots().remaining();
    if counts.dots_collected != dots_total - dots_remaining {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            round.tick_count(),
            format!(
                "collection events out of sync: {} events, {} dots taken",
                counts.dots_collected,
                dots_total - dots_remaining
            ),
        );
    }

    Ok(RoundRunResult {
        result: RoundResultLine {
            round: plan.name.clone(),
            seed: plan.seed,
            outcome: outcome_key(round.outcome()),
            ticks: round.tick_count(),
            leader: round.leader(),
            scores: round.players().iter().map(|player| player.score()).collect(),
            lives: round.players().iter().map(|player| player.lives()).collect(),
            dots_total,
            dots_remaining,
            events: counts,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_maze_anomalies(round: &RoundState) -> Vec<String> {
    let grid = round.grid();
    let mut anomalies = Vec::new();
    if !grid.is_connected() {
        anomalies.push(format!(
            "maze has {} disconnected regions",
            grid.components().len()
        ));
    }
    let dead_ends = grid.dead_ends();
    if !dead_ends.is_empty() {
        anomalies.push(format!("maze has {} unprotected dead ends", dead_ends.len()));
    }
    if round.dots().len() != grid.open_count() {
        anomalies.push(format!(
            "dot count {} does not match open cells {}",
            round.dots().len(),
            grid.open_count()
        ));
    }
    anomalies
}

fn collect_round_anomalies(round: &RoundState) -> Vec<String> {
    let mut anomalies = Vec::new();
    for player in round.players() {
        if player.lives() > STARTING_LIVES {
            anomalies.push(format!("player lives out of range: {:?}", player.id()));
        }
        if player.is_active() == (player.lives() == 0) {
            anomalies.push(format!(
                "player activity disagrees with lives: {:?} lives={}",
                player.id(),
                player.lives()
            ));
        }
        let uncollected = round
            .dots()
            .get(player.tile())
            .is_some_and(|dot| !dot.collected);
        if player.is_active() && uncollected {
            anomalies.push(format!("player left a dot under itself: {:?}", player.id()));
        }
    }
    for ghost in round.ghosts() {
        if !round.grid().is_open(ghost.tile()) {
            anomalies.push(format!("ghost off the open maze: {:?}", ghost.color()));
        }
        if ghost.direction_cooldown() > GHOST_RESPAWN_COOLDOWN {
            anomalies.push(format!(
                "ghost cooldown out of range: {:?} cooldown={}",
                ghost.color(),
                ghost.direction_cooldown()
            ));
        }
        if ghost.actor().moving && ghost.last_direction().is_none() {
            anomalies.push(format!("ghost moving without a recorded turn: {:?}", ghost.color()));
        }
    }
    anomalies
}

fn resolve_plans(cli: &Cli) -> Vec<RoundPlan> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    (0..cli.rounds.max(1))
        .map(|idx| {
            let round_seed = seed.wrapping_add(idx as u32);
            RoundPlan {
                name: format!("round-{}", idx + 1),
                seed: round_seed,
                rows: cli.rows,
                cols: cli.cols,
                max_ticks: cli.max_ticks,
            }
        })
        .collect()
}

fn outcome_key(outcome: Option<RoundOutcome>) -> String {
    match outcome {
        Some(RoundOutcome::Won) => "won",
        Some(RoundOutcome::Lost) => "lost",
        None => "timeout",
    }
    .to_string()
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    rounds: Vec<RoundResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let round_count = rounds.len();
    let average_ticks = if round_count == 0 {
        0
    } else {
        total_ticks / round_count as u64
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        round_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        rounds,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    round: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        round: round.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

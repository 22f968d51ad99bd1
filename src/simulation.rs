//! Semester simulation: many seeded sessions run in parallel
//!
//! Each session starts from the same class data, is driven by a
//! [`RandomJudge`] and plays until the turn limit or an empty pool. Sessions
//! run on the rayon thread pool and their statistics are folded into one
//! [`SimulationReport`].

use crate::backend::MemoryBackend;
use crate::config::RandomJudgeConfig;
use crate::core::{EffectKind, RarityTier};
use crate::game::{ClassSession, RandomJudge, SessionLogger, TurnLoop, VerbosityLevel};
use crate::journal::SessionAction;
use crate::loader::ClassData;
use crate::{GachaError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Seed stride between sessions
const SESSION_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;
/// Offset separating the judge's stream from the session's
const JUDGE_SEED_OFFSET: u64 = 0x1234_5678_9ABC_DEF0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub sessions: usize,
    /// Turns per session ("a semester")
    pub turns: u32,
    pub seed: u64,
    pub judge: RandomJudgeConfig,
    /// Stop starting new sessions after this long
    pub time_limit: Option<Duration>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            sessions: 100,
            turns: 60,
            seed: 42,
            judge: RandomJudgeConfig::default(),
            time_limit: None,
        }
    }
}

/// Statistics of one simulated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub turns_played: u32,
    /// Turn on which every student had been called on, if it happened
    pub coverage_turn: Option<u32>,
    /// Highest minus lowest pick count at the end
    pub pick_spread: u32,
    pub rarity_counts: BTreeMap<RarityTier, usize>,
    pub cursed: usize,
    pub effect_usage: BTreeMap<EffectKind, usize>,
    pub alerts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub sessions: usize,
    pub failures: Vec<String>,
    pub total_turns: u64,
    pub fully_covered: usize,
    pub mean_coverage_turn: Option<f64>,
    pub mean_pick_spread: f64,
    pub max_pick_spread: u32,
    /// End-of-session rarity tiers summed over every session
    pub rarity_counts: BTreeMap<RarityTier, usize>,
    pub cursed_students: usize,
    pub effect_usage: BTreeMap<EffectKind, usize>,
    pub alerts: usize,
    pub elapsed: Duration,
}

impl SimulationReport {
    fn from_stats(stats: &[SessionStats], failures: Vec<String>, elapsed: Duration) -> Self {
        let mut report = SimulationReport {
            sessions: stats.len(),
            failures,
            elapsed,
            ..SimulationReport::default()
        };

        let mut coverage_sum = 0u64;
        let mut spread_sum = 0u64;
        for session in stats {
            report.total_turns += u64::from(session.turns_played);
            if let Some(turn) = session.coverage_turn {
                report.fully_covered += 1;
                coverage_sum += u64::from(turn);
            }
            spread_sum += u64::from(session.pick_spread);
            report.max_pick_spread = report.max_pick_spread.max(session.pick_spread);
            for (tier, count) in &session.rarity_counts {
                *report.rarity_counts.entry(*tier).or_insert(0) += count;
            }
            for (effect, count) in &session.effect_usage {
                *report.effect_usage.entry(*effect).or_insert(0) += count;
            }
            report.cursed_students += session.cursed;
            report.alerts += session.alerts;
        }

        if report.fully_covered > 0 {
            report.mean_coverage_turn = Some(coverage_sum as f64 / report.fully_covered as f64);
        }
        if !stats.is_empty() {
            report.mean_pick_spread = spread_sum as f64 / stats.len() as f64;
        }
        report
    }

    pub fn sessions_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.sessions as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Simulation Complete ===")?;
        writeln!(f, "Sessions: {} ({} failed)", self.sessions, self.failures.len())?;
        writeln!(f, "Elapsed: {:.2}s ({:.1} sessions/s)", self.elapsed.as_secs_f64(), self.sessions_per_second())?;
        writeln!(f, "Turns played: {}", self.total_turns)?;

        writeln!(f, "\n=== Coverage ===")?;
        if self.sessions > 0 {
            writeln!(
                f,
                "Full coverage reached: {}/{} ({:.1}%)",
                self.fully_covered,
                self.sessions,
                100.0 * self.fully_covered as f64 / self.sessions as f64
            )?;
        }
        match self.mean_coverage_turn {
            Some(turn) => writeln!(f, "Mean turn to full coverage: {turn:.1}")?,
            None => writeln!(f, "Mean turn to full coverage: never")?,
        }
        writeln!(
            f,
            "Pick spread: mean {:.2}, max {}",
            self.mean_pick_spread, self.max_pick_spread
        )?;

        writeln!(f, "\n=== Star Distribution ===")?;
        let total: usize = self.rarity_counts.values().sum();
        for (tier, count) in &self.rarity_counts {
            let share = if total > 0 { 100.0 * *count as f64 / total as f64 } else { 0.0 };
            writeln!(f, "  {:<4} {count} ({share:.1}%)", tier.label())?;
        }
        writeln!(f, "Cursed at session end: {}", self.cursed_students)?;

        writeln!(f, "\n=== Item Usage ===")?;
        for (effect, count) in &self.effect_usage {
            writeln!(f, "  {}: {count}", effect.english_name())?;
        }
        if self.alerts > 0 {
            writeln!(f, "\nPersistence alerts: {}", self.alerts)?;
        }
        Ok(())
    }
}

fn session_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add((index as u64).wrapping_mul(SESSION_SEED_STRIDE))
}

/// Play one session to completion and collect its statistics
pub fn simulate_session(data: &ClassData, config: &SimulationConfig, index: usize) -> Result<SessionStats> {
    let seed = session_seed(config.seed, index);
    let backend = MemoryBackend::from_data(data.clone(), seed);
    let mut session =
        ClassSession::new(backend, seed)?.with_logger(SessionLogger::with_verbosity(VerbosityLevel::Silent));
    let mut judge = RandomJudge::new(config.judge, seed.wrapping_add(JUDGE_SEED_OFFSET));

    let mut coverage_turn = None;
    let mut turns_played = 0;
    {
        let mut turn_loop = TurnLoop::new(&mut session);
        for turn in 1..=config.turns {
            match turn_loop.run_turn_once(&mut judge) {
                Ok(()) => turns_played = turn,
                Err(GachaError::EmptyPool) => break,
                Err(e) => return Err(e),
            }
            if coverage_turn.is_none() && turn_loop.is_fully_covered() {
                coverage_turn = Some(turn);
            }
        }
    }

    let roster = session.roster();
    let (min_picks, max_picks) = roster
        .students()
        .map(|s| s.pick_count())
        .fold(None, |acc: Option<(u32, u32)>, picks| match acc {
            Some((lo, hi)) => Some((lo.min(picks), hi.max(picks))),
            None => Some((picks, picks)),
        })
        .unwrap_or((0, 0));

    let mut rarity_counts = BTreeMap::new();
    for student in roster.students() {
        *rarity_counts.entry(student.rarity()).or_insert(0) += 1;
    }

    let mut effect_usage = BTreeMap::new();
    for action in session.journal().actions() {
        if let SessionAction::ItemUsed { effect, .. } = action {
            *effect_usage.entry(*effect).or_insert(0) += 1;
        }
    }

    Ok(SessionStats {
        turns_played,
        coverage_turn,
        pick_spread: max_picks - min_picks,
        rarity_counts,
        cursed: roster.students().filter(|s| s.is_cursed()).count(),
        effect_usage,
        alerts: session.pending_alerts().len(),
    })
}

/// Run `config.sessions` sessions on the rayon pool
pub fn run_simulation(data: &ClassData, config: &SimulationConfig) -> Result<SimulationReport> {
    if data.students.is_empty() {
        return Err(GachaError::InvalidAction(
            "simulation needs at least one student".to_string(),
        ));
    }
    config.judge.validate()?;

    let start = Instant::now();
    let deadline = config.time_limit.map(|limit| start + limit);

    let outcomes: Vec<Option<Result<SessionStats>>> = (0..config.sessions)
        .into_par_iter()
        .map(|index| {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return None;
            }
            Some(simulate_session(data, config, index))
        })
        .collect();

    let mut stats = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Some(Ok(session)) => stats.push(session),
            Some(Err(e)) => failures.push(format!("session {index}: {e}")),
            None => {}
        }
    }

    Ok(SimulationReport::from_stats(&stats, failures, start.elapsed()))
}

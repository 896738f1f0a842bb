use crate::bots::bot_ids;
use crate::runner::{run_match, RunMetrics};
use crate::util::{safe_name, seed_to_hex, split_list};
use anyhow::{anyhow, Context, Result};
use footsies_core::Winner;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub max_frames: u32,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
    pub save_tapes: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub p1_bot: String,
    pub p2_bot: String,
    pub seed: u32,
    pub seed_hex: String,
    pub frame_count: u32,
    pub winner: Option<Winner>,
    pub wins: [u32; 2],
    pub rounds: u32,
    pub hits: [u32; 2],
    pub tape_checksum: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BotAggregate {
    pub bot_id: String,
    pub bot_fingerprint: String,
    pub matches: usize,
    pub wins: usize,
    pub losses: usize,
    pub ties: usize,
    pub unfinished: usize,
    pub win_rate: f64,
    pub avg_frames: f64,
    pub avg_rounds_won: f64,
    pub avg_hits: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub max_frames: u32,
    pub jobs: Option<usize>,
    pub bots: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub bot_rankings: Vec<BotAggregate>,
    pub runs: Vec<RunRecord>,
    pub saved_tapes: Vec<String>,
}

pub fn resolve_bots(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(bot_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let bots = split_list(raw);
            if bots.is_empty() {
                return Err(anyhow!("--bots resolved to empty list"));
            }
            Ok(bots)
        }
    }
}

/// Every ordered pairing of distinct bots, so each bot plays both sides.
/// A single bot plays the mirror match.
pub fn pairings(bots: &[String]) -> Vec<(String, String)> {
    if bots.len() == 1 {
        return vec![(bots[0].clone(), bots[0].clone())];
    }
    bots.iter()
        .enumerate()
        .flat_map(|(i, p1)| {
            bots.iter()
                .enumerate()
                .filter(move |(j, _)| *j != i)
                .map(move |(_, p2)| (p1.clone(), p2.clone()))
        })
        .collect()
}

struct InternalRun {
    metrics: RunMetrics,
    tape: Vec<u8>,
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.bots.is_empty() {
        return Err(anyhow!("benchmark requires at least one bot"));
    }
    if config.jobs == Some(0) {
        return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, String, u32)> = pairings(&config.bots)
        .into_iter()
        .flat_map(|(p1, p2)| {
            config
                .seeds
                .iter()
                .map(move |seed| (p1.clone(), p2.clone(), *seed))
        })
        .collect();

    let run_one = |(p1, p2, seed): &(String, String, u32)| -> Result<InternalRun> {
        let artifact = run_match([p1.as_str(), p2.as_str()], *seed, config.max_frames)
            .with_context(|| format!("benchmark run failed for {p1} vs {p2} seed={seed:#x}"))?;
        Ok(InternalRun {
            metrics: artifact.metrics,
            tape: artifact.tape,
        })
    };

    let run_results: Vec<Result<InternalRun>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };
    let runs = run_results.into_iter().collect::<Result<Vec<_>>>()?;

    let rankings = rank_bots(runs.iter().map(|run| &run.metrics));
    let run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| {
            let m = &run.metrics;
            RunRecord {
                p1_bot: m.bots[0].clone(),
                p2_bot: m.bots[1].clone(),
                seed: m.seed,
                seed_hex: seed_to_hex(m.seed),
                frame_count: m.frame_count,
                winner: m.winner,
                wins: m.wins,
                rounds: m.rounds,
                hits: m.hits,
                tape_checksum: m.tape_checksum,
            }
        })
        .collect();

    let mut saved_tapes = Vec::new();
    if config.save_tapes {
        let tape_dir = config.out_dir.join("tapes");
        fs::create_dir_all(&tape_dir)
            .with_context(|| format!("failed creating {}", tape_dir.display()))?;
        for run in &runs {
            let m = &run.metrics;
            let path = tape_dir.join(format!(
                "{}-vs-{}-seed{:08x}-frames{}.tape",
                safe_name(&m.bots[0]),
                safe_name(&m.bots[1]),
                m.seed,
                m.frame_count
            ));
            fs::write(&path, &run.tape)
                .with_context(|| format!("failed writing {}", path.display()))?;
            saved_tapes.push(path.to_string_lossy().into_owned());
        }
    }

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        max_frames: config.max_frames,
        jobs: config.jobs,
        bots: config.bots,
        seeds: config.seeds,
        run_count: run_records.len(),
        bot_rankings: rankings,
        runs: run_records,
        saved_tapes,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

/// Per-bot results from both sides of every match, best win rate first.
pub fn rank_bots<'a>(runs: impl Iterator<Item = &'a RunMetrics>) -> Vec<BotAggregate> {
    #[derive(Default)]
    struct Totals {
        agg: BotAggregate,
        frames: u64,
        rounds_won: u64,
        hits: u64,
    }

    let mut grouped: BTreeMap<String, Totals> = BTreeMap::new();
    for run in runs {
        for side in 0..2 {
            let totals = grouped.entry(run.bots[side].clone()).or_default();
            let agg = &mut totals.agg;
            if agg.bot_fingerprint.is_empty() {
                agg.bot_fingerprint = run.fingerprints[side].clone();
            }
            agg.matches += 1;
            match (run.winner, side) {
                (None, _) => agg.unfinished += 1,
                (Some(Winner::Tie), _) => agg.ties += 1,
                (Some(Winner::P1), 0) | (Some(Winner::P2), 1) => agg.wins += 1,
                (Some(_), _) => agg.losses += 1,
            }
            totals.frames += u64::from(run.frame_count);
            totals.rounds_won += u64::from(run.wins[side]);
            totals.hits += u64::from(run.hits[side]);
        }
    }

    let mut rankings: Vec<BotAggregate> = grouped
        .into_iter()
        .map(|(bot_id, totals)| {
            let matches = totals.agg.matches.max(1) as f64;
            BotAggregate {
                bot_id,
                win_rate: totals.agg.wins as f64 / matches,
                avg_frames: totals.frames as f64 / matches,
                avg_rounds_won: totals.rounds_won as f64 / matches,
                avg_hits: totals.hits as f64 / matches,
                ..totals.agg
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then_with(|| b.avg_rounds_won.total_cmp(&a.avg_rounds_won))
            .then_with(|| b.avg_hits.total_cmp(&a.avg_hits))
            .then_with(|| a.bot_id.cmp(&b.bot_id))
    });
    rankings
}

pub fn winner_label(winner: Option<Winner>) -> &'static str {
    match winner {
        Some(Winner::P1) => "p1",
        Some(Winner::P2) => "p2",
        Some(Winner::Tie) => "tie",
        None => "none",
    }
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "p1_bot,p2_bot,seed_hex,seed,frame_count,winner,p1_wins,p2_wins,rounds,p1_hits,p2_hits,tape_checksum\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{:08x}\n",
            row.p1_bot,
            row.p2_bot,
            row.seed_hex,
            row.seed,
            row.frame_count,
            winner_label(row.winner),
            row.wins[0],
            row.wins[1],
            row.rounds,
            row.hits[0],
            row.hits[1],
            row.tape_checksum
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[BotAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,bot_id,bot_fingerprint,matches,wins,losses,ties,unfinished,win_rate,avg_frames,avg_rounds_won,avg_hits\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{:.4},{:.1},{:.2},{:.2}\n",
            idx + 1,
            row.bot_id,
            row.bot_fingerprint,
            row.matches,
            row.wins,
            row.losses,
            row.ties,
            row.unfinished,
            row.win_rate,
            row.avg_frames,
            row.avg_rounds_won,
            row.avg_hits
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(bots: [&str; 2], winner: Option<Winner>, wins: [u32; 2]) -> RunMetrics {
        RunMetrics {
            bots: bots.map(str::to_string),
            fingerprints: ["aa".to_string(), "bb".to_string()],
            seed: 1,
            max_frames: 100,
            frame_count: 100,
            match_over: winner.is_some(),
            winner,
            wins,
            rounds: wins[0] + wins[1],
            hits: wins,
            attack_frames: [0, 0],
            move_frames: [0, 0],
            tape_checksum: 0,
        }
    }

    #[test]
    fn pairings_cover_both_sides() {
        let bots = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let pairs = pairings(&bots);
        assert_eq!(pairs.len(), 6);
        assert!(pairs.contains(&("b".to_string(), "a".to_string())));
        assert!(pairs.iter().all(|(p1, p2)| p1 != p2));
        assert_eq!(pairings(&bots[..1]).len(), 1);
    }

    #[test]
    fn ranking_credits_the_correct_side() {
        let runs = [
            metrics(["a", "b"], Some(Winner::P1), [3, 1]),
            metrics(["b", "a"], Some(Winner::P2), [0, 3]),
            metrics(["a", "b"], None, [0, 0]),
        ];
        let rankings = rank_bots(runs.iter());
        assert_eq!(rankings[0].bot_id, "a");
        assert_eq!(rankings[0].wins, 2);
        assert_eq!(rankings[0].unfinished, 1);
        assert_eq!(rankings[0].bot_fingerprint, "aa");
        assert_eq!(rankings[1].losses, 2);
        assert!((rankings[0].win_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn resolve_bots_defaults_to_roster() {
        assert_eq!(resolve_bots(None).unwrap().len(), bot_ids().len());
        assert!(resolve_bots(Some(" , ")).is_err());
    }
}

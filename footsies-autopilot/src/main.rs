use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use footsies_core::constants::MAX_TAPE_FRAMES;
use footsies_core::tape::parse_tape;
use footsies_core::{verify_tape, BattleConfig, JsonLinesSink};
use footsies_autopilot::benchmark::{resolve_bots, run_benchmark, winner_label, BenchmarkConfig};
use footsies_autopilot::bots::{bot_manifest_entries, describe_bots};
use footsies_autopilot::runner::{run_match, run_match_with_sink, write_tape, RunMetrics};
use footsies_autopilot::util::{parse_seed, parse_seed_csv, safe_name, seed_sequence, seed_to_hex};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_MAX_FRAMES: u32 = 60 * 60 * 5;
const DEFAULT_SEED_START: u32 = 0xF007_0001;

#[derive(Parser, Debug)]
#[command(name = "footsies-autopilot")]
#[command(about = "Headless Footsies matches: scripted bots, input tapes and benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available bots
    ListBots {
        /// Print the full manifest with config fingerprints as JSON
        #[arg(long, default_value_t = false)]
        manifest: bool,
    },
    /// Play one match and write its input tape
    Generate {
        #[arg(long)]
        p1: String,
        #[arg(long)]
        p2: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
        max_frames: u32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a tape through a fresh session and check its claims
    VerifyTape {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = MAX_TAPE_FRAMES)]
        max_frames: u32,
    },
    /// Round-robin every bot pairing over a seed set
    Benchmark {
        #[arg(long)]
        bots: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 8)]
        seed_count: u32,
        #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
        max_frames: u32,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
        #[arg(long, default_value_t = false)]
        save_tapes: bool,
    },
    /// Play one match and write its round events as JSON lines
    Events {
        #[arg(long)]
        p1: String,
        #[arg(long)]
        p2: String,
        #[arg(long)]
        seed: String,
        #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
        max_frames: u32,
        /// Defaults to stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match Cli::parse().command {
        Commands::ListBots { manifest } => {
            if manifest {
                println!("{}", serde_json::to_string_pretty(&bot_manifest_entries())?);
            } else {
                for (id, description) in describe_bots() {
                    println!("{id:20} {description}");
                }
            }
        }
        Commands::Generate {
            p1,
            p2,
            seed,
            max_frames,
            output,
        } => {
            let seed = parse_seed(&seed)?;
            let artifact = run_match([p1.as_str(), p2.as_str()], seed, max_frames)?;
            let output_path = output.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "tapes/{}-vs-{}-{}-frames{}.tape",
                    safe_name(&p1),
                    safe_name(&p2),
                    seed_to_hex(seed).replace("0x", "seed"),
                    artifact.metrics.frame_count
                ))
            });
            write_tape(&output_path, &artifact.tape)?;
            print_metrics(&artifact.metrics);
            println!("output={}", output_path.display());
        }
        Commands::VerifyTape { input, max_frames } => {
            let bytes = fs::read(&input)?;
            let tape = parse_tape(&bytes, max_frames)?;
            let report = verify_tape(&bytes, max_frames, &BattleConfig::default())?;
            println!("input={}", input.display());
            println!("seed={}", seed_to_hex(tape.header.seed));
            println!("frame_count={}", tape.header.frame_count);
            println!("winner={}", winner_label(report.winner));
            println!("wins={}-{}", report.wins[0], report.wins[1]);
            println!("checksum={:#010x}", report.tape_checksum);
        }
        Commands::Benchmark {
            bots,
            seeds,
            seed_start,
            seed_count,
            max_frames,
            out_dir,
            jobs,
            save_tapes,
        } => {
            let bots = resolve_bots(bots.as_deref())?;
            let seeds = match (seeds.as_deref(), seed_start.as_deref()) {
                (Some(csv), _) => parse_seed_csv(csv)?,
                (None, Some(start)) => seed_sequence(parse_seed(start)?, seed_count),
                (None, None) => seed_sequence(DEFAULT_SEED_START, seed_count),
            };
            if seeds.is_empty() {
                return Err(anyhow!("--seed-count must be > 0"));
            }
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("benchmarks/{}", timestamp_suffix())));

            let report = run_benchmark(BenchmarkConfig {
                bots,
                seeds,
                max_frames,
                out_dir: out_dir.clone(),
                jobs,
                save_tapes,
            })?;

            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, bot) in report.bot_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  win_rate={:.0}% wins={} losses={} ties={} unfinished={} avg_rounds={:.2} avg_hits={:.2} avg_frames={:.1}",
                    idx + 1,
                    bot.bot_id,
                    bot.win_rate * 100.0,
                    bot.wins,
                    bot.losses,
                    bot.ties,
                    bot.unfinished,
                    bot.avg_rounds_won,
                    bot.avg_hits,
                    bot.avg_frames,
                );
            }
        }
        Commands::Events {
            p1,
            p2,
            seed,
            max_frames,
            output,
        } => {
            let seed = parse_seed(&seed)?;
            let writer: Box<dyn Write + Send> = match &output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        fs::create_dir_all(parent)?;
                    }
                    Box::new(BufWriter::new(File::create(path)?))
                }
                None => Box::new(io::stdout()),
            };
            let artifact = run_match_with_sink(
                [p1.as_str(), p2.as_str()],
                seed,
                max_frames,
                Box::new(JsonLinesSink::new(writer)),
            )?;
            if let Some(path) = output {
                print_metrics(&artifact.metrics);
                println!("output={}", path.display());
            }
        }
    }

    Ok(())
}

fn print_metrics(metrics: &RunMetrics) {
    println!("p1={}", metrics.bots[0]);
    println!("p2={}", metrics.bots[1]);
    println!("p1_fingerprint={}", metrics.fingerprints[0]);
    println!("p2_fingerprint={}", metrics.fingerprints[1]);
    println!("seed={}", seed_to_hex(metrics.seed));
    println!("frames={}", metrics.frame_count);
    println!("winner={}", winner_label(metrics.winner));
    println!("wins={}-{}", metrics.wins[0], metrics.wins[1]);
    println!("rounds={}", metrics.rounds);
    println!("hits={}-{}", metrics.hits[0], metrics.hits[1]);
    println!("checksum={:#010x}", metrics.tape_checksum);
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}

use anyhow::Result;
use footsies_autopilot::benchmark::{run_benchmark, BenchmarkConfig};
use footsies_autopilot::bots::bot_ids;
use footsies_autopilot::runner::{run_match, run_match_with_sink, write_tape};
use footsies_core::constants::POLICY_ACTION_COUNT;
use footsies_core::encoder::OBSERVATION_LEN;
use footsies_core::{verify_tape, BattleConfig, JsonLinesSink, LinearRecurrentPolicy, RoundEvent, Winner};
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn every_bot_produces_a_verifiable_tape_against_every_other() -> Result<()> {
    let seed = 0xF007_0001;
    for p1 in bot_ids() {
        for p2 in bot_ids() {
            let artifact = run_match([*p1, *p2], seed, 2_400)?;
            assert!(artifact.metrics.frame_count > 0, "{p1} vs {p2}");
            let report = verify_tape(&artifact.tape, 2_400, &BattleConfig::default())?;
            assert_eq!(report.final_frame, artifact.metrics.frame_count, "{p1} vs {p2}");
            assert_eq!(report.winner, artifact.metrics.winner, "{p1} vs {p2}");
        }
    }
    Ok(())
}

#[test]
fn poker_beats_idle_three_rounds_to_nil() -> Result<()> {
    let artifact = run_match(["poker", "idle"], 1, 20_000)?;
    assert!(artifact.metrics.match_over);
    assert_eq!(artifact.metrics.winner, Some(Winner::P1));
    assert_eq!(artifact.metrics.wins, [3, 0]);
    assert!(artifact.metrics.hits[0] >= 3);
    assert_eq!(artifact.metrics.hits[1], 0);
    Ok(())
}

#[test]
fn matches_are_deterministic_per_seed() -> Result<()> {
    let a = run_match(["random", "dasher"], 77, 3_000)?;
    let b = run_match(["random", "dasher"], 77, 3_000)?;
    assert_eq!(a.inputs, b.inputs);
    assert_eq!(a.tape, b.tape);
    Ok(())
}

#[test]
fn written_tape_round_trips_through_verification() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let artifact = run_match(["poker", "turtle"], 0xDEAD_BEEF, 6_000)?;
    let path = tmp.path().join("tapes/match.tape");
    write_tape(&path, &artifact.tape)?;

    let bytes = fs::read(&path)?;
    let report = verify_tape(&bytes, 6_000, &BattleConfig::default())?;
    assert_eq!(report.seed, 0xDEAD_BEEF);
    assert_eq!(report.wins, artifact.metrics.wins);
    Ok(())
}

#[test]
fn tampered_tape_fails_verification() -> Result<()> {
    let mut tape = run_match(["poker", "idle"], 2, 20_000)?.tape;
    let winner_offset = tape.len() - 12;
    tape[winner_offset] = 2;
    assert!(verify_tape(&tape, 20_000, &BattleConfig::default()).is_err());
    Ok(())
}

#[test]
fn policy_bot_loads_model_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let mut logits = vec![-20.0; POLICY_ACTION_COUNT];
    logits[2] = 20.0;
    let model = LinearRecurrentPolicy::constant("walker", OBSERVATION_LEN, 4, logits);
    let path = tmp.path().join("walker.json");
    fs::write(&path, serde_json::to_vec(&model)?)?;

    let spec = format!("policy:{}", path.display());
    let artifact = run_match([spec.as_str(), "idle"], 5, 240)?;
    assert!(artifact.metrics.move_frames[0] > 200);
    assert_eq!(artifact.metrics.move_frames[1], 0);
    Ok(())
}

#[test]
fn events_sink_receives_round_lines() -> Result<()> {
    let buffer = SharedBuffer::default();
    run_match_with_sink(
        ["poker", "idle"],
        1,
        20_000,
        Box::new(JsonLinesSink::new(buffer.clone())),
    )?;

    let bytes = buffer.0.lock().map(|b| b.clone()).unwrap_or_default();
    let events: Vec<RoundEvent> = String::from_utf8(bytes)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    let ends = events
        .iter()
        .filter(|event| matches!(event, RoundEvent::RoundEnd(_)))
        .count();
    assert_eq!(ends, 3);
    assert!(matches!(events.first(), Some(RoundEvent::RoundStart(_))));
    Ok(())
}

#[test]
fn benchmark_writes_summary_and_rankings() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let report = run_benchmark(BenchmarkConfig {
        bots: vec!["poker".to_string(), "idle".to_string()],
        seeds: vec![1, 2],
        max_frames: 20_000,
        out_dir: tmp.path().to_path_buf(),
        jobs: Some(2),
        save_tapes: true,
    })?;

    assert_eq!(report.run_count, 4);
    assert_eq!(report.bot_rankings.len(), 2);
    assert_eq!(report.bot_rankings[0].bot_id, "poker");
    assert_eq!(report.bot_rankings[0].wins, 4);
    assert_eq!(report.saved_tapes.len(), 4);
    assert!(tmp.path().join("summary.json").exists());
    assert!(tmp.path().join("runs.csv").exists());
    assert!(tmp.path().join("rankings.csv").exists());
    Ok(())
}

use crate::bots::{create_bot, fingerprint, FootsiesBot};
use anyhow::{anyhow, Context, Result};
use footsies_core::input::button;
use footsies_core::tape::{encode_input_byte, serialize_tape};
use footsies_core::{
    verify_tape, BattleConfig, EventSink, NullSink, PlayerId, PolicyController, PolicySettings,
    Session, Winner,
};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize)]
pub struct RunMetrics {
    pub bots: [String; 2],
    pub fingerprints: [String; 2],
    pub seed: u32,
    pub max_frames: u32,
    pub frame_count: u32,
    pub match_over: bool,
    pub winner: Option<Winner>,
    pub wins: [u32; 2],
    pub rounds: u32,
    pub hits: [u32; 2],
    pub attack_frames: [u32; 2],
    pub move_frames: [u32; 2],
    pub tape_checksum: u32,
}

#[derive(Clone, Debug)]
pub struct RunArtifact {
    pub metrics: RunMetrics,
    pub inputs: Vec<u8>,
    pub tape: Vec<u8>,
}

pub fn run_match(bots: [&str; 2], seed: u32, max_frames: u32) -> Result<RunArtifact> {
    run_match_with_sink(bots, seed, max_frames, Box::new(NullSink))
}

/// Plays `bots[0]` against `bots[1]` and hands round events to `sink`.
pub fn run_match_with_sink(
    bots: [&str; 2],
    seed: u32,
    max_frames: u32,
    sink: Box<dyn EventSink>,
) -> Result<RunArtifact> {
    let mut p1 = create_bot(bots[0])?;
    let mut p2 = create_bot(bots[1])?;
    run_bot_instances(
        [p1.as_mut(), p2.as_mut()],
        [bots[0].trim(), bots[1].trim()],
        seed,
        max_frames,
        sink,
    )
}

/// Per-player bot seed; player two gets a different stream on the same match seed.
pub fn bot_seed(seed: u32, player: PlayerId) -> u32 {
    seed ^ (player.index() as u32).wrapping_mul(0x9E37_79B9)
}

pub fn run_bot_instances(
    bots: [&mut dyn FootsiesBot; 2],
    names: [&str; 2],
    seed: u32,
    max_frames: u32,
    sink: Box<dyn EventSink>,
) -> Result<RunArtifact> {
    if max_frames == 0 {
        return Err(anyhow!("max_frames must be > 0"));
    }

    let [p1, p2] = bots;
    p1.reset(bot_seed(seed, PlayerId::One));
    p2.reset(bot_seed(seed, PlayerId::Two));
    let fingerprints = [fingerprint(&*p1), fingerprint(&*p2)];

    let config = BattleConfig::default();
    let policy = PolicyController::new(PolicySettings::default(), None, seed);
    let mut session = Session::new(config.clone(), policy, sink);
    session.start_game();

    let mut state = session.get_state();
    let mut inputs = Vec::with_capacity(max_frames as usize);
    let mut hits = [0u32; 2];
    let mut attack_frames = [0u32; 2];
    let mut move_frames = [0u32; 2];

    while session.is_running() && (inputs.len() as u32) < max_frames {
        let bits = [
            p1.next_input(&state, PlayerId::One) & button::MASK,
            p2.next_input(&state, PlayerId::Two) & button::MASK,
        ];
        for (i, bits) in bits.iter().enumerate() {
            if bits & button::ATTACK != 0 {
                attack_frames[i] += 1;
            }
            if bits & (button::LEFT | button::RIGHT) != 0 {
                move_frames[i] += 1;
            }
        }
        inputs.push(encode_input_byte(bits));
        state = session.step_n_frames(bits[0], bits[1], 1);
        for event in session.drain_damage_events() {
            hits[event.attacker.index()] += 1;
        }
    }

    let frame_count = inputs.len() as u32;
    let summary = session.last_match().cloned();
    let winner = summary.as_ref().map(|summary| summary.winner);
    let tape = serialize_tape(seed, &inputs, winner, frame_count);
    let report = verify_tape(&tape, max_frames.max(frame_count).max(1), &config)
        .map_err(|err| anyhow!("generated tape failed verification: {err}"))?;

    tracing::debug!(
        p1 = names[0],
        p2 = names[1],
        seed,
        frame_count,
        winner = ?winner,
        "match finished"
    );

    Ok(RunArtifact {
        metrics: RunMetrics {
            bots: [names[0].to_string(), names[1].to_string()],
            fingerprints,
            seed,
            max_frames,
            frame_count,
            match_over: summary.is_some(),
            winner,
            wins: summary
                .as_ref()
                .map(|summary| summary.wins)
                .unwrap_or(state.wins),
            rounds: summary.as_ref().map(|summary| summary.rounds).unwrap_or(0),
            hits,
            attack_frames,
            move_frames,
            tape_checksum: report.tape_checksum,
        },
        inputs,
        tape,
    })
}

pub fn write_tape(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating directory {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

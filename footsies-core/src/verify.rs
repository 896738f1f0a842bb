use serde::{Deserialize, Serialize};

use crate::battle::BattleConfig;
use crate::error::VerifyError;
use crate::events::Winner;
use crate::session::Session;
use crate::tape::{decode_input_byte, parse_tape};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Ticks consumed before the tape ran out or the match finished.
    pub final_frame: u32,
    pub winner: Option<Winner>,
    pub wins: [u32; 2],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub seed: u32,
    pub frame_count: u32,
    pub final_frame: u32,
    pub winner: Option<Winner>,
    pub wins: [u32; 2],
    pub tape_checksum: u32,
}

/// Steps a fresh stepping-mode session one tick per packed input byte.
pub fn replay_inputs(config: &BattleConfig, inputs: &[u8]) -> ReplayResult {
    let mut session = Session::default();
    session.set_battle_config(config.clone());
    session.start_game();

    let mut final_frame = 0u32;
    let mut wins = [0; 2];
    for &byte in inputs {
        if !session.is_running() {
            break;
        }
        let [p1, p2] = decode_input_byte(byte);
        let state = session.step_n_frames(p1, p2, 1);
        wins = state.wins;
        final_frame += 1;
    }

    let summary = session.last_match();
    ReplayResult {
        final_frame,
        winner: summary.map(|summary| summary.winner),
        wins: summary.map(|summary| summary.wins).unwrap_or(wins),
    }
}

pub fn verify_tape(
    bytes: &[u8],
    max_frames: u32,
    config: &BattleConfig,
) -> Result<VerificationReport, VerifyError> {
    let tape = parse_tape(bytes, max_frames)?;
    let result = replay_inputs(config, tape.inputs);

    if result.final_frame != tape.header.frame_count {
        return Err(VerifyError::TrailingFrames {
            ended_at: result.final_frame,
            frame_count: tape.header.frame_count,
        });
    }
    if result.final_frame != tape.footer.final_frame {
        return Err(VerifyError::FinalFrameMismatch {
            claimed: tape.footer.final_frame,
            computed: result.final_frame,
        });
    }
    if result.winner != tape.footer.winner {
        return Err(VerifyError::WinnerMismatch {
            claimed: tape.footer.winner,
            computed: result.winner,
        });
    }

    Ok(VerificationReport {
        seed: tape.header.seed,
        frame_count: tape.header.frame_count,
        final_frame: result.final_frame,
        winner: result.winner,
        wins: result.wins,
        tape_checksum: tape.footer.checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TapeError;
    use crate::input::button;
    use crate::tape::{encode_input_byte, serialize_tape};

    fn jab_inputs(frames: usize) -> Vec<u8> {
        (0..frames)
            .map(|frame| {
                let p1 = if frame % 2 == 0 { button::ATTACK } else { 0 };
                encode_input_byte([p1, 0])
            })
            .collect()
    }

    fn close_range() -> BattleConfig {
        BattleConfig {
            start_positions: [-0.5, 0.5],
            ..BattleConfig::default()
        }
    }

    #[test]
    fn idle_tape_verifies_without_winner() {
        let inputs = vec![0u8; 120];
        let bytes = serialize_tape(5, &inputs, None, 120);
        let report = verify_tape(&bytes, 1_000, &BattleConfig::default()).expect("verifies");
        assert_eq!(report.final_frame, 120);
        assert_eq!(report.winner, None);
        assert_eq!(report.wins, [0, 0]);
    }

    #[test]
    fn finished_match_tape_verifies_with_winner() {
        let result = replay_inputs(&close_range(), &jab_inputs(5_000));
        assert_eq!(result.winner, Some(Winner::P1));
        let inputs = jab_inputs(result.final_frame as usize);

        let bytes = serialize_tape(1, &inputs, result.winner, result.final_frame);
        let report = verify_tape(&bytes, 10_000, &close_range()).expect("verifies");
        assert_eq!(report.wins, [3, 0]);
    }

    #[test]
    fn rejects_wrong_winner_claim() {
        let bytes = serialize_tape(5, &[0u8; 30], Some(Winner::P2), 30);
        assert_eq!(
            verify_tape(&bytes, 1_000, &BattleConfig::default()),
            Err(VerifyError::WinnerMismatch {
                claimed: Some(Winner::P2),
                computed: None
            })
        );
    }

    #[test]
    fn rejects_frames_after_match_end() {
        let result = replay_inputs(&close_range(), &jab_inputs(5_000));
        let inputs = jab_inputs(result.final_frame as usize + 3);
        let bytes = serialize_tape(1, &inputs, result.winner, result.final_frame);
        assert!(matches!(
            verify_tape(&bytes, 10_000, &close_range()),
            Err(VerifyError::TrailingFrames { .. })
        ));
    }

    #[test]
    fn surfaces_tape_errors() {
        assert!(matches!(
            verify_tape(&[0u8; 4], 10, &BattleConfig::default()),
            Err(VerifyError::Tape(TapeError::TooShort { .. }))
        ));
    }
}

//! Fixed-layout observation vectors for the policy.
//!
//! Layout per perspective: `[shared | self | opponent]`. The opponent block is
//! read from the observation history `delay` frames back.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::action::ActionId;
use crate::constants::{
    BATTLE_AREA_WIDTH, FRAME_SCALE, GUARD_HEALTH_TIERS, HIT_STUN_SCALE, POSITION_SCALE,
    VELOCITY_SCALE,
};
use crate::input::PlayerId;
use crate::snapshot::{GameState, PlayerState};

pub const SHARED_LEN: usize = 1;
pub const ACTION_ONE_HOT_LEN: usize = ActionId::ALL.len();
pub const BLOCK_LEN: usize = 3 + 2 + GUARD_HEALTH_TIERS + ACTION_ONE_HOT_LEN + 3 + 9 + 3;
pub const OBSERVATION_LEN: usize = SHARED_LEN + 2 * BLOCK_LEN;

pub type Observation = Vec<f32>;

/// Both perspectives for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedGameState {
    pub p1: Observation,
    pub p2: Observation,
}

/// Position of a raw action id in the one-hot table. Ids outside the table
/// land on index 0 (stand), which trained models rely on.
pub fn action_index(raw: u32) -> usize {
    ActionId::ALL
        .iter()
        .position(|id| id.raw() == raw)
        .unwrap_or(0)
}

#[inline]
fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

pub fn encode_player(player: &PlayerState) -> Vec<f32> {
    let mut block = Vec::with_capacity(BLOCK_LEN);

    block.push(player.position_x / POSITION_SCALE);
    block.push(player.position_y / POSITION_SCALE);
    block.push(player.velocity_x / VELOCITY_SCALE);

    block.push(flag(player.is_dead));
    block.push(player.vital_health as f32);

    for tier in 0..GUARD_HEALTH_TIERS {
        block.push(flag(player.guard_health as usize == tier));
    }

    let action = action_index(player.current_action_id);
    for index in 0..ACTION_ONE_HOT_LEN {
        block.push(flag(action == index));
    }

    let frame = player.current_action_frame as f32;
    let frame_count = player.current_action_frame_count as f32;
    block.push(frame / FRAME_SCALE);
    block.push(frame_count / FRAME_SCALE);
    block.push((frame_count - frame) / FRAME_SCALE);

    block.push(flag(player.is_action_end));
    block.push(flag(player.is_always_cancelable));
    block.push(player.current_action_hit_count as f32);
    block.push(player.current_hit_stun_frame as f32 / HIT_STUN_SCALE);
    block.push(flag(player.is_in_hit_stun));
    block.push(player.sprite_shake_position);
    block.push(player.max_sprite_shake_frame as f32 / HIT_STUN_SCALE);
    block.push(flag(player.is_face_right));
    block.push(player.current_frame_advantage as f32 / HIT_STUN_SCALE);

    block.push(flag(player.would_dash_forward));
    block.push(flag(player.would_dash_backward));
    block.push(player.special_attack_progress.clamp(0.0, 1.0));

    debug_assert_eq!(block.len(), BLOCK_LEN);
    block
}

fn shared_block(state: &GameState) -> [f32; SHARED_LEN] {
    let distance = (state.players[0].position_x - state.players[1].position_x).abs();
    [distance / BATTLE_AREA_WIDTH]
}

/// Observation history for both fighters, `delay + 1` frames deep.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    delay: usize,
    history: [VecDeque<Vec<f32>>; 2],
}

impl Encoder {
    pub fn new(delay: usize) -> Self {
        Self {
            delay,
            history: [
                VecDeque::with_capacity(delay + 1),
                VecDeque::with_capacity(delay + 1),
            ],
        }
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    pub fn set_delay(&mut self, delay: usize) {
        self.delay = delay;
        for history in &mut self.history {
            while history.len() > delay + 1 {
                history.pop_front();
            }
        }
    }

    pub fn reset(&mut self) {
        for history in &mut self.history {
            history.clear();
        }
    }

    pub fn history_len(&self) -> usize {
        self.history[0].len()
    }

    /// Pushes both fighters' current blocks.
    pub fn observe(&mut self, state: &GameState) {
        for player in PlayerId::BOTH {
            let history = &mut self.history[player.index()];
            history.push_back(encode_player(state.player(player)));
            while history.len() > self.delay + 1 {
                history.pop_front();
            }
        }
    }

    /// Block for `player` as seen `delay` frames ago. Falls back to `current`
    /// until the history is deeper than the delay.
    fn delayed_block(&self, player: PlayerId, current: Vec<f32>) -> Vec<f32> {
        let history = &self.history[player.index()];
        if history.len() > self.delay {
            history[history.len() - 1 - self.delay].clone()
        } else {
            current
        }
    }

    pub fn encode(&self, state: &GameState, perspective: PlayerId) -> Observation {
        let opponent = perspective.opponent();
        let mut observation = Vec::with_capacity(OBSERVATION_LEN);
        observation.extend_from_slice(&shared_block(state));
        observation.extend(encode_player(state.player(perspective)));
        observation.extend(self.delayed_block(opponent, encode_player(state.player(opponent))));
        observation
    }

    pub fn encode_both(&self, state: &GameState) -> EncodedGameState {
        EncodedGameState {
            p1: self.encode(state, PlayerId::One),
            p2: self.encode(state, PlayerId::Two),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(p1_x: f32, p2_x: f32) -> GameState {
        let mut state = GameState::default();
        state.players[0].position_x = p1_x;
        state.players[0].is_face_right = true;
        state.players[0].current_action_frame_count = 30;
        state.players[1].position_x = p2_x;
        state.players[1].current_action_id = ActionId::NAttack.raw();
        state.players[1].current_action_frame = 4;
        state.players[1].current_action_frame_count = 22;
        state
    }

    fn self_block(observation: &[f32]) -> &[f32] {
        &observation[SHARED_LEN..SHARED_LEN + BLOCK_LEN]
    }

    fn opponent_block(observation: &[f32]) -> &[f32] {
        &observation[SHARED_LEN + BLOCK_LEN..]
    }

    #[test]
    fn observation_has_fixed_length() {
        let encoder = Encoder::new(0);
        let obs = encoder.encode(&state_at(-2.0, 2.0), PlayerId::One);
        assert_eq!(obs.len(), OBSERVATION_LEN);
        assert_eq!(obs[0], 0.4);
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = Encoder::new(0);
        let state = state_at(-1.25, 0.5);
        let a = encoder.encode(&state, PlayerId::Two);
        let b = encoder.encode(&state, PlayerId::Two);
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn perspectives_swap_self_and_opponent_blocks() {
        let mut encoder = Encoder::new(0);
        let state = state_at(-1.0, 1.5);
        encoder.observe(&state);
        let p1 = encoder.encode(&state, PlayerId::One);
        let p2 = encoder.encode(&state, PlayerId::Two);
        assert_eq!(self_block(&p1), opponent_block(&p2));
        assert_eq!(self_block(&p2), opponent_block(&p1));
    }

    #[test]
    fn unknown_action_maps_to_index_zero() {
        assert_eq!(action_index(9_999), 0);
        assert_eq!(action_index(ActionId::Stand.raw()), 0);
        assert_eq!(action_index(ActionId::Win.raw()), ACTION_ONE_HOT_LEN - 1);

        let mut player = PlayerState {
            current_action_id: 9_999,
            ..PlayerState::default()
        };
        let unknown = encode_player(&player);
        player.current_action_id = ActionId::Stand.raw();
        assert_eq!(unknown, encode_player(&player));
    }

    #[test]
    fn delay_collapses_to_current_until_history_fills() {
        let delay = 3;
        let mut encoder = Encoder::new(delay);
        for step in 0..delay {
            let state = state_at(-2.0 + step as f32 * 0.1, 2.0);
            encoder.observe(&state);
            let obs = encoder.encode(&state, PlayerId::Two);
            assert_eq!(
                opponent_block(&obs),
                encode_player(state.player(PlayerId::One)).as_slice(),
                "step {step}"
            );
        }
    }

    #[test]
    fn opponent_block_lags_by_delay_once_history_is_deep() {
        let delay = 2;
        let mut encoder = Encoder::new(delay);
        let states: Vec<GameState> = (0..5)
            .map(|step| state_at(-2.0 + step as f32 * 0.25, 2.0))
            .collect();
        for state in &states {
            encoder.observe(state);
        }
        assert_eq!(encoder.history_len(), delay + 1);

        let latest = &states[4];
        let obs = encoder.encode(latest, PlayerId::Two);
        assert_eq!(
            opponent_block(&obs),
            encode_player(states[4 - delay].player(PlayerId::One)).as_slice()
        );
        assert_eq!(
            self_block(&obs),
            encode_player(latest.player(PlayerId::Two)).as_slice()
        );
    }

    #[test]
    fn special_progress_is_clamped() {
        let player = PlayerState {
            special_attack_progress: 3.0,
            ..PlayerState::default()
        };
        assert_eq!(*encode_player(&player).last().unwrap(), 1.0);
    }
}

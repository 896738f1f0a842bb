use serde::{Deserialize, Serialize};

use crate::input::PlayerId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    #[default]
    Stop,
    Intro,
    Fight,
    #[serde(rename = "ko")]
    KO,
    End,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position_x: f32,
    pub position_y: f32,
    pub velocity_x: f32,
    pub is_dead: bool,
    pub vital_health: u32,
    pub guard_health: u32,
    pub current_action_id: u32,
    pub current_action_frame: u32,
    pub current_action_frame_count: u32,
    pub is_action_end: bool,
    pub is_always_cancelable: bool,
    pub current_action_hit_count: u32,
    pub current_hit_stun_frame: u32,
    pub is_in_hit_stun: bool,
    pub sprite_shake_position: f32,
    pub max_sprite_shake_frame: u32,
    pub is_face_right: bool,
    pub current_frame_advantage: i32,
    pub would_dash_forward: bool,
    pub would_dash_backward: bool,
    pub special_attack_progress: f32,
    /// Raw input bits, most recent first.
    pub input_buffer: Vec<u8>,
}

/// Everything a driver can observe about the battle after a tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub round_state: RoundState,
    pub frame_count: i32,
    pub wins: [u32; 2],
    pub players: [PlayerState; 2],
}

impl GameState {
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_stopped_and_empty() {
        let state = GameState::default();
        assert_eq!(state.round_state, RoundState::Stop);
        assert_eq!(state.frame_count, 0);
        assert!(state.player(PlayerId::One).input_buffer.is_empty());
    }

    #[test]
    fn round_state_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&RoundState::KO).unwrap(), "\"ko\"");
        assert_eq!(
            serde_json::to_string(&RoundState::Fight).unwrap(),
            "\"fight\""
        );
    }
}

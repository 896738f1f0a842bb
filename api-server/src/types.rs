use footsies_core::{EncodedGameState, GameState, PolicySettings, RoundEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StepRequest {
    #[serde(default)]
    pub(crate) p1_action: u32,
    #[serde(default)]
    pub(crate) p2_action: u32,
    #[serde(default = "default_n_frames")]
    pub(crate) n_frames: u32,
}

fn default_n_frames() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub(crate) struct StateResponse {
    pub(crate) success: bool,
    pub(crate) running: bool,
    pub(crate) state: GameState,
}

#[derive(Debug, Serialize)]
pub(crate) struct EncodedStateResponse {
    pub(crate) success: bool,
    pub(crate) running: bool,
    pub(crate) encoded: EncodedGameState,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) success: bool,
    pub(crate) running: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SettingsResponse {
    pub(crate) success: bool,
    pub(crate) settings: PolicySettings,
    pub(crate) policy_loaded: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EventsResponse {
    pub(crate) success: bool,
    pub(crate) events: Vec<RoundEvent>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service: &'static str,
    pub(crate) running: bool,
    pub(crate) ticks: u64,
    pub(crate) policy_loaded: bool,
    pub(crate) settings: PolicySettings,
    pub(crate) max_step_frames: u32,
    pub(crate) buffered_events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) model_root: Option<String>,
}

use std::{env, path::PathBuf, sync::Arc};

use footsies_core::constants::{
    DEFAULT_FRAME_SKIP, DEFAULT_INFERENCE_CADENCE, DEFAULT_OBSERVATION_DELAY,
    DEFAULT_SOFTMAX_TEMPERATURE,
};
use footsies_core::{
    BattleConfig, ControlMode, JsonModelFactory, PolicyController, PolicySettings, Session,
};
use tokio::sync::Mutex;

use crate::events::EventBuffer;

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
// Ten seconds of game time per request.
pub(crate) const DEFAULT_MAX_STEP_FRAMES: u32 = 600;
pub(crate) const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 256;
pub(crate) const DEFAULT_POLICY_SEED: u32 = 0x5EED_F00D;
pub(crate) const DEFAULT_JSON_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct ServerConfig {
    pub(crate) bind_addr: String,
    pub(crate) max_step_frames: u32,
    pub(crate) event_buffer_capacity: usize,
    pub(crate) json_limit_bytes: usize,
    pub(crate) model_root: Option<PathBuf>,
    pub(crate) policy_seed: u32,
    pub(crate) policy: PolicySettings,
    pub(crate) control: [ControlMode; 2],
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_step_frames: DEFAULT_MAX_STEP_FRAMES,
            event_buffer_capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
            json_limit_bytes: DEFAULT_JSON_LIMIT_BYTES,
            model_root: None,
            policy_seed: DEFAULT_POLICY_SEED,
            policy: PolicySettings::default(),
            control: [ControlMode::Local, ControlMode::Local],
        }
    }
}

impl ServerConfig {
    pub(crate) fn from_env() -> Self {
        let mut policy = PolicySettings {
            model_id: env::var("MODEL_ID").unwrap_or_default(),
            observation_delay: read_env_u32_allow_zero(
                "OBSERVATION_DELAY",
                DEFAULT_OBSERVATION_DELAY,
            ),
            frame_skip: read_env_u32("FRAME_SKIP", DEFAULT_FRAME_SKIP),
            inference_cadence: read_env_u32_allow_zero(
                "INFERENCE_CADENCE",
                DEFAULT_INFERENCE_CADENCE,
            ),
            softmax_temperature: read_env_f32("SOFTMAX_TEMPERATURE", DEFAULT_SOFTMAX_TEMPERATURE),
        };
        if let Err(err) = policy.validate() {
            tracing::warn!("invalid policy settings in environment ({err}). Falling back to defaults.");
            policy = PolicySettings {
                model_id: policy.model_id,
                ..PolicySettings::default()
            };
        }

        let control = [
            read_env_control("P1_CONTROL", ControlMode::Local),
            read_env_control("P2_CONTROL", ControlMode::Local),
        ];

        Self {
            bind_addr: env::var("API_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            max_step_frames: read_env_u32("MAX_STEP_FRAMES", DEFAULT_MAX_STEP_FRAMES),
            event_buffer_capacity: read_env_usize(
                "EVENT_BUFFER_CAPACITY",
                DEFAULT_EVENT_BUFFER_CAPACITY,
            ),
            json_limit_bytes: read_env_usize("JSON_LIMIT_BYTES", DEFAULT_JSON_LIMIT_BYTES),
            model_root: env::var("MODEL_ROOT").ok().map(PathBuf::from),
            policy_seed: read_env_u32("POLICY_SEED", DEFAULT_POLICY_SEED),
            policy,
            control,
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: Arc<Mutex<Session>>,
    pub(crate) events: EventBuffer,
    pub(crate) max_step_frames: u32,
    pub(crate) model_root: Option<PathBuf>,
}

impl AppState {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        let events = EventBuffer::new(config.event_buffer_capacity);
        let factory = Arc::new(JsonModelFactory::new(config.model_root.clone()));
        let policy = PolicyController::new(config.policy.clone(), Some(factory), config.policy_seed);
        let battle_config = BattleConfig {
            control: config.control,
            ..BattleConfig::default()
        };
        let session = Session::new(battle_config, policy, Box::new(events.clone()));

        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            max_step_frames: config.max_step_frames,
            model_root: config.model_root.clone(),
        }
    }
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u32_allow_zero(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

pub(crate) fn read_env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(default)
}

pub(crate) fn read_env_control(name: &str, default: ControlMode) -> ControlMode {
    match env::var(name).ok().as_deref().map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("policy") => ControlMode::Policy,
        Some(value) if value.eq_ignore_ascii_case("local") => ControlMode::Local,
        Some(other) => {
            tracing::warn!("{name}={other} is not one of local|policy. Using {default:?}.");
            default
        }
        None => default,
    }
}

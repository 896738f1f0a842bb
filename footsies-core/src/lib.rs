pub mod action;
pub mod battle;
pub mod collision;
pub mod constants;
pub mod encoder;
pub mod error;
pub mod events;
pub mod fighter;
pub mod geometry;
pub mod input;
pub mod policy;
pub mod recorder;
pub mod rng;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod tape;
pub mod verify;

pub use battle::{Battle, BattleConfig, BattleHooks, ControlMode};
pub use encoder::{EncodedGameState, Encoder, Observation};
pub use error::{InferenceError, ModelLoadError, SettingsError, SinkError, TapeError, VerifyError};
pub use events::{EventSink, JsonLinesSink, NullSink, RoundEndEvent, RoundEvent, RoundStartEvent, Winner};
pub use input::{button, InputSample, PlayerId};
pub use policy::{BackendFactory, InferenceBackend, JsonModelFactory, LinearRecurrentPolicy, PolicyController};
pub use session::{MatchSummary, Session};
pub use settings::PolicySettings;
pub use snapshot::{GameState, PlayerState, RoundState};
pub use verify::{replay_inputs, verify_tape, ReplayResult, VerificationReport};

use std::path::PathBuf;

use thiserror::Error;

use crate::events::Winner;

/// Failure inside a single inference call. Never escapes a tick: the policy
/// controller logs it and emits no input for that frame.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("observation length mismatch: model expects {expected}, got {actual}")]
    ObservationShape { expected: usize, actual: usize },
    #[error("recurrent state length mismatch: model expects {expected}, got {actual}")]
    StateShape { expected: usize, actual: usize },
    #[error("backend returned no logits")]
    EmptyLogits,
    #[error("inference backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("empty model identifier")]
    EmptyModelId,
    #[error("failed reading model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model {model_id} has inconsistent shape: {reason}")]
    Shape { model_id: String, reason: String },
    #[error("model id {model_id:?} must be a relative path inside the model root")]
    OutsideRoot { model_id: String },
    #[error("model {path} exceeds {limit} bytes")]
    TooLarge { path: PathBuf, limit: u64 },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("frame_skip must be at least 1")]
    ZeroFrameSkip,
    #[error("softmax_temperature must be finite and > 0, got {0}")]
    InvalidTemperature(f32),
}

/// Event sink delivery failure. Logged at the emit site, never propagated.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event sink unavailable")]
    Unavailable,
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("event write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TapeError {
    #[error("tape too short: got {actual} bytes, need at least {min}")]
    TooShort { actual: usize, min: usize },
    #[error("invalid tape magic: 0x{found:08x}")]
    InvalidMagic { found: u32 },
    #[error("unsupported tape version: {found}")]
    UnsupportedVersion { found: u8 },
    #[error("header reserved bytes are non-zero")]
    HeaderReservedNonZero,
    #[error("frame count out of range: {frame_count} (allowed 1..={max_frames})")]
    FrameCountOutOfRange { frame_count: u32, max_frames: u32 },
    #[error("tape length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("input byte reserved bits set at frame {frame}: 0x{byte:02x}")]
    ReservedInputBits { frame: u32, byte: u8 },
    #[error("unknown winner code in footer: {found}")]
    UnknownWinner { found: u32 },
    #[error("crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}")]
    CrcMismatch { stored: u32, computed: u32 },
}

/// Tape replay disagreed with what the tape claims.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Tape(#[from] TapeError),
    #[error("match ended at frame {ended_at} but the tape has {frame_count} frames")]
    TrailingFrames { ended_at: u32, frame_count: u32 },
    #[error("final frame mismatch: claimed {claimed}, computed {computed}")]
    FinalFrameMismatch { claimed: u32, computed: u32 },
    #[error("winner mismatch: claimed {claimed:?}, computed {computed:?}")]
    WinnerMismatch {
        claimed: Option<Winner>,
        computed: Option<Winner>,
    },
}

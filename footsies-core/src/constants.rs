// All durations are in simulation frames at a fixed 60 Hz unless noted.

pub const FRAME_RATE: u32 = 60;
pub const SECONDS_PER_FRAME: f32 = 1.0 / FRAME_RATE as f32;

// Stage
pub const BATTLE_AREA_WIDTH: f32 = 10.0;
pub const BATTLE_AREA_MAX_HEIGHT: f32 = 2.0;
pub const P1_START_X: f32 = -2.0;
pub const P2_START_X: f32 = 2.0;

// Round flow
pub const INTRO_STATE_FRAMES: u32 = 3 * FRAME_RATE;
pub const KO_STATE_FRAMES: u32 = 2 * FRAME_RATE;
pub const END_STATE_FRAMES: u32 = 3 * FRAME_RATE;
pub const END_STATE_SKIPPABLE_FRAMES: u32 = 3 * FRAME_RATE / 2;
pub const MAX_ROUNDS_WON: u32 = 3;
/// Frame counter value right after Fight entry; the first Fight tick makes it 0.
pub const FRAME_COUNT_SENTINEL: i32 = -1;

// Input recording: 5 minutes at 60 Hz.
pub const MAX_RECORDING_INPUT_FRAMES: usize = 60 * 60 * 5;
pub const INPUT_HISTORY_LEN: usize = 16;

// Fighter
pub const MAX_VITAL_HEALTH: u32 = 1;
pub const MAX_GUARD_HEALTH: u32 = 3;
pub const GUARD_HEALTH_TIERS: usize = 4;
pub const SPECIAL_CHARGE_FRAMES: u32 = 60;
pub const DASH_INPUT_WINDOW: usize = 10;
pub const WALK_FORWARD_SPEED: f32 = 0.036;
pub const WALK_BACKWARD_SPEED: f32 = 0.03;
pub const SPRITE_SHAKE_AMPLITUDE: f32 = 0.025;

// Encoder normalizers
pub const POSITION_SCALE: f32 = 2.0;
pub const VELOCITY_SCALE: f32 = 5.0;
pub const FRAME_SCALE: f32 = 25.0;
pub const HIT_STUN_SCALE: f32 = 10.0;

// Policy defaults
pub const DEFAULT_FRAME_SKIP: u32 = 4;
pub const DEFAULT_OBSERVATION_DELAY: u32 = 0;
pub const DEFAULT_INFERENCE_CADENCE: u32 = 0;
pub const DEFAULT_SOFTMAX_TEMPERATURE: f32 = 1.0;
pub const MIN_SOFTMAX_TEMPERATURE: f32 = 1e-3;
pub const POLICY_STATE_SIZE: usize = 128;
pub const POLICY_ACTION_COUNT: usize = 7;
pub const SPECIAL_CHARGE_ACTION: usize = 6;

// Tape
pub const TAPE_MAGIC: u32 = 0x5953_5446; // "FTSY" little-endian
pub const TAPE_VERSION: u8 = 1;
pub const TAPE_HEADER_SIZE: usize = 16;
pub const TAPE_FOOTER_SIZE: usize = 12;
pub const TAPE_RESERVED_INPUT_BITS: u8 = 0x88;
pub const MAX_TAPE_FRAMES: u32 = 60 * 60 * 30;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FRAME_SKIP, DEFAULT_INFERENCE_CADENCE, DEFAULT_OBSERVATION_DELAY,
    DEFAULT_SOFTMAX_TEMPERATURE, MIN_SOFTMAX_TEMPERATURE, SPECIAL_CHARGE_FRAMES,
};
use crate::error::SettingsError;

/// Runtime-mutable policy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    /// Model identifier handed to the backend factory. Empty means no model.
    pub model_id: String,
    pub observation_delay: u32,
    pub frame_skip: u32,
    /// Refresh the recurrent state every N queued frames; 0 disables.
    pub inference_cadence: u32,
    pub softmax_temperature: f32,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            model_id: String::new(),
            observation_delay: DEFAULT_OBSERVATION_DELAY,
            frame_skip: DEFAULT_FRAME_SKIP,
            inference_cadence: DEFAULT_INFERENCE_CADENCE,
            softmax_temperature: DEFAULT_SOFTMAX_TEMPERATURE,
        }
    }
}

impl PolicySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.frame_skip == 0 {
            return Err(SettingsError::ZeroFrameSkip);
        }
        if !self.softmax_temperature.is_finite() || self.softmax_temperature <= 0.0 {
            return Err(SettingsError::InvalidTemperature(self.softmax_temperature));
        }
        Ok(())
    }

    /// Copy with out-of-range values clamped into something the controller can run.
    pub fn sanitized(&self) -> Self {
        let mut settings = self.clone();
        if settings.frame_skip == 0 {
            tracing::warn!("frame_skip 0 is invalid; using 1");
            settings.frame_skip = 1;
        }
        let temperature = settings.softmax_temperature;
        if !temperature.is_finite() {
            tracing::warn!(temperature, "non-finite softmax temperature; using default");
            settings.softmax_temperature = DEFAULT_SOFTMAX_TEMPERATURE;
        } else if temperature < MIN_SOFTMAX_TEMPERATURE {
            tracing::warn!(temperature, "softmax temperature too small; clamping");
            settings.softmax_temperature = MIN_SOFTMAX_TEMPERATURE;
        }
        settings
    }

    /// Decisions a special charge stays armed for.
    pub fn charge_duration(&self) -> u32 {
        (SPECIAL_CHARGE_FRAMES / self.frame_skip.max(1)).max(1)
    }

    pub fn has_model(&self) -> bool {
        !self.model_id.trim().is_empty()
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use crate::constants::SPECIAL_CHARGE_ACTION;
use crate::encoder::Encoder;
use crate::input::{button, PlayerId};
use crate::rng::SeededRng;
use crate::settings::PolicySettings;
use crate::snapshot::GameState;

use super::{
    decode_action, sample, softmax, BackendFactory, InferenceBackend, InferenceRequest,
    RecurrentState,
};

/// Which half of the stage a fighter occupies relative to its opponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Side from positions; an exact tie puts player one on the left.
pub fn side_of(state: &GameState, player: PlayerId) -> Side {
    let own = state.player(player).position_x;
    let other = state.player(player.opponent()).position_x;
    if own < other || (own == other && player == PlayerId::One) {
        Side::Left
    } else {
        Side::Right
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    state: RecurrentState,
    charge: u32,
    queue: VecDeque<u8>,
    cadence_counter: u32,
}

impl Slot {
    fn reset(&mut self, state_size: usize) {
        self.state = RecurrentState::zeros(state_size);
        self.charge = 0;
        self.queue.clear();
        self.cadence_counter = 0;
    }
}

/// Turns model output into input bits for either fighter. Without a loaded
/// backend every call yields no input.
pub struct PolicyController {
    settings: PolicySettings,
    factory: Option<Arc<dyn BackendFactory>>,
    backend: Option<Box<dyn InferenceBackend>>,
    encoder: Encoder,
    slots: [Slot; 2],
    rng: SeededRng,
}

impl PolicyController {
    pub fn new(
        settings: PolicySettings,
        factory: Option<Arc<dyn BackendFactory>>,
        seed: u32,
    ) -> Self {
        let settings = settings.sanitized();
        let mut controller = Self {
            encoder: Encoder::new(settings.observation_delay as usize),
            settings: PolicySettings {
                model_id: String::new(),
                ..settings.clone()
            },
            factory,
            backend: None,
            slots: Default::default(),
            rng: SeededRng::new(seed),
        };
        controller.update_settings(settings);
        controller.reset();
        controller
    }

    /// Controller around an already-loaded backend.
    pub fn with_backend(
        settings: PolicySettings,
        backend: Box<dyn InferenceBackend>,
        seed: u32,
    ) -> Self {
        let mut settings = settings.sanitized();
        settings.model_id = backend.model_id().to_string();
        let mut controller = Self {
            encoder: Encoder::new(settings.observation_delay as usize),
            settings,
            factory: None,
            backend: Some(backend),
            slots: Default::default(),
            rng: SeededRng::new(seed),
        };
        controller.reset();
        controller
    }

    pub fn is_loaded(&self) -> bool {
        self.backend.is_some()
    }

    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    pub fn charge_remaining(&self, player: PlayerId) -> u32 {
        self.slots[player.index()].charge
    }

    pub fn queued(&self, player: PlayerId) -> usize {
        self.slots[player.index()].queue.len()
    }

    /// Applies new settings. The backend is reloaded only when the model id changes.
    pub fn update_settings(&mut self, settings: PolicySettings) {
        let settings = settings.sanitized();

        if settings.model_id != self.settings.model_id {
            self.backend = self.load_backend(&settings.model_id);
            let state_size = self.state_size();
            for slot in &mut self.slots {
                slot.reset(state_size);
            }
        }
        if settings.frame_skip != self.settings.frame_skip {
            for slot in &mut self.slots {
                slot.queue.clear();
            }
        }
        if settings.observation_delay != self.settings.observation_delay {
            self.encoder.set_delay(settings.observation_delay as usize);
        }

        self.settings = settings;
    }

    fn load_backend(&self, model_id: &str) -> Option<Box<dyn InferenceBackend>> {
        if model_id.trim().is_empty() {
            return None;
        }
        let Some(factory) = &self.factory else {
            tracing::warn!(model_id, "no backend factory configured; policy stays inert");
            return None;
        };
        match factory.load(model_id) {
            Ok(backend) => {
                tracing::info!(model_id, "policy backend loaded");
                Some(backend)
            }
            Err(err) => {
                tracing::warn!(model_id, error = %err, "policy backend load failed; policy stays inert");
                None
            }
        }
    }

    fn state_size(&self) -> usize {
        self.backend
            .as_ref()
            .map(|backend| backend.state_size())
            .unwrap_or(0)
    }

    /// Clears recurrent state, queues, charges and the observation history.
    pub fn reset(&mut self) {
        let state_size = self.state_size();
        for slot in &mut self.slots {
            slot.reset(state_size);
        }
        self.encoder.reset();
    }

    pub fn observe(&mut self, state: &GameState) {
        self.encoder.observe(state);
    }

    /// Input bits for `player` this frame.
    pub fn next_input(&mut self, player: PlayerId, state: &GameState) -> u8 {
        let Some(backend) = self.backend.as_deref() else {
            return button::NONE;
        };
        let slot = &mut self.slots[player.index()];

        if let Some(bits) = slot.queue.pop_front() {
            let cadence = self.settings.inference_cadence;
            if cadence > 0 {
                slot.cadence_counter += 1;
                if slot.cadence_counter >= cadence {
                    slot.cadence_counter = 0;
                    let observation = self.encoder.encode(state, player);
                    let request = InferenceRequest {
                        observation: &observation,
                        state: &slot.state,
                    };
                    match backend.infer(request) {
                        Ok(output) => slot.state = output.state,
                        Err(err) => {
                            tracing::warn!(player = player.tag(), error = %err, "state refresh failed")
                        }
                    }
                }
            }
            return bits;
        }

        let observation = self.encoder.encode(state, player);
        let request = InferenceRequest {
            observation: &observation,
            state: &slot.state,
        };
        let output = match backend.infer(request) {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(player = player.tag(), error = %err, "inference failed; emitting no input");
                return button::NONE;
            }
        };
        if output.logits.is_empty() {
            tracing::warn!(player = player.tag(), "backend returned no logits");
            return button::NONE;
        }
        slot.state = output.state;
        slot.cadence_counter = 0;

        let probs = softmax(&output.logits, self.settings.softmax_temperature);
        let index = sample(&probs, self.rng.next_unit());
        let mut bits = decode_action(index, side_of(state, player));

        if index == SPECIAL_CHARGE_ACTION && slot.charge == 0 {
            slot.charge = self.settings.charge_duration();
        }
        if slot.charge > 0 {
            slot.charge -= 1;
            bits |= button::ATTACK;
        }

        for _ in 1..self.settings.frame_skip {
            slot.queue.push_back(bits);
        }
        bits
    }
}

impl std::fmt::Debug for PolicyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyController")
            .field("settings", &self.settings)
            .field("loaded", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use footsies_core::{
    button, GameState, LinearRecurrentPolicy, PlayerId, PolicyController, PolicySettings, RoundState,
};

use super::FootsiesBot;

pub(super) const DESCRIPTION: &str = "samples inputs from a recurrent policy model file";

/// Drives a fighter from a JSON policy model through the core controller.
///
/// Follows the battle's own policy cadence: queried on Intro and Fight ticks,
/// reset on Fight entry, and fed observations of Fight frames only.
pub struct PolicyBot {
    model: LinearRecurrentPolicy,
    settings: PolicySettings,
    controller: PolicyController,
    last_round_state: RoundState,
}

impl PolicyBot {
    pub fn load(path: &Path) -> Result<Self> {
        let model = LinearRecurrentPolicy::load(path)
            .with_context(|| format!("failed loading policy model {}", path.display()))?;
        Ok(Self::from_model(model, PolicySettings::default()))
    }

    pub fn from_model(model: LinearRecurrentPolicy, settings: PolicySettings) -> Self {
        let controller = PolicyController::with_backend(settings.clone(), Box::new(model.clone()), 0);
        Self {
            model,
            settings,
            controller,
            last_round_state: RoundState::Stop,
        }
    }
}

impl FootsiesBot for PolicyBot {
    fn id(&self) -> &'static str {
        "policy"
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn reset(&mut self, seed: u32) {
        self.controller =
            PolicyController::with_backend(self.settings.clone(), Box::new(self.model.clone()), seed);
        self.last_round_state = RoundState::Stop;
    }

    fn next_input(&mut self, state: &GameState, player: PlayerId) -> u8 {
        let previous = std::mem::replace(&mut self.last_round_state, state.round_state);
        match state.round_state {
            RoundState::Intro => self.controller.next_input(player, state),
            RoundState::Fight => {
                if previous == RoundState::Fight {
                    self.controller.observe(state);
                } else {
                    self.controller.reset();
                }
                self.controller.next_input(player, state)
            }
            RoundState::Stop | RoundState::KO | RoundState::End => button::NONE,
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "model_id": self.model.model_id,
            "model_crc": format!("{:08x}", footsies_core::tape::crc32(
                serde_json::to_string(&self.model).unwrap_or_default().as_bytes()
            )),
            "settings": self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footsies_core::constants::{POLICY_ACTION_COUNT, SPECIAL_CHARGE_ACTION};
    use footsies_core::encoder::OBSERVATION_LEN;

    fn constant_bot(dominant: usize) -> PolicyBot {
        let mut logits = vec![-20.0; POLICY_ACTION_COUNT];
        logits[dominant] = 20.0;
        let model = LinearRecurrentPolicy::constant("const", OBSERVATION_LEN, 2, logits);
        PolicyBot::from_model(
            model,
            PolicySettings {
                frame_skip: 1,
                ..PolicySettings::default()
            },
        )
    }

    #[test]
    fn constant_model_keeps_pressing_after_reset() {
        let mut bot = constant_bot(2);
        bot.reset(9);
        let state = in_round(RoundState::Fight);
        let pressed = (0..8)
            .map(|_| bot.next_input(&state, PlayerId::One))
            .filter(|bits| *bits & button::MASK != 0)
            .count();
        assert!(pressed > 0);
    }

    fn in_round(round_state: RoundState) -> GameState {
        GameState {
            round_state,
            ..GameState::default()
        }
    }

    #[test]
    fn second_round_starts_with_fresh_charge_and_queue() {
        let mut bot = constant_bot(SPECIAL_CHARGE_ACTION);
        bot.settings.frame_skip = 4;
        bot.reset(3);
        let player = PlayerId::One;
        let fight = in_round(RoundState::Fight);

        bot.next_input(&fight, player);
        let first_round = (
            bot.controller.charge_remaining(player),
            bot.controller.queued(player),
        );
        assert!(first_round.0 > 0);
        for _ in 0..5 {
            bot.next_input(&fight, player);
        }
        assert_ne!(
            (bot.controller.charge_remaining(player), bot.controller.queued(player)),
            first_round
        );

        let queued = bot.controller.queued(player);
        for round_state in [RoundState::KO, RoundState::End, RoundState::Stop] {
            assert_eq!(bot.next_input(&in_round(round_state), player), button::NONE);
        }
        assert_eq!(bot.controller.queued(player), queued);
        bot.next_input(&in_round(RoundState::Intro), player);

        bot.next_input(&fight, player);
        assert_eq!(
            (bot.controller.charge_remaining(player), bot.controller.queued(player)),
            first_round
        );
    }

    #[test]
    fn config_names_the_model() {
        let bot = constant_bot(0);
        assert_eq!(bot.config()["model_id"], "const");
    }
}

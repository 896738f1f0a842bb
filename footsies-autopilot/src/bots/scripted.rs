use std::collections::VecDeque;

use footsies_core::action::ActionId;
use footsies_core::input::button;
use footsies_core::rng::SeededRng;
use footsies_core::{GameState, PlayerId};
use serde::Serialize;

use super::{back_bits, distance, forward_bits, FootsiesBot};

/// Never presses anything.
pub struct IdleBot;

impl FootsiesBot for IdleBot {
    fn id(&self) -> &'static str {
        "idle"
    }

    fn description(&self) -> &'static str {
        "stands still for the whole match"
    }

    fn reset(&mut self, _seed: u32) {}

    fn next_input(&mut self, _state: &GameState, _player: PlayerId) -> u8 {
        button::NONE
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PokerConfig {
    pub poke_range: f32,
    pub recover_frames: u32,
}

/// Walks in, taps a jab at range, then backs off for a beat.
pub struct PokerBot {
    cfg: PokerConfig,
    cooldown: u32,
}

impl Default for PokerBot {
    fn default() -> Self {
        Self {
            cfg: PokerConfig {
                poke_range: 0.9,
                recover_frames: 14,
            },
            cooldown: 0,
        }
    }
}

impl FootsiesBot for PokerBot {
    fn id(&self) -> &'static str {
        "poker"
    }

    fn description(&self) -> &'static str {
        "closes distance and jabs, then steps back"
    }

    fn reset(&mut self, _seed: u32) {
        self.cooldown = 0;
    }

    fn next_input(&mut self, state: &GameState, player: PlayerId) -> u8 {
        let me = state.player(player);
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return back_bits(me);
        }
        if me.is_in_hit_stun {
            return button::NONE;
        }
        if distance(state, player) > self.cfg.poke_range {
            return forward_bits(me);
        }
        self.cooldown = self.cfg.recover_frames;
        button::ATTACK
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.cfg).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct TurtleConfig {
    pub guard_range: f32,
    pub punish_range: f32,
    pub punish_gap: u32,
}

/// Holds back to guard and only jabs an opponent already in its face.
pub struct TurtleBot {
    cfg: TurtleConfig,
    since_attack: u32,
}

impl Default for TurtleBot {
    fn default() -> Self {
        Self {
            cfg: TurtleConfig {
                guard_range: 1.6,
                punish_range: 0.75,
                punish_gap: 20,
            },
            since_attack: 0,
        }
    }
}

impl FootsiesBot for TurtleBot {
    fn id(&self) -> &'static str {
        "turtle"
    }

    fn description(&self) -> &'static str {
        "guards by holding back and counter-jabs at point blank"
    }

    fn reset(&mut self, _seed: u32) {
        self.since_attack = 0;
    }

    fn next_input(&mut self, state: &GameState, player: PlayerId) -> u8 {
        self.since_attack = self.since_attack.saturating_add(1);
        let me = state.player(player);
        let them = state.player(player.opponent());
        let gap = distance(state, player);

        let threatened = ActionId::from_raw(them.current_action_id)
            .is_some_and(|action| {
                action.is_normal_attack()
                    || matches!(action, ActionId::NSpecial | ActionId::BSpecial)
            });
        if threatened && gap < self.cfg.guard_range {
            return back_bits(me);
        }
        if gap < self.cfg.punish_range && self.since_attack >= self.cfg.punish_gap {
            self.since_attack = 0;
            return button::ATTACK;
        }
        back_bits(me)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.cfg).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct DasherConfig {
    pub attack_range: f32,
}

/// Dashes in with double taps, jabs, then backdashes out.
pub struct DasherBot {
    cfg: DasherConfig,
    script: VecDeque<Step>,
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Forward,
    Back,
    Attack,
    Neutral,
}

impl Default for DasherBot {
    fn default() -> Self {
        Self {
            cfg: DasherConfig { attack_range: 0.85 },
            script: VecDeque::new(),
        }
    }
}

impl FootsiesBot for DasherBot {
    fn id(&self) -> &'static str {
        "dasher"
    }

    fn description(&self) -> &'static str {
        "forward dash, jab, back dash on a loop"
    }

    fn reset(&mut self, _seed: u32) {
        self.script.clear();
    }

    fn next_input(&mut self, state: &GameState, player: PlayerId) -> u8 {
        use Step::*;

        let me = state.player(player);
        if self.script.is_empty() {
            let plan: &[Step] = if distance(state, player) > self.cfg.attack_range {
                &[Forward, Neutral, Forward, Neutral, Neutral, Neutral]
            } else {
                &[
                    Attack, Neutral, Neutral, Neutral, Neutral, Neutral, Neutral, Neutral, Back,
                    Neutral, Back, Neutral, Neutral, Neutral,
                ]
            };
            self.script.extend(plan.iter().copied());
        }

        match self.script.pop_front().unwrap_or(Neutral) {
            Forward => forward_bits(me),
            Back => back_bits(me),
            Attack => button::ATTACK,
            Neutral => button::NONE,
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.cfg).unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RandomConfig {
    pub max_hold_frames: u32,
}

/// Seeded button mashing; each choice is held for a random stretch.
pub struct RandomBot {
    cfg: RandomConfig,
    rng: SeededRng,
    current: u8,
    hold: u32,
}

impl Default for RandomBot {
    fn default() -> Self {
        Self {
            cfg: RandomConfig {
                max_hold_frames: 12,
            },
            rng: SeededRng::new(0),
            current: button::NONE,
            hold: 0,
        }
    }
}

impl FootsiesBot for RandomBot {
    fn id(&self) -> &'static str {
        "random"
    }

    fn description(&self) -> &'static str {
        "random inputs from a seeded generator"
    }

    fn reset(&mut self, seed: u32) {
        self.rng = SeededRng::new(seed);
        self.current = button::NONE;
        self.hold = 0;
    }

    fn next_input(&mut self, _state: &GameState, _player: PlayerId) -> u8 {
        if self.hold == 0 {
            self.current = (self.rng.next_int(u32::from(button::MASK) + 1) as u8) & button::MASK;
            self.hold = 1 + self.rng.next_int(self.cfg.max_hold_frames.max(1));
        }
        self.hold -= 1;
        self.current
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(self.cfg).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footsies_core::PlayerState;

    fn facing_pair(gap: f32) -> GameState {
        GameState {
            players: [
                PlayerState {
                    position_x: -gap / 2.0,
                    is_face_right: true,
                    ..PlayerState::default()
                },
                PlayerState {
                    position_x: gap / 2.0,
                    is_face_right: false,
                    ..PlayerState::default()
                },
            ],
            ..GameState::default()
        }
    }

    #[test]
    fn poker_walks_in_then_jabs_then_retreats() {
        let mut bot = PokerBot::default();
        assert_eq!(
            bot.next_input(&facing_pair(3.0), PlayerId::One),
            button::RIGHT
        );
        let close = facing_pair(0.5);
        assert_eq!(bot.next_input(&close, PlayerId::One), button::ATTACK);
        assert_eq!(bot.next_input(&close, PlayerId::One), button::LEFT);
    }

    #[test]
    fn turtle_holds_back_against_an_attack() {
        let mut bot = TurtleBot::default();
        let mut state = facing_pair(1.2);
        state.players[0].current_action_id = ActionId::NAttack.raw();
        assert_eq!(bot.next_input(&state, PlayerId::Two), button::RIGHT);
    }

    #[test]
    fn dasher_double_taps_forward_from_range() {
        let mut bot = DasherBot::default();
        let state = facing_pair(3.0);
        let taps: Vec<u8> = (0..4)
            .map(|_| bot.next_input(&state, PlayerId::Two))
            .collect();
        assert_eq!(
            taps,
            vec![button::LEFT, button::NONE, button::LEFT, button::NONE]
        );
    }

    #[test]
    fn random_bot_is_reproducible_per_seed() {
        let state = GameState::default();
        let run = |seed| {
            let mut bot = RandomBot::default();
            bot.reset(seed);
            (0..200)
                .map(|_| bot.next_input(&state, PlayerId::One))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
        assert!(run(7).iter().all(|bits| bits & !button::MASK == 0));
    }
}

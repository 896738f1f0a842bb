use serde::{Deserialize, Serialize};

use crate::battle::{Battle, BattleConfig, BattleHooks};
use crate::collision::DamageEvent;
use crate::encoder::{EncodedGameState, Encoder};
use crate::events::{EventSink, NullSink, Winner};
use crate::input::PlayerId;
use crate::policy::PolicyController;
use crate::settings::PolicySettings;
use crate::snapshot::GameState;

/// Outcome of a match that reached the win threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub winner: Winner,
    pub wins: [u32; 2],
    pub rounds: u32,
}

impl MatchSummary {
    fn from_battle(battle: &Battle) -> Self {
        let wins = battle.wins();
        let winner = match wins[0].cmp(&wins[1]) {
            std::cmp::Ordering::Greater => Winner::P1,
            std::cmp::Ordering::Less => Winner::P2,
            std::cmp::Ordering::Equal => Winner::Tie,
        };
        Self {
            winner,
            wins,
            rounds: battle.round(),
        }
    }
}

/// Externally stepped battle plus its collaborators.
///
/// Without a running battle (the menu) queries return defaults and log a
/// warning.
pub struct Session {
    battle_config: BattleConfig,
    battle: Option<Battle>,
    policy: PolicyController,
    sink: Box<dyn EventSink>,
    ticks: u64,
    last_match: Option<MatchSummary>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(
            BattleConfig::default(),
            PolicyController::new(PolicySettings::default(), None, 0),
            Box::new(NullSink),
        )
    }
}

impl Session {
    pub fn new(
        battle_config: BattleConfig,
        policy: PolicyController,
        sink: Box<dyn EventSink>,
    ) -> Self {
        Self {
            battle_config,
            battle: None,
            policy,
            sink,
            ticks: 0,
            last_match: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.battle.is_some()
    }

    pub fn battle(&self) -> Option<&Battle> {
        self.battle.as_ref()
    }

    pub fn battle_mut(&mut self) -> Option<&mut Battle> {
        self.battle.as_mut()
    }

    pub fn battle_config(&self) -> &BattleConfig {
        &self.battle_config
    }

    /// Takes effect at the next `start_game`.
    pub fn set_battle_config(&mut self, config: BattleConfig) {
        self.battle_config = config;
    }

    pub fn settings(&self) -> &PolicySettings {
        self.policy.settings()
    }

    pub fn policy(&self) -> &PolicyController {
        &self.policy
    }

    /// Ticks simulated since the session was created.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_match(&self) -> Option<&MatchSummary> {
        self.last_match.as_ref()
    }

    /// Starts a battle already in Fight, with the intro skipped.
    pub fn start_game(&mut self) {
        if self.battle.is_some() {
            tracing::info!("restarting running battle");
        }
        let mut hooks = BattleHooks {
            policy: &mut self.policy,
            sink: self.sink.as_mut(),
        };
        self.battle = Some(Battle::start_stepping(self.battle_config.clone(), &mut hooks));
        self.last_match = None;
        tracing::info!("battle started");
    }

    pub fn reset_game(&mut self) {
        if self.battle.take().is_some() {
            tracing::info!("battle torn down; back to menu");
        }
        self.policy.reset();
    }

    /// Runs `n` ticks with both inputs forced, then clears the overrides.
    ///
    /// A match that finishes mid-way returns its final state and drops the
    /// session back to the menu.
    pub fn step_n_frames(&mut self, p1: u8, p2: u8, n: u32) -> GameState {
        let Some(battle) = self.battle.as_mut() else {
            tracing::warn!("step requested with no running battle");
            return GameState::default();
        };

        battle.set_step_override(PlayerId::One, Some(p1));
        battle.set_step_override(PlayerId::Two, Some(p2));
        let mut hooks = BattleHooks {
            policy: &mut self.policy,
            sink: self.sink.as_mut(),
        };
        for _ in 0..n {
            battle.tick(&mut hooks);
            self.ticks += 1;
            if battle.is_match_over() {
                break;
            }
        }
        battle.clear_step_overrides();

        let state = battle.game_state();
        if battle.is_match_over() {
            self.finish_match();
        }
        state
    }

    /// One tick with whatever local or policy input is configured.
    pub fn tick(&mut self) -> Option<GameState> {
        let battle = self.battle.as_mut()?;
        let mut hooks = BattleHooks {
            policy: &mut self.policy,
            sink: self.sink.as_mut(),
        };
        battle.tick(&mut hooks);
        self.ticks += 1;

        let state = battle.game_state();
        if battle.is_match_over() {
            self.finish_match();
        }
        Some(state)
    }

    fn finish_match(&mut self) {
        if let Some(battle) = self.battle.take() {
            let summary = MatchSummary::from_battle(&battle);
            tracing::info!(winner = ?summary.winner, wins = ?summary.wins, rounds = summary.rounds, "match finished; back to menu");
            self.last_match = Some(summary);
        }
    }

    pub fn get_state(&self) -> GameState {
        match &self.battle {
            Some(battle) => battle.game_state(),
            None => {
                tracing::warn!("state requested with no running battle");
                GameState::default()
            }
        }
    }

    pub fn get_encoded_state(&self) -> EncodedGameState {
        match &self.battle {
            Some(battle) => battle.encoded_state(),
            None => {
                tracing::warn!("encoded state requested with no running battle");
                Encoder::default().encode_both(&GameState::default())
            }
        }
    }

    pub fn update_settings(&mut self, settings: PolicySettings) {
        self.policy.update_settings(settings);
        let delay = self.policy.settings().observation_delay as usize;
        if let Some(battle) = self.battle.as_mut() {
            battle.set_observation_delay(delay);
        }
    }

    pub fn set_local_input(&mut self, player: PlayerId, bits: u8) {
        match self.battle.as_mut() {
            Some(battle) => battle.set_local_input(player, bits),
            None => tracing::debug!(player = player.tag(), "local input ignored outside a battle"),
        }
    }

    pub fn drain_damage_events(&mut self) -> Vec<DamageEvent> {
        self.battle
            .as_mut()
            .map(Battle::drain_damage_events)
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("battle", &self.battle)
            .field("policy", &self.policy)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

//! Round state machine: Stop → Intro → Fight → KO → End → Stop.
//!
//! One [`Battle::tick`] advances exactly one 60 Hz frame. Collaborators (the
//! policy controller and the event sink) are lent in through [`BattleHooks`].

use serde::{Deserialize, Serialize};

use crate::collision::{
    push_character_vs_character, push_character_vs_stage, resolve_hits, DamageEvent,
};
use crate::constants::{
    END_STATE_FRAMES, END_STATE_SKIPPABLE_FRAMES, FRAME_COUNT_SENTINEL, INTRO_STATE_FRAMES,
    KO_STATE_FRAMES, MAX_ROUNDS_WON, P1_START_X, P2_START_X, SECONDS_PER_FRAME,
};
use crate::encoder::{EncodedGameState, Encoder};
use crate::events::{ActionLogEntry, EventSink, PolicySummary, RoundEndEvent, RoundStartEvent, Winner};
use crate::fighter::Fighter;
use crate::geometry::Vec2;
use crate::input::{button, InputSample, PlayerId};
use crate::policy::PolicyController;
use crate::recorder::InputRecorder;
use crate::snapshot::GameState;

pub use crate::snapshot::RoundState;

/// Oldest damage events are dropped past this many undrained entries.
const MAX_PENDING_DAMAGE_EVENTS: usize = 256;

/// Where a fighter's input comes from when nothing overrides it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Local,
    Policy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub start_positions: [f32; 2],
    pub control: [ControlMode; 2],
    /// Replay the previous round's recorded input from each Fight entry.
    pub replay_last_round: bool,
    pub max_rounds_won: u32,
    /// Force the attack bit on for a fighter.
    pub debug_attack: [bool; 2],
    /// Force the back direction on for a fighter.
    pub debug_guard: [bool; 2],
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            start_positions: [P1_START_X, P2_START_X],
            control: [ControlMode::Local, ControlMode::Local],
            replay_last_round: false,
            max_rounds_won: MAX_ROUNDS_WON,
            debug_attack: [false; 2],
            debug_guard: [false; 2],
        }
    }
}

/// Collaborators borrowed for the duration of one call.
pub struct BattleHooks<'a> {
    pub policy: &'a mut PolicyController,
    pub sink: &'a mut dyn EventSink,
}

pub struct Battle {
    config: BattleConfig,
    fighters: [Fighter; 2],
    round_state: RoundState,
    timer: u32,
    frame_count: i32,
    wins: [u32; 2],
    round: u32,
    match_over: bool,
    recorder: InputRecorder,
    encoder: Encoder,
    local_input: [u8; 2],
    step_override: [Option<u8>; 2],
    debug_pause: bool,
    debug_frame_advance: bool,
    action_logs: [Vec<ActionLogEntry>; 2],
    damage_events: Vec<DamageEvent>,
}

impl Battle {
    pub fn new(config: BattleConfig) -> Self {
        let fighters = [
            Fighter::new(Vec2::new(config.start_positions[0], 0.0), true),
            Fighter::new(Vec2::new(config.start_positions[1], 0.0), false),
        ];
        let mut recorder = InputRecorder::default();
        if config.replay_last_round {
            recorder.start_replay();
        }
        Self {
            config,
            fighters,
            round_state: RoundState::Stop,
            timer: 0,
            frame_count: FRAME_COUNT_SENTINEL,
            wins: [0; 2],
            round: 0,
            match_over: false,
            recorder,
            encoder: Encoder::default(),
            local_input: [0; 2],
            step_override: [None; 2],
            debug_pause: false,
            debug_frame_advance: false,
            action_logs: [Vec::new(), Vec::new()],
            damage_events: Vec::new(),
        }
    }

    /// Battle already in Fight with the intro skipped, for external stepping.
    pub fn start_stepping(config: BattleConfig, hooks: &mut BattleHooks<'_>) -> Self {
        let mut battle = Self::new(config);
        battle.change_round_state(RoundState::Intro, hooks);
        battle.update_intro_state(hooks);
        battle.change_round_state(RoundState::Fight, hooks);
        battle
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn round_state(&self) -> RoundState {
        self.round_state
    }

    pub fn frame_count(&self) -> i32 {
        self.frame_count
    }

    pub fn state_timer(&self) -> u32 {
        self.timer
    }

    pub fn wins(&self) -> [u32; 2] {
        self.wins
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_match_over(&self) -> bool {
        self.match_over
    }

    pub fn fighter(&self, player: PlayerId) -> &Fighter {
        &self.fighters[player.index()]
    }

    pub fn recorder(&self) -> &InputRecorder {
        &self.recorder
    }

    pub fn action_log(&self, player: PlayerId) -> &[ActionLogEntry] {
        &self.action_logs[player.index()]
    }

    pub fn is_debug_pause(&self) -> bool {
        self.debug_pause
    }

    pub fn game_state(&self) -> GameState {
        GameState {
            round_state: self.round_state,
            frame_count: self.frame_count,
            wins: self.wins,
            players: [
                self.fighters[0].player_state(),
                self.fighters[1].player_state(),
            ],
        }
    }

    pub fn encoded_state(&self) -> EncodedGameState {
        self.encoder.encode_both(&self.game_state())
    }

    // ── Driver controls ─────────────────────────────────────

    pub fn set_local_input(&mut self, player: PlayerId, bits: u8) {
        self.local_input[player.index()] = bits & button::MASK;
    }

    /// Exact input for the next ticks, bypassing local and policy sources.
    pub fn set_step_override(&mut self, player: PlayerId, bits: Option<u8>) {
        self.step_override[player.index()] = bits.map(|bits| bits & button::MASK);
    }

    pub fn clear_step_overrides(&mut self) {
        self.step_override = [None; 2];
    }

    pub fn set_control(&mut self, player: PlayerId, mode: ControlMode) {
        self.config.control[player.index()] = mode;
    }

    pub fn set_replay_last_round(&mut self, enabled: bool) {
        self.config.replay_last_round = enabled;
        if enabled {
            self.recorder.start_replay();
        } else {
            self.recorder.stop_replay();
        }
    }

    pub fn set_observation_delay(&mut self, delay: usize) {
        self.encoder.set_delay(delay);
    }

    pub fn set_debug_pause(&mut self, paused: bool) {
        self.debug_pause = paused;
        self.debug_frame_advance = false;
    }

    /// While paused, lets exactly one Fight tick through.
    pub fn request_debug_frame_advance(&mut self) {
        self.debug_frame_advance = true;
    }

    pub fn drain_damage_events(&mut self) -> Vec<DamageEvent> {
        std::mem::take(&mut self.damage_events)
    }

    // ── Tick ────────────────────────────────────────────────

    pub fn tick(&mut self, hooks: &mut BattleHooks<'_>) {
        match self.round_state {
            RoundState::Stop => {
                if !self.match_over {
                    self.change_round_state(RoundState::Intro, hooks);
                }
            }
            RoundState::Intro => {
                self.update_intro_state(hooks);
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.change_round_state(RoundState::Fight, hooks);
                }
            }
            RoundState::Fight => {
                if self.check_debug_pause() {
                    return;
                }
                self.frame_count += 1;
                self.update_fight_state(hooks);
                if self.fighters.iter().any(Fighter::is_dead) {
                    self.change_round_state(RoundState::KO, hooks);
                }
            }
            RoundState::KO => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.change_round_state(RoundState::End, hooks);
                }
            }
            RoundState::End => {
                self.update_end_state();
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0
                    || (self.timer <= END_STATE_SKIPPABLE_FRAMES && self.is_skip_pressed())
                {
                    self.change_round_state(RoundState::Stop, hooks);
                }
            }
        }
    }

    fn change_round_state(&mut self, state: RoundState, hooks: &mut BattleHooks<'_>) {
        tracing::debug!(from = ?self.round_state, to = ?state, round = self.round, "round state change");
        self.round_state = state;

        match state {
            RoundState::Stop => {
                let max = self.config.max_rounds_won;
                if self.wins.iter().any(|&wins| wins >= max) {
                    self.match_over = true;
                    tracing::info!(wins = ?self.wins, "match over");
                }
            }
            RoundState::Intro => {
                self.round += 1;
                self.fighters[0]
                    .setup_battle_start(Vec2::new(self.config.start_positions[0], 0.0), true);
                self.fighters[1]
                    .setup_battle_start(Vec2::new(self.config.start_positions[1], 0.0), false);
                for log in &mut self.action_logs {
                    log.clear();
                }
                self.timer = INTRO_STATE_FRAMES;
                if self.config.replay_last_round && !self.recorder.is_replaying() {
                    self.recorder.start_replay();
                }
                self.emit_round_start(hooks);
            }
            RoundState::Fight => {
                self.frame_count = FRAME_COUNT_SENTINEL;
                self.recorder.start_recording();
                if self.recorder.is_replaying() {
                    self.recorder.restart_replay();
                }
                hooks.policy.reset();
                self.encoder
                    .set_delay(hooks.policy.settings().observation_delay as usize);
                self.encoder.reset();
            }
            RoundState::KO => {
                self.timer = KO_STATE_FRAMES;
                self.recorder.commit_round();
                self.recorder.stop_replay();
                for fighter in &mut self.fighters {
                    fighter.clear_input();
                }
            }
            RoundState::End => {
                self.timer = END_STATE_FRAMES;
                let winner = self.winner();
                match winner {
                    Winner::P1 => {
                        self.fighters[0].request_win_action();
                        self.wins[0] += 1;
                    }
                    Winner::P2 => {
                        self.fighters[1].request_win_action();
                        self.wins[1] += 1;
                    }
                    Winner::Tie => {}
                }
                tracing::info!(round = self.round, ?winner, frames = self.frame_count, "round over");
                self.emit_round_end(winner, hooks);
            }
        }
    }

    fn winner(&self) -> Winner {
        match (self.fighters[0].is_dead(), self.fighters[1].is_dead()) {
            (false, true) => Winner::P1,
            (true, false) => Winner::P2,
            _ => Winner::Tie,
        }
    }

    fn check_debug_pause(&mut self) -> bool {
        if !self.debug_pause {
            return false;
        }
        !std::mem::take(&mut self.debug_frame_advance)
    }

    fn is_skip_pressed(&self) -> bool {
        self.local_input.iter().any(|bits| bits & button::ATTACK != 0)
    }

    fn input_time(&self) -> f32 {
        if self.round_state == RoundState::Fight {
            self.frame_count.max(0) as f32 * SECONDS_PER_FRAME
        } else {
            0.0
        }
    }

    /// Replay first, then the step override, then the policy for
    /// policy-controlled fighters, then local bits.
    fn collect_inputs(&mut self, hooks: &mut BattleHooks<'_>) -> [InputSample; 2] {
        if self.recorder.is_replaying() {
            if self.round_state == RoundState::Fight {
                return self.recorder.next_replay();
            }
            return [InputSample::default(); 2];
        }

        let time = self.input_time();
        let wants_policy = PlayerId::BOTH.iter().any(|player| {
            self.step_override[player.index()].is_none()
                && self.config.control[player.index()] == ControlMode::Policy
        }) && hooks.policy.is_loaded();
        let state = wants_policy.then(|| self.game_state());

        let mut samples = [InputSample::default(); 2];
        for player in PlayerId::BOTH {
            let i = player.index();
            let bits = match (self.step_override[i], &state) {
                (Some(bits), _) => bits,
                (None, Some(state)) if self.config.control[i] == ControlMode::Policy => {
                    hooks.policy.next_input(player, state) | self.debug_bits(player)
                }
                _ => self.local_input[i] | self.debug_bits(player),
            };
            samples[i] = InputSample::new(bits, time);
        }
        samples
    }

    fn debug_bits(&self, player: PlayerId) -> u8 {
        let i = player.index();
        let mut bits = 0;
        if self.config.debug_attack[i] {
            bits |= button::ATTACK;
        }
        if self.config.debug_guard[i] {
            bits |= if self.fighters[i].is_face_right() {
                button::LEFT
            } else {
                button::RIGHT
            };
        }
        bits
    }

    fn push_inputs(&mut self, hooks: &mut BattleHooks<'_>) {
        let samples = self.collect_inputs(hooks);
        self.recorder.record(samples);
        for (fighter, sample) in self.fighters.iter_mut().zip(samples) {
            fighter.update_input(sample);
        }
    }

    fn update_intro_state(&mut self, hooks: &mut BattleHooks<'_>) {
        self.push_inputs(hooks);
        for fighter in &mut self.fighters {
            fighter.increment_action_frame();
        }
        for fighter in &mut self.fighters {
            fighter.update_intro_action();
        }
        self.update_movement_and_push();
    }

    fn update_fight_state(&mut self, hooks: &mut BattleHooks<'_>) {
        self.push_inputs(hooks);

        let frames_left = [self.fighters[0].frames_left(), self.fighters[1].frames_left()];
        self.fighters[0].set_frame_advantage(frames_left[1] - frames_left[0]);
        self.fighters[1].set_frame_advantage(frames_left[0] - frames_left[1]);

        for fighter in &mut self.fighters {
            fighter.increment_action_frame();
        }
        for fighter in &mut self.fighters {
            fighter.update_action_request();
        }
        self.update_movement_and_push();
        self.log_actions();

        let events = resolve_hits(&mut self.fighters);
        self.push_damage_events(events);

        let state = self.game_state();
        self.encoder.observe(&state);
        hooks.policy.observe(&state);
    }

    fn update_end_state(&mut self) {
        for fighter in &mut self.fighters {
            fighter.increment_action_frame();
        }
        for fighter in &mut self.fighters {
            fighter.update_action_request();
        }
        self.update_movement_and_push();
    }

    fn update_movement_and_push(&mut self) {
        for fighter in &mut self.fighters {
            fighter.update_movement();
        }
        for fighter in &mut self.fighters {
            fighter.update_boxes();
        }
        push_character_vs_character(&mut self.fighters);
        push_character_vs_stage(&mut self.fighters);
    }

    fn log_actions(&mut self) {
        for player in PlayerId::BOTH {
            let fighter = &self.fighters[player.index()];
            if fighter.input(0) != fighter.input(1) {
                self.action_logs[player.index()].push(ActionLogEntry {
                    frame: self.frame_count,
                    bits: fighter.input(0),
                });
            }
        }
    }

    fn push_damage_events(&mut self, events: Vec<DamageEvent>) {
        self.damage_events.extend(events);
        if self.damage_events.len() > MAX_PENDING_DAMAGE_EVENTS {
            let excess = self.damage_events.len() - MAX_PENDING_DAMAGE_EVENTS;
            self.damage_events.drain(..excess);
        }
    }

    fn emit_round_start(&self, hooks: &mut BattleHooks<'_>) {
        let event = RoundStartEvent {
            round: self.round,
            wins: self.wins,
            policy: PolicySummary::from(hooks.policy.settings()),
        };
        if let Err(err) = hooks.sink.on_round_start(&event) {
            tracing::warn!(error = %err, round = self.round, "round start event dropped");
        }
    }

    fn emit_round_end(&self, winner: Winner, hooks: &mut BattleHooks<'_>) {
        let event = RoundEndEvent {
            round: self.round,
            winner,
            total_frames: self.frame_count.max(0) as u32,
            wins: self.wins,
            policy: PolicySummary::from(hooks.policy.settings()),
            p1_actions: self.action_logs[0].clone(),
            p2_actions: self.action_logs[1].clone(),
        };
        if let Err(err) = hooks.sink.on_round_end(&event) {
            tracing::warn!(error = %err, round = self.round, "round end event dropped");
        }
    }
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("round_state", &self.round_state)
            .field("frame_count", &self.frame_count)
            .field("wins", &self.wins)
            .field("round", &self.round)
            .finish_non_exhaustive()
    }
}

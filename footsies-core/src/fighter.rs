use serde::{Deserialize, Serialize};

use crate::action::{action_data, attack_data, ActionData, ActionId, AttackData, BoxKind};
use crate::constants::{
    DASH_INPUT_WINDOW, INPUT_HISTORY_LEN, MAX_GUARD_HEALTH, MAX_VITAL_HEALTH,
    SPECIAL_CHARGE_FRAMES, SPRITE_SHAKE_AMPLITUDE,
};
use crate::geometry::{Hitbox, Hurtbox, Rect, Vec2};
use crate::input::{button, InputSample};
use crate::snapshot::PlayerState;

/// Outcome of a resolved hit from the defender's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageResult {
    /// Defender was already dead; nothing changed.
    None,
    Guard,
    GuardBreak,
    Hit,
    /// Vital hit that brought health to zero.
    Knockout,
}

/// One combatant. Owned by the battle; mutated only from inside a tick.
#[derive(Clone, Debug)]
pub struct Fighter {
    position: Vec2,
    velocity_x: f32,
    is_face_right: bool,
    vital_health: u32,
    guard_health: u32,
    is_dead: bool,
    current_action: ActionId,
    current_action_frame: u32,
    current_action_hit_count: u32,
    hit_attack_ids: Vec<u32>,
    current_hit_stun_frame: u32,
    sprite_shake_frame: u32,
    max_sprite_shake_frame: u32,
    current_frame_advantage: i32,
    /// Raw input bits, most recent first.
    input_history: [u8; INPUT_HISTORY_LEN],
    last_input_time: f32,
    attack_hold_frames: u32,
    charged_release: bool,
    proximity_guard: bool,
    pushbox: Rect,
    hitboxes: Vec<Hitbox>,
    hurtboxes: Vec<Hurtbox>,
}

impl Default for Fighter {
    fn default() -> Self {
        Self::new(Vec2::ZERO, true)
    }
}

impl Fighter {
    pub fn new(position: Vec2, is_face_right: bool) -> Self {
        let mut fighter = Self {
            position,
            velocity_x: 0.0,
            is_face_right,
            vital_health: MAX_VITAL_HEALTH,
            guard_health: MAX_GUARD_HEALTH,
            is_dead: false,
            current_action: ActionId::Stand,
            current_action_frame: 0,
            current_action_hit_count: 0,
            hit_attack_ids: Vec::with_capacity(4),
            current_hit_stun_frame: 0,
            sprite_shake_frame: 0,
            max_sprite_shake_frame: 0,
            current_frame_advantage: 0,
            input_history: [0; INPUT_HISTORY_LEN],
            last_input_time: 0.0,
            attack_hold_frames: 0,
            charged_release: false,
            proximity_guard: false,
            pushbox: Rect::default(),
            hitboxes: Vec::with_capacity(4),
            hurtboxes: Vec::with_capacity(4),
        };
        fighter.update_boxes();
        fighter
    }

    /// Resets every per-round field and places the fighter at `position`.
    pub fn setup_battle_start(&mut self, position: Vec2, is_face_right: bool) {
        *self = Self::new(position, is_face_right);
    }

    // ── Input ───────────────────────────────────────────────

    pub fn update_input(&mut self, sample: InputSample) {
        self.input_history.copy_within(0..INPUT_HISTORY_LEN - 1, 1);
        self.input_history[0] = sample.bits & button::MASK;
        self.last_input_time = sample.time;

        self.charged_release = false;
        if sample.attack() {
            self.attack_hold_frames = self.attack_hold_frames.saturating_add(1);
        } else {
            self.charged_release = self.attack_hold_frames >= SPECIAL_CHARGE_FRAMES;
            self.attack_hold_frames = 0;
        }
    }

    pub fn clear_input(&mut self) {
        self.input_history = [0; INPUT_HISTORY_LEN];
        self.attack_hold_frames = 0;
        self.charged_release = false;
    }

    /// Input bits `frames_ago` frames back; 0 is the current frame.
    pub fn input(&self, frames_ago: usize) -> u8 {
        self.input_history.get(frames_ago).copied().unwrap_or(0)
    }

    fn forward_bit(&self) -> u8 {
        if self.is_face_right {
            button::RIGHT
        } else {
            button::LEFT
        }
    }

    fn backward_bit(&self) -> u8 {
        if self.is_face_right {
            button::LEFT
        } else {
            button::RIGHT
        }
    }

    fn holding(&self, bit: u8) -> bool {
        self.input(0) & bit != 0
    }

    fn attack_pressed(&self) -> bool {
        self.holding(button::ATTACK) && self.input(1) & button::ATTACK == 0
    }

    /// Double tap: a fresh press this frame plus an earlier press inside the window.
    fn double_tapped(&self, bit: u8) -> bool {
        if !self.holding(bit) || self.input(1) & bit != 0 {
            return false;
        }
        (2..=DASH_INPUT_WINDOW).any(|i| self.input(i) & bit != 0)
    }

    pub fn would_dash_forward(&self) -> bool {
        self.double_tapped(self.forward_bit())
    }

    pub fn would_dash_backward(&self) -> bool {
        self.double_tapped(self.backward_bit())
    }

    pub fn special_attack_progress(&self) -> f32 {
        (self.attack_hold_frames as f32 / SPECIAL_CHARGE_FRAMES as f32).clamp(0.0, 1.0)
    }

    // ── Action frame ────────────────────────────────────────

    fn data(&self) -> &'static ActionData {
        action_data(self.current_action)
    }

    pub fn increment_action_frame(&mut self) {
        if self.sprite_shake_frame > 0 {
            self.sprite_shake_frame -= 1;
        }

        if self.current_hit_stun_frame > 0 {
            self.current_hit_stun_frame -= 1;
            return;
        }

        let data = self.data();
        if self.current_action_frame < data.frame_count {
            self.current_action_frame += 1;
        }
        if data.looping && self.current_action_frame >= data.frame_count {
            self.current_action_frame = 0;
        }
    }

    pub fn is_action_end(&self) -> bool {
        !self.data().looping && self.current_action_frame >= self.data().frame_count
    }

    pub fn is_always_cancelable(&self) -> bool {
        self.data().always_cancelable
    }

    /// Frames until the current action can be cancelled.
    pub fn frames_left(&self) -> i32 {
        if self.is_always_cancelable() {
            0
        } else {
            self.data().frame_count as i32 - self.current_action_frame as i32
        }
    }

    fn request_action(&mut self, id: ActionId) {
        if id == self.current_action && self.data().looping {
            return;
        }
        self.current_action = id;
        self.current_action_frame = 0;
        self.current_action_hit_count = 0;
        self.hit_attack_ids.clear();
    }

    /// Forces an action by raw id. Unknown ids fall back to neutral stance.
    pub fn request_action_raw(&mut self, raw: u32) {
        let id = ActionId::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!(raw, "unknown action id; falling back to stand");
            ActionId::Stand
        });
        self.request_action(id);
    }

    pub fn request_win_action(&mut self) {
        self.request_action(ActionId::Win);
    }

    pub fn update_intro_action(&mut self) {
        self.proximity_guard = false;
        if self.is_always_cancelable() || self.is_action_end() {
            self.request_action(ActionId::Stand);
        }
    }

    pub fn update_action_request(&mut self) {
        let proximity_guard = std::mem::take(&mut self.proximity_guard);

        if self.is_dead || self.current_action == ActionId::Win || self.is_in_hit_stun() {
            return;
        }

        if self.current_action == ActionId::GuardBreak && self.is_action_end() {
            self.guard_health = MAX_GUARD_HEALTH;
        }

        let can_cancel = self.is_always_cancelable() || self.is_action_end();
        let directional = self.holding(button::LEFT) || self.holding(button::RIGHT);

        let special_cancel =
            self.current_action.is_normal_attack() && self.current_action_hit_count > 0;
        if self.charged_release && (can_cancel || special_cancel) {
            self.charged_release = false;
            self.request_action(if directional {
                ActionId::BSpecial
            } else {
                ActionId::NSpecial
            });
            return;
        }

        if !can_cancel {
            return;
        }

        if self.attack_pressed() {
            self.request_action(if directional {
                ActionId::BAttack
            } else {
                ActionId::NAttack
            });
        } else if self.would_dash_forward() {
            self.request_action(ActionId::DashForward);
        } else if self.would_dash_backward() {
            self.request_action(ActionId::DashBackward);
        } else if self.holding(self.forward_bit()) {
            self.request_action(ActionId::Forward);
        } else if self.holding(self.backward_bit()) {
            self.request_action(if proximity_guard {
                ActionId::GuardProximity
            } else {
                ActionId::Backward
            });
        } else {
            self.request_action(ActionId::Stand);
        }
    }

    // ── Movement & boxes ────────────────────────────────────

    pub fn update_movement(&mut self) {
        if self.is_in_hit_stun() {
            self.velocity_x = 0.0;
            return;
        }
        let v = self.data().motion.velocity_at(self.current_action_frame);
        self.velocity_x = if self.is_face_right { v } else { -v };
        self.position.x += self.velocity_x;
    }

    pub fn update_boxes(&mut self) {
        let data = self.data();
        let dir = if self.is_face_right { 1.0 } else { -1.0 };
        let frame = self.current_action_frame;

        self.hitboxes.clear();
        self.hurtboxes.clear();
        self.pushbox = Rect::from_center(self.position.x, self.position.y, 0.0, 0.0);

        for spec in data.boxes.iter().filter(|spec| spec.active_at(frame)) {
            let rect = Rect::from_center(
                self.position.x + spec.x * dir,
                self.position.y + spec.y,
                spec.width,
                spec.height,
            );
            match spec.kind {
                BoxKind::Push => self.pushbox = rect,
                BoxKind::Hurt => self.hurtboxes.push(Hurtbox { rect }),
                BoxKind::Hit {
                    attack_id,
                    proximity,
                } => self.hitboxes.push(Hitbox {
                    rect,
                    attack_id,
                    proximity,
                }),
            }
        }
    }

    /// Moves the fighter horizontally and re-places its boxes.
    pub fn apply_position_change(&mut self, dx: f32) {
        self.position.x += dx;
        self.update_boxes();
    }

    // ── Hit bookkeeping ─────────────────────────────────────

    pub fn can_attack_hit(&self, attack_id: u32) -> bool {
        !self.hit_attack_ids.contains(&attack_id)
    }

    pub fn notify_attack_hit(&mut self, attack_id: u32) {
        if self.can_attack_hit(attack_id) {
            self.hit_attack_ids.push(attack_id);
        }
        self.current_action_hit_count += 1;
    }

    pub fn notify_in_proximity_guard_range(&mut self) {
        self.proximity_guard = true;
    }

    pub fn in_proximity_guard_range(&self) -> bool {
        self.proximity_guard
    }

    pub fn notify_damaged(&mut self, attack: &AttackData, _position: Vec2) -> DamageResult {
        if self.is_dead {
            return DamageResult::None;
        }

        let guarding = self.current_action == ActionId::Backward || self.current_action.is_guard();
        if guarding {
            self.guard_health = self.guard_health.saturating_sub(attack.guard_damage);
            if self.guard_health == 0 {
                self.request_action(ActionId::GuardBreak);
                return DamageResult::GuardBreak;
            }
            let guard_action = if self.current_action == ActionId::GuardProximity {
                ActionId::GuardM
            } else {
                ActionId::GuardStand
            };
            self.request_action(guard_action);
            return DamageResult::Guard;
        }

        self.vital_health = self.vital_health.saturating_sub(attack.damage);
        if self.vital_health == 0 {
            self.is_dead = true;
            self.request_action(ActionId::Dead);
            DamageResult::Knockout
        } else {
            self.request_action(ActionId::Damage);
            DamageResult::Hit
        }
    }

    /// Hit-stun the attacker's attack inflicts for `result`, shared by both sides.
    pub fn hit_stun_frame(&self, result: DamageResult, attack_id: u32) -> u32 {
        let Some(attack) = attack_data(attack_id) else {
            return 0;
        };
        match result {
            DamageResult::None => 0,
            DamageResult::Guard => attack.hit_stun_on_guard,
            DamageResult::GuardBreak => attack.hit_stun_on_guard_break,
            DamageResult::Hit | DamageResult::Knockout => attack.hit_stun_on_hit,
        }
    }

    pub fn set_hit_stun(&mut self, frames: u32) {
        self.current_hit_stun_frame = frames;
    }

    pub fn set_sprite_shake(&mut self, frames: u32) {
        self.sprite_shake_frame = frames;
        self.max_sprite_shake_frame = frames;
    }

    pub fn set_frame_advantage(&mut self, advantage: i32) {
        self.current_frame_advantage = advantage;
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_face_right(&self) -> bool {
        self.is_face_right
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn vital_health(&self) -> u32 {
        self.vital_health
    }

    pub fn guard_health(&self) -> u32 {
        self.guard_health
    }

    pub fn current_action(&self) -> ActionId {
        self.current_action
    }

    pub fn current_action_frame(&self) -> u32 {
        self.current_action_frame
    }

    pub fn current_action_frame_count(&self) -> u32 {
        self.data().frame_count
    }

    pub fn current_hit_stun_frame(&self) -> u32 {
        self.current_hit_stun_frame
    }

    pub fn is_in_hit_stun(&self) -> bool {
        self.current_hit_stun_frame > 0
    }

    pub fn pushbox(&self) -> Rect {
        self.pushbox
    }

    pub fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    pub fn hurtboxes(&self) -> &[Hurtbox] {
        &self.hurtboxes
    }

    pub fn sprite_shake_position(&self) -> f32 {
        if self.sprite_shake_frame == 0 || self.max_sprite_shake_frame == 0 {
            return 0.0;
        }
        let sign = if self.sprite_shake_frame % 2 == 0 { 1.0 } else { -1.0 };
        sign * SPRITE_SHAKE_AMPLITUDE * self.sprite_shake_frame as f32
            / self.max_sprite_shake_frame as f32
    }

    pub fn player_state(&self) -> PlayerState {
        PlayerState {
            position_x: self.position.x,
            position_y: self.position.y,
            velocity_x: self.velocity_x,
            is_dead: self.is_dead,
            vital_health: self.vital_health,
            guard_health: self.guard_health,
            current_action_id: self.current_action.raw(),
            current_action_frame: self.current_action_frame,
            current_action_frame_count: self.current_action_frame_count(),
            is_action_end: self.is_action_end(),
            is_always_cancelable: self.is_always_cancelable(),
            current_action_hit_count: self.current_action_hit_count,
            current_hit_stun_frame: self.current_hit_stun_frame,
            is_in_hit_stun: self.is_in_hit_stun(),
            sprite_shake_position: self.sprite_shake_position(),
            max_sprite_shake_frame: self.max_sprite_shake_frame,
            is_face_right: self.is_face_right,
            current_frame_advantage: self.current_frame_advantage,
            would_dash_forward: self.would_dash_forward(),
            would_dash_backward: self.would_dash_backward(),
            special_attack_progress: self.special_attack_progress(),
            input_buffer: self.input_history.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests;

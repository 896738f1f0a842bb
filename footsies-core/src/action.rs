//! Static per-action data: frame counts, cancel rules, motion curves and the
//! box layouts used by [`crate::fighter::Fighter::update_boxes`].
//!
//! Offsets are facing-relative: positive `x` points the way the fighter faces.

use serde::{Deserialize, Serialize};

use crate::constants::{WALK_BACKWARD_SPEED, WALK_FORWARD_SPEED};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ActionId {
    Stand = 0,
    Forward = 1,
    Backward = 2,
    DashForward = 10,
    DashBackward = 11,
    NAttack = 100,
    BAttack = 105,
    NSpecial = 110,
    BSpecial = 115,
    Damage = 200,
    GuardM = 301,
    GuardStand = 305,
    GuardCrouch = 306,
    GuardBreak = 310,
    GuardProximity = 350,
    Dead = 500,
    Win = 510,
}

impl ActionId {
    pub const ALL: [ActionId; 17] = [
        Self::Stand,
        Self::Forward,
        Self::Backward,
        Self::DashForward,
        Self::DashBackward,
        Self::NAttack,
        Self::BAttack,
        Self::NSpecial,
        Self::BSpecial,
        Self::Damage,
        Self::GuardM,
        Self::GuardStand,
        Self::GuardCrouch,
        Self::GuardBreak,
        Self::GuardProximity,
        Self::Dead,
        Self::Win,
    ];

    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.raw() == raw)
    }

    pub fn is_normal_attack(self) -> bool {
        matches!(self, Self::NAttack | Self::BAttack)
    }

    pub fn is_guard(self) -> bool {
        matches!(
            self,
            Self::GuardM | Self::GuardStand | Self::GuardCrouch | Self::GuardProximity
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    None,
    /// Same facing-relative velocity every frame.
    Constant(f32),
    /// Velocity keyed by action frame; zero past the end of the table.
    Curve(&'static [f32]),
}

impl Motion {
    pub fn velocity_at(&self, frame: u32) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Constant(v) => *v,
            Self::Curve(table) => table.get(frame as usize).copied().unwrap_or(0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxKind {
    Push,
    Hurt,
    Hit { attack_id: u32, proximity: bool },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSpec {
    pub first_frame: u32,
    pub last_frame: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: BoxKind,
}

impl BoxSpec {
    #[inline]
    pub fn active_at(&self, frame: u32) -> bool {
        frame >= self.first_frame && frame <= self.last_frame
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionData {
    pub id: ActionId,
    pub frame_count: u32,
    pub looping: bool,
    pub always_cancelable: bool,
    pub motion: Motion,
    pub boxes: &'static [BoxSpec],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackData {
    pub attack_id: u32,
    pub damage: u32,
    pub guard_damage: u32,
    pub hit_stun_on_hit: u32,
    pub hit_stun_on_guard: u32,
    pub hit_stun_on_guard_break: u32,
}

pub const N_ATTACK_ID: u32 = 1;
pub const B_ATTACK_ID: u32 = 2;
pub const N_SPECIAL_ID: u32 = 3;
pub const B_SPECIAL_ID: u32 = 4;

const ALWAYS: u32 = u32::MAX;

const PUSHBOX: BoxSpec = BoxSpec {
    first_frame: 0,
    last_frame: ALWAYS,
    x: 0.0,
    y: 0.0,
    width: 0.6,
    height: 1.4,
    kind: BoxKind::Push,
};

const BODY_HURTBOX: BoxSpec = BoxSpec {
    first_frame: 0,
    last_frame: ALWAYS,
    x: 0.0,
    y: 0.0,
    width: 0.7,
    height: 1.5,
    kind: BoxKind::Hurt,
};

const fn hurt(first_frame: u32, last_frame: u32, x: f32, width: f32) -> BoxSpec {
    BoxSpec {
        first_frame,
        last_frame,
        x,
        y: 0.4,
        width,
        height: 0.6,
        kind: BoxKind::Hurt,
    }
}

const fn hit(first_frame: u32, last_frame: u32, x: f32, width: f32, attack_id: u32) -> BoxSpec {
    BoxSpec {
        first_frame,
        last_frame,
        x,
        y: 0.5,
        width,
        height: 0.5,
        kind: BoxKind::Hit {
            attack_id,
            proximity: false,
        },
    }
}

const fn proximity(last_frame: u32, x: f32, width: f32, attack_id: u32) -> BoxSpec {
    BoxSpec {
        first_frame: 0,
        last_frame,
        x,
        y: 0.0,
        width,
        height: 1.5,
        kind: BoxKind::Hit {
            attack_id,
            proximity: true,
        },
    }
}

const BODY: &[BoxSpec] = &[PUSHBOX, BODY_HURTBOX];
const PUSH_ONLY: &[BoxSpec] = &[PUSHBOX];

const N_ATTACK_BOXES: &[BoxSpec] = &[
    PUSHBOX,
    BODY_HURTBOX,
    hurt(5, 14, 0.7, 0.6),
    proximity(8, 1.2, 1.6, N_ATTACK_ID),
    hit(5, 7, 0.75, 0.7, N_ATTACK_ID),
];

const B_ATTACK_BOXES: &[BoxSpec] = &[
    PUSHBOX,
    BODY_HURTBOX,
    hurt(7, 16, 0.8, 0.7),
    proximity(10, 1.4, 2.0, B_ATTACK_ID),
    hit(7, 9, 0.9, 0.8, B_ATTACK_ID),
];

const N_SPECIAL_BOXES: &[BoxSpec] = &[
    PUSHBOX,
    BODY_HURTBOX,
    hurt(9, 24, 0.6, 0.8),
    proximity(13, 1.2, 2.0, N_SPECIAL_ID),
    BoxSpec {
        first_frame: 9,
        last_frame: 13,
        x: 0.8,
        y: 0.2,
        width: 1.0,
        height: 1.6,
        kind: BoxKind::Hit {
            attack_id: N_SPECIAL_ID,
            proximity: false,
        },
    },
];

const B_SPECIAL_BOXES: &[BoxSpec] = &[
    PUSHBOX,
    BODY_HURTBOX,
    hurt(6, 30, 0.4, 0.6),
    proximity(18, 1.0, 1.6, B_SPECIAL_ID),
    hit(6, 18, 0.5, 0.6, B_SPECIAL_ID),
];

const DASH_FORWARD_CURVE: &[f32] = &[
    0.0, 0.1, 0.14, 0.14, 0.12, 0.1, 0.08, 0.06, 0.04, 0.03, 0.02, 0.01,
];
const DASH_BACKWARD_CURVE: &[f32] = &[
    0.0, -0.1, -0.13, -0.13, -0.12, -0.1, -0.08, -0.06, -0.05, -0.04, -0.03, -0.02, -0.01,
];
const B_ATTACK_CURVE: &[f32] = &[0.0, 0.02, 0.02, 0.02, 0.02, 0.02, 0.01];
const B_SPECIAL_CURVE: &[f32] = &[
    0.0, 0.0, 0.0, 0.0, 0.12, 0.12, 0.12, 0.12, 0.12, 0.12, 0.12, 0.12, 0.1, 0.08, 0.06, 0.04,
    0.02, 0.01,
];
const DAMAGE_CURVE: &[f32] = &[-0.06, -0.05, -0.04, -0.03, -0.02, -0.01];
const GUARD_CURVE: &[f32] = &[-0.04, -0.03, -0.02, -0.01];
const GUARD_BREAK_CURVE: &[f32] = &[-0.08, -0.06, -0.04, -0.02];
const DEAD_CURVE: &[f32] = &[-0.1, -0.08, -0.06, -0.04, -0.02];

const fn data(
    id: ActionId,
    frame_count: u32,
    looping: bool,
    always_cancelable: bool,
    motion: Motion,
    boxes: &'static [BoxSpec],
) -> ActionData {
    ActionData {
        id,
        frame_count,
        looping,
        always_cancelable,
        motion,
        boxes,
    }
}

static ACTION_TABLE: [ActionData; 17] = [
    data(ActionId::Stand, 30, true, true, Motion::None, BODY),
    data(
        ActionId::Forward,
        30,
        true,
        true,
        Motion::Constant(WALK_FORWARD_SPEED),
        BODY,
    ),
    data(
        ActionId::Backward,
        30,
        true,
        true,
        Motion::Constant(-WALK_BACKWARD_SPEED),
        BODY,
    ),
    data(
        ActionId::DashForward,
        16,
        false,
        false,
        Motion::Curve(DASH_FORWARD_CURVE),
        BODY,
    ),
    data(
        ActionId::DashBackward,
        20,
        false,
        false,
        Motion::Curve(DASH_BACKWARD_CURVE),
        BODY,
    ),
    data(ActionId::NAttack, 22, false, false, Motion::None, N_ATTACK_BOXES),
    data(
        ActionId::BAttack,
        26,
        false,
        false,
        Motion::Curve(B_ATTACK_CURVE),
        B_ATTACK_BOXES,
    ),
    data(ActionId::NSpecial, 40, false, false, Motion::None, N_SPECIAL_BOXES),
    data(
        ActionId::BSpecial,
        44,
        false,
        false,
        Motion::Curve(B_SPECIAL_CURVE),
        B_SPECIAL_BOXES,
    ),
    data(ActionId::Damage, 24, false, false, Motion::Curve(DAMAGE_CURVE), BODY),
    data(ActionId::GuardM, 14, false, false, Motion::Curve(GUARD_CURVE), BODY),
    data(ActionId::GuardStand, 14, false, false, Motion::Curve(GUARD_CURVE), BODY),
    data(ActionId::GuardCrouch, 14, false, false, Motion::Curve(GUARD_CURVE), BODY),
    data(
        ActionId::GuardBreak,
        40,
        false,
        false,
        Motion::Curve(GUARD_BREAK_CURVE),
        BODY,
    ),
    data(ActionId::GuardProximity, 1, true, true, Motion::None, BODY),
    data(ActionId::Dead, 60, false, false, Motion::Curve(DEAD_CURVE), PUSH_ONLY),
    data(ActionId::Win, 60, false, false, Motion::None, BODY),
];

static ATTACK_TABLE: [AttackData; 4] = [
    AttackData {
        attack_id: N_ATTACK_ID,
        damage: 1,
        guard_damage: 1,
        hit_stun_on_hit: 12,
        hit_stun_on_guard: 8,
        hit_stun_on_guard_break: 16,
    },
    AttackData {
        attack_id: B_ATTACK_ID,
        damage: 1,
        guard_damage: 1,
        hit_stun_on_hit: 14,
        hit_stun_on_guard: 10,
        hit_stun_on_guard_break: 18,
    },
    AttackData {
        attack_id: N_SPECIAL_ID,
        damage: 1,
        guard_damage: 2,
        hit_stun_on_hit: 18,
        hit_stun_on_guard: 12,
        hit_stun_on_guard_break: 24,
    },
    AttackData {
        attack_id: B_SPECIAL_ID,
        damage: 1,
        guard_damage: 1,
        hit_stun_on_hit: 18,
        hit_stun_on_guard: 12,
        hit_stun_on_guard_break: 24,
    },
];

pub fn action_data(id: ActionId) -> &'static ActionData {
    ACTION_TABLE
        .iter()
        .find(|entry| entry.id == id)
        .unwrap_or(&ACTION_TABLE[0])
}

pub fn attack_data(attack_id: u32) -> Option<&'static AttackData> {
    ATTACK_TABLE.iter().find(|entry| entry.attack_id == attack_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_has_table_entry() {
        for id in ActionId::ALL {
            assert_eq!(action_data(id).id, id);
        }
    }

    #[test]
    fn raw_ids_round_trip_and_unknown_is_none() {
        for id in ActionId::ALL {
            assert_eq!(ActionId::from_raw(id.raw()), Some(id));
        }
        assert_eq!(ActionId::from_raw(3), None);
        assert_eq!(ActionId::from_raw(9_999), None);
    }

    #[test]
    fn every_hitbox_references_known_attack() {
        for entry in &ACTION_TABLE {
            for spec in entry.boxes {
                if let BoxKind::Hit { attack_id, .. } = spec.kind {
                    assert!(attack_data(attack_id).is_some(), "{:?}", entry.id);
                }
            }
        }
    }
}

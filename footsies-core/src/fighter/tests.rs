use super::*;
use crate::action::{attack_data, N_ATTACK_ID, N_SPECIAL_ID};
use crate::constants::P1_START_X;

fn fighter() -> Fighter {
    Fighter::new(Vec2::new(P1_START_X, 0.0), true)
}

fn tick(f: &mut Fighter, bits: u8) {
    f.update_input(InputSample::new(bits, 0.0));
    f.increment_action_frame();
    f.update_action_request();
    f.update_movement();
    f.update_boxes();
}

#[test]
fn starts_standing_with_full_health() {
    let f = fighter();
    assert_eq!(f.current_action(), ActionId::Stand);
    assert_eq!(f.vital_health(), MAX_VITAL_HEALTH);
    assert_eq!(f.guard_health(), MAX_GUARD_HEALTH);
    assert!(!f.is_dead());
    assert!(f.is_always_cancelable());
}

#[test]
fn action_frame_stays_within_frame_count() {
    let mut f = fighter();
    tick(&mut f, button::ATTACK);
    assert_eq!(f.current_action(), ActionId::NAttack);
    for _ in 0..100 {
        f.increment_action_frame();
        assert!(f.current_action_frame() <= f.current_action_frame_count());
    }
    assert!(f.is_action_end());
}

#[test]
fn input_history_is_most_recent_first() {
    let mut f = fighter();
    f.update_input(InputSample::new(button::LEFT, 0.0));
    f.update_input(InputSample::new(button::RIGHT, 0.0));
    assert_eq!(f.input(0), button::RIGHT);
    assert_eq!(f.input(1), button::LEFT);
    assert_eq!(f.input(INPUT_HISTORY_LEN + 4), 0);
}

#[test]
fn walking_follows_facing() {
    let mut f = fighter();
    tick(&mut f, button::RIGHT);
    assert_eq!(f.current_action(), ActionId::Forward);
    assert!(f.position().x > P1_START_X);

    let mut g = Fighter::new(Vec2::new(2.0, 0.0), false);
    tick(&mut g, button::RIGHT);
    assert_eq!(g.current_action(), ActionId::Backward);
    assert!(g.position().x > 2.0);
}

#[test]
fn attack_press_is_rising_edge_only() {
    let mut f = fighter();
    tick(&mut f, button::ATTACK);
    assert_eq!(f.current_action(), ActionId::NAttack);
    while !f.is_action_end() {
        tick(&mut f, button::ATTACK);
    }
    tick(&mut f, button::ATTACK);
    assert_eq!(f.current_action(), ActionId::Stand);
}

#[test]
fn directional_attack_picks_b_attack() {
    let mut f = fighter();
    tick(&mut f, button::RIGHT | button::ATTACK);
    assert_eq!(f.current_action(), ActionId::BAttack);
}

#[test]
fn double_tap_forward_dashes() {
    let mut f = fighter();
    tick(&mut f, button::RIGHT);
    tick(&mut f, button::NONE);
    tick(&mut f, button::RIGHT);
    assert_eq!(f.current_action(), ActionId::DashForward);
}

#[test]
fn taps_outside_window_only_walk() {
    let mut f = fighter();
    tick(&mut f, button::RIGHT);
    for _ in 0..DASH_INPUT_WINDOW {
        tick(&mut f, button::NONE);
    }
    tick(&mut f, button::RIGHT);
    assert_eq!(f.current_action(), ActionId::Forward);
}

#[test]
fn held_attack_released_after_charge_fires_special() {
    let mut f = fighter();
    for _ in 0..SPECIAL_CHARGE_FRAMES {
        tick(&mut f, button::ATTACK);
    }
    assert_eq!(f.special_attack_progress(), 1.0);
    tick(&mut f, button::NONE);
    assert_eq!(f.current_action(), ActionId::NSpecial);
    assert_eq!(f.special_attack_progress(), 0.0);
}

#[test]
fn short_hold_does_not_fire_special() {
    let mut f = fighter();
    for _ in 0..SPECIAL_CHARGE_FRAMES - 1 {
        tick(&mut f, button::ATTACK);
    }
    tick(&mut f, button::NONE);
    assert_ne!(f.current_action(), ActionId::NSpecial);
}

#[test]
fn backward_with_proximity_flag_guards() {
    let mut f = fighter();
    f.notify_in_proximity_guard_range();
    tick(&mut f, button::LEFT);
    assert_eq!(f.current_action(), ActionId::GuardProximity);
    tick(&mut f, button::LEFT);
    assert_eq!(f.current_action(), ActionId::Backward);
}

#[test]
fn hit_stun_freezes_action_and_movement() {
    let mut f = fighter();
    tick(&mut f, button::RIGHT);
    f.set_hit_stun(3);
    let x = f.position().x;
    let frame = f.current_action_frame();
    for _ in 0..2 {
        tick(&mut f, button::RIGHT);
        assert!(f.is_in_hit_stun());
        assert_eq!(f.current_action_frame(), frame);
        assert_eq!(f.position().x, x);
    }
    tick(&mut f, button::RIGHT);
    assert!(!f.is_in_hit_stun());
    assert!(f.position().x > x);
}

#[test]
fn vital_hit_kills_at_zero_health() {
    let mut f = fighter();
    let attack = attack_data(N_ATTACK_ID).expect("n attack");
    assert_eq!(f.notify_damaged(attack, Vec2::ZERO), DamageResult::Knockout);
    assert!(f.is_dead());
    assert_eq!(f.current_action(), ActionId::Dead);
    assert_eq!(f.vital_health(), 0);
}

#[test]
fn damage_against_dead_fighter_is_noop() {
    let mut f = fighter();
    let attack = attack_data(N_ATTACK_ID).expect("n attack");
    f.notify_damaged(attack, Vec2::ZERO);
    let before = f.player_state();
    assert_eq!(f.notify_damaged(attack, Vec2::ZERO), DamageResult::None);
    assert_eq!(f.player_state(), before);
}

#[test]
fn guarding_drains_guard_health_until_break() {
    let mut f = fighter();
    let attack = attack_data(N_ATTACK_ID).expect("n attack");
    tick(&mut f, button::LEFT);
    assert_eq!(f.current_action(), ActionId::Backward);

    assert_eq!(f.notify_damaged(attack, Vec2::ZERO), DamageResult::Guard);
    assert_eq!(f.current_action(), ActionId::GuardStand);
    assert_eq!(f.notify_damaged(attack, Vec2::ZERO), DamageResult::Guard);
    assert_eq!(f.notify_damaged(attack, Vec2::ZERO), DamageResult::GuardBreak);
    assert_eq!(f.guard_health(), 0);
    assert_eq!(f.current_action(), ActionId::GuardBreak);
    assert!(!f.is_dead());

    while !f.is_action_end() {
        f.increment_action_frame();
    }
    tick(&mut f, button::NONE);
    assert_eq!(f.guard_health(), MAX_GUARD_HEALTH);
}

#[test]
fn hit_stun_frame_depends_on_result() {
    let f = fighter();
    let attack = attack_data(N_SPECIAL_ID).expect("n special");
    assert_eq!(
        f.hit_stun_frame(DamageResult::Hit, N_SPECIAL_ID),
        attack.hit_stun_on_hit
    );
    assert_eq!(
        f.hit_stun_frame(DamageResult::Guard, N_SPECIAL_ID),
        attack.hit_stun_on_guard
    );
    assert_eq!(
        f.hit_stun_frame(DamageResult::GuardBreak, N_SPECIAL_ID),
        attack.hit_stun_on_guard_break
    );
    assert_eq!(f.hit_stun_frame(DamageResult::None, N_SPECIAL_ID), 0);
    assert_eq!(f.hit_stun_frame(DamageResult::Hit, 99), 0);
}

#[test]
fn connected_normal_cancels_into_special() {
    let mut f = fighter();
    for _ in 0..SPECIAL_CHARGE_FRAMES {
        tick(&mut f, button::ATTACK);
    }
    tick(&mut f, button::NONE);
    assert_eq!(f.current_action(), ActionId::NSpecial);
    while !f.is_action_end() {
        f.increment_action_frame();
    }
    tick(&mut f, button::ATTACK);
    assert_eq!(f.current_action(), ActionId::NAttack);
    f.notify_attack_hit(N_ATTACK_ID);
    for _ in 0..SPECIAL_CHARGE_FRAMES {
        f.update_input(InputSample::new(button::ATTACK, 0.0));
    }
    tick(&mut f, button::NONE);
    assert_eq!(f.current_action(), ActionId::NSpecial);
}

#[test]
fn attack_id_is_consumed_once_per_action() {
    let mut f = fighter();
    tick(&mut f, button::ATTACK);
    assert!(f.can_attack_hit(N_ATTACK_ID));
    f.notify_attack_hit(N_ATTACK_ID);
    assert!(!f.can_attack_hit(N_ATTACK_ID));
    assert_eq!(f.player_state().current_action_hit_count, 1);
}

#[test]
fn unknown_raw_action_falls_back_to_stand() {
    let mut f = fighter();
    f.request_action_raw(ActionId::NAttack.raw());
    assert_eq!(f.current_action(), ActionId::NAttack);
    f.request_action_raw(4_242);
    assert_eq!(f.current_action(), ActionId::Stand);
}

#[test]
fn boxes_mirror_with_facing() {
    let mut right = Fighter::new(Vec2::new(0.0, 0.0), true);
    let mut left = Fighter::new(Vec2::new(0.0, 0.0), false);
    right.request_action_raw(ActionId::NAttack.raw());
    left.request_action_raw(ActionId::NAttack.raw());
    for _ in 0..5 {
        right.increment_action_frame();
        left.increment_action_frame();
    }
    right.update_boxes();
    left.update_boxes();

    let r = right.hitboxes().iter().find(|b| !b.proximity).expect("active hitbox");
    let l = left.hitboxes().iter().find(|b| !b.proximity).expect("active hitbox");
    assert!(r.rect.x_min > 0.0);
    assert!(l.rect.x_max < 0.0);
    assert!((r.rect.x_min + l.rect.x_max).abs() < 1e-6);
}

#[test]
fn frame_advantage_frames_left_counts_zero_when_cancelable() {
    let mut f = fighter();
    assert_eq!(f.frames_left(), 0);
    tick(&mut f, button::ATTACK);
    assert_eq!(f.frames_left(), f.current_action_frame_count() as i32);
}

#[test]
fn sprite_shake_decays_to_zero() {
    let mut f = fighter();
    f.set_sprite_shake(4);
    assert!(f.sprite_shake_position().abs() > 0.0);
    for _ in 0..4 {
        f.increment_action_frame();
    }
    assert_eq!(f.sprite_shake_position(), 0.0);
}

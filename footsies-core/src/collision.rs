use serde::{Deserialize, Serialize};

use crate::action::attack_data;
use crate::constants::BATTLE_AREA_WIDTH;
use crate::fighter::{DamageResult, Fighter};
use crate::geometry::Vec2;
use crate::input::PlayerId;

/// A resolved hit, handed to whoever drains the battle's damage feed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub attacker: PlayerId,
    pub attack_id: u32,
    pub result: DamageResult,
    pub position: Vec2,
    pub hit_stun: u32,
}

/// Splits pushbox overlap evenly between the fighters. The fighter further
/// left keeps the left side; on an exact tie player one does.
pub fn push_character_vs_character(fighters: &mut [Fighter; 2]) {
    let p1 = fighters[0].pushbox();
    let p2 = fighters[1].pushbox();
    if !p1.overlaps(&p2) {
        return;
    }

    let p1_left = fighters[0].position().x <= fighters[1].position().x;
    let (left, right) = if p1_left { (0, 1) } else { (1, 0) };
    let overlap = fighters[left].pushbox().x_max - fighters[right].pushbox().x_min;
    if overlap <= 0.0 {
        return;
    }

    fighters[left].apply_position_change(-overlap / 2.0);
    fighters[right].apply_position_change(overlap / 2.0);

    // Rounding can leave the boxes touching by an ulp; settle it on the right.
    for _ in 0..4 {
        let (l, r) = (fighters[left].pushbox(), fighters[right].pushbox());
        if !l.overlaps(&r) {
            break;
        }
        let ulp = r.x_min.abs().max(fighters[right].position().x.abs()).max(1.0) * f32::EPSILON;
        fighters[right].apply_position_change((l.x_max - r.x_min).max(ulp));
    }
}

pub fn push_character_vs_stage(fighters: &mut [Fighter; 2]) {
    let half = BATTLE_AREA_WIDTH / 2.0;
    for fighter in fighters.iter_mut() {
        let pushbox = fighter.pushbox();
        if pushbox.x_min < -half {
            fighter.apply_position_change(-half - pushbox.x_min);
        } else if pushbox.x_max > half {
            fighter.apply_position_change(half - pushbox.x_max);
        }
    }
}

/// Scans each attacker's live hitboxes against the opponent's hurtboxes.
/// Player one's attacks resolve first; both may land in the same frame.
pub fn resolve_hits(fighters: &mut [Fighter; 2]) -> Vec<DamageEvent> {
    let mut events = Vec::new();

    for attacker in PlayerId::BOTH {
        let defender = attacker.opponent();
        let (a, d) = (attacker.index(), defender.index());

        let mut in_proximity = false;
        let mut hit: Option<(u32, Vec2)> = None;
        'scan: for hitbox in fighters[a].hitboxes() {
            if !fighters[a].can_attack_hit(hitbox.attack_id) {
                continue;
            }
            for hurtbox in fighters[d].hurtboxes() {
                if !hitbox.rect.overlaps(&hurtbox.rect) {
                    continue;
                }
                if hitbox.proximity {
                    in_proximity = true;
                    break;
                }
                hit = Some((
                    hitbox.attack_id,
                    hitbox.rect.intersection_midpoint(&hurtbox.rect),
                ));
                break 'scan;
            }
        }

        if in_proximity && hit.is_none() {
            fighters[d].notify_in_proximity_guard_range();
        }

        let Some((attack_id, position)) = hit else {
            continue;
        };
        let Some(attack) = attack_data(attack_id) else {
            tracing::warn!(attack_id, "hitbox references unknown attack");
            continue;
        };

        fighters[a].notify_attack_hit(attack_id);
        let result = fighters[d].notify_damaged(attack, position);
        if result == DamageResult::None {
            continue;
        }

        let hit_stun = fighters[a].hit_stun_frame(result, attack_id);
        fighters[a].set_hit_stun(hit_stun);
        fighters[d].set_hit_stun(hit_stun);
        fighters[d].set_sprite_shake(hit_stun / 3);

        tracing::debug!(
            attacker = attacker.tag(),
            attack_id,
            ?result,
            hit_stun,
            "hit resolved"
        );
        events.push(DamageEvent {
            attacker,
            attack_id,
            result,
            position,
            hit_stun,
        });
    }

    events
}

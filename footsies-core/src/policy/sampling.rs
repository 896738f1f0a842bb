use crate::constants::MIN_SOFTMAX_TEMPERATURE;
use crate::input::button;

use super::Side;

/// Max-subtracted softmax over `logits / temperature`.
pub fn softmax(logits: &[f32], temperature: f32) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let temperature = temperature.max(MIN_SOFTMAX_TEMPERATURE);
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut probs: Vec<f32> = logits
        .iter()
        .map(|logit| ((logit - max) / temperature).exp())
        .collect();
    let sum: f32 = probs.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        for p in &mut probs {
            *p /= sum;
        }
    }
    probs
}

/// Inverse-CDF draw: first index whose running sum exceeds `u`. Rounding
/// shortfalls fall back to index 0.
pub fn sample(probs: &[f32], u: f32) -> usize {
    let mut cumsum = 0.0;
    for (index, p) in probs.iter().enumerate() {
        cumsum += p;
        if u < cumsum {
            return index;
        }
    }
    0
}

/// Maps a sampled action index to absolute input bits for a fighter on `side`.
/// The special-charge index and anything out of range decode to no input.
pub fn decode_action(index: usize, side: Side) -> u8 {
    let (back, forward) = match side {
        Side::Left => (button::LEFT, button::RIGHT),
        Side::Right => (button::RIGHT, button::LEFT),
    };
    match index {
        0 => button::NONE,
        1 => back,
        2 => forward,
        3 => button::ATTACK,
        4 => back | button::ATTACK,
        5 => forward | button::ATTACK,
        6 => button::NONE,
        _ => {
            tracing::debug!(index, "sampled action index out of range");
            button::NONE
        }
    }
}

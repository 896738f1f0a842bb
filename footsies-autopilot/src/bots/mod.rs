mod policy;
mod scripted;

use anyhow::{anyhow, Result};
use footsies_core::input::button;
use footsies_core::tape::crc32;
use footsies_core::{GameState, PlayerId, PlayerState};
use serde::Serialize;
use std::path::Path;

pub use policy::PolicyBot;
pub use scripted::{DasherBot, IdleBot, PokerBot, RandomBot, TurtleBot};

/// Bot specs starting with this prefix load a policy model from the path that follows.
pub const POLICY_PREFIX: &str = "policy:";

pub trait FootsiesBot: Send {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn reset(&mut self, seed: u32);
    /// Input bits for `player` given the state after the previous tick.
    fn next_input(&mut self, state: &GameState, player: PlayerId) -> u8;
    /// Tuning that identifies this bot's behavior; feeds the fingerprint.
    fn config(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct BotManifestEntry {
    pub id: String,
    pub description: String,
    pub fingerprint: String,
    pub config: serde_json::Value,
}

const SCRIPTED_IDS: [&str; 5] = ["idle", "poker", "turtle", "dasher", "random"];

/// Scripted bots. Policy bots are addressed as `policy:<model.json>`.
pub fn bot_ids() -> &'static [&'static str] {
    &SCRIPTED_IDS
}

pub fn describe_bots() -> Vec<(&'static str, &'static str)> {
    let mut out: Vec<_> = SCRIPTED_IDS
        .iter()
        .filter_map(|id| create_bot(id).ok())
        .map(|bot| (bot.id(), bot.description()))
        .collect();
    out.push(("policy:<model.json>", policy::DESCRIPTION));
    out
}

pub fn create_bot(spec: &str) -> Result<Box<dyn FootsiesBot>> {
    let spec = spec.trim();
    if let Some(path) = spec.strip_prefix(POLICY_PREFIX) {
        return Ok(Box::new(PolicyBot::load(Path::new(path))?));
    }
    let bot: Box<dyn FootsiesBot> = match spec {
        "idle" => Box::new(IdleBot),
        "poker" => Box::new(PokerBot::default()),
        "turtle" => Box::new(TurtleBot::default()),
        "dasher" => Box::new(DasherBot::default()),
        "random" => Box::new(RandomBot::default()),
        _ => {
            return Err(anyhow!(
                "unknown bot '{spec}'. available: {}, {POLICY_PREFIX}<model.json>",
                SCRIPTED_IDS.join(", ")
            ))
        }
    };
    Ok(bot)
}

/// CRC-32 of the bot's id and config, as eight hex digits.
pub fn fingerprint(bot: &dyn FootsiesBot) -> String {
    let body = serde_json::json!({ "id": bot.id(), "config": bot.config() });
    format!("{:08x}", crc32(body.to_string().as_bytes()))
}

pub fn bot_fingerprint(spec: &str) -> Option<String> {
    create_bot(spec).ok().map(|bot| fingerprint(bot.as_ref()))
}

pub fn bot_manifest_entries() -> Vec<BotManifestEntry> {
    SCRIPTED_IDS
        .iter()
        .filter_map(|id| create_bot(id).ok())
        .map(|bot| BotManifestEntry {
            id: bot.id().to_string(),
            description: bot.description().to_string(),
            fingerprint: fingerprint(bot.as_ref()),
            config: bot.config(),
        })
        .collect()
}

pub(crate) fn forward_bits(me: &PlayerState) -> u8 {
    if me.is_face_right {
        button::RIGHT
    } else {
        button::LEFT
    }
}

pub(crate) fn back_bits(me: &PlayerState) -> u8 {
    if me.is_face_right {
        button::LEFT
    } else {
        button::RIGHT
    }
}

pub(crate) fn distance(state: &GameState, player: PlayerId) -> f32 {
    let me = state.player(player);
    let other = state.player(player.opponent());
    (me.position_x - other.position_x).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scripted_id_creates_matching_bot() {
        for id in bot_ids() {
            let bot = create_bot(id).expect("scripted bot");
            assert_eq!(bot.id(), *id);
        }
    }

    #[test]
    fn unknown_bot_lists_roster() {
        let err = create_bot("nobody").err().expect("unknown");
        assert!(err.to_string().contains("poker"));
    }

    #[test]
    fn fingerprints_are_stable_and_distinct() {
        let poker = bot_fingerprint("poker").expect("poker");
        assert_eq!(Some(poker.clone()), bot_fingerprint("poker"));
        assert_ne!(Some(poker), bot_fingerprint("turtle"));
    }

    #[test]
    fn missing_policy_model_is_an_error() {
        assert!(create_bot("policy:/nonexistent/model.json").is_err());
    }

    #[test]
    fn directions_follow_facing() {
        let mut me = PlayerState {
            is_face_right: true,
            ..PlayerState::default()
        };
        assert_eq!(forward_bits(&me), button::RIGHT);
        assert_eq!(back_bits(&me), button::LEFT);
        me.is_face_right = false;
        assert_eq!(forward_bits(&me), button::LEFT);
    }
}

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::settings::PolicySettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    P1,
    P2,
    Tie,
}

/// Input bits at a frame where the fighter's input changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub frame: i32,
    pub bits: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub model_id: String,
    pub observation_delay: u32,
    pub frame_skip: u32,
    pub inference_cadence: u32,
    pub softmax_temperature: f32,
}

impl From<&PolicySettings> for PolicySummary {
    fn from(settings: &PolicySettings) -> Self {
        Self {
            model_id: settings.model_id.clone(),
            observation_delay: settings.observation_delay,
            frame_skip: settings.frame_skip,
            inference_cadence: settings.inference_cadence,
            softmax_temperature: settings.softmax_temperature,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundStartEvent {
    pub round: u32,
    pub wins: [u32; 2],
    pub policy: PolicySummary,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundEndEvent {
    pub round: u32,
    pub winner: Winner,
    pub total_frames: u32,
    pub wins: [u32; 2],
    pub policy: PolicySummary,
    pub p1_actions: Vec<ActionLogEntry>,
    pub p2_actions: Vec<ActionLogEntry>,
}

/// Either notification, tagged for line-oriented transports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    RoundStart(RoundStartEvent),
    RoundEnd(RoundEndEvent),
}

/// Best-effort round notifications. Errors are logged by the caller and dropped.
pub trait EventSink: Send {
    fn on_round_start(&mut self, event: &RoundStartEvent) -> Result<(), SinkError>;
    fn on_round_end(&mut self, event: &RoundEndEvent) -> Result<(), SinkError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_round_start(&mut self, _event: &RoundStartEvent) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_round_end(&mut self, _event: &RoundEndEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per event.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: RoundEvent) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn on_round_start(&mut self, event: &RoundStartEvent) -> Result<(), SinkError> {
        self.write_event(RoundEvent::RoundStart(event.clone()))
    }

    fn on_round_end(&mut self, event: &RoundEndEvent) -> Result<(), SinkError> {
        self.write_event(RoundEvent::RoundEnd(event.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PolicySummary {
        PolicySummary::from(&PolicySettings::default())
    }

    #[test]
    fn json_lines_sink_writes_tagged_events() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_round_start(&RoundStartEvent {
            round: 1,
            wins: [0, 0],
            policy: policy(),
        })
        .unwrap();
        sink.on_round_end(&RoundEndEvent {
            round: 1,
            winner: Winner::P2,
            total_frames: 321,
            wins: [0, 1],
            policy: policy(),
            p1_actions: vec![ActionLogEntry { frame: 0, bits: 4 }],
            p2_actions: Vec::new(),
        })
        .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let start: RoundEvent = serde_json::from_str(lines[0]).unwrap();
        assert!(matches!(start, RoundEvent::RoundStart(ref e) if e.round == 1));
        let end: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(end["event"], "round_end");
        assert_eq!(end["winner"], "P2");
        assert_eq!(end["total_frames"], 321);
    }
}

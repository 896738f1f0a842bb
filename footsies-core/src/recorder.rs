use crate::constants::MAX_RECORDING_INPUT_FRAMES;
use crate::input::{InputSample, PlayerId};

/// Per-round input capture plus the previous round's copy used for replay.
#[derive(Clone, Debug)]
pub struct InputRecorder {
    capacity: usize,
    current: [Vec<InputSample>; 2],
    last_round: [Vec<InputSample>; 2],
    replaying: bool,
    replay_index: usize,
    capacity_logged: bool,
}

impl Default for InputRecorder {
    fn default() -> Self {
        Self::with_capacity(MAX_RECORDING_INPUT_FRAMES)
    }
}

impl InputRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            current: [Vec::with_capacity(capacity), Vec::with_capacity(capacity)],
            last_round: [Vec::new(), Vec::new()],
            replaying: false,
            replay_index: 0,
            capacity_logged: false,
        }
    }

    pub fn start_recording(&mut self) {
        for buffer in &mut self.current {
            buffer.clear();
        }
        self.capacity_logged = false;
    }

    /// Appends one frame for both fighters. Once full, further frames are dropped.
    pub fn record(&mut self, samples: [InputSample; 2]) {
        if self.current[0].len() >= self.capacity {
            if !self.capacity_logged {
                tracing::debug!(capacity = self.capacity, "input recording buffer full");
                self.capacity_logged = true;
            }
            return;
        }
        for (buffer, sample) in self.current.iter_mut().zip(samples) {
            buffer.push(sample);
        }
    }

    pub fn recorded_len(&self) -> usize {
        self.current[0].len()
    }

    pub fn recorded(&self, player: PlayerId) -> &[InputSample] {
        &self.current[player.index()]
    }

    /// Replaces the replay buffers with the round just recorded.
    pub fn commit_round(&mut self) {
        self.last_round = self.current.clone();
    }

    pub fn last_round(&self, player: PlayerId) -> &[InputSample] {
        &self.last_round[player.index()]
    }

    pub fn last_round_len(&self) -> usize {
        self.last_round[0].len()
    }

    pub fn start_replay(&mut self) {
        self.replaying = true;
        self.replay_index = 0;
    }

    pub fn stop_replay(&mut self) {
        self.replaying = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn restart_replay(&mut self) {
        self.replay_index = 0;
    }

    pub fn replay_index(&self) -> usize {
        self.replay_index
    }

    /// Next replayed frame. Stalls on the last recorded sample and yields
    /// neutral input when nothing was recorded.
    pub fn next_replay(&mut self) -> [InputSample; 2] {
        let len = self.last_round_len();
        if len == 0 {
            return [InputSample::default(); 2];
        }
        let index = self.replay_index.min(len - 1);
        if self.replay_index < len {
            self.replay_index += 1;
        }
        [self.last_round[0][index], self.last_round[1][index]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::button;

    fn sample(bits: u8, frame: u32) -> InputSample {
        InputSample::new(bits, frame as f32 / 60.0)
    }

    #[test]
    fn recording_stops_silently_at_capacity() {
        let mut recorder = InputRecorder::with_capacity(3);
        recorder.start_recording();
        for frame in 0..10 {
            recorder.record([sample(button::LEFT, frame), sample(button::RIGHT, frame)]);
        }
        assert_eq!(recorder.recorded_len(), 3);
        assert_eq!(recorder.recorded(PlayerId::Two)[2], sample(button::RIGHT, 2));
    }

    #[test]
    fn replay_reproduces_committed_round_then_stalls() {
        let mut recorder = InputRecorder::default();
        recorder.start_recording();
        let frames: Vec<[InputSample; 2]> = (0..5)
            .map(|f| [sample(f as u8 & 7, f), sample((f as u8 + 1) & 7, f)])
            .collect();
        for pair in &frames {
            recorder.record(*pair);
        }
        recorder.commit_round();
        recorder.start_recording();
        assert_eq!(recorder.recorded_len(), 0);
        assert_eq!(recorder.last_round_len(), 5);

        recorder.start_replay();
        for expected in &frames {
            assert_eq!(recorder.next_replay(), *expected);
        }
        assert_eq!(recorder.next_replay(), frames[4]);
        assert_eq!(recorder.next_replay(), frames[4]);
    }

    #[test]
    fn empty_replay_yields_neutral_input() {
        let mut recorder = InputRecorder::default();
        recorder.start_replay();
        assert_eq!(recorder.next_replay(), [InputSample::default(); 2]);
    }

    #[test]
    fn commit_replaces_previous_round() {
        let mut recorder = InputRecorder::default();
        recorder.record([sample(1, 0), sample(2, 0)]);
        recorder.record([sample(1, 1), sample(2, 1)]);
        recorder.commit_round();
        recorder.start_recording();
        recorder.record([sample(4, 0), sample(0, 0)]);
        recorder.commit_round();
        assert_eq!(recorder.last_round(PlayerId::One), &[sample(4, 0)]);
    }
}

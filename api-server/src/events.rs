use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use footsies_core::{EventSink, RoundEndEvent, RoundEvent, RoundStartEvent, SinkError};

/// Bounded in-memory round event feed. Oldest events are dropped when full.
#[derive(Clone, Debug)]
pub(crate) struct EventBuffer {
    inner: Arc<Mutex<VecDeque<RoundEvent>>>,
    capacity: usize,
}

impl EventBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&self, event: RoundEvent) -> Result<(), SinkError> {
        let mut events = self.inner.lock().map_err(|_| SinkError::Unavailable)?;
        if events.len() >= self.capacity {
            events.pop_front();
            tracing::debug!(capacity = self.capacity, "event buffer full; dropped oldest");
        }
        events.push_back(event);
        Ok(())
    }

    pub(crate) fn drain(&self) -> Vec<RoundEvent> {
        match self.inner.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => {
                tracing::error!("event buffer lock poisoned");
                Vec::new()
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().map(|events| events.len()).unwrap_or(0)
    }
}

impl EventSink for EventBuffer {
    fn on_round_start(&mut self, event: &RoundStartEvent) -> Result<(), SinkError> {
        self.push(RoundEvent::RoundStart(event.clone()))
    }

    fn on_round_end(&mut self, event: &RoundEndEvent) -> Result<(), SinkError> {
        self.push(RoundEvent::RoundEnd(event.clone()))
    }
}

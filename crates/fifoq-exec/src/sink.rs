//! Observation of produce/consume events.
//!
//! The queue never reports anything itself; actors hand every completed
//! operation to an `EventSink`. `LogSink` writes one log line per event,
//! `RecordingSink` keeps them for later inspection.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::message::Message;
use crate::trace::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Produced {
        actor: String,
        message: Message,
        at_ms: u64,
    },
    Consumed {
        actor: String,
        message: Message,
        at_ms: u64,
    },
}

impl Event {
    pub fn produced(actor: &str, message: Message) -> Self {
        Event::Produced {
            actor: actor.to_string(),
            message,
            at_ms: now_millis(),
        }
    }

    pub fn consumed(actor: &str, message: Message) -> Self {
        Event::Consumed {
            actor: actor.to_string(),
            message,
            at_ms: now_millis(),
        }
    }

    pub fn actor(&self) -> &str {
        match self {
            Event::Produced { actor, .. } | Event::Consumed { actor, .. } => actor,
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            Event::Produced { message, .. } | Event::Consumed { message, .. } => message,
        }
    }

    /// Last five digits of the millisecond clock, handy for eyeballing logs.
    pub fn stamp(&self) -> u64 {
        match self {
            Event::Produced { at_ms, .. } | Event::Consumed { at_ms, .. } => at_ms % 100_000,
        }
    }
}

pub trait EventSink: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &Event) {}
}

/// Logs each event at info level under the `fifoq::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_event(&self, event: &Event) {
        match event {
            Event::Produced { actor, message, .. } => {
                info!(target: "fifoq::events", %actor, %message, stamp = event.stamp(), "produced");
            }
            Event::Consumed { actor, message, .. } => {
                info!(target: "fifoq::events", %actor, %message, stamp = event.stamp(), "consumed");
            }
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn produced(&self) -> Vec<Message> {
        self.filter(|e| matches!(e, Event::Produced { .. }))
    }

    pub fn consumed(&self) -> Vec<Message> {
        self.filter(|e| matches!(e, Event::Consumed { .. }))
    }

    fn filter(&self, keep: impl Fn(&Event) -> bool) -> Vec<Message> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| keep(e))
            .map(|e| e.message().clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn on_event(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

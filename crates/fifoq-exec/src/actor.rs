//! Producer and consumer loops.
//!
//! Each actor owns its private state (label, sequence counter, pacer) and
//! only shares the queue reference and the cancel token with the others.
//! A loop ends when the token fires (while blocked or while pausing) or when
//! the actor's optional `max_items` is reached.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use fifoq_core::{ActorConfig, BoundedQueue, CancelToken, DelaySpec};

use crate::message::Message;
use crate::sink::{Event, EventSink};
use crate::trace::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Producer,
    Consumer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// How an actor's loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorReport {
    pub label: String,
    pub role: Role,
    /// Completed inserts (producer) or removes (consumer).
    pub operations: u64,
    /// `true` if the loop stopped because of the cancel token.
    pub cancelled: bool,
}

/// Turns a `DelaySpec` into concrete pauses.
#[derive(Debug)]
pub struct Pacer {
    spec: DelaySpec,
    rng: StdRng,
}

impl Pacer {
    pub fn new(spec: DelaySpec) -> Self {
        Self {
            spec,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampling, for tests and reproducible runs.
    pub fn with_seed(spec: DelaySpec, seed: u64) -> Self {
        Self {
            spec,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        match self.spec {
            DelaySpec::Fixed { fixed_ms } => Duration::from_millis(fixed_ms),
            DelaySpec::Uniform { min_ms, max_ms } if min_ms >= max_ms => {
                Duration::from_millis(min_ms)
            }
            DelaySpec::Uniform { min_ms, max_ms } => {
                Duration::from_millis(self.rng.gen_range(min_ms..=max_ms))
            }
        }
    }
}

fn limit_reached(max_items: Option<u64>, done: u64) -> bool {
    max_items.is_some_and(|max| done >= max)
}

pub struct Producer {
    label: String,
    pacer: Pacer,
    max_items: Option<u64>,
    next_seq: u64,
}

impl Producer {
    pub fn new(config: &ActorConfig) -> Self {
        Self::with_pacer(config, Pacer::new(config.delay))
    }

    pub fn with_pacer(config: &ActorConfig, pacer: Pacer) -> Self {
        Self {
            label: config.label.clone(),
            pacer,
            max_items: config.max_items,
            next_seq: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Build the next message; the sequence advances even if the message is
    /// never stored.
    pub fn next_message(&mut self) -> Message {
        let message = Message::new(self.label.clone(), self.next_seq);
        self.next_seq += 1;
        message
    }

    /// Loop { build; insert; report; pause } until cancelled or done.
    pub fn run(
        mut self,
        queue: &BoundedQueue<Message>,
        cancel: &CancelToken,
        sink: &dyn EventSink,
    ) -> ActorReport {
        debug!(actor = %self.label, "producer started");
        let mut produced = 0u64;
        let mut cancelled = false;

        while !limit_reached(self.max_items, produced) {
            let message = self.next_message();
            if queue.insert(message.clone(), cancel).is_err() {
                cancelled = true;
                break;
            }
            produced += 1;
            sink.on_event(&Event::produced(&self.label, message));

            if limit_reached(self.max_items, produced) {
                break;
            }
            if cancel.sleep(self.pacer.next_delay()).is_err() {
                cancelled = true;
                break;
            }
        }

        debug!(actor = %self.label, produced, cancelled, "producer stopped");
        ActorReport {
            label: self.label,
            role: Role::Producer,
            operations: produced,
            cancelled,
        }
    }
}

pub struct Consumer {
    label: String,
    pacer: Pacer,
    max_items: Option<u64>,
}

impl Consumer {
    pub fn new(config: &ActorConfig) -> Self {
        Self::with_pacer(config, Pacer::new(config.delay))
    }

    pub fn with_pacer(config: &ActorConfig, pacer: Pacer) -> Self {
        Self {
            label: config.label.clone(),
            pacer,
            max_items: config.max_items,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Loop { remove; report; pause } until cancelled or done.
    pub fn run(
        mut self,
        queue: &BoundedQueue<Message>,
        cancel: &CancelToken,
        sink: &dyn EventSink,
    ) -> ActorReport {
        debug!(actor = %self.label, "consumer started");
        let mut consumed = 0u64;
        let mut cancelled = false;

        while !limit_reached(self.max_items, consumed) {
            let message = match queue.remove(cancel) {
                Ok(message) => message,
                Err(_) => {
                    cancelled = true;
                    break;
                }
            };
            consumed += 1;
            sink.on_event(&Event::consumed(&self.label, message));

            if limit_reached(self.max_items, consumed) {
                break;
            }
            if cancel.sleep(self.pacer.next_delay()).is_err() {
                cancelled = true;
                break;
            }
        }

        debug!(actor = %self.label, consumed, cancelled, "consumer stopped");
        ActorReport {
            label: self.label,
            role: Role::Consumer,
            operations: consumed,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    #[test]
    fn uniform_pacer_stays_in_bounds() {
        let mut pacer = Pacer::with_seed(DelaySpec::uniform(10, 20), 7);
        for _ in 0..200 {
            let d = pacer.next_delay();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
        let mut degenerate = Pacer::with_seed(DelaySpec::uniform(5, 5), 7);
        assert_eq!(degenerate.next_delay(), Duration::from_millis(5));
    }

    #[test]
    fn producer_stops_after_max_items() {
        let queue = BoundedQueue::with_capacity(8);
        let token = CancelToken::new();
        let sink = RecordingSink::new();
        let cfg = ActorConfig::new("p", DelaySpec::fixed(0)).with_max_items(3);

        let report = Producer::new(&cfg).run(&queue, &token, &sink);
        assert_eq!(report.operations, 3);
        assert!(!report.cancelled);
        assert_eq!(report.role, Role::Producer);
        assert_eq!(
            queue.snapshot(),
            vec![Message::new("p", 0), Message::new("p", 1), Message::new("p", 2)]
        );
        assert_eq!(sink.produced().len(), 3);
    }

    #[test]
    fn consumer_reports_cancellation() {
        let queue = BoundedQueue::with_capacity(2);
        let token = CancelToken::new();
        let sink = RecordingSink::new();
        queue.try_insert(Message::new("x", 0)).unwrap();
        token.cancel();

        let cfg = ActorConfig::new("c", DelaySpec::fixed(0));
        let report = Consumer::new(&cfg).run(&queue, &token, &sink);
        assert!(report.cancelled);
        assert_eq!(report.operations, 0);
        assert_eq!(queue.len(), 1);
        assert!(sink.events().is_empty());
    }
}

//! Summary of one driver run, serializable for `--json` output.

use serde::Serialize;

use fifoq_core::QueueStats;

use crate::actor::{ActorReport, Role};

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_ms: u64,
    pub finished_ms: u64,
    pub capacity: usize,
    /// Sum of producer operations.
    pub produced: u64,
    /// Sum of consumer operations.
    pub consumed: u64,
    /// Items still queued when the run ended.
    pub remaining: usize,
    pub queue: QueueStats,
    pub actors: Vec<ActorReport>,
}

impl RunReport {
    pub(crate) fn new(
        started_ms: u64,
        finished_ms: u64,
        capacity: usize,
        remaining: usize,
        queue: QueueStats,
        actors: Vec<ActorReport>,
    ) -> Self {
        let total = |role: Role| {
            actors
                .iter()
                .filter(|a| a.role == role)
                .map(|a| a.operations)
                .sum::<u64>()
        };
        Self {
            started_ms,
            finished_ms,
            capacity,
            produced: total(Role::Producer),
            consumed: total(Role::Consumer),
            remaining,
            queue,
            actors,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.finished_ms.saturating_sub(self.started_ms)
    }

    /// Nothing lost, nothing duplicated: every produced item was either
    /// consumed or is still queued, and the queue's own counters agree.
    pub fn is_consistent(&self) -> bool {
        self.produced == self.consumed + self.remaining as u64
            && self.queue.inserted == self.produced
            && self.queue.removed == self.consumed
            && self.queue.high_water <= self.capacity
    }

    pub fn actor(&self, label: &str) -> Option<&ActorReport> {
        self.actors.iter().find(|a| a.label == label)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! Driver: one queue, one OS thread per actor, one shutdown broadcast.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fifoq_core::ScenarioConfig;
//! use fifoq_exec::{Driver, LogSink};
//!
//! let driver = Driver::spawn(&ScenarioConfig::default(), Arc::new(LogSink))?;
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! let report = driver.shutdown()?;
//! println!("{} produced, {} consumed", report.produced, report.consumed);
//! # Ok::<(), fifoq_exec::ExecError>(())
//! ```
//!
//! Dropping a `Driver` without calling `shutdown` still cancels every actor
//! but does not wait for the threads to exit.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use fifoq_core::{BoundedQueue, CancelToken, ScenarioConfig};

use crate::actor::{ActorReport, Consumer, Producer};
use crate::message::Message;
use crate::report::RunReport;
use crate::sink::{now_millis, EventSink};
use crate::trace::{info, warn};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("scenario: {0}")]
    Config(#[from] fifoq_core::Error),

    #[error("failed to spawn thread for actor '{label}': {source}")]
    Spawn {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("actor '{0}' panicked")]
    ActorPanicked(String),
}

impl ExecError {
    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            ExecError::Config(e) => e.suggestions(),
            ExecError::Spawn { .. } => vec![
                "The system may be out of threads; reduce the number of actors".into(),
            ],
            ExecError::ActorPanicked(_) => vec![
                "A custom EventSink panicked; the queue itself stays usable".into(),
            ],
        }
    }
}

type Handle = (String, JoinHandle<ActorReport>);

pub struct Driver {
    queue: Arc<BoundedQueue<Message>>,
    token: CancelToken,
    producers: Vec<Handle>,
    consumers: Vec<Handle>,
    finished: Vec<ActorReport>,
    started_ms: u64,
}

impl Driver {
    /// Validate `config`, build the shared queue and start every actor,
    /// producers first.
    pub fn spawn(config: &ScenarioConfig, sink: Arc<dyn EventSink>) -> Result<Self, ExecError> {
        config.validate()?;

        let mut driver = Driver {
            queue: Arc::new(BoundedQueue::with_capacity(config.capacity)),
            token: CancelToken::new(),
            producers: Vec::with_capacity(config.producers.len()),
            consumers: Vec::with_capacity(config.consumers.len()),
            finished: Vec::new(),
            started_ms: now_millis(),
        };

        // On error `driver` is dropped, which cancels anything already started.
        for actor in &config.producers {
            let producer = Producer::new(actor);
            let handle = driver.start(actor.label.as_str(), "producer", &sink, move |q, t, s| {
                producer.run(q, t, s)
            })?;
            driver.producers.push(handle);
        }
        for actor in &config.consumers {
            let consumer = Consumer::new(actor);
            let handle = driver.start(actor.label.as_str(), "consumer", &sink, move |q, t, s| {
                consumer.run(q, t, s)
            })?;
            driver.consumers.push(handle);
        }

        info!(
            capacity = config.capacity,
            producers = config.producers.len(),
            consumers = config.consumers.len(),
            "driver started"
        );
        Ok(driver)
    }

    fn start<F>(
        &self,
        label: &str,
        role: &str,
        sink: &Arc<dyn EventSink>,
        body: F,
    ) -> Result<Handle, ExecError>
    where
        F: FnOnce(&BoundedQueue<Message>, &CancelToken, &dyn EventSink) -> ActorReport
            + Send
            + 'static,
    {
        let queue = Arc::clone(&self.queue);
        let token = self.token.clone();
        let sink = Arc::clone(sink);
        let handle = thread::Builder::new()
            .name(format!("{role}-{label}"))
            .spawn(move || body(queue.as_ref(), &token, sink.as_ref()))
            .map_err(|source| ExecError::Spawn {
                label: label.to_string(),
                source,
            })?;
        Ok((label.to_string(), handle))
    }

    /// Start a scenario, let it run for `duration`, then shut it down.
    pub fn run_for(
        config: &ScenarioConfig,
        sink: Arc<dyn EventSink>,
        duration: Duration,
    ) -> Result<RunReport, ExecError> {
        let driver = Self::spawn(config, sink)?;
        thread::sleep(duration);
        driver.shutdown()
    }

    pub fn queue(&self) -> &Arc<BoundedQueue<Message>> {
        &self.queue
    }

    /// The token every actor watches. Cancelling it is what `shutdown` does.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Join every producer. Only returns once each producer has stopped on
    /// its own (`max_items`) or the token has been cancelled.
    pub fn wait_producers(&mut self) -> Result<(), ExecError> {
        let producers = std::mem::take(&mut self.producers);
        let reports = join_all(producers)?;
        self.finished.extend(reports);
        Ok(())
    }

    /// Poll until the queue is empty or `timeout` elapses.
    pub fn wait_until_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.queue.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    /// Cancel every actor, join all threads and summarize the run.
    pub fn shutdown(mut self) -> Result<RunReport, ExecError> {
        info!("driver shutdown initiated");
        self.token.cancel();

        let mut actors = std::mem::take(&mut self.finished);
        actors.extend(join_all(std::mem::take(&mut self.producers))?);
        actors.extend(join_all(std::mem::take(&mut self.consumers))?);

        let report = RunReport::new(
            self.started_ms,
            now_millis(),
            self.queue.capacity(),
            self.queue.len(),
            self.queue.stats(),
            actors,
        );
        info!(
            produced = report.produced,
            consumed = report.consumed,
            remaining = report.remaining,
            "driver shutdown complete"
        );
        Ok(report)
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // No-op after shutdown(); otherwise stops actors without joining them.
        self.token.cancel();
    }
}

fn join_all(handles: Vec<Handle>) -> Result<Vec<ActorReport>, ExecError> {
    let mut reports = Vec::with_capacity(handles.len());
    let mut panicked = None;
    for (label, handle) in handles {
        match handle.join() {
            Ok(report) => reports.push(report),
            Err(_) => {
                warn!(actor = %label, "actor thread panicked");
                if panicked.is_none() {
                    panicked = Some(label);
                }
            }
        }
    }
    match panicked {
        Some(label) => Err(ExecError::ActorPanicked(label)),
        None => Ok(reports),
    }
}

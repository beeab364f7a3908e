//! Scenario configuration: queue capacity plus the producer and consumer
//! actors a driver should start against it.
//!
//! Example:
//! ```yaml
//! capacity: 10
//! producers:
//!   - { label: "first",  delay: { fixed_ms: 1000 } }
//!   - { label: "burst",  delay: { min_ms: 50, max_ms: 400 }, max_items: 100 }
//! consumers:
//!   - { label: "consumer1", delay: { fixed_ms: 500 } }
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding `ScenarioConfig::capacity`.
pub const CAPACITY_ENV: &str = "FIFOQ_CAPACITY";

/// Pause an actor takes after each queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DelaySpec {
    Fixed { fixed_ms: u64 },
    /// Uniformly sampled from `min_ms..=max_ms` on every iteration.
    Uniform { min_ms: u64, max_ms: u64 },
}

impl DelaySpec {
    pub fn fixed(ms: u64) -> Self {
        DelaySpec::Fixed { fixed_ms: ms }
    }

    pub fn uniform(min_ms: u64, max_ms: u64) -> Self {
        DelaySpec::Uniform { min_ms, max_ms }
    }

    /// Smallest and largest pause this delay can produce.
    pub fn bounds(&self) -> (Duration, Duration) {
        match *self {
            DelaySpec::Fixed { fixed_ms } => {
                let d = Duration::from_millis(fixed_ms);
                (d, d)
            }
            DelaySpec::Uniform { min_ms, max_ms } => {
                (Duration::from_millis(min_ms), Duration::from_millis(max_ms))
            }
        }
    }
}

impl std::fmt::Display for DelaySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelaySpec::Fixed { fixed_ms } => write!(f, "{fixed_ms}ms"),
            DelaySpec::Uniform { min_ms, max_ms } => write!(f, "{min_ms}..={max_ms}ms"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    pub label: String,
    pub delay: DelaySpec,
    /// Stop on its own after this many successful operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl ActorConfig {
    pub fn new(label: impl Into<String>, delay: DelaySpec) -> Self {
        Self {
            label: label.into(),
            delay,
            max_items: None,
        }
    }

    pub fn with_max_items(mut self, max_items: u64) -> Self {
        self.max_items = Some(max_items);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub capacity: usize,
    #[serde(default)]
    pub producers: Vec<ActorConfig>,
    #[serde(default)]
    pub consumers: Vec<ActorConfig>,
}

impl Default for ScenarioConfig {
    /// Three producers and four consumers sharing a queue of ten.
    fn default() -> Self {
        Self {
            capacity: 10,
            producers: vec![
                ActorConfig::new("first", DelaySpec::fixed(1000)),
                ActorConfig::new("second", DelaySpec::fixed(1200)),
                ActorConfig::new("third", DelaySpec::fixed(1500)),
            ],
            consumers: vec![
                ActorConfig::new("consumer1", DelaySpec::fixed(500)),
                ActorConfig::new("consumer2", DelaySpec::fixed(700)),
                ActorConfig::new("consumer3", DelaySpec::fixed(800)),
                ActorConfig::new("consumer4", DelaySpec::fixed(600)),
            ],
        }
    }
}

impl ScenarioConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            producers: Vec::new(),
            consumers: Vec::new(),
        }
    }

    pub fn producer(mut self, actor: ActorConfig) -> Self {
        self.producers.push(actor);
        self
    }

    pub fn consumer(mut self, actor: ActorConfig) -> Self {
        self.consumers.push(actor);
        self
    }

    /// Parse a scenario from YAML. The result is not validated yet.
    pub fn from_yaml(src: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(src)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read scenario file: {e}"))
                .with_context(path.display().to_string())
        })?;
        Self::from_yaml(&src).map_err(|e| e.with_context(path.display().to_string()))
    }

    /// Apply overrides from the process environment (`FIFOQ_CAPACITY`).
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(std::env::var(CAPACITY_ENV).ok().as_deref())
    }

    pub(crate) fn apply_overrides(&mut self, capacity: Option<&str>) -> Result<()> {
        if let Some(raw) = capacity {
            self.capacity = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{CAPACITY_ENV}: capacity '{raw}' is not a number"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for actor in self.producers.iter().chain(&self.consumers) {
            if actor.label.trim().is_empty() {
                return Err(Error::Config("actor label must not be empty".into()));
            }
            if !seen.insert(actor.label.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate actor label '{}'",
                    actor.label
                )));
            }
            if let DelaySpec::Uniform { min_ms, max_ms } = actor.delay {
                if min_ms > max_ms {
                    return Err(Error::Config(format!(
                        "actor '{}': delay min_ms {min_ms} exceeds max_ms {max_ms}",
                        actor.label
                    )));
                }
            }
        }
        Ok(())
    }
}

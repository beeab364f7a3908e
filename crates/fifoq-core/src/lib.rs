#![forbid(unsafe_code)]
//! fifoq-core: the bounded queue and the pieces it needs to be shared.
//!
//! This crate holds the synchronization primitive and its plain-data
//! companions. There are **no threads spawned**, **no logging** and **no
//! randomness** here; the harness lives in `fifoq-exec`.
//!
//! - `queue`: `BoundedQueue<T>`, a fixed-capacity FIFO with blocking,
//!   cancellable insert/remove (one mutex, two condition variables).
//! - `cancel`: `CancelToken`, the cooperative stop signal that interrupts
//!   blocked queue operations and sleeps.
//! - `config`: serde-backed scenario description (capacity + actors).
//! - `error`: `Cancelled` and the crate-wide `Error`.

pub mod cancel;
pub mod config;
pub mod error;
pub mod queue;

pub use cancel::CancelToken;
pub use config::{ActorConfig, DelaySpec, ScenarioConfig};
pub use error::{Cancelled, Error, Result};
pub use queue::{BoundedQueue, QueueStats};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

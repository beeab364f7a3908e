#![forbid(unsafe_code)]
//! fifoq-exec: the harness around `fifoq_core::BoundedQueue`.
//!
//! - `message`: the items producers build (`"<tag> <seq>"`).
//! - `actor`: `Producer` / `Consumer` loops with paced, cancellable pauses.
//! - `sink`: the `EventSink` seam; logging and recording sinks.
//! - `driver`: one OS thread per actor, shutdown broadcast, `RunReport`.
//! - `trace`: `tracing` macros that become no-ops without the feature.

pub mod actor;
pub mod driver;
pub mod message;
pub mod report;
pub mod sink;
pub mod trace;

pub use actor::{ActorReport, Consumer, Pacer, Producer, Role};
pub use driver::{Driver, ExecError};
pub use message::Message;
pub use report::RunReport;
pub use sink::{Event, EventSink, LogSink, NullSink, RecordingSink};
pub use trace::init_tracing;

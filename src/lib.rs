//! fifoq: a bounded blocking FIFO shared by producer and consumer threads.
//!
//! The root package only re-exports the workspace crates so the integration
//! tests under `tests/` can reach everything through one dependency.

pub use fifoq_core;
pub use fifoq_exec;

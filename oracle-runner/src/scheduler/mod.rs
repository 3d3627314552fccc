//! Scheduler layer for the node
//!
//! This layer polls the remote process for pending tasks and drives each
//! one through inference and submission, one task at a time.

pub mod poller;

pub use poller::TaskPoller;

//! Core domain types
//!
//! These types describe what travels between the node and the remote
//! process: the envelope sent out, the execution result coming back, and
//! the task record carried inside it.

pub mod message;
pub mod status;
pub mod tag;
pub mod task;

pub use message::{Envelope, ExecutionResult, ResponseMessage};
pub use status::{RemoteStatus, TaskCode};
pub use tag::Tag;
pub use task::{Task, TaskStatus};

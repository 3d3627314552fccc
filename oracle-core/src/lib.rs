//! Oracle Core
//!
//! Core types and protocol helpers for the oracle node.
//!
//! This crate contains:
//! - Domain types: tags, envelopes, execution results and tasks
//! - Tag codec: parameter maps to ordered tag sequences and back
//! - Result decoder: tags and payload data out of remote responses

pub mod codec;
pub mod decoder;
pub mod domain;
pub mod error;

pub use decoder::Payload;
pub use error::DecodeError;

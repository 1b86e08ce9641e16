//! frontend-manager - frontend command dispatcher.
//!
//! Consumes request envelopes from a queue, validates each named command
//! against a static registry, and fans the results out over pub/sub. A batch
//! is acknowledged only after every envelope in it has settled.

pub mod config;
pub mod consumer;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod http;
pub mod metrics;
pub mod notify;
pub mod parameters;
pub mod processor;
pub mod publisher;
pub mod supervisor;
pub mod telemetry;
pub mod transport;
pub mod validate;

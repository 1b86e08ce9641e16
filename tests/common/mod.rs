//! Integration test common infrastructure.
//!
//! Provides envelope builders and a fully wired service harness running on
//! in-process transports.

pub mod envelopes;
pub mod harness;
pub mod logs;

#[allow(unused_imports)]
pub use harness::TestService;
#[allow(unused_imports)]
pub use logs::capture_errors;

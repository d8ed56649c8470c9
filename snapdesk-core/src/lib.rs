//! Request→result logic for the snapdesk remote-control agent.
//!
//! Everything in here is a plain synchronous operation with explicit inputs:
//! the command dispatcher (in the `snapdesk` binary) owns request correlation,
//! concurrency, and turning these results into user-visible replies.

pub mod capture;
pub mod locate;
pub mod telemetry;

//! Integration tests for vidrelay
//!
//! Drive the relay router and the player session against the simulated
//! resolver, byte source and media element.

#[path = "integration/fixtures.rs"]
mod fixtures;

#[path = "integration/flow_control.rs"]
mod flow_control;
#[path = "integration/metadata_endpoint.rs"]
mod metadata_endpoint;
#[path = "integration/range_validation.rs"]
mod range_validation;
#[path = "integration/session_flow.rs"]
mod session_flow;
#[path = "integration/stream_failures.rs"]
mod stream_failures;

//! End-to-end tests for vidrelay
//!
//! Bind a real listener on an ephemeral port with the development stack and
//! talk to it over HTTP.

mod relay_workflow;

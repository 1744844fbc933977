//! vidrelay web - HTTP API and stream relay
//!
//! Serves the client shell, the metadata endpoint and the range-aware
//! stream endpoint on top of a [`vidrelay_core::StreamProxy`].

pub mod errors;
pub mod handlers;
pub mod server;
pub mod static_files;

pub use errors::ApiError;
pub use server::{AppState, build_proxy, build_router, run_server, serve};

//! vidrelay simulation - deterministic stand-ins for external systems
//!
//! Development mode and the test suites run the relay without yt-dlp or
//! the network. Everything here is driven by seeds: the same identifier and
//! seed always resolve to the same metadata and the same bytes.
//!
//! - [`SimulatedResolver`] resolves any identifier to generated metadata
//!   and a `sim://` format.
//! - [`InMemoryByteSource`] serves `sim://` formats, honoring byte spans,
//!   with injectable latency and faults.
//! - [`SimulatedMediaElement`] plays on a virtual clock for player tests.
//! - [`ResolverMetadataSource`] feeds a session straight from a resolver.

pub mod bytes;
pub mod element;
pub mod metadata;
pub mod resolver;

pub use bytes::{InMemoryByteSource, SIM_SCHEME, StreamFault, sim_url, synthetic_bytes};
pub use element::{SimulatedMediaElement, SimulatedMediaFactory};
pub use metadata::ResolverMetadataSource;
pub use resolver::{SimulatedMedia, SimulatedResolver};

//! Centralized configuration for vidrelay.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all vidrelay components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
}

/// HTTP server binding and static shell location.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to bind
    pub port: u16,
    /// Directory holding `index.html` and other static assets
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Socket address the server listens on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Source resolution settings.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// `yt-dlp` executable, looked up on `PATH` when relative
    pub ytdlp_path: PathBuf,
    /// Upper bound for one resolution
    pub timeout: Duration,
    /// Cache lifetime of successful resolutions (None = no cache)
    pub cache_ttl: Option<Duration>,
    /// Maximum cached identifiers
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            timeout: Duration::from_secs(30),
            cache_ttl: None,
            cache_capacity: 128,
        }
    }
}

/// Upstream HTTP client settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// TCP/TLS connect timeout; streams themselves have no deadline
    pub connect_timeout: Duration,
    /// User agent for upstream requests
    pub user_agent: String,
    /// Idle pooled connections kept per upstream host
    pub pool_max_idle_per_host: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("vidrelay/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 8,
        }
    }
}

/// Headless client behavior.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the relay API, without trailing slash
    pub api_base: String,
    /// Storage key of the persisted playlist
    pub storage_key: String,
    /// Directory of the on-disk playlist store
    pub state_dir: PathBuf,
    /// Inactivity before controls hide while playing
    pub hide_controls_after: Duration,
    /// Seek step for arrow keys
    pub short_seek: Duration,
    /// Seek step for `j`/`l`
    pub long_seek: Duration,
    /// Volume change per arrow key
    pub volume_step: f64,
    /// Metadata request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:3000".to_string(),
            storage_key: "youtube-playlist".to_string(),
            state_dir: PathBuf::from(".vidrelay"),
            hide_controls_after: Duration::from_secs(2),
            short_seek: Duration::from_secs(5),
            long_seek: Duration::from_secs(10),
            volume_step: 0.1,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RelayConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parsed = |key: &str| lookup(key).map(|v| v.trim().to_string());

        // Server overrides
        if let Some(port) = parsed("PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.server.port = port;
        }
        if let Some(host) = parsed("VIDRELAY_HOST").and_then(|v| v.parse::<IpAddr>().ok()) {
            config.server.host = host;
        }
        if let Some(dir) = parsed("VIDRELAY_STATIC_DIR").filter(|v| !v.is_empty()) {
            config.server.static_dir = PathBuf::from(dir);
        }
        if let Some(base) = derived_api_base(&config.server) {
            config.client.api_base = base;
        }

        // Resolver overrides
        if let Some(path) = parsed("VIDRELAY_YTDLP_PATH").filter(|v| !v.is_empty()) {
            config.resolver.ytdlp_path = PathBuf::from(path);
        }
        if let Some(secs) = parsed("VIDRELAY_RESOLVE_TIMEOUT").and_then(|v| v.parse::<u64>().ok())
        {
            config.resolver.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) =
            parsed("VIDRELAY_RESOLVE_CACHE_TTL").and_then(|v| v.parse::<u64>().ok())
        {
            config.resolver.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        // Client overrides
        if let Some(dir) = parsed("VIDRELAY_STATE_DIR").filter(|v| !v.is_empty()) {
            config.client.state_dir = PathBuf::from(dir);
        }

        // Upstream overrides
        if let Some(secs) =
            parsed("VIDRELAY_UPSTREAM_CONNECT_TIMEOUT").and_then(|v| v.parse::<u64>().ok())
        {
            config.upstream.connect_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Creates a configuration for fast, offline tests.
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.server.port = 0;
        config.resolver.timeout = Duration::from_secs(5);
        config.client.request_timeout = Duration::from_secs(5);
        config
    }
}

/// Client API base matching a non-default server binding.
///
/// Wildcard binds are reached through loopback.
fn derived_api_base(server: &ServerConfig) -> Option<String> {
    let default = ServerConfig::default();
    if server.port == default.port && server.host == default.host {
        return None;
    }
    let host = if server.host.is_unspecified() {
        match server.host {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
        }
    } else {
        server.host
    };
    Some(format!("http://{}", SocketAddr::new(host, server.port)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = RelayConfig::default();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.resolver.timeout, Duration::from_secs(30));
        assert_eq!(config.resolver.cache_ttl, None);
        assert_eq!(config.client.storage_key, "youtube-playlist");
        assert_eq!(config.client.state_dir, PathBuf::from(".vidrelay"));
        assert_eq!(config.client.hide_controls_after, Duration::from_secs(2));
        assert_eq!(config.client.api_base, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_env_override() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("VIDRELAY_HOST", "0.0.0.0"),
            ("VIDRELAY_STATIC_DIR", "/srv/vidrelay"),
            ("VIDRELAY_YTDLP_PATH", "/opt/yt-dlp"),
            ("VIDRELAY_RESOLVE_TIMEOUT", "12"),
            ("VIDRELAY_RESOLVE_CACHE_TTL", "300"),
            ("VIDRELAY_UPSTREAM_CONNECT_TIMEOUT", "3"),
            ("VIDRELAY_STATE_DIR", "/var/lib/vidrelay"),
        ]));

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server.static_dir, PathBuf::from("/srv/vidrelay"));
        assert_eq!(config.resolver.ytdlp_path, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(config.resolver.timeout, Duration::from_secs(12));
        assert_eq!(config.resolver.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.upstream.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.client.api_base, "http://127.0.0.1:8080");
        assert_eq!(config.client.state_dir, PathBuf::from("/var/lib/vidrelay"));
    }

    #[test]
    fn test_api_base_follows_specific_host() {
        let config = RelayConfig::from_lookup(lookup(&[("VIDRELAY_HOST", "192.168.1.20")]));
        assert_eq!(config.client.api_base, "http://192.168.1.20:3000");

        let config = RelayConfig::from_lookup(lookup(&[("VIDRELAY_HOST", "::"), ("PORT", "9000")]));
        assert_eq!(config.client.api_base, "http://[::1]:9000");
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = RelayConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("VIDRELAY_RESOLVE_TIMEOUT", "-1"),
            ("VIDRELAY_RESOLVE_CACHE_TTL", "0"),
        ]));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.resolver.timeout, Duration::from_secs(30));
        assert_eq!(config.resolver.cache_ttl, None);
    }
}

//! Relay HTTP server: router, state and startup.
//!
//! The same router serves production and development; only the resolver and
//! byte source behind the [`StreamProxy`] change with the runtime mode.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use vidrelay_core::config::ResolverConfig;
use vidrelay_core::resolver::{CachedResolver, SourceResolver, YtDlpResolver};
use vidrelay_core::upstream::HttpByteSource;
use vidrelay_core::{RelayConfig, RelayError, RuntimeMode, StreamProxy};
use vidrelay_sim::{InMemoryByteSource, SimulatedResolver};

use crate::handlers::{stream_head, stream_video, video_info};
use crate::static_files::index_page;

/// Shared, immutable per-server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub proxy: StreamProxy,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(proxy: StreamProxy, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            proxy,
            static_dir: static_dir.into(),
        }
    }
}

fn with_cache<R>(resolver: R, config: &ResolverConfig) -> Arc<dyn SourceResolver>
where
    R: SourceResolver + 'static,
{
    match (config.cache_ttl, NonZeroUsize::new(config.cache_capacity)) {
        (Some(ttl), Some(capacity)) => {
            info!(
                "Caching resolutions for {:?} (capacity {})",
                ttl, capacity
            );
            Arc::new(CachedResolver::new(resolver, capacity, ttl))
        }
        _ => Arc::new(resolver),
    }
}

/// Builds the stream proxy for `mode`.
///
/// # Errors
/// - `RelayError::Configuration` - Upstream HTTP client could not be built
pub fn build_proxy(mode: RuntimeMode, config: &RelayConfig) -> Result<StreamProxy, RelayError> {
    let proxy = match mode {
        RuntimeMode::Production => {
            let resolver = YtDlpResolver::from_config(&config.resolver);
            let source =
                HttpByteSource::new(&config.upstream).map_err(|e| RelayError::Configuration {
                    reason: format!("upstream client: {e}"),
                })?;
            StreamProxy::new(with_cache(resolver, &config.resolver), Arc::new(source))
        }
        RuntimeMode::Development => StreamProxy::new(
            with_cache(SimulatedResolver::new(), &config.resolver),
            Arc::new(InMemoryByteSource::new()),
        ),
    };
    Ok(proxy)
}

/// Routes of the relay.
pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_page))
        .route("/api/video-info/{id}", get(video_info))
        .route("/api/stream/{id}", get(stream_video).head(stream_head))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves `app` on an already bound listener until the task is dropped.
///
/// # Errors
/// - `RelayError::Io` - Accept loop failed
pub async fn serve(listener: TcpListener, app: Router) -> Result<(), RelayError> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds the configured address and serves until Ctrl-C.
///
/// # Errors
/// - `RelayError::Configuration` - Components could not be built
/// - `RelayError::Io` - Address could not be bound or the server failed
pub async fn run_server(config: RelayConfig, mode: RuntimeMode) -> Result<(), RelayError> {
    let proxy = build_proxy(mode, &config)?;
    let state = AppState::new(proxy, config.server.static_dir.clone());
    let app = build_router(state);

    let addr = config.server.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("vidrelay ({}) listening on http://{}", mode, listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;
    Ok(())
}

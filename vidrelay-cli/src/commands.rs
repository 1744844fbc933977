//! CLI command implementations

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use tracing::info;
use vidrelay_core::{MediaId, RelayConfig, RuntimeMode, VideoInfo};
use vidrelay_player::{PlaylistEntry, PlaylistStore, PlaylistView};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<IpAddr>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Runtime mode (production or development)
        #[arg(long, default_value = "production")]
        mode: RuntimeMode,

        /// Directory holding index.html and other static assets
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Resolve a video and print its metadata as JSON
    Info {
        /// YouTube URL or 11-character video id
        input: String,

        /// Runtime mode (production or development)
        #[arg(long, default_value = "production")]
        mode: RuntimeMode,
    },

    /// Print the video id found in a URL
    Extract {
        /// YouTube URL or 11-character video id
        input: String,
    },

    /// Manage the saved playlist
    Playlist {
        /// Directory holding the saved playlist
        #[arg(long)]
        state_dir: Option<PathBuf>,

        #[command(subcommand)]
        action: PlaylistAction,
    },
}

/// Saved playlist operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PlaylistAction {
    /// Print the queue, newest first
    List,
    /// Queue a video as the newest entry
    Add {
        /// YouTube URL or 11-character video id
        input: String,
    },
    /// Remove a video from the queue
    Remove {
        /// YouTube URL or 11-character video id
        input: String,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns the failure of the command that ran
pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Server {
            host,
            port,
            mode,
            static_dir,
        } => start_server(host, port, mode, static_dir).await,
        Commands::Info { input, mode } => show_info(&input, mode).await,
        Commands::Extract { input } => extract(&input),
        Commands::Playlist { state_dir, action } => manage_playlist(state_dir, action).await,
    }
}

/// Environment configuration with command-line overrides applied.
fn server_config(
    host: Option<IpAddr>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> RelayConfig {
    let mut config = RelayConfig::from_env();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = static_dir {
        config.server.static_dir = dir;
    }
    config
}

/// Start the relay server
///
/// # Errors
/// - Server components could not be built or the address could not be bound
pub async fn start_server(
    host: Option<IpAddr>,
    port: Option<u16>,
    mode: RuntimeMode,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = server_config(host, port, static_dir);
    info!(
        "Starting vidrelay in {} mode on {}",
        mode,
        config.server.socket_addr()
    );

    vidrelay_web::run_server(config, mode)
        .await
        .context("relay server failed")
}

/// Resolve `input` and print its metadata
///
/// # Errors
/// - Input holds no video id
/// - Resolution failed
pub async fn show_info(input: &str, mode: RuntimeMode) -> anyhow::Result<()> {
    let id = MediaId::extract(input).with_context(|| format!("no video id in {input:?}"))?;
    let config = RelayConfig::from_env();
    let proxy = vidrelay_web::build_proxy(mode, &config)?;

    let media = proxy
        .resolver()
        .resolve(&id)
        .await
        .with_context(|| format!("failed to resolve {id}"))?;

    let info = VideoInfo::from_media(&media);
    println!("{}", serde_json::to_string_pretty(&info)?);

    match media.require_combined_format() {
        Ok(format) => info!(
            "Streamable: {} ({} bytes)",
            format.mime_type,
            format
                .content_length
                .map_or_else(|| "unknown".to_string(), |len| len.to_string())
        ),
        Err(e) => info!("Not streamable: {}", e),
    }
    Ok(())
}

/// Print the id extracted from `input`
///
/// # Errors
/// - Input holds no video id
pub fn extract(input: &str) -> anyhow::Result<()> {
    let id = MediaId::extract(input).with_context(|| format!("no video id in {input:?}"))?;
    println!("{id}");
    Ok(())
}

/// Apply `action` to the playlist saved under the configured state dir
///
/// # Errors
/// - Input holds no video id
/// - The updated playlist could not be written
pub async fn manage_playlist(
    state_dir: Option<PathBuf>,
    action: PlaylistAction,
) -> anyhow::Result<()> {
    let mut config = RelayConfig::from_env().client;
    if let Some(dir) = state_dir {
        config.state_dir = dir;
    }
    info!("Using playlist in {}", config.state_dir.display());

    let store = PlaylistStore::on_disk(&config);
    for line in apply_playlist_action(&store, action).await? {
        println!("{line}");
    }
    Ok(())
}

async fn apply_playlist_action(
    store: &PlaylistStore,
    action: PlaylistAction,
) -> anyhow::Result<Vec<String>> {
    let mut playlist = store.load().await;

    let line = match action {
        PlaylistAction::List => {
            return Ok(match playlist.render(None) {
                PlaylistView::Empty { message } => vec![message],
                PlaylistView::Rows(rows) => rows
                    .into_iter()
                    .map(|row| format!("{}  {}", row.id, row.added_at))
                    .collect(),
            });
        }
        PlaylistAction::Add { input } => {
            let id = MediaId::extract(&input)
                .with_context(|| format!("no video id in {input:?}"))?;
            if !playlist.insert_newest(PlaylistEntry::new(id.clone(), input.trim())) {
                return Ok(vec![format!("{id} is already queued")]);
            }
            format!("Added {id}")
        }
        PlaylistAction::Remove { input } => {
            let id = MediaId::extract(&input)
                .with_context(|| format!("no video id in {input:?}"))?;
            if playlist.remove(&id).is_none() {
                return Ok(vec![format!("{id} is not queued")]);
            }
            format!("Removed {id}")
        }
    };

    store
        .save(&playlist)
        .await
        .context("failed to save playlist")?;
    Ok(vec![line])
}

#[cfg(test)]
mod tests {
    use vidrelay_core::config::ClientConfig;

    use super::*;

    #[test]
    fn test_flags_override_environment() {
        let config = server_config(
            Some("0.0.0.0".parse().unwrap()),
            Some(8080),
            Some(PathBuf::from("public")),
        );
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.static_dir, PathBuf::from("public"));
        assert!(config.server.host.is_unspecified());
    }

    #[tokio::test]
    async fn test_playlist_actions_persist_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            state_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        };
        let run = |action| {
            let store = PlaylistStore::on_disk(&config);
            async move { apply_playlist_action(&store, action).await.unwrap() }
        };

        let add = |input: &str| PlaylistAction::Add {
            input: input.to_string(),
        };
        assert_eq!(run(PlaylistAction::List).await, vec!["No videos in queue"]);
        assert_eq!(
            run(add("https://youtu.be/dQw4w9WgXcQ")).await,
            vec!["Added dQw4w9WgXcQ"]
        );
        assert_eq!(run(add("9bZkp7q2_0M")).await, vec!["Added 9bZkp7q2_0M"]);
        assert_eq!(
            run(add("https://www.youtube.com/watch?v=dQw4w9WgXcQ")).await,
            vec!["dQw4w9WgXcQ is already queued"]
        );

        let listed = run(PlaylistAction::List).await;
        assert_eq!(listed.len(), 2);
        assert!(listed[0].starts_with("9bZkp7q2_0M"));

        let removed = run(PlaylistAction::Remove {
            input: "9bZkp7q2_0M".to_string(),
        })
        .await;
        assert_eq!(removed, vec!["Removed 9bZkp7q2_0M"]);
        assert_eq!(run(PlaylistAction::List).await.len(), 1);
        assert!(dir.path().join("youtube-playlist.json").exists());
    }

    #[tokio::test]
    async fn test_playlist_add_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            state_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        };
        let store = PlaylistStore::on_disk(&config);
        let action = PlaylistAction::Add {
            input: "not a video".to_string(),
        };
        assert!(apply_playlist_action(&store, action).await.is_err());
        assert!(!dir.path().join("youtube-playlist.json").exists());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_ok());
        assert!(extract("not a video").is_err());
    }
}

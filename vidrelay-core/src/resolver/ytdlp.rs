//! Production resolver backed by the `yt-dlp` executable.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{FormatDescriptor, MediaDetails, ResolveError, ResolvedMedia, SourceResolver};
use crate::config::ResolverConfig;
use crate::identifier::MediaId;

/// Markers in `yt-dlp` stderr meaning the identifier itself is bad, as
/// opposed to a transient failure.
const REJECTION_MARKERS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "is not a valid URL",
    "This video has been removed",
    "Incomplete YouTube ID",
];

/// Resolves identifiers by running `yt-dlp --dump-single-json`.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    program: PathBuf,
    timeout: Duration,
}

impl YtDlpResolver {
    /// Creates a resolver invoking `program` with the given time limit.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Creates a resolver from the resolver section of the config.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.ytdlp_path.clone(), config.timeout)
    }

    /// Check if the executable can be spawned at all
    pub async fn is_available(&self) -> bool {
        tokio::process::Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn dump_json(&self, id: &MediaId) -> Result<Vec<u8>, ResolveError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--")
            .arg(id.watch_url())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running {} for {}", self.program.display(), id);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ResolveError::Timeout {
                id: id.clone(),
                after: self.timeout,
            })?
            .map_err(|e| ResolveError::Unavailable {
                reason: format!("failed to run {}: {e}", self.program.display()),
            })?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no diagnostic output")
            .trim()
            .to_string();
        warn!("yt-dlp exited with {} for {}: {}", output.status, id, reason);

        if REJECTION_MARKERS.iter().any(|marker| stderr.contains(marker)) {
            Err(ResolveError::Rejected {
                id: id.clone(),
                reason,
            })
        } else {
            Err(ResolveError::Unavailable { reason })
        }
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, id: &MediaId) -> Result<ResolvedMedia, ResolveError> {
        let raw = self.dump_json(id).await?;
        parse_dump(id, &raw)
    }
}

#[derive(Debug, Deserialize)]
struct DumpInfo {
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    thumbnails: Vec<DumpThumbnail>,
    thumbnail: Option<String>,
    description: Option<String>,
    #[serde(default)]
    formats: Vec<DumpFormat>,
}

#[derive(Debug, Deserialize)]
struct DumpThumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DumpFormat {
    url: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    filesize: Option<u64>,
    ext: Option<String>,
    height: Option<u32>,
    tbr: Option<f64>,
    protocol: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

impl DumpFormat {
    fn into_descriptor(self) -> FormatDescriptor {
        let has_track = |codec: &Option<String>| codec.as_deref().is_some_and(|c| c != "none");
        let direct = matches!(self.protocol.as_deref(), Some("https") | Some("http") | None);
        let url = if direct {
            self.url.as_deref().and_then(|u| Url::parse(u).ok())
        } else {
            None
        };

        FormatDescriptor {
            has_video: has_track(&self.vcodec),
            has_audio: has_track(&self.acodec),
            content_length: self.filesize,
            mime_type: format!("video/{}", self.ext.as_deref().unwrap_or("mp4")),
            url,
            height: self.height,
            bitrate: self.tbr.map(|tbr| tbr.max(0.0).round() as u64),
            http_headers: self.http_headers,
        }
    }
}

fn parse_dump(id: &MediaId, raw: &[u8]) -> Result<ResolvedMedia, ResolveError> {
    let info: DumpInfo = serde_json::from_slice(raw).map_err(|e| ResolveError::Parse {
        reason: e.to_string(),
    })?;

    let mut thumbnails: Vec<String> = info.thumbnails.into_iter().map(|t| t.url).collect();
    if thumbnails.is_empty() {
        thumbnails.extend(info.thumbnail);
    }

    // Manifest-only renditions (HLS/DASH) have no direct URL and cannot be
    // range-proxied, so they never win selection.
    let format = super::select_combined_format(
        info.formats
            .into_iter()
            .map(DumpFormat::into_descriptor)
            .filter(|format| format.url.is_some()),
    );

    Ok(ResolvedMedia {
        id: id.clone(),
        details: MediaDetails {
            title: info.title,
            author: info.channel.or(info.uploader).unwrap_or_default(),
            length_seconds: info.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
            thumbnails,
            description: info.description.unwrap_or_default(),
        },
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "title": "Sample clip",
        "uploader": "Uploader",
        "channel": "Channel",
        "duration": 212.4,
        "thumbnails": [
            {"url": "https://i.example/small.jpg"},
            {"url": "https://i.example/large.jpg"}
        ],
        "description": "A description",
        "formats": [
            {"url": "https://cdn.example/audio", "vcodec": "none", "acodec": "opus",
             "filesize": 100, "ext": "webm", "protocol": "https", "tbr": 130.0},
            {"url": "https://cdn.example/video1080", "vcodec": "avc1", "acodec": "none",
             "filesize": 9000, "ext": "mp4", "height": 1080, "protocol": "https", "tbr": 4000.0},
            {"url": "https://cdn.example/muxed360", "vcodec": "avc1", "acodec": "mp4a",
             "filesize": 5000, "ext": "mp4", "height": 360, "protocol": "https", "tbr": 600.0,
             "http_headers": {"User-Agent": "test-agent"}},
            {"url": "https://cdn.example/manifest.m3u8", "vcodec": "avc1", "acodec": "mp4a",
             "ext": "mp4", "height": 720, "protocol": "m3u8_native", "tbr": 1500.0}
        ]
    }"#;

    fn id() -> MediaId {
        MediaId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_parse_dump_selects_direct_combined_format() {
        let media = parse_dump(&id(), SAMPLE.as_bytes()).unwrap();
        let format = media.require_combined_format().unwrap();

        assert_eq!(format.height, Some(360));
        assert_eq!(format.content_length, Some(5000));
        assert_eq!(format.mime_type, "video/mp4");
        assert_eq!(
            format.http_headers.get("User-Agent").map(String::as_str),
            Some("test-agent")
        );
    }

    #[test]
    fn test_parse_dump_maps_details() {
        let media = parse_dump(&id(), SAMPLE.as_bytes()).unwrap();

        assert_eq!(media.details.title, "Sample clip");
        assert_eq!(media.details.author, "Channel");
        assert_eq!(media.details.length_seconds, 212);
        assert_eq!(
            media.details.thumbnails.last().map(String::as_str),
            Some("https://i.example/large.jpg")
        );
    }

    #[test]
    fn test_parse_dump_without_combined_format() {
        let raw = r#"{"title": "t", "formats": [
            {"url": "https://cdn.example/v", "vcodec": "vp9", "acodec": "none", "protocol": "https"}
        ]}"#;
        let media = parse_dump(&id(), raw.as_bytes()).unwrap();

        assert!(media.format.is_none());
        assert!(matches!(
            media.require_combined_format(),
            Err(ResolveError::NoCombinedFormat { .. })
        ));
    }

    #[test]
    fn test_parse_dump_rejects_garbage() {
        assert!(matches!(
            parse_dump(&id(), b"not json"),
            Err(ResolveError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let resolver = YtDlpResolver::new("/nonexistent/yt-dlp", Duration::from_secs(5));
        assert!(!resolver.is_available().await);
        assert!(matches!(
            resolver.resolve(&id()).await,
            Err(ResolveError::Unavailable { .. })
        ));
    }
}

//! Client shell served at `/`.

use std::path::Path;

use axum::extract::State;
use axum::response::Html;
use tracing::debug;

use crate::server::AppState;

/// Page served when the static directory has no `index.html`.
pub const FALLBACK_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>vidrelay</title>
</head>
<body>
  <main id="app">
    <form id="load-form">
      <input id="url-input" type="text" placeholder="Paste a YouTube URL">
      <button type="submit">Load Video</button>
    </form>
    <section id="player">Paste a YouTube URL and click "Load Video" to start watching</section>
    <aside id="playlist">No videos in queue</aside>
  </main>
</body>
</html>
"#;

/// Reads `index.html` from `static_dir`, falling back to the built-in shell.
pub async fn load_shell(static_dir: &Path) -> String {
    let path = static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => page,
        Err(e) => {
            debug!("No shell at {}: {}", path.display(), e);
            FALLBACK_SHELL.to_string()
        }
    }
}

/// `GET /`
pub async fn index_page(State(state): State<AppState>) -> Html<String> {
    Html(load_shell(&state.static_dir).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_from_static_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>custom</h1>").unwrap();
        assert_eq!(load_shell(dir.path()).await, "<h1>custom</h1>");
    }

    #[tokio::test]
    async fn test_missing_index_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_shell(dir.path()).await, FALLBACK_SHELL);
    }
}

//! Insertion-ordered playlist, newest first.

use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vidrelay_core::MediaId;

/// Text shown when the playlist is empty.
pub const EMPTY_PLAYLIST_MESSAGE: &str = "No videos in queue";

/// One queued video, persisted as `{id, url, addedAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: MediaId,
    /// Input the user pasted
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "addedAt")]
    pub added_at: DateTime<Utc>,
}

impl PlaylistEntry {
    /// Entry added now.
    pub fn new(id: MediaId, source_url: impl Into<String>) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            added_at: Utc::now(),
        }
    }
}

/// Queue of unique identifiers, most recently added first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    entries: IndexMap<MediaId, PlaylistEntry>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a playlist from stored order. Later duplicates are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = PlaylistEntry>) -> Self {
        let mut map = IndexMap::new();
        for entry in entries {
            map.entry(entry.id.clone()).or_insert(entry);
        }
        Self { entries: map }
    }

    /// Adds `entry` at the front unless its id is already queued.
    ///
    /// Returns whether the playlist changed. A present id keeps its
    /// position and original entry.
    pub fn insert_newest(&mut self, entry: PlaylistEntry) -> bool {
        if self.entries.contains_key(&entry.id) {
            return false;
        }
        self.entries.shift_insert(0, entry.id.clone(), entry);
        true
    }

    /// Removes `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: &MediaId) -> Option<PlaylistEntry> {
        self.entries.shift_remove(id)
    }

    pub fn contains(&self, id: &MediaId) -> bool {
        self.entries.contains_key(id)
    }

    /// Newest entry.
    pub fn first(&self) -> Option<&PlaylistEntry> {
        self.entries.first().map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &PlaylistEntry> {
        self.entries.values()
    }

    /// Identifiers in display order.
    pub fn ids(&self) -> Vec<MediaId> {
        self.entries.keys().cloned().collect()
    }

    /// Projects the queue for display. Pure; calling twice yields the same
    /// view.
    pub fn render(&self, active: Option<&MediaId>) -> PlaylistView {
        if self.is_empty() {
            return PlaylistView::Empty {
                message: EMPTY_PLAYLIST_MESSAGE.to_string(),
            };
        }

        PlaylistView::Rows(
            self.iter()
                .map(|entry| PlaylistRow {
                    id: entry.id.clone(),
                    thumbnail_url: entry.id.thumbnail_url(),
                    title: format!("Video ID: {}", entry.id),
                    added_at: entry
                        .added_at
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                    active: active == Some(&entry.id),
                })
                .collect(),
        )
    }
}

/// One rendered playlist row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRow {
    pub id: MediaId,
    pub thumbnail_url: String,
    pub title: String,
    /// Local time the entry was added
    pub added_at: String,
    pub active: bool,
}

/// Rendered playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistView {
    Empty { message: String },
    Rows(Vec<PlaylistRow>),
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(value: &str) -> MediaId {
        MediaId::parse(value).unwrap()
    }

    fn entry(value: &str) -> PlaylistEntry {
        PlaylistEntry::new(id(value), format!("https://youtu.be/{value}"))
    }

    #[test]
    fn test_new_ids_go_to_front() {
        let mut playlist = Playlist::new();
        assert!(playlist.insert_newest(entry("aaaaaaaaaaa")));
        assert!(playlist.insert_newest(entry("bbbbbbbbbbb")));

        assert_eq!(playlist.ids(), vec![id("bbbbbbbbbbb"), id("aaaaaaaaaaa")]);
    }

    #[test]
    fn test_present_id_neither_duplicates_nor_moves() {
        let mut playlist = Playlist::new();
        playlist.insert_newest(entry("aaaaaaaaaaa"));
        playlist.insert_newest(entry("bbbbbbbbbbb"));

        assert!(!playlist.insert_newest(entry("aaaaaaaaaaa")));
        assert_eq!(playlist.ids(), vec![id("bbbbbbbbbbb"), id("aaaaaaaaaaa")]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut playlist = Playlist::from_entries([
            entry("aaaaaaaaaaa"),
            entry("bbbbbbbbbbb"),
            entry("ccccccccccc"),
        ]);
        playlist.remove(&id("bbbbbbbbbbb"));
        assert_eq!(playlist.ids(), vec![id("aaaaaaaaaaa"), id("ccccccccccc")]);
    }

    #[test]
    fn test_render_marks_active_row() {
        let playlist = Playlist::from_entries([entry("aaaaaaaaaaa"), entry("bbbbbbbbbbb")]);
        let PlaylistView::Rows(rows) = playlist.render(Some(&id("bbbbbbbbbbb"))) else {
            panic!("expected rows");
        };

        assert_eq!(rows.len(), 2);
        assert!(!rows[0].active);
        assert!(rows[1].active);
        assert_eq!(rows[1].title, "Video ID: bbbbbbbbbbb");
        assert_eq!(
            rows[1].thumbnail_url,
            "https://img.youtube.com/vi/bbbbbbbbbbb/mqdefault.jpg"
        );
        assert_eq!(playlist.render(None), playlist.render(None));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(
            Playlist::new().render(None),
            PlaylistView::Empty {
                message: "No videos in queue".to_string()
            }
        );
    }

    #[test]
    fn test_entry_wire_format() {
        let json = r#"{"id":"dQw4w9WgXcQ","url":"https://youtu.be/dQw4w9WgXcQ","addedAt":"2024-05-01T10:00:00.000Z"}"#;
        let entry: PlaylistEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(entry.source_url, "https://youtu.be/dQw4w9WgXcQ");

        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("addedAt").is_some());
        assert!(value.get("url").is_some());
    }

    proptest! {
        #[test]
        fn prop_insertions_keep_first_seen_order(picks in proptest::collection::vec(0usize..6, 0..40)) {
            const POOL: [&str; 6] = [
                "dQw4w9WgXcQ", "9bZkp7q2_0M", "kJQP7kiw5Fk",
                "OPf0YbXqDm0", "JGwWNGJdvx8", "RgKAFK5djSk",
            ];
            let mut playlist = Playlist::new();
            let mut expected: Vec<&str> = Vec::new();
            for pick in picks {
                let value = POOL[pick];
                let added = playlist.insert_newest(entry(value));
                prop_assert_eq!(added, !expected.contains(&value));
                if added {
                    expected.insert(0, value);
                }
            }

            let ids: Vec<String> = playlist.iter().map(|e| e.id.as_str().to_string()).collect();
            prop_assert_eq!(ids, expected);
        }
    }
}

//! Wire shape of the metadata endpoint.

use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedMedia;

/// Metadata returned by `GET /api/video-info/{id}` and read by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub author: String,
    pub length_seconds: u64,
    /// Largest available thumbnail
    pub thumbnail: String,
    pub description: String,
}

impl VideoInfo {
    /// Projects a resolution onto the wire shape.
    ///
    /// The format is not consulted: metadata is served even when no combined
    /// rendition exists.
    pub fn from_media(media: &ResolvedMedia) -> Self {
        let details = &media.details;
        let thumbnail = details
            .thumbnails
            .last()
            .cloned()
            .unwrap_or_else(|| media.id.thumbnail_url());

        Self {
            title: details.title.clone(),
            author: details.author.clone(),
            length_seconds: details.length_seconds,
            thumbnail,
            description: details.description.clone(),
        }
    }
}

impl From<&ResolvedMedia> for VideoInfo {
    fn from(media: &ResolvedMedia) -> Self {
        Self::from_media(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::MediaId;
    use crate::resolver::MediaDetails;

    fn media(thumbnails: Vec<String>) -> ResolvedMedia {
        ResolvedMedia {
            id: MediaId::parse("dQw4w9WgXcQ").unwrap(),
            details: MediaDetails {
                title: "Never Gonna Give You Up".to_string(),
                author: "Rick Astley".to_string(),
                length_seconds: 213,
                thumbnails,
                description: "Official video".to_string(),
            },
            format: None,
        }
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let info = VideoInfo::from_media(&media(vec![
            "https://i.ytimg.com/small.jpg".to_string(),
            "https://i.ytimg.com/large.jpg".to_string(),
        ]));
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["title"], "Never Gonna Give You Up");
        assert_eq!(json["author"], "Rick Astley");
        assert_eq!(json["lengthSeconds"], 213);
        assert_eq!(json["thumbnail"], "https://i.ytimg.com/large.jpg");
        assert_eq!(json["description"], "Official video");
    }

    #[test]
    fn test_missing_thumbnails_fall_back_to_id_still() {
        let info = VideoInfo::from_media(&media(vec![]));
        assert_eq!(
            info.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
    }
}

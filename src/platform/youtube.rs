use std::fs;
use std::time::Duration;

use async_trait::async_trait;
use lazy_regex::regex;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use crate::analysis::{self, AnalysisStats};
use crate::config::{AppConfig, Credentials};
use crate::platform::{Capabilities, CatalogAdapter, Platform, PlatformError, PlatformResult};
use crate::track::{PlaylistDescriptor, PlaylistSummary, Track};

/// Search params constant selecting the "Songs" result shelf.
const SEARCH_SONGS_PARAMS: &str = "EgWKAQIIAWoKEAkQBRAKEAMQBA%3D%3D";
const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20240101.01.00";

/// Talks to the private `youtubei` endpoints the web player uses. There is no
/// public playlist API for YouTube Music; authentication is a copy of the
/// browser request headers stored as JSON (cookie included), pointed at by
/// `YOUTUBE_AUTH_FILE`.
pub struct YouTubeMusicClient {
    client: Client,
    auth_file: String,
}

impl YouTubeMusicClient {
    pub fn new(credentials: &Credentials) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(AppConfig::HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            auth_file: credentials.youtube_auth_file.clone(),
        })
    }

    /// Extracts a canonical playlist ID from whatever the user pasted: a bare
    /// ID, a `music.youtube.com` playlist URL, or a `watch` URL carrying a
    /// `list` parameter. Unrecognized input passes through unchanged, it may
    /// already be a valid ID shape we do not know about.
    pub fn extract_playlist_id(input: &str) -> String {
        if input.starts_with("PL") && input.len() > 2 {
            return input.to_string();
        }
        if let Ok(parsed) = Url::parse(input) {
            if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "list") {
                return value.into_owned();
            }
        }
        if let Some(captures) = regex!(r"[?&]list=([a-zA-Z0-9_-]+)").captures(input) {
            return captures[1].to_string();
        }
        input.to_string()
    }

    fn auth_headers(&self) -> PlatformResult<Vec<(String, String)>> {
        if self.auth_file.is_empty() {
            return Err(PlatformError::Auth {
                platform: Platform::YouTubeMusic,
                reason: "YOUTUBE_AUTH_FILE not configured".to_string(),
            });
        }
        let contents = fs::read_to_string(&self.auth_file)?;
        let parsed: Value = serde_json::from_str(&contents)?;
        let object = parsed.as_object().ok_or_else(|| PlatformError::Auth {
            platform: Platform::YouTubeMusic,
            reason: format!("auth file {} is not a JSON object", self.auth_file),
        })?;
        Ok(object
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_str()
                    .map(|v| (key.clone(), v.to_string()))
            })
            .collect())
    }

    async fn endpoint(&self, name: &str, mut body: Value) -> PlatformResult<Value> {
        let headers = self.auth_headers()?;
        body["context"] = json!({
            "client": { "clientName": CLIENT_NAME, "clientVersion": CLIENT_VERSION }
        });
        let url = format!("{}/{}?alt=json", AppConfig::YOUTUBE_MUSIC_API_URL, name);
        let mut request = self.client.post(&url).json(&body);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PlatformError::Auth {
                platform: Platform::YouTubeMusic,
                reason: format!("HTTP {}, auth headers are likely expired", status),
            });
        }
        if !status.is_success() {
            return Err(PlatformError::Fetch {
                platform: Platform::YouTubeMusic,
                reason: format!("{} returned HTTP {}", name, status),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    fn parse_error(context: &str) -> PlatformError {
        // The playlist might be private, deleted, or the response format has
        // changed; either way a truncated result would be silent data loss.
        PlatformError::Fetch {
            platform: Platform::YouTubeMusic,
            reason: format!("failed to parse {} response", context),
        }
    }

    fn run_text(column: &Value) -> Option<String> {
        column
            .pointer("/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn track_from_item(item: &Value) -> PlatformResult<Track> {
        let renderer = item
            .get("musicResponsiveListItemRenderer")
            .ok_or_else(|| Self::parse_error("playlist item"))?;
        let columns = renderer
            .pointer("/flexColumns")
            .and_then(Value::as_array)
            .ok_or_else(|| Self::parse_error("playlist item columns"))?;
        let name = columns
            .first()
            .and_then(Self::run_text)
            .ok_or_else(|| Self::parse_error("track title"))?;
        let artist = columns
            .get(1)
            .and_then(Self::run_text)
            .unwrap_or_else(|| "Unknown".to_string());
        // The album column is absent for user uploads and some singles.
        let album = columns.get(2).and_then(Self::run_text).unwrap_or_default();
        let id = renderer
            .pointer("/playlistItemData/videoId")
            .and_then(Value::as_str)
            .map(str::to_string);
        let duration_ms = renderer
            .pointer("/fixedColumns/0/musicResponsiveListItemFixedColumnRenderer/text/runs/0/text")
            .and_then(Value::as_str)
            .and_then(parse_duration_text);
        Ok(Track {
            name,
            artist,
            album,
            id,
            duration_ms,
            popularity: None,
        })
    }

    async fn browse_playlist(&self, playlist_id: &str) -> PlatformResult<(String, Vec<Track>)> {
        let browse_id = format!("VL{}", playlist_id);
        let response = self
            .endpoint("browse", json!({ "browseId": browse_id }))
            .await?;
        let title = response
            .pointer("/header/musicDetailHeaderRenderer/title/runs/0/text")
            .or_else(|| {
                response.pointer(
                    "/contents/twoColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/musicResponsiveHeaderRenderer/title/runs/0/text",
                )
            })
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let items = response
            .pointer("/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/musicPlaylistShelfRenderer/contents")
            .or_else(|| {
                response.pointer(
                    "/contents/twoColumnBrowseResultsRenderer/secondaryContents/sectionListRenderer/contents/0/musicPlaylistShelfRenderer/contents",
                )
            })
            .and_then(Value::as_array)
            .ok_or_else(|| Self::parse_error("playlist"))?;
        let tracks = items
            .iter()
            .map(Self::track_from_item)
            .collect::<PlatformResult<Vec<Track>>>()?;
        Ok((title, tracks))
    }
}

#[async_trait]
impl CatalogAdapter for YouTubeMusicClient {
    fn platform(&self) -> Platform {
        Platform::YouTubeMusic
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            batch_add: false,
            single_add: true,
            search: true,
            analyze: true,
            audio_features: false,
            list_playlists: true,
            delete_playlist: true,
            rename_playlist: true,
            recommend: false,
        }
    }

    async fn fetch_tracks(&self, descriptor: &PlaylistDescriptor) -> PlatformResult<Vec<Track>> {
        let playlist_id = Self::extract_playlist_id(&descriptor.source);
        let (_, tracks) = self.browse_playlist(&playlist_id).await?;
        Ok(tracks)
    }

    async fn create_playlist(&self, name: &str) -> PlatformResult<String> {
        let response = self
            .endpoint(
                "playlist/create",
                json!({
                    "title": name,
                    "description": "Created by PlaySync",
                    "privacyStatus": "PRIVATE"
                }),
            )
            .await
            .map_err(|error| match error {
                PlatformError::Auth { .. } => error,
                other => PlatformError::Create {
                    platform: Platform::YouTubeMusic,
                    reason: other.to_string(),
                },
            })?;
        response
            .get("playlistId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PlatformError::Create {
                platform: Platform::YouTubeMusic,
                reason: "create response carried no playlistId".to_string(),
            })
    }

    async fn search_track(&self, query: &str) -> PlatformResult<Option<Track>> {
        Ok(self.search_tracks(query, 1).await?.into_iter().next())
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> PlatformResult<Vec<Track>> {
        let response = self
            .endpoint(
                "search",
                json!({ "query": query, "params": SEARCH_SONGS_PARAMS }),
            )
            .await?;
        let items = response
            .pointer("/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/musicShelfRenderer/contents")
            .and_then(Value::as_array);
        let Some(items) = items else {
            // An empty shelf means zero results, not a malformed payload.
            return Ok(Vec::new());
        };
        items
            .iter()
            .take(limit)
            .map(Self::track_from_item)
            .collect()
    }

    async fn add_track(&self, playlist_id: &str, track: &Track) -> PlatformResult<()> {
        let video_id = track.id.as_ref().ok_or_else(|| PlatformError::AddTrack {
            platform: Platform::YouTubeMusic,
            track: track.name.clone(),
            reason: "track has no videoId".to_string(),
        })?;
        let response = self
            .endpoint(
                "browse/edit_playlist",
                json!({
                    "playlistId": playlist_id,
                    "actions": [{ "action": "ACTION_ADD_VIDEO", "addedVideoId": video_id }]
                }),
            )
            .await?;
        match response.get("status").and_then(Value::as_str) {
            Some("STATUS_SUCCEEDED") => Ok(()),
            status => Err(PlatformError::AddTrack {
                platform: Platform::YouTubeMusic,
                track: track.name.clone(),
                reason: format!("edit_playlist returned {:?}", status),
            }),
        }
    }

    async fn analyze_playlist(
        &self,
        descriptor: &PlaylistDescriptor,
    ) -> PlatformResult<AnalysisStats> {
        let playlist_id = Self::extract_playlist_id(&descriptor.source);
        let (title, tracks) = self.browse_playlist(&playlist_id).await?;
        Ok(AnalysisStats {
            name: title,
            total_tracks: tracks.len(),
            total_duration_ms: analysis::total_duration_ms(&tracks),
            top_artists: analysis::top_artists(&tracks, analysis::TOP_N),
            top_genres: Vec::new(),
            audio: None,
        })
    }

    async fn list_playlists(&self) -> PlatformResult<Vec<PlaylistSummary>> {
        let response = self
            .endpoint("browse", json!({ "browseId": "FEmusic_liked_playlists" }))
            .await?;
        let items = response
            .pointer("/contents/singleColumnBrowseResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents/0/gridRenderer/items")
            .and_then(Value::as_array)
            .ok_or_else(|| Self::parse_error("library playlists"))?;
        let mut playlists = Vec::new();
        for item in items {
            let Some(renderer) = item.get("musicTwoRowItemRenderer") else {
                continue; // the "new playlist" tile has a different renderer
            };
            let Some(browse_id) = renderer
                .pointer("/navigationEndpoint/browseEndpoint/browseId")
                .and_then(Value::as_str)
            else {
                continue;
            };
            let name = renderer
                .pointer("/title/runs/0/text")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            let tracks_count = renderer
                .pointer("/subtitle/runs/2/text")
                .and_then(Value::as_str)
                .and_then(|text| text.split_whitespace().next())
                .and_then(|count| count.parse::<usize>().ok())
                .unwrap_or(0);
            playlists.push(PlaylistSummary {
                id: browse_id.trim_start_matches("VL").to_string(),
                name,
                tracks_count,
            });
        }
        Ok(playlists)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> PlatformResult<()> {
        self.endpoint("playlist/delete", json!({ "playlistId": playlist_id }))
            .await?;
        Ok(())
    }

    async fn rename_playlist(&self, playlist_id: &str, new_name: &str) -> PlatformResult<()> {
        let response = self
            .endpoint(
                "browse/edit_playlist",
                json!({
                    "playlistId": playlist_id,
                    "actions": [{ "action": "ACTION_SET_PLAYLIST_NAME", "playlistName": new_name }]
                }),
            )
            .await?;
        match response.get("status").and_then(Value::as_str) {
            Some("STATUS_SUCCEEDED") => Ok(()),
            status => Err(PlatformError::Fetch {
                platform: Platform::YouTubeMusic,
                reason: format!("rename returned {:?}", status),
            }),
        }
    }
}

/// Parses the "3:45" / "1:02:03" length text the player shows per track.
fn parse_duration_text(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let seconds = match parts.as_slice() {
        [minutes, seconds] => minutes.parse::<u64>().ok()? * 60 + seconds.parse::<u64>().ok()?,
        [hours, minutes, seconds] => {
            hours.parse::<u64>().ok()? * 3600
                + minutes.parse::<u64>().ok()? * 60
                + seconds.parse::<u64>().ok()?
        }
        _ => return None,
    };
    Some(seconds * 1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotenvy::dotenv;

    #[test]
    fn test_extract_bare_playlist_id() {
        assert_eq!(
            YouTubeMusicClient::extract_playlist_id("PLabc123_-XYZ"),
            "PLabc123_-XYZ"
        );
    }

    #[test]
    fn test_extract_from_music_url() {
        assert_eq!(
            YouTubeMusicClient::extract_playlist_id(
                "https://music.youtube.com/playlist?list=PLabc123_-XYZ"
            ),
            "PLabc123_-XYZ"
        );
    }

    #[test]
    fn test_extract_from_watch_url() {
        assert_eq!(
            YouTubeMusicClient::extract_playlist_id(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc123_-XYZ&index=2"
            ),
            "PLabc123_-XYZ"
        );
    }

    #[test]
    fn test_unrecognized_input_passes_through() {
        assert_eq!(
            YouTubeMusicClient::extract_playlist_id("RDCLAK5uy_abc"),
            "RDCLAK5uy_abc"
        );
    }

    #[test]
    fn test_parse_duration_text() {
        assert_eq!(parse_duration_text("3:45"), Some(225_000));
        assert_eq!(parse_duration_text("1:02:03"), Some(3_723_000));
        assert_eq!(parse_duration_text("n/a"), None);
    }

    #[test]
    fn test_track_from_item_rejects_malformed_payload() {
        let item = serde_json::json!({ "somethingElse": {} });
        let result = YouTubeMusicClient::track_from_item(&item);
        assert!(matches!(result, Err(PlatformError::Fetch { .. })));
    }

    #[test]
    fn test_track_from_item_parses_full_shape() {
        let item = serde_json::json!({
            "musicResponsiveListItemRenderer": {
                "playlistItemData": { "videoId": "abc123" },
                "fixedColumns": [{
                    "musicResponsiveListItemFixedColumnRenderer": {
                        "text": { "runs": [{ "text": "3:45" }] }
                    }
                }],
                "flexColumns": [
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": "Song A" }] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": "Artist X" }] } } },
                    { "musicResponsiveListItemFlexColumnRenderer": { "text": { "runs": [{ "text": "Album Z" }] } } }
                ]
            }
        });
        let track = YouTubeMusicClient::track_from_item(&item).unwrap();
        assert_eq!(track.name, "Song A");
        assert_eq!(track.artist, "Artist X");
        assert_eq!(track.album, "Album Z");
        assert_eq!(track.id.as_deref(), Some("abc123"));
        assert_eq!(track.duration_ms, Some(225_000));
    }

    #[tokio::test]
    #[ignore] // Requires a YOUTUBE_AUTH_FILE with fresh browser headers.
    async fn test_fetch_tracks() {
        dotenv().ok();
        let credentials = Credentials::from_env().unwrap();
        let client = YouTubeMusicClient::new(&credentials).unwrap();
        let descriptor = PlaylistDescriptor::new(
            Platform::YouTubeMusic,
            "https://music.youtube.com/playlist?list=PLrAl6rYgs4IvGFBDEaVGFXt6k2GtOXkrY".to_string(),
        );
        let tracks = client.fetch_tracks(&descriptor).await.unwrap();
        assert!(!tracks.is_empty());
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, Credentials};
use crate::platform::{Capabilities, CatalogAdapter, Platform, PlatformError, PlatformResult};
use crate::track::{PlaylistDescriptor, PlaylistSummary, Track};

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SongAttributes {
    name: String,
    #[serde(rename = "artistName")]
    artist_name: String,
    #[serde(rename = "albumName")]
    album_name: Option<String>,
    #[serde(rename = "durationInMillis")]
    duration_in_millis: Option<u64>,
    #[serde(rename = "playParams")]
    play_params: Option<PlayParams>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlayParams {
    #[serde(rename = "catalogId")]
    catalog_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Song {
    id: String,
    attributes: Option<SongAttributes>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Page<T> {
    data: Vec<T>,
    next: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SearchSongs {
    data: Vec<Song>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SearchResults {
    songs: Option<SearchSongs>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SearchResponse {
    results: SearchResults,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct LibraryPlaylistAttributes {
    name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct LibraryPlaylist {
    id: String,
    attributes: Option<LibraryPlaylistAttributes>,
}

/// Apple Music adapter. Catalog reads go through the developer token; library
/// reads and playlist mutations additionally need the music user token. The
/// playlist items endpoint accepts one relationship post per call, so this
/// adapter only advertises per-track adds.
pub struct AppleMusicClient {
    client: Client,
    developer_token: String,
    user_token: String,
    storefront: String,
}

impl AppleMusicClient {
    pub fn new(credentials: &Credentials) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(AppConfig::HTTP_TIMEOUT_SECS))
            .build()?;
        let storefront = if credentials.apple_storefront.is_empty() {
            "us".to_string()
        } else {
            credentials.apple_storefront.clone()
        };
        Ok(Self {
            client,
            developer_token: credentials.apple_developer_token.clone(),
            user_token: credentials.apple_user_token.clone(),
            storefront,
        })
    }

    fn tokens(&self) -> PlatformResult<(&str, &str)> {
        if self.developer_token.is_empty() || self.user_token.is_empty() {
            return Err(PlatformError::Auth {
                platform: Platform::AppleMusic,
                reason: "APPLE_DEVELOPER_TOKEN/APPLE_USER_TOKEN not configured".to_string(),
            });
        }
        Ok((&self.developer_token, &self.user_token))
    }

    fn status_error(status: StatusCode) -> PlatformError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Auth {
                platform: Platform::AppleMusic,
                reason: format!("HTTP {}", status),
            },
            _ => PlatformError::Fetch {
                platform: Platform::AppleMusic,
                reason: format!("HTTP {}", status),
            },
        }
    }

    fn track_from_song(song: Song) -> PlatformResult<Track> {
        let attributes = song.attributes.ok_or_else(|| PlatformError::Fetch {
            platform: Platform::AppleMusic,
            reason: format!("song {} carried no attributes", song.id),
        })?;
        // Library songs reference the catalog through playParams; catalog
        // search results are already catalog-addressed.
        let id = attributes
            .play_params
            .and_then(|params| params.catalog_id)
            .unwrap_or(song.id);
        Ok(Track {
            name: attributes.name,
            artist: attributes.artist_name,
            album: attributes.album_name.unwrap_or_default(),
            id: Some(id),
            duration_ms: attributes.duration_in_millis,
            popularity: None,
        })
    }

    async fn get_page<T: serde::de::DeserializeOwned>(&self, path: &str) -> PlatformResult<T> {
        let (developer_token, user_token) = self.tokens()?;
        let url = if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", AppConfig::APPLE_MUSIC_API_URL, path)
        };
        let response = self
            .client
            .get(&url)
            .bearer_auth(developer_token)
            .header("Music-User-Token", user_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        response
            .json::<T>()
            .await
            .map_err(|error| PlatformError::Fetch {
                platform: Platform::AppleMusic,
                reason: format!("malformed response: {}", error),
            })
    }
}

#[async_trait]
impl CatalogAdapter for AppleMusicClient {
    fn platform(&self) -> Platform {
        Platform::AppleMusic
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            batch_add: false,
            single_add: true,
            search: true,
            analyze: false,
            audio_features: false,
            list_playlists: true,
            delete_playlist: true,
            rename_playlist: false,
            recommend: false,
        }
    }

    async fn fetch_tracks(&self, descriptor: &PlaylistDescriptor) -> PlatformResult<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "/me/library/playlists/{}/tracks",
            descriptor.source
        ));
        while let Some(path) = next {
            let page: Page<Song> = self.get_page(&path).await?;
            for song in page.data {
                tracks.push(Self::track_from_song(song)?);
            }
            next = page.next;
        }
        Ok(tracks)
    }

    async fn create_playlist(&self, name: &str) -> PlatformResult<String> {
        let (developer_token, user_token) = self.tokens()?;
        let url = format!("{}/me/library/playlists", AppConfig::APPLE_MUSIC_API_URL);
        let body = serde_json::json!({
            "attributes": { "name": name, "description": "Created by PlaySync" }
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(developer_token)
            .header("Music-User-Token", user_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::Create {
                platform: Platform::AppleMusic,
                reason: format!("HTTP {}", response.status()),
            });
        }
        let created: Page<LibraryPlaylist> = response.json().await?;
        created
            .data
            .into_iter()
            .next()
            .map(|playlist| playlist.id)
            .ok_or_else(|| PlatformError::Create {
                platform: Platform::AppleMusic,
                reason: "create response carried no playlist".to_string(),
            })
    }

    async fn search_track(&self, query: &str) -> PlatformResult<Option<Track>> {
        Ok(self.search_tracks(query, 1).await?.into_iter().next())
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> PlatformResult<Vec<Track>> {
        let (developer_token, _) = self.tokens()?;
        let url = format!(
            "{}/catalog/{}/search?term={}&types=songs&limit={}",
            AppConfig::APPLE_MUSIC_API_URL,
            self.storefront,
            urlencoding::encode(query),
            limit
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(developer_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        let search: SearchResponse = response.json().await?;
        let songs = match search.results.songs {
            Some(songs) => songs.data,
            None => return Ok(Vec::new()),
        };
        songs.into_iter().map(Self::track_from_song).collect()
    }

    async fn add_track(&self, playlist_id: &str, track: &Track) -> PlatformResult<()> {
        let (developer_token, user_token) = self.tokens()?;
        let song_id = track.id.as_ref().ok_or_else(|| PlatformError::AddTrack {
            platform: Platform::AppleMusic,
            track: track.name.clone(),
            reason: "track has no catalog id".to_string(),
        })?;
        let url = format!(
            "{}/me/library/playlists/{}/tracks",
            AppConfig::APPLE_MUSIC_API_URL,
            playlist_id
        );
        let body = serde_json::json!({
            "data": [{ "id": song_id, "type": "songs" }]
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(developer_token)
            .header("Music-User-Token", user_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::AddTrack {
                platform: Platform::AppleMusic,
                track: track.name.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(())
    }

    async fn list_playlists(&self) -> PlatformResult<Vec<PlaylistSummary>> {
        let mut playlists = Vec::new();
        let mut next = Some("/me/library/playlists".to_string());
        while let Some(path) = next {
            let page: Page<LibraryPlaylist> = self.get_page(&path).await?;
            playlists.extend(page.data.into_iter().map(|playlist| PlaylistSummary {
                id: playlist.id,
                name: playlist
                    .attributes
                    .map(|attributes| attributes.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                // The listing endpoint does not include a track count.
                tracks_count: 0,
            }));
            next = page.next;
        }
        Ok(playlists)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> PlatformResult<()> {
        let (developer_token, user_token) = self.tokens()?;
        let url = format!(
            "{}/me/library/playlists/{}",
            AppConfig::APPLE_MUSIC_API_URL,
            playlist_id
        );
        let response = self
            .client
            .delete(&url)
            .bearer_auth(developer_token)
            .header("Music-User-Token", user_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotenvy::dotenv;

    #[test]
    fn test_track_from_song_prefers_catalog_id() {
        let song = Song {
            id: "i.library123".to_string(),
            attributes: Some(SongAttributes {
                name: "Song A".to_string(),
                artist_name: "Artist X".to_string(),
                album_name: Some("Album Z".to_string()),
                duration_in_millis: Some(200_000),
                play_params: Some(PlayParams {
                    catalog_id: Some("1440857781".to_string()),
                }),
            }),
        };
        let track = AppleMusicClient::track_from_song(song).unwrap();
        assert_eq!(track.id.as_deref(), Some("1440857781"));
        assert_eq!(track.album, "Album Z");
    }

    #[test]
    fn test_track_from_song_without_attributes_is_an_error() {
        let song = Song {
            id: "i.library123".to_string(),
            attributes: None,
        };
        let result = AppleMusicClient::track_from_song(song);
        assert!(matches!(result, Err(PlatformError::Fetch { .. })));
    }

    #[tokio::test]
    #[ignore] // Requires Apple Music tokens in .env and network access.
    async fn test_search_track() {
        dotenv().ok();
        let credentials = Credentials::from_env().unwrap();
        let client = AppleMusicClient::new(&credentials).unwrap();
        let result = client
            .search_track("Bohemian Rhapsody Queen")
            .await
            .unwrap();
        assert!(result.is_some());
    }
}

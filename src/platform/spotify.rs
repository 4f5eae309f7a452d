use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::analysis::{self, AnalysisStats, AudioAverages};
use crate::config::{AppConfig, Credentials};
use crate::platform::{Capabilities, CatalogAdapter, Platform, PlatformError, PlatformResult};
use crate::track::{PlaylistDescriptor, PlaylistSummary, Track};

/// Tracks are added to Spotify playlists in chunks of at most this many URIs,
/// the documented limit of the playlist items endpoint.
const ADD_CHUNK_SIZE: usize = 100;
const FEATURES_CHUNK_SIZE: usize = 100;
const TRACKS_CHUNK_SIZE: usize = 50;

#[derive(Serialize, Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiArtist {
    id: Option<String>,
    name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiAlbum {
    name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiTrack {
    id: Option<String>,
    name: String,
    artists: Vec<ApiArtist>,
    album: Option<ApiAlbum>,
    duration_ms: Option<u64>,
    popularity: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlaylistItem {
    track: Option<ApiTrack>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlaylistTracks {
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiPlaylist {
    name: String,
    description: Option<String>,
    tracks: PlaylistTracks,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SearchTracks {
    items: Vec<ApiTrack>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct MeResponse {
    id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlaylistSummaryTracks {
    total: usize,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiPlaylistSummary {
    id: String,
    name: String,
    tracks: PlaylistSummaryTracks,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct UserPlaylistsResponse {
    items: Vec<ApiPlaylistSummary>,
    next: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct AudioFeature {
    tempo: f64,
    energy: f64,
    danceability: f64,
    valence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeature>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct TracksResponse {
    tracks: Vec<Option<ApiTrack>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct FullArtist {
    genres: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ArtistsResponse {
    artists: Vec<FullArtist>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct RecommendationsResponse {
    tracks: Vec<ApiTrack>,
}

pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    user_token: String,
}

impl SpotifyClient {
    pub fn new(credentials: &Credentials) -> PlatformResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(AppConfig::HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            client_id: credentials.spotify_client_id.clone(),
            client_secret: credentials.spotify_client_secret.clone(),
            user_token: credentials.spotify_user_token.clone(),
        })
    }

    /// Client Credentials Flow. Enough for catalog reads; playlist mutations
    /// go through the user token instead.
    async fn access_token(&self) -> PlatformResult<String> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PlatformError::Auth {
                platform: Platform::Spotify,
                reason: "SPOTIFY_CLIENT_ID/SPOTIFY_CLIENT_SECRET not configured".to_string(),
            });
        }
        let auth_string = format!("{}:{}", self.client_id, self.client_secret);
        let encoded_auth = general_purpose::STANDARD.encode(auth_string);

        let response = self
            .client
            .post(AppConfig::SPOTIFY_ACCOUNTS_URL)
            .header("Authorization", format!("Basic {}", encoded_auth))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::Auth {
                platform: Platform::Spotify,
                reason: format!("token request returned HTTP {}", response.status()),
            });
        }
        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.access_token)
    }

    fn user_token(&self) -> PlatformResult<&str> {
        if self.user_token.is_empty() {
            return Err(PlatformError::Auth {
                platform: Platform::Spotify,
                reason: "SPOTIFY_USER_TOKEN not configured, playlist mutations need a user token"
                    .to_string(),
            });
        }
        Ok(&self.user_token)
    }

    /// Accepts either an `open.spotify.com/playlist/<id>` URL or a bare ID.
    pub fn playlist_id_from_source(source: &str) -> PlatformResult<String> {
        if !source.starts_with("http") {
            return Ok(source.to_string());
        }
        let playlist_url = Url::parse(source)?;
        let mut sections = playlist_url
            .path_segments()
            .ok_or_else(|| PlatformError::Fetch {
                platform: Platform::Spotify,
                reason: format!("'{}' has no path segments", source),
            })?;
        match (sections.next(), sections.next()) {
            (Some("playlist"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(PlatformError::Fetch {
                platform: Platform::Spotify,
                reason: format!("'{}' is not a playlist url", source),
            }),
        }
    }

    fn fetch_error(status: StatusCode) -> PlatformError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Auth {
                platform: Platform::Spotify,
                reason: format!("HTTP {}", status),
            },
            _ => PlatformError::Fetch {
                platform: Platform::Spotify,
                reason: format!("HTTP {}", status),
            },
        }
    }

    fn track_from_api(api_track: ApiTrack) -> Track {
        let artist = api_track
            .artists
            .first()
            .map(|artist| artist.name.clone())
            .unwrap_or_default();
        let album = api_track
            .album
            .map(|album| album.name)
            .unwrap_or_default();
        Track {
            name: api_track.name,
            artist,
            album,
            id: api_track.id,
            duration_ms: api_track.duration_ms,
            popularity: api_track.popularity,
        }
    }

    async fn get_playlist(&self, playlist_id: &str, token: &str) -> PlatformResult<ApiPlaylist> {
        let playlist_url = format!("{}/playlists/{}", AppConfig::SPOTIFY_API_URL, playlist_id);
        let response = self
            .client
            .get(&playlist_url)
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fetch_error(response.status()));
        }
        response.json::<ApiPlaylist>().await.map_err(|error| {
            PlatformError::Fetch {
                platform: Platform::Spotify,
                reason: format!("malformed playlist response: {}", error),
            }
        })
    }

    /// Pulls every page of a playlist. Any page failing to decode aborts the
    /// fetch; a truncated track list is worse than an error.
    async fn collect_tracks(&self, playlist_id: &str, token: &str) -> PlatformResult<Vec<Track>> {
        let mut api_playlist = self.get_playlist(playlist_id, token).await?;
        let mut tracks: Vec<Track> = api_playlist
            .tracks
            .items
            .drain(..)
            .filter_map(|item| item.track.map(Self::track_from_api))
            .collect();

        let mut next_url = api_playlist.tracks.next.take();
        while let Some(url) = next_url {
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::fetch_error(response.status()));
            }
            let mut page: PlaylistTracks =
                response
                    .json()
                    .await
                    .map_err(|error| PlatformError::Fetch {
                        platform: Platform::Spotify,
                        reason: format!("malformed playlist page: {}", error),
                    })?;
            tracks.extend(
                page.items
                    .drain(..)
                    .filter_map(|item| item.track.map(Self::track_from_api)),
            );
            next_url = page.next;
        }
        Ok(tracks)
    }

    async fn audio_averages(
        &self,
        track_ids: &[String],
        token: &str,
    ) -> PlatformResult<Option<AudioAverages>> {
        let mut features: Vec<AudioFeature> = Vec::new();
        for chunk in track_ids.chunks(FEATURES_CHUNK_SIZE) {
            let url = format!(
                "{}/audio-features?ids={}",
                AppConfig::SPOTIFY_API_URL,
                chunk.join(",")
            );
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::fetch_error(response.status()));
            }
            let page: AudioFeaturesResponse = response.json().await?;
            features.extend(page.audio_features.into_iter().flatten());
        }
        if features.is_empty() {
            return Ok(None);
        }
        let count = features.len() as f64;
        Ok(Some(AudioAverages {
            tempo: features.iter().map(|f| f.tempo).sum::<f64>() / count,
            energy: features.iter().map(|f| f.energy).sum::<f64>() / count,
            danceability: features.iter().map(|f| f.danceability).sum::<f64>() / count,
            valence: features.iter().map(|f| f.valence).sum::<f64>() / count,
        }))
    }

    async fn top_genres(
        &self,
        track_ids: &[String],
        token: &str,
    ) -> PlatformResult<Vec<(String, usize)>> {
        let mut artist_ids: Vec<String> = Vec::new();
        for chunk in track_ids.chunks(TRACKS_CHUNK_SIZE) {
            let url = format!(
                "{}/tracks?ids={}",
                AppConfig::SPOTIFY_API_URL,
                chunk.join(",")
            );
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::fetch_error(response.status()));
            }
            let page: TracksResponse = response.json().await?;
            artist_ids.extend(
                page.tracks
                    .into_iter()
                    .flatten()
                    .filter_map(|track| track.artists.into_iter().next().and_then(|a| a.id)),
            );
        }
        if artist_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut genres: Vec<String> = Vec::new();
        for chunk in artist_ids.chunks(TRACKS_CHUNK_SIZE) {
            let url = format!(
                "{}/artists?ids={}",
                AppConfig::SPOTIFY_API_URL,
                chunk.join(",")
            );
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::fetch_error(response.status()));
            }
            let page: ArtistsResponse = response.json().await?;
            genres.extend(page.artists.into_iter().flat_map(|artist| artist.genres));
        }
        Ok(analysis::frequency_table(genres.into_iter(), analysis::TOP_N))
    }
}

#[async_trait]
impl CatalogAdapter for SpotifyClient {
    fn platform(&self) -> Platform {
        Platform::Spotify
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            batch_add: true,
            single_add: false,
            search: true,
            analyze: true,
            audio_features: true,
            list_playlists: true,
            delete_playlist: true,
            rename_playlist: true,
            recommend: true,
        }
    }

    async fn fetch_tracks(&self, descriptor: &PlaylistDescriptor) -> PlatformResult<Vec<Track>> {
        let playlist_id = Self::playlist_id_from_source(&descriptor.source)?;
        let token = self.access_token().await?;
        self.collect_tracks(&playlist_id, &token).await
    }

    async fn create_playlist(&self, name: &str) -> PlatformResult<String> {
        let token = self.user_token()?;
        let me_url = format!("{}/me", AppConfig::SPOTIFY_API_URL);
        let response = self.client.get(&me_url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(PlatformError::Auth {
                platform: Platform::Spotify,
                reason: format!("profile lookup returned HTTP {}", response.status()),
            });
        }
        let me: MeResponse = response.json().await?;

        let create_url = format!("{}/users/{}/playlists", AppConfig::SPOTIFY_API_URL, me.id);
        let response = self
            .client
            .post(&create_url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "name": name, "public": false }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PlatformError::Create {
                platform: Platform::Spotify,
                reason: format!("HTTP {}", response.status()),
            });
        }
        let created: CreatedPlaylist = response.json().await?;
        Ok(created.id)
    }

    async fn search_track(&self, query: &str) -> PlatformResult<Option<Track>> {
        Ok(self.search_tracks(query, 1).await?.into_iter().next())
    }

    async fn search_tracks(&self, query: &str, limit: usize) -> PlatformResult<Vec<Track>> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            AppConfig::SPOTIFY_API_URL,
            urlencoding::encode(query),
            limit
        );
        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            return Err(Self::fetch_error(response.status()));
        }
        let search: SearchResponse = response.json().await?;
        Ok(search
            .tracks
            .items
            .into_iter()
            .map(Self::track_from_api)
            .collect())
    }

    async fn add_tracks(&self, playlist_id: &str, tracks: &[Track]) -> PlatformResult<usize> {
        // A track without an id cannot become a URI; dropping it here would
        // shrink the added count with no matching failure entry upstream.
        if let Some(missing) = tracks.iter().find(|track| track.id.is_none()) {
            return Err(PlatformError::AddTrack {
                platform: Platform::Spotify,
                track: missing.name.clone(),
                reason: "track has no Spotify id".to_string(),
            });
        }
        let token = self.user_token()?;
        let uris: Vec<String> = tracks
            .iter()
            .filter_map(|track| track.id.as_ref())
            .map(|id| format!("spotify:track:{}", id))
            .collect();

        let url = format!("{}/playlists/{}/tracks", AppConfig::SPOTIFY_API_URL, playlist_id);
        let mut added = 0;
        for chunk in uris.chunks(ADD_CHUNK_SIZE) {
            let response = self
                .client
                .post(&url)
                .bearer_auth(token)
                .json(&serde_json::json!({ "uris": chunk }))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(PlatformError::AddTrack {
                    platform: Platform::Spotify,
                    track: format!("batch of {}", chunk.len()),
                    reason: format!("HTTP {}", response.status()),
                });
            }
            added += chunk.len();
        }
        Ok(added)
    }

    async fn analyze_playlist(
        &self,
        descriptor: &PlaylistDescriptor,
    ) -> PlatformResult<AnalysisStats> {
        let playlist_id = Self::playlist_id_from_source(&descriptor.source)?;
        let token = self.access_token().await?;
        let api_playlist = self.get_playlist(&playlist_id, &token).await?;
        let tracks = self.collect_tracks(&playlist_id, &token).await?;

        let track_ids: Vec<String> = tracks.iter().filter_map(|t| t.id.clone()).collect();
        let audio = self.audio_averages(&track_ids, &token).await?;
        let top_genres = self.top_genres(&track_ids, &token).await?;

        Ok(AnalysisStats {
            name: api_playlist.name,
            total_tracks: tracks.len(),
            total_duration_ms: analysis::total_duration_ms(&tracks),
            top_artists: analysis::top_artists(&tracks, analysis::TOP_N),
            top_genres,
            audio,
        })
    }

    async fn list_playlists(&self) -> PlatformResult<Vec<PlaylistSummary>> {
        let token = self.user_token()?;
        let mut playlists = Vec::new();
        let mut next_url = Some(format!("{}/me/playlists", AppConfig::SPOTIFY_API_URL));
        while let Some(url) = next_url {
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            if !response.status().is_success() {
                return Err(Self::fetch_error(response.status()));
            }
            let page: UserPlaylistsResponse = response.json().await?;
            playlists.extend(page.items.into_iter().map(|item| PlaylistSummary {
                id: item.id,
                name: item.name,
                tracks_count: item.tracks.total,
            }));
            next_url = page.next;
        }
        Ok(playlists)
    }

    async fn delete_playlist(&self, playlist_id: &str) -> PlatformResult<()> {
        // Spotify has no hard delete; unfollowing removes it from the library.
        let token = self.user_token()?;
        let url = format!(
            "{}/playlists/{}/followers",
            AppConfig::SPOTIFY_API_URL,
            playlist_id
        );
        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(Self::fetch_error(response.status()));
        }
        Ok(())
    }

    async fn rename_playlist(&self, playlist_id: &str, new_name: &str) -> PlatformResult<()> {
        let token = self.user_token()?;
        let url = format!("{}/playlists/{}", AppConfig::SPOTIFY_API_URL, playlist_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "name": new_name }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fetch_error(response.status()));
        }
        Ok(())
    }

    async fn recommend(&self, seed: &Track, limit: usize) -> PlatformResult<Vec<Track>> {
        let seed_id = seed.id.as_ref().ok_or_else(|| PlatformError::Fetch {
            platform: Platform::Spotify,
            reason: format!("seed track '{}' has no Spotify id", seed.name),
        })?;
        let token = self.access_token().await?;
        let url = format!(
            "{}/recommendations?seed_tracks={}&limit={}",
            AppConfig::SPOTIFY_API_URL,
            seed_id,
            limit
        );
        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            return Err(Self::fetch_error(response.status()));
        }
        let recommendations: RecommendationsResponse = response.json().await?;
        Ok(recommendations
            .tracks
            .into_iter()
            .map(Self::track_from_api)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotenvy::dotenv;

    #[test]
    fn test_playlist_id_from_url() {
        let id = SpotifyClient::playlist_id_from_source(
            "https://open.spotify.com/playlist/6YYCPN91F4xI1Z17Hzn7ir",
        )
        .unwrap();
        assert_eq!(id, "6YYCPN91F4xI1Z17Hzn7ir");
    }

    #[test]
    fn test_playlist_id_from_url_with_query() {
        let id = SpotifyClient::playlist_id_from_source(
            "https://open.spotify.com/playlist/6YYCPN91F4xI1Z17Hzn7ir?si=abc123",
        )
        .unwrap();
        assert_eq!(id, "6YYCPN91F4xI1Z17Hzn7ir");
    }

    #[test]
    fn test_bare_id_passes_through() {
        let id = SpotifyClient::playlist_id_from_source("6YYCPN91F4xI1Z17Hzn7ir").unwrap();
        assert_eq!(id, "6YYCPN91F4xI1Z17Hzn7ir");
    }

    #[test]
    fn test_non_playlist_url_is_rejected() {
        let result =
            SpotifyClient::playlist_id_from_source("https://open.spotify.com/album/3T4tUhGYeRNVUGevb0wThu");
        assert!(matches!(result, Err(PlatformError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_add_tracks_rejects_tracks_without_ids() {
        let client = SpotifyClient::new(&Credentials::default()).unwrap();
        let tracks = vec![
            Track::with_id(
                "Song A".to_string(),
                "Artist X".to_string(),
                "".to_string(),
                "4uLU6hMCjMI75M1A2tKUQC".to_string(),
            ),
            Track::new("Song B".to_string(), "Artist Y".to_string(), "".to_string()),
        ];
        match client.add_tracks("playlist", &tracks).await {
            Err(PlatformError::AddTrack { track, .. }) => assert_eq!(track, "Song B"),
            other => panic!("expected AddTrack error, got {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Requires .env credentials and network access. Run with `cargo test -- --ignored`
    async fn test_fetch_tracks() {
        dotenv().ok();
        let credentials = Credentials::from_env().unwrap();
        let client = SpotifyClient::new(&credentials).unwrap();
        let descriptor = PlaylistDescriptor::new(
            Platform::Spotify,
            "https://open.spotify.com/playlist/6YYCPN91F4xI1Z17Hzn7ir".to_string(),
        );
        let tracks = client.fetch_tracks(&descriptor).await.unwrap();
        assert!(!tracks.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires .env credentials and network access.
    async fn test_search_track() {
        dotenv().ok();
        let credentials = Credentials::from_env().unwrap();
        let client = SpotifyClient::new(&credentials).unwrap();
        let result = client.search_track("Around the World Daft Punk").await.unwrap();
        assert!(result.is_some());
    }
}

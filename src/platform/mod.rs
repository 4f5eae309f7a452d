use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::AnalysisStats;
use crate::track::{PlaylistDescriptor, PlaylistSummary, Track};

pub mod apple_music;
pub mod spotify;
pub mod youtube;

/// The platforms the tool knows how to talk to. Selection is matched against
/// the exact display names; unrecognized input is rejected, not normalized.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
pub enum Platform {
    #[strum(serialize = "Spotify")]
    Spotify,
    #[strum(serialize = "Apple Music")]
    #[serde(rename = "Apple Music")]
    AppleMusic,
    #[strum(serialize = "YouTube Music")]
    #[serde(rename = "YouTube Music")]
    YouTubeMusic,
}

impl Platform {
    /// Strict platform-name matching for free-text input.
    pub fn parse(input: &str) -> Result<Self, PlatformError> {
        Self::from_str(input).map_err(|_| PlatformError::InvalidSelection(input.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Authentication failed on {platform}: {reason}")]
    Auth { platform: Platform, reason: String },

    #[error("Failed to fetch playlist from {platform}: {reason}")]
    Fetch { platform: Platform, reason: String },

    #[error("Failed to create playlist on {platform}: {reason}")]
    Create { platform: Platform, reason: String },

    #[error("Failed to add track '{track}' on {platform}: {reason}")]
    AddTrack {
        platform: Platform,
        track: String,
        reason: String,
    },

    #[error("No match found for '{query}'")]
    NoMatchFound { query: String },

    #[error("{platform} does not support {operation}")]
    CapabilityMissing {
        platform: Platform,
        operation: &'static str,
    },

    #[error("Unknown platform: '{0}'")]
    InvalidSelection(String),

    #[error("Network Error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Environment Variable Error: {0}")]
    Var(#[from] std::env::VarError),
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// What a given adapter can actually do. Callers check these flags before
/// dispatching; invoking an unadvertised operation yields
/// [`PlatformError::CapabilityMissing`], never a silent no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct Capabilities {
    pub batch_add: bool,
    pub single_add: bool,
    pub search: bool,
    pub analyze: bool,
    pub audio_features: bool,
    pub list_playlists: bool,
    pub delete_playlist: bool,
    pub rename_playlist: bool,
    pub recommend: bool,
}

/// Uniform capability surface over one streaming platform: read tracks,
/// search the catalog, mutate playlists. Optional operations have default
/// implementations that report the capability as missing, so each adapter
/// only overrides what its platform supports.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn capabilities(&self) -> Capabilities;

    /// Fetches the full track list of a playlist. A partial parse failure is
    /// an error, never a silently truncated list.
    async fn fetch_tracks(&self, descriptor: &PlaylistDescriptor) -> PlatformResult<Vec<Track>>;

    async fn create_playlist(&self, name: &str) -> PlatformResult<String>;

    /// Returns the best match for a free-text query, or `None` when the
    /// platform search comes back empty.
    async fn search_track(&self, query: &str) -> PlatformResult<Option<Track>>;

    async fn search_tracks(&self, query: &str, limit: usize) -> PlatformResult<Vec<Track>>;

    /// Batch add. Tracks must carry platform-native ids. Returns the number
    /// of tracks the platform accepted.
    async fn add_tracks(&self, playlist_id: &str, tracks: &[Track]) -> PlatformResult<usize> {
        let _ = (playlist_id, tracks);
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "batch track adds",
        })
    }

    /// Per-track fallback when the platform has no batch endpoint.
    async fn add_track(&self, playlist_id: &str, track: &Track) -> PlatformResult<()> {
        let _ = (playlist_id, track);
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "single track adds",
        })
    }

    async fn analyze_playlist(
        &self,
        descriptor: &PlaylistDescriptor,
    ) -> PlatformResult<AnalysisStats> {
        let _ = descriptor;
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "playlist analysis",
        })
    }

    async fn list_playlists(&self) -> PlatformResult<Vec<PlaylistSummary>> {
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "playlist listing",
        })
    }

    async fn delete_playlist(&self, playlist_id: &str) -> PlatformResult<()> {
        let _ = playlist_id;
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "playlist deletion",
        })
    }

    async fn rename_playlist(&self, playlist_id: &str, new_name: &str) -> PlatformResult<()> {
        let _ = (playlist_id, new_name);
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "playlist renaming",
        })
    }

    async fn recommend(&self, seed: &Track, limit: usize) -> PlatformResult<Vec<Track>> {
        let _ = (seed, limit);
        Err(PlatformError::CapabilityMissing {
            platform: self.platform(),
            operation: "recommendations",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact_names() {
        assert_eq!(Platform::parse("Spotify").unwrap(), Platform::Spotify);
        assert_eq!(
            Platform::parse("Apple Music").unwrap(),
            Platform::AppleMusic
        );
        assert_eq!(
            Platform::parse("YouTube Music").unwrap(),
            Platform::YouTubeMusic
        );
    }

    #[test]
    fn test_parse_rejects_unrecognized_input() {
        for input in ["spotify", "apple music", "Youtube Music", "Deezer", ""] {
            match Platform::parse(input) {
                Err(PlatformError::InvalidSelection(got)) => assert_eq!(got, input),
                other => panic!("expected InvalidSelection, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_display_matches_selection_names() {
        assert_eq!(Platform::Spotify.to_string(), "Spotify");
        assert_eq!(Platform::AppleMusic.to_string(), "Apple Music");
        assert_eq!(Platform::YouTubeMusic.to_string(), "YouTube Music");
    }
}

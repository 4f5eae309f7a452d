use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Platform-agnostic track record. Each adapter maps its native payload shape
/// into this at the integration boundary; nothing downstream of an adapter
/// ever sees a platform-specific field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Platform-native identifier. Only meaningful on the platform the track
    /// was fetched from or resolved on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

impl Track {
    pub fn new(name: String, artist: String, album: String) -> Self {
        Self {
            name,
            artist,
            album,
            id: None,
            duration_ms: None,
            popularity: None,
        }
    }

    pub fn with_id(name: String, artist: String, album: String, id: String) -> Self {
        Self {
            id: Some(id),
            ..Self::new(name, artist, album)
        }
    }

    pub fn key(&self) -> TrackKey {
        TrackKey {
            name: self.name.clone(),
            artist: self.artist.clone(),
        }
    }
}

/// Identity used by the set operations engine. Exact, case-sensitive string
/// equality on (name, artist); whitespace and diacritics are not normalized.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub name: String,
    pub artist: String,
}

impl From<&Track> for TrackKey {
    fn from(track: &Track) -> Self {
        track.key()
    }
}

/// Where a playlist lives and how the user referred to it. The `source` is a
/// platform-specific opaque string, either a URL or a bare ID; the owning
/// adapter decides how to canonicalize it.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PlaylistDescriptor {
    pub platform: Platform,
    pub source: String,
    pub display_name: String,
}

impl PlaylistDescriptor {
    pub fn new(platform: Platform, source: String) -> Self {
        Self {
            platform,
            source,
            display_name: String::new(),
        }
    }
}

/// One entry of a user's playlist listing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub tracks_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_key_is_case_sensitive() {
        let a = Track::new("Song A".to_string(), "Artist X".to_string(), "".to_string());
        let b = Track::new("song a".to_string(), "Artist X".to_string(), "".to_string());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_track_key_ignores_album() {
        let a = Track::new(
            "Song A".to_string(),
            "Artist X".to_string(),
            "Album 1".to_string(),
        );
        let b = Track::new(
            "Song A".to_string(),
            "Artist X".to_string(),
            "Album 2".to_string(),
        );
        assert_eq!(a.key(), b.key());
    }
}

use std::fmt;

use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use strum::IntoEnumIterator;

use crate::config::Credentials;
use crate::dialoguer::Dialoguer;
use crate::platform::apple_music::AppleMusicClient;
use crate::platform::spotify::SpotifyClient;
use crate::platform::youtube::YouTubeMusicClient;
use crate::platform::{CatalogAdapter, Platform};
use crate::track::{PlaylistDescriptor, Track};

pub mod analyze;
pub mod convert;
pub mod discover;
pub mod library;
pub mod manage;
pub mod transport;

#[derive(Debug)]
pub struct CommandError;
impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Command error")
    }
}
impl std::error::Error for CommandError {}

pub type CommandResult<T> = error_stack::Result<T, CommandError>;

pub fn build_adapter(
    platform: Platform,
    credentials: &Credentials,
) -> CommandResult<Box<dyn CatalogAdapter>> {
    let adapter: Box<dyn CatalogAdapter> = match platform {
        Platform::Spotify => Box::new(
            SpotifyClient::new(credentials)
                .into_report()
                .change_context(CommandError)?,
        ),
        Platform::AppleMusic => Box::new(
            AppleMusicClient::new(credentials)
                .into_report()
                .change_context(CommandError)?,
        ),
        Platform::YouTubeMusic => Box::new(
            YouTubeMusicClient::new(credentials)
                .into_report()
                .change_context(CommandError)?,
        ),
    };
    Ok(adapter)
}

pub fn select_platform(prompt_text: &str) -> CommandResult<Platform> {
    let platforms = Platform::iter().collect::<Vec<_>>();
    let options = platforms
        .iter()
        .map(|platform| platform.to_string())
        .collect::<Vec<_>>();
    let selection = Dialoguer::select(prompt_text.to_string(), options, None)
        .change_context(CommandError)?;
    Ok(platforms[selection])
}

pub fn select_platforms(
    prompt_text: &str,
    exclude: Option<Platform>,
) -> CommandResult<Vec<Platform>> {
    let platforms = Platform::iter()
        .filter(|platform| Some(*platform) != exclude)
        .collect::<Vec<_>>();
    let options = platforms
        .iter()
        .map(|platform| platform.to_string())
        .collect::<Vec<_>>();
    let selection = Dialoguer::multiselect(prompt_text.to_string(), options, None, true)
        .change_context(CommandError)?;
    Ok(selection
        .into_iter()
        .map(|index| platforms[index])
        .collect())
}

pub async fn fetch_playlist_tracks(
    adapter: &dyn CatalogAdapter,
    source: &str,
) -> CommandResult<Vec<Track>> {
    let descriptor = PlaylistDescriptor::new(adapter.platform(), source.to_string());
    adapter
        .fetch_tracks(&descriptor)
        .await
        .into_report()
        .change_context(CommandError)
}

pub fn load_credentials() -> CommandResult<Credentials> {
    Credentials::load().change_context(CommandError)
}

/// Adds tracks that already carry the adapter's native ids, preferring the
/// batch endpoint. On the per-track path each failure is reported and skipped;
/// the returned count is the number of tracks that landed.
pub async fn add_native_tracks(
    adapter: &dyn CatalogAdapter,
    playlist_id: &str,
    tracks: &[Track],
) -> CommandResult<usize> {
    if adapter.capabilities().batch_add {
        return adapter
            .add_tracks(playlist_id, tracks)
            .await
            .into_report()
            .change_context(CommandError);
    }
    let mut added = 0;
    for track in tracks {
        match adapter.add_track(playlist_id, track).await {
            Ok(()) => added += 1,
            Err(error) => println!("Skipping {}: {}", track.name.yellow(), error),
        }
    }
    Ok(added)
}

/// Several flows need a playlist picked interactively. Falls back to a typed
/// id when the platform cannot list playlists.
pub async fn select_playlist_id(adapter: &dyn CatalogAdapter) -> CommandResult<String> {
    if !adapter.capabilities().list_playlists {
        let prompt_text = format!("{} playlist id", adapter.platform());
        return Dialoguer::input(prompt_text).change_context(CommandError);
    }
    let playlists = adapter
        .list_playlists()
        .await
        .into_report()
        .change_context(CommandError)?;
    if playlists.is_empty() {
        return Err(Report::new(CommandError)
            .attach_printable(format!("No playlists found on {}", adapter.platform())));
    }
    let options = playlists
        .iter()
        .map(|playlist| format!("{} ({} tracks)", playlist.name, playlist.tracks_count))
        .collect::<Vec<_>>();
    let selection = Dialoguer::select("Select the playlist".to_string(), options, None)
        .change_context(CommandError)?;
    Ok(playlists[selection].id.clone())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::platform::{Capabilities, PlatformError, PlatformResult};

    struct StubCatalog {
        batch: bool,
        failing_adds: HashSet<String>,
        batch_calls: Mutex<usize>,
    }

    impl StubCatalog {
        fn new(batch: bool) -> Self {
            Self {
                batch,
                failing_adds: HashSet::new(),
                batch_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogAdapter for StubCatalog {
        fn platform(&self) -> Platform {
            Platform::AppleMusic
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                batch_add: self.batch,
                single_add: !self.batch,
                ..Capabilities::default()
            }
        }

        async fn fetch_tracks(
            &self,
            _descriptor: &PlaylistDescriptor,
        ) -> PlatformResult<Vec<Track>> {
            Ok(Vec::new())
        }

        async fn create_playlist(&self, _name: &str) -> PlatformResult<String> {
            Ok("new-playlist".to_string())
        }

        async fn search_track(&self, _query: &str) -> PlatformResult<Option<Track>> {
            Ok(None)
        }

        async fn search_tracks(&self, _query: &str, _limit: usize) -> PlatformResult<Vec<Track>> {
            Ok(Vec::new())
        }

        async fn add_tracks(&self, _playlist_id: &str, tracks: &[Track]) -> PlatformResult<usize> {
            *self.batch_calls.lock().unwrap() += 1;
            Ok(tracks.len())
        }

        async fn add_track(&self, _playlist_id: &str, track: &Track) -> PlatformResult<()> {
            if self.failing_adds.contains(&track.name) {
                return Err(PlatformError::AddTrack {
                    platform: self.platform(),
                    track: track.name.clone(),
                    reason: "rejected".to_string(),
                });
            }
            Ok(())
        }
    }

    fn tracks(names: &[&str]) -> Vec<Track> {
        names
            .iter()
            .map(|name| {
                Track::with_id(
                    name.to_string(),
                    "Artist".to_string(),
                    "".to_string(),
                    format!("id:{}", name),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_add_native_tracks_uses_one_batch_call() {
        let adapter = StubCatalog::new(true);
        let added = add_native_tracks(&adapter, "p", &tracks(&["Song A", "Song B"]))
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(*adapter.batch_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_native_tracks_skips_failures_on_per_track_path() {
        let mut adapter = StubCatalog::new(false);
        adapter.failing_adds.insert("Song B".to_string());
        let added = add_native_tracks(&adapter, "p", &tracks(&["Song A", "Song B", "Song C"]))
            .await
            .unwrap();
        assert_eq!(added, 2);
    }
}

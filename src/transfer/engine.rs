use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::platform::CatalogAdapter;
use crate::resolver::TrackResolver;
use crate::track::Track;
use crate::transfer::{FailureReason, TrackFailure, TransferResult, TransferState};

/// Orchestrates create-playlist + resolve + add against one or more targets.
/// Two invariants hold throughout: a failing track never aborts the remaining
/// tracks of its target, and a failing target never aborts the remaining
/// targets.
pub struct TransferEngine;

impl TransferEngine {
    /// Transfers the track list to every target in order, one
    /// [`TransferResult`] per target.
    pub async fn transfer_all(
        targets: &[&dyn CatalogAdapter],
        playlist_name: &str,
        tracks: &[Track],
    ) -> Vec<TransferResult> {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            println!(
                "=== Processing target: {} ===",
                target.platform().to_string().cyan()
            );
            let result = Self::transfer_to_target(*target, playlist_name, tracks).await;
            Self::print_summary(&result);
            results.push(result);
        }
        results
    }

    pub async fn transfer_to_target(
        target: &dyn CatalogAdapter,
        playlist_name: &str,
        tracks: &[Track],
    ) -> TransferResult {
        let platform = target.platform();
        let capabilities = target.capabilities();
        let tracks_requested = tracks.len();

        if !capabilities.batch_add && !capabilities.single_add {
            return TransferResult::failed(
                platform,
                tracks_requested,
                format!("{} advertises no way to add tracks", platform),
            );
        }

        let playlist_id = match target.create_playlist(playlist_name).await {
            Ok(playlist_id) => playlist_id,
            Err(error) => {
                return TransferResult::failed(platform, tracks_requested, error.to_string());
            }
        };
        println!(
            "Created playlist '{}' on {} (id={})",
            playlist_name.green(),
            platform.to_string().green(),
            playlist_id
        );

        // Resolution phase: one search per source track against the target
        // catalog. Misses are recorded, never raised.
        let mut failures: Vec<TrackFailure> = Vec::new();
        let mut resolved: Vec<(usize, Track)> = Vec::new();
        for (index, track) in tracks.iter().enumerate() {
            match TrackResolver::resolve(target, track).await {
                Ok(Some(hit)) => resolved.push((index, hit)),
                Ok(None) => {
                    println!(
                        "No match found for {} by {}",
                        track.name.red(),
                        track.artist.red()
                    );
                    failures.push(TrackFailure {
                        index,
                        track: track.clone(),
                        reason: FailureReason::NoMatchFound,
                    });
                }
                Err(error) => {
                    failures.push(TrackFailure {
                        index,
                        track: track.clone(),
                        reason: FailureReason::Search(error.to_string()),
                    });
                }
            }
        }

        let mut tracks_added = 0;
        let mut target_error = None;
        if capabilities.batch_add {
            // One call with the full resolved set. A batch-level failure
            // aborts the remaining adds but leaves the created playlist.
            let batch: Vec<Track> = resolved.iter().map(|(_, track)| track.clone()).collect();
            if !batch.is_empty() {
                match target.add_tracks(&playlist_id, &batch).await {
                    Ok(accepted) => tracks_added = accepted.min(batch.len()),
                    Err(error) => {
                        let reason = error.to_string();
                        for (index, track) in resolved {
                            failures.push(TrackFailure {
                                index,
                                track,
                                reason: FailureReason::BatchAborted(reason.clone()),
                            });
                        }
                        target_error = Some(reason);
                    }
                }
            }
        } else {
            let progress = ProgressBar::new(resolved.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            progress.set_message(format!("Adding tracks on {}", platform));
            for (index, track) in resolved {
                match target.add_track(&playlist_id, &track).await {
                    Ok(()) => tracks_added += 1,
                    Err(error) => {
                        failures.push(TrackFailure {
                            index,
                            track,
                            reason: FailureReason::AddTrack(error.to_string()),
                        });
                    }
                }
                progress.inc(1);
            }
            progress.finish_and_clear();
        }

        TransferResult::finished(
            platform,
            playlist_id,
            tracks_requested,
            tracks_added,
            failures,
            target_error,
        )
    }

    fn print_summary(result: &TransferResult) {
        let state = match result.state {
            TransferState::Succeeded => result.state.to_string().green(),
            TransferState::PartialFailure => result.state.to_string().yellow(),
            TransferState::Failed => result.state.to_string().red(),
        };
        println!(
            "{}: {} of {} tracks added on {}",
            state,
            result.tracks_added.to_string().cyan(),
            result.tracks_requested.to_string().cyan(),
            result.target
        );
        if let Some(error) = &result.error {
            println!("  {}", error.red());
        }
        for failure in &result.failures {
            println!(
                "  #{} {} by {}: {}",
                failure.index + 1,
                failure.track.name.yellow(),
                failure.track.artist.yellow(),
                failure.reason
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::platform::{Capabilities, Platform, PlatformError, PlatformResult};
    use crate::track::PlaylistDescriptor;

    /// In-memory target used to drive the engine through every branch of the
    /// state machine without touching the network.
    struct FakeCatalog {
        capabilities: Capabilities,
        fail_create: bool,
        unresolvable: HashSet<String>,
        failing_adds: HashSet<String>,
        fail_batch: bool,
        added: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn per_track() -> Self {
            Self {
                capabilities: Capabilities {
                    single_add: true,
                    search: true,
                    ..Capabilities::default()
                },
                fail_create: false,
                unresolvable: HashSet::new(),
                failing_adds: HashSet::new(),
                fail_batch: false,
                added: Mutex::new(Vec::new()),
            }
        }

        fn batch() -> Self {
            Self {
                capabilities: Capabilities {
                    batch_add: true,
                    search: true,
                    ..Capabilities::default()
                },
                ..Self::per_track()
            }
        }

        fn added(&self) -> Vec<String> {
            self.added.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogAdapter for FakeCatalog {
        fn platform(&self) -> Platform {
            Platform::YouTubeMusic
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }

        async fn fetch_tracks(
            &self,
            _descriptor: &PlaylistDescriptor,
        ) -> PlatformResult<Vec<Track>> {
            Ok(Vec::new())
        }

        async fn create_playlist(&self, _name: &str) -> PlatformResult<String> {
            if self.fail_create {
                return Err(PlatformError::Auth {
                    platform: self.platform(),
                    reason: "session expired".to_string(),
                });
            }
            Ok("new-playlist".to_string())
        }

        async fn search_track(&self, query: &str) -> PlatformResult<Option<Track>> {
            if self.unresolvable.iter().any(|name| query.contains(name.as_str())) {
                return Ok(None);
            }
            Ok(Some(Track::with_id(
                query.to_string(),
                "resolved".to_string(),
                "".to_string(),
                format!("id:{}", query),
            )))
        }

        async fn search_tracks(&self, query: &str, _limit: usize) -> PlatformResult<Vec<Track>> {
            Ok(self.search_track(query).await?.into_iter().collect())
        }

        async fn add_tracks(&self, _playlist_id: &str, tracks: &[Track]) -> PlatformResult<usize> {
            if self.fail_batch {
                return Err(PlatformError::AddTrack {
                    platform: self.platform(),
                    track: "batch".to_string(),
                    reason: "upstream rejected the batch".to_string(),
                });
            }
            let mut added = self.added.lock().unwrap();
            for track in tracks {
                added.push(track.name.clone());
            }
            Ok(tracks.len())
        }

        async fn add_track(&self, _playlist_id: &str, track: &Track) -> PlatformResult<()> {
            if self.failing_adds.iter().any(|name| track.name.contains(name.as_str())) {
                return Err(PlatformError::AddTrack {
                    platform: self.platform(),
                    track: track.name.clone(),
                    reason: "rejected".to_string(),
                });
            }
            self.added.lock().unwrap().push(track.name.clone());
            Ok(())
        }
    }

    fn tracks(names: &[(&str, &str)]) -> Vec<Track> {
        names
            .iter()
            .map(|(name, artist)| Track::new(name.to_string(), artist.to_string(), "".to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_full_success_on_per_track_target() {
        let target = FakeCatalog::per_track();
        let source = tracks(&[("Song A", "Artist X"), ("Song B", "Artist Y")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::Succeeded);
        assert_eq!(result.tracks_requested, 2);
        assert_eq!(result.tracks_added, 2);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_track_is_partial_failure_with_no_match_found() {
        let mut target = FakeCatalog::per_track();
        target.unresolvable.insert("Song B".to_string());
        let source = tracks(&[("Song A", "Artist X"), ("Song B", "Artist Y")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::PartialFailure);
        assert_eq!(result.tracks_requested, 2);
        assert_eq!(result.tracks_added, 1);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].index, 1);
        assert_eq!(result.failures[0].reason, FailureReason::NoMatchFound);
    }

    #[tokio::test]
    async fn test_failing_add_does_not_reduce_other_adds() {
        let mut target = FakeCatalog::per_track();
        target.failing_adds.insert("Song B".to_string());
        let source = tracks(&[
            ("Song A", "Artist X"),
            ("Song B", "Artist Y"),
            ("Song C", "Artist Z"),
        ]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::PartialFailure);
        assert_eq!(result.tracks_added, 2);
        assert_eq!(target.added().len(), 2);
        assert_eq!(result.failures.len(), 1);
        assert!(matches!(
            result.failures[0].reason,
            FailureReason::AddTrack(_)
        ));
        assert!(result.tracks_added <= result.tracks_requested);
    }

    #[tokio::test]
    async fn test_create_failure_attempts_no_tracks() {
        let mut target = FakeCatalog::per_track();
        target.fail_create = true;
        let source = tracks(&[("Song A", "Artist X")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::Failed);
        assert_eq!(result.tracks_added, 0);
        assert!(result.playlist_id.is_none());
        assert!(result.error.is_some());
        assert!(target.added().is_empty());
    }

    #[tokio::test]
    async fn test_failed_target_does_not_stop_the_next_target() {
        let mut failing = FakeCatalog::per_track();
        failing.fail_create = true;
        let healthy = FakeCatalog::per_track();
        let source = tracks(&[("Song A", "Artist X")]);
        let targets: Vec<&dyn CatalogAdapter> = vec![&failing, &healthy];
        let results = TransferEngine::transfer_all(&targets, "mix", &source).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].state, TransferState::Failed);
        assert_eq!(results[1].state, TransferState::Succeeded);
        assert_eq!(healthy.added().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_target_adds_in_one_call() {
        let target = FakeCatalog::batch();
        let source = tracks(&[("Song A", "Artist X"), ("Song B", "Artist Y")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::Succeeded);
        assert_eq!(result.tracks_added, 2);
        assert_eq!(target.added().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_failure_keeps_playlist_and_records_all_tracks() {
        let mut target = FakeCatalog::batch();
        target.fail_batch = true;
        let source = tracks(&[("Song A", "Artist X"), ("Song B", "Artist Y")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::PartialFailure);
        assert_eq!(result.tracks_added, 0);
        assert!(result.playlist_id.is_some());
        assert!(result.error.is_some());
        assert_eq!(result.failures.len(), 2);
        assert!(matches!(
            result.failures[0].reason,
            FailureReason::BatchAborted(_)
        ));
    }

    #[tokio::test]
    async fn test_target_without_add_capability_fails_explicitly() {
        let mut target = FakeCatalog::per_track();
        target.capabilities.single_add = false;
        let source = tracks(&[("Song A", "Artist X")]);
        let result = TransferEngine::transfer_to_target(&target, "mix", &source).await;
        assert_eq!(result.state, TransferState::Failed);
        assert!(result.error.unwrap().contains("no way to add tracks"));
    }

    #[tokio::test]
    async fn test_empty_source_creates_empty_playlist() {
        let target = FakeCatalog::per_track();
        let result = TransferEngine::transfer_to_target(&target, "mix", &[]).await;
        assert_eq!(result.state, TransferState::Succeeded);
        assert_eq!(result.tracks_requested, 0);
        assert_eq!(result.tracks_added, 0);
        assert!(result.playlist_id.is_some());
    }
}

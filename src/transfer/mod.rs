use std::fmt;

use serde::Serialize;

use crate::platform::Platform;
use crate::track::Track;

pub mod engine;

/// Terminal state of one target's transfer.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum TransferState {
    /// Every requested track landed in the created playlist.
    Succeeded,
    /// The playlist exists but holds fewer tracks than requested. A created
    /// playlist with zero tracks added is still this state, not `Failed`.
    PartialFailure,
    /// Playlist creation itself failed; no tracks were attempted.
    Failed,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum FailureReason {
    /// The target's search returned zero results for the track.
    NoMatchFound,
    /// The search call itself failed.
    Search(String),
    /// The per-track add call failed.
    AddTrack(String),
    /// A batch-level failure aborted the remaining adds for the target.
    BatchAborted(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoMatchFound => f.write_str("NoMatchFound"),
            FailureReason::Search(reason) => write!(f, "search failed: {}", reason),
            FailureReason::AddTrack(reason) => write!(f, "add failed: {}", reason),
            FailureReason::BatchAborted(reason) => write!(f, "batch aborted: {}", reason),
        }
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct TrackFailure {
    /// Position of the track in the source playlist.
    pub index: usize,
    pub track: Track,
    pub reason: FailureReason,
}

/// Outcome of one target platform's transfer. One of these exists per target
/// regardless of how the target fared; a failing target never suppresses the
/// results of the others.
#[derive(Serialize, Clone, Debug)]
pub struct TransferResult {
    pub target: Platform,
    pub playlist_id: Option<String>,
    pub tracks_requested: usize,
    pub tracks_added: usize,
    /// Per-track failures in source order.
    pub failures: Vec<TrackFailure>,
    /// Target-level error when creation failed or a batch add aborted.
    pub error: Option<String>,
    pub state: TransferState,
}

impl TransferResult {
    pub(crate) fn failed(target: Platform, tracks_requested: usize, error: String) -> Self {
        Self {
            target,
            playlist_id: None,
            tracks_requested,
            tracks_added: 0,
            failures: Vec::new(),
            error: Some(error),
            state: TransferState::Failed,
        }
    }

    pub(crate) fn finished(
        target: Platform,
        playlist_id: String,
        tracks_requested: usize,
        tracks_added: usize,
        mut failures: Vec<TrackFailure>,
        error: Option<String>,
    ) -> Self {
        debug_assert!(tracks_added <= tracks_requested);
        failures.sort_by_key(|failure| failure.index);
        let state = if tracks_added == tracks_requested {
            TransferState::Succeeded
        } else {
            TransferState::PartialFailure
        };
        Self {
            target,
            playlist_id: Some(playlist_id),
            tracks_requested,
            tracks_added,
            failures,
            error,
            state,
        }
    }
}

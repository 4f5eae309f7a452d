use std::collections::HashSet;

use thiserror::Error;

use crate::track::{Track, TrackKey};

#[derive(Error, Debug, PartialEq)]
pub enum SetOpsError {
    #[error("At least 2 sources are required, got {0}")]
    NotEnoughSources(usize),
}

/// Union of tracks across sources, keyed by exact (name, artist). Duplicate
/// keys collapse to one entry; the album field is blanked for merged entries
/// since the sources may disagree on it. No ordering is guaranteed.
pub fn merge(sources: &[Vec<Track>]) -> Vec<Track> {
    let mut seen: HashSet<TrackKey> = HashSet::new();
    let mut merged = Vec::new();
    for source in sources {
        for track in source {
            if seen.insert(track.key()) {
                merged.push(Track::new(
                    track.name.clone(),
                    track.artist.clone(),
                    String::new(),
                ));
            }
        }
    }
    merged
}

/// Intersection across all sources plus, per source, the tracks only that
/// source has.
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub common: HashSet<TrackKey>,
    pub unique: Vec<(String, HashSet<TrackKey>)>,
}

pub fn compare(sources: &[(String, Vec<Track>)]) -> Result<CompareOutcome, SetOpsError> {
    if sources.len() < 2 {
        return Err(SetOpsError::NotEnoughSources(sources.len()));
    }

    let sets: Vec<(String, HashSet<TrackKey>)> = sources
        .iter()
        .map(|(label, tracks)| {
            let keys = tracks.iter().map(Track::key).collect();
            (label.clone(), keys)
        })
        .collect();

    let mut common = sets[0].1.clone();
    for (_, set) in &sets[1..] {
        common.retain(|key| set.contains(key));
    }

    let unique = sets
        .iter()
        .map(|(label, set)| {
            let only_here: HashSet<TrackKey> = set.difference(&common).cloned().collect();
            (label.clone(), only_here)
        })
        .collect();

    Ok(CompareOutcome { common, unique })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, artist: &str) -> Track {
        Track::new(name.to_string(), artist.to_string(), "album".to_string())
    }

    #[test]
    fn test_merge_of_disjoint_sources_keeps_everything() {
        let a = vec![track("Song A", "Artist X"), track("Song B", "Artist Y")];
        let b = vec![track("Song C", "Artist Z")];
        let merged = merge(&[a.clone(), b.clone()]);
        assert_eq!(merged.len(), a.len() + b.len());
    }

    #[test]
    fn test_self_merge_collapses_to_distinct_keys() {
        let a = vec![
            track("Song A", "Artist X"),
            track("Song A", "Artist X"),
            track("Song B", "Artist Y"),
        ];
        let merged = merge(&[a.clone(), a]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_blanks_the_album_field() {
        let a = vec![track("Song A", "Artist X")];
        let merged = merge(&[a]);
        assert_eq!(merged[0].album, "");
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let a = vec![track("Song A", "Artist X")];
        let b = vec![track("song a", "Artist X")];
        let merged = merge(&[a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_compare_with_one_source_fails_precondition() {
        let sources = vec![("Spotify".to_string(), vec![track("Song A", "Artist X")])];
        let result = compare(&sources);
        assert!(matches!(result, Err(SetOpsError::NotEnoughSources(1))));
    }

    #[test]
    fn test_compare_partitions_reconstruct_the_union() {
        let a = vec![
            track("Shared 1", "Artist X"),
            track("Shared 2", "Artist Y"),
            track("Only A", "Artist Z"),
        ];
        let b = vec![
            track("Shared 1", "Artist X"),
            track("Shared 2", "Artist Y"),
            track("Only B", "Artist W"),
        ];
        let union: HashSet<TrackKey> = a.iter().chain(b.iter()).map(Track::key).collect();
        let outcome = compare(&[("A".to_string(), a), ("B".to_string(), b)]).unwrap();

        assert_eq!(outcome.common.len(), 2);
        let mut reconstructed = outcome.common.clone();
        for (_, only_here) in &outcome.unique {
            assert!(only_here.is_disjoint(&outcome.common));
            reconstructed.extend(only_here.iter().cloned());
        }
        assert_eq!(reconstructed, union);
    }

    #[test]
    fn test_compare_with_three_sources() {
        let a = vec![track("Everywhere", "Artist X"), track("Only A", "Artist Y")];
        let b = vec![track("Everywhere", "Artist X"), track("A and B", "Artist Z")];
        let c = vec![track("Everywhere", "Artist X")];
        let outcome = compare(&[
            ("A".to_string(), a),
            ("B".to_string(), b),
            ("C".to_string(), c),
        ])
        .unwrap();
        assert_eq!(outcome.common.len(), 1);
        assert_eq!(outcome.unique[0].1.len(), 1);
        assert_eq!(outcome.unique[1].1.len(), 1);
        assert!(outcome.unique[2].1.is_empty());
    }
}

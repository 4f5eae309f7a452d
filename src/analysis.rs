use std::collections::HashMap;

use comfy_table::Table;
use serde::{Deserialize, Serialize};

use crate::track::Track;

pub const TOP_N: usize = 5;

/// Averages over the audio features a platform exposes. Only Spotify
/// advertises this capability; everyone else reports `None`.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AudioAverages {
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalysisStats {
    pub name: String,
    pub total_tracks: usize,
    pub total_duration_ms: u64,
    pub top_artists: Vec<(String, usize)>,
    pub top_genres: Vec<(String, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioAverages>,
}

impl AnalysisStats {
    pub fn render_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Metric", "Value"]);
        table.add_row(vec!["Playlist".to_string(), self.name.clone()]);
        table.add_row(vec![
            "Total tracks".to_string(),
            self.total_tracks.to_string(),
        ]);
        table.add_row(vec![
            "Total duration".to_string(),
            format_duration(self.total_duration_ms),
        ]);
        table.add_row(vec![
            "Top artists".to_string(),
            format_frequency_table(&self.top_artists),
        ]);
        if !self.top_genres.is_empty() {
            table.add_row(vec![
                "Top genres".to_string(),
                format_frequency_table(&self.top_genres),
            ]);
        }
        if let Some(audio) = &self.audio {
            table.add_row(vec![
                "Avg tempo".to_string(),
                format!("{:.1} BPM", audio.tempo),
            ]);
            table.add_row(vec!["Avg energy".to_string(), format!("{:.2}", audio.energy)]);
            table.add_row(vec![
                "Avg danceability".to_string(),
                format!("{:.2}", audio.danceability),
            ]);
            table.add_row(vec![
                "Avg valence".to_string(),
                format!("{:.2}", audio.valence),
            ]);
        }
        table
    }
}

/// Top-N frequency table. Ties break alphabetically so output is stable.
pub fn frequency_table(items: impl Iterator<Item = String>, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(top_n);
    sorted
}

pub fn top_artists(tracks: &[Track], top_n: usize) -> Vec<(String, usize)> {
    frequency_table(tracks.iter().map(|track| track.artist.clone()), top_n)
}

pub fn total_duration_ms(tracks: &[Track]) -> u64 {
    tracks.iter().filter_map(|track| track.duration_ms).sum()
}

pub fn format_duration(total_ms: u64) -> String {
    let total_seconds = total_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn format_frequency_table(entries: &[(String, usize)]) -> String {
    entries
        .iter()
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, artist: &str) -> Track {
        Track::new(name.to_string(), artist.to_string(), "".to_string())
    }

    #[test]
    fn test_top_artists_orders_by_count_then_name() {
        let tracks = vec![
            track("a", "Artist B"),
            track("b", "Artist B"),
            track("c", "Artist A"),
            track("d", "Artist C"),
            track("e", "Artist A"),
        ];
        let top = top_artists(&tracks, 2);
        assert_eq!(
            top,
            vec![("Artist A".to_string(), 2), ("Artist B".to_string(), 2)]
        );
    }

    #[test]
    fn test_frequency_table_truncates_to_top_n() {
        let items = ["x", "x", "y", "z"].iter().map(|s| s.to_string());
        let table = frequency_table(items, 1);
        assert_eq!(table, vec![("x".to_string(), 2)]);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(65_000), "1:05");
        assert_eq!(format_duration(3_600_000), "1:00:00");
        assert_eq!(format_duration(0), "0:00");
    }
}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::platform::CatalogAdapter;
use crate::track::{PlaylistDescriptor, Track};

#[derive(Debug)]
pub struct ExportError;
impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Export error")
    }
}
impl std::error::Error for ExportError {}

pub type ExportResult<T> = error_stack::Result<T, ExportError>;

#[derive(
    Debug, Clone, Copy, PartialEq, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString,
)]
pub enum ExportFormat {
    #[strum(serialize = "json")]
    Json,
    #[strum(serialize = "csv")]
    Csv,
    #[strum(serialize = "txt")]
    Txt,
}

/// The on-disk track shape. Identifiers and playback metadata are platform
/// bound and deliberately not exported.
#[derive(Serialize, Deserialize, Clone, Debug)]
struct ExportedTrack {
    name: String,
    artist: String,
    #[serde(default)]
    album: String,
}

impl From<&Track> for ExportedTrack {
    fn from(track: &Track) -> Self {
        Self {
            name: track.name.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ExportedPlaylist {
    name: String,
    #[serde(default)]
    description: String,
    tracks: Vec<ExportedTrack>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlaylistExportFile {
    playlist: ExportedPlaylist,
}

/// Import files may be our own export shape or a bare object with a `tracks`
/// array.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ImportFile {
    Wrapped(PlaylistExportFile),
    Bare(ExportedPlaylistBare),
}

#[derive(Deserialize, Debug)]
struct ExportedPlaylistBare {
    #[serde(default)]
    name: Option<String>,
    tracks: Vec<ExportedTrack>,
}

pub struct ImportedPlaylist {
    pub name: Option<String>,
    pub tracks: Vec<Track>,
}

pub fn export_playlist(
    name: &str,
    description: &str,
    tracks: &[Track],
    format: ExportFormat,
    dir: &Path,
    file_stem: &str,
) -> ExportResult<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.{}", file_stem, timestamp, format));
    match format {
        ExportFormat::Json => {
            let file = PlaylistExportFile {
                playlist: ExportedPlaylist {
                    name: name.to_string(),
                    description: description.to_string(),
                    tracks: tracks.iter().map(ExportedTrack::from).collect(),
                },
            };
            let serialized = serde_json::to_string_pretty(&file)
                .into_report()
                .change_context(ExportError)?;
            fs::write(&path, serialized)
                .into_report()
                .attach_printable(format!("Failed to write {}", path.display()))
                .change_context(ExportError)?;
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_path(&path)
                .into_report()
                .attach_printable(format!("Failed to open {}", path.display()))
                .change_context(ExportError)?;
            writer
                .write_record(["Track Name", "Artist", "Album"])
                .into_report()
                .change_context(ExportError)?;
            for track in tracks {
                writer
                    .write_record([&track.name, &track.artist, &track.album])
                    .into_report()
                    .change_context(ExportError)?;
            }
            writer.flush().into_report().change_context(ExportError)?;
        }
        ExportFormat::Txt => {
            let mut contents = String::new();
            contents.push_str(&format!("Playlist: {}\n", name));
            contents.push_str(&format!("Description: {}\n", description));
            contents.push_str(&format!("Total Tracks: {}\n\n", tracks.len()));
            for (index, track) in tracks.iter().enumerate() {
                contents.push_str(&format!(
                    "{}. {} - {} ({})\n",
                    index + 1,
                    track.name,
                    track.artist,
                    track.album
                ));
            }
            fs::write(&path, contents)
                .into_report()
                .attach_printable(format!("Failed to write {}", path.display()))
                .change_context(ExportError)?;
        }
    }
    Ok(path)
}

pub fn import_playlist(path: &Path) -> ExportResult<ImportedPlaylist> {
    let contents = fs::read_to_string(path)
        .into_report()
        .attach_printable(format!("Failed to read {}", path.display()))
        .change_context(ExportError)?;
    let parsed: ImportFile = serde_json::from_str(&contents)
        .into_report()
        .attach_printable(
            "Import files must be a playlist export or an object with a 'tracks' array",
        )
        .change_context(ExportError)?;
    let (name, tracks) = match parsed {
        ImportFile::Wrapped(file) => (Some(file.playlist.name), file.playlist.tracks),
        ImportFile::Bare(bare) => (bare.name, bare.tracks),
    };
    Ok(ImportedPlaylist {
        name,
        tracks: tracks
            .into_iter()
            .map(|track| Track::new(track.name, track.artist, track.album))
            .collect(),
    })
}

#[derive(Serialize, Deserialize, Debug)]
struct BackupPlaylist {
    id: String,
    name: String,
    tracks_count: usize,
    tracks: Vec<ExportedTrack>,
}

#[derive(Serialize, Deserialize, Debug)]
struct BackupSummary {
    backup_date: String,
    total_playlists: usize,
    playlists: Vec<BackupPlaylist>,
}

/// Writes every playlist the adapter can list as its own JSON file, plus a
/// summary file. A playlist that fails to fetch is reported and skipped; one
/// broken playlist must not sink the backup.
pub async fn backup_all(adapter: &dyn CatalogAdapter, dir: &Path) -> ExportResult<PathBuf> {
    fs::create_dir_all(dir)
        .into_report()
        .attach_printable(format!("Failed to create backup directory {}", dir.display()))
        .change_context(ExportError)?;

    let playlists = adapter
        .list_playlists()
        .await
        .map_err(|error| Report::new(ExportError).attach_printable(error.to_string()))?;

    let mut summary = BackupSummary {
        backup_date: Utc::now().to_rfc3339(),
        total_playlists: playlists.len(),
        playlists: Vec::new(),
    };

    for playlist in playlists {
        let descriptor = PlaylistDescriptor::new(adapter.platform(), playlist.id.clone());
        let tracks = match adapter.fetch_tracks(&descriptor).await {
            Ok(tracks) => tracks,
            Err(error) => {
                println!(
                    "Error backing up playlist {}: {}",
                    playlist.name.yellow(),
                    error
                );
                continue;
            }
        };
        let backup = BackupPlaylist {
            id: playlist.id.clone(),
            name: playlist.name,
            tracks_count: tracks.len(),
            tracks: tracks.iter().map(ExportedTrack::from).collect(),
        };
        let path = dir.join(format!("playlist_{}.json", playlist.id));
        let serialized = serde_json::to_string_pretty(&backup)
            .into_report()
            .change_context(ExportError)?;
        fs::write(&path, serialized)
            .into_report()
            .attach_printable(format!("Failed to write {}", path.display()))
            .change_context(ExportError)?;
        summary.playlists.push(backup);
    }

    let summary_path = dir.join(format!(
        "backup_summary_{}.json",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let serialized = serde_json::to_string_pretty(&summary)
        .into_report()
        .change_context(ExportError)?;
    fs::write(&summary_path, serialized)
        .into_report()
        .attach_printable(format!("Failed to write {}", summary_path.display()))
        .change_context(ExportError)?;
    Ok(summary_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn sample_tracks() -> Vec<Track> {
        vec![
            Track::new(
                "Song A".to_string(),
                "Artist X".to_string(),
                "Album 1".to_string(),
            ),
            Track::new(
                "Song, B".to_string(),
                "Artist \"Y\"".to_string(),
                "".to_string(),
            ),
        ]
    }

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("playsync_export_test_{}", label));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_json_export_round_trips_through_import() {
        let dir = scratch_dir("json");
        let path = export_playlist(
            "My Mix",
            "a description",
            &sample_tracks(),
            ExportFormat::Json,
            &dir,
            "spotify_playlist_abc",
        )
        .unwrap();
        let imported = import_playlist(&path).unwrap();
        assert_eq!(imported.name.as_deref(), Some("My Mix"));
        assert_eq!(imported.tracks.len(), 2);
        assert_eq!(imported.tracks[1].name, "Song, B");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_json_export_shape() {
        let dir = scratch_dir("shape");
        let path = export_playlist(
            "My Mix",
            "",
            &sample_tracks(),
            ExportFormat::Json,
            &dir,
            "shape",
        )
        .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["playlist"]["name"], "My Mix");
        assert_eq!(value["playlist"]["tracks"][0]["artist"], "Artist X");
        assert!(value["playlist"]["tracks"][0].get("id").is_none());
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_csv_export_has_header_and_quoting() {
        let dir = scratch_dir("csv");
        let path = export_playlist(
            "My Mix",
            "",
            &sample_tracks(),
            ExportFormat::Csv,
            &dir,
            "csv",
        )
        .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Track Name,Artist,Album"));
        // Comma-bearing fields must come back intact through a CSV reader.
        let mut reader = csv::Reader::from_path(&path).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&records[1][0], "Song, B");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_txt_export_is_numbered() {
        let dir = scratch_dir("txt");
        let path = export_playlist(
            "My Mix",
            "",
            &sample_tracks(),
            ExportFormat::Txt,
            &dir,
            "txt",
        )
        .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Playlist: My Mix"));
        assert!(contents.contains("1. Song A - Artist X (Album 1)"));
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_import_accepts_bare_tracks_object() {
        let dir = scratch_dir("bare");
        let path = dir.join("bare.json");
        fs::write(
            &path,
            r#"{"tracks": [{"name": "Song A", "artist": "Artist X"}]}"#,
        )
        .unwrap();
        let imported = import_playlist(&path).unwrap();
        assert!(imported.name.is_none());
        assert_eq!(imported.tracks.len(), 1);
        assert_eq!(imported.tracks[0].album, "");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_import_rejects_malformed_file() {
        let dir = scratch_dir("malformed");
        let path = dir.join("malformed.json");
        fs::write(&path, r#"{"not_tracks": []}"#).unwrap();
        assert!(import_playlist(&path).is_err());
        fs::remove_file(path).ok();
    }
}

use std::path::{Path, PathBuf};

use colored::Colorize;
use error_stack::ResultExt;
use inflector::Inflector;
use strum::IntoEnumIterator;

use crate::commands::{
    build_adapter, fetch_playlist_tracks, load_credentials, select_platform, CommandError,
    CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::export::{self, ExportFormat};
use crate::transfer::engine::TransferEngine;

/// Export, import and backup flows: everything that moves playlists between
/// a platform and the local filesystem.
pub struct TransportCommands;

impl TransportCommands {
    pub async fn export() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let platform = select_platform("Platform of the playlist to export")?;
        let prompt_text = format!("{} playlist url or id", platform);
        let source = Dialoguer::input(prompt_text).change_context(CommandError)?;

        let adapter = build_adapter(platform, &credentials)?;
        let tracks = fetch_playlist_tracks(adapter.as_ref(), &source).await?;

        let formats = ExportFormat::iter().collect::<Vec<_>>();
        let options = formats
            .iter()
            .map(|format| format.to_string().to_sentence_case())
            .collect::<Vec<_>>();
        let selection = Dialoguer::select("Export format".to_string(), options, None)
            .change_context(CommandError)?;
        let format = formats[selection];

        let name = Dialoguer::input("Playlist name for the export".to_string())
            .change_context(CommandError)?;
        let file_stem = format!(
            "{}_playlist_{}",
            platform.to_string().to_snake_case(),
            sanitize_stem(&source)
        );
        let path = export::export_playlist(
            &name,
            "",
            &tracks,
            format,
            Path::new(&credentials.export_dir),
            &file_stem,
        )
        .change_context(CommandError)?;
        println!("Exported to {}", path.display().to_string().green());
        Ok(())
    }

    pub async fn import() -> CommandResult<()> {
        let path = Dialoguer::input("Path to the JSON file to import".to_string())
            .change_context(CommandError)?;
        let imported = export::import_playlist(Path::new(&path)).change_context(CommandError)?;
        println!(
            "Read {} tracks from {}",
            imported.tracks.len().to_string().green(),
            path
        );

        let platform = select_platform("Target platform")?;
        let playlist_name = match imported.name {
            Some(name) => name,
            None => Dialoguer::input("Name for the new playlist".to_string())
                .change_context(CommandError)?,
        };
        let credentials = load_credentials()?;
        let target = build_adapter(platform, &credentials)?;
        TransferEngine::transfer_all(&[target.as_ref()], &playlist_name, &imported.tracks).await;
        Ok(())
    }

    pub async fn backup() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let platform = select_platform("Platform to back up")?;
        let adapter = build_adapter(platform, &credentials)?;
        let dir = PathBuf::from(&credentials.export_dir).join(format!(
            "{}_backup",
            platform.to_string().to_snake_case()
        ));
        let summary_path = export::backup_all(adapter.as_ref(), &dir)
            .await
            .change_context(CommandError)?;
        println!(
            "Backup complete, summary at {}",
            summary_path.display().to_string().green()
        );
        Ok(())
    }
}

/// Playlist sources can be full URLs; keep only filename-safe characters for
/// the export stem.
fn sanitize_stem(source: &str) -> String {
    let cleaned = source
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_'))
        .collect::<String>();
    if cleaned.len() > 40 {
        cleaned[..40].to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_stem_strips_url_characters() {
        assert_eq!(
            sanitize_stem("https://open.spotify.com/playlist/6YY?si=1"),
            "httpsopenspotifycomplaylist6YYsi1"
        );
        assert_eq!(sanitize_stem("PLabc_-123"), "PLabc_-123");
    }
}

use colored::Colorize;
use error_stack::ResultExt;

use crate::commands::{
    build_adapter, fetch_playlist_tracks, load_credentials, select_platform, CommandError,
    CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::setops;
use crate::track::Track;
use crate::transfer::engine::TransferEngine;

pub struct LibraryCommands;

impl LibraryCommands {
    /// Collects playlists interactively until the user stops adding them.
    async fn collect_sources() -> CommandResult<Vec<(String, Vec<Track>)>> {
        let credentials = load_credentials()?;
        let mut sources: Vec<(String, Vec<Track>)> = Vec::new();
        loop {
            let platform = select_platform("Playlist platform")?;
            let prompt_text = format!("{} playlist url or id", platform);
            let source = Dialoguer::input(prompt_text).change_context(CommandError)?;
            let adapter = build_adapter(platform, &credentials)?;
            let tracks = fetch_playlist_tracks(adapter.as_ref(), &source).await?;
            println!(
                "Fetched {} tracks from {}",
                tracks.len().to_string().green(),
                platform.to_string().cyan()
            );
            sources.push((format!("{} ({})", platform, source), tracks));
            if sources.len() >= 2 {
                let add_more = Dialoguer::select_yes_or_no("Add another playlist?".to_string())
                    .change_context(CommandError)?;
                if !add_more {
                    break;
                }
            }
        }
        Ok(sources)
    }

    /// Deduplicates several playlists into one new playlist on a chosen
    /// target platform.
    pub async fn merge() -> CommandResult<()> {
        let sources = Self::collect_sources().await?;
        let track_lists = sources
            .iter()
            .map(|(_, tracks)| tracks.clone())
            .collect::<Vec<_>>();
        let merged = setops::merge(&track_lists);
        println!(
            "Merged {} playlists into {} unique tracks",
            sources.len(),
            merged.len().to_string().green()
        );

        let target_platform = select_platform("Target platform for the merged playlist")?;
        let playlist_name = Dialoguer::input("Name for the merged playlist".to_string())
            .change_context(CommandError)?;
        let credentials = load_credentials()?;
        let target = build_adapter(target_platform, &credentials)?;
        TransferEngine::transfer_all(&[target.as_ref()], &playlist_name, &merged).await;
        Ok(())
    }

    /// Reports the tracks shared by all collected playlists and the tracks
    /// unique to each.
    pub async fn compare() -> CommandResult<()> {
        let sources = Self::collect_sources().await?;
        let outcome = setops::compare(&sources)
            .map_err(|error| error_stack::Report::new(CommandError).attach_printable(error.to_string()))?;

        println!(
            "\nTracks in all {} playlists: {}",
            sources.len(),
            outcome.common.len().to_string().green()
        );
        let mut common = outcome.common.iter().collect::<Vec<_>>();
        common.sort();
        for key in common {
            println!("  {} - {}", key.name, key.artist);
        }
        for (label, unique) in &outcome.unique {
            println!(
                "\nOnly in {}: {}",
                label.cyan(),
                unique.len().to_string().yellow()
            );
            let mut keys = unique.iter().collect::<Vec<_>>();
            keys.sort();
            for key in keys {
                println!("  {} - {}", key.name, key.artist);
            }
        }
        Ok(())
    }
}

use colored::Colorize;
use error_stack::ResultExt;

use crate::commands::{
    build_adapter, fetch_playlist_tracks, load_credentials, select_platform, select_platforms,
    CommandError, CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::transfer::engine::TransferEngine;
use crate::transfer::TransferState;

pub struct ConvertCommand;

impl ConvertCommand {
    /// Moves a playlist from one platform to one or more others.
    pub async fn execute() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let source_platform = select_platform("Source platform")?;
        let prompt_text = format!("{} playlist url or id", source_platform);
        let source = Dialoguer::input(prompt_text).change_context(CommandError)?;

        let source_adapter = build_adapter(source_platform, &credentials)?;
        let tracks = fetch_playlist_tracks(source_adapter.as_ref(), &source).await?;
        println!(
            "Fetched {} tracks from {}",
            tracks.len().to_string().green(),
            source_platform.to_string().cyan()
        );

        let target_platforms = select_platforms("Target platforms", Some(source_platform))?;
        let playlist_name =
            Dialoguer::input("Name for the new playlist".to_string()).change_context(CommandError)?;

        let target_adapters = target_platforms
            .into_iter()
            .map(|platform| build_adapter(platform, &credentials))
            .collect::<CommandResult<Vec<_>>>()?;
        let targets = target_adapters
            .iter()
            .map(|adapter| adapter.as_ref())
            .collect::<Vec<_>>();

        let results = TransferEngine::transfer_all(&targets, &playlist_name, &tracks).await;

        let failed_targets = results
            .iter()
            .filter(|result| result.state == TransferState::Failed)
            .count();
        if failed_targets == results.len() && !results.is_empty() {
            println!("{}", "Transfer failed on every target".red());
        }
        Ok(())
    }

    /// Moves several playlists to one target platform in a single run. Each
    /// source becomes its own playlist on the target; a failing source is
    /// reported and the remaining sources still run.
    pub async fn execute_batch() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let mut sources: Vec<(crate::platform::Platform, String, String)> = Vec::new();
        loop {
            let platform = select_platform("Source platform")?;
            let prompt_text = format!("{} playlist url or id", platform);
            let source = Dialoguer::input(prompt_text).change_context(CommandError)?;
            let name = Dialoguer::input("Name for the new playlist".to_string())
                .change_context(CommandError)?;
            sources.push((platform, source, name));
            let add_more = Dialoguer::select_yes_or_no("Add another playlist?".to_string())
                .change_context(CommandError)?;
            if !add_more {
                break;
            }
        }

        let target_platform = select_platform("Target platform")?;
        let target = build_adapter(target_platform, &credentials)?;

        for (platform, source, name) in sources {
            let source_adapter = build_adapter(platform, &credentials)?;
            let tracks = match fetch_playlist_tracks(source_adapter.as_ref(), &source).await {
                Ok(tracks) => tracks,
                Err(error) => {
                    println!("Skipping {}: {:?}", source.yellow(), error);
                    continue;
                }
            };
            println!(
                "Fetched {} tracks from {}",
                tracks.len().to_string().green(),
                platform.to_string().cyan()
            );
            TransferEngine::transfer_all(&[target.as_ref()], &name, &tracks).await;
        }
        Ok(())
    }
}

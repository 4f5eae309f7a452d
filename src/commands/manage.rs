use colored::Colorize;
use error_stack::{IntoReport, ResultExt};
use inflector::Inflector;
use strum::IntoEnumIterator;

use crate::commands::{
    add_native_tracks, build_adapter, load_credentials, select_platform, select_playlist_id,
    CommandError, CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::platform::CatalogAdapter;
use crate::track::PlaylistDescriptor;

#[derive(Debug, Clone, strum_macros::Display, strum_macros::EnumIter)]
pub enum ManageCommands {
    ListPlaylists,
    RenamePlaylist,
    DuplicatePlaylist,
    DeletePlaylist,
}

impl ManageCommands {
    pub async fn execute() -> CommandResult<()> {
        let options = Self::get_options();
        let selection = Dialoguer::select("Select".to_string(), options, None)
            .change_context(CommandError)?;
        let credentials = load_credentials()?;
        let platform = select_platform("Platform")?;
        let adapter = build_adapter(platform, &credentials)?;
        match Self::get_selection(selection) {
            ManageCommands::ListPlaylists => Self::list_playlists(adapter.as_ref()).await,
            ManageCommands::RenamePlaylist => Self::rename_playlist(adapter.as_ref()).await,
            ManageCommands::DuplicatePlaylist => Self::duplicate_playlist(adapter.as_ref()).await,
            ManageCommands::DeletePlaylist => Self::delete_playlist(adapter.as_ref()).await,
        }
    }

    fn get_options() -> Vec<String> {
        Self::iter()
            .map(|element| element.to_string().to_sentence_case())
            .collect::<Vec<_>>()
    }

    fn get_selection(selection: usize) -> Self {
        let options = Self::iter().collect::<Vec<_>>();
        options[selection].clone()
    }

    async fn list_playlists(adapter: &dyn CatalogAdapter) -> CommandResult<()> {
        let playlists = adapter
            .list_playlists()
            .await
            .into_report()
            .change_context(CommandError)?;
        println!(
            "{} playlists on {}",
            playlists.len().to_string().green(),
            adapter.platform().to_string().cyan()
        );
        for playlist in playlists {
            println!(
                "  {} ({} tracks, id={})",
                playlist.name, playlist.tracks_count, playlist.id
            );
        }
        Ok(())
    }

    async fn rename_playlist(adapter: &dyn CatalogAdapter) -> CommandResult<()> {
        let playlist_id = select_playlist_id(adapter).await?;
        let new_name =
            Dialoguer::input("New playlist name".to_string()).change_context(CommandError)?;
        adapter
            .rename_playlist(&playlist_id, &new_name)
            .await
            .into_report()
            .change_context(CommandError)?;
        println!("Playlist renamed to {}", new_name.green());
        Ok(())
    }

    /// Same-platform copy. Tracks already carry native ids, so this adds them
    /// directly instead of going through search resolution.
    async fn duplicate_playlist(adapter: &dyn CatalogAdapter) -> CommandResult<()> {
        let playlist_id = select_playlist_id(adapter).await?;
        let new_name =
            Dialoguer::input("Name for the copy".to_string()).change_context(CommandError)?;
        let descriptor = PlaylistDescriptor::new(adapter.platform(), playlist_id);
        let tracks = adapter
            .fetch_tracks(&descriptor)
            .await
            .into_report()
            .change_context(CommandError)?;
        let new_id = adapter
            .create_playlist(&new_name)
            .await
            .into_report()
            .change_context(CommandError)?;

        let added = add_native_tracks(adapter, &new_id, &tracks).await?;
        println!(
            "Copied {} of {} tracks into {}",
            added.to_string().green(),
            tracks.len(),
            new_name.green()
        );
        Ok(())
    }

    async fn delete_playlist(adapter: &dyn CatalogAdapter) -> CommandResult<()> {
        let playlist_id = select_playlist_id(adapter).await?;
        let confirmed = Dialoguer::select_yes_or_no(format!(
            "Delete playlist {} from {}? This cannot be undone",
            playlist_id,
            adapter.platform()
        ))
        .change_context(CommandError)?;
        if !confirmed {
            println!("{}", "Deletion cancelled".yellow());
            return Ok(());
        }
        adapter
            .delete_playlist(&playlist_id)
            .await
            .into_report()
            .change_context(CommandError)?;
        println!("{}", "Playlist deleted".green());
        Ok(())
    }
}

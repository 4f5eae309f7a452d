use colored::Colorize;
use error_stack::{IntoReport, ResultExt};
use inflector::Inflector;
use strum::IntoEnumIterator;

use crate::commands::{
    add_native_tracks, build_adapter, load_credentials, select_platform, CommandError,
    CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::platform::CatalogAdapter;
use crate::track::Track;

const RESULT_LIMIT: usize = 10;

#[derive(Debug, Clone, strum_macros::Display, strum_macros::EnumIter)]
pub enum DiscoverCommands {
    SearchTracks,
    GetRecommendations,
}

impl DiscoverCommands {
    pub async fn execute() -> CommandResult<()> {
        let options = Self::get_options();
        let selection = Dialoguer::select("Select".to_string(), options, None)
            .change_context(CommandError)?;
        match Self::get_selection(selection) {
            DiscoverCommands::SearchTracks => Self::search_tracks().await,
            DiscoverCommands::GetRecommendations => Self::get_recommendations().await,
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

    fn print_tracks(tracks: &[Track]) {
        for (index, track) in tracks.iter().enumerate() {
            println!(
                "{}. {} - {} ({})",
                index + 1,
                track.name.green(),
                track.artist,
                track.album
            );
        }
    }

    /// Results carry the platform's native ids, so a playlist built from them
    /// is added directly, no search resolution round-trip.
    async fn offer_playlist_from_results(
        adapter: &dyn CatalogAdapter,
        results: &[Track],
    ) -> CommandResult<()> {
        let create = Dialoguer::select_yes_or_no(format!(
            "Create a {} playlist from these results?",
            adapter.platform()
        ))
        .change_context(CommandError)?;
        if !create {
            return Ok(());
        }
        let options = results
            .iter()
            .map(|track| format!("{} - {}", track.name, track.artist))
            .collect::<Vec<_>>();
        let defaults = vec![true; results.len()];
        let selection = Dialoguer::multiselect(
            "Pick the tracks to include".to_string(),
            options,
            Some(&defaults),
            true,
        )
        .change_context(CommandError)?;
        let picked = selection
            .into_iter()
            .map(|index| results[index].clone())
            .collect::<Vec<_>>();

        let name =
            Dialoguer::input("Playlist name".to_string()).change_context(CommandError)?;
        let playlist_id = adapter
            .create_playlist(&name)
            .await
            .into_report()
            .change_context(CommandError)?;
        let added = add_native_tracks(adapter, &playlist_id, &picked).await?;
        println!(
            "Added {} of {} tracks to {}",
            added.to_string().green(),
            picked.len(),
            name.green()
        );
        Ok(())
    }

    async fn search_tracks() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let platform = select_platform("Platform to search")?;
        let query =
            Dialoguer::input("Search query".to_string()).change_context(CommandError)?;
        let adapter = build_adapter(platform, &credentials)?;
        let tracks = adapter
            .search_tracks(&query, RESULT_LIMIT)
            .await
            .into_report()
            .change_context(CommandError)?;
        if tracks.is_empty() {
            println!("No results for '{}'", query.yellow());
            return Ok(());
        }
        Self::print_tracks(&tracks);
        Self::offer_playlist_from_results(adapter.as_ref(), &tracks).await
    }

    async fn get_recommendations() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let platform = select_platform("Platform for recommendations")?;
        let adapter = build_adapter(platform, &credentials)?;

        let query = Dialoguer::input("Seed track (search query)".to_string())
            .change_context(CommandError)?;
        let seed = adapter
            .search_track(&query)
            .await
            .into_report()
            .change_context(CommandError)?
            .ok_or(CommandError)
            .into_report()
            .attach_printable(format!("No track found for '{}'", query))?;
        println!("Seeding from {} - {}", seed.name.green(), seed.artist);

        let recommendations = adapter
            .recommend(&seed, RESULT_LIMIT)
            .await
            .into_report()
            .change_context(CommandError)?;
        if recommendations.is_empty() {
            println!("{}", "No recommendations returned".yellow());
            return Ok(());
        }
        Self::print_tracks(&recommendations);
        Self::offer_playlist_from_results(adapter.as_ref(), &recommendations).await
    }
}

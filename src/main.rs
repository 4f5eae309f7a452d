use std::fmt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{Report, ResultExt};

use crate::commands::analyze::AnalyzeCommand;
use crate::commands::convert::ConvertCommand;
use crate::commands::discover::DiscoverCommands;
use crate::commands::library::LibraryCommands;
use crate::commands::manage::ManageCommands;
use crate::commands::transport::TransportCommands;
use crate::config::Credentials;
use crate::dialoguer::Dialoguer;

mod analysis;
mod commands;
mod config;
mod dialoguer;
mod export;
mod platform;
mod resolver;
mod setops;
mod track;
mod transfer;

#[derive(Debug)]
pub struct PlaySyncError;
impl fmt::Display for PlaySyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaySync error")
    }
}
impl std::error::Error for PlaySyncError {}

pub type PlaySyncResult<T> = error_stack::Result<T, PlaySyncError>;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Move playlists between streaming platforms")]
struct Cli {
    #[command(subcommand)]
    command: PlaySyncCommands,
}

#[derive(Subcommand, Debug, PartialEq, Clone)]
enum PlaySyncCommands {
    /// Stores the platform credentials
    Login,
    /// Reads the current config file
    Config,
    /// Transfer a playlist from one platform to others
    Convert,
    /// Transfer several playlists to one target platform in a single run
    Batch,
    /// Merge several playlists into one deduplicated playlist
    Merge,
    /// Show common and unique tracks across playlists
    Compare,
    /// Show playlist statistics
    Analyze,
    /// Export a playlist to a JSON, CSV or text file
    Export,
    /// Create a playlist from a previously exported JSON file
    Import,
    /// Back up every playlist of a platform to local JSON files
    Backup,
    /// List, rename or delete playlists
    Manage,
    /// Search a platform catalog or get recommendations
    Discover,
}

impl PlaySyncCommands {
    pub async fn execute(&self) -> PlaySyncResult<()> {
        return match self {
            PlaySyncCommands::Login => {
                let mut credentials = Credentials::load().change_context(PlaySyncError)?;
                let prompt_text = "Spotify client id: ".to_string();
                credentials.spotify_client_id =
                    Dialoguer::input(prompt_text).change_context(PlaySyncError)?;
                let prompt_text = "Spotify client secret: ".to_string();
                credentials.spotify_client_secret =
                    Dialoguer::password(prompt_text).change_context(PlaySyncError)?;
                let prompt_text = "Spotify user token (blank to keep): ".to_string();
                let spotify_user_token =
                    Dialoguer::input(prompt_text).change_context(PlaySyncError)?;
                if !spotify_user_token.is_empty() {
                    credentials.spotify_user_token = spotify_user_token;
                }
                let prompt_text = "Apple Music developer token (blank to keep): ".to_string();
                let apple_developer_token =
                    Dialoguer::input(prompt_text).change_context(PlaySyncError)?;
                if !apple_developer_token.is_empty() {
                    credentials.apple_developer_token = apple_developer_token;
                }
                let prompt_text = "Apple Music user token (blank to keep): ".to_string();
                let apple_user_token =
                    Dialoguer::input(prompt_text).change_context(PlaySyncError)?;
                if !apple_user_token.is_empty() {
                    credentials.apple_user_token = apple_user_token;
                }
                let prompt_text = "YouTube Music auth headers file (blank to keep): ".to_string();
                let youtube_auth_file =
                    Dialoguer::input(prompt_text).change_context(PlaySyncError)?;
                if !youtube_auth_file.is_empty() {
                    credentials.youtube_auth_file = youtube_auth_file;
                }
                credentials
                    .save_config_file()
                    .change_context(PlaySyncError)?;
                println!(
                    "Credentials stored at {}",
                    Credentials::get_config_file_path()
                        .change_context(PlaySyncError)?
                        .green()
                );
                Ok(())
            }
            PlaySyncCommands::Config => {
                let credentials = Credentials::load().change_context(PlaySyncError)?;
                println!("Current config:\n{:#?}", credentials);
                Ok(())
            }
            PlaySyncCommands::Convert => {
                ConvertCommand::execute().await.change_context(PlaySyncError)
            }
            PlaySyncCommands::Batch => ConvertCommand::execute_batch()
                .await
                .change_context(PlaySyncError),
            PlaySyncCommands::Merge => {
                LibraryCommands::merge().await.change_context(PlaySyncError)
            }
            PlaySyncCommands::Compare => LibraryCommands::compare()
                .await
                .change_context(PlaySyncError),
            PlaySyncCommands::Analyze => {
                AnalyzeCommand::execute().await.change_context(PlaySyncError)
            }
            PlaySyncCommands::Export => TransportCommands::export()
                .await
                .change_context(PlaySyncError),
            PlaySyncCommands::Import => TransportCommands::import()
                .await
                .change_context(PlaySyncError),
            PlaySyncCommands::Backup => TransportCommands::backup()
                .await
                .change_context(PlaySyncError),
            PlaySyncCommands::Manage => {
                ManageCommands::execute().await.change_context(PlaySyncError)
            }
            PlaySyncCommands::Discover => DiscoverCommands::execute()
                .await
                .change_context(PlaySyncError),
        };
    }

}

pub struct Suggestion(String);

impl Suggestion {
    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

async fn run() -> PlaySyncResult<()> {
    let cli = Cli::parse();

    Suggestion::set_report();

    cli.command.execute().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> PlaySyncResult<()> {
    run().await
}

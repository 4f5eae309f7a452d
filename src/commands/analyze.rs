use error_stack::{IntoReport, ResultExt};

use crate::commands::{
    build_adapter, load_credentials, select_platform, CommandError, CommandResult,
};
use crate::dialoguer::Dialoguer;
use crate::track::PlaylistDescriptor;

pub struct AnalyzeCommand;

impl AnalyzeCommand {
    /// Prints playlist statistics: totals, top artists and, where the
    /// platform provides them, genres and audio feature averages.
    pub async fn execute() -> CommandResult<()> {
        let credentials = load_credentials()?;
        let platform = select_platform("Platform of the playlist to analyze")?;
        let prompt_text = format!("{} playlist url or id", platform);
        let source = Dialoguer::input(prompt_text).change_context(CommandError)?;

        let adapter = build_adapter(platform, &credentials)?;
        let descriptor = PlaylistDescriptor::new(platform, source);
        let stats = adapter
            .analyze_playlist(&descriptor)
            .await
            .into_report()
            .change_context(CommandError)?;
        println!("{}", stats.render_table());
        Ok(())
    }
}

use super::embedded_messages;
use crate::playback::error::MusicError;
use crate::{CommandResult, Context};

/// Resume the paused track
#[poise::command(slash_command, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let controller = ctx.data().controller.clone();
    match controller.resume(guild_id).await {
        Ok(track) => ctx.send(embedded_messages::resumed(&track)).await?,
        Err(err) => ctx.send(embedded_messages::music_error(err)).await?,
    };

    Ok(())
}

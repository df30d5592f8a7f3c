use super::embedded_messages;
use crate::playback::error::MusicError;
use crate::{CommandResult, Context};

/// Stop playback, clear the queue, and leave the voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let controller = ctx.data().controller.clone();
    match controller.stop(guild_id).await {
        Ok(cleared) => ctx.send(embedded_messages::stopped(cleared)).await?,
        Err(err) => ctx.send(embedded_messages::music_error(err)).await?,
    };

    Ok(())
}

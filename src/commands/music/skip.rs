use super::embedded_messages;
use crate::playback::error::MusicError;
use crate::{CommandResult, Context};

/// Skip the current track and play the next one in the queue
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    // Starting the next track can involve a resolver round-trip
    ctx.defer().await?;

    let controller = ctx.data().controller.clone();
    match controller.skip(guild_id).await {
        Ok(track) => ctx.send(embedded_messages::skipped(&track)).await?,
        Err(err) => ctx.send(embedded_messages::music_error(err)).await?,
    };

    Ok(())
}

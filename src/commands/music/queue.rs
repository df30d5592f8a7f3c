use poise::CreateReply;

use super::embedded_messages;
use crate::playback::error::MusicError;
use crate::{CommandResult, Context};

/// Show the current track and the queued ones
#[poise::command(slash_command, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let controller = ctx.data().controller.clone();
    let view = controller.queue_view(guild_id).await;

    ctx.send(CreateReply::default().embed(embedded_messages::music_queue(&view)))
        .await?;

    Ok(())
}

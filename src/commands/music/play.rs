use poise::CreateReply;
use tracing::info;

use super::{embedded_messages, user_voice_channel};
use crate::playback::controller::PlayOutcome;
use crate::playback::error::MusicError;
use crate::{CommandResult, Context};

/// Play a track from a URL or a search query
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URL or search query"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    // Get the user's voice channel
    let voice_channel = match user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)
    {
        Ok(channel_id) => channel_id,
        Err(err) => {
            ctx.send(embedded_messages::user_not_in_voice_channel(err))
                .await?;
            return Ok(());
        }
    };

    // Defer the response since resolution might take a moment
    ctx.defer().await?;

    let controller = ctx.data().controller.clone();
    let outcome = controller
        .play(guild_id, voice_channel, ctx.channel_id(), &query)
        .await;

    match outcome {
        Ok(PlayOutcome::Started(track)) => {
            ctx.send(CreateReply::default().embed(embedded_messages::now_playing(&track)))
                .await?;
        }
        Ok(PlayOutcome::Queued { track, position }) => {
            ctx.send(
                CreateReply::default().embed(embedded_messages::added_to_queue(&track, position)),
            )
            .await?;
        }
        Ok(PlayOutcome::Failed) => {
            ctx.send(embedded_messages::nothing_playable()).await?;
        }
        Err(err) => {
            ctx.send(embedded_messages::failed_to_play(err)).await?;
        }
    }

    Ok(())
}

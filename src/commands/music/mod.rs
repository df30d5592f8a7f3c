//! Music playback commands and their shared plumbing.

pub mod embedded_messages;
pub mod pause;
pub mod play;
pub mod queue;
pub mod resume;
pub mod skip;
pub mod stop;

pub use pause::pause;
pub use play::play;
pub use queue::queue;
pub use resume::resume;
pub use skip::skip;
pub use stop::stop;

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::playback::error::MusicError;
use crate::playback::events::{NoticeKind, PlayerNotice};

/// Format a duration into a human-readable string (e.g., "3:45" or "1:23:45")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Voice channel the user currently occupies, from the gateway cache.
pub(crate) fn user_voice_channel(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> Result<serenity::ChannelId, MusicError> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::UserNotInVoiceChannel)
}

/// Forward auto-advance notices to the text channel that issued the most
/// recent play command for the guild. Runs until the controller drops its
/// notice sender.
pub fn spawn_notice_forwarder(
    http: Arc<serenity::Http>,
    mut notices: mpsc::UnboundedReceiver<PlayerNotice>,
) {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            let embed = match &notice.kind {
                NoticeKind::NowPlaying(track) => {
                    info!(
                        "Announcing next track for guild {}: {}",
                        notice.guild_id, track.title
                    );
                    embedded_messages::now_playing(track)
                }
                NoticeKind::QueueExhausted => embedded_messages::queue_finished(),
            };

            let message = serenity::CreateMessage::new().embed(embed);
            if let Err(err) = notice.channel_id.send_message(&http, message).await {
                warn!(
                    "Failed to announce in channel {} for guild {}: {}",
                    notice.channel_id, notice.guild_id, err
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::format_duration;
    use std::time::Duration;
    use test_case::test_case;

    #[test_case(0 => "0:00"; "zero")]
    #[test_case(59 => "0:59"; "seconds only")]
    #[test_case(225 => "3:45"; "minutes")]
    #[test_case(5025 => "1:23:45"; "hours")]
    fn formats_durations(secs: u64) -> String {
        format_duration(Duration::from_secs(secs))
    }
}

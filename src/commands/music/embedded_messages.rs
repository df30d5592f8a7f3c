//! Embed builders for every music command reply and notice.

use ::serenity::all::CreateEmbed;
use poise::CreateReply;
use std::time::Duration;

use super::format_duration;
use crate::playback::controller::QueueView;
use crate::playback::error::MusicError;
use crate::playback::registry::PlayerState;
use crate::playback::track::Track;

/// Pull the display fields out of a track for the standard embeds.
fn parse_track(track: &Track) -> (String, String, String) {
    let title = track.title.clone();
    let url = track.page_url.clone().unwrap_or_else(|| "#".to_string());
    let duration_str = track
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    (title, url, duration_str)
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &Track) -> CreateEmbed {
    let (title, url, duration_str) = parse_track(track);

    CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(0x00ff00)
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(track: &Track, position: usize) -> CreateEmbed {
    let (title, url, duration_str) = parse_track(track);

    CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .field("Position", format!("`#{}`", position), true)
        .color(0x00ff00)
}

/// Create an embed for the music queue
pub fn music_queue(view: &QueueView) -> CreateEmbed {
    let mut description = String::new();

    match &view.now_playing {
        Some(track) => {
            let heading = if view.state == PlayerState::Paused {
                "**⏸️ Paused**\n"
            } else {
                "**🎵 Now Playing**\n"
            };
            description.push_str(heading);
            description.push_str(&format!(
                "**[{}]({})**",
                track.title,
                track.page_url.as_deref().unwrap_or("#")
            ));
            if let Some(duration) = track.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            description.push_str("\n\n");
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if view.pending.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!("**📋 Queue - {} tracks**\n", view.pending.len()));
        for (index, track) in view.pending.iter().enumerate() {
            // Track number emoji (1-10) or a bullet past that
            let number = if index < 10 {
                format!("{}\u{FE0F}\u{20E3}", index + 1)
            } else {
                "•".to_string()
            };

            description.push_str(&format!(
                "{} [{}]({})",
                number,
                track.title,
                track.page_url.as_deref().unwrap_or("#")
            ));
            if let Some(duration) = track.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            description.push('\n');
        }

        let total_duration: Duration = view.pending.iter().filter_map(|track| track.duration).sum();
        if total_duration.as_secs() > 0 {
            description.push_str(&format!(
                "\n**⏱️ Total Duration:** `{}`",
                format_duration(total_duration)
            ));
        }
    }

    CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(description)
        .color(0x00ff00)
}

/// Create an embed for when the queue drained and the bot left voice
pub fn queue_finished() -> CreateEmbed {
    CreateEmbed::new()
        .title("📭 Queue Finished")
        .description("Nothing left to play, leaving the voice channel")
        .color(0x00ff00)
}

/// Create an embed for when a user is not connected to a voice channel
pub fn user_not_in_voice_channel(err: MusicError) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(format!("You need to be in a voice channel: {}", err))
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Create an embed for when a track is paused
pub fn paused(track: &Track) -> CreateReply {
    let (title, url, _) = parse_track(track);

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏸️ Paused")
            .description(format!("Paused [{}]({})", title, url))
            .color(0x00ff00),
    )
}

/// Create an embed for when a track is resumed
pub fn resumed(track: &Track) -> CreateReply {
    let (title, url, _) = parse_track(track);

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("▶️ Resumed")
            .description(format!("Resumed [{}]({})", title, url))
            .color(0x00ff00),
    )
}

/// Create an embed for when a track is skipped
pub fn skipped(track: &Track) -> CreateReply {
    let (title, url, _) = parse_track(track);

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏭️ Skipped")
            .description(format!("Skipped [{}]({})", title, url))
            .color(0x00ff00),
    )
}

/// Create an embed for when the bot stops playing music
pub fn stopped(cleared: usize) -> CreateReply {
    let description = match cleared {
        0 => "Playback stopped".to_string(),
        1 => "Playback stopped and 1 queued track dropped".to_string(),
        n => format!("Playback stopped and {} queued tracks dropped", n),
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏹️ Stopped")
            .description(description)
            .color(0x00ff00),
    )
}

/// Create an embed for when a play request produced nothing playable
pub fn nothing_playable() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description("Could not play that: the track failed to resolve")
            .color(0xff0000),
    )
}

/// Create an embed for when the bot fails to process a play request
pub fn failed_to_play(err: MusicError) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(format!("Failed to play: {}", err))
            .color(0xff0000),
    )
}

/// Create an embed for a failed playback command (pause, skip, ...)
pub fn music_error(err: MusicError) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(err.to_string())
            .color(0xff0000),
    )
}

//! Events crossing from the audio pipeline back into the controller.
//!
//! Track completions originate on the voice driver's threads. They are
//! never acted on there: each one is posted through an mpsc inbox and
//! handled on the controller's own tasks, carrying the generation token
//! of the track it belongs to so stale completions can be discarded.

use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::mpsc;

use crate::playback::track::Track;

/// Monotonic token identifying one playback epoch within a guild.
///
/// Bumped on every track start, skip, stop, and completion-claim. Async
/// results minted under an older value are stale and must be ignored.
pub type Generation = u64;

/// Inbox message: the audio pipeline finished a track.
#[derive(Debug, Clone)]
pub struct TrackEnded {
    pub guild_id: GuildId,
    pub generation: Generation,
    /// Present when the pipeline failed mid-stream rather than reaching
    /// the natural end of the stream. Both cases advance the queue.
    pub error: Option<String>,
}

/// One-shot completion handle passed to [`VoiceSession::play`].
///
/// Fires at most one effective completion: the transport may report the
/// end of a track more than once (end and error, or an end emitted by an
/// explicit stop), but every report carries the same generation, and the
/// controller acts on a generation only once.
///
/// [`VoiceSession::play`]: crate::playback::session::VoiceSession::play
#[derive(Debug, Clone)]
pub struct TrackDone {
    tx: mpsc::UnboundedSender<TrackEnded>,
    guild_id: GuildId,
    generation: Generation,
}

impl TrackDone {
    pub fn new(
        tx: mpsc::UnboundedSender<TrackEnded>,
        guild_id: GuildId,
        generation: Generation,
    ) -> Self {
        Self {
            tx,
            guild_id,
            generation,
        }
    }

    /// Report the end of the track. Dropped silently if the controller
    /// has already shut down.
    pub fn notify(&self, error: Option<String>) {
        let _ = self.tx.send(TrackEnded {
            guild_id: self.guild_id,
            generation: self.generation,
            error,
        });
    }
}

/// What an auto-advance notice announces.
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
    /// A new track started without a command asking for it.
    NowPlaying(Track),
    /// The queue drained and the bot left the voice channel.
    QueueExhausted,
}

/// User-facing notification produced by auto-advance, delivered outside
/// the command/response cycle to the text channel that issued the most
/// recent play command.
#[derive(Debug, Clone)]
pub struct PlayerNotice {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub kind: NoticeKind,
}

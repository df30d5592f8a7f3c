//! Voice-channel membership and the playback device for one guild.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{HttpRequest, Input};
use songbird::tracks::{PlayMode, TrackHandle};
use songbird::{Call, Event, EventContext, Songbird, TrackEvent};
use tracing::{debug, warn};

use crate::playback::error::{MusicError, MusicResult};
use crate::playback::events::TrackDone;

/// Snapshot of a session's connection and playback state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub is_connected: bool,
    pub is_playing: bool,
    pub is_paused: bool,
}

/// Connection and playback surface the controller drives for one guild.
///
/// The production implementation talks to Songbird; tests substitute a
/// fake to exercise the state machine without a live voice transport.
#[async_trait]
pub trait VoiceSession: Send + Sync {
    /// Join the channel, or move to it when connected elsewhere. Joining
    /// the channel the session already occupies is a no-op.
    async fn connect_or_move(&self, channel_id: ChannelId) -> MusicResult<()>;

    /// Begin streaming `stream_url` into the connected channel.
    ///
    /// `done` reports the end of the track: natural end of stream or a
    /// pipeline error, never a pause. The transport may also report an
    /// end caused by an explicit stop; callers make those stale by
    /// bumping the generation before stopping.
    async fn play(&self, stream_url: &str, done: TrackDone) -> MusicResult<()>;

    /// Pause the active track.
    async fn pause(&self) -> MusicResult<()>;

    /// Resume a paused track.
    async fn resume(&self) -> MusicResult<()>;

    /// Halt the active track without leaving the channel.
    async fn stop(&self) -> MusicResult<()>;

    /// Leave the voice channel, halting any playback. No-op when the
    /// session is not connected.
    async fn disconnect(&self) -> MusicResult<()>;

    async fn status(&self) -> SessionStatus;
}

/// [`VoiceSession`] backed by a Songbird voice connection.
pub struct SongbirdSession {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
    current: SerenityMutex<Option<TrackHandle>>,
}

impl SongbirdSession {
    pub fn new(manager: Arc<Songbird>, guild_id: GuildId, http_client: reqwest::Client) -> Self {
        Self {
            guild_id,
            manager,
            http_client,
            current: SerenityMutex::new(None),
        }
    }

    fn call(&self) -> MusicResult<Arc<SerenityMutex<Call>>> {
        self.manager
            .get(self.guild_id)
            .ok_or(MusicError::NotConnected)
    }
}

#[async_trait]
impl VoiceSession for SongbirdSession {
    async fn connect_or_move(&self, channel_id: ChannelId) -> MusicResult<()> {
        if let Some(call) = self.manager.get(self.guild_id) {
            if call.lock().await.current_channel() == Some(channel_id.into()) {
                debug!(
                    "Already connected to channel {} for guild {}",
                    channel_id, self.guild_id
                );
                return Ok(());
            }
        }

        self.manager
            .join(self.guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|err| MusicError::JoinError(err.to_string()))
    }

    async fn play(&self, stream_url: &str, done: TrackDone) -> MusicResult<()> {
        let call = self.call()?;

        // Lazy HTTP input; the driver restarts the request on transient
        // stream hiccups.
        let input: Input = HttpRequest::new(self.http_client.clone(), stream_url.to_string()).into();

        let mut handler = call.lock().await;
        let track_handle = handler.play_input(input);

        // End and Error are separate Songbird events for the same track;
        // the shared flag collapses them into one completion report.
        let fired = Arc::new(AtomicBool::new(false));
        track_handle
            .add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    done: done.clone(),
                    fired: fired.clone(),
                    failure: false,
                },
            )
            .map_err(|err| MusicError::PlaybackError(err.to_string()))?;
        track_handle
            .add_event(
                Event::Track(TrackEvent::Error),
                TrackEndNotifier {
                    done,
                    fired,
                    failure: true,
                },
            )
            .map_err(|err| MusicError::PlaybackError(err.to_string()))?;

        *self.current.lock().await = Some(track_handle);
        Ok(())
    }

    async fn pause(&self) -> MusicResult<()> {
        let current = self.current.lock().await;
        let track = current.as_ref().ok_or(MusicError::NothingPlaying)?;
        track
            .pause()
            .map_err(|err| MusicError::PlaybackError(err.to_string()))
    }

    async fn resume(&self) -> MusicResult<()> {
        let current = self.current.lock().await;
        let track = current.as_ref().ok_or(MusicError::NothingPlaying)?;
        track
            .play()
            .map_err(|err| MusicError::PlaybackError(err.to_string()))
    }

    async fn stop(&self) -> MusicResult<()> {
        if let Some(track) = self.current.lock().await.take() {
            track
                .stop()
                .map_err(|err| MusicError::PlaybackError(err.to_string()))?;
        }
        Ok(())
    }

    async fn disconnect(&self) -> MusicResult<()> {
        self.current.lock().await.take();
        if self.manager.get(self.guild_id).is_some() {
            self.manager
                .remove(self.guild_id)
                .await
                .map_err(|err| MusicError::JoinError(err.to_string()))?;
        }
        Ok(())
    }

    async fn status(&self) -> SessionStatus {
        let is_connected = self.manager.get(self.guild_id).is_some();

        let (is_playing, is_paused) = match self.current.lock().await.as_ref() {
            Some(track) => match track.get_info().await {
                Ok(info) => (
                    info.playing == PlayMode::Play,
                    info.playing == PlayMode::Pause,
                ),
                // The driver already dropped the track.
                Err(_) => (false, false),
            },
            None => (false, false),
        };

        SessionStatus {
            is_connected,
            is_playing,
            is_paused,
        }
    }
}

/// Bridges Songbird's track events onto the controller inbox.
struct TrackEndNotifier {
    done: TrackDone,
    fired: Arc<AtomicBool>,
    failure: bool,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if self.fired.swap(true, Ordering::SeqCst) {
            return None;
        }

        let error = if self.failure {
            let state = match ctx {
                EventContext::Track(list) => list
                    .first()
                    .map(|(state, _)| format!("{:?}", state.playing)),
                _ => None,
            };
            let detail = state.unwrap_or_else(|| "unknown state".to_string());
            warn!("Track errored ({})", detail);
            Some(detail)
        } else {
            None
        };

        self.done.notify(error);
        None
    }
}

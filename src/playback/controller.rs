//! The per-guild playback state machine.
//!
//! The controller owns every queue transition. Command handlers enqueue,
//! clear, and flip pause state through the methods here; the advance loop
//! is the only dequeuer. All mutation happens under the guild's player
//! lock, and the lock is released across every resolver await so a stop
//! can always get in.

use std::sync::Arc;

use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::playback::error::{MusicError, MusicResult};
use crate::playback::events::{Generation, NoticeKind, PlayerNotice, TrackDone, TrackEnded};
use crate::playback::registry::{GuildPlayer, PlayerRegistry, PlayerState, SessionFactory};
use crate::playback::resolver::StreamResolver;
use crate::playback::track::{Track, TrackSource};

/// What a play request did with the track.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Playback started with this track.
    Started(Track),
    /// Something was already playing; the track waits at `position`
    /// (1-based) in the queue.
    Queued { track: Track, position: usize },
    /// Nothing playable came out of the request: the track failed to
    /// resolve at playback time, or a stop superseded it.
    Failed,
}

/// Snapshot of a guild's playback for the queue command.
#[derive(Debug, Clone, Default)]
pub struct QueueView {
    pub now_playing: Option<Track>,
    pub pending: Vec<Track>,
    pub state: PlayerState,
}

/// Where an advance loop ended up.
enum AdvanceOutcome {
    Started(Track),
    /// The queue drained; the session was disconnected. `skipped` counts
    /// tracks dropped for resolution or start failures along the way.
    QueueDrained { skipped: usize },
    /// A newer epoch (stop or skip) owns the guild now; this loop's
    /// results were discarded.
    Superseded,
}

/// Drives every guild's queue, session, and state transitions.
pub struct PlaybackController {
    registry: PlayerRegistry,
    resolver: Arc<dyn StreamResolver>,
    events_tx: mpsc::UnboundedSender<TrackEnded>,
    notices: mpsc::UnboundedSender<PlayerNotice>,
}

impl PlaybackController {
    /// Build a controller along with the notice stream it emits
    /// auto-advance announcements on. Spawns the completion-event pump.
    pub fn new(
        sessions: SessionFactory,
        resolver: Arc<dyn StreamResolver>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<PlayerNotice>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();

        let controller = Arc::new(Self {
            registry: PlayerRegistry::new(sessions),
            resolver,
            events_tx,
            notices: notices_tx,
        });

        controller.clone().spawn_event_pump(events_rx);
        (controller, notices_rx)
    }

    /// Drain completion events. Each event is handled on its own task so
    /// one guild's slow resolution never holds up another guild's.
    fn spawn_event_pump(self: Arc<Self>, mut events_rx: mpsc::UnboundedReceiver<TrackEnded>) {
        tokio::spawn(async move {
            while let Some(ended) = events_rx.recv().await {
                let controller = Arc::clone(&self);
                tokio::spawn(async move {
                    controller.handle_track_ended(ended).await;
                });
            }
            debug!("Completion inbox closed, event pump exiting");
        });
    }

    /// Enqueue a track for the guild, connecting to the caller's voice
    /// channel and starting playback when the guild is idle.
    ///
    /// Search queries resolve before the queue is touched, so a dead
    /// query surfaces to the requester instead of being queued blind.
    /// URLs defer resolution to the advance loop.
    pub async fn play(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        query: &str,
    ) -> MusicResult<PlayOutcome> {
        let source = TrackSource::from_query(query);
        let track = match &source {
            TrackSource::Search(_) => {
                let resolved = self.resolver.resolve(&source).await?;
                Track::from_resolved(source.clone(), resolved)
            }
            TrackSource::Url(url) => Track::from_url(url.clone()),
        };

        let player = self.registry.get_or_create(guild_id);
        let (claimed, position) = {
            let mut player = player.lock().await;
            player.session.connect_or_move(voice_channel).await?;
            player.notify_channel = Some(text_channel);
            player.queue.enqueue(track.clone());
            info!("Added track to queue for guild {}: {}", guild_id, track.title);

            if player.state == PlayerState::Idle {
                // Claim the advance inside the same critical section as
                // the enqueue: a second play racing this one sees Loading
                // and can only append.
                player.state = PlayerState::Loading;
                (Some(player.generation()), 0)
            } else {
                (None, player.queue.len())
            }
        };

        if let Some(token) = claimed {
            return Ok(match self.advance(&player, token).await {
                AdvanceOutcome::Started(track) => PlayOutcome::Started(track),
                AdvanceOutcome::QueueDrained { .. } | AdvanceOutcome::Superseded => {
                    PlayOutcome::Failed
                }
            });
        }

        Ok(PlayOutcome::Queued { track, position })
    }

    /// Stop the active track and move straight to the next one. Returns
    /// the skipped track; the follow-up announcement arrives as a notice.
    pub async fn skip(&self, guild_id: GuildId) -> MusicResult<Track> {
        let player = self.lookup(guild_id)?;
        let (skipped, token) = {
            let mut player = player.lock().await;
            if !matches!(player.state, PlayerState::Playing | PlayerState::Paused) {
                return Err(MusicError::NothingPlaying);
            }
            let skipped = player.now_playing.take().ok_or(MusicError::NothingPlaying)?;

            // The halted track still reports a completion; making it
            // stale first keeps it from advancing the queue twice.
            let token = player.bump_generation();
            if let Err(err) = player.session.stop().await {
                // The advance replaces the track either way.
                warn!("Failed to halt current track for guild {}: {}", guild_id, err);
            }
            player.state = PlayerState::Loading;
            info!("Skipped track for guild {}: {}", guild_id, skipped.title);
            (skipped, token)
        };

        self.advance_and_announce(&player, token).await;
        Ok(skipped)
    }

    /// Pause the current track.
    pub async fn pause(&self, guild_id: GuildId) -> MusicResult<Track> {
        let player = self.lookup(guild_id)?;
        let mut player = player.lock().await;
        match player.state {
            PlayerState::Playing => {
                player.session.pause().await?;
                player.state = PlayerState::Paused;
                let track = player.now_playing.clone().ok_or(MusicError::NothingPlaying)?;
                debug!("Paused playback for guild {}", guild_id);
                Ok(track)
            }
            PlayerState::Paused => Err(MusicError::AlreadyPaused),
            _ => Err(MusicError::NothingPlaying),
        }
    }

    /// Resume a paused track.
    pub async fn resume(&self, guild_id: GuildId) -> MusicResult<Track> {
        let player = self.lookup(guild_id)?;
        let mut player = player.lock().await;
        match player.state {
            PlayerState::Paused => {
                player.session.resume().await?;
                player.state = PlayerState::Playing;
                let track = player.now_playing.clone().ok_or(MusicError::NothingPlaying)?;
                debug!("Resumed playback for guild {}", guild_id);
                Ok(track)
            }
            _ => Err(MusicError::NotPaused),
        }
    }

    /// Halt playback, drop every pending track, and leave the channel.
    /// Returns how many pending tracks were dropped. Stop never
    /// auto-advances: in-flight completions and resolutions for this
    /// guild become stale before the session is touched.
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<usize> {
        let player = self.lookup(guild_id)?;
        let mut player = player.lock().await;
        if !player.session.status().await.is_connected {
            return Err(MusicError::NotConnected);
        }

        player.bump_generation();
        let cleared = player.queue.clear();
        player.now_playing = None;
        if let Err(err) = player.session.stop().await {
            // Disconnecting tears the track down regardless.
            warn!("Failed to halt current track for guild {}: {}", guild_id, err);
        }

        player.state = PlayerState::Disconnecting;
        let disconnected = player.session.disconnect().await;
        // Back to Idle even on failure, so the guild is not wedged in
        // Disconnecting; a later play claims the advance as usual.
        player.state = PlayerState::Idle;
        disconnected?;

        info!("Stopped playback for guild {} ({} pending dropped)", guild_id, cleared);
        Ok(cleared)
    }

    /// Snapshot of the guild's current track and pending queue.
    pub async fn queue_view(&self, guild_id: GuildId) -> QueueView {
        match self.registry.get(guild_id) {
            None => QueueView::default(),
            Some(player) => {
                let player = player.lock().await;
                QueueView {
                    now_playing: player.now_playing.clone(),
                    pending: player.queue.snapshot(),
                    state: player.state,
                }
            }
        }
    }

    fn lookup(&self, guild_id: GuildId) -> MusicResult<Arc<Mutex<GuildPlayer>>> {
        self.registry.get(guild_id).ok_or(MusicError::NotConnected)
    }

    /// Completion event from the audio pipeline. Stale generations are
    /// dropped; a current one claims the advance and walks the queue.
    async fn handle_track_ended(&self, ended: TrackEnded) {
        let Some(player) = self.registry.get(ended.guild_id) else {
            debug!("Completion event for unknown guild {}", ended.guild_id);
            return;
        };

        let token = {
            let mut player = player.lock().await;
            if ended.generation != player.generation() {
                debug!(
                    "Ignoring stale completion (generation {} != {}) for guild {}",
                    ended.generation,
                    player.generation(),
                    ended.guild_id
                );
                return;
            }
            if let Some(error) = &ended.error {
                // Mid-stream pipeline failures advance like a natural end.
                warn!("Playback failed for guild {}: {}", ended.guild_id, error);
            }
            player.now_playing = None;
            player.state = PlayerState::Loading;
            // Claim the advance: any duplicate report of this completion
            // is stale from here on.
            player.bump_generation()
        };

        self.advance_and_announce(&player, token).await;
    }

    /// Run the advance loop, then post the resulting notice (new track or
    /// queue finished) to the guild's announcement channel.
    async fn advance_and_announce(&self, player: &Arc<Mutex<GuildPlayer>>, token: Generation) {
        let outcome = self.advance(player, token).await;

        let (guild_id, channel) = {
            let player = player.lock().await;
            (player.guild_id, player.notify_channel)
        };
        let Some(channel_id) = channel else { return };

        let kind = match outcome {
            AdvanceOutcome::Started(track) => NoticeKind::NowPlaying(track),
            AdvanceOutcome::QueueDrained { skipped } => {
                if skipped > 0 {
                    info!(
                        "Queue drained for guild {} after skipping {} unplayable tracks",
                        guild_id, skipped
                    );
                }
                NoticeKind::QueueExhausted
            }
            AdvanceOutcome::Superseded => return,
        };

        let _ = self.notices.send(PlayerNotice {
            guild_id,
            channel_id,
            kind,
        });
    }

    /// Pop, resolve, and start tracks until one plays or the queue
    /// drains. Iterative on purpose: a pathological all-fail queue walks
    /// this loop once per track instead of growing the stack.
    ///
    /// `token` is the epoch the caller claimed the advance under.
    /// Resolution happens outside the player lock, and the token is
    /// re-validated at every lock acquisition; a mismatch means a stop,
    /// skip, or newer play owns the guild now and this loop's work is
    /// discarded without touching the session.
    async fn advance(
        &self,
        player: &Arc<Mutex<GuildPlayer>>,
        mut token: Generation,
    ) -> AdvanceOutcome {
        let mut skipped = 0usize;

        loop {
            let mut track = {
                let mut player = player.lock().await;
                if player.generation() != token {
                    return AdvanceOutcome::Superseded;
                }
                match player.queue.dequeue_head() {
                    Some(track) => track,
                    None => {
                        player.state = PlayerState::Disconnecting;
                        if let Err(err) = player.session.disconnect().await {
                            warn!(
                                "Disconnect after queue drain failed for guild {}: {}",
                                player.guild_id, err
                            );
                        }
                        player.state = PlayerState::Idle;
                        player.now_playing = None;
                        info!("Queue exhausted for guild {}, disconnected", player.guild_id);
                        return AdvanceOutcome::QueueDrained { skipped };
                    }
                }
            };

            let stream_url = match track.stream_url.clone() {
                Some(url) => url,
                None => match self.resolver.resolve(&track.source).await {
                    Ok(resolved) => {
                        let url = resolved.stream_url.clone();
                        track.apply_resolution(resolved);
                        url
                    }
                    Err(err) => {
                        info!("Skipping unplayable track `{}`: {}", track.title, err);
                        skipped += 1;
                        continue;
                    }
                },
            };

            let mut player = player.lock().await;
            if player.generation() != token {
                debug!("Dropping stale resolution for guild {}", player.guild_id);
                return AdvanceOutcome::Superseded;
            }

            // Minting the track's completion handle opens a new epoch;
            // the loop owns it, so a failed start keeps walking the queue.
            token = player.bump_generation();
            let done = TrackDone::new(self.events_tx.clone(), player.guild_id, token);
            match player.session.play(&stream_url, done).await {
                Ok(()) => {
                    player.state = PlayerState::Playing;
                    player.now_playing = Some(track.clone());
                    info!("Now playing for guild {}: {}", player.guild_id, track.title);
                    return AdvanceOutcome::Started(track);
                }
                Err(err) => {
                    warn!(
                        "Failed to start `{}` for guild {}: {}",
                        track.title, player.guild_id, err
                    );
                    skipped += 1;
                }
            }
        }
    }
}

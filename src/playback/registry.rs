//! Owned map of per-guild playback state.
//!
//! Replaces ambient global queue/session maps: the registry is a plain
//! struct owned by the controller and injected wherever it is needed, so
//! every piece of guild state has one explicit owner.

use std::sync::Arc;

use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::Mutex;

use crate::playback::events::Generation;
use crate::playback::queue::GuildQueue;
use crate::playback::session::VoiceSession;
use crate::playback::track::Track;

/// Playback lifecycle of one guild as the controller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Nothing queued or playing.
    #[default]
    Idle,
    /// Resolving the next track's stream URL.
    Loading,
    Playing,
    Paused,
    /// Tearing the voice connection down after the queue drained or a stop.
    Disconnecting,
}

/// Builds the voice session for a guild on first use.
pub type SessionFactory = Box<dyn Fn(GuildId) -> Arc<dyn VoiceSession> + Send + Sync>;

/// Mutable playback state for one guild: queue, session, lifecycle state,
/// and the generation token that invalidates stale async results.
pub struct GuildPlayer {
    pub guild_id: GuildId,
    pub queue: GuildQueue,
    pub state: PlayerState,
    pub session: Arc<dyn VoiceSession>,
    pub now_playing: Option<Track>,
    /// Text channel that issued the most recent play command; auto-advance
    /// notices go there.
    pub notify_channel: Option<ChannelId>,
    generation: Generation,
}

impl GuildPlayer {
    fn new(guild_id: GuildId, session: Arc<dyn VoiceSession>) -> Self {
        Self {
            guild_id,
            queue: GuildQueue::new(),
            state: PlayerState::Idle,
            session,
            now_playing: None,
            notify_channel: None,
            generation: 0,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Enter a new playback epoch. Completion events and resolver results
    /// minted under earlier epochs become stale.
    pub fn bump_generation(&mut self) -> Generation {
        self.generation += 1;
        self.generation
    }
}

/// Registry of every guild's player, created lazily on first use.
///
/// Each player sits behind its own lock; the map itself is sharded, so
/// guilds never contend with each other.
pub struct PlayerRegistry {
    players: DashMap<GuildId, Arc<Mutex<GuildPlayer>>>,
    sessions: SessionFactory,
}

impl PlayerRegistry {
    pub fn new(sessions: SessionFactory) -> Self {
        Self {
            players: DashMap::new(),
            sessions,
        }
    }

    /// Fetch the player for a guild, creating it on first use.
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<Mutex<GuildPlayer>> {
        self.players
            .entry(guild_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(GuildPlayer::new(guild_id, (self.sessions)(guild_id))))
            })
            .value()
            .clone()
    }

    /// Fetch the player for a guild that has been used before.
    pub fn get(&self, guild_id: GuildId) -> Option<Arc<Mutex<GuildPlayer>>> {
        self.players.get(&guild_id).map(|entry| entry.value().clone())
    }
}

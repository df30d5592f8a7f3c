//! Playback orchestration core: per-guild queues, stream resolution,
//! voice sessions, and the controller state machine that ties them
//! together. The Discord-facing command layer only ever talks to
//! [`PlaybackController`].

pub mod controller;
pub mod error;
pub mod events;
pub mod queue;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod track;

pub use controller::{PlayOutcome, PlaybackController, QueueView};
pub use error::{MusicError, MusicResult, ResolutionError};
pub use events::{Generation, NoticeKind, PlayerNotice, TrackDone, TrackEnded};
pub use queue::GuildQueue;
pub use registry::{GuildPlayer, PlayerRegistry, PlayerState, SessionFactory};
pub use resolver::{ResolverConfig, StreamResolver, YtDlpResolver};
pub use session::{SessionStatus, SongbirdSession, VoiceSession};
pub use track::{ResolvedTrack, Track, TrackSource};

//! Error types for the playback core.

use thiserror::Error;

/// Failure to turn a search query or URL into a playable stream.
///
/// No-results is deliberately distinct from a transport or parse failure:
/// the former means the query itself came up empty, the latter that the
/// extractor misbehaved.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("No results for: {0}")]
    NoResults(String),

    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Stream resolution failed: {0}")]
    Backend(String),
}

/// Errors surfaced by playback commands and the voice session.
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("No track is currently playing")]
    NothingPlaying,

    #[error("Playback is not paused")]
    NotPaused,

    #[error("Playback is already paused")]
    AlreadyPaused,

    #[error("Audio backend error: {0}")]
    PlaybackError(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// Result type alias for music operations.
pub type MusicResult<T> = Result<T, MusicError>;

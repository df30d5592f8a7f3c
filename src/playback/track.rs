//! Track model shared by the queue, resolver, and controller.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Links whose path ends in a known audio container stream as-is,
/// without a resolver round-trip.
static DIRECT_AUDIO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(mp3|m4a|aac|ogg|oga|opus|flac|wav|webm)(\?.*)?$")
        .expect("Failed to compile direct audio URL regex")
});

/// Where a track came from: a pasted link or a free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A URL supplied by the user. Resolved at playback time unless it
    /// points straight at an audio file.
    Url(String),
    /// A search phrase, resolved before the track may enter the queue.
    Search(String),
}

impl TrackSource {
    /// Classify raw user input: anything that parses as a URL is a link,
    /// everything else is a search.
    pub fn from_query(query: &str) -> Self {
        let query = query.trim();
        if Url::parse(query).is_ok() {
            Self::Url(query.to_string())
        } else {
            Self::Search(query.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Search(s) => s,
        }
    }
}

/// Output of a successful resolution: a playable stream plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub stream_url: String,
    pub title: String,
    pub page_url: Option<String>,
    pub duration: Option<Duration>,
}

/// A single queue entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub source: TrackSource,
    /// Direct audio stream URL, present once resolution has happened.
    pub stream_url: Option<String>,
    pub title: String,
    /// Human-facing page link used in embeds.
    pub page_url: Option<String>,
    pub duration: Option<Duration>,
}

impl Track {
    /// Track fully described by a resolver hit.
    pub fn from_resolved(source: TrackSource, resolved: ResolvedTrack) -> Self {
        Self {
            source,
            stream_url: Some(resolved.stream_url),
            title: resolved.title,
            page_url: resolved.page_url,
            duration: resolved.duration,
        }
    }

    /// Track from a user-supplied link. Direct audio links are playable
    /// immediately; anything else waits for the advance loop to resolve it.
    pub fn from_url(url: String) -> Self {
        let stream_url = is_direct_stream(&url).then(|| url.clone());
        Self {
            title: url.clone(),
            page_url: Some(url.clone()),
            source: TrackSource::Url(url),
            stream_url,
            duration: None,
        }
    }

    /// Whether playback can start without a resolver round-trip.
    pub fn is_resolved(&self) -> bool {
        self.stream_url.is_some()
    }

    /// Fill in the outcome of a deferred resolution.
    pub fn apply_resolution(&mut self, resolved: ResolvedTrack) {
        self.stream_url = Some(resolved.stream_url);
        self.title = resolved.title;
        if resolved.page_url.is_some() {
            self.page_url = resolved.page_url;
        }
        self.duration = resolved.duration;
    }
}

/// True when the URL points straight at an audio file.
pub fn is_direct_stream(url: &str) -> bool {
    DIRECT_AUDIO_REGEX.is_match(url)
}

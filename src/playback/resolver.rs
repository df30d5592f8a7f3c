//! Resolving search queries and page URLs into direct audio stream URLs.
//!
//! The lookup shells out to `yt-dlp`, which is blocking; it runs on the
//! blocking thread pool and is awaited like any other future, so resolver
//! work for one guild never stalls the runtime or another guild.

use std::process::{Command, Output};
use std::time::Duration;

use serde::Deserialize;
use serenity::async_trait;
use tokio::task;
use tracing::debug;

use crate::playback::error::ResolutionError;
use crate::playback::track::{ResolvedTrack, TrackSource};

/// Title used when the extractor reports none.
const UNTITLED: &str = "Untitled";

/// Options forwarded to the extractor on every lookup.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Extractor executable to invoke.
    pub program: String,
    /// Restrict format selection to audio-only streams.
    pub audio_only: bool,
    /// Upper bound on the selected format's average bitrate, in kbit/s.
    pub max_bitrate_kbps: u32,
    /// Expand playlist URLs into all their entries. Off: one queue entry
    /// is one track.
    pub expand_playlists: bool,
    /// Allow DASH/HLS manifest formats. Off: direct streams only.
    pub manifest_formats: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            audio_only: true,
            max_bitrate_kbps: 96,
            expand_playlists: false,
            manifest_formats: false,
        }
    }
}

impl ResolverConfig {
    /// Command-line arguments equivalent to this configuration.
    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-j".to_string()];
        if !self.expand_playlists {
            args.push("--no-playlist".to_string());
        }
        if self.audio_only {
            args.push("-f".to_string());
            args.push(format!("bestaudio[abr<={}]/bestaudio", self.max_bitrate_kbps));
        }
        if !self.manifest_formats {
            args.push("--extractor-args".to_string());
            args.push("youtube:skip=dash,hls".to_string());
        }
        args
    }
}

/// Turns a search query or page URL into a direct, playable stream URL.
///
/// Implementations never retry; callers decide whether a failure skips
/// the track or surfaces to the user.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn resolve(&self, source: &TrackSource) -> Result<ResolvedTrack, ResolutionError>;
}

/// [`StreamResolver`] backed by the `yt-dlp` command-line extractor.
pub struct YtDlpResolver {
    config: ResolverConfig,
}

impl YtDlpResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// The lookup target handed to the extractor: URLs go through
    /// verbatim, search terms use the `ytsearch1:` scheme so the first
    /// hit is the only hit.
    fn lookup_target(source: &TrackSource) -> String {
        match source {
            TrackSource::Url(url) => url.clone(),
            TrackSource::Search(term) => format!("ytsearch1:{}", term),
        }
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    async fn resolve(&self, source: &TrackSource) -> Result<ResolvedTrack, ResolutionError> {
        let mut args = self.config.to_args();
        args.push(Self::lookup_target(source));
        let program = self.config.program.clone();

        debug!("Resolving {:?} via {}", source.as_str(), program);

        let output = task::spawn_blocking(move || Command::new(&program).args(&args).output())
            .await
            .map_err(|err| ResolutionError::Backend(format!("Resolver task failed: {err}")))?
            .map_err(|err| ResolutionError::Backend(format!("Failed to run extractor: {err}")))?;

        parse_output(source, &output)
    }
}

/// One line of `yt-dlp -j` output.
#[derive(Debug, Deserialize)]
struct ExtractorEntry {
    #[serde(default)]
    title: Option<String>,
    /// Direct stream URL of the selected format.
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Classify and decode the extractor's output. The extractor emits one
/// JSON object per line; the first entry is the one that plays.
fn parse_output(source: &TrackSource, output: &Output) -> Result<ResolvedTrack, ResolutionError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("Unsupported URL") {
            return Err(ResolutionError::Unsupported(source.as_str().to_string()));
        }
        if stderr.contains("did not match") || stderr.contains("no video results") {
            return Err(ResolutionError::NoResults(source.as_str().to_string()));
        }
        // The ERROR line is the last thing yt-dlp prints.
        let last_line = stderr.lines().last().unwrap_or("extractor failed");
        return Err(ResolutionError::Backend(last_line.to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let Some(line) = stdout.lines().find(|line| !line.trim().is_empty()) else {
        return Err(ResolutionError::NoResults(source.as_str().to_string()));
    };

    let entry: ExtractorEntry = serde_json::from_str(line)
        .map_err(|err| ResolutionError::Backend(format!("Unreadable extractor output: {err}")))?;

    let stream_url = entry
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ResolutionError::NoResults(source.as_str().to_string()))?;

    Ok(ResolvedTrack {
        stream_url,
        title: entry
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        page_url: entry.webpage_url,
        // Live streams report no duration; garbage is treated the same.
        duration: entry
            .duration
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64),
    })
}

//! Test fixtures for the playback suite
//! This module contains sample identifiers and track data used in tests

use std::time::Duration;

use serenity::model::id::{ChannelId, GuildId};
use turntable::playback::ResolvedTrack;

/// Primary guild for testing
pub const GUILD_A: GuildId = GuildId::new(86400100);

/// Second guild for isolation tests
pub const GUILD_B: GuildId = GuildId::new(86400200);

/// Voice channel the fake sessions join
pub const VOICE: ChannelId = ChannelId::new(11);

/// Text channel auto-advance notices land in
pub const TEXT: ChannelId = ChannelId::new(22);

/// Page URL for a track name, shaped so it never looks like a direct
/// audio file and always goes through the resolver.
pub fn page_url(name: &str) -> String {
    format!("https://tube.test/watch?v={name}")
}

/// Stream URL `resolved_track` assigns for a track name.
pub fn stream_url(name: &str) -> String {
    format!("https://cdn.tube.test/{name}.opus")
}

/// Build a resolved track whose fields derive from a short name.
pub fn resolved_track(name: &str) -> ResolvedTrack {
    ResolvedTrack {
        stream_url: stream_url(name),
        title: format!("Track {name}"),
        page_url: Some(page_url(name)),
        duration: Some(Duration::from_secs(184)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_is_consistent() {
        let track = resolved_track("abc");
        assert_eq!(track.stream_url, stream_url("abc"));
        assert_eq!(track.page_url.as_deref(), Some(page_url("abc").as_str()));
        assert_ne!(GUILD_A, GUILD_B);
    }
}

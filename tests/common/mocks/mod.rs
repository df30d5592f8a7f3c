//! Mock implementations for external dependencies
//! This module contains mockall doubles for the resolver seam

use mockall::mock;
use serenity::async_trait;

use turntable::playback::{ResolutionError, ResolvedTrack, StreamResolver, TrackSource};

mock! {
    pub Resolver {}

    #[async_trait]
    impl StreamResolver for Resolver {
        async fn resolve(&self, source: &TrackSource) -> Result<ResolvedTrack, ResolutionError>;
    }
}

/// Creates a mock resolver for expectation-driven tests
pub fn create_mock_resolver() -> MockResolver {
    MockResolver::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_resolver_returns_scripted_track() {
        let mut mock = create_mock_resolver();

        mock.expect_resolve()
            .withf(|source| source.as_str() == "some song")
            .times(1)
            .returning(|_| {
                Ok(ResolvedTrack {
                    stream_url: "https://cdn.test/some-song.opus".to_string(),
                    title: "Some Song".to_string(),
                    page_url: None,
                    duration: None,
                })
            });

        let source = TrackSource::from_query("some song");
        let resolved = mock.resolve(&source).await.unwrap();
        assert_eq!(resolved.title, "Some Song");
    }
}

mod common;

use std::time::{Duration, Instant};

use common::{FakeProvider, mentions, track_ids};
use radiosync::{
    management::{Store, TrackCache},
    sync::{Resolution, TrackResolver},
    types::{ProviderKind, TrackMention},
};

#[tokio::test]
async fn test_resolve_unmatched_mention_is_dropped() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_track("Song A", "Artist X", "111");

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    let report = resolver
        .resolve_all(&mentions(&[("Song A", "Artist X"), ("Song B", "Artist Y")]))
        .await
        .unwrap();

    assert_eq!(report.tracks, track_ids(ProviderKind::Deezer, &["111"]));
    assert_eq!(report.found, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.cached, 0);
}

#[tokio::test]
async fn test_repeated_pair_is_searched_once() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_track("Song A", "Artist X", "111");
    let mention = TrackMention::new("Song A", "Artist X");

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    assert_eq!(
        resolver.resolve(&mention).await.unwrap(),
        Resolution::Found("111".to_string())
    );

    // A later run with a fresh resolver still hits the persisted cache.
    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    assert_eq!(
        resolver.resolve(&mention).await.unwrap(),
        Resolution::Cached("111".to_string())
    );

    assert_eq!(provider.state().search_calls.len(), 1);
}

#[tokio::test]
async fn test_no_match_is_searched_again() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    let mention = TrackMention::new("Song B", "Artist Y");

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    assert_eq!(resolver.resolve(&mention).await.unwrap(), Resolution::NoMatch);
    assert_eq!(resolver.resolve(&mention).await.unwrap(), Resolution::NoMatch);

    assert_eq!(provider.state().search_calls.len(), 2);
    assert_eq!(TrackCache::new(&store, ProviderKind::Deezer).entry_count().unwrap(), 0);
}

#[tokio::test]
async fn test_first_result_wins() {
    let store = Store::open_in_memory().unwrap();
    let provider =
        FakeProvider::new(ProviderKind::Tidal).with_results("Song A", "Artist X", &["7", "8", "9"]);

    let mut resolver = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal));
    let resolution = resolver
        .resolve(&TrackMention::new("Song A", "Artist X"))
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Found("7".to_string()));
}

#[tokio::test]
async fn test_search_uses_sanitized_values() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_track("Rock  Roll", "AC/DC", "42");

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    let resolution = resolver
        .resolve(&TrackMention::new("Rock & Roll!?", "AC/DC"))
        .await
        .unwrap();

    assert_eq!(resolution, Resolution::Found("42".to_string()));
    assert_eq!(
        provider.state().search_calls,
        vec![("Rock  Roll".to_string(), "AC/DC".to_string())]
    );
    assert_eq!(
        store
            .cached_track(ProviderKind::Deezer, "Rock  Roll | AC/DC")
            .unwrap(),
        Some("42".to_string())
    );
}

#[tokio::test]
async fn test_malformed_response_drops_mention() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer)
        .with_track("Song A", "Artist X", "111")
        .with_malformed("Song C", "Artist Z");

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    let report = resolver
        .resolve_all(&mentions(&[("Song A", "Artist X"), ("Song C", "Artist Z")]))
        .await
        .unwrap();

    assert_eq!(report.tracks, track_ids(ProviderKind::Deezer, &["111"]));
    assert_eq!(report.malformed, 1);
    assert!(
        store
            .cached_track(ProviderKind::Deezer, "Song C | Artist Z")
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_rejected_token_fails_the_resolution() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    provider.state().reject_token = true;

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    let error = resolver
        .resolve_all(&mentions(&[("Song A", "Artist X")]))
        .await
        .unwrap_err();

    assert_eq!(error.rejected_provider(), Some(ProviderKind::Deezer));
}

#[tokio::test]
async fn test_resolution_is_monotonic() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer)
        .with_track("Song A", "Artist X", "111")
        .with_track("Song C", "Artist Z", "333");

    let small = mentions(&[("Song A", "Artist X")]);
    let large = mentions(&[
        ("Song A", "Artist X"),
        ("Song B", "Artist Y"),
        ("Song C", "Artist Z"),
    ]);

    let mut resolver =
        TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Deezer));
    let small_report = resolver.resolve_all(&small).await.unwrap();
    let large_report = resolver.resolve_all(&large).await.unwrap();

    assert!(small_report.tracks.is_subset(&large_report.tracks));
    assert_eq!(
        large_report.tracks,
        track_ids(ProviderKind::Deezer, &["111", "333"])
    );
    assert_eq!(large_report.cached, 1);
}

#[tokio::test]
async fn test_cache_is_scoped_per_provider() {
    let store = Store::open_in_memory().unwrap();
    let deezer = FakeProvider::new(ProviderKind::Deezer).with_track("Song A", "Artist X", "111");
    let tidal = FakeProvider::new(ProviderKind::Tidal).with_track("Song A", "Artist X", "9001");
    let mention = TrackMention::new("Song A", "Artist X");

    let mut resolver = TrackResolver::new(&deezer, TrackCache::new(&store, ProviderKind::Deezer));
    resolver.resolve(&mention).await.unwrap();

    let mut resolver = TrackResolver::new(&tidal, TrackCache::new(&store, ProviderKind::Tidal));
    assert_eq!(
        resolver.resolve(&mention).await.unwrap(),
        Resolution::Found("9001".to_string())
    );
    assert_eq!(tidal.state().search_calls.len(), 1);
}

#[tokio::test]
async fn test_search_delay_spaces_network_searches_only() {
    let delay = Duration::from_millis(300);
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Tidal)
        .with_track("Song B", "Artist Y", "9002")
        .with_search_delay(delay);

    let mut resolver = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal));
    resolver
        .resolve(&TrackMention::new("Song B", "Artist Y"))
        .await
        .unwrap();

    // Two misses around one cache hit wait out a single delay.
    let mut resolver = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal));
    let started = Instant::now();
    let report = resolver
        .resolve_all(&mentions(&[
            ("Song A", "Artist X"),
            ("Song B", "Artist Y"),
            ("Song C", "Artist Z"),
        ]))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.cached, 1);
    assert_eq!(report.unmatched, 2);
    assert_eq!(provider.state().search_calls.len(), 3);
    assert!(elapsed >= delay, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 2, "elapsed {elapsed:?}");
}

#[tokio::test]
async fn test_single_search_is_not_delayed() {
    let delay = Duration::from_millis(300);
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Tidal).with_search_delay(delay);

    let mut resolver = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal));
    let started = Instant::now();
    resolver
        .resolve(&TrackMention::new("Song A", "Artist X"))
        .await
        .unwrap();

    assert!(started.elapsed() < delay);
}

#[tokio::test]
async fn test_search_delay_carries_over_to_next_resolver() {
    let delay = Duration::from_millis(300);
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Tidal).with_search_delay(delay);

    let mut first = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal));
    first
        .resolve(&TrackMention::new("Song A", "Artist X"))
        .await
        .unwrap();

    let mut second = TrackResolver::new(&provider, TrackCache::new(&store, ProviderKind::Tidal))
        .with_pacer(first.into_pacer());
    let started = Instant::now();
    second
        .resolve(&TrackMention::new("Song B", "Artist Y"))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // The first search just happened, so nearly the whole delay remains.
    assert!(elapsed >= delay / 2, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 2, "elapsed {elapsed:?}");
}

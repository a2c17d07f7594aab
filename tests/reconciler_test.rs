mod common;

use std::time::{Duration, Instant};

use common::{FakeProvider, ids, no_delay, track_ids};
use radiosync::{
    error::{BatchStep, SyncError},
    management::Store,
    sync::{PlaylistReconciler, PlaylistTarget, ReconcileOptions},
    types::ProviderKind,
};

fn target() -> PlaylistTarget {
    PlaylistTarget {
        name: "Test FM Playlist".to_string(),
        description: "The latest songs played on Test FM".to_string(),
        property_key: "deezer_test_fm_playlist_id".to_string(),
    }
}

#[tokio::test]
async fn test_creates_and_persists_playlist() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["111"]))
        .await
        .unwrap();

    assert!(report.created);
    assert_eq!(report.removed, 0);
    assert_eq!(report.added, 1);
    assert_eq!(
        store.property("deezer_test_fm_playlist_id").unwrap(),
        Some(report.playlist_id.clone())
    );
    assert_eq!(provider.tracks_of(&report.playlist_id), ids(&["111"]));
    assert_eq!(
        provider.state().created,
        vec![(
            "Test FM Playlist".to_string(),
            "The latest songs played on Test FM".to_string()
        )]
    );
    // A fresh playlist is not listed.
    assert_eq!(provider.state().list_calls, 0);
}

#[tokio::test]
async fn test_reuses_persisted_playlist() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &["111"]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["222"]))
        .await
        .unwrap();

    assert!(!report.created);
    assert_eq!(report.playlist_id, "pl-9");
    assert!(provider.state().created.is_empty());
    assert_eq!(provider.tracks_of("pl-9"), ids(&["222"]));
}

#[tokio::test]
async fn test_full_replace_of_existing_content() {
    let store = Store::open_in_memory().unwrap();
    let provider =
        FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &["111", "222", "333"]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["111", "444"]))
        .await
        .unwrap();

    assert_eq!(report.removed, 3);
    assert_eq!(report.added, 2);
    assert_eq!(provider.tracks_of("pl-9"), ids(&["111", "444"]));

    let state = provider.state();
    assert_eq!(state.remove_calls.len(), 1);
    assert_eq!(
        state.remove_calls[0].iter().cloned().collect::<std::collections::BTreeSet<_>>(),
        ids(&["111", "222", "333"])
    );
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());
    let tracks = track_ids(ProviderKind::Deezer, &["111", "222"]);

    let first = reconciler.reconcile(&target(), &tracks).await.unwrap();
    let after_first = provider.tracks_of(&first.playlist_id);

    let second = reconciler.reconcile(&target(), &tracks).await.unwrap();
    let after_second = provider.tracks_of(&second.playlist_id);

    assert_eq!(first.playlist_id, second.playlist_id);
    assert_eq!(after_first, ids(&["111", "222"]));
    assert_eq!(after_first, after_second);
    assert_eq!(second.removed, 2);
}

#[tokio::test]
async fn test_empty_target_purges_playlist() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &["111", "222"]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &Default::default())
        .await
        .unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(report.added, 0);
    assert!(provider.tracks_of("pl-9").is_empty());
    assert!(provider.state().add_calls.is_empty());
}

#[tokio::test]
async fn test_removals_are_batched() {
    let store = Store::open_in_memory().unwrap();
    let existing: Vec<String> = (1..=25).map(|n| format!("{n}")).collect();
    let existing: Vec<&str> = existing.iter().map(String::as_str).collect();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &existing);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &Default::default())
        .await
        .unwrap();

    assert_eq!(report.removed, 25);
    let sizes: Vec<usize> = provider
        .state()
        .remove_calls
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    // 25 tracks at 4 per page.
    assert_eq!(provider.state().list_calls, 7);
}

#[tokio::test]
async fn test_duplicate_remote_entries_are_removed_once() {
    let store = Store::open_in_memory().unwrap();
    let provider =
        FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &["111", "222", "111"]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let current = reconciler.current_tracks("pl-9").await.unwrap();

    assert_eq!(current, vec!["111".to_string(), "222".to_string()]);
}

#[tokio::test]
async fn test_stale_playlist_is_recreated() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    store
        .set_property("deezer_test_fm_playlist_id", "gone")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let report = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["111"]))
        .await
        .unwrap();

    assert!(report.created);
    assert_ne!(report.playlist_id, "gone");
    assert_eq!(
        store.property("deezer_test_fm_playlist_id").unwrap(),
        Some(report.playlist_id.clone())
    );
}

#[tokio::test]
async fn test_failed_batch_reports_progress() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    provider.state().fail_add_call = Some(1);
    let options = ReconcileOptions {
        batch_size: 2,
        ..no_delay()
    };
    let reconciler = PlaylistReconciler::new(&provider, &store, options);

    let error = reconciler
        .reconcile(
            &target(),
            &track_ids(ProviderKind::Deezer, &["1", "2", "3", "4", "5"]),
        )
        .await
        .unwrap_err();

    match error {
        SyncError::Batch {
            step,
            applied,
            total,
            ..
        } => {
            assert_eq!(step, BatchStep::Add);
            assert_eq!(applied, 2);
            assert_eq!(total, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_foreign_provider_ids_are_skipped() {
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer);
    let reconciler = PlaylistReconciler::new(&provider, &store, no_delay());

    let mut tracks = track_ids(ProviderKind::Deezer, &["111"]);
    tracks.extend(track_ids(ProviderKind::Tidal, &["9001"]));

    let report = reconciler.reconcile(&target(), &tracks).await.unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(provider.tracks_of(&report.playlist_id), ids(&["111"]));
}

fn cooldown(removal_cooldown: Duration) -> ReconcileOptions {
    ReconcileOptions {
        batch_size: 10,
        removal_cooldown,
    }
}

#[tokio::test]
async fn test_cooldown_follows_a_removal() {
    let pause = Duration::from_millis(300);
    let store = Store::open_in_memory().unwrap();
    let provider =
        FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &["111", "222"]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, cooldown(pause));

    let started = Instant::now();
    let report = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["333"]))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.removed, 2);
    assert!(elapsed >= pause, "elapsed {elapsed:?}");
    assert_eq!(provider.tracks_of("pl-9"), ids(&["333"]));
}

#[tokio::test]
async fn test_no_cooldown_without_removal() {
    let pause = Duration::from_millis(300);
    let store = Store::open_in_memory().unwrap();
    let provider = FakeProvider::new(ProviderKind::Deezer).with_playlist("pl-9", &[]);
    store
        .set_property("deezer_test_fm_playlist_id", "pl-9")
        .unwrap();
    let reconciler = PlaylistReconciler::new(&provider, &store, cooldown(pause));

    let started = Instant::now();
    let existing = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["111"]))
        .await
        .unwrap();
    assert_eq!(existing.removed, 0);

    store.remove_property("deezer_test_fm_playlist_id").unwrap();
    let created = reconciler
        .reconcile(&target(), &track_ids(ProviderKind::Deezer, &["111"]))
        .await
        .unwrap();
    assert!(created.created);

    assert!(started.elapsed() < pause, "elapsed {:?}", started.elapsed());
}

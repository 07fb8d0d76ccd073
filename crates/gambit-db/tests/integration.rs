//! Integration tests for the `Dragonfly` session store.
//!
//! These tests require a live Dragonfly (or Redis) instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p gambit-db -- --ignored
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs. Each test uses its own random username so they can
//! run in parallel against one instance.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use gambit_db::{DragonflySessionStore, SessionStore, StoreConfig};
use gambit_types::{Session, SessionId};

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn connect() -> DragonflySessionStore {
    DragonflySessionStore::connect(DRAGONFLY_URL, StoreConfig::default())
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?")
}

fn unique_username(prefix: &str) -> String {
    format!("{prefix}-{}", SessionId::new())
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn create_twice_returns_same_session() {
    let store = connect().await;
    let username = unique_username("Idem");

    let first = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("first create");
    let second = store
        .create(Session::new(username.to_uppercase(), None))
        .await
        .expect("second create");

    assert_eq!(first.id, second.id);

    store.delete(first.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn update_refreshes_expiry() {
    let store = DragonflySessionStore::connect(
        DRAGONFLY_URL,
        StoreConfig {
            ttl: Duration::from_secs(120),
            refresh_index_on_update: true,
        },
    )
    .await
    .expect("connect");
    let mut session = store
        .create(Session::new(unique_username("ttl"), None))
        .await
        .expect("create");

    tokio::time::sleep(Duration::from_secs(2)).await;
    let before = store.remaining_ttl(session.id).await.expect("ttl").expect("present");
    assert!(before < Duration::from_secs(120));

    session.set_position("8/8/8/8/8/8/8/8 w - - 0 1");
    store.update(session.clone()).await.expect("update");

    let after = store.remaining_ttl(session.id).await.expect("ttl").expect("present");
    assert_eq!(after, Duration::from_secs(120));

    store.delete(session.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn delete_removes_record_and_index() {
    let store = connect().await;
    let username = unique_username("gone");
    let session = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("create");

    store.delete(session.id).await.expect("delete");

    assert!(store.get_by_id(session.id).await.expect("get").is_none());
    assert!(store.get_by_username(&username).await.expect("get").is_none());
    // Deleting again is a no-op.
    store.delete(session.id).await.expect("second delete");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn missing_primary_behind_index_is_not_found() {
    let store = connect().await;
    let username = unique_username("stale");
    let session = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("create");

    store
        .pool()
        .delete_many(vec![format!("gambit:session:{}", session.id)])
        .await
        .expect("drop primary");

    assert!(store.get_by_username(&username).await.expect("get").is_none());

    let replacement = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("recreate");
    assert_ne!(replacement.id, session.id);

    store.delete(replacement.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn deleting_old_session_keeps_newer_index() {
    let store = connect().await;
    let username = unique_username("owner");
    let old = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("create old");

    // The index lapses while the old record lives on.
    store
        .pool()
        .delete_many(vec![format!("gambit:username:{}", username.to_lowercase())])
        .await
        .expect("drop index");
    let newer = store
        .create(Session::new(username.clone(), None))
        .await
        .expect("create newer");
    assert_ne!(newer.id, old.id);

    store.delete(old.id).await.expect("delete old");

    let found = store.get_by_username(&username).await.expect("get");
    assert_eq!(found.map(|s| s.id), Some(newer.id));

    store.delete(newer.id).await.expect("cleanup");
}

//! End-to-end tests of the ownership check over on-disk storage.
//!
//! Each "launch" builds a fresh store, storage handle, and session client
//! over the same directory, the way the CLI does on every invocation.
//!
//! Run with: cargo test -p basket-integration-tests --test ownership

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use basket_core::{CartItem, ItemSpec, Price, SessionInfo};
use basket_integration_tests::{MockSession, Reply};
use basket_storefront::services::SessionClient;
use basket_storefront::startup::{Hydration, hydrate};
use basket_storefront::storage::{DurableStorage, FileStorage, SharedStorage};
use basket_storefront::store::{CART_KEY, CartStore};
use basket_storefront::sync::{OWNER_KEY, OwnershipSync, SyncOutcome};
use rust_decimal::Decimal;
use tempfile::TempDir;

const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

struct Launch {
    storage: SharedStorage,
    store: CartStore,
    hydration: Hydration,
}

/// Start the cart over `dir` against `mock`, waiting up to `wait`.
async fn launch(dir: &Path, mock: &MockSession, wait: Duration) -> Launch {
    let storage: SharedStorage = Arc::new(FileStorage::new(dir));
    let store = CartStore::create(storage.clone());
    let client = SessionClient::new(&mock.config(None, SESSION_TIMEOUT))
        .expect("Failed to build session client");
    let sync = OwnershipSync::new(client, storage.clone(), store.clone());
    let hydration = hydrate(&store, sync, wait).await;
    Launch {
        storage,
        store,
        hydration,
    }
}

fn tee() -> CartItem {
    CartItem::new(
        "tee|size=M",
        "tee",
        "Pineapple Tee",
        Price::new(Decimal::new(2800, 2)).unwrap(),
    )
    .with_specs(vec![ItemSpec::text("size", "M")])
}

async fn mock(session: &SessionInfo) -> MockSession {
    MockSession::start(Reply::session(session))
        .await
        .expect("Failed to start mock session")
}

#[tokio::test]
async fn test_cart_survives_relaunch_for_same_guest() {
    let dir = TempDir::new().unwrap();
    let mock = mock(&SessionInfo::guest()).await;

    let first = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    assert!(matches!(
        first.hydration.outcome().await,
        SyncOutcome::FirstRun { .. }
    ));
    first.store.add_item(tee());
    first.store.add_item(tee());

    let second = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    assert!(matches!(
        second.hydration.outcome().await,
        SyncOutcome::Unchanged { .. }
    ));
    assert_eq!(second.store.item_count(), 2);
    assert_eq!(second.store.cart_total(), Decimal::new(5600, 2));
}

#[tokio::test]
async fn test_sign_in_clears_guest_cart() {
    let dir = TempDir::new().unwrap();
    let mock = mock(&SessionInfo::guest()).await;

    let guest = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    let _ = guest.hydration.outcome().await;
    guest.store.add_item(tee());

    mock.set_reply(Reply::session(&SessionInfo::user("42")));
    let user = launch(dir.path(), &mock, SESSION_TIMEOUT).await;

    assert!(user.hydration.is_synchronized());
    assert!(user.hydration.outcome().await.invalidated());
    assert!(user.store.snapshot().is_empty());
    assert_eq!(
        user.storage.get_item(OWNER_KEY).unwrap().as_deref(),
        Some("user:42")
    );

    // The signed-in user's own cart now persists across launches.
    user.store.add_item(tee());
    let again = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    assert!(!again.hydration.outcome().await.invalidated());
    assert_eq!(again.store.item_count(), 1);
}

#[tokio::test]
async fn test_endpoint_failure_keeps_cart_and_owner() {
    let dir = TempDir::new().unwrap();
    let mock = mock(&SessionInfo::user("42")).await;

    let first = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    let _ = first.hydration.outcome().await;
    first.store.add_item(tee());

    mock.set_reply(Reply::status(503));
    let second = launch(dir.path(), &mock, SESSION_TIMEOUT).await;

    assert!(matches!(
        second.hydration.outcome().await,
        SyncOutcome::Skipped { .. }
    ));
    assert_eq!(second.store.item_count(), 1);
    assert_eq!(
        second.storage.get_item(OWNER_KEY).unwrap().as_deref(),
        Some("user:42")
    );
}

#[tokio::test]
async fn test_slow_endpoint_restores_then_clears() {
    let dir = TempDir::new().unwrap();
    let mock = mock(&SessionInfo::guest()).await;

    let guest = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    let _ = guest.hydration.outcome().await;
    guest.store.add_item(tee());

    mock.set_reply(Reply::session(&SessionInfo::user("42")).delayed(Duration::from_millis(300)));
    let user = launch(dir.path(), &mock, Duration::from_millis(10)).await;

    // Restored optimistically while the check is in flight.
    assert!(!user.hydration.is_synchronized());
    assert!(user.store.has_hydrated());
    assert_eq!(user.store.item_count(), 1);

    let mut updates = user.store.subscribe();
    let outcome = user.hydration.outcome().await;

    assert!(outcome.invalidated());
    assert!(updates.has_changed().unwrap());
    assert!(user.store.snapshot().is_empty());
}

#[tokio::test]
async fn test_on_disk_layout() {
    let dir = TempDir::new().unwrap();
    let mock = mock(&SessionInfo::user("42")).await;

    let launched = launch(dir.path(), &mock, SESSION_TIMEOUT).await;
    let _ = launched.hydration.outcome().await;
    launched.store.add_item(tee());

    let owner = std::fs::read_to_string(dir.path().join(OWNER_KEY)).unwrap();
    assert_eq!(owner, "user:42");

    let raw = std::fs::read_to_string(dir.path().join(CART_KEY)).unwrap();
    let record: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(record["version"], 0);
    assert_eq!(record["state"]["isOpen"], true);
    assert_eq!(record["state"]["items"][0]["id"], "tee|size=M");
    assert_eq!(record["state"]["items"][0]["price"], "28.00");
    assert_eq!(record["state"]["items"][0]["quantity"], 1);
}

//! Cart ownership synchronizer.
//!
//! Keeps a cart filled by one identity (or a guest) from showing up for a
//! different identity on the same device. Run once per start, before the
//! persisted cart is shown:
//!
//! 1. Ask the session endpoint who is signed in.
//! 2. Derive the current [`OwnerTag`] (`user:<id>` or `guest`).
//! 3. Compare with the owner recorded under [`OWNER_KEY`].
//! 4. On mismatch, clear the cart.
//! 5. Record the current owner.
//!
//! Any failure to determine the current or previous owner leaves both the
//! cart and the owner record untouched.

use std::time::Duration;

use basket_core::{OwnerTag, SessionInfo};
use tracing::{info, instrument, warn};

use crate::error::add_breadcrumb;
use crate::services::{SessionError, SessionSource};
use crate::storage::SharedStorage;
use crate::store::CartStore;

/// Storage key for the owner record.
pub const OWNER_KEY: &str = "shopping-cart-owner";

/// What a synchronizer run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No owner was recorded; the cart was kept and `current` recorded.
    FirstRun { current: OwnerTag },
    /// The recorded owner matches; the cart was kept.
    Unchanged { current: OwnerTag },
    /// The recorded owner differs; the cart was cleared.
    Invalidated {
        previous: OwnerTag,
        current: OwnerTag,
    },
    /// The check could not complete; nothing was changed.
    Skipped { reason: String },
}

impl SyncOutcome {
    /// Whether the run cleared the cart.
    #[must_use]
    pub const fn invalidated(&self) -> bool {
        matches!(self, Self::Invalidated { .. })
    }
}

/// Runs the ownership check against a session source.
pub struct OwnershipSync<S> {
    session: S,
    storage: SharedStorage,
    store: CartStore,
    timeout: Option<Duration>,
}

impl<S: SessionSource> OwnershipSync<S> {
    /// Create a synchronizer for `store`, recording owners in `storage`.
    #[must_use]
    pub fn new(session: S, storage: SharedStorage, store: CartStore) -> Self {
        Self {
            session,
            storage,
            store,
            timeout: None,
        }
    }

    /// Give up on the session query after `timeout`.
    ///
    /// Expiry is handled exactly like a failed query.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the check once.
    ///
    /// Never fails: problems are logged and reported as [`SyncOutcome::Skipped`].
    #[instrument(skip(self))]
    pub async fn run(&self) -> SyncOutcome {
        let session = match self.query_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session check failed, keeping cart");
                return SyncOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };
        let current = session.owner();

        let previous = match self.storage.get_item(OWNER_KEY) {
            Ok(previous) => previous.map(|raw| OwnerTag::from(raw.as_str())),
            Err(e) => {
                warn!(error = %e, "Could not read cart owner, keeping cart");
                return SyncOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let outcome = match previous {
            None => SyncOutcome::FirstRun {
                current: current.clone(),
            },
            Some(previous) if previous == current => SyncOutcome::Unchanged {
                current: current.clone(),
            },
            Some(previous) => {
                self.store.clear_cart();
                info!(%previous, %current, "Cart owner changed, cleared cart");
                let owner = current.to_string();
                add_breadcrumb(
                    "cart",
                    "Cleared cart for new owner",
                    Some(&[("owner", owner.as_str())]),
                );
                SyncOutcome::Invalidated {
                    previous,
                    current: current.clone(),
                }
            }
        };

        if let Err(e) = self.storage.set_item(OWNER_KEY, &current.to_string()) {
            warn!(error = %e, %current, "Failed to record cart owner");
        }

        outcome
    }

    async fn query_session(&self) -> Result<SessionInfo, SessionError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.session.current_session())
                .await
                .map_err(|_| SessionError::Timeout)?,
            None => self.session.current_session().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use basket_core::{CartItem, Price};
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::{DurableStorage, MemoryStorage, StorageError};
    use crate::store::CART_KEY;

    /// Session source answering from a fixed result.
    struct StaticSession(Result<SessionInfo, u16>);

    impl SessionSource for StaticSession {
        async fn current_session(&self) -> Result<SessionInfo, SessionError> {
            self.0
                .clone()
                .map_err(|status| SessionError::Status { status })
        }
    }

    /// Session source that never answers.
    struct HangingSession;

    impl SessionSource for HangingSession {
        async fn current_session(&self) -> Result<SessionInfo, SessionError> {
            std::future::pending().await
        }
    }

    /// Storage whose reads of the owner key fail.
    #[derive(Default)]
    struct UnreadableOwner {
        inner: MemoryStorage,
        owner_writes: AtomicUsize,
    }

    impl DurableStorage for UnreadableOwner {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            if key == OWNER_KEY {
                return Err(StorageError::Poisoned);
            }
            self.inner.get_item(key)
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == OWNER_KEY {
                self.owner_writes.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove_item(key)
        }
    }

    /// A restored store with one line, plus its storage.
    fn filled_store(previous_owner: Option<&str>) -> (SharedStorage, CartStore) {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        if let Some(owner) = previous_owner {
            storage.set_item(OWNER_KEY, owner).unwrap();
        }
        let store = CartStore::create(storage.clone());
        store.add_item(CartItem::new(
            "a",
            "p1",
            "Tee",
            Price::new(Decimal::from(10)).unwrap(),
        ));
        (storage, store)
    }

    fn sync(
        session: Result<SessionInfo, u16>,
        storage: &SharedStorage,
        store: &CartStore,
    ) -> OwnershipSync<StaticSession> {
        OwnershipSync::new(StaticSession(session), storage.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_guest_to_user_clears_cart() {
        let (storage, store) = filled_store(Some("guest"));
        let outcome = sync(Ok(SessionInfo::user("42")), &storage, &store).run().await;

        assert_eq!(
            outcome,
            SyncOutcome::Invalidated {
                previous: OwnerTag::Guest,
                current: OwnerTag::user("42"),
            }
        );
        assert!(store.snapshot().is_empty());
        assert_eq!(storage.get_item(OWNER_KEY).unwrap().as_deref(), Some("user:42"));

        // The clear is persisted, so a later restore cannot bring the lines back.
        let reloaded = CartStore::create(storage);
        reloaded.restore();
        assert!(reloaded.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_user_to_other_user_clears_cart() {
        let (storage, store) = filled_store(Some("user:7"));
        let outcome = sync(Ok(SessionInfo::user("8")), &storage, &store).run().await;
        assert!(outcome.invalidated());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_user_to_guest_clears_cart() {
        let (storage, store) = filled_store(Some("user:7"));
        let outcome = sync(Ok(SessionInfo::guest()), &storage, &store).run().await;
        assert!(outcome.invalidated());
        assert_eq!(storage.get_item(OWNER_KEY).unwrap().as_deref(), Some("guest"));
    }

    #[tokio::test]
    async fn test_same_owner_keeps_cart() {
        let (storage, store) = filled_store(Some("user:42"));
        let before = store.snapshot();
        let outcome = sync(Ok(SessionInfo::user("42")), &storage, &store).run().await;

        assert_eq!(
            outcome,
            SyncOutcome::Unchanged {
                current: OwnerTag::user("42")
            }
        );
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_first_run_never_clears() {
        for session in [SessionInfo::guest(), SessionInfo::user("42")] {
            let (storage, store) = filled_store(None);
            let current = session.owner();
            let outcome = sync(Ok(session), &storage, &store).run().await;

            assert_eq!(outcome, SyncOutcome::FirstRun { current: current.clone() });
            assert_eq!(store.item_count(), 1);
            assert_eq!(
                storage.get_item(OWNER_KEY).unwrap(),
                Some(current.to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_unrecognized_owner_record_clears() {
        let (storage, store) = filled_store(Some("someone-else"));
        let outcome = sync(Ok(SessionInfo::guest()), &storage, &store).run().await;
        assert!(outcome.invalidated());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_changes_nothing() {
        let (storage, store) = filled_store(Some("guest"));
        let cart_record = storage.get_item(CART_KEY).unwrap();
        let before = store.snapshot();

        let outcome = sync(Err(503), &storage, &store).run().await;

        assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
        assert_eq!(store.snapshot(), before);
        assert_eq!(storage.get_item(CART_KEY).unwrap(), cart_record);
        assert_eq!(storage.get_item(OWNER_KEY).unwrap().as_deref(), Some("guest"));
    }

    #[tokio::test]
    async fn test_query_failure_on_first_run_records_nothing() {
        let (storage, store) = filled_store(None);
        let outcome = sync(Err(500), &storage, &store).run().await;
        assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
        assert_eq!(storage.get_item(OWNER_KEY).unwrap(), None);
        assert_eq!(store.item_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let (storage, store) = filled_store(Some("user:1"));
        let outcome = OwnershipSync::new(HangingSession, storage.clone(), store.clone())
            .with_timeout(Duration::from_millis(10))
            .run()
            .await;

        assert_eq!(
            outcome,
            SyncOutcome::Skipped {
                reason: SessionError::Timeout.to_string()
            }
        );
        assert_eq!(store.item_count(), 1);
        assert_eq!(storage.get_item(OWNER_KEY).unwrap().as_deref(), Some("user:1"));
    }

    #[tokio::test]
    async fn test_unreadable_owner_record_changes_nothing() {
        let raw = Arc::new(UnreadableOwner::default());
        let storage: SharedStorage = raw.clone();
        let store = CartStore::create(storage.clone());
        store.add_item(CartItem::new("a", "p1", "Tee", Price::new(Decimal::ONE).unwrap()));

        let outcome = sync(Ok(SessionInfo::user("42")), &storage, &store).run().await;

        assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
        assert_eq!(store.item_count(), 1);
        assert_eq!(raw.owner_writes.load(Ordering::SeqCst), 0);
    }
}

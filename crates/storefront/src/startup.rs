//! Startup ordering of the ownership check and cart restore.
//!
//! The ownership check has to run before the persisted cart becomes visible,
//! otherwise the previous identity's lines flash up. [`hydrate`] runs the
//! check first and waits a bounded time for it. When the check is slow the
//! persisted cart is restored anyway and the check keeps running; if it then
//! finds a different owner, its clear lands on the live store and
//! subscribers see the cart empty out.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::services::SessionSource;
use crate::store::CartStore;
use crate::sync::{OwnershipSync, SyncOutcome};

/// Result of [`hydrate`].
#[derive(Debug)]
pub enum Hydration {
    /// The check finished before the cart was restored.
    Synchronized(SyncOutcome),
    /// The cart was restored while the check is still running.
    Pending(JoinHandle<SyncOutcome>),
}

impl Hydration {
    /// Wait for the ownership check to finish.
    pub async fn outcome(self) -> SyncOutcome {
        match self {
            Self::Synchronized(outcome) => outcome,
            Self::Pending(handle) => join_outcome(handle.await),
        }
    }

    /// Whether the check finished before the cart was restored.
    #[must_use]
    pub const fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized(_))
    }
}

/// Run the ownership check, then restore `store`.
///
/// Waits at most `wait` for the check before restoring optimistically.
#[instrument(skip(store, sync))]
pub async fn hydrate<S>(store: &CartStore, sync: OwnershipSync<S>, wait: Duration) -> Hydration
where
    S: SessionSource + 'static,
{
    let mut handle = tokio::spawn(async move { sync.run().await });

    match tokio::time::timeout(wait, &mut handle).await {
        Ok(joined) => {
            let outcome = join_outcome(joined);
            store.restore();
            Hydration::Synchronized(outcome)
        }
        Err(_) => {
            info!("Ownership check still pending, restoring cart optimistically");
            store.restore();
            Hydration::Pending(handle)
        }
    }
}

fn join_outcome(joined: Result<SyncOutcome, tokio::task::JoinError>) -> SyncOutcome {
    joined.unwrap_or_else(|e| {
        warn!(error = %e, "Ownership check task failed");
        SyncOutcome::Skipped {
            reason: e.to_string(),
        }
    })
}

//! Observable, persistent cart store.
//!
//! [`CartStore`] is a cheaply cloneable handle around a `tokio::sync::watch`
//! channel holding the current [`CartState`]. Every applied transition is
//! written to durable storage before the call returns and then broadcast to
//! subscribers.
//!
//! # Lifecycle
//!
//! 1. [`CartStore::create`] - start from an empty cart without touching storage
//! 2. Ownership check (see [`crate::sync`]) may call [`CartStore::clear_cart`]
//! 3. [`CartStore::restore`] - load the persisted cart, if any

mod persist;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use basket_core::{CartItem, CartLineId, CartState, CheckoutLine, Outcome};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::storage::SharedStorage;

pub use persist::{CART_KEY, CartPersistence, PersistError, STORAGE_VERSION};

/// Handle to the cart store.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    state: watch::Sender<CartState>,
    persistence: CartPersistence,
    hydrated: AtomicBool,
}

impl CartStore {
    /// Create a store holding an empty cart.
    ///
    /// Storage is not read until [`Self::restore`] is called.
    #[must_use]
    pub fn create(storage: SharedStorage) -> Self {
        let (state, _) = watch::channel(CartState::new());
        Self {
            inner: Arc::new(CartStoreInner {
                state,
                persistence: CartPersistence::new(storage),
                hydrated: AtomicBool::new(false),
            }),
        }
    }

    /// Replace the in-memory cart with the persisted one.
    ///
    /// Returns the restored state, or `None` when nothing usable was stored,
    /// in which case the current state is kept. Unreadable records are logged
    /// and ignored.
    pub fn restore(&self) -> Option<CartState> {
        let mut restored = None;
        // Load under the channel lock so a concurrent clear cannot interleave
        // between reading storage and publishing the result.
        self.inner.state.send_if_modified(|state| {
            match self.inner.persistence.load() {
                Ok(Some(loaded)) => {
                    *state = loaded.clone();
                    restored = Some(loaded);
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted cart");
                    false
                }
            }
        });
        self.inner.hydrated.store(true, Ordering::Release);
        debug!(restored = restored.is_some(), "Cart hydrated");
        restored
    }

    /// Whether [`Self::restore`] has run.
    #[must_use]
    pub fn has_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::Acquire)
    }

    /// Add a line, or bump the quantity of an existing line with the same ID.
    pub fn add_item(&self, item: CartItem) {
        self.transition("add_item", |state| state.add_item(item));
    }

    /// Remove the line with `id`, if present.
    pub fn remove_item(&self, id: &CartLineId) {
        self.transition("remove_item", |state| state.remove_item(id));
    }

    /// Set a line's quantity. Quantities below 1 are ignored.
    pub fn update_quantity(&self, id: &CartLineId, quantity: i64) {
        self.transition("update_quantity", |state| {
            state.update_quantity(id, quantity)
        });
    }

    /// Remove every line.
    pub fn clear_cart(&self) {
        self.transition("clear_cart", CartState::clear);
    }

    /// Open or close the cart panel.
    pub fn toggle_cart(&self) {
        self.transition("toggle_cart", CartState::toggle);
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.inner.state.borrow().total()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.state.borrow().item_count()
    }

    /// Lines for order creation, without cart-scoped IDs.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.inner.state.borrow().checkout_lines()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Receive the state after every applied transition and after restore.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    fn transition(&self, name: &'static str, apply: impl FnOnce(&mut CartState) -> Outcome) {
        self.inner.state.send_if_modified(|state| match apply(state) {
            Outcome::Applied => {
                if let Err(e) = self.inner.persistence.save(state) {
                    warn!(transition = name, error = %e, "Failed to persist cart");
                }
                debug!(
                    transition = name,
                    items = state.items().len(),
                    open = state.is_open(),
                    "Cart updated"
                );
                true
            }
            Outcome::Rejected => {
                debug!(transition = name, "Cart transition rejected");
                false
            }
        });
    }
}

//! Cart state and its transitions.
//!
//! [`CartState`] is a plain value: every operation mutates it in place and
//! reports whether the transition was applied. Persisting and broadcasting
//! the result is the storefront's job, so everything here runs without a
//! storage backend.

use core::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, ItemSpec, Price, ProductId};

/// Result of a cart transition.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The transition ran; the new state should be persisted.
    Applied,
    /// The transition was refused and the state is untouched.
    Rejected,
}

impl Outcome {
    /// Whether the transition ran.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One line entry in the cart.
///
/// `title`, `image` and `price` are snapshots taken when the line was added;
/// they are not kept in sync with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub price: Price,
    pub quantity: NonZeroU32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specs: Vec<ItemSpec>,
}

impl CartItem {
    /// Create a line with quantity 1, no image and no specs.
    #[must_use]
    pub fn new(
        id: impl Into<CartLineId>,
        product_id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            product_id: product_id.into(),
            title: title.into(),
            image: None,
            price,
            quantity: NonZeroU32::MIN,
            specs: Vec::new(),
        }
    }

    /// Set the image snapshot.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the selected specs.
    #[must_use]
    pub fn with_specs(mut self, specs: Vec<ItemSpec>) -> Self {
        self.specs = specs;
        self
    }

    /// Set the quantity.
    ///
    /// Only meaningful for lines that are already in a cart; [`CartState::add_item`]
    /// ignores the quantity of incoming items.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = quantity;
        self
    }

    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity.get())
    }
}

/// A cart line as the order-creation collaborator sees it.
///
/// Carries the catalog product, never the cart-scoped line ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: NonZeroU32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specs: Vec<ItemSpec>,
}

/// The cart aggregate.
///
/// `items` are unique by [`CartLineId`] and kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    items: Vec<CartItem>,
    is_open: bool,
}

impl CartState {
    /// An empty, closed cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            is_open: false,
        }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart panel is expanded.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by its cart-scoped ID.
    #[must_use]
    pub fn item(&self, id: &CartLineId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Add a line, or bump the quantity of the line with the same ID.
    ///
    /// When the ID is already present only its quantity changes; every other
    /// field of `item` is ignored. New lines always start at quantity 1.
    /// Opens the cart panel either way.
    pub fn add_item(&mut self, item: CartItem) -> Outcome {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
        } else {
            self.items.push(item.with_quantity(NonZeroU32::MIN));
        }
        self.is_open = true;
        Outcome::Applied
    }

    /// Remove the line with `id`, if any.
    pub fn remove_item(&mut self, id: &CartLineId) -> Outcome {
        self.items.retain(|item| &item.id != id);
        Outcome::Applied
    }

    /// Set the quantity of the line with `id`.
    ///
    /// Quantities below 1 (or beyond `u32::MAX`) are rejected without touching
    /// the line. Removing a line is [`Self::remove_item`]'s job.
    pub fn update_quantity(&mut self, id: &CartLineId, quantity: i64) -> Outcome {
        let Some(quantity) = u32::try_from(quantity).ok().and_then(NonZeroU32::new) else {
            return Outcome::Rejected;
        };
        if let Some(item) = self.items.iter_mut().find(|item| &item.id == id) {
            item.quantity = quantity;
        }
        Outcome::Applied
    }

    /// Drop every line. Leaves `is_open` alone.
    pub fn clear(&mut self) -> Outcome {
        self.items.clear();
        Outcome::Applied
    }

    /// Flip the cart panel.
    pub const fn toggle(&mut self) -> Outcome {
        self.is_open = !self.is_open;
        Outcome::Applied
    }

    /// Sum of `price × quantity` over all lines. Not rounded.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Lines for the order-creation collaborator, in cart order.
    #[must_use]
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.items
            .iter()
            .map(|item| CheckoutLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                specs: item.specs.clone(),
            })
            .collect()
    }
}

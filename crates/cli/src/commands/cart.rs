//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! basket add -p p1 -t "Pineapple Tee" --price 28.00 -s size=M
//! basket set-qty 'p1|size=M' 2
//! basket total
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use basket_core::{CartItem, CartLineId, CartState, ItemSpec, Price, ProductId};
use basket_storefront::error::{AppError, Result};
use basket_storefront::store::CartStore;
use rust_decimal::Decimal;

/// Arguments of `basket add`.
#[derive(Debug)]
pub struct AddLine {
    pub product: String,
    pub title: String,
    pub price: String,
    pub image: Option<String>,
    pub specs: Vec<String>,
    pub id: Option<String>,
}

impl AddLine {
    /// Build the cart line to add.
    ///
    /// # Errors
    ///
    /// Returns an error if the price or a spec cannot be parsed.
    pub fn into_item(self) -> Result<CartItem> {
        let amount = Decimal::from_str(self.price.trim())
            .map_err(|e| AppError::BadRequest(format!("invalid price '{}': {e}", self.price)))?;
        let price = Price::new(amount)?;
        let specs = self
            .specs
            .iter()
            .map(|raw| parse_spec(raw))
            .collect::<Result<Vec<_>>>()?;

        let product_id = ProductId::new(self.product);
        let id = self.id.map_or_else(
            || CartLineId::for_variant(&product_id, &specs),
            CartLineId::new,
        );

        let mut item = CartItem::new(id, product_id, self.title, price).with_specs(specs);
        if let Some(image) = self.image {
            item = item.with_image(image);
        }
        Ok(item)
    }
}

/// Parse `name=value`.
///
/// Only values already written as canonical decimals (`6`, `1.5`) become
/// numeric specs; anything else, like `08` or `1.50`, is kept verbatim as text.
fn parse_spec(raw: &str) -> Result<ItemSpec> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::BadRequest(format!("spec '{raw}' must be name=value")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(format!("spec '{raw}' has no name")));
    }
    let value = value.trim();
    match Decimal::from_str(value) {
        Ok(number) if number.normalize().to_string() == value => Ok(ItemSpec::number(name, number)),
        _ => Ok(ItemSpec::text(name, value)),
    }
}

/// Render the cart as a table with a total line.
fn render(state: &CartState) -> String {
    if state.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    for item in state.items() {
        let _ = write!(
            out,
            "{:<32} {:>4} x {:>10} = {:>10}  {}",
            item.id,
            item.quantity,
            item.price.amount(),
            item.line_total(),
            item.title
        );
        if !item.specs.is_empty() {
            let specs: Vec<String> = item
                .specs
                .iter()
                .map(|spec| format!("{}={}", spec.name, spec.value))
                .collect();
            let _ = write!(out, " ({})", specs.join(", "));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} item(s), total {}",
        state.item_count(),
        state.total().round_dp(2)
    );
    out
}

#[allow(clippy::print_stdout)]
fn print_cart(store: &CartStore) {
    print!("{}", render(&store.snapshot()));
}

/// Show the cart.
pub fn show(store: &CartStore) {
    print_cart(store);
}

/// Add a line.
///
/// # Errors
///
/// Returns an error if the line arguments are invalid.
pub fn add(store: &CartStore, line: AddLine) -> Result<()> {
    let item = line.into_item()?;
    tracing::info!(line_id = %item.id, product_id = %item.product_id, "Adding to cart");
    store.add_item(item);
    print_cart(store);
    Ok(())
}

/// Remove a line.
pub fn remove(store: &CartStore, id: &str) {
    store.remove_item(&CartLineId::new(id));
    print_cart(store);
}

/// Set a line's quantity.
pub fn set_quantity(store: &CartStore, id: &str, quantity: i64) {
    store.update_quantity(&CartLineId::new(id), quantity);
    print_cart(store);
}

/// Remove every line.
pub fn clear(store: &CartStore) {
    store.clear_cart();
    print_cart(store);
}

/// Open or close the cart panel.
#[allow(clippy::print_stdout)]
pub fn toggle(store: &CartStore) {
    store.toggle_cart();
    let state = if store.snapshot().is_open() {
        "open"
    } else {
        "closed"
    };
    println!("Cart is {state}");
}

/// Print the unrounded total.
#[allow(clippy::print_stdout)]
pub fn total(store: &CartStore) {
    println!("{}", store.cart_total());
}

/// Print the checkout request as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
#[allow(clippy::print_stdout)]
pub fn checkout(store: &CartStore) -> Result<()> {
    let request = serde_json::json!({
        "lines": store.checkout_lines(),
        "total": store.cart_total(),
    });
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

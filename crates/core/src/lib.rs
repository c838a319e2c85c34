//! Basket Core - Cart types and state transitions.
//!
//! This crate provides the pure half of the Basket shopping cart:
//! - `storefront` - Durable storage, persistent store, ownership sync
//! - `cli` - Terminal front end for the cart
//!
//! # Architecture
//!
//! The core crate contains only types and state transitions - no I/O, no
//! storage access, no HTTP clients. Every cart operation can be exercised
//! here without a storage backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for line IDs, product IDs, prices, specs, and owners
//! - [`cart`] - Cart state and its transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartItem, CartState, CheckoutLine, Outcome};
pub use types::*;

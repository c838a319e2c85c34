//! Basket Storefront library.
//!
//! This crate wires the pure cart transitions from `basket-core` to durable
//! local storage and to the session endpoint:
//!
//! - [`store`] - Observable cart store persisted on every transition
//! - [`storage`] - Durable string-keyed storage (on disk or in memory)
//! - [`services`] - Session endpoint client
//! - [`sync`] - Cart ownership check run once per start
//! - [`startup`] - Ordering of the ownership check against cart restore

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod storage;
pub mod store;
pub mod sync;

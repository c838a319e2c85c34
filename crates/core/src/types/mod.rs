//! Core types for Basket.
//!
//! This module provides type-safe wrappers for common cart concepts.

pub mod id;
pub mod owner;
pub mod price;
pub mod spec;

pub use id::*;
pub use owner::{OwnerTag, SessionInfo};
pub use price::{Price, PriceError};
pub use spec::{ItemSpec, SpecValue};

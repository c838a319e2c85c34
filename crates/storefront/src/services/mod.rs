//! External collaborators of the cart.
//!
//! # Services
//!
//! - `session` - Session endpoint client used to derive the cart owner

pub mod session;

pub use session::{SessionClient, SessionError, SessionSource};

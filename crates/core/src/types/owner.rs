//! Cart ownership: who the persisted cart belongs to.

use core::convert::Infallible;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix for owner tags of authenticated identities.
const USER_PREFIX: &str = "user:";

/// Literal owner tag for guests.
const GUEST: &str = "guest";

/// Identity that last controlled the persisted cart.
///
/// Stored as a plain string: `guest` or `user:<id>`.
///
/// ```
/// use basket_core::OwnerTag;
///
/// assert_eq!(OwnerTag::user("42").to_string(), "user:42");
/// assert_eq!("guest".parse::<OwnerTag>(), Ok(OwnerTag::Guest));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerTag {
    /// No authenticated identity.
    Guest,
    /// An authenticated identity, by its user ID.
    User(String),
    /// A stored tag in neither known form.
    ///
    /// Never produced from a session, so it never matches a current owner.
    Unrecognized(String),
}

impl OwnerTag {
    /// Owner tag for an authenticated user ID.
    #[must_use]
    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }
}

impl fmt::Display for OwnerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => f.write_str(GUEST),
            Self::User(id) => write!(f, "{USER_PREFIX}{id}"),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for OwnerTag {
    fn from(s: &str) -> Self {
        if s == GUEST {
            return Self::Guest;
        }
        match s.strip_prefix(USER_PREFIX) {
            Some(id) if !id.is_empty() => Self::User(id.to_owned()),
            _ => Self::Unrecognized(s.to_owned()),
        }
    }
}

impl FromStr for OwnerTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Session collaborator response.
///
/// Mirrors the session endpoint's JSON body:
/// `{ "authenticated": bool, "userId": string|null, "role"?: string|null }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub authenticated: bool,
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionInfo {
    /// A guest session.
    #[must_use]
    pub const fn guest() -> Self {
        Self {
            authenticated: false,
            user_id: None,
            role: None,
        }
    }

    /// An authenticated session for `user_id`.
    #[must_use]
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
            role: None,
        }
    }

    /// Owner tag the current cart should carry.
    ///
    /// An authenticated session without a usable user ID counts as a guest.
    #[must_use]
    pub fn owner(&self) -> OwnerTag {
        match self.user_id.as_deref() {
            Some(id) if self.authenticated && !id.is_empty() => OwnerTag::user(id),
            _ => OwnerTag::Guest,
        }
    }
}

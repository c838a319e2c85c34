//! Selected options attached to a cart line.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single name/value selection on a cart line (shipping tier, color, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub value: SpecValue,
}

impl ItemSpec {
    /// Create a textual selection.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SpecValue::Text(value.into()),
        }
    }

    /// Create a numeric selection.
    #[must_use]
    pub fn number(name: impl Into<String>, value: Decimal) -> Self {
        Self {
            name: name.into(),
            value: SpecValue::Number(value),
        }
    }
}

/// Value of a spec selection: either text or a number.
///
/// Serialized adjacently tagged, with numbers as exact decimal strings:
/// `{"kind": "number", "value": "12.50"}` or `{"kind": "text", "value": "red"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SpecValue {
    Number(#[serde(with = "rust_decimal::serde::str")] Decimal),
    Text(String),
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", number.normalize()),
        }
    }
}

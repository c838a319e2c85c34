//! Newtype IDs for type-safe cart references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing a cart line ID with the catalog product it points at.

use super::spec::{ItemSpec, SpecValue};

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>`, `From<String>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use basket_core::define_id;
/// define_id!(LineId);
/// define_id!(SkuId);
///
/// let line_id = LineId::new("a");
/// let sku_id = SkuId::new("a");
///
/// // These are different types, so this won't compile:
/// // let _: LineId = sku_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Cart line identity, scoped to a single cart.
define_id!(CartLineId);
// Catalog product reference, only meaningful to backend collaborators.
define_id!(ProductId);

impl CartLineId {
    /// Derive a line ID for a product with a particular selection of specs.
    ///
    /// The same product with the same specs (in the same order) always maps
    /// to the same line, while a different selection yields a different line.
    /// Text specs are written `name=value` and numeric specs `name#value`;
    /// `%`, `|`, `=` and `#` inside any component are percent-escaped, so
    /// distinct selections never collide. Callers that build their own IDs
    /// must uphold that property themselves; the cart merges lines by ID
    /// alone.
    ///
    /// ```
    /// use basket_core::{CartLineId, ItemSpec, ProductId};
    /// use rust_decimal::Decimal;
    ///
    /// let product = ProductId::new("p1");
    /// let plain = CartLineId::for_variant(&product, &[]);
    /// let red = CartLineId::for_variant(&product, &[ItemSpec::text("color", "red")]);
    /// let two = CartLineId::for_variant(&product, &[ItemSpec::number("lines", Decimal::TWO)]);
    ///
    /// assert_eq!(plain.as_str(), "p1");
    /// assert_eq!(red.as_str(), "p1|color=red");
    /// assert_eq!(two.as_str(), "p1|lines#2");
    /// ```
    #[must_use]
    pub fn for_variant(product_id: &ProductId, specs: &[ItemSpec]) -> Self {
        let mut id = String::new();
        push_escaped(&mut id, product_id.as_str());
        for spec in specs {
            id.push('|');
            push_escaped(&mut id, &spec.name);
            match &spec.value {
                SpecValue::Text(text) => {
                    id.push('=');
                    push_escaped(&mut id, text);
                }
                SpecValue::Number(number) => {
                    id.push('#');
                    id.push_str(&number.normalize().to_string());
                }
            }
        }
        Self(id)
    }
}

fn push_escaped(out: &mut String, component: &str) {
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            '=' => out.push_str("%3D"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
}

//! Strongly-typed identifiers used across the domain.
//!
//! The backend owns every document and hands out opaque string identifiers
//! (document ids, sometimes serialized as `_id`). The only local rule is that an
//! identifier is never empty.

/// Declare an opaque, non-empty string identifier.
///
/// The generated type deserializes through `TryFrom<String>`, so an empty id in
/// a backend response is rejected at the boundary.
#[macro_export]
macro_rules! string_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(String);

        impl $t {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err($crate::DomainError::invalid_id(concat!($name, " cannot be empty")));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl core::str::FromStr for $t {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a back-office user.
    UserId,
    "UserId"
);
string_id!(
    /// Identifier of a catalog product.
    ProductId,
    "ProductId"
);
string_id!(
    /// Identifier of a product variant (colour, material, ...).
    VariantId,
    "VariantId"
);
string_id!(
    /// Identifier of a stock location.
    StockId,
    "StockId"
);

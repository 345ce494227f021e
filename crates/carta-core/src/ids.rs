//! Identifier newtypes for upstream records.
//!
//! The storefront API is inconsistent about id encoding: the same record may
//! carry `"id": 7` in one endpoint and `"id": "7"` in another. Both forms
//! deserialize to the same id; ids always serialize as strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }
    };
}

string_id!(
    /// Identifier of a menu category (`grupo_id` / `categoriaId` upstream).
    CategoryId
);

string_id!(
    /// Identifier of a product, scoped within its category.
    ProductId
);

/// Identity of a single product record: the category it is scoped to plus
/// its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductKey {
    pub category_id: CategoryId,
    pub product_id: ProductId,
}

impl ProductKey {
    #[must_use]
    pub fn new(category_id: CategoryId, product_id: ProductId) -> Self {
        Self {
            category_id,
            product_id,
        }
    }

    /// Builds a key only when both halves are known.
    #[must_use]
    pub fn from_parts(
        category_id: Option<CategoryId>,
        product_id: Option<ProductId>,
    ) -> Option<Self> {
        Some(Self::new(category_id?, product_id?))
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category_id, self.product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_deserialize_to_the_same_value() {
        let from_int: CategoryId = serde_json::from_str("7").unwrap();
        let from_str: CategoryId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "7");
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = ProductId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn product_key_needs_both_parts() {
        assert!(ProductKey::from_parts(Some("1".into()), None).is_none());
        assert!(ProductKey::from_parts(None, Some("2".into())).is_none());
        let key = ProductKey::from_parts(Some("1".into()), Some("2".into())).unwrap();
        assert_eq!(key.to_string(), "1/2");
    }

    #[test]
    fn non_scalar_id_is_rejected() {
        assert!(serde_json::from_str::<ProductId>("{\"id\": 1}").is_err());
    }
}

//! Identity types for catalog items, user creations and users.
//!
//! Catalog identifiers are short numeric strings (`"52772"`), user creations
//! are keyed by UUID. The two are told apart once, when an identifier enters
//! the system, and carried as an [`ItemRef`] from then on.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Authenticated user identifier issued by the hosted backend.
pub type UserId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

static UGC_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("UGC id pattern is a valid regex")
});

/// Returns true when `raw` has the hyphenated UUID shape used by user creations.
pub fn is_ugc_id(raw: &str) -> bool {
    UGC_ID_PATTERN.is_match(raw)
}

// ============================================================================
// CONTENT TYPE
// ============================================================================

/// Kind of item a favorite or search hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Meal,
    Cocktail,
}

impl ContentType {
    /// Both content types, in the order favorites are stored.
    pub const ALL: [ContentType; 2] = [ContentType::Meal, ContentType::Cocktail];

    /// Value stored in the `item_type` column.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ContentType::Meal => "meal",
            ContentType::Cocktail => "cocktail",
        }
    }

    /// Parse from the `item_type` column value.
    pub fn from_db_str(s: &str) -> Result<Self, ContentTypeParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meal" => Ok(ContentType::Meal),
            "cocktail" => Ok(ContentType::Cocktail),
            _ => Err(ContentTypeParseError(s.to_string())),
        }
    }

    /// Device-local storage key holding favorites of this type.
    pub fn local_storage_key(&self) -> &'static str {
        match self {
            ContentType::Meal => "favoriteMealIds",
            ContentType::Cocktail => "favoriteCocktailIds",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db_str())
    }
}

impl FromStr for ContentType {
    type Err = ContentTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid content type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeParseError(pub String);

impl fmt::Display for ContentTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid content type: {}", self.0)
    }
}

impl std::error::Error for ContentTypeParseError {}

// ============================================================================
// ITEM REFERENCES
// ============================================================================

/// Where an item's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// One of the two public read-only catalogs.
    Catalog,
    /// The `user_creations` table.
    UserGenerated,
}

/// Tagged identifier for anything that can be displayed or favorited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub source: ItemSource,
    pub content_type: ContentType,
    pub id: String,
}

impl ItemRef {
    pub fn catalog(content_type: ContentType, id: impl Into<String>) -> Self {
        Self {
            source: ItemSource::Catalog,
            content_type,
            id: id.into(),
        }
    }

    pub fn user_generated(content_type: ContentType, id: Uuid) -> Self {
        Self {
            source: ItemSource::UserGenerated,
            content_type,
            id: id.to_string(),
        }
    }

    /// Tag a raw identifier by its shape.
    ///
    /// Only call this where an untagged identifier first enters the system
    /// (a route parameter, a stored favorite). Everything downstream matches
    /// on [`ItemRef::source`].
    pub fn classify(content_type: ContentType, raw: &str) -> Self {
        let raw = raw.trim();
        let source = if is_ugc_id(raw) {
            ItemSource::UserGenerated
        } else {
            ItemSource::Catalog
        };
        Self {
            source,
            content_type,
            id: raw.to_string(),
        }
    }

    /// Parsed UUID for user-generated items.
    pub fn creation_id(&self) -> Option<Uuid> {
        match self.source {
            ItemSource::UserGenerated => Uuid::parse_str(&self.id).ok(),
            ItemSource::Catalog => None,
        }
    }

    pub fn is_user_generated(&self) -> bool {
        self.source == ItemSource::UserGenerated
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ItemSource::Catalog => "catalog",
            ItemSource::UserGenerated => "ugc",
        };
        write!(f, "{}:{}:{}", source, self.content_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_content_type_db_roundtrip() {
        for ct in ContentType::ALL {
            assert_eq!(ContentType::from_db_str(ct.as_db_str()), Ok(ct));
        }
        assert_eq!("Cocktail".parse::<ContentType>(), Ok(ContentType::Cocktail));
        assert!(ContentType::from_db_str("dessert").is_err());
    }

    #[test]
    fn test_content_type_storage_keys() {
        assert_eq!(ContentType::Meal.local_storage_key(), "favoriteMealIds");
        assert_eq!(ContentType::Cocktail.local_storage_key(), "favoriteCocktailIds");
    }

    #[test]
    fn test_content_type_serde_uses_lowercase() {
        let json = serde_json::to_string(&ContentType::Cocktail).unwrap();
        assert_eq!(json, "\"cocktail\"");
    }

    #[test]
    fn test_classify_catalog_id() {
        let item = ItemRef::classify(ContentType::Meal, "52772");
        assert_eq!(item.source, ItemSource::Catalog);
        assert_eq!(item.creation_id(), None);
    }

    #[test]
    fn test_classify_ugc_id() {
        let id = Uuid::new_v4();
        let item = ItemRef::classify(ContentType::Cocktail, &id.to_string());
        assert!(item.is_user_generated());
        assert_eq!(item.creation_id(), Some(id));
        assert_eq!(item, ItemRef::user_generated(ContentType::Cocktail, id));
    }

    #[test]
    fn test_classify_rejects_unhyphenated_uuid() {
        let simple = Uuid::new_v4().simple().to_string();
        assert!(!is_ugc_id(&simple));
    }

    #[test]
    fn test_item_ref_display() {
        let item = ItemRef::catalog(ContentType::Meal, "52772");
        assert_eq!(item.to_string(), "catalog:meal:52772");
    }

    proptest! {
        #[test]
        fn prop_any_uuid_classifies_as_ugc(bytes in any::<[u8; 16]>()) {
            let id = Uuid::from_bytes(bytes);
            prop_assert!(is_ugc_id(&id.to_string()));
            prop_assert!(is_ugc_id(&id.hyphenated().to_string().to_uppercase()));
        }

        #[test]
        fn prop_numeric_ids_classify_as_catalog(n in 0u64..10_000_000) {
            let item = ItemRef::classify(ContentType::Meal, &n.to_string());
            prop_assert_eq!(item.source, ItemSource::Catalog);
        }
    }
}

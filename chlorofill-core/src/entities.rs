//! Rows of the hosted backend tables and the values derived from them.

use crate::identity::{ContentType, ItemRef, ItemSource, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// FAVORITES
// ============================================================================

/// One row of `user_favorites`. Unique per (user_id, item_id, item_type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub user_id: UserId,
    pub item_id: String,
    pub item_type: ContentType,
}

impl FavoriteRow {
    pub fn new(user_id: UserId, item_id: impl Into<String>, item_type: ContentType) -> Self {
        Self {
            user_id,
            item_id: item_id.into(),
            item_type,
        }
    }
}

// ============================================================================
// USER CREATIONS
// ============================================================================

/// Kind stored in the `type` column of `user_creations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationType {
    Recipe,
    Cocktail,
}

impl CreationType {
    /// Recipes are listed alongside meals, cocktails alongside cocktails.
    pub fn content_type(&self) -> ContentType {
        match self {
            CreationType::Recipe => ContentType::Meal,
            CreationType::Cocktail => ContentType::Cocktail,
        }
    }
}

/// An ingredient line of a user creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A row of `user_creations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreation {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub creation_type: CreationType,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl UserCreation {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef::user_generated(self.creation_type.content_type(), self.id)
    }

    /// Case-insensitive match on title, description, or an exact tag.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
            || self.tags.iter().any(|t| t.to_lowercase() == needle)
    }
}

/// Payload for inserting a creation. The owner is attached by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreation {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(rename = "type")]
    pub creation_type: CreationType,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for a creation. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl CreationUpdate {
    /// Apply the present fields onto `creation`.
    pub fn apply_to(&self, creation: &mut UserCreation) {
        if let Some(title) = &self.title {
            creation.title = title.clone();
        }
        if let Some(description) = &self.description {
            creation.description = Some(description.clone());
        }
        if let Some(steps) = &self.steps {
            creation.steps = steps.clone();
        }
        if let Some(ingredients) = &self.ingredients {
            creation.ingredients = ingredients.clone();
        }
        if let Some(image_path) = &self.image_path {
            creation.image_path = Some(image_path.clone());
        }
        if let Some(is_public) = self.is_public {
            creation.is_public = is_public;
        }
        if let Some(tags) = &self.tags {
            creation.tags = tags.clone();
        }
        if let Some(updated_at) = self.updated_at {
            creation.updated_at = Some(updated_at);
        }
    }
}

// ============================================================================
// SEARCH
// ============================================================================

/// Uniform search result over catalog items and user creations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub content_type: ContentType,
    pub source: ItemSource,
    pub thumb: Option<String>,
}

impl SearchHit {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            source: self.source,
            content_type: self.content_type,
            id: self.id.clone(),
        }
    }
}

impl From<&UserCreation> for SearchHit {
    fn from(creation: &UserCreation) -> Self {
        Self {
            id: creation.id.to_string(),
            name: creation.title.clone(),
            content_type: creation.creation_type.content_type(),
            source: ItemSource::UserGenerated,
            thumb: creation.image_path.clone(),
        }
    }
}

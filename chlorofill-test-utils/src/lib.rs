//! ChloroFill Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for identifiers and content types
//! - A scripted catalog transport that counts requests
//! - Fixtures for catalog payloads and user creations

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chlorofill_catalog::CatalogTransport;
use chlorofill_core::CatalogError;
use serde_json::Value;

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

#[derive(Debug, Clone)]
enum Scripted {
    Json(Value),
    Status(u16),
}

/// Catalog transport that answers from a script keyed by URL.
///
/// Unscripted URLs fail with a 404. Every request is recorded, including
/// failed ones.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<HashMap<String, Scripted>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `payload`.
    pub fn respond(self, url: impl Into<String>, payload: Value) -> Self {
        self.set(url, Scripted::Json(payload));
        self
    }

    /// Answer `url` with a non-success status.
    pub fn fail(self, url: impl Into<String>, status: u16) -> Self {
        self.set(url, Scripted::Status(status));
        self
    }

    /// Replace the answer for `url` on a transport already in use.
    pub fn rescript(&self, url: impl Into<String>, payload: Value) {
        self.set(url, Scripted::Json(payload));
    }

    fn set(&self, url: impl Into<String>, answer: Scripted) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), answer);
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl CatalogTransport for ScriptedTransport {
    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        let answer = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned();
        match answer {
            Some(Scripted::Json(payload)) => Ok(payload),
            Some(Scripted::Status(status)) => Err(CatalogError::RequestFailed {
                url: url.to_string(),
                status,
            }),
            None => Err(CatalogError::RequestFailed {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use chlorofill_core::ContentType;
    use proptest::prelude::*;
    use uuid::Uuid;

    pub fn arb_content_type() -> impl Strategy<Value = ContentType> {
        prop_oneof![Just(ContentType::Meal), Just(ContentType::Cocktail)]
    }

    /// Numeric catalog identifiers, as both catalogs issue them.
    pub fn arb_catalog_id() -> impl Strategy<Value = String> {
        (1u32..999_999).prop_map(|n| n.to_string())
    }

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Either kind of item identifier.
    pub fn arb_item_id() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => arb_catalog_id(),
            1 => arb_uuid().prop_map(|u| u.to_string()),
        ]
    }

    /// Distinct item identifiers, in generation order.
    pub fn arb_unique_ids(max: usize) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::hash_set(arb_catalog_id(), 0..=max)
            .prop_map(|set| set.into_iter().collect())
    }

    /// Cache keys in the shapes the catalogs derive.
    pub fn arb_cache_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("categories".to_string()),
            "[A-Za-z]{3,12}".prop_map(|c| format!("category_{}", c)),
            arb_catalog_id().prop_map(|id| format!("recipe_{}", id)),
            arb_catalog_id().prop_map(|id| format!("cocktail_{}", id)),
        ]
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    use chlorofill_catalog::{COCKTAIL_API_BASE_URL, MEAL_API_BASE_URL};
    use chlorofill_core::{CreationType, Ingredient, NewCreation, UserCreation, UserId};
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    pub const MEAL_BASE: &str = MEAL_API_BASE_URL;
    pub const COCKTAIL_BASE: &str = COCKTAIL_API_BASE_URL;

    pub fn meal_url(path: &str) -> String {
        format!("{}/{}", MEAL_BASE, path)
    }

    pub fn cocktail_url(path: &str) -> String {
        format!("{}/{}", COCKTAIL_BASE, path)
    }

    /// Full lookup record for Teriyaki Chicken Casserole.
    pub fn teriyaki_meal() -> Value {
        json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strCategory": "Chicken",
            "strArea": "Japanese",
            "strInstructions": "Preheat oven to 350F.",
            "strMealThumb": "https://www.themealdb.com/images/media/meals/wvpsxx1468256321.jpg",
            "strTags": "Meat,Casserole",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "water",
            "strMeasure2": "1/2 cup",
            "strIngredient3": "",
            "strMeasure3": ""
        })
    }

    /// Full lookup record for the Margarita.
    pub fn margarita_drink() -> Value {
        json!({
            "idDrink": "11007",
            "strDrink": "Margarita",
            "strCategory": "Ordinary Drink",
            "strAlcoholic": "Alcoholic",
            "strGlass": "Cocktail glass",
            "strDrinkThumb": "https://www.thecocktaildb.com/images/media/drink/5noda61589575158.jpg",
            "strIngredient1": "Tequila",
            "strMeasure1": "1 1/2 oz ",
            "strIngredient2": "Triple sec",
            "strMeasure2": "1/2 oz ",
            "strIngredient3": null
        })
    }

    pub fn meals_envelope(meals: Vec<Value>) -> Value {
        json!({ "meals": meals })
    }

    pub fn drinks_envelope(drinks: Vec<Value>) -> Value {
        json!({ "drinks": drinks })
    }

    pub fn empty_meals() -> Value {
        json!({ "meals": null })
    }

    pub fn empty_drinks() -> Value {
        json!({ "drinks": null })
    }

    pub fn new_recipe(title: &str) -> NewCreation {
        NewCreation {
            title: title.to_string(),
            description: Some("Family recipe".to_string()),
            steps: vec!["Chop".to_string(), "Simmer".to_string()],
            ingredients: vec![Ingredient {
                name: "Chickpeas".to_string(),
                amount: Some("200".to_string()),
                unit: Some("g".to_string()),
                image_url: None,
            }],
            image_path: None,
            creation_type: CreationType::Recipe,
            is_public: true,
            tags: vec!["vegan".to_string()],
        }
    }

    pub fn public_creation(user_id: UserId, title: &str, creation_type: CreationType) -> UserCreation {
        UserCreation {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: None,
            steps: vec![],
            ingredients: vec![],
            image_path: Some(format!("creations/{}.jpg", title.to_lowercase())),
            creation_type,
            is_public: true,
            is_approved: false,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_transport_records_every_request() {
        let transport = ScriptedTransport::new()
            .respond("http://a/1", json!({ "meals": [] }))
            .fail("http://a/2", 500);

        assert!(transport.get_json("http://a/1").await.is_ok());
        let err = transport.get_json("http://a/2").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        let err = transport.get_json("http://a/3").await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.requests_for("http://a/1"), 1);
    }

    #[tokio::test]
    async fn test_rescript_replaces_answer() {
        let transport = ScriptedTransport::new().respond("u", json!(1));
        transport.rescript("u", json!(2));
        assert_eq!(transport.get_json("u").await.unwrap(), json!(2));
    }
}

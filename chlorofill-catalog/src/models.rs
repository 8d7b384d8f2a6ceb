//! Catalog entities, named after the catalogs' JSON fields.
//!
//! Filter endpoints return abbreviated records (id, name, thumbnail), lookup
//! endpoints the full record; both decode into [`Meal`] / [`Drink`]. Fields
//! not modelled explicitly are kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use chlorofill_core::{ContentType, ItemRef, ItemSource, SearchHit};

/// Highest `strIngredientN` index either catalog uses.
const MAX_INGREDIENT_SLOTS: usize = 20;

/// An ingredient line assembled from `strIngredientN` / `strMeasureN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIngredient {
    pub name: String,
    pub measure: Option<String>,
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn collect_ingredients(extra: &BTreeMap<String, Value>) -> Vec<CatalogIngredient> {
    (1..=MAX_INGREDIENT_SLOTS)
        .filter_map(|i| {
            let name = non_blank(extra.get(&format!("strIngredient{}", i)))?;
            let measure = non_blank(extra.get(&format!("strMeasure{}", i)));
            Some(CatalogIngredient { name, measure })
        })
        .collect()
}

// ============================================================================
// MEALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumb: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strArea", default)]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "strTags", default)]
    pub tags: Option<String>,
    #[serde(rename = "strYoutube", default)]
    pub youtube: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Meal {
    pub fn ingredients(&self) -> Vec<CatalogIngredient> {
        collect_ingredients(&self.extra)
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::catalog(ContentType::Meal, self.id.clone())
    }

    pub fn search_hit(&self) -> SearchHit {
        SearchHit {
            id: self.id.clone(),
            name: self.name.clone(),
            content_type: ContentType::Meal,
            source: ItemSource::Catalog,
            thumb: self.thumb.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealCategory {
    #[serde(rename = "idCategory")]
    pub id: String,
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb", default)]
    pub thumb: Option<String>,
    #[serde(rename = "strCategoryDescription", default)]
    pub description: Option<String>,
}

/// A cuisine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    #[serde(rename = "strArea")]
    pub name: String,
}

// ============================================================================
// DRINKS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drink {
    #[serde(rename = "idDrink")]
    pub id: String,
    #[serde(rename = "strDrink")]
    pub name: String,
    #[serde(rename = "strDrinkThumb", default)]
    pub thumb: Option<String>,
    #[serde(rename = "strCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "strAlcoholic", default)]
    pub alcoholic: Option<String>,
    #[serde(rename = "strGlass", default)]
    pub glass: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Drink {
    pub fn ingredients(&self) -> Vec<CatalogIngredient> {
        collect_ingredients(&self.extra)
    }

    pub fn item_ref(&self) -> ItemRef {
        ItemRef::catalog(ContentType::Cocktail, self.id.clone())
    }

    pub fn search_hit(&self) -> SearchHit {
        SearchHit {
            id: self.id.clone(),
            name: self.name.clone(),
            content_type: ContentType::Cocktail,
            source: ItemSource::Catalog,
            thumb: self.thumb.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkCategory {
    #[serde(rename = "strCategory")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlcoholicFilter {
    #[serde(rename = "strAlcoholic")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlassType {
    #[serde(rename = "strGlass")]
    pub name: String,
}

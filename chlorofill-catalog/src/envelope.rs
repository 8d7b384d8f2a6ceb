//! Catalog response envelopes.
//!
//! Every catalog endpoint answers `{ "<field>": [ ... ] }`, and uses `null`
//! (or omits the field) when nothing matched. Both are an empty list here.

use chlorofill_core::CatalogError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode the list under `field`.
pub fn list_field<E: DeserializeOwned>(
    payload: &Value,
    field: &str,
    url: &str,
) -> Result<Vec<E>, CatalogError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                E::deserialize(item).map_err(|e| CatalogError::DecodeFailed {
                    url: url.to_string(),
                    reason: format!("{}: {}", field, e),
                })
            })
            .collect(),
        Some(other) => Err(CatalogError::DecodeFailed {
            url: url.to_string(),
            reason: format!("{} is not a list: {}", field, other),
        }),
    }
}

/// First element of the list under `field`, for lookup-by-id endpoints.
pub fn first_of<E: DeserializeOwned>(
    payload: &Value,
    field: &str,
    url: &str,
) -> Result<Option<E>, CatalogError> {
    Ok(list_field(payload, field, url)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Named {
        #[serde(rename = "strArea")]
        name: String,
    }

    #[test]
    fn test_null_and_absent_are_empty() {
        let null: Vec<Named> = list_field(&json!({ "meals": null }), "meals", "u").unwrap();
        let absent: Vec<Named> = list_field(&json!({}), "meals", "u").unwrap();
        assert!(null.is_empty());
        assert!(absent.is_empty());
    }

    #[test]
    fn test_array_is_decoded() {
        let payload = json!({ "meals": [{ "strArea": "Indian" }, { "strArea": "Thai" }] });
        let areas: Vec<Named> = list_field(&payload, "meals", "u").unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[1].name, "Thai");
    }

    #[test]
    fn test_non_array_is_decode_failed() {
        let payload = json!({ "drinks": "no data found" });
        let err = list_field::<Named>(&payload, "drinks", "u").unwrap_err();
        assert!(matches!(err, CatalogError::DecodeFailed { .. }));
    }

    #[test]
    fn test_bad_element_is_decode_failed() {
        let payload = json!({ "meals": [{ "strArea": 7 }] });
        assert!(list_field::<Named>(&payload, "meals", "u").is_err());
    }

    #[test]
    fn test_first_of() {
        let payload = json!({ "meals": [{ "strArea": "Indian" }] });
        let first: Option<Named> = first_of(&payload, "meals", "u").unwrap();
        assert_eq!(first.map(|n| n.name), Some("Indian".to_string()));
        let none: Option<Named> = first_of(&json!({ "meals": null }), "meals", "u").unwrap();
        assert!(none.is_none());
    }
}

//! # Search Filters
//!
//! Builds the filter payload the ATS search endpoints expect:
//!
//! ```json
//! {
//!   "filters": { "groups": [ { "operator": "and", "filters": [
//!     { "field": "current_stage__name", "operator": "equals", "value": "Match" }
//!   ] } ] },
//!   "page": 1,
//!   "page_size": 100,
//!   "search": null
//! }
//! ```
//!
//! The engine itself only ever filters on the current stage name; the
//! richer combinators exist for the candidate-search tools. Custom fields
//! are addressed as `custom_fields__<question id>`, address fields as
//! `address__<name>`, and boolean values are rendered as the literal
//! strings the ATS stores (`"Sí"` / `"No"`).

use serde::Serialize;
use serde_json::{Value, json};

/// Field name of a candidature's current stage.
const CURRENT_STAGE_FIELD: &str = "current_stage__name";

// =============================================================================
// FILTER EXPRESSIONS
// =============================================================================

/// One equality condition in a filter group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: String,
    pub value: Value,
}

/// A conjunction of equality conditions, ready to serialize as a search
/// payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExpr {
    conditions: Vec<FilterCondition>,
}

impl FilterExpr {
    /// Empty filter (matches everything).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Filter on the candidature's current stage name.
    #[must_use]
    pub fn current_stage(stage_name: &str) -> Self {
        Self::none().and_equals(CURRENT_STAGE_FIELD, stage_name)
    }

    /// Add an equality condition on a top-level field.
    #[must_use]
    pub fn and_equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(FilterCondition {
            field: field.to_string(),
            operator: "equals".to_string(),
            value: value.into(),
        });
        self
    }

    /// Add an equality condition on a custom field by question id.
    ///
    /// Boolean values are converted to the ATS's stored select strings.
    #[must_use]
    pub fn and_custom_field(self, question_id: &str, value: Value) -> Self {
        let field = format!("custom_fields__{question_id}");
        self.and_equals(&field, select_value(value))
    }

    /// Add an equality condition on an address field (`city`, `state`,
    /// `postal_code`, ...).
    #[must_use]
    pub fn and_address_field(self, name: &str, value: impl Into<Value>) -> Self {
        let field = format!("address__{name}");
        self.and_equals(&field, value)
    }

    /// Build a conjunction from a map of field id to value, as the search
    /// tools accept it: keys with an `address__` prefix target address
    /// fields, every other key is a custom-field question id. Null values
    /// are skipped.
    #[must_use]
    pub fn from_field_map(filters: &serde_json::Map<String, Value>) -> Self {
        let mut expr = Self::none();
        for (field_id, value) in filters {
            if value.is_null() {
                continue;
            }
            expr = if let Some(address_field) = field_id.strip_prefix("address__") {
                expr.and_address_field(address_field, value.clone())
            } else {
                expr.and_custom_field(field_id, value.clone())
            };
        }
        expr
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Serialize as the full search payload for one page.
    #[must_use]
    pub fn search_payload(&self, page: u32, page_size: u32, free_text: Option<&str>) -> Value {
        json!({
            "filters": {
                "groups": [
                    {
                        "operator": "and",
                        "filters": self.conditions,
                    }
                ]
            },
            "page": page,
            "page_size": page_size,
            "search": free_text,
        })
    }
}

/// Render a value the way the ATS stores custom-field selects: booleans
/// become `"Sí"` / `"No"`, everything else passes through.
fn select_value(value: Value) -> Value {
    match value {
        Value::Bool(true) => Value::String("Sí".to_string()),
        Value::Bool(false) => Value::String("No".to_string()),
        other => other,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_stage_payload_shape() {
        let payload = FilterExpr::current_stage("Match").search_payload(1, 100, None);

        assert_eq!(
            payload,
            json!({
                "filters": {
                    "groups": [
                        {
                            "operator": "and",
                            "filters": [
                                {
                                    "field": "current_stage__name",
                                    "operator": "equals",
                                    "value": "Match"
                                }
                            ]
                        }
                    ]
                },
                "page": 1,
                "page_size": 100,
                "search": null
            })
        );
    }

    #[test]
    fn custom_field_booleans_become_select_strings() {
        let expr = FilterExpr::none()
            .and_custom_field("q1", json!(true))
            .and_custom_field("q2", json!(false))
            .and_custom_field("q3", json!("Madrid"));
        let payload = expr.search_payload(2, 50, None);

        let filters = &payload["filters"]["groups"][0]["filters"];
        assert_eq!(filters[0]["field"], "custom_fields__q1");
        assert_eq!(filters[0]["value"], "Sí");
        assert_eq!(filters[1]["value"], "No");
        assert_eq!(filters[2]["value"], "Madrid");
    }

    #[test]
    fn address_fields_get_their_prefix() {
        let expr = FilterExpr::none().and_address_field("city", "Valencia");
        let payload = expr.search_payload(1, 10, Some("plumber"));

        let filters = &payload["filters"]["groups"][0]["filters"];
        assert_eq!(filters[0]["field"], "address__city");
        assert_eq!(payload["search"], "plumber");
    }

    #[test]
    fn field_map_splits_custom_and_address_fields_and_skips_nulls() {
        let map = json!({
            "66aabbccddeeff0011223344": true,
            "address__city": "Madrid",
            "ignored": null
        });
        let expr = FilterExpr::from_field_map(map.as_object().expect("map"));
        let filters = expr.search_payload(1, 10, None)["filters"]["groups"][0]["filters"].clone();

        let fields: Vec<&str> = filters
            .as_array()
            .expect("array")
            .iter()
            .map(|f| f["field"].as_str().expect("field"))
            .collect();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&"custom_fields__66aabbccddeeff0011223344"));
        assert!(fields.contains(&"address__city"));
    }

    #[test]
    fn empty_filter_serializes_an_empty_group() {
        let payload = FilterExpr::none().search_payload(1, 1, None);
        assert!(FilterExpr::none().is_empty());
        assert_eq!(
            payload["filters"]["groups"][0]["filters"],
            json!([])
        );
    }
}

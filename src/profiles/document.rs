use super::composite::CompositeScore;
use super::{CoverageStatus, Rating};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One category's aggregated score. When the override engine replaces the
/// score, the pre-override value is preserved for audit.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryScore {
    pub score: f64,
    pub rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_annual_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_override_score: Option<f64>,
}

impl CategoryScore {
    pub fn zero(has_loss: bool) -> Self {
        Self {
            score: 0.0,
            rating: Rating::from_unit(0.0),
            expected_annual_loss: has_loss.then_some(0.0),
            pre_override_score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopCategory {
    pub category: String,
    pub label: String,
    pub score: f64,
    pub rating: Rating,
}

/// Per-source slice of an entity's profile. Categories are flattened into the
/// source object so every known category key is always present in the output.
#[derive(Debug, Clone, Serialize)]
pub struct SourceProfile {
    pub composite: CompositeScore,
    #[serde(flatten)]
    pub categories: BTreeMap<String, CategoryScore>,
    #[serde(rename = "top_n")]
    pub top_categories: Vec<TopCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expected_loss: Option<f64>,
    pub counties_analyzed: usize,
    pub coverage_status: CoverageStatus,
}

/// The serialized per-entity document, written once per batch run.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDocument {
    pub entity_id: String,
    pub name: String,
    pub sources: BTreeMap<String, SourceProfile>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_flatten_next_to_the_composite() {
        let mut categories = BTreeMap::new();
        categories.insert("wildfire".to_string(), CategoryScore::zero(true));

        let profile = SourceProfile {
            composite: CompositeScore::no_data(&[]),
            categories,
            top_categories: Vec::new(),
            total_expected_loss: None,
            counties_analyzed: 0,
            coverage_status: CoverageStatus::Unavailable,
        };

        let value = serde_json::to_value(&profile).expect("serializes");
        assert!(value.get("composite").is_some());
        assert!(value.get("wildfire").is_some(), "category keys sit at the source level");
        assert_eq!(value["coverage_status"], "unavailable");
        assert_eq!(value["wildfire"]["rating"], "Very Low");
        assert_eq!(value["wildfire"]["expected_annual_loss"], 0.0);
    }
}

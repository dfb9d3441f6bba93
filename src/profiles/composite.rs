use super::Rating;
use serde::Serialize;

/// Named component feeding a composite, `None` when the source column was
/// missing for this entity.
#[derive(Debug, Clone)]
pub struct ComponentInput {
    pub name: String,
    pub weight: f64,
    pub value: Option<f64>,
}

impl ComponentInput {
    pub fn new(name: impl Into<String>, weight: f64, value: Option<f64>) -> Self {
        Self {
            name: name.into(),
            weight,
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentScore {
    pub name: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weighted_score: Option<f64>,
    pub available: bool,
}

/// Weighted combination of component scores with graceful redistribution
/// when components are missing.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeScore {
    pub score: f64,
    pub rating: Rating,
    pub components: Vec<ComponentScore>,
    pub data_completeness_factor: f64,
    pub confidence_note: String,
}

impl CompositeScore {
    /// Composite for an entity with no usable data at all.
    pub fn no_data(components: &[ComponentInput]) -> Self {
        Self {
            score: 0.0,
            rating: Rating::from_unit(0.0),
            components: components
                .iter()
                .map(|component| ComponentScore {
                    name: component.name.clone(),
                    weight: component.weight,
                    raw_score: None,
                    weighted_score: None,
                    available: false,
                })
                .collect(),
            data_completeness_factor: 0.0,
            confidence_note: "no data available for any component".to_string(),
        }
    }
}

/// Redistributes the configured weights over the components that are present:
/// the score is the weighted mean over available components, and the
/// completeness factor records how much of the configured weight that covers.
pub fn compute(components: &[ComponentInput]) -> CompositeScore {
    let configured_weight: f64 = components.iter().map(|component| component.weight).sum();
    let available_weight: f64 = components
        .iter()
        .filter(|component| component.value.is_some())
        .map(|component| component.weight)
        .sum();

    if available_weight <= 0.0 || configured_weight <= 0.0 {
        return CompositeScore::no_data(components);
    }

    let weighted_sum: f64 = components
        .iter()
        .filter_map(|component| component.value.map(|value| value * component.weight))
        .sum();
    let score = weighted_sum / available_weight;

    let mut missing: Vec<&str> = components
        .iter()
        .filter(|component| component.value.is_none())
        .map(|component| component.name.as_str())
        .collect();
    missing.sort_unstable();

    let confidence_note = if missing.is_empty() {
        "all components available".to_string()
    } else {
        format!("components unavailable: {}", missing.join(", "))
    };

    CompositeScore {
        score,
        rating: Rating::from_unit(score),
        components: components
            .iter()
            .map(|component| ComponentScore {
                name: component.name.clone(),
                weight: component.weight,
                raw_score: component.value,
                weighted_score: component.value.map(|value| value * component.weight),
                available: component.value.is_some(),
            })
            .collect(),
        data_completeness_factor: available_weight / configured_weight,
        confidence_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_components_redistribute_weight() {
        let components = vec![
            ComponentInput::new("A", 0.5, Some(0.8)),
            ComponentInput::new("B", 0.3, None),
            ComponentInput::new("C", 0.2, Some(0.4)),
        ];

        let composite = compute(&components);
        let expected = (0.8 * 0.5 + 0.4 * 0.2) / 0.7;
        assert!((composite.score - expected).abs() < 1e-9);
        assert!((composite.score - 0.685_714_285).abs() < 1e-6);
        assert!((composite.data_completeness_factor - 0.7).abs() < 1e-9);
        assert_eq!(composite.confidence_note, "components unavailable: B");
        assert_eq!(composite.rating, Rating::RelativelyHigh);

        let b = composite
            .components
            .iter()
            .find(|component| component.name == "B")
            .expect("B present");
        assert!(!b.available);
        assert!(b.raw_score.is_none());
    }

    #[test]
    fn all_components_missing_returns_explicit_no_data() {
        let components = vec![
            ComponentInput::new("A", 0.6, None),
            ComponentInput::new("B", 0.4, None),
        ];

        let composite = compute(&components);
        assert_eq!(composite.score, 0.0);
        assert_eq!(composite.data_completeness_factor, 0.0);
        assert_eq!(composite.rating, Rating::VeryLow);
        assert!(composite.confidence_note.contains("no data available"));
    }

    #[test]
    fn missing_component_names_are_sorted_in_the_note() {
        let components = vec![
            ComponentInput::new("zeta", 0.3, None),
            ComponentInput::new("alpha", 0.3, None),
            ComponentInput::new("mid", 0.4, Some(0.5)),
        ];

        let composite = compute(&components);
        assert_eq!(
            composite.confidence_note,
            "components unavailable: alpha, zeta"
        );
    }

    #[test]
    fn full_availability_notes_all_components() {
        let components = vec![
            ComponentInput::new("A", 0.5, Some(1.0)),
            ComponentInput::new("B", 0.5, Some(0.6)),
        ];

        let composite = compute(&components);
        assert_eq!(composite.confidence_note, "all components available");
        assert!((composite.data_completeness_factor - 1.0).abs() < 1e-9);
        assert!((composite.score - 0.8).abs() < 1e-9);
        assert_eq!(composite.rating, Rating::VeryHigh);
    }
}

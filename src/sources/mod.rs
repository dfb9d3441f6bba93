pub mod hazards;
pub mod table;

pub use hazards::{HazardCategory, SviTheme};
pub use table::{CountyMetricRow, MetricTable};

/// One input into a source's composite score. `scale` maps the column's
/// native range onto [0, 1] (100 for index scores, 1 for percentile ranks).
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: &'static str,
    pub column: String,
    pub weight: f64,
    pub scale: f64,
}

/// One category (hazard type or vulnerability theme) published by a source.
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub key: &'static str,
    pub label: &'static str,
    pub score_column: String,
    pub loss_column: Option<String>,
    pub scale: f64,
}

/// Describes the columns and composite weighting of one tabular dataset.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub name: &'static str,
    pub code_column: &'static str,
    pub state_column: &'static str,
    pub categories: Vec<CategorySpec>,
    pub components: Vec<ComponentSpec>,
    pub total_loss_column: Option<&'static str>,
    pub extra_columns: Vec<&'static str>,
}

impl SourceSpec {
    /// Every numeric column the loader should extract from this table.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for category in &self.categories {
            columns.push(category.score_column.clone());
            if let Some(loss) = &category.loss_column {
                columns.push(loss.clone());
            }
        }
        for component in &self.components {
            if !columns.contains(&component.column) {
                columns.push(component.column.clone());
            }
        }
        if let Some(total) = self.total_loss_column {
            columns.push(total.to_string());
        }
        for extra in &self.extra_columns {
            columns.push((*extra).to_string());
        }
        columns
    }

    pub fn category(&self, key: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|category| category.key == key)
    }
}

/// National risk index: 18 per-hazard scores and expected-loss estimates plus
/// the component scores its own composite is built from.
pub fn nri_spec() -> SourceSpec {
    let categories = HazardCategory::all()
        .into_iter()
        .map(|hazard| CategorySpec {
            key: hazard.key(),
            label: hazard.label(),
            score_column: format!("{}_RISKS", hazard.column_prefix()),
            loss_column: Some(format!("{}_EALT", hazard.column_prefix())),
            scale: 100.0,
        })
        .collect();

    SourceSpec {
        name: "nri",
        code_column: "STCOFIPS",
        state_column: "STATEABBRV",
        categories,
        components: vec![
            ComponentSpec {
                name: "expected_annual_loss",
                column: "EAL_SCORE".to_string(),
                weight: 0.5,
                scale: 100.0,
            },
            ComponentSpec {
                name: "social_vulnerability",
                column: "SOVI_SCORE".to_string(),
                weight: 0.3,
                scale: 100.0,
            },
            ComponentSpec {
                name: "community_resilience",
                column: "RESL_SCORE".to_string(),
                weight: 0.2,
                scale: 100.0,
            },
        ],
        total_loss_column: Some("EAL_VALT"),
        extra_columns: Vec::new(),
    }
}

/// Social vulnerability index: four themed percentile ranks in [0, 1].
pub fn svi_spec() -> SourceSpec {
    let categories: Vec<CategorySpec> = SviTheme::all()
        .into_iter()
        .map(|theme| CategorySpec {
            key: theme.key(),
            label: theme.label(),
            score_column: theme.column().to_string(),
            loss_column: None,
            scale: 1.0,
        })
        .collect();

    let components = SviTheme::all()
        .into_iter()
        .map(|theme| ComponentSpec {
            name: theme.key(),
            column: theme.column().to_string(),
            weight: 0.25,
            scale: 1.0,
        })
        .collect();

    SourceSpec {
        name: "svi",
        code_column: "FIPS",
        state_column: "ST_ABBR",
        categories,
        components,
        total_loss_column: None,
        extra_columns: Vec::new(),
    }
}

/// Wildfire hazard potential: the narrower, higher-fidelity dataset the
/// override engine applies on top of the general-purpose wildfire score.
pub fn wildfire_spec() -> SourceSpec {
    SourceSpec {
        name: "wildfire_hazard_potential",
        code_column: "county_fips",
        state_column: "state",
        categories: Vec::new(),
        components: Vec::new(),
        total_loss_column: None,
        extra_columns: vec![WILDFIRE_SCORE_COLUMN],
    }
}

/// Score column consumed by the override engine.
pub const WILDFIRE_SCORE_COLUMN: &str = "whp_score";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nri_spec_covers_every_hazard_with_loss_columns() {
        let spec = nri_spec();
        assert_eq!(spec.categories.len(), 18);
        assert!(spec
            .categories
            .iter()
            .all(|category| category.loss_column.is_some()));

        let columns = spec.numeric_columns();
        assert!(columns.contains(&"WFIR_RISKS".to_string()));
        assert!(columns.contains(&"WFIR_EALT".to_string()));
        assert!(columns.contains(&"EAL_VALT".to_string()));
        assert!(columns.contains(&"SOVI_SCORE".to_string()));
    }

    #[test]
    fn svi_component_weights_cover_the_full_distribution() {
        let spec = svi_spec();
        let total: f64 = spec.components.iter().map(|component| component.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wildfire_spec_extracts_only_the_override_score() {
        let spec = wildfire_spec();
        assert_eq!(spec.numeric_columns(), vec![WILDFIRE_SCORE_COLUMN.to_string()]);
    }
}

use super::composite::{self, ComponentInput, CompositeScore};
use super::document::{CategoryScore, SourceProfile, TopCategory};
use super::resolver::{Resolution, ResolutionTier};
use super::{CoverageStatus, Rating};
use crate::sources::{CountyMetricRow, MetricTable, SourceSpec};
use std::collections::BTreeMap;

/// Combines matched county rows into one per-source profile entry.
///
/// Score and dollar fields are both weighted averages (a raw sum would
/// double-count exposure across counties shared by several areas), ratings
/// are re-derived from the weighted score, and every schema category is
/// emitted even when the entity has no exposure to it.
pub fn aggregate_source(
    spec: &SourceSpec,
    resolution: Option<&Resolution>,
    table: &MetricTable,
    expected_min_counties: usize,
    top_n: usize,
) -> SourceProfile {
    let Some(resolution) = resolution else {
        return unavailable_profile(spec);
    };

    let rows = matched_rows(resolution, table);
    if rows.is_empty() {
        return unavailable_profile(spec);
    }

    let weighted = |column: &str| weighted_average(&rows, table, column);

    let mut categories = zero_categories(spec);
    for category in &spec.categories {
        let score = weighted(&category.score_column).unwrap_or(0.0);
        let expected_annual_loss = category
            .loss_column
            .as_ref()
            .map(|column| weighted(column).unwrap_or(0.0));

        categories.insert(
            category.key.to_string(),
            CategoryScore {
                score,
                rating: Rating::from_scaled(score, category.scale),
                expected_annual_loss,
                pre_override_score: None,
            },
        );
    }

    let components: Vec<ComponentInput> = spec
        .components
        .iter()
        .map(|component| {
            let value = weighted(&component.column)
                .map(|value| (value / component.scale).clamp(0.0, 1.0));
            ComponentInput::new(component.name, component.weight, value)
        })
        .collect();

    let counties_analyzed = rows.len();
    let coverage_status = match resolution.tier {
        ResolutionTier::StateFallback => CoverageStatus::Partial,
        _ if counties_analyzed < expected_min_counties => CoverageStatus::Partial,
        _ => CoverageStatus::Full,
    };

    let top_categories = rank_top(spec, &categories, top_n);
    SourceProfile {
        composite: composite::compute(&components),
        categories,
        top_categories,
        total_expected_loss: spec.total_loss_column.and_then(weighted),
        counties_analyzed,
        coverage_status,
    }
}

/// Weighted average of one column across already-matched rows. `None` when
/// the column never appeared in the table header.
pub fn weighted_value(resolution: &Resolution, table: &MetricTable, column: &str) -> Option<f64> {
    let rows = matched_rows(resolution, table);
    if rows.is_empty() {
        return None;
    }
    weighted_average(&rows, table, column)
}

/// Fully-populated zero-valued category map, so downstream consumers never
/// branch on missing keys.
pub fn zero_categories(spec: &SourceSpec) -> BTreeMap<String, CategoryScore> {
    spec.categories
        .iter()
        .map(|category| {
            (
                category.key.to_string(),
                CategoryScore::zero(category.loss_column.is_some()),
            )
        })
        .collect()
}

/// Non-zero categories sorted by descending score, key as tie-break, sliced
/// to the top N.
pub(crate) fn rank_top(
    spec: &SourceSpec,
    categories: &BTreeMap<String, CategoryScore>,
    top_n: usize,
) -> Vec<TopCategory> {
    let mut ranked: Vec<TopCategory> = categories
        .iter()
        .filter(|(_, category)| category.score > 0.0)
        .map(|(key, category)| TopCategory {
            category: key.clone(),
            label: spec
                .category(key)
                .map(|category_spec| category_spec.label.to_string())
                .unwrap_or_else(|| key.clone()),
            score: category.score,
            rating: category.rating,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    ranked.truncate(top_n);
    ranked
}

fn unavailable_profile(spec: &SourceSpec) -> SourceProfile {
    let components: Vec<ComponentInput> = spec
        .components
        .iter()
        .map(|component| ComponentInput::new(component.name, component.weight, None))
        .collect();

    SourceProfile {
        composite: CompositeScore::no_data(&components),
        categories: zero_categories(spec),
        top_categories: Vec::new(),
        total_expected_loss: spec.total_loss_column.map(|_| 0.0),
        counties_analyzed: 0,
        coverage_status: CoverageStatus::Unavailable,
    }
}

fn matched_rows<'t>(
    resolution: &Resolution,
    table: &'t MetricTable,
) -> Vec<(&'t CountyMetricRow, f64)> {
    let present: Vec<(&CountyMetricRow, f64)> = resolution
        .matches
        .iter()
        .filter_map(|matched| {
            table
                .row(&matched.county_fips)
                .map(|row| (row, matched.weight))
        })
        .collect();

    if present.is_empty() {
        return present;
    }

    // Counties missing from the table drop out of the distribution, so the
    // remaining weights are renormalized. Same zero-sum guard as the resolver.
    let total: f64 = present.iter().map(|(_, weight)| weight).sum();
    if total > 0.0 && total.is_finite() {
        present
            .into_iter()
            .map(|(row, weight)| (row, weight / total))
            .collect()
    } else {
        let equal = 1.0 / present.len() as f64;
        present
            .into_iter()
            .map(|(row, _)| (row, equal))
            .collect()
    }
}

fn weighted_average(
    rows: &[(&CountyMetricRow, f64)],
    table: &MetricTable,
    column: &str,
) -> Option<f64> {
    if !table.has_column(column) {
        return None;
    }

    Some(
        rows.iter()
            .map(|(row, weight)| row.metrics.get(column).copied().unwrap_or(0.0) * weight)
            .sum(),
    )
}

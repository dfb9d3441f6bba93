use crate::geo::{AreaCountyRelations, AreaWeightTable, CountyDirectory, Crosswalk, Entity};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One matched county with its normalized share of the entity's area.
/// Across a resolution, weights always sum to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub county_fips: String,
    pub weight: f64,
}

/// Which tier of the fallback chain produced the match set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    AreaWeights,
    AreaCounties,
    StateFallback,
}

impl ResolutionTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::AreaWeights => "area-overlap weights",
            Self::AreaCounties => "area-county relation",
            Self::StateFallback => "state-level fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub tier: ResolutionTier,
    pub matches: Vec<ResolvedMatch>,
}

/// Maps an entity to a weighted county set through the 4-tier fallback chain.
/// Collaborators are injected once; the resolver itself is stateless.
pub struct Resolver<'a> {
    crosswalk: &'a Crosswalk,
    weights: &'a AreaWeightTable,
    relations: &'a AreaCountyRelations,
    directory: &'a CountyDirectory,
}

impl<'a> Resolver<'a> {
    pub fn new(
        crosswalk: &'a Crosswalk,
        weights: &'a AreaWeightTable,
        relations: &'a AreaCountyRelations,
        directory: &'a CountyDirectory,
    ) -> Self {
        Self {
            crosswalk,
            weights,
            relations,
            directory,
        }
    }

    /// Each tier is attempted only if the prior tier produced zero matches.
    pub fn resolve(&self, entity: &Entity) -> Option<Resolution> {
        let areas = self.crosswalk.areas_for(&entity.entity_id);

        let mut raw: BTreeMap<String, f64> = BTreeMap::new();
        for area in areas {
            if let Some(weights) = self.weights.weights_for(area) {
                for entry in weights {
                    // A county referenced by multiple areas of the same
                    // entity accumulates its overlap, never overwrites it.
                    *raw.entry(entry.county_fips.clone()).or_insert(0.0) += entry.weight;
                }
            }
        }
        if !raw.is_empty() {
            return Some(Resolution {
                tier: ResolutionTier::AreaWeights,
                matches: normalize_weights(raw),
            });
        }

        for area in areas {
            for county_fips in self.relations.counties_for(area) {
                raw.entry(county_fips.clone()).or_insert(1.0);
            }
        }
        if !raw.is_empty() {
            debug!(entity_id = %entity.entity_id, "no overlap weights, using area-county relation");
            return Some(Resolution {
                tier: ResolutionTier::AreaCounties,
                matches: normalize_weights(raw),
            });
        }

        for county_fips in self.directory.counties_in_states(&entity.states) {
            raw.insert(county_fips, 1.0);
        }
        if !raw.is_empty() {
            debug!(entity_id = %entity.entity_id, "no area mapping, using state-level fallback");
            return Some(Resolution {
                tier: ResolutionTier::StateFallback,
                matches: normalize_weights(raw),
            });
        }

        None
    }
}

/// Divides each raw weight by their sum so the result is a probability
/// distribution. A degenerate zero sum falls back to equal weighting rather
/// than dividing by zero, so no NaN ever reaches the aggregator.
pub(crate) fn normalize_weights(raw: BTreeMap<String, f64>) -> Vec<ResolvedMatch> {
    let total: f64 = raw.values().sum();

    if total > 0.0 && total.is_finite() {
        raw.into_iter()
            .map(|(county_fips, weight)| ResolvedMatch {
                county_fips,
                weight: weight / total,
            })
            .collect()
    } else {
        let equal = 1.0 / raw.len() as f64;
        raw.into_keys()
            .map(|county_fips| ResolvedMatch {
                county_fips,
                weight: equal,
            })
            .collect()
    }
}

use crate::sources::table::normalize_fips;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Entity-to-area crosswalk. The upstream file maps each irregular area code
/// to the entity it belongs to; the inverse index is built once at load time.
#[derive(Debug, Default, Clone)]
pub struct Crosswalk {
    by_entity: BTreeMap<String, Vec<String>>,
    area_count: usize,
}

#[derive(Debug, Default, Deserialize)]
struct CrosswalkFile {
    #[serde(default)]
    mappings: BTreeMap<String, String>,
}

impl Crosswalk {
    /// Loads the crosswalk, returning an empty table on any failure so the
    /// batch degrades to unresolved entities instead of aborting.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "crosswalk unavailable, treating as empty");
                return Self::default();
            }
        };

        match serde_json::from_str::<CrosswalkFile>(&raw) {
            Ok(file) => Self::from_mappings(file.mappings),
            Err(err) => {
                warn!(path = %path.display(), %err, "malformed crosswalk, treating as empty");
                Self::default()
            }
        }
    }

    pub fn from_mappings(mappings: BTreeMap<String, String>) -> Self {
        let area_count = mappings.len();
        let mut by_entity: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (area_code, entity_id) in mappings {
            by_entity.entry(entity_id).or_default().push(area_code);
        }

        Self {
            by_entity,
            area_count,
        }
    }

    pub fn areas_for(&self, entity_id: &str) -> &[String] {
        self.by_entity
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn area_count(&self) -> usize {
        self.area_count
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// Fractional overlap of one county with an irregular area. Weights within an
/// area need not sum to 1; the resolver normalizes at the entity level.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyWeight {
    pub county_fips: String,
    pub weight: f64,
    pub overlap_area_sqkm: f64,
}

#[derive(Debug, Deserialize)]
struct CountyWeightRow {
    county_fips: String,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    overlap_area_sqkm: f64,
}

#[derive(Debug, Default, Deserialize)]
struct AreaWeightFile {
    #[serde(default)]
    crosswalk: BTreeMap<String, Vec<CountyWeightRow>>,
    #[serde(default)]
    #[allow(dead_code)]
    metadata: serde_json::Value,
}

/// Precomputed area-overlap weights per irregular area code.
#[derive(Debug, Default, Clone)]
pub struct AreaWeightTable {
    areas: BTreeMap<String, Vec<CountyWeight>>,
}

impl AreaWeightTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "area weights unavailable, treating as empty");
                return Self::default();
            }
        };

        match serde_json::from_str::<AreaWeightFile>(&raw) {
            Ok(file) => Self::from_rows(file.crosswalk),
            Err(err) => {
                warn!(path = %path.display(), %err, "malformed area weights, treating as empty");
                Self::default()
            }
        }
    }

    fn from_rows(rows: BTreeMap<String, Vec<CountyWeightRow>>) -> Self {
        let entries = rows
            .into_iter()
            .map(|(area_code, entries)| {
                let entries = entries
                    .into_iter()
                    .map(|row| CountyWeight {
                        county_fips: row.county_fips,
                        weight: row.weight,
                        overlap_area_sqkm: row.overlap_area_sqkm,
                    })
                    .collect();
                (area_code, entries)
            })
            .collect();
        Self::from_entries(entries)
    }

    /// Builds the table from already-decoded entries, normalizing county
    /// codes and flooring bad weights on the way in.
    pub fn from_entries(entries: BTreeMap<String, Vec<CountyWeight>>) -> Self {
        let mut areas: BTreeMap<String, Vec<CountyWeight>> = BTreeMap::new();
        for (area_code, rows) in entries {
            let cleaned: Vec<CountyWeight> = rows
                .into_iter()
                .map(|row| CountyWeight {
                    county_fips: normalize_fips(&row.county_fips),
                    weight: sanitize_weight(row.weight),
                    overlap_area_sqkm: row.overlap_area_sqkm.max(0.0),
                })
                .collect();
            if !cleaned.is_empty() {
                areas.insert(area_code, cleaned);
            }
        }

        Self { areas }
    }

    pub fn weights_for(&self, area_code: &str) -> Option<&[CountyWeight]> {
        self.areas.get(area_code).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Coarser area-to-county relation used when overlap weights are unavailable.
#[derive(Debug, Default, Clone)]
pub struct AreaCountyRelations {
    relations: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct AreaCountyFile {
    #[serde(default)]
    relations: BTreeMap<String, Vec<String>>,
}

impl AreaCountyRelations {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "area-county relations unavailable, treating as empty");
                return Self::default();
            }
        };

        match serde_json::from_str::<AreaCountyFile>(&raw) {
            Ok(file) => Self::from_relations(file.relations),
            Err(err) => {
                warn!(path = %path.display(), %err, "malformed area-county relations, treating as empty");
                Self::default()
            }
        }
    }

    pub fn from_relations(relations: BTreeMap<String, Vec<String>>) -> Self {
        let relations = relations
            .into_iter()
            .map(|(area_code, counties)| {
                let counties = counties
                    .iter()
                    .map(|fips| normalize_fips(fips))
                    .filter(|fips| !fips.is_empty())
                    .collect();
                (area_code, counties)
            })
            .collect();

        Self { relations }
    }

    pub fn counties_for(&self, area_code: &str) -> &[String] {
        self.relations
            .get(area_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crosswalk_inverts_area_mappings_per_entity() {
        let mut mappings = BTreeMap::new();
        mappings.insert("AREA-1".to_string(), "epa-101".to_string());
        mappings.insert("AREA-2".to_string(), "epa-101".to_string());
        mappings.insert("AREA-3".to_string(), "epa-102".to_string());

        let crosswalk = Crosswalk::from_mappings(mappings);
        assert_eq!(crosswalk.area_count(), 3);
        assert_eq!(crosswalk.areas_for("epa-101").len(), 2);
        assert_eq!(crosswalk.areas_for("epa-102"), ["AREA-3".to_string()]);
        assert!(crosswalk.areas_for("epa-999").is_empty());
    }

    #[test]
    fn missing_files_load_as_empty_tables() {
        assert!(Crosswalk::load("/nonexistent/crosswalk.json").is_empty());
        assert!(AreaWeightTable::load("/nonexistent/weights.json").is_empty());
        assert!(AreaCountyRelations::load("/nonexistent/relations.json").is_empty());
    }

    #[test]
    fn area_weights_normalize_fips_and_guard_bad_weights() {
        let raw = r#"{
            "crosswalk": {
                "AREA-1": [
                    {"county_fips": "6037", "weight": 0.6, "overlap_area_sqkm": 120.5},
                    {"county_fips": "06073", "weight": -0.2, "overlap_area_sqkm": -4.0}
                ]
            },
            "metadata": {"vintage": "2023"}
        }"#;
        let file: AreaWeightFile = serde_json::from_str(raw).expect("weight file parses");
        let table = AreaWeightTable::from_rows(file.crosswalk);

        let weights = table.weights_for("AREA-1").expect("area present");
        assert_eq!(weights[0].county_fips, "06037");
        assert_eq!(weights[1].weight, 0.0, "negative weight floors to zero");
        assert_eq!(weights[1].overlap_area_sqkm, 0.0);
    }

    #[test]
    fn relations_drop_blank_county_codes() {
        let mut relations = BTreeMap::new();
        relations.insert(
            "AREA-1".to_string(),
            vec!["6037".to_string(), "  ".to_string()],
        );

        let table = AreaCountyRelations::from_relations(relations);
        assert_eq!(table.counties_for("AREA-1"), ["06037".to_string()]);
    }
}

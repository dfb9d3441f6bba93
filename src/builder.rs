use crate::config::BuildConfig;
use crate::geo::{
    AreaCountyRelations, AreaWeightTable, CountyDirectory, Crosswalk, Entity, EntityRegistry,
    RegistryError,
};
use crate::profiles::aggregate::weighted_value;
use crate::profiles::{
    aggregate_source, apply_category_override, sanitize_entity_id, write_profile, CoverageStatus,
    ProfileDocument, Resolver, SourceProfile,
};
use crate::report::{CoverageReport, CoverageTally, DataQualityNote};
use crate::sources::table::load_table;
use crate::sources::{nri_spec, svi_spec, wildfire_spec, MetricTable, SourceSpec, WILDFIRE_SCORE_COLUMN};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Relative drift between the aggregated total expected loss and the sum of
/// its per-hazard components that earns a data-quality note.
const EAL_MISMATCH_TOLERANCE: f64 = 0.05;

const COVERAGE_REPORT_FILE: &str = "coverage_report.json";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("entity registry could not be loaded: {0}")]
    Registry(#[from] RegistryError),
    #[error("failed to prepare output directory: {0}")]
    OutputDir(std::io::Error),
    #[error("failed to serialize coverage report: {0}")]
    ReportSerialize(#[from] serde_json::Error),
    #[error("failed to write coverage report: {0}")]
    ReportWrite(std::io::Error),
}

/// What one batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    pub profiles_written: usize,
    pub resolved_entities: usize,
    pub report: CoverageReport,
    pub report_path: PathBuf,
}

struct LoadedSource {
    spec: SourceSpec,
    table: MetricTable,
}

enum EntityOutcome {
    Skipped {
        entity_id: String,
        reason: &'static str,
    },
    Processed {
        entity_id: String,
        resolved: bool,
        statuses: BTreeMap<String, CoverageStatus>,
        notes: Vec<DataQualityNote>,
        written: bool,
    },
}

/// Loads every lookup table once, then fans the per-entity work out over a
/// worker pool. Entities never read or mutate each other's state, so the only
/// cross-entity structure is the coverage tally, reduced after each chunk.
pub struct ProfileBuilder {
    config: BuildConfig,
    registry: EntityRegistry,
    crosswalk: Crosswalk,
    weights: AreaWeightTable,
    relations: AreaCountyRelations,
    directory: CountyDirectory,
    sources: Vec<LoadedSource>,
    override_table: Option<MetricTable>,
}

impl ProfileBuilder {
    pub fn load(config: BuildConfig) -> Result<Self, BuildError> {
        let registry = EntityRegistry::from_path(&config.registry_path)?;
        let crosswalk = Crosswalk::load(&config.crosswalk_path);
        let weights = AreaWeightTable::load(&config.area_weights_path);
        let relations = AreaCountyRelations::load(&config.area_counties_path);

        let sources = vec![
            LoadedSource {
                spec: nri_spec(),
                table: load_table(&nri_spec(), &config.nri_path),
            },
            LoadedSource {
                spec: svi_spec(),
                table: load_table(&svi_spec(), &config.svi_path),
            },
        ];

        let override_table = config
            .wildfire_path
            .as_ref()
            .map(|path| load_table(&wildfire_spec(), path));

        let mut directory = CountyDirectory::new();
        for source in &sources {
            for (fips, state) in source.table.counties() {
                directory.insert(fips.to_string(), state.to_string());
            }
        }

        info!(
            entities = registry.len(),
            areas = crosswalk.area_count(),
            counties = directory.len(),
            "lookup tables loaded"
        );

        Ok(Self {
            config,
            registry,
            crosswalk,
            weights,
            relations,
            directory,
            sources,
            override_table,
        })
    }

    pub fn run(&self) -> Result<BatchOutcome, BuildError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(BuildError::OutputDir)?;

        let generated_at = Utc::now();
        let resolver = Resolver::new(&self.crosswalk, &self.weights, &self.relations, &self.directory);

        let mut tally = CoverageTally::new();
        let mut profiles_written = 0;
        let mut resolved_entities = 0;

        // Chunked so peak memory stays bounded on very large registries; the
        // per-chunk results are released before the next chunk starts.
        for chunk in self.registry.entities().chunks(self.config.batch_size) {
            let outcomes: Vec<EntityOutcome> = chunk
                .par_iter()
                .map(|entity| self.process_entity(entity, &resolver, generated_at))
                .collect();

            for outcome in outcomes {
                match outcome {
                    EntityOutcome::Skipped { entity_id, reason } => {
                        tally.record_skipped(&entity_id, reason);
                    }
                    EntityOutcome::Processed {
                        entity_id,
                        resolved,
                        statuses,
                        notes,
                        written,
                    } => {
                        tally.record_entity(&entity_id, statuses);
                        for note in notes {
                            tally.record_data_quality(note);
                        }
                        if resolved {
                            resolved_entities += 1;
                        }
                        if written {
                            profiles_written += 1;
                        } else {
                            tally.record_write_failure(&entity_id);
                        }
                    }
                }
            }
        }

        let report = tally.report();
        let report_path = self.write_report(&report)?;

        info!(
            entities = report.entities_processed,
            profiles_written,
            resolved_entities,
            "profile batch complete"
        );

        Ok(BatchOutcome {
            profiles_written,
            resolved_entities,
            report,
            report_path,
        })
    }

    fn process_entity(
        &self,
        entity: &Entity,
        resolver: &Resolver<'_>,
        generated_at: DateTime<Utc>,
    ) -> EntityOutcome {
        if sanitize_entity_id(&entity.entity_id).is_err() {
            warn!(entity_id = %entity.entity_id, "skipping entity with unsafe identifier");
            return EntityOutcome::Skipped {
                entity_id: entity.entity_id.clone(),
                reason: "unsafe identifier",
            };
        }

        let resolution = resolver.resolve(entity);
        if resolution.is_none() {
            debug!(entity_id = %entity.entity_id, "entity did not resolve to any county");
        }

        let mut statuses = BTreeMap::new();
        let mut sources = BTreeMap::new();
        let mut notes = Vec::new();

        for source in &self.sources {
            let mut profile = aggregate_source(
                &source.spec,
                resolution.as_ref(),
                &source.table,
                self.config.expected_min_counties,
                self.config.top_n,
            );

            if source.spec.name == "nri" {
                self.apply_wildfire_override(resolution.as_ref(), &source.spec, &mut profile);
                if let Some(note) = reconcile_expected_loss(&entity.entity_id, &source.spec, &profile)
                {
                    notes.push(note);
                }
            }

            statuses.insert(source.spec.name.to_string(), profile.coverage_status);
            sources.insert(source.spec.name.to_string(), profile);
        }

        let document = ProfileDocument {
            entity_id: entity.entity_id.clone(),
            name: entity.name.clone(),
            sources,
            generated_at,
        };

        let written = match write_profile(&self.config.output_dir, &document) {
            Ok(path) => {
                debug!(entity_id = %entity.entity_id, path = %path.display(), "profile written");
                true
            }
            Err(err) => {
                // Skip-and-continue: one entity's write failure must not
                // abort the batch or touch already-written profiles.
                error!(entity_id = %entity.entity_id, %err, "failed to persist profile");
                false
            }
        };

        EntityOutcome::Processed {
            entity_id: entity.entity_id.clone(),
            resolved: resolution.is_some(),
            statuses,
            notes,
            written,
        }
    }

    fn apply_wildfire_override(
        &self,
        resolution: Option<&crate::profiles::Resolution>,
        spec: &SourceSpec,
        profile: &mut SourceProfile,
    ) {
        let (Some(resolution), Some(table)) = (resolution, &self.override_table) else {
            return;
        };

        if let Some(value) = weighted_value(resolution, table, WILDFIRE_SCORE_COLUMN) {
            apply_category_override(profile, spec, "wildfire", value, self.config.top_n);
        }
    }

    fn write_report(&self, report: &CoverageReport) -> Result<PathBuf, BuildError> {
        let path = self.config.output_dir.join(COVERAGE_REPORT_FILE);
        let mut payload = serde_json::to_vec_pretty(report)?;
        payload.push(b'\n');
        std::fs::write(&path, payload).map_err(BuildError::ReportWrite)?;
        Ok(path)
    }
}

/// The total expected loss and the per-hazard losses are aggregated
/// independently with the same weights, so they may drift apart. A mismatch
/// is a data-quality signal for the report, never silently reconciled.
fn reconcile_expected_loss(
    entity_id: &str,
    spec: &SourceSpec,
    profile: &SourceProfile,
) -> Option<DataQualityNote> {
    let total = profile.total_expected_loss?;
    let hazard_sum: f64 = profile
        .categories
        .values()
        .filter_map(|category| category.expected_annual_loss)
        .sum();

    if total <= 0.0 && hazard_sum <= 0.0 {
        return None;
    }

    let denom = total.abs().max(hazard_sum.abs());
    let drift = (total - hazard_sum).abs() / denom;
    if drift <= EAL_MISMATCH_TOLERANCE {
        return None;
    }

    Some(DataQualityNote {
        entity_id: entity_id.to_string(),
        source: spec.name.to_string(),
        detail: format!(
            "total expected loss diverges from per-hazard sum by {:.1}% (total {:.2}, sum {:.2})",
            drift * 100.0,
            total,
            hazard_sum
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::composite::CompositeScore;
    use crate::profiles::document::CategoryScore;
    use crate::profiles::Rating;

    fn profile_with_losses(total: Option<f64>, hazard_losses: &[f64]) -> SourceProfile {
        let categories = hazard_losses
            .iter()
            .enumerate()
            .map(|(idx, loss)| {
                (
                    format!("hazard_{idx}"),
                    CategoryScore {
                        score: 1.0,
                        rating: Rating::VeryLow,
                        expected_annual_loss: Some(*loss),
                        pre_override_score: None,
                    },
                )
            })
            .collect();

        SourceProfile {
            composite: CompositeScore::no_data(&[]),
            categories,
            top_categories: Vec::new(),
            total_expected_loss: total,
            counties_analyzed: 1,
            coverage_status: CoverageStatus::Full,
        }
    }

    #[test]
    fn small_expected_loss_drift_is_tolerated() {
        let spec = nri_spec();
        let profile = profile_with_losses(Some(100.0), &[51.0, 51.0]);
        assert!(reconcile_expected_loss("epa-101", &spec, &profile).is_none());
    }

    #[test]
    fn large_expected_loss_drift_is_flagged() {
        let spec = nri_spec();
        let profile = profile_with_losses(Some(100.0), &[30.0, 30.0]);
        let note = reconcile_expected_loss("epa-101", &spec, &profile).expect("note raised");
        assert_eq!(note.source, "nri");
        assert!(note.detail.contains("diverges"));
    }

    #[test]
    fn zero_losses_raise_no_note() {
        let spec = nri_spec();
        let profile = profile_with_losses(Some(0.0), &[0.0, 0.0]);
        assert!(reconcile_expected_loss("epa-101", &spec, &profile).is_none());
        let profile = profile_with_losses(None, &[10.0]);
        assert!(reconcile_expected_loss("epa-101", &spec, &profile).is_none());
    }
}

pub mod views;

pub use views::{CoverageReport, EntityCoverageEntry, SourceCoverageEntry};

use crate::profiles::CoverageStatus;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct SourceCounts {
    pub full: usize,
    pub partial: usize,
    pub unavailable: usize,
}

impl SourceCounts {
    fn record(&mut self, status: CoverageStatus) {
        match status {
            CoverageStatus::Full => self.full += 1,
            CoverageStatus::Partial => self.partial += 1,
            CoverageStatus::Unavailable => self.unavailable += 1,
        }
    }

    fn add(&mut self, other: SourceCounts) {
        self.full += other.full;
        self.partial += other.partial;
        self.unavailable += other.unavailable;
    }

    pub fn total(&self) -> usize {
        self.full + self.partial + self.unavailable
    }
}

/// A reconciliation or degradation signal worth a human look, surfaced in the
/// coverage report rather than raised as an error.
#[derive(Debug, Clone, Serialize)]
pub struct DataQualityNote {
    pub entity_id: String,
    pub source: String,
    pub detail: String,
}

/// Running coverage tally for a batch. Workers each fold into their own tally
/// and the batch runner merges them, so the tally is never written
/// concurrently.
#[derive(Debug, Default)]
pub struct CoverageTally {
    per_source: BTreeMap<String, SourceCounts>,
    entities: BTreeMap<String, BTreeMap<String, CoverageStatus>>,
    skipped: Vec<String>,
    write_failures: Vec<String>,
    data_quality: Vec<DataQualityNote>,
}

impl CoverageTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_entity(
        &mut self,
        entity_id: &str,
        statuses: BTreeMap<String, CoverageStatus>,
    ) {
        for (source, status) in &statuses {
            self.per_source
                .entry(source.clone())
                .or_default()
                .record(*status);
        }
        self.entities.insert(entity_id.to_string(), statuses);
    }

    pub fn record_skipped(&mut self, entity_id: &str, reason: &str) {
        self.skipped.push(format!("{entity_id} ({reason})"));
    }

    pub fn record_write_failure(&mut self, entity_id: &str) {
        self.write_failures.push(entity_id.to_string());
    }

    pub fn record_data_quality(&mut self, note: DataQualityNote) {
        self.data_quality.push(note);
    }

    /// Single-writer reduction step for parallel workers.
    pub fn merge(mut self, other: CoverageTally) -> CoverageTally {
        for (source, counts) in other.per_source {
            self.per_source.entry(source).or_default().add(counts);
        }
        self.entities.extend(other.entities);
        self.skipped.extend(other.skipped);
        self.write_failures.extend(other.write_failures);
        self.data_quality.extend(other.data_quality);
        self
    }

    pub fn entities_processed(&self) -> usize {
        self.entities.len()
    }

    /// Entities that resolved nothing across every source.
    pub fn unmatched_entities(&self) -> Vec<String> {
        self.entities
            .iter()
            .filter(|(_, statuses)| {
                !statuses.is_empty()
                    && statuses
                        .values()
                        .all(|status| *status == CoverageStatus::Unavailable)
            })
            .map(|(entity_id, _)| entity_id.clone())
            .collect()
    }

    pub fn report(&self) -> CoverageReport {
        let total = self.entities_processed();
        let pct = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            }
        };

        let sources = self
            .per_source
            .iter()
            .map(|(source, counts)| SourceCoverageEntry {
                source: source.clone(),
                full: counts.full,
                partial: counts.partial,
                unavailable: counts.unavailable,
                full_pct: pct(counts.full),
                partial_pct: pct(counts.partial),
                unavailable_pct: pct(counts.unavailable),
            })
            .collect();

        let entities = self
            .entities
            .iter()
            .map(|(entity_id, statuses)| EntityCoverageEntry {
                entity_id: entity_id.clone(),
                statuses: statuses.clone(),
            })
            .collect();

        let mut skipped = self.skipped.clone();
        skipped.sort_unstable();
        let mut write_failures = self.write_failures.clone();
        write_failures.sort_unstable();

        let mut data_quality = self.data_quality.clone();
        data_quality.sort_by(|a, b| {
            (a.entity_id.as_str(), a.source.as_str())
                .cmp(&(b.entity_id.as_str(), b.source.as_str()))
        });

        CoverageReport {
            entities_processed: total,
            sources,
            entities,
            unmatched_entities: self.unmatched_entities(),
            skipped_entities: skipped,
            write_failures,
            data_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(pairs: &[(&str, CoverageStatus)]) -> BTreeMap<String, CoverageStatus> {
        pairs
            .iter()
            .map(|(source, status)| (source.to_string(), *status))
            .collect()
    }

    #[test]
    fn empty_batch_produces_an_empty_report() {
        let report = CoverageTally::new().report();
        assert_eq!(report.entities_processed, 0);
        assert!(report.sources.is_empty());
        assert!(report.unmatched_entities.is_empty());
        assert!(report.prose().contains("No entities were processed"));
    }

    #[test]
    fn counts_and_percentages_accumulate_per_source() {
        let mut tally = CoverageTally::new();
        tally.record_entity("epa-101", statuses(&[("nri", CoverageStatus::Full)]));
        tally.record_entity("epa-102", statuses(&[("nri", CoverageStatus::Partial)]));
        tally.record_entity("epa-103", statuses(&[("nri", CoverageStatus::Full)]));
        tally.record_entity("epa-104", statuses(&[("nri", CoverageStatus::Unavailable)]));

        let report = tally.report();
        assert_eq!(report.entities_processed, 4);
        let nri = &report.sources[0];
        assert_eq!((nri.full, nri.partial, nri.unavailable), (2, 1, 1));
        assert!((nri.full_pct - 50.0).abs() < 1e-9);
        assert!((nri.partial_pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn fully_unavailable_entities_are_listed_as_unmatched() {
        let mut tally = CoverageTally::new();
        tally.record_entity(
            "epa-101",
            statuses(&[
                ("nri", CoverageStatus::Unavailable),
                ("svi", CoverageStatus::Unavailable),
            ]),
        );
        tally.record_entity(
            "epa-102",
            statuses(&[
                ("nri", CoverageStatus::Full),
                ("svi", CoverageStatus::Unavailable),
            ]),
        );

        let report = tally.report();
        assert_eq!(report.unmatched_entities, vec!["epa-101".to_string()]);
    }

    #[test]
    fn merge_combines_worker_tallies() {
        let mut left = CoverageTally::new();
        left.record_entity("epa-101", statuses(&[("nri", CoverageStatus::Full)]));
        left.record_skipped("../../etc/passwd", "unsafe identifier");

        let mut right = CoverageTally::new();
        right.record_entity("epa-102", statuses(&[("nri", CoverageStatus::Partial)]));
        right.record_data_quality(DataQualityNote {
            entity_id: "epa-102".to_string(),
            source: "nri".to_string(),
            detail: "expected loss mismatch".to_string(),
        });

        let report = left.merge(right).report();
        assert_eq!(report.entities_processed, 2);
        assert_eq!(report.sources[0].full, 1);
        assert_eq!(report.sources[0].partial, 1);
        assert_eq!(report.skipped_entities.len(), 1);
        assert_eq!(report.data_quality.len(), 1);

        let prose = report.prose();
        assert!(prose.contains("nri: 1 full (50.0%)"));
        assert!(prose.contains("Skipped entities"));
        assert!(prose.contains("expected loss mismatch"));
    }
}

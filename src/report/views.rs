use super::DataQualityNote;
use crate::profiles::CoverageStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct SourceCoverageEntry {
    pub source: String,
    pub full: usize,
    pub partial: usize,
    pub unavailable: usize,
    pub full_pct: f64,
    pub partial_pct: f64,
    pub unavailable_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityCoverageEntry {
    pub entity_id: String,
    pub statuses: BTreeMap<String, CoverageStatus>,
}

/// Machine-readable coverage report for one batch run. `prose()` renders the
/// same content for the human who reads it after every run.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub entities_processed: usize,
    pub sources: Vec<SourceCoverageEntry>,
    pub entities: Vec<EntityCoverageEntry>,
    pub unmatched_entities: Vec<String>,
    pub skipped_entities: Vec<String>,
    pub write_failures: Vec<String>,
    pub data_quality: Vec<DataQualityNote>,
}

impl CoverageReport {
    pub fn prose(&self) -> String {
        let mut out = String::from("Coverage report\n");

        if self.entities_processed == 0 {
            out.push_str("No entities were processed.\n");
        } else {
            let _ = writeln!(out, "Entities processed: {}", self.entities_processed);
        }

        if !self.sources.is_empty() {
            out.push('\n');
            for entry in &self.sources {
                let _ = writeln!(
                    out,
                    "{}: {} full ({:.1}%), {} partial ({:.1}%), {} unavailable ({:.1}%)",
                    entry.source,
                    entry.full,
                    entry.full_pct,
                    entry.partial,
                    entry.partial_pct,
                    entry.unavailable,
                    entry.unavailable_pct,
                );
            }
        }

        if !self.unmatched_entities.is_empty() {
            let _ = writeln!(
                out,
                "\nUnresolved across all sources: {}",
                self.unmatched_entities.join(", ")
            );
        }

        if !self.skipped_entities.is_empty() {
            let _ = writeln!(out, "\nSkipped entities: {}", self.skipped_entities.join(", "));
        }

        if !self.write_failures.is_empty() {
            let _ = writeln!(out, "\nWrite failures: {}", self.write_failures.join(", "));
        }

        if !self.data_quality.is_empty() {
            out.push_str("\nData quality notes:\n");
            for note in &self.data_quality {
                let _ = writeln!(out, "- {} [{}]: {}", note.entity_id, note.source, note.detail);
            }
        }

        out
    }
}

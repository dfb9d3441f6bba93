use super::document::ProfileDocument;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("entity id '{0}' is not a safe file name")]
    UnsafeEntityId(String),
    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to persist profile: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates an externally-supplied identifier before it becomes a file name.
/// Anything that is empty, contains a path separator, or references a parent
/// directory is rejected outright.
pub fn sanitize_entity_id(entity_id: &str) -> Result<&str, WriteError> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty()
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.contains(std::path::MAIN_SEPARATOR)
    {
        return Err(WriteError::UnsafeEntityId(entity_id.to_string()));
    }

    // The id must survive a basename round-trip unchanged.
    match Path::new(trimmed).file_name().and_then(|name| name.to_str()) {
        Some(name) if name == trimmed => Ok(trimmed),
        _ => Err(WriteError::UnsafeEntityId(entity_id.to_string())),
    }
}

/// Writes one profile document with atomic semantics: serialize to a
/// temporary file in the destination directory, then rename over the
/// canonical path. An interrupted write never leaves a corrupt file at the
/// canonical path, and any failure removes the temporary file.
pub fn write_profile(output_dir: &Path, document: &ProfileDocument) -> Result<PathBuf, WriteError> {
    let entity_id = sanitize_entity_id(&document.entity_id)?;

    let final_path = output_dir.join(format!("{entity_id}.json"));
    let temp_path = output_dir.join(format!(".{entity_id}.json.tmp"));

    let mut payload = serde_json::to_vec_pretty(document)?;
    payload.push(b'\n');

    if let Err(err) = std::fs::write(&temp_path, &payload) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(err.into());
    }
    if let Err(err) = std::fs::rename(&temp_path, &final_path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(err.into());
    }

    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::composite::CompositeScore;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn document(entity_id: &str) -> ProfileDocument {
        let mut sources = BTreeMap::new();
        sources.insert(
            "nri".to_string(),
            crate::profiles::document::SourceProfile {
                composite: CompositeScore::no_data(&[]),
                categories: BTreeMap::new(),
                top_categories: Vec::new(),
                total_expected_loss: None,
                counties_analyzed: 0,
                coverage_status: crate::profiles::CoverageStatus::Unavailable,
            },
        );

        ProfileDocument {
            entity_id: entity_id.to_string(),
            name: "Example Nation".to_string(),
            sources,
            generated_at: Utc.with_ymd_and_hms(2026, 8, 24, 0, 0, 0).single().expect("valid"),
        }
    }

    #[test]
    fn traversal_identifiers_are_rejected_before_any_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = document("../../etc/passwd");

        let result = write_profile(dir.path(), &doc);
        assert!(matches!(result, Err(WriteError::UnsafeEntityId(_))));
        assert_eq!(
            std::fs::read_dir(dir.path()).expect("readable").count(),
            0,
            "nothing may be written for a rejected id"
        );
    }

    #[test]
    fn sanitize_accepts_plain_identifiers_only() {
        assert!(sanitize_entity_id("epa-101").is_ok());
        assert!(sanitize_entity_id("Nation_42").is_ok());
        assert!(sanitize_entity_id("").is_err());
        assert!(sanitize_entity_id("  ").is_err());
        assert!(sanitize_entity_id("a/b").is_err());
        assert!(sanitize_entity_id("a\\b").is_err());
        assert!(sanitize_entity_id("..").is_err());
        assert!(sanitize_entity_id("../x").is_err());
    }

    #[test]
    fn writes_are_idempotent_and_leave_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = document("epa-101");

        let first = write_profile(dir.path(), &doc).expect("first write");
        let first_bytes = std::fs::read(&first).expect("readable");

        let second = write_profile(dir.path(), &doc).expect("second write");
        assert_eq!(first, second);
        let second_bytes = std::fs::read(&second).expect("readable");
        assert_eq!(first_bytes, second_bytes, "reruns are byte-identical");

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .expect("readable")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files must not survive a write");
    }

    #[test]
    fn rerun_replaces_stale_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut doc = document("epa-101");
        write_profile(dir.path(), &doc).expect("first write");

        doc.name = "Renamed Nation".to_string();
        let path = write_profile(dir.path(), &doc).expect("second write");
        let raw = std::fs::read_to_string(path).expect("readable");
        assert!(raw.contains("Renamed Nation"));
    }

    #[test]
    fn write_failure_cleans_up_the_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing-subdir");
        let doc = document("epa-101");

        let result = write_profile(&missing, &doc);
        assert!(matches!(result, Err(WriteError::Io(_))));
        assert!(!missing.exists());
    }
}

//! Shared annotation handling for scanner implementations.
//!
//! Workloads override their scanner-level default schedules through
//! annotations; saved replica state round-trips through an annotation as
//! well, so the agent itself stays stateless across restarts.

use std::collections::HashMap;

use lightsout_schedule::Schedule;

use crate::error::ScanError;
use crate::object::SavedState;

/// Annotation carrying `;`-separated schedule rules for a single workload.
pub const SCHEDULE_ANNOTATION: &str = "lightsout/schedule";
/// Annotation suppressing all schedules for a workload when set to `true`.
pub const IGNORE_ANNOTATION: &str = "lightsout/ignore";
/// Annotation holding the replica count persisted by `state=save`.
pub const RESTORE_ANNOTATION: &str = "lightsout/restore-replicas";

/// Resolve the effective schedules for a workload.
///
/// The ignore annotation wins over everything: `true` yields no schedules at
/// all, `false` or absent has no effect, any other value is an error. A
/// schedule annotation replaces the scanner defaults; otherwise the defaults
/// apply unchanged.
pub fn schedules_from_annotations(
    defaults: &[Schedule],
    annotations: &HashMap<String, String>,
) -> Result<Vec<Schedule>, ScanError> {
    let ignore = annotations
        .get(IGNORE_ANNOTATION)
        .map(|v| v.to_lowercase())
        .unwrap_or_default();
    match ignore.as_str() {
        "true" => return Ok(Vec::new()),
        "" | "false" => {}
        other => {
            return Err(ScanError::InvalidAnnotation(
                other.to_string(),
                IGNORE_ANNOTATION,
            ))
        }
    }

    match annotations.get(SCHEDULE_ANNOTATION) {
        Some(ann) if !ann.is_empty() => ann
            .split(';')
            .filter(|part| !part.is_empty())
            .map(|part| Schedule::parse(part).map_err(ScanError::from))
            .collect(),
        _ => Ok(defaults.to_vec()),
    }
}

/// Read back the replica count persisted by an earlier save.
pub fn saved_state_from_annotations(
    annotations: &HashMap<String, String>,
) -> Result<Option<SavedState>, ScanError> {
    let Some(raw) = annotations.get(RESTORE_ANNOTATION) else {
        return Ok(None);
    };
    let replicas = raw
        .parse()
        .map_err(|_| ScanError::InvalidAnnotation(raw.clone(), RESTORE_ANNOTATION))?;
    Ok(Some(SavedState { replicas }))
}

/// The annotation key/value pair persisting `replicas` for a later restore.
pub fn saved_state_annotation(replicas: i32) -> (String, String) {
    (RESTORE_ANNOTATION.to_string(), replicas.to_string())
}

use serde::Serialize;

use lightsout_schedule::Schedule;

/// Scope and defaults for one scanner instance.
///
/// `priority` ranks the objects this scanner contributes when several
/// scanners discover the same workload: the numerically highest priority
/// wins. Callers assign increasing priorities as they register scanners, so
/// a later, more specific scanner (e.g. a selector-scoped override)
/// naturally beats an earlier namespace-wide default.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScannerConfig {
    pub namespace: String,
    pub label_selector: String,
    /// Schedules applied to discovered workloads that carry no schedule
    /// annotation of their own.
    pub default_schedules: Vec<Schedule>,
    /// Workload kind tag, matching the factory registration name.
    pub kind: String,
    pub priority: i32,
}

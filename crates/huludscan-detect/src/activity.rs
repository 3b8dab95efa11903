//! Detection result types.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::event::AuditLogEvent;

/// One detected create → complete → delete sequence.
///
/// The three timestamps always satisfy `created_at <= completed_at <=
/// deleted_at`, and `duration_seconds` never exceeds the window the detector
/// was invoked with. Records are immutable after detection except for
/// `context_events`, which the context expander may attach later.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousActivity {
    /// Login of the actor the sequence is attributed to.
    pub actor: String,
    /// Repository the workflow run belonged to.
    pub repository: String,
    /// Workflow run id. `None` only when the repository-keyed fallback
    /// matcher produced the record (the feed carried no run ids).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<u64>,
    /// Timestamp of the `created_workflow_run` event.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the `completed_workflow_run` event.
    pub completed_at: DateTime<Utc>,
    /// Timestamp of the `delete_workflow_run` event.
    pub deleted_at: DateTime<Utc>,
    /// Full span from created to deleted, rounded to the nearest second.
    pub duration_seconds: u64,
    /// Unrelated activity by the same actor around the sequence, attached
    /// after detection for human review. Empty until then.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub context_events: Vec<AuditLogEvent>,
}

impl SuspiciousActivity {
    /// The padded time range to search for surrounding actor activity:
    /// `[created_at - padding, deleted_at + padding]`.
    pub fn context_window(&self, padding: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.created_at - padding, self.deleted_at + padding)
    }
}

/// Convert an epoch-millisecond timestamp from the feed into a `DateTime`.
///
/// Returns `None` for values outside chrono's representable range; the
/// detector drops such candidates rather than failing the scan.
pub(crate) fn datetime_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

//! Audit-log event model.
//!
//! `AuditLogEvent` is the wire shape of a GitHub organization audit-log
//! record, reduced to the fields the detector cares about. Everything else
//! the API returns is preserved in `extra` so context events survive a
//! serialize round trip unmodified.

use serde::{Deserialize, Serialize};

/// A single immutable audit-log record.
///
/// Events are not required to arrive in timestamp order, and most carry
/// actions unrelated to workflow runs; the detector ignores those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEvent {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "@timestamp")]
    pub timestamp: i64,

    /// Event kind, e.g. `workflows.created_workflow_run`.
    pub action: String,

    /// Login of the principal that triggered the event.
    pub actor: String,

    /// `owner/name` repository slug; present on workflow-run events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Workflow run identifier; the correlation id for sequence detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<u64>,

    /// User the action was performed on behalf of, when different from `actor`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Network origin of the actor, as reported by the audit log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_location: Option<ActorLocation>,

    /// Any other audit-log fields, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Coarse network origin attached to some audit-log events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// The three tracked lifecycle stages of a workflow run.
///
/// A closed enumeration: the indexing step matches on this exhaustively
/// instead of comparing action strings in multiple places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowRunAction {
    Created,
    Completed,
    Deleted,
}

impl WorkflowRunAction {
    /// Classify an audit-log action string, or `None` for anything the
    /// detector does not track.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "workflows.created_workflow_run" => Some(WorkflowRunAction::Created),
            "workflows.completed_workflow_run" => Some(WorkflowRunAction::Completed),
            "workflows.delete_workflow_run" => Some(WorkflowRunAction::Deleted),
            _ => None,
        }
    }

    /// The audit-log action string for this stage.
    pub fn action(&self) -> &'static str {
        match self {
            WorkflowRunAction::Created => "workflows.created_workflow_run",
            WorkflowRunAction::Completed => "workflows.completed_workflow_run",
            WorkflowRunAction::Deleted => "workflows.delete_workflow_run",
        }
    }

    /// All tracked action strings, in lifecycle order.
    pub fn all_actions() -> [&'static str; 3] {
        [
            WorkflowRunAction::Created.action(),
            WorkflowRunAction::Completed.action(),
            WorkflowRunAction::Deleted.action(),
        ]
    }
}

impl AuditLogEvent {
    /// The lifecycle stage of this event, if it is one the detector tracks.
    pub fn run_action(&self) -> Option<WorkflowRunAction> {
        WorkflowRunAction::from_action(&self.action)
    }
}

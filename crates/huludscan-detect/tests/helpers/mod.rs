use huludscan_detect::event::{AuditLogEvent, WorkflowRunAction};

/// Build a workflow-run lifecycle event.
pub fn run_event(
    stage: WorkflowRunAction,
    actor: &str,
    repo: &str,
    run_id: u64,
    ts: i64,
) -> AuditLogEvent {
    AuditLogEvent {
        timestamp: ts,
        action: stage.action().to_string(),
        actor: actor.to_string(),
        repo: Some(repo.to_string()),
        workflow_run_id: Some(run_id),
        user: None,
        actor_location: None,
        extra: serde_json::Map::new(),
    }
}

/// A lifecycle event without a run id (only the repository fallback can use it).
pub fn run_event_no_id(stage: WorkflowRunAction, actor: &str, repo: &str, ts: i64) -> AuditLogEvent {
    let mut event = run_event(stage, actor, repo, 0, ts);
    event.workflow_run_id = None;
    event
}

/// An arbitrary non-lifecycle event.
pub fn unrelated_event(action: &str, actor: &str, ts: i64) -> AuditLogEvent {
    AuditLogEvent {
        timestamp: ts,
        action: action.to_string(),
        actor: actor.to_string(),
        repo: None,
        workflow_run_id: None,
        user: None,
        actor_location: None,
        extra: serde_json::Map::new(),
    }
}

/// Full created/completed/deleted triplet for one run, with stage offsets in ms.
pub fn triplet(
    actor: &str,
    repo: &str,
    run_id: u64,
    base: i64,
    completed_offset: i64,
    deleted_offset: i64,
) -> Vec<AuditLogEvent> {
    vec![
        run_event(WorkflowRunAction::Created, actor, repo, run_id, base),
        run_event(
            WorkflowRunAction::Completed,
            actor,
            repo,
            run_id,
            base + completed_offset,
        ),
        run_event(
            WorkflowRunAction::Deleted,
            actor,
            repo,
            run_id,
            base + deleted_offset,
        ),
    ]
}

//! Lifecycle correlation over a flat event list.
//!
//! The detector reconstructs per-actor workflow-run sequences from an
//! unordered audit-log feed and flags every run that was created, completed,
//! and deleted within the configured time window.
//!
//! Two matchers are provided:
//!
//! - [`detect`] keys sequences by `(actor, workflow_run_id)`. Matching is a
//!   simple presence/order/window check per key. This is the production path.
//! - [`detect_by_repository`] keys by `(actor, repo)` and greedily pairs
//!   sorted stage events, for feeds that carry no stable run identifier.
//!
//! Both are pure functions: no I/O, no shared state, and deterministic
//! output for a given input list and window.

use std::collections::{HashMap, HashSet};

use crate::activity::{SuspiciousActivity, datetime_from_millis};
use crate::event::{AuditLogEvent, WorkflowRunAction};

/// Per-key holder for the three lifecycle stages.
///
/// Duplicate events of one kind for the same key overwrite the previous
/// holder (last-write-wins); callers that care about multiplicity must
/// pre-filter the feed.
#[derive(Default)]
struct Stages<'a> {
    created: Option<&'a AuditLogEvent>,
    completed: Option<&'a AuditLogEvent>,
    deleted: Option<&'a AuditLogEvent>,
}

/// Find create → complete → delete sequences keyed by workflow run id.
///
/// Events without a `workflow_run_id`, and events whose action is not one of
/// the three tracked lifecycle actions, are ignored. A key produces a record
/// only when all three stages are present, in chronological order, and the
/// full created-to-deleted span is at most `window_seconds` (inclusive).
///
/// `window_seconds` must be positive; validating that is the caller's job.
///
/// Results are sorted ascending by `created_at`; ties keep the order in
/// which their keys first appeared in the input.
pub fn detect(events: &[AuditLogEvent], window_seconds: u64) -> Vec<SuspiciousActivity> {
    let window_ms = window_millis(window_seconds);

    let mut groups: HashMap<(&str, u64), Stages<'_>> = HashMap::new();
    let mut key_order: Vec<(&str, u64)> = Vec::new();

    for event in events {
        let Some(stage) = event.run_action() else {
            continue;
        };
        let Some(run_id) = event.workflow_run_id else {
            continue;
        };
        if !timestamp_in_range(event.timestamp) {
            continue;
        }

        let key = (event.actor.as_str(), run_id);
        let stages = groups.entry(key).or_insert_with(|| {
            key_order.push(key);
            Stages::default()
        });

        match stage {
            WorkflowRunAction::Created => stages.created = Some(event),
            WorkflowRunAction::Completed => stages.completed = Some(event),
            WorkflowRunAction::Deleted => stages.deleted = Some(event),
        }
    }

    let mut suspicious = Vec::new();

    for key @ (actor, run_id) in key_order {
        let stages = &groups[&key];
        let (Some(created), Some(completed), Some(deleted)) =
            (stages.created, stages.completed, stages.deleted)
        else {
            continue;
        };

        // Out-of-order stages are noise or clock skew, not an attack; the
        // detector never reorders or repairs them.
        if completed.timestamp < created.timestamp || deleted.timestamp < completed.timestamp {
            continue;
        }

        let span_ms = deleted.timestamp - created.timestamp;
        if span_ms > window_ms {
            continue;
        }

        let Some(activity) = build_activity(
            actor,
            repository_of(created, completed, deleted),
            Some(run_id),
            created.timestamp,
            completed.timestamp,
            deleted.timestamp,
        ) else {
            continue;
        };
        suspicious.push(activity);
    }

    suspicious.sort_by_key(|a| a.created_at);
    suspicious
}

/// Greedy fallback matcher keyed by `(actor, repo)`, for feeds that lack a
/// stable workflow run identifier.
///
/// Stage events are sorted per key and paired greedily: a created event
/// takes the earliest unused completed event at or after it within the
/// window, then the earliest unused deleted event at or after that completed
/// event, still within the window measured from the created event. Each
/// event is consumed at most once, tracked by index marking rather than by
/// removing elements from the sorted arrays.
///
/// Prefer [`detect`] whenever the feed carries run ids: repository keying
/// can conflate unrelated runs that happen close together.
pub fn detect_by_repository(
    events: &[AuditLogEvent],
    window_seconds: u64,
) -> Vec<SuspiciousActivity> {
    let window_ms = window_millis(window_seconds);

    let mut groups: HashMap<(&str, &str), StageArrays<'_>> = HashMap::new();
    let mut key_order: Vec<(&str, &str)> = Vec::new();

    for event in events {
        let Some(stage) = event.run_action() else {
            continue;
        };
        let Some(repo) = event.repo.as_deref() else {
            continue;
        };
        if !timestamp_in_range(event.timestamp) {
            continue;
        }

        let key = (event.actor.as_str(), repo);
        let arrays = groups.entry(key).or_insert_with(|| {
            key_order.push(key);
            StageArrays::default()
        });

        match stage {
            WorkflowRunAction::Created => arrays.created.push(event),
            WorkflowRunAction::Completed => arrays.completed.push(event),
            WorkflowRunAction::Deleted => arrays.deleted.push(event),
        }
    }

    let mut suspicious = Vec::new();

    for key @ (actor, repo) in key_order {
        let Some(arrays) = groups.get_mut(&key) else {
            continue;
        };
        arrays.sort_by_timestamp();

        for matched in match_sequences(arrays, window_ms) {
            let Some(activity) = build_activity(
                actor,
                repo.to_string(),
                None,
                matched.created.timestamp,
                matched.completed.timestamp,
                matched.deleted.timestamp,
            ) else {
                continue;
            };
            suspicious.push(activity);
        }
    }

    suspicious.sort_by_key(|a| a.created_at);
    suspicious
}

#[derive(Default)]
struct StageArrays<'a> {
    created: Vec<&'a AuditLogEvent>,
    completed: Vec<&'a AuditLogEvent>,
    deleted: Vec<&'a AuditLogEvent>,
}

impl StageArrays<'_> {
    fn sort_by_timestamp(&mut self) {
        self.created.sort_by_key(|e| e.timestamp);
        self.completed.sort_by_key(|e| e.timestamp);
        self.deleted.sort_by_key(|e| e.timestamp);
    }
}

struct MatchedSequence<'a> {
    created: &'a AuditLogEvent,
    completed: &'a AuditLogEvent,
    deleted: &'a AuditLogEvent,
}

/// Pair sorted stage arrays greedily, consuming each event at most once.
fn match_sequences<'a>(arrays: &StageArrays<'a>, window_ms: i64) -> Vec<MatchedSequence<'a>> {
    let mut matches = Vec::new();
    let mut used_completed: HashSet<usize> = HashSet::new();
    let mut used_deleted: HashSet<usize> = HashSet::new();

    for &created in &arrays.created {
        let Some((ci, completed)) = first_unused(
            &arrays.completed,
            &used_completed,
            created.timestamp,
            created.timestamp,
            window_ms,
        ) else {
            continue;
        };
        // The completed event is consumed even if no deleted event pairs
        // with it; a later created event must not claim it.
        used_completed.insert(ci);

        let Some((di, deleted)) = first_unused(
            &arrays.deleted,
            &used_deleted,
            completed.timestamp,
            created.timestamp,
            window_ms,
        ) else {
            continue;
        };
        used_deleted.insert(di);
        matches.push(MatchedSequence {
            created,
            completed,
            deleted,
        });
    }

    matches
}

/// Earliest unused event at or after `not_before` whose distance from
/// `window_start` does not exceed the window.
fn first_unused<'a>(
    sorted: &[&'a AuditLogEvent],
    used: &HashSet<usize>,
    not_before: i64,
    window_start: i64,
    window_ms: i64,
) -> Option<(usize, &'a AuditLogEvent)> {
    sorted.iter().enumerate().find_map(|(i, event)| {
        if used.contains(&i) {
            return None;
        }
        if event.timestamp >= not_before && event.timestamp - window_start <= window_ms {
            Some((i, *event))
        } else {
            None
        }
    })
}

/// Timestamps must survive `datetime_from_millis` to participate in
/// correlation. Rejecting out-of-range values at the indexing step keeps all
/// later span arithmetic within `i64` (chrono's range is far below the
/// integer limits), so a wild record can never abort the scan.
fn timestamp_in_range(millis: i64) -> bool {
    datetime_from_millis(millis).is_some()
}

fn window_millis(window_seconds: u64) -> i64 {
    i64::try_from(window_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
}

fn repository_of(
    created: &AuditLogEvent,
    completed: &AuditLogEvent,
    deleted: &AuditLogEvent,
) -> String {
    created
        .repo
        .as_deref()
        .or(completed.repo.as_deref())
        .or(deleted.repo.as_deref())
        .unwrap_or_default()
        .to_string()
}

fn build_activity(
    actor: &str,
    repository: String,
    workflow_run_id: Option<u64>,
    created_ms: i64,
    completed_ms: i64,
    deleted_ms: i64,
) -> Option<SuspiciousActivity> {
    let span_ms = deleted_ms - created_ms;
    Some(SuspiciousActivity {
        actor: actor.to_string(),
        repository,
        workflow_run_id,
        created_at: datetime_from_millis(created_ms)?,
        completed_at: datetime_from_millis(completed_ms)?,
        deleted_at: datetime_from_millis(deleted_ms)?,
        // round to nearest second; span is non-negative after the order check
        duration_seconds: ((span_ms + 500) / 1000) as u64,
        context_events: Vec::new(),
    })
}

//! Audit-log search-phrase construction.
//!
//! The org audit-log API filters with a free-text `phrase` parameter using
//! the same syntax as the audit-log UI. Dates in a phrase are day-granular;
//! callers that need exact bounds filter client-side afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use huludscan_detect::WorkflowRunAction;

/// Phrase selecting the three workflow-run lifecycle actions since a date,
/// optionally extended with an operator-supplied filter.
pub fn workflow_events_phrase(since: NaiveDate, additional: &str) -> String {
    let actions: Vec<String> = WorkflowRunAction::all_actions()
        .iter()
        .map(|action| format!("action:{action}"))
        .collect();

    let mut phrase = format!("{} created:>={since}", actions.join(" "));

    let additional = additional.trim();
    if !additional.is_empty() {
        phrase.push(' ');
        phrase.push_str(additional);
    }

    phrase
}

/// Phrase selecting all activity by one actor in a day-granular date range.
pub fn actor_context_phrase(actor: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "actor:{actor} created:{}..{}",
        start.date_naive(),
        end.date_naive()
    )
}

/// Human-facing deep link into the organization's audit-log UI, pre-filtered
/// to one actor and date range. Goes into reports so a reviewer lands on the
/// right view in one click.
pub fn audit_log_search_url(
    org: &str,
    actor: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> String {
    let phrase = actor_context_phrase(actor, start, end);
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", &phrase)
        .finish();
    format!("https://github.com/organizations/{org}/settings/audit-log?{query}")
}

//! Report rendering: Markdown summary and CSV export.

use chrono::{DateTime, SecondsFormat, Utc};
use huludscan_detect::SuspiciousActivity;
use huludscan_github::audit_log_search_url;

use std::collections::BTreeSet;

/// Scan parameters echoed into the summary header.
pub struct ScanInfo<'a> {
    /// Days of history fetched; `None` in offline analysis.
    pub days_back: Option<u32>,
    pub window_seconds: u64,
    /// Organization scanned; `None` in offline analysis, which disables the
    /// audit-log deep links.
    pub org: Option<&'a str>,
}

/// Render the Markdown scan summary.
pub fn render_summary(activities: &[SuspiciousActivity], info: &ScanInfo<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Self-Deleting Workflow Run Scan Results".to_string());
    lines.push(String::new());
    lines.push("## Scan Parameters".to_string());
    if let Some(days_back) = info.days_back {
        lines.push(format!("- **Days scanned:** {days_back}"));
    }
    lines.push(format!("- **Time window:** {} seconds", info.window_seconds));
    lines.push(String::new());
    lines.push("## Statistics".to_string());

    if activities.is_empty() {
        lines.push(String::new());
        lines.push("✅ **No suspicious activity found.**".to_string());
        return lines.join("\n");
    }

    let unique_actors: BTreeSet<&str> = activities.iter().map(|a| a.actor.as_str()).collect();
    let unique_repos: BTreeSet<&str> = activities.iter().map(|a| a.repository.as_str()).collect();

    lines.push(format!(
        "- **Suspicious activity sequences:** {}",
        activities.len()
    ));
    lines.push(format!("- **Unique actors:** {}", unique_actors.len()));
    lines.push(format!(
        "- **Unique repositories affected:** {}",
        unique_repos.len()
    ));
    lines.push(String::new());

    lines.push("## Suspicious Activity Details".to_string());
    lines.push(String::new());
    lines.push(
        "| Actor | Repository | Run ID | Created At | Completed At | Deleted At | Duration (s) |"
            .to_string(),
    );
    lines.push(
        "|-------|------------|--------|------------|--------------|------------|--------------|"
            .to_string(),
    );

    for activity in activities {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            activity.actor,
            activity.repository,
            run_id_cell(activity),
            format_timestamp(activity.created_at),
            format_timestamp(activity.completed_at),
            format_timestamp(activity.deleted_at),
            activity.duration_seconds,
        ));
    }

    if let Some(org) = info.org {
        lines.push(String::new());
        lines.push("## Audit Log Links".to_string());
        lines.push(String::new());
        for activity in activities {
            let (start, end) = activity.context_window(chrono::Duration::zero());
            lines.push(format!(
                "- [{} / {}]({})",
                activity.actor,
                activity.repository,
                audit_log_search_url(org, &activity.actor, start, end),
            ));
        }
    }

    lines.join("\n")
}

/// Render the CSV export. Header row always present; string fields quoted,
/// timestamps RFC 3339 with millisecond precision.
pub fn render_csv(activities: &[SuspiciousActivity]) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(
        "Actor,Repository,Workflow Run ID,Created At,Completed At,Deleted At,Duration (seconds)"
            .to_string(),
    );

    for activity in activities {
        lines.push(format!(
            "\"{}\",\"{}\",{},\"{}\",\"{}\",\"{}\",{}",
            activity.actor,
            activity.repository,
            run_id_cell(activity),
            iso_timestamp(activity.created_at),
            iso_timestamp(activity.completed_at),
            iso_timestamp(activity.deleted_at),
            activity.duration_seconds,
        ));
    }

    lines.join("\n")
}

fn run_id_cell(activity: &SuspiciousActivity) -> String {
    activity
        .workflow_run_id
        .map(|id| id.to_string())
        .unwrap_or_default()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string()
}

fn iso_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! GitHub org audit-log API client.
//!
//! Pages through `GET /orgs/{org}/audit-log` with bearer-token auth, following
//! the `Link` response header's `after=` cursor until the feed is exhausted.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::header;
use tracing::debug;
use url::Url;

use huludscan_detect::AuditLogEvent;

use crate::error::{GithubError, Result};
use crate::phrase;

/// Default REST endpoint; override for GHES or tests.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PAGE_SIZE: u32 = 100;
const USER_AGENT: &str = concat!("huludscan/", env!("CARGO_PKG_VERSION"));

/// Matches the `rel="next"` entry of a `Link` header and captures its
/// `after` cursor.
static NEXT_CURSOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[^>]*[?&]after=([^&>]+)[^>]*>;\s*rel="next""#).expect("literal pattern")
});

/// Client for the organization audit-log REST API.
pub struct AuditLogClient {
    http: reqwest::Client,
    token: String,
    base_url: Url,
}

impl AuditLogClient {
    /// Client against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Client against a custom API base URL (GHES, test doubles).
    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(AuditLogClient {
            http: reqwest::Client::new(),
            token: token.into(),
            base_url: Url::parse(&normalized)?,
        })
    }

    /// Fetch all workflow-run lifecycle events for the org from the last
    /// `days_back` days, optionally narrowed by an extra phrase.
    pub async fn fetch_workflow_events(
        &self,
        org: &str,
        days_back: u32,
        additional_phrase: &str,
    ) -> Result<Vec<AuditLogEvent>> {
        let since = (Utc::now() - Duration::days(i64::from(days_back))).date_naive();
        let phrase = phrase::workflow_events_phrase(since, additional_phrase);
        self.fetch_all(org, &phrase).await
    }

    /// Fetch all activity by one actor inside an exact time range.
    ///
    /// The API phrase is day-granular, so the result is filtered down to the
    /// requested millisecond range and sorted ascending by timestamp.
    pub async fn fetch_actor_events(
        &self,
        org: &str,
        actor: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEvent>> {
        let phrase = phrase::actor_context_phrase(actor, start, end);
        let mut events = self.fetch_all(org, &phrase).await?;

        let (start_ms, end_ms) = (start.timestamp_millis(), end.timestamp_millis());
        events.retain(|e| e.timestamp >= start_ms && e.timestamp <= end_ms);
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    /// Page through the audit log for one phrase until no next cursor remains.
    async fn fetch_all(&self, org: &str, phrase: &str) -> Result<Vec<AuditLogEvent>> {
        let url = self.base_url.join(&format!("orgs/{org}/audit-log"))?;
        let per_page = PAGE_SIZE.to_string();

        let mut all_events = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page = 0u32;

        loop {
            let mut request = self
                .http
                .get(url.clone())
                .bearer_auth(&self.token)
                .header(header::ACCEPT, "application/vnd.github+json")
                .header(header::USER_AGENT, USER_AGENT)
                .query(&[("phrase", phrase), ("per_page", per_page.as_str())]);
            if let Some(after) = &cursor {
                request = request.query(&[("after", after.as_str())]);
            }

            let response = request.send().await?;
            let status = response.status();
            let link_header = response
                .headers()
                .get(header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            let body = response.text().await?;
            if !status.is_success() {
                return Err(GithubError::Status {
                    status,
                    body: truncate(&body, 200),
                });
            }

            let events: Vec<AuditLogEvent> = serde_json::from_str(&body)?;
            page += 1;
            debug!(page, events = events.len(), "fetched audit-log page");
            all_events.extend(events);

            cursor = link_header.as_deref().and_then(extract_next_cursor);
            if cursor.is_none() {
                return Ok(all_events);
            }
        }
    }
}

/// Pull the percent-decoded `after` cursor out of a `Link` header, if the
/// header advertises a next page.
fn extract_next_cursor(link_header: &str) -> Option<String> {
    let captures = NEXT_CURSOR_RE.captures(link_header)?;
    let raw = captures.get(1)?.as_str();
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

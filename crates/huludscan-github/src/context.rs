//! Context expansion for flagged sequences.
//!
//! After detection, each `SuspiciousActivity` can be enriched with the
//! actor's unrelated activity in a padded window around the sequence, for
//! human review. Expansion is orchestrated by the caller, never by the
//! detector itself, and plays no part in the detection decision.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use huludscan_detect::{AuditLogEvent, SuspiciousActivity};

use crate::client::AuditLogClient;
use crate::error::Result;

/// Source of per-actor activity in a time range.
///
/// `AuditLogClient` is the production implementation; tests substitute a
/// stub so expansion logic runs without a network.
#[async_trait]
pub trait ActorActivitySource {
    async fn actor_events(
        &self,
        org: &str,
        actor: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEvent>>;
}

#[async_trait]
impl ActorActivitySource for AuditLogClient {
    async fn actor_events(
        &self,
        org: &str,
        actor: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AuditLogEvent>> {
        self.fetch_actor_events(org, actor, start, end).await
    }
}

/// Attaches surrounding actor activity to detected sequences.
pub struct ContextExpander<'a, S: ActorActivitySource> {
    source: &'a S,
    org: String,
    padding: Duration,
}

impl<'a, S: ActorActivitySource> ContextExpander<'a, S> {
    pub fn new(source: &'a S, org: impl Into<String>, padding_minutes: i64) -> Self {
        ContextExpander {
            source,
            org: org.into(),
            padding: Duration::minutes(padding_minutes),
        }
    }

    /// Fetch and attach context events for one flagged sequence.
    pub async fn expand(&self, activity: &mut SuspiciousActivity) -> Result<()> {
        let (start, end) = activity.context_window(self.padding);
        let events = self
            .source
            .actor_events(&self.org, &activity.actor, start, end)
            .await?;
        debug!(
            actor = %activity.actor,
            events = events.len(),
            "attached context events"
        );
        activity.context_events = events;
        Ok(())
    }

    /// Expand every flagged sequence, one retrieval per record.
    pub async fn expand_all(&self, activities: &mut [SuspiciousActivity]) -> Result<()> {
        for activity in activities {
            self.expand(activity).await?;
        }
        Ok(())
    }
}

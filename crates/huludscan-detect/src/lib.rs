//! # huludscan-detect
//!
//! Detection core for self-deleting workflow runs in GitHub organization
//! audit logs: an actor creating a workflow run, letting it complete, and
//! deleting it within a short time window — the footprint of an attacker
//! using CI runs to exfiltrate secrets and cover their tracks.
//!
//! The crate is pure computation: it takes a flat, unordered list of
//! [`AuditLogEvent`]s plus a window in seconds and returns
//! [`SuspiciousActivity`] records sorted by creation time. Retrieval and
//! reporting live in the sibling crates.
//!
//! ## Quick start
//!
//! ```rust
//! use huludscan_detect::{AuditLogEvent, detect};
//! use serde_json::json;
//!
//! let base: i64 = 1_700_000_000_000;
//! let events: Vec<AuditLogEvent> = [
//!     ("workflows.created_workflow_run", base),
//!     ("workflows.completed_workflow_run", base + 5_000),
//!     ("workflows.delete_workflow_run", base + 10_000),
//! ]
//! .into_iter()
//! .map(|(action, ts)| {
//!     serde_json::from_value(json!({
//!         "@timestamp": ts,
//!         "action": action,
//!         "actor": "mallory",
//!         "repo": "acme/payroll",
//!         "workflow_run_id": 77,
//!     }))
//!     .unwrap()
//! })
//! .collect();
//!
//! let findings = detect(&events, 60);
//! assert_eq!(findings.len(), 1);
//! assert_eq!(findings[0].duration_seconds, 10);
//! ```

pub mod activity;
pub mod detector;
pub mod event;

pub use activity::SuspiciousActivity;
pub use detector::{detect, detect_by_repository};
pub use event::{ActorLocation, AuditLogEvent, WorkflowRunAction};

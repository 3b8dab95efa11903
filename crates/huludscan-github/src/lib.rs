//! # huludscan-github
//!
//! Retrieval collaborator for the detection core: pages workflow-run
//! lifecycle events out of the GitHub organization audit-log API, and
//! expands flagged sequences with surrounding actor activity for review.
//!
//! The detection core never depends on this crate; data flows one way,
//! events in, reports out.

pub mod client;
pub mod context;
pub mod error;
pub mod phrase;

pub use client::{AuditLogClient, DEFAULT_API_URL};
pub use context::{ActorActivitySource, ContextExpander};
pub use error::{GithubError, Result};
pub use phrase::audit_log_search_url;

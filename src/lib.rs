//! Workflow engine for a job marketplace.
//!
//! A job moves through twelve fixed [`workflow::WorkflowStep`]s from posting
//! to payment finalization. [`workflow::WorkflowEngine`] validates and
//! applies each transition against the [`store::JobStore`] and emits
//! notifications through [`notify::NotificationDispatcher`]. Both stores
//! publish versioned snapshots to any number of subscribers.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod query;
pub mod seed;
pub mod store;
pub mod workflow;

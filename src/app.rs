//! Service wiring owned by the process entry point.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::EngineConfig;
use crate::error::AppError;
use crate::notify::NotificationDispatcher;
use crate::query::QueryFacade;
use crate::seed;
use crate::store::JobStore;
use crate::workflow::{JobRecord, WorkflowEngine};

/// One instance of every service, sharing the same two stores.
///
/// Built once by `main` and handed to whatever needs it; there is no
/// process-wide instance.
#[derive(Clone)]
pub struct Services {
    pub jobs: Arc<JobStore>,
    pub notifications: Arc<NotificationDispatcher>,
    pub engine: WorkflowEngine,
    pub query: QueryFacade,
}

impl Services {
    pub fn new(config: &EngineConfig) -> Self {
        let jobs = Arc::new(JobStore::new(config.channel_capacity));
        let notifications = Arc::new(NotificationDispatcher::new(config.channel_capacity));
        Self {
            engine: WorkflowEngine::new(jobs.clone(), notifications.clone()),
            query: QueryFacade::new(jobs.clone(), notifications.clone()),
            jobs,
            notifications,
        }
    }

    /// Load the demo jobs and their application notices.
    pub async fn seed(&self) {
        let jobs = seed::sample_jobs();
        let notes = seed::sample_notifications(&jobs);
        self.jobs.load(jobs).await;
        self.notifications.load(notes).await;
        tracing::debug!("Sample data loaded");
    }
}

// TOML needs a top-level table.
#[derive(Deserialize)]
struct JobFile {
    #[serde(default)]
    jobs: Vec<JobRecord>,
}

/// Read job records from a `.json` array or a `.toml` file of `[[jobs]]`.
pub fn load_jobs(path: &Path) -> Result<Vec<JobRecord>, AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        }
        Some("toml") => {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str::<JobFile>(&contents)?.jobs)
        }
        _ => Err(AppError::UnsupportedFile(path.display().to_string())),
    }
}

/// Ids that occur more than once in `jobs`, with their counts, in first
/// appearance order. Loading keeps only the last record for each.
pub fn duplicate_ids(jobs: &[JobRecord]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for job in jobs {
        match counts.iter_mut().find(|(id, _)| *id == job.id) {
            Some((_, n)) => *n += 1,
            None => counts.push((job.id.clone(), 1)),
        }
    }
    counts.retain(|(_, n)| *n > 1);
    counts
}

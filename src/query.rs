//! Read-only projections over the current store snapshots.
//!
//! Every query clones one snapshot `Arc` and works on it without holding a
//! lock, so a query never delays a writer beyond that single read.

use std::sync::Arc;

use crate::error::EngineResult;
use crate::notify::{Notification, NotificationDispatcher};
use crate::store::JobStore;
use crate::workflow::{JobRecord, JobStatus};

#[derive(Clone)]
pub struct QueryFacade {
    jobs: Arc<JobStore>,
    notifications: Arc<NotificationDispatcher>,
}

impl QueryFacade {
    pub fn new(jobs: Arc<JobStore>, notifications: Arc<NotificationDispatcher>) -> Self {
        Self {
            jobs,
            notifications,
        }
    }

    pub async fn job(&self, id: &str) -> EngineResult<JobRecord> {
        self.jobs.get(id).await
    }

    /// Jobs in `status`, in posting order.
    pub async fn list_jobs_by_status(&self, status: JobStatus) -> Vec<JobRecord> {
        self.jobs_where(|j| j.status == status).await
    }

    /// Jobs posted by `client_id`.
    pub async fn jobs_for_poster(&self, client_id: &str) -> Vec<JobRecord> {
        self.jobs_where(|j| j.client_id == client_id).await
    }

    /// Jobs `worker_id` is assigned to or still has an open application for.
    pub async fn jobs_for_worker(&self, worker_id: &str) -> Vec<JobRecord> {
        self.jobs_where(|j| {
            j.worker_id.as_deref() == Some(worker_id) || j.is_open_applicant(worker_id)
        })
        .await
    }

    /// Every job, most recently updated first.
    pub async fn jobs_by_recency(&self) -> Vec<JobRecord> {
        let mut jobs: Vec<JobRecord> = self.jobs.snapshot().await.iter().rev().cloned().collect();
        jobs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        jobs
    }

    /// Unpublished drafts, newest first.
    pub async fn drafts(&self) -> Vec<JobRecord> {
        let mut drafts: Vec<JobRecord> = self
            .jobs
            .snapshot()
            .await
            .iter()
            .rev()
            .filter(|j| j.status == JobStatus::Draft)
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.draft_timestamp.cmp(&a.draft_timestamp));
        drafts
    }

    /// Number of jobs per status, in [`JobStatus::ALL`] order.
    pub async fn status_counts(&self) -> Vec<(JobStatus, usize)> {
        let snapshot = self.jobs.snapshot().await;
        JobStatus::ALL
            .into_iter()
            .map(|s| (s, snapshot.iter().filter(|j| j.status == s).count()))
            .collect()
    }

    /// Notifications addressed to `recipient_id`, newest first. Equal
    /// timestamps keep the later-created notification first.
    pub async fn list_notifications_by_recipient(&self, recipient_id: &str) -> Vec<Notification> {
        let mut notes: Vec<Notification> = self
            .notifications
            .snapshot()
            .await
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    pub async fn unread_count(&self, recipient_id: &str) -> usize {
        self.notifications.unread_count_for(recipient_id).await
    }

    async fn jobs_where(&self, pred: impl Fn(&JobRecord) -> bool) -> Vec<JobRecord> {
        self.jobs
            .snapshot()
            .await
            .iter()
            .filter(|j| pred(j))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{WorkflowEngine, job::sample_new_job};
    use chrono::{Duration, Utc};

    fn services() -> (WorkflowEngine, QueryFacade) {
        let jobs = Arc::new(JobStore::default());
        let notifications = Arc::new(NotificationDispatcher::default());
        (
            WorkflowEngine::new(jobs.clone(), notifications.clone()),
            QueryFacade::new(jobs, notifications),
        )
    }

    #[tokio::test]
    async fn filters_by_status_poster_and_worker() {
        let (engine, query) = services();
        let active = engine.post_job(sample_new_job()).await;
        let draft = engine.save_draft(sample_new_job()).await;
        let mut other = sample_new_job();
        other.client_id = "client_juma".into();
        let other = engine.post_job(other).await;
        engine
            .apply_for_job(&other.id, "worker_john", "John")
            .await
            .unwrap();

        let ids = |jobs: Vec<JobRecord>| jobs.into_iter().map(|j| j.id).collect::<Vec<_>>();
        assert_eq!(
            ids(query.list_jobs_by_status(JobStatus::Active).await),
            vec![active.id.clone(), other.id.clone()]
        );
        assert_eq!(ids(query.drafts().await), vec![draft.id.clone()]);
        assert_eq!(
            ids(query.jobs_for_poster("client_mary").await),
            vec![active.id.clone(), draft.id.clone()]
        );
        assert_eq!(ids(query.jobs_for_worker("worker_john").await), vec![other.id]);
        assert!(query.jobs_for_worker("worker_peter").await.is_empty());

        let counts = query.status_counts().await;
        assert_eq!(counts[0], (JobStatus::Draft, 1));
        assert_eq!(counts[1], (JobStatus::Active, 2));
    }

    #[tokio::test]
    async fn turned_down_applications_leave_the_worker_list() {
        let (engine, query) = services();
        let job = engine.post_job(sample_new_job()).await;
        engine.apply_for_job(&job.id, "worker_john", "John").await.unwrap();
        engine.apply_for_job(&job.id, "worker_peter", "Peter").await.unwrap();
        assert_eq!(query.jobs_for_worker("worker_peter").await.len(), 1);

        engine.select_contractor(&job.id, "worker_john").await.unwrap();
        assert_eq!(query.jobs_for_worker("worker_john").await.len(), 1);
        assert!(query.jobs_for_worker("worker_peter").await.is_empty());

        let other = engine.post_job(sample_new_job()).await;
        engine.apply_for_job(&other.id, "worker_peter", "Peter").await.unwrap();
        engine.reject_applicant(&other.id, "worker_peter").await.unwrap();
        assert!(query.jobs_for_worker("worker_peter").await.is_empty());
    }

    #[tokio::test]
    async fn recency_puts_latest_update_first() {
        let (engine, query) = services();
        let first = engine.post_job(sample_new_job()).await;
        let second = engine.post_job(sample_new_job()).await;
        // Touching the first job makes it the most recent.
        let mut touched = first.clone();
        touched.updated_at = second.updated_at + Duration::seconds(5);
        engine.jobs().upsert(touched).await;

        let jobs = query.jobs_by_recency().await;
        assert_eq!(jobs[0].id, first.id);
        assert_eq!(jobs[1].id, second.id);
    }

    #[tokio::test]
    async fn inbox_is_newest_first_with_ties_by_insertion() {
        let (_, query) = services();
        let now = Utc::now();
        let mut notes = Vec::new();
        for (i, offset) in [0, 10, 10, -5].into_iter().enumerate() {
            let mut n = crate::notify::NewNotification::new(
                "client_mary",
                crate::notify::NotificationType::SystemUpdate,
                format!("n{i}"),
                "",
            )
            .into_notification();
            n.created_at = now + Duration::seconds(offset);
            notes.push(n);
        }
        query.notifications.load(notes).await;

        let titles: Vec<String> = query
            .list_notifications_by_recipient("client_mary")
            .await
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["n2", "n1", "n0", "n3"]);
        assert!(query.list_notifications_by_recipient("nobody").await.is_empty());
    }

    #[tokio::test]
    async fn unread_count_tracks_mark_all() {
        let (engine, query) = services();
        let job = engine.post_job(sample_new_job()).await;
        engine.apply_for_job(&job.id, "worker_john", "John").await.unwrap();
        engine.apply_for_job(&job.id, "worker_peter", "Peter").await.unwrap();
        engine.select_contractor(&job.id, "worker_john").await.unwrap();

        assert_eq!(query.unread_count("client_mary").await, 2);
        let john_before = query.unread_count("worker_john").await;
        let peter_before = query.unread_count("worker_peter").await;

        engine.notifications().mark_all_as_read("client_mary").await;
        assert_eq!(query.unread_count("client_mary").await, 0);
        assert_eq!(query.unread_count("worker_john").await, john_before);
        assert_eq!(query.unread_count("worker_peter").await, peter_before);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let (_, query) = services();
        assert!(query.job("ghost").await.is_err());
    }
}

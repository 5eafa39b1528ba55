use std::sync::Arc;

use crate::error::EngineResult;
use crate::store::{Repository, Snapshot, Subscription};

use super::model::{NewNotification, Notification};

/// Store name used in logs and `NotFound` errors.
pub const NOTIFICATION_STORE: &str = "notification";

/// Records recipient-addressed notifications and publishes them.
///
/// Owns the notification set. Holds no other state, so one instance can be
/// shared as `Arc<NotificationDispatcher>` by the workflow engine and by
/// external actors alike.
pub struct NotificationDispatcher {
    repo: Repository<Notification>,
}

impl NotificationDispatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            repo: Repository::new(NOTIFICATION_STORE, capacity),
        }
    }

    /// Append exactly one notification and publish the new set.
    pub async fn notify(&self, request: NewNotification) -> Notification {
        let notification = request.into_notification();
        self.repo.upsert(notification.clone()).await;
        tracing::info!(
            notification_id = %notification.id,
            recipient = %notification.recipient_id,
            kind = ?notification.notification_type,
            job_id = notification.job_id.as_deref().unwrap_or("-"),
            "Notification created"
        );
        notification
    }

    /// Load pre-existing notifications (e.g. demo data) as one version.
    pub async fn load(&self, notifications: Vec<Notification>) -> u64 {
        self.repo.upsert_all(notifications).await
    }

    pub async fn get(&self, id: &str) -> EngineResult<Notification> {
        Ok(self.repo.get(id).await?)
    }

    /// Flag one notification as read. Already-read notifications are returned
    /// unchanged without publishing.
    pub async fn mark_as_read(&self, id: &str) -> EngineResult<Notification> {
        let updated = self
            .repo
            .update(id, |n| {
                if n.is_read {
                    return false;
                }
                n.is_read = true;
                true
            })
            .await?;
        tracing::debug!(notification_id = id, "Notification marked read");
        Ok(updated)
    }

    /// Append several notifications as one published version.
    pub async fn notify_all(&self, requests: Vec<NewNotification>) -> Vec<Notification> {
        if requests.is_empty() {
            return Vec::new();
        }
        let created: Vec<Notification> = requests
            .into_iter()
            .map(NewNotification::into_notification)
            .collect();
        self.repo.upsert_all(created.iter().cloned()).await;
        for n in &created {
            tracing::info!(
                notification_id = %n.id,
                recipient = %n.recipient_id,
                kind = ?n.notification_type,
                job_id = n.job_id.as_deref().unwrap_or("-"),
                "Notification created"
            );
        }
        created
    }

    /// Flag every unread notification for `recipient_id` as read, as one
    /// published version. Returns how many changed.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> usize {
        let changed = self
            .repo
            .modify_where(
                |n| n.recipient_id == recipient_id && !n.is_read,
                |n| {
                    n.is_read = true;
                    true
                },
            )
            .await;
        tracing::debug!(recipient = recipient_id, changed, "Marked all read");
        changed
    }

    /// Unread notifications for `recipient_id` in the current snapshot.
    pub async fn unread_count_for(&self, recipient_id: &str) -> usize {
        self.repo
            .snapshot()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count()
    }

    pub async fn snapshot(&self) -> Arc<Snapshot<Notification>> {
        self.repo.snapshot().await
    }

    pub async fn subscribe(&self) -> Subscription<Notification> {
        self.repo.subscribe().await
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(crate::store::DEFAULT_CAPACITY)
    }
}

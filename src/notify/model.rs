use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    JobApplication,
    JobSelected,
    JobRejected,
    JobAccepted,
    JobCompleted,
    JobCancelled,
    PaymentReceived,
    MessageReceived,
    SystemUpdate,
    InvoiceCreated,
    JobStartRequired,
}

/// Where the recipient is expected to go next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    ViewApplicants,
    ViewJob,
    ViewMessage,
    ViewPayment,
    ViewInvoice,
    ViewCompletedJobs,
    StartJobChatbot,
    NoAction,
}

/// A recipient-addressed event. Immutable apart from `is_read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub job_id: Option<String>,
    pub sender_id: Option<String>,
    pub action_type: Option<ActionType>,
    pub action_required: bool,
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Request to create a notification.
///
/// Built with [`NewNotification::new`] and the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub job_id: Option<String>,
    pub sender_id: Option<String>,
    pub action_type: Option<ActionType>,
    pub action_required: bool,
}

impl NewNotification {
    pub fn new(
        recipient_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            notification_type,
            title: title.into(),
            message: message.into(),
            job_id: None,
            sender_id: None,
            action_type: None,
            action_required: false,
        }
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    /// Attach an action. `required` marks it as awaiting the recipient.
    pub fn with_action(mut self, action: ActionType, required: bool) -> Self {
        self.action_type = Some(action);
        self.action_required = required;
        self
    }

    /// Stamp an id and creation time.
    pub(crate) fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            recipient_id: self.recipient_id,
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            created_at: Utc::now(),
            is_read: false,
            job_id: self.job_id,
            sender_id: self.sender_id,
            action_type: self.action_type,
            action_required: self.action_required,
        }
    }
}

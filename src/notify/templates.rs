//! Message templates for the notifications each transition emits.

use super::model::{ActionType, NewNotification, NotificationType};
use crate::workflow::JobRecord;

pub fn job_application(job: &JobRecord, worker_id: &str, worker_name: &str) -> NewNotification {
    NewNotification::new(
        &job.client_id,
        NotificationType::JobApplication,
        "New Job Application",
        format!("{worker_name} applied to your job: \"{}\"", job.title),
    )
    .with_job(&job.id)
    .with_sender(worker_id)
    .with_action(ActionType::ViewApplicants, true)
}

pub fn job_selected(job: &JobRecord, worker_id: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        NotificationType::JobSelected,
        "Job Application Accepted",
        format!("You have been selected for the job: \"{}\"", job.title),
    )
    .with_job(&job.id)
    .with_sender(&job.client_id)
    .with_action(ActionType::ViewJob, true)
}

pub fn job_start_required(job: &JobRecord, worker_id: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        NotificationType::JobStartRequired,
        "Start Your Job",
        format!(
            "You've been selected for \"{}\". Please complete the job start validation to begin working.",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_action(ActionType::StartJobChatbot, true)
}

pub fn job_rejected(job: &JobRecord, worker_id: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        NotificationType::JobRejected,
        "Job Application Update",
        format!(
            "Your application for \"{}\" was not selected this time",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_action(ActionType::NoAction, false)
}

pub fn job_accepted(job: &JobRecord, worker_id: &str, worker_name: &str) -> NewNotification {
    NewNotification::new(
        &job.client_id,
        NotificationType::JobAccepted,
        "Job Accepted",
        format!("{worker_name} accepted your job: \"{}\"", job.title),
    )
    .with_job(&job.id)
    .with_sender(worker_id)
    .with_action(ActionType::ViewJob, false)
}

pub fn completion_submitted(job: &JobRecord) -> NewNotification {
    let mut n = NewNotification::new(
        &job.client_id,
        NotificationType::JobCompleted,
        "Job Completed",
        format!(
            "The contractor marked \"{}\" as completed. Please review the evidence and confirm.",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_action(ActionType::ViewJob, true);
    if let Some(worker) = &job.worker_id {
        n = n.with_sender(worker);
    }
    n
}

pub fn client_confirmed(job: &JobRecord, worker_id: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        NotificationType::SystemUpdate,
        "Completion Confirmed",
        format!(
            "The client confirmed completion of \"{}\". Payment will be processed next.",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_sender(&job.client_id)
    .with_action(ActionType::ViewJob, false)
}

pub fn payment_received(job: &JobRecord, worker_id: &str) -> NewNotification {
    let amount = job.payment.amount.unwrap_or(job.pay);
    NewNotification::new(
        worker_id,
        NotificationType::PaymentReceived,
        "Payment Sent",
        format!(
            "Payment of {amount:.2} for \"{}\" has been sent. Please confirm receipt.",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_sender(&job.client_id)
    .with_action(ActionType::ViewPayment, true)
}

pub fn invoice_created(job: &JobRecord) -> NewNotification {
    let amount = job.payment.amount.unwrap_or(job.pay);
    NewNotification::new(
        &job.client_id,
        NotificationType::InvoiceCreated,
        "Invoice Created",
        format!(
            "Invoice has been created for your completed job: \"{}\". Amount: {amount:.2}",
            job.title
        ),
    )
    .with_job(&job.id)
    .with_action(ActionType::ViewCompletedJobs, true)
}

pub fn job_cancelled(job: &JobRecord, worker_id: &str, reason: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        NotificationType::JobCancelled,
        "Job Cancelled",
        format!("\"{}\" was cancelled by the client: {reason}", job.title),
    )
    .with_job(&job.id)
    .with_sender(&job.client_id)
    .with_action(ActionType::NoAction, false)
}

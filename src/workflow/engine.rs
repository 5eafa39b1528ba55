use std::sync::Arc;

use chrono::Utc;

use super::actions::{self, WorkflowAction};
use super::job::{Applicant, ApplicationStatus, Evidence, JobRecord, JobStatus, NewJob, StepEntry};
use super::step::WorkflowStep;
use crate::error::{EngineError, EngineResult};
use crate::notify::{NewNotification, NotificationDispatcher, templates};
use crate::store::JobStore;

/// Who performs an operation, resolved against the stored job.
#[derive(Debug, Clone, Copy)]
enum Actor<'a> {
    Poster,
    Assigned,
    Worker(&'a str),
    System,
}

impl Actor<'_> {
    fn resolve(self, job: &JobRecord) -> Option<String> {
        match self {
            Actor::Poster => Some(job.client_id.clone()),
            Actor::Assigned => job.worker_id.clone(),
            Actor::Worker(id) => Some(id.to_string()),
            Actor::System => None,
        }
    }
}

/// Validates and applies lifecycle transitions.
///
/// Holds no mutable state of its own: every operation re-reads the job from
/// the [`JobStore`], validates it, writes the post-image back atomically and
/// then hands the resulting notifications to the [`NotificationDispatcher`].
/// A rejected operation writes nothing and notifies nobody.
#[derive(Clone)]
pub struct WorkflowEngine {
    jobs: Arc<JobStore>,
    notifications: Arc<NotificationDispatcher>,
}

impl WorkflowEngine {
    pub fn new(jobs: Arc<JobStore>, notifications: Arc<NotificationDispatcher>) -> Self {
        Self {
            jobs,
            notifications,
        }
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    pub fn notifications(&self) -> &Arc<NotificationDispatcher> {
        &self.notifications
    }

    /// Post a job straight to the marketplace.
    pub async fn post_job(&self, new: NewJob) -> JobRecord {
        self.create(new, JobStatus::Active).await
    }

    /// Keep a job as a draft. It stays invisible to workers until published.
    pub async fn save_draft(&self, new: NewJob) -> JobRecord {
        self.create(new, JobStatus::Draft).await
    }

    async fn create(&self, new: NewJob, status: JobStatus) -> JobRecord {
        let job = JobRecord::new(new, status);
        self.jobs.upsert(job.clone()).await;
        tracing::info!(
            job_id = %job.id,
            client = %job.client_id,
            status = %job.status,
            "Job created"
        );
        job
    }

    pub async fn publish_draft(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::PublishDraft,
            id,
            Actor::Poster,
            |job| {
                job.status = JobStatus::Active;
                job.draft_timestamp = None;
                Ok(())
            },
            |_, _| Vec::new(),
        )
        .await
    }

    /// Record a worker's application and tell the poster about it.
    pub async fn apply_for_job(
        &self,
        id: &str,
        worker_id: &str,
        worker_name: &str,
    ) -> EngineResult<JobRecord> {
        let action = WorkflowAction::ApplyForJob;
        self.apply(
            action,
            id,
            Actor::Worker(worker_id),
            |job| {
                if job.has_applicant(worker_id) {
                    return Err(
                        action.precondition_failed(job, format!("{worker_id} has already applied"))
                    );
                }
                job.applicants.push(Applicant::new(worker_id, worker_name));
                Ok(())
            },
            |job, _| vec![templates::job_application(job, worker_id, worker_name)],
        )
        .await
    }

    /// Turn down one pending application. The job stays open for the others.
    pub async fn reject_applicant(&self, id: &str, worker_id: &str) -> EngineResult<JobRecord> {
        let action = WorkflowAction::RejectApplicant;
        self.apply(
            action,
            id,
            Actor::Poster,
            |job| {
                let reason = match job.applicant(worker_id).map(|a| a.status) {
                    Some(ApplicationStatus::Pending) => None,
                    Some(ApplicationStatus::Selected) => {
                        Some(format!("{worker_id} is the selected contractor"))
                    }
                    Some(ApplicationStatus::Rejected) => {
                        Some(format!("{worker_id} has already been turned down"))
                    }
                    None => Some(format!("{worker_id} has not applied")),
                };
                if let Some(reason) = reason {
                    return Err(action.precondition_failed(job, reason));
                }
                if let Some(applicant) = job.applicant_mut(worker_id) {
                    applicant.status = ApplicationStatus::Rejected;
                }
                Ok(())
            },
            |job, _| vec![templates::job_rejected(job, worker_id)],
        )
        .await
    }

    /// Pick one applicant. The chosen worker is asked to start; every other
    /// pending applicant is turned down and told so.
    pub async fn select_contractor(&self, id: &str, worker_id: &str) -> EngineResult<JobRecord> {
        let action = WorkflowAction::SelectContractor;
        self.apply(
            action,
            id,
            Actor::Poster,
            |job| {
                if !job.has_applicant(worker_id) {
                    return Err(
                        action.precondition_failed(job, format!("{worker_id} has not applied"))
                    );
                }
                if !job.is_open_applicant(worker_id) {
                    let reason = format!("{worker_id} has been turned down");
                    return Err(action.precondition_failed(job, reason));
                }
                job.worker_id = Some(worker_id.to_string());
                Ok(job.award(worker_id))
            },
            |job, turned_down| {
                let mut notes = vec![
                    templates::job_selected(job, worker_id),
                    templates::job_start_required(job, worker_id),
                ];
                notes.extend(turned_down.iter().map(|w| templates::job_rejected(job, w)));
                notes
            },
        )
        .await
    }

    /// A worker takes the job on. The job is re-read by id, so a stale `job`
    /// argument cannot bypass validation.
    ///
    /// The step ends at `CONTRACT_SELECTED`; execution only starts with
    /// [`WorkflowEngine::start_execution`]. Exactly one notification goes to
    /// the poster. Applicants still pending are turned down.
    pub async fn accept_job(&self, job: &JobRecord, worker_id: &str) -> EngineResult<JobRecord> {
        let action = WorkflowAction::AcceptJob;
        self.apply(
            action,
            &job.id,
            Actor::Worker(worker_id),
            |job| {
                if let Some(assigned) = &job.worker_id
                    && assigned != worker_id
                {
                    let reason = format!("job is assigned to {assigned}");
                    return Err(action.precondition_failed(job, reason));
                }
                if job.has_applicant(worker_id) && !job.is_open_applicant(worker_id) {
                    let reason = format!("{worker_id} has been turned down");
                    return Err(action.precondition_failed(job, reason));
                }
                job.worker_id = Some(worker_id.to_string());
                job.status = JobStatus::InProgress;
                Ok(job.award(worker_id))
            },
            |job, turned_down| {
                let name = job
                    .applicant(worker_id)
                    .map_or(worker_id, |a| a.worker_name.as_str());
                let mut notes = vec![templates::job_accepted(job, worker_id, name)];
                notes.extend(turned_down.iter().map(|w| templates::job_rejected(job, w)));
                notes
            },
        )
        .await
    }

    pub async fn start_execution(&self, id: &str) -> EngineResult<JobRecord> {
        self.advance(WorkflowAction::StartExecution, id).await
    }

    pub async fn mark_execution_in_progress(&self, id: &str) -> EngineResult<JobRecord> {
        self.advance(WorkflowAction::MarkExecutionInProgress, id).await
    }

    /// Attach the worker's evidence. At least one item is required.
    pub async fn upload_evidence(&self, id: &str, evidence: Evidence) -> EngineResult<JobRecord> {
        let action = WorkflowAction::UploadEvidence;
        self.apply(
            action,
            id,
            Actor::Assigned,
            move |job| {
                if evidence.is_empty() {
                    return Err(action.precondition_failed(job, "evidence is empty"));
                }
                job.evidence = evidence;
                job.evidence_uploaded = true;
                Ok(())
            },
            |_, _| Vec::new(),
        )
        .await
    }

    pub async fn submit_completion(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::SubmitCompletion,
            id,
            Actor::Assigned,
            |job| {
                job.completed_at = Some(Utc::now());
                Ok(())
            },
            |job, _| vec![templates::completion_submitted(job)],
        )
        .await
    }

    /// The poster accepts the submitted work. Requires uploaded evidence.
    pub async fn process_client_confirmed(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::ConfirmCompletion,
            id,
            Actor::Poster,
            |job| {
                job.client_confirmed = true;
                Ok(())
            },
            |job, _| {
                job.worker_id
                    .iter()
                    .map(|w| templates::client_confirmed(job, w))
                    .collect()
            },
        )
        .await
    }

    /// Request changes on submitted work.
    ///
    /// Always fails with [`EngineError::UnresolvedTransition`] once the job
    /// passes validation: there is no defined way back from
    /// `COMPLETION_SUBMITTED`. The record is never touched.
    pub async fn request_changes(&self, id: &str) -> EngineResult<JobRecord> {
        let action = WorkflowAction::RequestChanges;
        let job = self.jobs.get(id).await?;
        let err = match action.check(&job) {
            Ok(()) => EngineError::UnresolvedTransition {
                operation: action.operation(),
                job_id: job.id.clone(),
                current: job.workflow_step,
            },
            Err(err) => err,
        };
        tracing::warn!(operation = action.operation(), job_id = id, error = %err, "Transition rejected");
        Err(err)
    }

    /// Record the payout. The amount is the job's pay.
    pub async fn process_payment(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::ProcessPayment,
            id,
            Actor::System,
            |job| {
                job.payment.processed = true;
                job.payment.amount = Some(job.pay);
                job.payment.date = Some(Utc::now());
                Ok(())
            },
            |_, _| Vec::new(),
        )
        .await
    }

    pub async fn upload_payment_proof(
        &self,
        id: &str,
        files: Vec<String>,
    ) -> EngineResult<JobRecord> {
        let action = WorkflowAction::UploadPaymentProof;
        self.apply(
            action,
            id,
            Actor::Poster,
            move |job| {
                if files.is_empty() {
                    return Err(action.precondition_failed(job, "no payment proof files"));
                }
                job.payment.proof_uploaded = true;
                job.payment.proof_files = files;
                Ok(())
            },
            |job, _| {
                job.worker_id
                    .iter()
                    .map(|w| templates::payment_received(job, w))
                    .collect()
            },
        )
        .await
    }

    /// The worker confirms the money arrived. Requires a processed payment.
    pub async fn process_contractor_receipt_confirmed(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::ConfirmReceipt,
            id,
            Actor::Assigned,
            |job| {
                job.payment.receipt_confirmed_at = Some(Utc::now());
                Ok(())
            },
            |_, _| Vec::new(),
        )
        .await
    }

    /// Close the workflow: the job becomes `COMPLETED` and the poster gets
    /// an invoice.
    pub async fn process_workflow_finalized(&self, id: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::FinalizeWorkflow,
            id,
            Actor::System,
            |job| {
                job.status = JobStatus::Completed;
                job.finalized_at = Some(Utc::now());
                Ok(())
            },
            |job, _| vec![templates::invoice_created(job)],
        )
        .await
    }

    /// Cancel a job that has not been finalized. The step is left where it
    /// was; the assigned worker, if any, is told.
    pub async fn cancel_job(&self, id: &str, reason: &str) -> EngineResult<JobRecord> {
        self.apply(
            WorkflowAction::CancelJob,
            id,
            Actor::Poster,
            |job| {
                job.status = JobStatus::Cancelled;
                job.cancellation_reason = Some(reason.to_string());
                Ok(())
            },
            |job, _| {
                job.worker_id
                    .iter()
                    .map(|w| templates::job_cancelled(job, w, reason))
                    .collect()
            },
        )
        .await
    }

    pub fn workflow_progress(&self, step: WorkflowStep) -> u8 {
        step.progress()
    }

    /// Operations that may be invoked on the job right now.
    pub async fn allowed_actions(&self, id: &str) -> EngineResult<Vec<WorkflowAction>> {
        let job = self.jobs.get(id).await?;
        Ok(actions::allowed_actions(&job))
    }

    async fn advance(&self, action: WorkflowAction, id: &str) -> EngineResult<JobRecord> {
        self.apply(action, id, Actor::Assigned, |_| Ok(()), |_, _| Vec::new())
            .await
    }

    /// Run one transition.
    ///
    /// `mutate` runs inside the store's write section after `action` has been
    /// checked against the stored record; the step is then moved to the
    /// rule's target and a step change is appended to the job's history.
    /// `notices` builds notifications from the post-image and whatever
    /// `mutate` returned, in the same write section.
    async fn apply<M, T, N>(
        &self,
        action: WorkflowAction,
        id: &str,
        actor: Actor<'_>,
        mutate: M,
        notices: N,
    ) -> EngineResult<JobRecord>
    where
        M: FnOnce(&mut JobRecord) -> EngineResult<T>,
        N: FnOnce(&JobRecord, T) -> Vec<NewNotification>,
    {
        let result = self
            .jobs
            .modify(id, |job| {
                action.check(job)?;
                let from = job.workflow_step;
                let outcome = mutate(job)?;
                if let Some(to) = action.rule().to {
                    job.workflow_step = job.workflow_step.max(to);
                }
                let now = Utc::now();
                if job.workflow_step != from {
                    job.history.push(StepEntry {
                        from,
                        to: job.workflow_step,
                        operation: action.operation().to_string(),
                        at: now,
                        actor: actor.resolve(job),
                    });
                }
                job.updated_at = now;
                debug_assert!(job.is_consistent(), "{action} left job {} inconsistent", job.id);
                Ok((from, notices(job, outcome)))
            })
            .await;

        let (job, (from, notes)) = match result {
            Ok(applied) => applied,
            Err(err) => {
                tracing::warn!(
                    operation = action.operation(),
                    job_id = id,
                    error = %err,
                    "Transition rejected"
                );
                return Err(err);
            }
        };

        tracing::info!(
            operation = action.operation(),
            job_id = %job.id,
            from = %from,
            to = %job.workflow_step,
            status = %job.status,
            "Transition applied"
        );

        self.dispatch(notes).await;
        Ok(job)
    }

    /// Hand notifications to a task of their own. Once a transition is
    /// written its notifications are delivered even if the caller stops
    /// polling.
    async fn dispatch(&self, notes: Vec<NewNotification>) {
        if notes.is_empty() {
            return;
        }
        let notifications = Arc::clone(&self.notifications);
        let task = tokio::spawn(async move { notifications.notify_all(notes).await.len() });
        match task.await {
            Ok(sent) => tracing::debug!(sent, "Notifications dispatched"),
            Err(err) => tracing::error!(error = %err, "Notification dispatch failed"),
        }
    }
}

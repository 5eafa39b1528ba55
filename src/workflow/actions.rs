use serde::{Deserialize, Serialize};

use super::job::{JobRecord, JobStatus};
use super::step::WorkflowStep;
use super::step::WorkflowStep as S;
use crate::error::{EngineError, EngineResult};

/// A named operation that moves a job through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowAction {
    PublishDraft,
    ApplyForJob,
    RejectApplicant,
    SelectContractor,
    AcceptJob,
    StartExecution,
    MarkExecutionInProgress,
    UploadEvidence,
    SubmitCompletion,
    ConfirmCompletion,
    RequestChanges,
    ProcessPayment,
    UploadPaymentProof,
    ConfirmReceipt,
    FinalizeWorkflow,
    CancelJob,
}

/// Preconditions and effect of one [`WorkflowAction`].
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Statuses the job must be in.
    pub statuses: &'static [JobStatus],
    /// Steps the job must be at.
    pub from: &'static [WorkflowStep],
    /// Step the job ends at, or `None` when the step is unchanged.
    pub to: Option<WorkflowStep>,
}

const NOT_FINALIZED: &[WorkflowStep] = &[
    S::RequestPosted,
    S::OffersReceived,
    S::ContractSelected,
    S::ExecutionStarted,
    S::ExecutionInProgress,
    S::EvidenceUploaded,
    S::CompletionSubmitted,
    S::ClientConfirmed,
    S::PaymentProcessing,
    S::PaymentProofUploaded,
    S::ContractorReceiptConfirmed,
];

const IN_PROGRESS: &[JobStatus] = &[JobStatus::InProgress];

fn rule(
    statuses: &'static [JobStatus],
    from: &'static [WorkflowStep],
    to: Option<WorkflowStep>,
) -> Rule {
    Rule { statuses, from, to }
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 16] = [
        WorkflowAction::PublishDraft,
        WorkflowAction::ApplyForJob,
        WorkflowAction::RejectApplicant,
        WorkflowAction::SelectContractor,
        WorkflowAction::AcceptJob,
        WorkflowAction::StartExecution,
        WorkflowAction::MarkExecutionInProgress,
        WorkflowAction::UploadEvidence,
        WorkflowAction::SubmitCompletion,
        WorkflowAction::ConfirmCompletion,
        WorkflowAction::RequestChanges,
        WorkflowAction::ProcessPayment,
        WorkflowAction::UploadPaymentProof,
        WorkflowAction::ConfirmReceipt,
        WorkflowAction::FinalizeWorkflow,
        WorkflowAction::CancelJob,
    ];

    pub fn rule(self) -> Rule {
        match self {
            WorkflowAction::PublishDraft => rule(&[JobStatus::Draft], &[S::RequestPosted], None),
            WorkflowAction::ApplyForJob => rule(
                &[JobStatus::Active],
                &[S::RequestPosted, S::OffersReceived],
                Some(S::OffersReceived),
            ),
            WorkflowAction::RejectApplicant => rule(
                &[JobStatus::Active],
                &[S::OffersReceived, S::ContractSelected],
                None,
            ),
            WorkflowAction::SelectContractor => rule(
                &[JobStatus::Active],
                &[S::OffersReceived],
                Some(S::ContractSelected),
            ),
            WorkflowAction::AcceptJob => rule(
                &[JobStatus::Active],
                &[S::RequestPosted, S::OffersReceived, S::ContractSelected],
                Some(S::ContractSelected),
            ),
            WorkflowAction::StartExecution => {
                rule(IN_PROGRESS, &[S::ContractSelected], Some(S::ExecutionStarted))
            }
            WorkflowAction::MarkExecutionInProgress => rule(
                IN_PROGRESS,
                &[S::ExecutionStarted],
                Some(S::ExecutionInProgress),
            ),
            WorkflowAction::UploadEvidence => rule(
                IN_PROGRESS,
                &[S::ExecutionInProgress],
                Some(S::EvidenceUploaded),
            ),
            WorkflowAction::SubmitCompletion => rule(
                IN_PROGRESS,
                &[S::EvidenceUploaded],
                Some(S::CompletionSubmitted),
            ),
            WorkflowAction::ConfirmCompletion => rule(
                IN_PROGRESS,
                &[S::CompletionSubmitted],
                Some(S::ClientConfirmed),
            ),
            WorkflowAction::RequestChanges => rule(IN_PROGRESS, &[S::CompletionSubmitted], None),
            WorkflowAction::ProcessPayment => rule(
                IN_PROGRESS,
                &[S::ClientConfirmed],
                Some(S::PaymentProcessing),
            ),
            WorkflowAction::UploadPaymentProof => rule(
                IN_PROGRESS,
                &[S::PaymentProcessing],
                Some(S::PaymentProofUploaded),
            ),
            WorkflowAction::ConfirmReceipt => rule(
                IN_PROGRESS,
                &[S::PaymentProofUploaded],
                Some(S::ContractorReceiptConfirmed),
            ),
            WorkflowAction::FinalizeWorkflow => rule(
                IN_PROGRESS,
                &[S::ContractorReceiptConfirmed],
                Some(S::WorkflowFinalized),
            ),
            WorkflowAction::CancelJob => rule(
                &[JobStatus::Active, JobStatus::InProgress],
                NOT_FINALIZED,
                None,
            ),
        }
    }

    /// Name used in logs and errors.
    pub fn operation(self) -> &'static str {
        match self {
            WorkflowAction::PublishDraft => "publish_draft",
            WorkflowAction::ApplyForJob => "apply_for_job",
            WorkflowAction::RejectApplicant => "reject_applicant",
            WorkflowAction::SelectContractor => "select_contractor",
            WorkflowAction::AcceptJob => "accept_job",
            WorkflowAction::StartExecution => "start_execution",
            WorkflowAction::MarkExecutionInProgress => "mark_execution_in_progress",
            WorkflowAction::UploadEvidence => "upload_evidence",
            WorkflowAction::SubmitCompletion => "submit_completion",
            WorkflowAction::ConfirmCompletion => "process_client_confirmed",
            WorkflowAction::RequestChanges => "request_changes",
            WorkflowAction::ProcessPayment => "process_payment",
            WorkflowAction::UploadPaymentProof => "upload_payment_proof",
            WorkflowAction::ConfirmReceipt => "process_contractor_receipt_confirmed",
            WorkflowAction::FinalizeWorkflow => "process_workflow_finalized",
            WorkflowAction::CancelJob => "cancel_job",
        }
    }

    /// Whether the action has a defined effect. `RequestChanges` is
    /// recognised but has no transition yet.
    pub fn is_resolved(self) -> bool {
        self != WorkflowAction::RequestChanges
    }

    /// Validate this action against the job's current state.
    ///
    /// Status is checked before step so that a cancelled or completed job
    /// reports its status rather than a step mismatch.
    pub fn check(self, job: &JobRecord) -> EngineResult<()> {
        let rule = self.rule();

        if !rule.statuses.contains(&job.status) {
            return Err(self.precondition_failed(
                job,
                format!("job is {}, requires {}", job.status, join(rule.statuses)),
            ));
        }

        if !rule.from.contains(&job.workflow_step) {
            return Err(self.invalid_transition(job, join(rule.from)));
        }

        match self {
            WorkflowAction::ConfirmCompletion if !job.evidence_uploaded => {
                let required = format!("{} with evidence uploaded", S::CompletionSubmitted);
                Err(self.invalid_transition(job, required))
            }
            WorkflowAction::ConfirmReceipt if !job.payment.processed => {
                let required = format!("{} with payment processed", S::PaymentProofUploaded);
                Err(self.invalid_transition(job, required))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn invalid_transition(self, job: &JobRecord, required: String) -> EngineError {
        EngineError::InvalidTransition {
            operation: self.operation(),
            job_id: job.id.clone(),
            current: job.workflow_step,
            required,
        }
    }

    pub(crate) fn precondition_failed(self, job: &JobRecord, reason: impl Into<String>) -> EngineError {
        EngineError::PreconditionFailed {
            operation: self.operation(),
            job_id: job.id.clone(),
            status: job.status,
            current: job.workflow_step,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.operation())
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Every resolved action whose preconditions hold for `job` right now.
///
/// Payload checks (non-empty evidence, known applicant) are not part of
/// this and are enforced when the action runs.
pub fn allowed_actions(job: &JobRecord) -> Vec<WorkflowAction> {
    WorkflowAction::ALL
        .into_iter()
        .filter(|a| a.is_resolved() && a.check(job).is_ok())
        .collect()
}

/// Whether any allowed action moves the job to a later step.
pub fn can_advance(job: &JobRecord) -> bool {
    allowed_actions(job).into_iter().any(|a| {
        a.rule()
            .to
            .is_some_and(|to| to > job.workflow_step)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::workflow::job::sample_new_job;

    fn job_at(status: JobStatus, step: WorkflowStep) -> JobRecord {
        let mut job = JobRecord::new(sample_new_job(), status);
        job.workflow_step = step;
        job
    }

    #[test]
    fn rules_only_move_forward() {
        for action in WorkflowAction::ALL {
            let rule = action.rule();
            if let Some(to) = rule.to {
                assert!(
                    rule.from.iter().all(|from| *from <= to),
                    "{action} moves backward"
                );
            }
        }
    }

    #[test]
    fn every_non_terminal_step_has_a_forward_action() {
        for step in &WorkflowStep::ORDER[..WorkflowStep::COUNT - 1] {
            let covered = WorkflowAction::ALL.iter().any(|a| {
                let rule = a.rule();
                rule.from.contains(step) && rule.to.is_some_and(|to| to > *step)
            });
            assert!(covered, "no action leaves {step}");
        }
    }

    #[test]
    fn fresh_active_job_actions() {
        let job = job_at(JobStatus::Active, S::RequestPosted);
        assert_eq!(
            allowed_actions(&job),
            vec![
                WorkflowAction::ApplyForJob,
                WorkflowAction::AcceptJob,
                WorkflowAction::CancelJob
            ]
        );
        assert!(can_advance(&job));
    }

    #[test]
    fn applicants_can_be_turned_down_until_work_starts() {
        let job = job_at(JobStatus::Active, S::OffersReceived);
        assert!(allowed_actions(&job).contains(&WorkflowAction::RejectApplicant));
        let job = job_at(JobStatus::InProgress, S::ContractSelected);
        let err = WorkflowAction::RejectApplicant.check(&job).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn request_changes_is_never_offered() {
        let mut job = job_at(JobStatus::InProgress, S::CompletionSubmitted);
        job.evidence_uploaded = true;
        let actions = allowed_actions(&job);
        assert!(actions.contains(&WorkflowAction::ConfirmCompletion));
        assert!(!actions.contains(&WorkflowAction::RequestChanges));
        assert!(WorkflowAction::RequestChanges.check(&job).is_ok());
    }

    #[test]
    fn confirm_completion_requires_evidence_flag() {
        let job = job_at(JobStatus::InProgress, S::CompletionSubmitted);
        let err = WorkflowAction::ConfirmCompletion.check(&job).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn confirm_receipt_requires_payment_flag() {
        let mut job = job_at(JobStatus::InProgress, S::PaymentProofUploaded);
        assert_eq!(
            WorkflowAction::ConfirmReceipt.check(&job).unwrap_err().kind(),
            ErrorKind::InvalidTransition
        );
        job.payment.processed = true;
        assert!(WorkflowAction::ConfirmReceipt.check(&job).is_ok());
    }

    #[test]
    fn status_is_checked_before_step() {
        let job = job_at(JobStatus::Cancelled, S::ExecutionStarted);
        let err = WorkflowAction::MarkExecutionInProgress.check(&job).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn finalized_job_has_no_actions() {
        let job = job_at(JobStatus::Completed, S::WorkflowFinalized);
        assert!(allowed_actions(&job).is_empty());
        assert!(!can_advance(&job));
    }

    #[test]
    fn draft_can_only_be_published() {
        let job = JobRecord::new(sample_new_job(), JobStatus::Draft);
        assert_eq!(allowed_actions(&job), vec![WorkflowAction::PublishDraft]);
        assert!(!can_advance(&job));
    }

    #[test]
    fn invalid_transition_lists_required_steps() {
        let job = job_at(JobStatus::Active, S::ContractSelected);
        let err = WorkflowAction::ApplyForJob.check(&job).unwrap_err();
        match err {
            EngineError::InvalidTransition { required, .. } => {
                assert_eq!(required, "REQUEST_POSTED | OFFERS_RECEIVED");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

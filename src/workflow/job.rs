use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::step::WorkflowStep;

/// Lifecycle status of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Draft,
    Active,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Draft,
        JobStatus::Active,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    /// Whether `step` is a legal workflow step for a job in this status.
    pub fn permits(self, step: WorkflowStep) -> bool {
        match self {
            JobStatus::Draft => step == WorkflowStep::RequestPosted,
            JobStatus::Active => step <= WorkflowStep::ContractSelected,
            JobStatus::InProgress => {
                step >= WorkflowStep::ContractSelected
                    && step <= WorkflowStep::ContractorReceiptConfirmed
            }
            JobStatus::Completed => step == WorkflowStep::WorkflowFinalized,
            JobStatus::Cancelled => !step.is_terminal(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Draft => write!(f, "DRAFT"),
            JobStatus::Active => write!(f, "ACTIVE"),
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Kind of errand being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Shopping,
    Delivery,
    Survey,
    Other,
}

/// Completion evidence uploaded by the contractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl Evidence {
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
            && self.videos.is_empty()
            && self.documents.is_empty()
            && self.messages.is_empty()
    }
}

/// Payment bookkeeping for the back half of the workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    /// Set once the payment provider has processed the transfer.
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proof_uploaded: bool,
    #[serde(default)]
    pub proof_files: Vec<String>,
    #[serde(default)]
    pub receipt_confirmed_at: Option<DateTime<Utc>>,
}

/// Where an application stands with the poster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Selected,
    Rejected,
}

/// A worker who offered to take the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    pub worker_id: String,
    pub worker_name: String,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ApplicationStatus,
}

impl Applicant {
    pub fn new(worker_id: impl Into<String>, worker_name: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            worker_name: worker_name.into(),
            applied_at: Utc::now(),
            status: ApplicationStatus::Pending,
        }
    }
}

/// One applied step change, appended in apply order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEntry {
    pub from: WorkflowStep,
    pub to: WorkflowStep,
    /// Name of the operation that moved the step.
    pub operation: String,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// Caller-supplied fields for a new posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub job_type: JobType,
    pub pay: f64,
    pub location: String,
    pub client_id: String,
}

/// The canonical record for one job posting through its full lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub job_type: JobType,
    pub pay: f64,
    pub location: String,
    /// The poster.
    pub client_id: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    pub status: JobStatus,
    pub workflow_step: WorkflowStep,
    #[serde(default)]
    pub applicants: Vec<Applicant>,
    #[serde(default)]
    pub evidence_uploaded: bool,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(default)]
    pub client_confirmed: bool,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(default)]
    pub draft_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<StepEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Build a fresh posting at `REQUEST_POSTED` with the given status.
    pub fn new(new: NewJob, status: JobStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            job_type: new.job_type,
            pay: new.pay,
            location: new.location,
            client_id: new.client_id,
            worker_id: None,
            status,
            workflow_step: WorkflowStep::RequestPosted,
            applicants: Vec::new(),
            evidence_uploaded: false,
            evidence: Evidence::default(),
            client_confirmed: false,
            payment: PaymentInfo::default(),
            cancellation_reason: None,
            draft_timestamp: (status == JobStatus::Draft).then_some(now),
            completed_at: None,
            finalized_at: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Status and workflow step agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.status.permits(self.workflow_step)
            && (self.status == JobStatus::Draft) == self.draft_timestamp.is_some()
    }

    pub fn progress(&self) -> u8 {
        self.workflow_step.progress()
    }

    pub fn has_applicant(&self, worker_id: &str) -> bool {
        self.applicants.iter().any(|a| a.worker_id == worker_id)
    }

    pub fn applicant(&self, worker_id: &str) -> Option<&Applicant> {
        self.applicants.iter().find(|a| a.worker_id == worker_id)
    }

    pub(crate) fn applicant_mut(&mut self, worker_id: &str) -> Option<&mut Applicant> {
        self.applicants.iter_mut().find(|a| a.worker_id == worker_id)
    }

    /// Mark `worker_id` selected and turn down every other pending
    /// application. Returns the workers turned down by this call.
    pub(crate) fn award(&mut self, worker_id: &str) -> Vec<String> {
        let mut turned_down = Vec::new();
        for a in &mut self.applicants {
            if a.worker_id == worker_id {
                a.status = ApplicationStatus::Selected;
            } else if a.status == ApplicationStatus::Pending {
                a.status = ApplicationStatus::Rejected;
                turned_down.push(a.worker_id.clone());
            }
        }
        turned_down
    }

    /// The worker applied and has not been turned down.
    pub fn is_open_applicant(&self, worker_id: &str) -> bool {
        self.applicant(worker_id)
            .is_some_and(|a| a.status != ApplicationStatus::Rejected)
    }
}

#[cfg(test)]
pub(crate) fn sample_new_job() -> NewJob {
    NewJob {
        title: "Grocery Shopping".into(),
        description: "Buy groceries from the local market".into(),
        job_type: JobType::Shopping,
        pay: 25.0,
        location: "Dodoma Central Market".into(),
        client_id: "client_mary".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_defaults() {
        let job = JobRecord::new(sample_new_job(), JobStatus::Active);
        assert_eq!(job.status, JobStatus::Active);
        assert_eq!(job.workflow_step, WorkflowStep::RequestPosted);
        assert!(job.worker_id.is_none());
        assert!(job.draft_timestamp.is_none());
        assert!(!job.evidence_uploaded);
        assert!(job.is_consistent());
        assert_eq!(job.progress(), 0);
    }

    #[test]
    fn draft_carries_timestamp() {
        let job = JobRecord::new(sample_new_job(), JobStatus::Draft);
        assert!(job.draft_timestamp.is_some());
        assert!(job.is_consistent());
    }

    #[test]
    fn active_job_past_contract_is_inconsistent() {
        let mut job = JobRecord::new(sample_new_job(), JobStatus::Active);
        job.workflow_step = WorkflowStep::ContractSelected;
        assert!(job.is_consistent());
        job.workflow_step = WorkflowStep::ExecutionInProgress;
        assert!(!job.is_consistent());
    }

    #[test]
    fn status_step_table() {
        assert!(JobStatus::Draft.permits(WorkflowStep::RequestPosted));
        assert!(!JobStatus::Draft.permits(WorkflowStep::OffersReceived));
        assert!(!JobStatus::InProgress.permits(WorkflowStep::OffersReceived));
        assert!(JobStatus::InProgress.permits(WorkflowStep::PaymentProcessing));
        assert!(!JobStatus::InProgress.permits(WorkflowStep::WorkflowFinalized));
        assert!(JobStatus::Completed.permits(WorkflowStep::WorkflowFinalized));
        assert!(!JobStatus::Completed.permits(WorkflowStep::ClientConfirmed));
        assert!(JobStatus::Cancelled.permits(WorkflowStep::ExecutionStarted));
        assert!(!JobStatus::Cancelled.permits(WorkflowStep::WorkflowFinalized));
    }

    #[test]
    fn evidence_emptiness() {
        let mut evidence = Evidence::default();
        assert!(evidence.is_empty());
        evidence.photos.push("receipt.jpg".into());
        assert!(!evidence.is_empty());
    }

    #[test]
    fn job_deserializes_with_missing_optionals() {
        let json = r#"{
            "id": "job_1",
            "title": "Package Delivery",
            "description": "Deliver package from downtown",
            "job_type": "Delivery",
            "pay": 35.0,
            "location": "Dodoma Post Office",
            "client_id": "client_david",
            "status": "ACTIVE",
            "workflow_step": "REQUEST_POSTED",
            "created_at": "2025-01-01T10:00:00Z",
            "updated_at": "2025-01-01T10:00:00Z"
        }"#;
        let job: JobRecord = serde_json::from_str(json).unwrap();
        assert_eq!(job.job_type, JobType::Delivery);
        assert!(job.applicants.is_empty());
        assert!(job.history.is_empty());
        assert!(!job.payment.processed);
        assert!(job.is_consistent());
    }

    #[test]
    fn applicant_status_defaults_to_pending() {
        let json = r#"{
            "worker_id": "worker_1",
            "worker_name": "John Mwangi",
            "applied_at": "2025-01-01T10:00:00Z"
        }"#;
        let applicant: Applicant = serde_json::from_str(json).unwrap();
        assert_eq!(applicant.status, ApplicationStatus::Pending);
    }

    #[test]
    fn rejected_applicant_is_not_open() {
        let mut job = JobRecord::new(sample_new_job(), JobStatus::Active);
        job.applicants.push(Applicant::new("worker_1", "John Mwangi"));
        assert!(job.is_open_applicant("worker_1"));
        if let Some(a) = job.applicant_mut("worker_1") {
            a.status = ApplicationStatus::Rejected;
        }
        assert!(job.has_applicant("worker_1"));
        assert!(!job.is_open_applicant("worker_1"));
        assert!(!job.is_open_applicant("worker_2"));
    }

    #[test]
    fn award_turns_down_only_pending_applicants() {
        let mut job = JobRecord::new(sample_new_job(), JobStatus::Active);
        job.applicants.push(Applicant::new("worker_1", "John Mwangi"));
        job.applicants.push(Applicant::new("worker_2", "Sarah Wanjiku"));
        let mut earlier = Applicant::new("worker_3", "Peter Kimani");
        earlier.status = ApplicationStatus::Rejected;
        job.applicants.push(earlier);

        assert_eq!(job.award("worker_1"), vec!["worker_2".to_string()]);
        let statuses: Vec<_> = job.applicants.iter().map(|a| a.status).collect();
        assert_eq!(
            statuses,
            vec![
                ApplicationStatus::Selected,
                ApplicationStatus::Rejected,
                ApplicationStatus::Rejected
            ]
        );
        assert!(job.award("worker_1").is_empty());
    }
}

mod actions;
mod engine;
pub(crate) mod job;
mod step;

pub use actions::{Rule, WorkflowAction, allowed_actions, can_advance};
pub use engine::WorkflowEngine;
pub use job::{
    Applicant, ApplicationStatus, Evidence, JobRecord, JobStatus, JobType, NewJob, PaymentInfo,
    StepEntry,
};
pub use step::{StepPosition, WorkflowStep};

//! Demo data: two open jobs with pending applications.

use crate::notify::{Notification, templates};
use crate::workflow::{Applicant, JobRecord, JobStatus, JobType, NewJob, WorkflowStep};

pub const GROCERY_JOB_ID: &str = "sample_grocery_1";
pub const DELIVERY_JOB_ID: &str = "sample_delivery_1";

fn open_job(id: &str, new: NewJob, applicants: Vec<Applicant>) -> JobRecord {
    let mut job = JobRecord::new(new, JobStatus::Active);
    job.id = id.into();
    if !applicants.is_empty() {
        job.workflow_step = WorkflowStep::OffersReceived;
    }
    job.applicants = applicants;
    job
}

pub fn sample_jobs() -> Vec<JobRecord> {
    vec![
        open_job(
            GROCERY_JOB_ID,
            NewJob {
                title: "Grocery Shopping".into(),
                description: "Buy groceries from the local market".into(),
                job_type: JobType::Shopping,
                pay: 25.0,
                location: "Dodoma Central Market".into(),
                client_id: "client_mary_johnson".into(),
            },
            vec![
                Applicant::new("worker_1", "John Mwangi"),
                Applicant::new("worker_2", "Sarah Wanjiku"),
            ],
        ),
        open_job(
            DELIVERY_JOB_ID,
            NewJob {
                title: "Package Delivery".into(),
                description: "Deliver package from downtown".into(),
                job_type: JobType::Delivery,
                pay: 35.0,
                location: "Dodoma Post Office".into(),
                client_id: "client_david_wilson".into(),
            },
            vec![Applicant::new("worker_3", "Peter Kimani")],
        ),
    ]
}

/// One application notice per applicant of [`sample_jobs`].
pub fn sample_notifications(jobs: &[JobRecord]) -> Vec<Notification> {
    jobs.iter()
        .flat_map(|job| {
            job.applicants.iter().map(move |a| {
                templates::job_application(job, &a.worker_id, &a.worker_name).into_notification()
            })
        })
        .collect()
}

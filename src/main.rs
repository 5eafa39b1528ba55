mod cli;
mod ui;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Command};
use tokio::time::sleep;

use jobflow::app::{Services, duplicate_ids, load_jobs};
use jobflow::config::EngineConfig;
use jobflow::error::EngineResult;
use jobflow::logging;
use jobflow::seed;
use jobflow::workflow::{Evidence, JobRecord, JobType, NewJob, WorkflowStep};
use ui::WorkflowProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };
    let filter = if cli.verbose { "debug" } else { config.log_filter.as_str() };
    logging::init(filter)?;

    match cli.command {
        Command::Demo => run_demo(&config).await,
        Command::Steps { at } => {
            let current = at
                .map(|i| {
                    WorkflowStep::from_index(i)
                        .ok_or_else(|| anyhow!("step index {i} is out of range 0..=11"))
                })
                .transpose()?;
            ui::print_steps(current);
            Ok(())
        }
        Command::Summary { file } => run_summary(&config, &file).await,
    }
}

async fn run_demo(config: &EngineConfig) -> Result<()> {
    let services = Services::new(config);
    let engine = &services.engine;

    let job = if config.sample_data {
        services.seed().await;
        services.query.job(seed::GROCERY_JOB_ID).await?
    } else {
        let job = engine
            .post_job(NewJob {
                title: "Grocery Shopping".into(),
                description: "Buy groceries from the local market".into(),
                job_type: JobType::Shopping,
                pay: 25.0,
                location: "Dodoma Central Market".into(),
                client_id: "client_mary_johnson".into(),
            })
            .await;
        engine.apply_for_job(&job.id, "worker_1", "John Mwangi").await?;
        engine.apply_for_job(&job.id, "worker_2", "Sarah Wanjiku").await?
    };
    let id = job.id.clone();
    let worker = "worker_1";

    let progress = WorkflowProgress::start(&job)?;
    let pace = Duration::from_millis(150);

    let mut current = job;
    macro_rules! step {
        ($op:literal, $call:expr) => {{
            let result = $call.await;
            if let Some(job) = record(&progress, $op, result) {
                current = job;
            }
            sleep(pace).await;
        }};
    }

    step!("select_contractor", engine.select_contractor(&id, worker));
    step!("accept_job", engine.accept_job(&current, worker));
    step!("start_execution", engine.start_execution(&id));
    step!("mark_execution_in_progress", engine.mark_execution_in_progress(&id));
    step!(
        "upload_evidence",
        engine.upload_evidence(
            &id,
            Evidence {
                photos: vec!["groceries.jpg".into()],
                messages: vec!["Left with the neighbour".into()],
                ..Evidence::default()
            },
        )
    );
    step!("submit_completion", engine.submit_completion(&id));
    step!("request_changes", engine.request_changes(&id));
    step!("process_client_confirmed", engine.process_client_confirmed(&id));
    step!("process_payment", engine.process_payment(&id));
    step!(
        "upload_payment_proof",
        engine.upload_payment_proof(&id, vec!["mpesa-receipt.pdf".into()])
    );
    step!(
        "process_contractor_receipt_confirmed",
        engine.process_contractor_receipt_confirmed(&id)
    );
    step!(
        "process_contractor_receipt_confirmed",
        engine.process_contractor_receipt_confirmed(&id)
    );
    step!("process_workflow_finalized", engine.process_workflow_finalized(&id));

    progress.finish(&current);

    for recipient in [current.client_id.as_str(), "worker_1", "worker_2"] {
        let notes = services.query.list_notifications_by_recipient(recipient).await;
        let unread = services.query.unread_count(recipient).await;
        ui::print_inbox(recipient, &notes, unread);
    }
    Ok(())
}

fn record(
    progress: &WorkflowProgress,
    operation: &str,
    result: EngineResult<JobRecord>,
) -> Option<JobRecord> {
    match result {
        Ok(job) => {
            progress.applied(operation, &job);
            Some(job)
        }
        Err(err) => {
            progress.rejected(&err);
            None
        }
    }
}

async fn run_summary(config: &EngineConfig, file: &Path) -> Result<()> {
    let records = load_jobs(file).with_context(|| format!("loading {}", file.display()))?;
    tracing::info!(count = records.len(), file = %file.display(), "Jobs loaded");

    let duplicates = duplicate_ids(&records);
    if !duplicates.is_empty() {
        tracing::warn!(ids = duplicates.len(), "Duplicate job ids, keeping the last record of each");
    }

    let services = Services::new(config);
    services.jobs.load(records).await;

    let counts = services.query.status_counts().await;
    let inconsistent: Vec<JobRecord> = services
        .jobs
        .snapshot()
        .await
        .iter()
        .filter(|j| !j.is_consistent())
        .cloned()
        .collect();
    ui::print_summary(&counts, &inconsistent, &duplicates);
    Ok(())
}

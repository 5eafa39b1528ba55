use std::sync::Arc;

use crate::error::EngineResult;
use crate::workflow::JobRecord;

use super::snapshot::{Record, Repository, Snapshot, Subscription};

/// Store name used in logs and `NotFound` errors.
pub const JOB_STORE: &str = "job";

impl Record for JobRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Canonical owner of every [`JobRecord`].
///
/// Shared as `Arc<JobStore>` between the workflow engine, the query facade
/// and any subscriber that renders job lists.
pub struct JobStore {
    repo: Repository<JobRecord>,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            repo: Repository::new(JOB_STORE, capacity),
        }
    }

    pub async fn get(&self, id: &str) -> EngineResult<JobRecord> {
        Ok(self.repo.get(id).await?)
    }

    pub async fn upsert(&self, job: JobRecord) -> u64 {
        self.repo.upsert(job).await
    }

    /// Load several records as a single published version.
    pub async fn load(&self, jobs: Vec<JobRecord>) -> u64 {
        self.repo.upsert_all(jobs).await
    }

    pub async fn snapshot(&self) -> Arc<Snapshot<JobRecord>> {
        self.repo.snapshot().await
    }

    pub async fn subscribe(&self) -> Subscription<JobRecord> {
        self.repo.subscribe().await
    }

    /// Atomic read-validate-write of one job. See [`Repository::modify`].
    pub(crate) async fn modify<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut JobRecord) -> EngineResult<T>,
    ) -> EngineResult<(JobRecord, T)> {
        self.repo.modify(id, f).await
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(super::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::workflow::{JobStatus, WorkflowStep, job::sample_new_job};

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let store = JobStore::default();
        let err = store.get("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.job_id(), Some("missing"));
    }

    #[tokio::test]
    async fn upsert_then_get() {
        let store = JobStore::default();
        let job = JobRecord::new(sample_new_job(), JobStatus::Active);
        store.upsert(job.clone()).await;
        assert_eq!(store.get(&job.id).await.unwrap(), job);
    }

    #[tokio::test]
    async fn load_publishes_one_version() {
        let store = JobStore::default();
        let mut sub = store.subscribe().await;
        sub.next().await.unwrap();

        let jobs = vec![
            JobRecord::new(sample_new_job(), JobStatus::Active),
            JobRecord::new(sample_new_job(), JobStatus::Draft),
        ];
        assert_eq!(store.load(jobs).await, 1);
        let snap = sub.next().await.unwrap();
        assert_eq!(snap.len(), 2);
    }

    /// One writer, 100 concurrent readers: every reader sees a strictly
    /// increasing run of versions that ends on the writer's final state.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_observe_writer_order() {
        const READERS: usize = 100;
        const WRITES: u64 = 50;

        let store = Arc::new(JobStore::new(64));
        let mut job = JobRecord::new(sample_new_job(), JobStatus::InProgress);
        job.workflow_step = WorkflowStep::ContractSelected;
        store.upsert(job.clone()).await;
        let id = job.id.clone();

        let mut readers = Vec::with_capacity(READERS);
        for _ in 0..READERS {
            let mut sub = store.subscribe().await;
            let id = id.clone();
            readers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(snap) = sub.next().await {
                    let record = snap.get(&id).cloned();
                    seen.push((snap.version(), record));
                    if snap.version() == WRITES + 1 {
                        break;
                    }
                }
                seen
            }));
        }

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for n in 0..WRITES {
                    job.pay = n as f64;
                    store.upsert(job.clone()).await;
                    tokio::task::yield_now().await;
                }
            })
        };
        writer.await.unwrap();

        for reader in readers {
            let seen = reader.await.unwrap();
            assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
            for (version, record) in &seen {
                let record = record.as_ref().unwrap();
                // Version v (v >= 2) carries the pay written by upsert v - 2.
                if *version >= 2 {
                    assert_eq!(record.pay, (*version - 2) as f64);
                }
            }
            let (last_version, last) = seen.last().unwrap();
            assert_eq!(*last_version, WRITES + 1);
            assert_eq!(last.as_ref().unwrap().pay, (WRITES - 1) as f64);
        }
    }
}

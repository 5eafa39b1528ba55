mod jobs;
mod snapshot;

pub use jobs::{JOB_STORE, JobStore};
pub use snapshot::{DEFAULT_CAPACITY, Missing, Record, Repository, Snapshot, Subscription};

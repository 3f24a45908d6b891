//! Two-level admission control.
//!
//! The job gate rejects instead of queueing; the subsection gate is shared by
//! every running job and waits.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::config::Config;
use crate::error::SubsectionError;

/// Held for the lifetime of one admitted job
#[derive(Debug)]
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug)]
pub struct ConcurrencyGovernor {
    jobs: Arc<Semaphore>,
    job_capacity: usize,
    subsections: Arc<Semaphore>,
    subsection_capacity: usize,
}

impl ConcurrencyGovernor {
    pub fn new(job_capacity: usize, subsection_capacity: usize) -> Self {
        Self {
            jobs: Arc::new(Semaphore::new(job_capacity)),
            job_capacity,
            subsections: Arc::new(Semaphore::new(subsection_capacity)),
            subsection_capacity,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_concurrent_jobs, config.max_concurrent_subsections)
    }

    /// Admits a job if the job gate has room, without waiting
    pub fn try_admit_job(&self) -> Option<JobPermit> {
        match self.jobs.clone().try_acquire_owned() {
            Ok(permit) => Some(JobPermit { _permit: permit }),
            Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => None,
        }
    }

    /// Waits for a subsection slot shared across all jobs
    pub async fn acquire_subsection(&self) -> Result<OwnedSemaphorePermit, SubsectionError> {
        self.subsections
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SubsectionError::GateClosed)
    }

    pub fn jobs_in_use(&self) -> usize {
        self.job_capacity - self.jobs.available_permits()
    }

    pub fn subsections_in_use(&self) -> usize {
        self.subsection_capacity - self.subsections.available_permits()
    }

    pub fn job_capacity(&self) -> usize {
        self.job_capacity
    }

    pub fn subsection_capacity(&self) -> usize {
        self.subsection_capacity
    }
}

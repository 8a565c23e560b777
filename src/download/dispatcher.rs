//! Bounded-concurrency execution of download jobs
//!
//! The dispatcher admits at most N jobs at a time through a semaphore. A
//! caller of [`DownloadDispatcher::dispatch`] waits while all slots are
//! taken; there is no queue beyond the running jobs. Finished jobs are sent
//! to a [`Completions`] receiver in the order they complete.

use super::Download;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Bounded worker pool for [`Download`] jobs
pub struct DownloadDispatcher {
    max: usize,
    slots: Arc<Semaphore>,
    next_id: u64,
    tasks: JoinSet<()>,
    completed: mpsc::UnboundedSender<Download>,
}

/// Receiving side of a dispatcher's completion queue
pub struct Completions {
    rx: mpsc::UnboundedReceiver<Download>,
}

impl DownloadDispatcher {
    /// Creates a dispatcher running at most `max` jobs concurrently
    ///
    /// A `max` of 0 is treated as 1.
    pub fn new(max: usize) -> (Self, Completions) {
        let max = max.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            max,
            slots: Arc::new(Semaphore::new(max)),
            next_id: 0,
            tasks: JoinSet::new(),
            completed: tx,
        };
        (dispatcher, Completions { rx })
    }

    /// Admits `job` once a slot is free and starts it in the background
    ///
    /// Returns the job's id as soon as it is running. Ids start at 1 and
    /// increase with every dispatch, independent of completion order.
    pub async fn dispatch(&mut self, mut job: Download) -> u64 {
        // The semaphore is never closed, so acquiring only waits for a slot
        let permit = self.slots.clone().acquire_owned().await.ok();

        self.next_id += 1;
        let id = self.next_id;
        job.assign_id(id);
        tracing::debug!("Dispatching download {}: {}", id, job.addr);

        let completed = self.completed.clone();
        self.tasks.spawn(async move {
            if let Err(e) = job.execute().await {
                job.set_error(e);
            }
            let _ = completed.send(job);
            drop(permit);
        });
        id
    }

    /// Number of jobs currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.max - self.slots.available_permits()
    }

    /// Maximum number of concurrently running jobs
    pub fn max_jobs(&self) -> usize {
        self.max
    }

    /// Number of jobs dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.next_id
    }

    /// Waits for all running jobs, then closes the completion queue
    pub async fn close(mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!("Download task failed: {}", e);
            }
        }
        tracing::debug!("Dispatcher closed after {} downloads", self.next_id);
    }
}

impl Completions {
    /// Yields the next completed job
    ///
    /// Returns `None` once the dispatcher has been closed and every
    /// completed job has been collected.
    pub async fn collect(&mut self) -> Option<Download> {
        self.rx.recv().await
    }

    /// Returns the jobs that have completed so far without waiting
    pub fn collect_ready(&mut self) -> Vec<Download> {
        let mut ready = Vec::new();
        while let Ok(job) = self.rx.try_recv() {
            ready.push(job);
        }
        ready
    }

    /// Collects every remaining job until the queue is closed
    pub async fn collect_all(mut self) -> Vec<Download> {
        let mut all = Vec::new();
        while let Some(job) = self.collect().await {
            all.push(job);
        }
        all
    }
}

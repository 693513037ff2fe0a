//! Bounded FIFO print queue
//!
//! [`PrintQueue`] is the cheap, cloneable producer handle; [`JobReceiver`] is
//! owned by the single print worker. `submit` never blocks and never touches
//! the printer.

use super::job::{JobStatus, PrintJob};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Producer handle
#[derive(Clone)]
pub struct PrintQueue {
    tx: mpsc::Sender<PrintJob>,
    processing: Arc<AtomicBool>,
}

/// Consumer side, held by the worker
pub struct JobReceiver {
    rx: mpsc::Receiver<PrintJob>,
    processing: Arc<AtomicBool>,
}

/// Create a queue holding at most `capacity` pending jobs
pub fn channel(capacity: usize) -> (PrintQueue, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let processing = Arc::new(AtomicBool::new(false));
    (
        PrintQueue {
            tx,
            processing: processing.clone(),
        },
        JobReceiver { rx, processing },
    )
}

impl PrintQueue {
    /// Enqueue a job without waiting
    ///
    /// Returns `false` when the queue is full or the worker has stopped.
    pub fn submit(&self, mut job: PrintJob) -> bool {
        job.status = JobStatus::Queued;
        let job_name = job.job_name.clone();
        let source = job.source;

        match self.tx.try_send(job) {
            Ok(()) => {
                tracing::info!(job_name = %job_name, source = %source, pending = self.pending(), "Print job queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(job_name = %job_name, source = %source, "Print queue full, job dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!(job_name = %job_name, source = %source, "Print worker stopped, job dropped");
                false
            }
        }
    }

    /// Whether the worker is currently handling a job
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Jobs waiting in the queue (excluding the one being printed)
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl JobReceiver {
    /// Wait for the next job; `None` once every producer is gone
    pub async fn recv(&mut self) -> Option<PrintJob> {
        self.rx.recv().await
    }

    /// Mark the worker busy until the guard is dropped
    pub fn begin(&self) -> ProcessingGuard {
        self.processing.store(true, Ordering::SeqCst);
        ProcessingGuard {
            processing: self.processing.clone(),
        }
    }

    /// Refuse further submissions and report how many jobs were still queued
    pub fn close(&mut self) -> usize {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// Clears the processing flag on drop, including during unwinding
pub struct ProcessingGuard {
    processing: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.processing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_respects_capacity() {
        let (queue, _rx) = channel(2);
        assert!(queue.submit(PrintJob::briefing("a")));
        assert!(queue.submit(PrintJob::briefing("b")));
        assert_eq!(queue.pending(), 2);
        assert!(!queue.submit(PrintJob::briefing("c")));
    }

    #[test]
    fn test_submit_after_worker_gone() {
        let (queue, rx) = channel(2);
        drop(rx);
        assert!(!queue.submit(PrintJob::briefing("a")));
    }

    #[tokio::test]
    async fn test_fifo_and_processing_flag() {
        let (queue, mut rx) = channel(4);
        queue.submit(PrintJob::briefing("first"));
        queue.submit(PrintJob::reprint("second"));

        assert_eq!(rx.recv().await.unwrap().content, "first");
        {
            let _guard = rx.begin();
            assert!(queue.is_processing());
        }
        assert!(!queue.is_processing());
        assert_eq!(rx.recv().await.unwrap().content, "second");
    }

    #[test]
    fn test_close_counts_dropped_jobs() {
        let (queue, mut rx) = channel(4);
        queue.submit(PrintJob::briefing("a"));
        queue.submit(PrintJob::briefing("b"));
        assert_eq!(rx.close(), 2);
        assert!(!queue.submit(PrintJob::briefing("c")));
    }
}

//! FIFO job queue.
//!
//! Ordering guarantees:
//! - First queued, first executed.
//! - Jobs enqueued during a drain are appended and run in the same drain.
//!
//! There is no priority and no cancellation. Each job carries a sequence
//! number from a shared [`JobSequencer`], so multiple queues fed by the same
//! sequencer have a global order.

use eddy_core::Job;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shared sequencer stamping jobs with a monotonically increasing number.
#[derive(Clone, Default)]
pub struct JobSequencer {
    counter: Arc<AtomicU64>,
}

impl JobSequencer {
    /// Create a fresh sequencer starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next sequence number.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// A FIFO queue of [`Job`]s.
pub struct JobQueue {
    queue: Mutex<VecDeque<(u64, Job)>>,
    len: AtomicUsize,
    sequencer: JobSequencer,
}

impl JobQueue {
    /// Create a new empty queue with its own sequencer.
    pub fn new() -> Self {
        Self::with_sequencer(JobSequencer::new())
    }

    /// Create a new queue sharing `sequencer` with other queues.
    pub fn with_sequencer(sequencer: JobSequencer) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            len: AtomicUsize::new(0),
            sequencer,
        }
    }

    /// Append a job.
    pub fn enqueue(&self, job: Job) {
        let seq = self.sequencer.next();
        self.queue.lock().push_back((seq, job));
        self.len.fetch_add(1, Ordering::Relaxed);
    }

    /// Take the next job.
    pub fn dequeue(&self) -> Option<Job> {
        let job = self.queue.lock().pop_front().map(|(_, job)| job);
        if job.is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
        job
    }

    /// Peek the next job's sequence number.
    pub fn peek_seq(&self) -> Option<u64> {
        self.queue.lock().front().map(|(seq, _)| *seq)
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all pending jobs.
    pub fn clear(&self) {
        let mut queue = self.queue.lock();
        let len = queue.len();
        queue.clear();
        self.len.fetch_sub(len, Ordering::Relaxed);
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

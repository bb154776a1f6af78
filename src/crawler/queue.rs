//! Work queue for crawl requests
//!
//! This module handles:
//! - Admission of new requests through the visited set (one request per URL)
//! - FIFO hand-out of pending requests to concurrent workers
//! - Tracking of requests that are dequeued but not yet finished
//! - Waking idle workers when work arrives or the crawl drains

use crate::crawler::request::RequestDescriptor;
use crate::crawler::visited::VisitedSet;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Failures of the queue structure itself; these end the crawl
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("request backlog is full ({capacity} pending)")]
    Full { capacity: usize },

    #[error("work queue is closed")]
    Closed,

    #[error("work queue state is poisoned")]
    Poisoned,
}

/// Outcome of submitting a batch of requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Admission {
    /// Requests appended to the backlog
    pub admitted: usize,

    /// Requests dropped because their URL was already admitted
    pub duplicates: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<RequestDescriptor>,
    in_flight: usize,
    closed: bool,
}

/// Shared backlog of pending requests
///
/// Many handlers may enqueue while many workers dequeue. A request handed
/// out by the queue is tracked as in flight until its [`Lease`] is dropped,
/// so the queue only reports itself drained once no worker can still add
/// work.
#[derive(Debug)]
pub struct WorkQueue {
    visited: VisitedSet,
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl WorkQueue {
    /// Creates an empty queue holding at most `capacity` pending requests
    pub fn new(capacity: usize) -> Self {
        Self {
            visited: VisitedSet::new(),
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            capacity,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, QueueError> {
        self.state.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Submits a batch of requests
    ///
    /// Each request is admitted only if its URL has not been admitted
    /// before; admitted requests keep their batch order. Running out of
    /// capacity is an error and leaves the rest of the batch unprocessed.
    pub fn enqueue(&self, descriptors: Vec<RequestDescriptor>) -> Result<Admission, QueueError> {
        let mut admission = Admission::default();

        let result = {
            let mut state = self.lock()?;
            if state.closed {
                return Err(QueueError::Closed);
            }

            let mut result = Ok(());
            for descriptor in descriptors {
                if !self.visited.try_admit(&descriptor.url) {
                    admission.duplicates += 1;
                    continue;
                }

                if state.pending.len() >= self.capacity {
                    result = Err(QueueError::Full {
                        capacity: self.capacity,
                    });
                    break;
                }

                tracing::debug!("Queueing {} request: {}", descriptor.label, descriptor.url);
                state.pending.push_back(descriptor);
                admission.admitted += 1;
            }
            result
        };

        if admission.admitted > 0 {
            self.notify.notify_waiters();
        }

        result.map(|()| admission)
    }

    /// Takes the next pending request without waiting
    ///
    /// Returns `Ok(None)` when nothing is pending right now, even if more
    /// work may still arrive from requests in flight.
    pub fn dequeue(&self) -> Result<Option<Lease<'_>>, QueueError> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(QueueError::Closed);
        }

        Ok(self.take(&mut state))
    }

    /// Waits for the next pending request
    ///
    /// Suspends while the backlog is empty but requests are still in
    /// flight. Returns `Ok(None)` once the queue is drained or closed, or
    /// when `token` is cancelled.
    pub async fn next(&self, token: &CancellationToken) -> Result<Option<Lease<'_>>, QueueError> {
        loop {
            if token.is_cancelled() {
                return Ok(None);
            }

            // Register for wake-ups before inspecting the state so a
            // notification between the check and the wait is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock()?;
                if state.closed {
                    return Ok(None);
                }
                if let Some(lease) = self.take(&mut state) {
                    return Ok(Some(lease));
                }
                if state.in_flight == 0 {
                    return Ok(None);
                }
            }

            tokio::select! {
                _ = token.cancelled() => return Ok(None),
                _ = &mut notified => {}
            }
        }
    }

    fn take(&self, state: &mut QueueState) -> Option<Lease<'_>> {
        let request = state.pending.pop_front()?;
        state.in_flight += 1;
        tracing::trace!("Dequeued {} request: {}", request.label, request.url);
        Some(Lease {
            queue: self,
            request,
        })
    }

    fn settle(&self) {
        // Settling must happen even after a panic elsewhere, or waiting
        // workers would never see the queue drain.
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
        let drained = state.pending.is_empty() && state.in_flight == 0;
        drop(state);

        if drained {
            self.notify.notify_waiters();
        }
    }

    /// True when nothing is pending and no request is in flight
    pub fn is_drained(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending.is_empty() && state.in_flight == 0
    }

    /// Stops the queue; returns the number of pending requests abandoned
    ///
    /// Requests already in flight finish normally. Later calls to
    /// [`WorkQueue::enqueue`] and [`WorkQueue::dequeue`] fail with
    /// [`QueueError::Closed`].
    pub fn close(&self) -> usize {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        let abandoned = state.pending.len();
        state.pending.clear();
        drop(state);

        self.notify.notify_waiters();
        abandoned
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of requests handed out and not yet settled
    pub fn in_flight(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
    }

    /// The set of URLs admitted so far
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }
}

/// A request handed to a worker
///
/// Dropping the lease marks the request as settled.
#[derive(Debug)]
pub struct Lease<'a> {
    queue: &'a WorkQueue,
    request: RequestDescriptor,
}

impl Lease<'_> {
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.queue.settle();
    }
}

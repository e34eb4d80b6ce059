//! Serialized highlight request queue
//!
//! The queue is the engine's sole serialization point: at most one request
//! is in flight against the rendering surface at a time, and a settle delay
//! separates consecutive requests so clear/paint pairs never interleave or
//! flicker. Requests whose page layout has not materialized are requeued at
//! the front with a bounded, increasing backoff.

use crate::backoff::RetryBackoff;
use crate::request::{HighlightRequest, RequestId};
use log::debug;
use std::collections::VecDeque;

/// Queue tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueConfig {
    /// Quiet period between two processed requests, in milliseconds,
    /// letting the rendering surface settle before the next paint
    pub settle_delay_ms: u64,

    /// Retry policy for requests suspended on an unavailable layout
    pub retry: RetryBackoff,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 80,
            retry: RetryBackoff::default(),
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Requests submitted over the queue's lifetime
    pub submitted: u64,

    /// Requests that completed and were applied
    pub applied: u64,

    /// Requests that completed without being applied
    pub failed: u64,

    /// Retry round-trips for suspended requests
    pub retried: u64,
}

#[derive(Debug)]
struct QueuedEntry {
    request: HighlightRequest,
    attempt: u32,
    not_before_ms: u64,
}

/// FIFO request queue with single-flight processing
///
/// Callers drive the queue cooperatively: `submit` enqueues, `next_ready`
/// hands out the front request when the queue is idle and settled, and
/// `complete`/`retry` close out the in-flight request. The queue holds no
/// threads and never blocks.
#[derive(Debug)]
pub struct RequestQueue {
    config: QueueConfig,
    entries: VecDeque<QueuedEntry>,
    in_flight: Option<RequestId>,
    settle_until_ms: u64,
    stats: QueueStats,
}

impl RequestQueue {
    /// Create a queue with default tuning
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Create a queue with explicit tuning
    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            config,
            entries: VecDeque::new(),
            in_flight: None,
            settle_until_ms: 0,
            stats: QueueStats::default(),
        }
    }

    /// Enqueue a request, returning its id
    pub fn submit(&mut self, request: HighlightRequest) -> RequestId {
        let id = request.id;
        self.stats.submitted += 1;
        self.entries.push_back(QueuedEntry {
            request,
            attempt: 0,
            not_before_ms: 0,
        });
        id
    }

    /// Hand out the next request when the queue is idle and settled
    ///
    /// Returns the request together with its attempt count (0 on first
    /// processing). The request is marked in flight until `complete` or
    /// `retry` is called for it; serialization depends on callers closing
    /// out every request they take.
    pub fn next_ready(&mut self, now_ms: u64) -> Option<(HighlightRequest, u32)> {
        if self.in_flight.is_some() || now_ms < self.settle_until_ms {
            return None;
        }
        let front = self.entries.front()?;
        if now_ms < front.not_before_ms {
            return None;
        }
        let entry = self.entries.pop_front()?;
        self.in_flight = Some(entry.request.id);
        Some((entry.request, entry.attempt))
    }

    /// Close out the in-flight request
    ///
    /// Starts the settle period so the surface quiesces before the next
    /// paint. `applied` selects which statistic the completion lands in.
    pub fn complete(&mut self, id: RequestId, now_ms: u64, applied: bool) {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
        self.settle_until_ms = now_ms + self.config.settle_delay_ms;
        if applied {
            self.stats.applied += 1;
        } else {
            self.stats.failed += 1;
        }
    }

    /// Requeue a suspended request with backoff
    ///
    /// Returns `false` when the retry budget is exhausted; the caller then
    /// fails the request with an empty result. Retried requests go back to
    /// the front of the queue so serialization order is preserved.
    pub fn retry(&mut self, request: HighlightRequest, attempt: u32, now_ms: u64) -> bool {
        if self.in_flight == Some(request.id) {
            self.in_flight = None;
        }
        self.settle_until_ms = now_ms + self.config.settle_delay_ms;

        let next_attempt = attempt + 1;
        if self.config.retry.exhausted(next_attempt) {
            debug!(
                "request {} exhausted {} retries",
                request.id, self.config.retry.max_attempts
            );
            self.stats.failed += 1;
            return false;
        }

        let delay = self.config.retry.delay_for(next_attempt);
        debug!(
            "request {} suspended, retry {} in {}ms",
            request.id, next_attempt, delay
        );
        self.stats.retried += 1;
        self.entries.push_front(QueuedEntry {
            request,
            attempt: next_attempt,
            not_before_ms: now_ms + delay,
        });
        true
    }

    /// Check whether a request is currently in flight
    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of queued (not in-flight) requests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the queue holds no requests
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all queued requests
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the queue statistics
    pub fn stats(&self) -> QueueStats {
        self.stats
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{PhraseSpec, RequestMode};

    fn request(now: u64) -> HighlightRequest {
        HighlightRequest::baseline(vec![PhraseSpec::new("term")], RequestMode::Replace, now)
    }

    #[test]
    fn test_single_flight_serialization() {
        let mut queue = RequestQueue::new();
        queue.submit(request(0));
        queue.submit(request(0));

        let (first, attempt) = queue.next_ready(0).unwrap();
        assert_eq!(attempt, 0);
        assert!(queue.is_processing());

        // Nothing else is handed out while the first is in flight.
        assert!(queue.next_ready(0).is_none());

        queue.complete(first.id, 100, true);
        assert!(!queue.is_processing());
    }

    #[test]
    fn test_settle_delay_between_requests() {
        let mut queue = RequestQueue::with_config(QueueConfig {
            settle_delay_ms: 80,
            retry: RetryBackoff::default(),
        });
        queue.submit(request(0));
        queue.submit(request(0));

        let (first, _) = queue.next_ready(0).unwrap();
        queue.complete(first.id, 100, true);

        // Still settling at +50ms, ready at +80ms.
        assert!(queue.next_ready(150).is_none());
        assert!(queue.next_ready(180).is_some());
    }

    #[test]
    fn test_retry_backoff_and_order() {
        let mut queue = RequestQueue::with_config(QueueConfig {
            settle_delay_ms: 0,
            retry: RetryBackoff::new(100, 3),
        });
        queue.submit(request(0));
        queue.submit(request(0));

        let (first, attempt) = queue.next_ready(0).unwrap();
        let first_id = first.id;
        assert!(queue.retry(first, attempt, 0));

        // The retried request blocks the queue until its backoff elapses,
        // preserving serialization order.
        assert!(queue.next_ready(50).is_none());
        let (again, attempt) = queue.next_ready(100).unwrap();
        assert_eq!(again.id, first_id);
        assert_eq!(attempt, 1);
    }

    #[test]
    fn test_retry_exhaustion() {
        let mut queue = RequestQueue::with_config(QueueConfig {
            settle_delay_ms: 0,
            retry: RetryBackoff::new(10, 2),
        });
        queue.submit(request(0));

        let (req, attempt) = queue.next_ready(0).unwrap();
        assert!(queue.retry(req, attempt, 0));

        let (req, attempt) = queue.next_ready(10).unwrap();
        assert_eq!(attempt, 1);
        assert!(!queue.retry(req, attempt, 10));
        assert!(queue.is_empty());
        assert_eq!(queue.stats().failed, 1);
    }

    #[test]
    fn test_stats_track_lifecycle() {
        let mut queue = RequestQueue::with_config(QueueConfig {
            settle_delay_ms: 0,
            retry: RetryBackoff::default(),
        });
        queue.submit(request(0));
        queue.submit(request(0));

        let (a, _) = queue.next_ready(0).unwrap();
        queue.complete(a.id, 0, true);
        let (b, _) = queue.next_ready(0).unwrap();
        queue.complete(b.id, 0, false);

        let stats = queue.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.failed, 1);
    }
}

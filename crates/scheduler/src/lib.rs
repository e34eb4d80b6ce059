//! Docent request scheduler
//!
//! Serialized highlight request queue with settle delay and bounded retry.
//!
//! This crate owns the highlight request model and the FIFO queue that
//! guarantees at most one request is in flight against the rendering surface
//! at a time. Serialization, not prioritization, is the invariant: clear
//! and paint operations from different requests must never interleave, and a
//! short settle delay separates consecutive requests so the surface
//! quiesces between paints.
//!
//! # Example
//!
//! ```
//! use docent_scheduler::{HighlightRequest, PhraseSpec, RequestMode, RequestQueue};
//!
//! let mut queue = RequestQueue::new();
//! let request = HighlightRequest::baseline(
//!     vec![PhraseSpec::new("transformer")],
//!     RequestMode::Replace,
//!     0,
//! );
//! let id = queue.submit(request);
//!
//! // Process the next ready request.
//! if let Some((request, _attempt)) = queue.next_ready(0) {
//!     // ... classify, match, paint ...
//!     queue.complete(request.id, 0, true);
//! }
//! # let _ = id;
//! ```

mod backoff;
mod queue;
mod request;

// Re-export public API
pub use backoff::RetryBackoff;
pub use queue::{QueueConfig, QueueStats, RequestQueue};
pub use request::{
    CircleTarget, HighlightCategory, HighlightRequest, PhraseSpec, RequestId, RequestMode,
    RequestState,
};

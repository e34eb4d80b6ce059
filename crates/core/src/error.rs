//! Engine error taxonomy
//!
//! Nothing here is fatal to the host session. A phrase that cannot be found
//! is an empty result, not an error; an unavailable layout is retried; a
//! region that defeats every detection strategy degrades to an anchor-only
//! box or `None`. Errors exist so the queue can decide between retrying and
//! failing a request with an empty completion.

/// Errors surfaced while processing an annotation request
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The page has not been materialized by the rendering surface yet.
    /// Retried with bounded attempts and increasing backoff.
    #[error("layout for page {0} is not available yet")]
    LayoutUnavailable(u16),

    /// Every detection strategy failed for the labeled region
    #[error("no region detected for \"{0}\"")]
    RegionNotDetected(String),

    /// The request was rejected before queueing
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

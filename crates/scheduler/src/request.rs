//! Highlight request model
//!
//! Requests are created by external callers (the tutoring agent, the UI),
//! consumed by the queue, and discarded after processing. The request owns
//! everything the processor needs: the phrases to locate, the category that
//! decides how keyword layers are mutated, and an optional circle target.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a highlight request
pub type RequestId = Uuid;

/// How a request interacts with the keyword layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightCategory {
    /// Topic-level keywords; `Replace` mode swaps the baseline layer wholesale
    Baseline,

    /// Quoted excerpts; appended to a capped, deduplicated layer
    Quote,

    /// Speech-synchronized phrases; admitted through the pacing gate into a
    /// sliding window
    Semantic,

    /// Circle a labeled region (table, figure, section) instead of
    /// highlighting text
    Circle,
}

/// Whether a request replaces existing layer state or merges into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestMode {
    Replace,
    Merge,
}

/// Lifecycle state of a request inside the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Queued,
    Processing,
    Applied,
    Failed,
}

/// A phrase to locate on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseSpec {
    /// The phrase text as supplied by the caller
    pub text: String,

    /// Honor letter case during matching; default is case-insensitive
    pub case_sensitive: bool,
}

impl PhraseSpec {
    /// Create a case-insensitive phrase spec
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_sensitive: false,
        }
    }

    /// Create a case-sensitive phrase spec
    pub fn case_sensitive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_sensitive: true,
        }
    }
}

/// Target of a `Circle` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircleTarget {
    /// A printed label such as "Table 3" or "Figure 1", located by search
    Label(String),

    /// A section title anchored to a known page
    Section { title: String, page_index: u16 },
}

/// An annotation request submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRequest {
    /// Stable identifier, reported back with the completion
    pub id: RequestId,

    /// Phrases to locate and highlight
    pub keywords: Vec<PhraseSpec>,

    /// Layer classification
    pub category: HighlightCategory,

    /// Replace or merge semantics
    pub mode: RequestMode,

    /// Page the caller believes the content is on, when known
    pub page_hint: Option<u16>,

    /// Region to circle; present only for `Circle` requests
    pub circle_target: Option<CircleTarget>,

    /// Submission timestamp on the host clock, milliseconds
    pub created_at_ms: u64,
}

impl HighlightRequest {
    /// Create a baseline request
    pub fn baseline(keywords: Vec<PhraseSpec>, mode: RequestMode, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            keywords,
            category: HighlightCategory::Baseline,
            mode,
            page_hint: None,
            circle_target: None,
            created_at_ms: now_ms,
        }
    }

    /// Create a quote request; quotes always merge
    pub fn quote(keywords: Vec<PhraseSpec>, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            keywords,
            category: HighlightCategory::Quote,
            mode: RequestMode::Merge,
            page_hint: None,
            circle_target: None,
            created_at_ms: now_ms,
        }
    }

    /// Create a semantic request for a single paced phrase
    pub fn semantic(phrase: PhraseSpec, page_hint: Option<u16>, now_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            keywords: vec![phrase],
            category: HighlightCategory::Semantic,
            mode: RequestMode::Merge,
            page_hint,
            circle_target: None,
            created_at_ms: now_ms,
        }
    }

    /// Create a request to circle a printed label
    pub fn circle_label(label: impl Into<String>, now_ms: u64) -> Self {
        let label = label.into();
        Self {
            id: Uuid::new_v4(),
            keywords: vec![PhraseSpec::new(label.clone())],
            category: HighlightCategory::Circle,
            mode: RequestMode::Merge,
            page_hint: None,
            circle_target: Some(CircleTarget::Label(label)),
            created_at_ms: now_ms,
        }
    }

    /// Create a request to circle a section heading on a known page
    pub fn circle_section(title: impl Into<String>, page_index: u16, now_ms: u64) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4(),
            keywords: vec![PhraseSpec::new(title.clone())],
            category: HighlightCategory::Circle,
            mode: RequestMode::Merge,
            page_hint: Some(page_index),
            circle_target: Some(CircleTarget::Section { title, page_index }),
            created_at_ms: now_ms,
        }
    }
}

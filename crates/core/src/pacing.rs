//! Semantic pacing and word-level stepping
//!
//! Speech-synchronized highlights must not churn faster than a listener can
//! follow. The pacing state is an explicit struct owned by the engine and
//! mutated only through its offer/tick methods; it gates how often a new
//! semantic highlight may be applied and detects near-duplicate fragments.
//! Time never comes from a wall clock; every method takes the host's audio
//! clock timestamp in milliseconds.

use crate::config::{EngineConfig, MAX_DWELL_MS, MIN_DWELL_MS};
use docent_layout::Rect;
use serde::{Deserialize, Serialize};

/// Outcome of offering a semantic fragment to the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingDecision {
    /// Admitted; the fragment becomes a highlight request
    Accepted,

    /// Dropped: the dwell interval since the last acceptance has not elapsed
    GateClosed,

    /// Dropped: same normalized text as the previous fragment, arriving
    /// within a third of the dwell interval
    Duplicate,

    /// Dropped before the gate: the caller's similarity score was below the
    /// configured cutoff
    LowSimilarity,
}

/// Gate state for semantic highlight admission
#[derive(Debug, Clone)]
pub struct PacingState {
    dwell_ms: u64,
    last_accept_ms: Option<u64>,
    last_offer_text: Option<String>,
    last_offer_ms: u64,
}

impl PacingState {
    /// Create pacing state from the engine configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            dwell_ms: config.dwell_ms.clamp(MIN_DWELL_MS, MAX_DWELL_MS),
            last_accept_ms: None,
            last_offer_text: None,
            last_offer_ms: 0,
        }
    }

    /// Current dwell interval in milliseconds
    pub fn dwell_ms(&self) -> u64 {
        self.dwell_ms
    }

    /// Update the dwell interval from the external pacing signal
    ///
    /// Returns the clamped value actually applied.
    pub fn set_dwell_ms(&mut self, dwell_ms: u64) -> u64 {
        self.dwell_ms = dwell_ms.clamp(MIN_DWELL_MS, MAX_DWELL_MS);
        self.dwell_ms
    }

    /// Check whether the gate would admit a fragment at `now_ms`
    pub fn gate_open(&self, now_ms: u64) -> bool {
        match self.last_accept_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.dwell_ms,
            None => true,
        }
    }

    /// Offer a fragment to the gate
    ///
    /// `normalized_text` must already be canonicalized and case-folded so
    /// the duplicate check compares like with like. Every offer is recorded
    /// for the duplicate window, accepted or not.
    pub fn offer(&mut self, normalized_text: &str, now_ms: u64) -> PacingDecision {
        let is_duplicate = self
            .last_offer_text
            .as_deref()
            .map(|prev| {
                prev == normalized_text
                    && now_ms.saturating_sub(self.last_offer_ms) < self.dwell_ms / 3
            })
            .unwrap_or(false);

        let decision = if is_duplicate {
            PacingDecision::Duplicate
        } else if !self.gate_open(now_ms) {
            PacingDecision::GateClosed
        } else {
            self.last_accept_ms = Some(now_ms);
            PacingDecision::Accepted
        };

        self.last_offer_text = Some(normalized_text.to_string());
        self.last_offer_ms = now_ms;
        decision
    }
}

/// Word-level emphasis cursor over a located sentence
///
/// Created when a semantic fragment is matched and expanded to its
/// sentence; destroyed when a new transcript item starts or the words run
/// out. Each audio tick advances the cursor by one word once ninety percent
/// of the dwell interval has elapsed since the previous step.
#[derive(Debug, Clone)]
pub struct SemanticStepper {
    page_index: u16,
    words: Vec<String>,
    word_boxes: Vec<Rect>,
    cursor: usize,
    last_step_ms: u64,
}

impl SemanticStepper {
    /// Create a stepper positioned on the first word
    pub fn new(page_index: u16, words: Vec<String>, word_boxes: Vec<Rect>, now_ms: u64) -> Self {
        debug_assert_eq!(words.len(), word_boxes.len());
        Self {
            page_index,
            words,
            word_boxes,
            cursor: 0,
            last_step_ms: now_ms,
        }
    }

    /// Page the stepped sentence lives on
    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// The currently emphasized word and its box
    pub fn current(&self) -> Option<(usize, &str, Rect)> {
        if self.cursor < self.words.len() {
            Some((
                self.cursor,
                self.words[self.cursor].as_str(),
                self.word_boxes[self.cursor],
            ))
        } else {
            None
        }
    }

    /// Advance to the next word if the step interval has elapsed
    ///
    /// Returns the new cursor position when a step happened. Once the last
    /// word has been shown, further ticks return `None` and the stepper is
    /// exhausted.
    pub fn advance(&mut self, now_ms: u64, step_interval_ms: u64) -> Option<usize> {
        if self.is_exhausted() {
            return None;
        }
        if now_ms.saturating_sub(self.last_step_ms) < step_interval_ms {
            return None;
        }
        self.cursor += 1;
        self.last_step_ms = now_ms;
        if self.cursor < self.words.len() {
            Some(self.cursor)
        } else {
            None
        }
    }

    /// Check whether every word has been stepped through
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.words.len()
    }

    /// Number of words in the stepped sentence
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

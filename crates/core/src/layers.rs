//! Keyword layers
//!
//! Three independently managed keyword sets whose union is what the page
//! shows at any moment: `baseline` (replaced wholesale on a new topic),
//! `quote` (capped, append/dedup), and `semantic` (sliding window fed by the
//! pacing gate). A transcript reset clears only the semantic window;
//! baseline and quote survive mid-conversation.

use crate::normalize::normalized_eq;
use docent_scheduler::PhraseSpec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Which layer a keyword (and its painted overlay) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerSource {
    Baseline,
    Quote,
    Semantic,
}

/// The three bounded keyword sets held across requests
#[derive(Debug, Clone)]
pub struct KeywordLayers {
    baseline: Vec<PhraseSpec>,
    quote: VecDeque<PhraseSpec>,
    semantic: VecDeque<PhraseSpec>,
    quote_cap: usize,
    semantic_cap: usize,
}

impl KeywordLayers {
    /// Create empty layers with the given caps
    pub fn new(quote_cap: usize, semantic_cap: usize) -> Self {
        Self {
            baseline: Vec::new(),
            quote: VecDeque::new(),
            semantic: VecDeque::new(),
            quote_cap,
            semantic_cap,
        }
    }

    /// Replace the baseline layer wholesale
    pub fn replace_baseline(&mut self, keywords: Vec<PhraseSpec>) {
        self.baseline = keywords;
    }

    /// Merge keywords into the baseline layer, deduplicating
    pub fn merge_baseline(&mut self, keywords: Vec<PhraseSpec>) {
        for keyword in keywords {
            if !self
                .baseline
                .iter()
                .any(|k| normalized_eq(&k.text, &keyword.text))
            {
                self.baseline.push(keyword);
            }
        }
    }

    /// Append a quote keyword, deduplicating; the oldest entry is evicted
    /// once the cap is reached
    pub fn push_quote(&mut self, keyword: PhraseSpec) {
        if self
            .quote
            .iter()
            .any(|k| normalized_eq(&k.text, &keyword.text))
        {
            return;
        }
        if self.quote.len() >= self.quote_cap {
            self.quote.pop_front();
        }
        self.quote.push_back(keyword);
    }

    /// Push a phrase into the sliding semantic window (FIFO eviction)
    pub fn push_semantic(&mut self, keyword: PhraseSpec) {
        if self
            .semantic
            .iter()
            .any(|k| normalized_eq(&k.text, &keyword.text))
        {
            return;
        }
        if self.semantic.len() >= self.semantic_cap {
            self.semantic.pop_front();
        }
        self.semantic.push_back(keyword);
    }

    /// Reset the semantic window (new transcript item)
    pub fn reset_semantic(&mut self) {
        self.semantic.clear();
    }

    /// The union of all three layers, tagged by source
    ///
    /// A phrase present in more than one layer keeps its first (most
    /// persistent) classification: baseline, then quote, then semantic.
    pub fn combined(&self) -> Vec<(PhraseSpec, LayerSource)> {
        let mut out: Vec<(PhraseSpec, LayerSource)> = Vec::new();
        let tagged = self
            .baseline
            .iter()
            .map(|k| (k, LayerSource::Baseline))
            .chain(self.quote.iter().map(|k| (k, LayerSource::Quote)))
            .chain(self.semantic.iter().map(|k| (k, LayerSource::Semantic)));
        for (keyword, source) in tagged {
            if !out.iter().any(|(k, _)| normalized_eq(&k.text, &keyword.text)) {
                out.push((keyword.clone(), source));
            }
        }
        out
    }

    /// Baseline keywords
    pub fn baseline(&self) -> &[PhraseSpec] {
        &self.baseline
    }

    /// Quote keywords, oldest first
    pub fn quote(&self) -> impl Iterator<Item = &PhraseSpec> {
        self.quote.iter()
    }

    /// Semantic window contents, oldest first
    pub fn semantic(&self) -> impl Iterator<Item = &PhraseSpec> {
        self.semantic.iter()
    }

    /// Number of phrases in the semantic window
    pub fn semantic_len(&self) -> usize {
        self.semantic.len()
    }

    /// Number of phrases in the quote layer
    pub fn quote_len(&self) -> usize {
        self.quote.len()
    }
}

//! Tolerant phrase matching over page layouts
//!
//! The matcher concatenates a page's normalized fragment text into an
//! indexed string with a per-character origin map, so a match span anywhere
//! in the concatenation converts back to paintable, fragment-relative
//! rectangles. Three passes run in order of strictness: an exact scan, a
//! flexible pattern that survives line-wrap hyphenation, and an n-gram
//! decomposition for long phrases that partially reflowed.

use crate::config::EngineConfig;
use crate::normalize::{self, canonicalize, fold_case, fold_char};
use docent_layout::{PageLayout, Rect};
use docent_scheduler::PhraseSpec;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A located phrase occurrence
///
/// Offsets are character offsets into the page's normalized concatenated
/// text; `rects` is the rectangle list usable for painting. Matches are
/// ordered by (page, offset) and the first is the canonical jump target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Page the match was found on
    pub page_index: u16,

    /// Occurrence ordinal within the page, in document order
    pub match_index: usize,

    /// Start offset in normalized page text, in characters
    pub start_offset: usize,

    /// End offset (exclusive) in normalized page text, in characters
    pub end_offset: usize,

    /// Matched text with surrounding context
    pub excerpt: String,

    /// Paintable rectangles covering the match
    pub rects: Vec<Rect>,
}

impl MatchResult {
    /// Union box of the match rectangles
    pub fn bounds(&self) -> Option<Rect> {
        Rect::union_of(self.rects.iter().copied())
    }
}

/// Normalized, searchable view of one page layout
///
/// Built fresh each time a page is consulted; never cached across
/// re-renders. Separator characters between fragments carry the origin of
/// the preceding fragment so every span maps to a rectangle list.
pub struct IndexedPage {
    page_index: u16,
    chars: Vec<char>,
    frag_bounds: Vec<Rect>,
    frag_spans: Vec<(usize, usize)>,
}

impl IndexedPage {
    /// Build the index from a layout snapshot
    pub fn build(layout: &PageLayout) -> Self {
        let mut chars: Vec<char> = Vec::new();
        let mut frag_bounds = Vec::with_capacity(layout.fragments.len());
        let mut frag_spans = Vec::with_capacity(layout.fragments.len());

        for frag in &layout.fragments {
            frag_bounds.push(frag.bounds);
            let norm = canonicalize(&frag.text);
            if norm.is_empty() {
                frag_spans.push((chars.len(), chars.len()));
                continue;
            }
            if !chars.is_empty() {
                chars.push(' ');
            }
            let span_start = chars.len();
            chars.extend(norm.chars());
            frag_spans.push((span_start, chars.len()));
        }

        Self {
            page_index: layout.page_index,
            chars,
            frag_bounds,
            frag_spans,
        }
    }

    /// Page this index describes
    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// Normalized page text as characters
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Length of the normalized page text, in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Check whether the page produced no searchable text
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Matched text with up to 40 characters of context on either side
    pub fn excerpt(&self, start: usize, end: usize) -> String {
        const CONTEXT: usize = 40;
        let s = start.saturating_sub(CONTEXT);
        let e = (end + CONTEXT).min(self.chars.len());
        let mut out: String = self.chars[s..e.max(s)].iter().collect();
        if s > 0 {
            out.insert(0, '…');
        }
        if e < self.chars.len() {
            out.push('…');
        }
        out
    }

    /// Paintable rectangles for a character span
    ///
    /// A fragment fully inside the span contributes its whole box; a
    /// partially covered fragment contributes a horizontal slice
    /// proportional to the covered character range.
    pub fn rects_for_span(&self, start: usize, end: usize) -> Vec<Rect> {
        let mut rects = Vec::new();
        for (fi, &(fs, fe)) in self.frag_spans.iter().enumerate() {
            if fs == fe || fe <= start || fs >= end {
                continue;
            }
            let bounds = self.frag_bounds[fi];
            let s = start.max(fs);
            let e = end.min(fe);
            if s <= fs && e >= fe {
                rects.push(bounds);
                continue;
            }
            let total = (fe - fs) as f32;
            let left = bounds.left + bounds.width * (s - fs) as f32 / total;
            let width = bounds.width * (e - s) as f32 / total;
            rects.push(Rect::new(left, bounds.top, width, bounds.height));
        }
        rects
    }
}

/// Tolerant phrase matcher
pub struct PhraseMatcher {
    config: EngineConfig,
}

impl PhraseMatcher {
    /// Create a matcher with the given configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Find all occurrences of a phrase on one page, in document order
    ///
    /// Phrases that normalize to fewer than the configured minimum of
    /// characters, or to punctuation only, return an empty result.
    pub fn find_in_page(&self, index: &IndexedPage, phrase: &PhraseSpec) -> Vec<MatchResult> {
        let norm = canonicalize(&phrase.text);
        if norm.chars().count() < self.config.min_phrase_chars
            || !norm.chars().any(|c| c.is_alphanumeric())
        {
            return Vec::new();
        }
        if index.is_empty() {
            return Vec::new();
        }

        let mut spans = self.exact_pass(index, &norm, phrase.case_sensitive);

        // The fallback passes fold case and diacritics, so they only apply
        // to the default case-insensitive specs. The flexible pass also
        // re-finds exact occurrences; overlap deduplication collapses those.
        if !phrase.case_sensitive && normalize::is_flex_eligible(&norm) {
            spans.extend(self.flexible_pass(index, &norm));
        }

        if spans.is_empty() && !phrase.case_sensitive {
            let words: Vec<&str> = norm.split(' ').collect();
            if words.len() > self.config.ngram_trigger_words {
                spans = self.ngram_pass(index, &words);
            }
        }

        let results = self.spans_to_results(index, spans);
        debug!(
            "phrase \"{}\": {} match(es) on page {}",
            phrase.text,
            results.len(),
            index.page_index()
        );
        results
    }

    fn spans_to_results(
        &self,
        index: &IndexedPage,
        mut spans: Vec<(usize, usize)>,
    ) -> Vec<MatchResult> {
        spans.sort_unstable();
        let mut kept: Vec<(usize, usize)> = Vec::new();
        for span in spans {
            if kept.last().map_or(true, |last| span.0 >= last.1) {
                kept.push(span);
            }
        }
        kept.into_iter()
            .enumerate()
            .map(|(i, (s, e))| MatchResult {
                page_index: index.page_index(),
                match_index: i,
                start_offset: s,
                end_offset: e,
                excerpt: index.excerpt(s, e),
                rects: index.rects_for_span(s, e),
            })
            .collect()
    }

    fn exact_pass(
        &self,
        index: &IndexedPage,
        norm: &str,
        case_sensitive: bool,
    ) -> Vec<(usize, usize)> {
        let needle: Vec<char> = if case_sensitive {
            norm.chars().collect()
        } else {
            norm.chars().map(fold_case).collect()
        };
        let hay = index.chars();
        if needle.is_empty() || hay.len() < needle.len() {
            return Vec::new();
        }

        let mut out = Vec::new();
        'scan: for i in 0..=hay.len() - needle.len() {
            for (j, &nc) in needle.iter().enumerate() {
                let hc = if case_sensitive {
                    hay[i + j]
                } else {
                    fold_case(hay[i + j])
                };
                if hc != nc {
                    continue 'scan;
                }
            }
            out.push((i, i + needle.len()));
        }
        out
    }

    fn flexible_pass(&self, index: &IndexedPage, norm: &str) -> Vec<(usize, usize)> {
        let Some(pattern) = build_flexible_pattern(norm) else {
            return Vec::new();
        };
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(err) => {
                warn!("flexible pattern failed to compile: {err}");
                return Vec::new();
            }
        };

        // Folded haystack with per-character byte offsets; the fold is 1:1
        // so regex byte spans convert back to character spans exactly.
        let mut hay = String::with_capacity(index.len() * 2);
        let mut char_starts = Vec::with_capacity(index.len() + 1);
        for &c in index.chars() {
            char_starts.push(hay.len());
            hay.push(fold_char(c));
        }
        char_starts.push(hay.len());

        re.find_iter(&hay)
            .map(|m| {
                let cs = char_starts.partition_point(|&b| b < m.start());
                let ce = char_starts.partition_point(|&b| b < m.end());
                (cs, ce)
            })
            .collect()
    }

    fn ngram_pass(&self, index: &IndexedPage, words: &[&str]) -> Vec<(usize, usize)> {
        let size = self.config.ngram_max_words.min(words.len());
        let mut windows: Vec<String> = Vec::new();
        let mut start = 0;
        while start < words.len() && windows.len() < self.config.ngram_max_windows {
            let remaining = words.len() - start;
            let take = size.min(remaining);
            if take < self.config.ngram_min_words {
                break;
            }
            windows.push(words[start..start + take].join(" "));
            start += take;
        }

        debug!(
            "n-gram fallback: {} window(s) for {}-word phrase",
            windows.len(),
            words.len()
        );

        let mut spans = Vec::new();
        for window in &windows {
            let mut found = self.exact_pass(index, window, false);
            if found.is_empty() && normalize::is_flex_eligible(window) {
                found = self.flexible_pass(index, window);
            }
            spans.extend(found);
        }
        spans
    }
}

/// Build the hyphenation-tolerant pattern for a normalized phrase
///
/// Separator runs in the phrase match zero to three separator characters in
/// the text, and a short optional break is tolerated between adjacent word
/// characters, so "MH-SSM" finds "mh ssm" and "cooperate" finds a
/// line-wrapped "co- operate".
fn build_flexible_pattern(norm: &str) -> Option<String> {
    let folded: String = norm.chars().map(fold_char).collect();
    let mut pattern = String::new();
    let mut prev_word_char = false;
    for c in folded.chars() {
        if c == ' ' || c == '-' {
            if prev_word_char {
                pattern.push_str("[\\s\\-]{0,3}");
                prev_word_char = false;
            }
        } else {
            if prev_word_char {
                pattern.push_str("[\\s\\-]{0,2}");
            }
            let mut buf = [0u8; 4];
            pattern.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            prev_word_char = true;
        }
    }
    if pattern.is_empty() {
        None
    } else {
        Some(pattern)
    }
}

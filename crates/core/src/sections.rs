//! Section heading detection and section bounds
//!
//! When the renderer exposes no structured outline, headings are recovered
//! from the visual lines of a page: numbered-heading patterns, canonical
//! section names, and oversized Title-Case lines all qualify. A numeric-only
//! line is merged with the adjacent title line to reconstruct headings the
//! renderer split, e.g. "3.2" + "Some Title".

use crate::config::EngineConfig;
use crate::normalize::{canonicalize, normalized_eq};
use docent_layout::{PageLayout, Rect};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Section names recognized without numbering or font cues
const CANONICAL_SECTIONS: &[&str] = &[
    "abstract",
    "introduction",
    "background",
    "related work",
    "methods",
    "methodology",
    "experiments",
    "evaluation",
    "results",
    "discussion",
    "limitations",
    "conclusion",
    "conclusions",
    "references",
    "bibliography",
    "appendix",
    "acknowledgments",
    "acknowledgements",
];

/// A heading line recovered from the layout
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading text, numeric prefix included when present
    pub title: String,

    /// Index of the visual line the heading starts on
    pub line_index: usize,

    /// Box of the heading line(s)
    pub bounds: Rect,

    /// Whether the heading carried a section number
    pub numbered: bool,
}

/// A located document section
///
/// Persisted by the engine as the "active section" to constrain later
/// semantic search. Bounds are kept per page because sections cross page
/// breaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Section title as printed
    pub title: String,

    /// Page the section starts on
    pub page_index: u16,

    /// Section content bounds, per page
    pub bounds_by_page: HashMap<u16, Rect>,
}

impl Section {
    /// Create a section confined to a single page
    pub fn single(title: impl Into<String>, page_index: u16, bounds: Rect) -> Self {
        let mut bounds_by_page = HashMap::new();
        bounds_by_page.insert(page_index, bounds);
        Self {
            title: title.into(),
            page_index,
            bounds_by_page,
        }
    }

    /// Bounds on the section's starting page
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds_by_page.get(&self.page_index).copied()
    }

    /// Pages the section touches, ascending
    pub fn pages(&self) -> Vec<u16> {
        let mut pages: Vec<u16> = self.bounds_by_page.keys().copied().collect();
        pages.sort_unstable();
        pages
    }
}

/// Detect heading lines on a page
pub fn detect_headings(layout: &PageLayout, config: &EngineConfig) -> Vec<Heading> {
    let Ok(numbered_re) = Regex::new(r"^\d+(\.\d+)*\.?\s+\S") else {
        return Vec::new();
    };
    let Ok(numeric_only_re) = Regex::new(r"^\d+(\.\d+)*\.?$") else {
        return Vec::new();
    };

    let lines = layout.visual_lines();
    let median_font = layout.median_font_size();
    let mut headings = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        let text = canonicalize(&line.text);
        if text.is_empty() {
            i += 1;
            continue;
        }

        // A bare section number is merged with the adjacent title line.
        if numeric_only_re.is_match(&text) {
            if let Some(next) = lines.get(i + 1) {
                let next_text = canonicalize(&next.text);
                if looks_like_title(&next_text, config) {
                    headings.push(Heading {
                        title: format!("{text} {next_text}"),
                        line_index: i,
                        bounds: line.bounds.union(&next.bounds),
                        numbered: true,
                    });
                    i += 2;
                    continue;
                }
            }
            i += 1;
            continue;
        }

        if numbered_re.is_match(&text) && word_count(&text) <= config.heading_max_words * 2 {
            headings.push(Heading {
                title: text,
                line_index: i,
                bounds: line.bounds,
                numbered: true,
            });
        } else if is_canonical_section(&text) {
            headings.push(Heading {
                title: text,
                line_index: i,
                bounds: line.bounds,
                numbered: false,
            });
        } else if median_font > 0.0
            && line.font_size > median_font * config.heading_font_ratio
            && looks_like_title(&text, config)
        {
            headings.push(Heading {
                title: text,
                line_index: i,
                bounds: line.bounds,
                numbered: false,
            });
        }
        i += 1;
    }

    debug!(
        "page {}: {} heading(s) detected",
        layout.page_index,
        headings.len()
    );
    headings
}

/// Content bounds of the section starting at `headings[index]`
///
/// Extends from the heading line down to the next heading (or the bottom of
/// the page content), unioned over the fragments in that band.
pub fn section_content_bounds(layout: &PageLayout, headings: &[Heading], index: usize) -> Rect {
    let heading = &headings[index];
    let top = heading.bounds.top;
    let bottom = headings
        .get(index + 1)
        .map(|next| next.bounds.top)
        .or_else(|| layout.content_bounds().map(|b| b.bottom()))
        .unwrap_or(heading.bounds.bottom());

    let band = layout
        .fragments
        .iter()
        .map(|f| f.bounds)
        .filter(|b| b.top >= top && b.top < bottom);
    Rect::union_of(band).unwrap_or(heading.bounds)
}

/// Locate a section by title on one page
///
/// Titles match case-insensitively, tolerating a numbering prefix on either
/// side ("Results" finds "4 Results" and vice versa).
pub fn find_section(layout: &PageLayout, title: &str, config: &EngineConfig) -> Option<Section> {
    let headings = detect_headings(layout, config);
    let wanted = canonicalize(title).to_lowercase();

    let index = headings.iter().position(|h| {
        let have = h.title.to_lowercase();
        normalized_eq(&h.title, title) || have.contains(&wanted) || wanted.contains(&have)
    })?;

    let bounds = section_content_bounds(layout, &headings, index);
    Some(Section::single(
        headings[index].title.clone(),
        layout.page_index,
        bounds,
    ))
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_canonical_section(text: &str) -> bool {
    let lower = text.trim().trim_end_matches(':').to_lowercase();
    CANONICAL_SECTIONS.contains(&lower.as_str())
}

/// Short Title-Case test: most alphabetic words start uppercase
fn looks_like_title(text: &str, config: &EngineConfig) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || words.len() > config.heading_max_words {
        return false;
    }
    let alphabetic: Vec<&&str> = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_alphabetic()))
        .collect();
    if alphabetic.is_empty() {
        return false;
    }
    let capitalized = alphabetic
        .iter()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .count();
    capitalized * 2 >= alphabetic.len()
}

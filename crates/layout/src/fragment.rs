//! Text fragments and per-page layout analysis
//!
//! A page layout is the engine's read-only view of one rendered page: an
//! ordered list of positioned text fragments supplied by the rendering
//! collaborator. Everything derived from it (column boundary, visual lines,
//! font statistics) is recomputed on demand because the surface may re-render
//! and reflow pages at any time.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// A positioned text fragment on a page
///
/// Immutable per render pass; owned by the layout snapshot provider. The
/// engine only reads fragments, it never mutates or caches them across
/// re-renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Page this fragment belongs to
    pub page_index: u16,

    /// Raw text content as rendered
    pub text: String,

    /// Bounding box in logical page units
    pub bounds: Rect,

    /// Estimated font size in logical units
    pub font_size: f32,
}

impl TextFragment {
    /// Create a new text fragment
    pub fn new(page_index: u16, text: impl Into<String>, bounds: Rect, font_size: f32) -> Self {
        Self {
            page_index,
            text: text.into(),
            bounds,
            font_size,
        }
    }

    /// Number of whitespace-separated words in this fragment
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A visual text line reconstructed from fragments
///
/// Fragments that vertically overlap are clustered into one line; the text is
/// their contents joined left-to-right. Used by heading detection and the
/// region detector's row analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualLine {
    /// Concatenated fragment text in left-to-right order
    pub text: String,

    /// Union box of the member fragments
    pub bounds: Rect,

    /// Largest fragment font size on this line
    pub font_size: f32,

    /// Indices into the source layout's fragment list
    pub fragment_indices: Vec<usize>,
}

/// Ordered sequence of text fragments for one page
///
/// Derived measurements are computed lazily each time the page is consulted;
/// nothing is cached across re-renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page this layout describes
    pub page_index: u16,

    /// Fragments in reading order
    pub fragments: Vec<TextFragment>,
}

impl PageLayout {
    /// Create a page layout from fragments in reading order
    pub fn new(page_index: u16, fragments: Vec<TextFragment>) -> Self {
        Self {
            page_index,
            fragments,
        }
    }

    /// Check whether the page has any fragments
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Union box of all fragments, or `None` for an empty page
    pub fn content_bounds(&self) -> Option<Rect> {
        Rect::union_of(self.fragments.iter().map(|f| f.bounds))
    }

    /// Infer the x-coordinate separating two reading columns
    ///
    /// Sorts fragment left edges and looks for the largest horizontal gap
    /// between consecutive edges. A gap of at least `min_gap` marks a
    /// two-column page and its midpoint is the boundary. Pages without such
    /// a gap are single-column and return `None`.
    pub fn column_boundary(&self, min_gap: f32) -> Option<f32> {
        if self.fragments.len() < 4 {
            return None;
        }

        let mut edges: Vec<f32> = self.fragments.iter().map(|f| f.bounds.left).collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut best_gap = 0.0_f32;
        let mut best_mid = 0.0_f32;
        for pair in edges.windows(2) {
            let gap = pair[1] - pair[0];
            if gap > best_gap {
                best_gap = gap;
                best_mid = pair[0] + gap / 2.0;
            }
        }

        if best_gap >= min_gap {
            Some(best_mid)
        } else {
            None
        }
    }

    /// Cluster fragments into visual text lines
    ///
    /// Two fragments share a line when their vertical centers are closer than
    /// roughly half a line height. Lines are returned top-to-bottom with
    /// their member fragments ordered left-to-right.
    pub fn visual_lines(&self) -> Vec<VisualLine> {
        let mut indices: Vec<usize> = (0..self.fragments.len()).collect();
        indices.sort_by(|&a, &b| {
            let fa = &self.fragments[a].bounds;
            let fb = &self.fragments[b].bounds;
            fa.top
                .partial_cmp(&fb.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    fa.left
                        .partial_cmp(&fb.left)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let mut lines: Vec<Vec<usize>> = Vec::new();
        for idx in indices {
            let frag = &self.fragments[idx];
            let tolerance = (frag.bounds.height * 0.6).max(2.0);
            match lines.last_mut() {
                Some(line) => {
                    let line_top = self.fragments[line[0]].bounds.top;
                    if (frag.bounds.top - line_top).abs() <= tolerance {
                        line.push(idx);
                    } else {
                        lines.push(vec![idx]);
                    }
                }
                None => lines.push(vec![idx]),
            }
        }

        lines
            .into_iter()
            .map(|mut members| {
                members.sort_by(|&a, &b| {
                    self.fragments[a]
                        .bounds
                        .left
                        .partial_cmp(&self.fragments[b].bounds.left)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let text = members
                    .iter()
                    .map(|&i| self.fragments[i].text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                let bounds = Rect::union_of(members.iter().map(|&i| self.fragments[i].bounds))
                    .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
                let font_size = members
                    .iter()
                    .map(|&i| self.fragments[i].font_size)
                    .fold(0.0_f32, f32::max);
                VisualLine {
                    text,
                    bounds,
                    font_size,
                    fragment_indices: members,
                }
            })
            .collect()
    }

    /// Median fragment font size on this page, or zero when empty
    pub fn median_font_size(&self) -> f32 {
        if self.fragments.is_empty() {
            return 0.0;
        }
        let mut sizes: Vec<f32> = self.fragments.iter().map(|f| f.font_size).collect();
        sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sizes[sizes.len() / 2]
    }
}

//! Engine configuration
//!
//! Every numeric threshold the heuristics depend on lives here as a
//! documented, tunable field. The defaults reproduce the behavior of the
//! production system; none of them is a load-bearing invariant.

use crate::overlay::CircleShape;
use serde::{Deserialize, Serialize};

/// Default minimum interval between accepted semantic highlights
pub const DEFAULT_DWELL_MS: u64 = 900;

/// Lower clamp for the dwell interval
pub const MIN_DWELL_MS: u64 = 300;

/// Upper clamp for the dwell interval
pub const MAX_DWELL_MS: u64 = 3000;

/// Annotation engine tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Phrases with fewer normalized characters than this are rejected
    pub min_phrase_chars: usize,

    /// Word count above which the n-gram fallback decomposes a phrase
    pub ngram_trigger_words: usize,

    /// Largest n-gram window, in words
    pub ngram_max_words: usize,

    /// Smallest n-gram window, in words
    pub ngram_min_words: usize,

    /// Maximum number of n-gram windows tried per phrase
    pub ngram_max_windows: usize,

    /// Minimum horizontal gap between fragment left edges that splits a
    /// page into two reading columns, in logical units
    pub column_gap_min: f32,

    /// Vertical search radius below a table anchor, in logical units
    pub table_search_radius: f32,

    /// Vertical search radius below a figure anchor, in logical units
    pub figure_search_radius: f32,

    /// Horizontal reach around a figure anchor, in logical units
    pub figure_horizontal_reach: f32,

    /// Word count at or below which a fragment still looks cell-like
    pub cell_max_words: usize,

    /// Fractional deviation from the running row spacing average that ends
    /// a table (0.5 = 50%)
    pub row_spacing_break: f32,

    /// Fixed-fallback table box width cap, in logical units
    pub fallback_table_width: f32,

    /// Fixed-fallback table box height, in logical units
    pub fallback_table_height: f32,

    /// Fixed-fallback figure box width, in logical units
    pub fallback_figure_width: f32,

    /// Fixed-fallback figure box height, in logical units
    pub fallback_figure_height: f32,

    /// Padding around an anchor for generic fallback boxes, in logical units
    pub fallback_anchor_padding: f32,

    /// Heading font size threshold as a ratio of the page median
    pub heading_font_ratio: f32,

    /// Maximum word count for a font-size-classified heading line
    pub heading_max_words: usize,

    /// Outward padding for circle overlays, in logical units
    pub circle_padding: f32,

    /// Shape used for circle overlays
    pub circle_shape: CircleShape,

    /// Minimum interval between accepted semantic highlights, milliseconds
    pub dwell_ms: u64,

    /// Fraction of the dwell interval between word-level steps
    pub word_step_fraction: f32,

    /// Similarity score below which a semantic fragment is dropped
    pub semantic_similarity_min: f32,

    /// Sliding semantic keyword window size
    pub semantic_window: usize,

    /// Quote keyword layer cap
    pub quote_cap: usize,

    /// Quiet period between processed requests, milliseconds
    pub settle_delay_ms: u64,

    /// Retry attempts for requests suspended on an unavailable layout
    pub retry_max_attempts: u32,

    /// Base retry delay, milliseconds, multiplied by the attempt number
    pub retry_base_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_phrase_chars: 3,
            ngram_trigger_words: 6,
            ngram_max_words: 6,
            ngram_min_words: 3,
            ngram_max_windows: 4,
            column_gap_min: 30.0,
            table_search_radius: 400.0,
            figure_search_radius: 500.0,
            figure_horizontal_reach: 220.0,
            cell_max_words: 6,
            row_spacing_break: 0.5,
            fallback_table_width: 300.0,
            fallback_table_height: 150.0,
            fallback_figure_width: 250.0,
            fallback_figure_height: 175.0,
            fallback_anchor_padding: 8.0,
            heading_font_ratio: 1.15,
            heading_max_words: 12,
            circle_padding: 8.0,
            circle_shape: CircleShape::Ellipse,
            dwell_ms: DEFAULT_DWELL_MS,
            word_step_fraction: 0.9,
            semantic_similarity_min: 0.7,
            semantic_window: 5,
            quote_cap: 10,
            settle_delay_ms: 80,
            retry_max_attempts: 5,
            retry_base_delay_ms: 120,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dwell interval, clamped to the supported range
    pub fn with_dwell_ms(mut self, dwell_ms: u64) -> Self {
        self.dwell_ms = dwell_ms.clamp(MIN_DWELL_MS, MAX_DWELL_MS);
        self
    }

    /// Set the circle overlay shape
    pub fn with_circle_shape(mut self, shape: CircleShape) -> Self {
        self.circle_shape = shape;
        self
    }

    /// Set the circle overlay padding
    pub fn with_circle_padding(mut self, padding: f32) -> Self {
        self.circle_padding = padding;
        self
    }

    /// Set the two-column detection gap threshold
    pub fn with_column_gap_min(mut self, gap: f32) -> Self {
        self.column_gap_min = gap;
        self
    }

    /// Set the vertical search radius below table anchors
    pub fn with_table_search_radius(mut self, radius: f32) -> Self {
        self.table_search_radius = radius;
        self
    }

    /// Set the similarity cutoff for semantic fragments
    pub fn with_semantic_similarity_min(mut self, min: f32) -> Self {
        self.semantic_similarity_min = min.clamp(0.0, 1.0);
        self
    }

    /// Set the settle delay between processed requests
    pub fn with_settle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.settle_delay_ms = delay_ms;
        self
    }
}

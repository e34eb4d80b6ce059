//! Region detection for tables, figures, and labeled content
//!
//! Given the anchor box of a label like "Table 3", the detector infers the
//! bounds of the content the label names. Three strategies run in order and
//! short-circuit on the first usable (positive-area) box:
//!
//! 1. `Structural`: column-aware layout analysis over the fragments.
//! 2. `Ocr`: raster-based boundary recovery through the host's OCR
//!    capability.
//! 3. `AnchorFallback`: a fixed-size box by region kind around the anchor.
//!
//! The chain never fails the user-visible action: the fallback always
//! produces a box. Detected boxes are clamped to the anchor's side of the
//! column boundary on two-column pages.

use crate::config::EngineConfig;
use crate::normalize::ends_with_multiple_terminators;
use docent_layout::{PageLayout, Rect, RegionOcr, TextFragment};
use log::debug;
use serde::{Deserialize, Serialize};

/// What kind of content a label names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Table,
    Figure,
    Generic,
}

impl RegionKind {
    /// Classify a label by its leading word
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.starts_with("table") || lower.starts_with("tab.") {
            RegionKind::Table
        } else if lower.starts_with("figure") || lower.starts_with("fig.") || lower.starts_with("fig ")
        {
            RegionKind::Figure
        } else {
            RegionKind::Generic
        }
    }
}

/// Inputs shared by every detection strategy
pub struct RegionContext<'a> {
    /// Layout of the page the anchor was found on
    pub layout: &'a PageLayout,

    /// Union box of the label match
    pub anchor: Rect,

    /// Kind of region being detected
    pub kind: RegionKind,

    /// Column boundary of the page, when two-column
    pub column_boundary: Option<f32>,

    /// Engine configuration
    pub config: &'a EngineConfig,
}

/// One step of the degrade-gracefully detection chain
pub trait RegionStrategy {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Attempt to detect the region; `None` or a zero-area box falls
    /// through to the next strategy
    fn detect(&self, ctx: &RegionContext<'_>) -> Option<Rect>;
}

/// Column-aware structural analysis over the page fragments
pub struct StructuralStrategy;

impl RegionStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn detect(&self, ctx: &RegionContext<'_>) -> Option<Rect> {
        match ctx.kind {
            RegionKind::Table => detect_table(ctx),
            RegionKind::Figure => detect_figure(ctx),
            RegionKind::Generic => None,
        }
    }
}

/// Raster-based recovery through the host OCR capability
pub struct OcrStrategy<'a> {
    pub ocr: &'a dyn RegionOcr,
}

impl RegionStrategy for OcrStrategy<'_> {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn detect(&self, ctx: &RegionContext<'_>) -> Option<Rect> {
        self.ocr
            .detect_region(ctx.layout.page_index, ctx.anchor)
            .filter(|rect| rect.area() > 0.0)
    }
}

/// Fixed-heuristic box sized by region kind
pub struct AnchorFallbackStrategy;

impl RegionStrategy for AnchorFallbackStrategy {
    fn name(&self) -> &'static str {
        "anchor-fallback"
    }

    fn detect(&self, ctx: &RegionContext<'_>) -> Option<Rect> {
        let config = ctx.config;
        let anchor = ctx.anchor;
        let rect = match ctx.kind {
            RegionKind::Table => {
                let width = (anchor.width + 2.0 * config.fallback_anchor_padding)
                    .min(config.fallback_table_width);
                Rect::new(anchor.left, anchor.top, width, config.fallback_table_height)
            }
            RegionKind::Figure => {
                let left =
                    (anchor.center().x - config.fallback_figure_width / 2.0).max(0.0);
                Rect::new(
                    left,
                    anchor.top,
                    config.fallback_figure_width,
                    config.fallback_figure_height,
                )
            }
            RegionKind::Generic => anchor.padded(config.fallback_anchor_padding),
        };
        Some(rect)
    }
}

/// The ordered detection chain
pub struct RegionDetector {
    config: EngineConfig,
}

impl RegionDetector {
    /// Create a detector with the given configuration
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Detect the region named by a label anchored at `anchor`
    ///
    /// Strategies are tried in order (structural, OCR when available,
    /// anchor fallback) and the first positive-area box wins. The result
    /// is clamped to the anchor's column on two-column pages.
    pub fn detect(
        &self,
        layout: &PageLayout,
        anchor: Rect,
        kind: RegionKind,
        ocr: Option<&dyn RegionOcr>,
    ) -> Option<Rect> {
        let ctx = RegionContext {
            layout,
            anchor,
            kind,
            column_boundary: layout.column_boundary(self.config.column_gap_min),
            config: &self.config,
        };

        let structural = StructuralStrategy;
        let fallback = AnchorFallbackStrategy;
        let ocr_strategy = ocr.map(|ocr| OcrStrategy { ocr });

        let mut strategies: Vec<&dyn RegionStrategy> = vec![&structural];
        if let Some(ref s) = ocr_strategy {
            strategies.push(s);
        }
        strategies.push(&fallback);

        for strategy in strategies {
            if let Some(rect) = strategy.detect(&ctx) {
                if rect.area() > 0.0 {
                    debug!(
                        "region for {:?} anchor on page {} via {} strategy",
                        kind,
                        layout.page_index,
                        strategy.name()
                    );
                    return Some(clamp_to_column(rect, &ctx));
                }
            }
        }
        None
    }
}

/// Keep a detected box on the anchor's side of the column boundary
fn clamp_to_column(rect: Rect, ctx: &RegionContext<'_>) -> Rect {
    let Some(boundary) = ctx.column_boundary else {
        return rect;
    };
    let anchor_on_left = ctx.anchor.center().x < boundary;
    if anchor_on_left {
        if rect.right() > boundary {
            Rect::from_edges(rect.left, rect.top, boundary, rect.bottom())
        } else {
            rect
        }
    } else if rect.left < boundary {
        Rect::from_edges(boundary, rect.top, rect.right(), rect.bottom())
    } else {
        rect
    }
}

/// Check whether a box lies (within a small tolerance) inside the anchor
///
/// The label's own fragments are never region content.
fn anchor_contains(anchor: &Rect, bounds: &Rect) -> bool {
    bounds.left >= anchor.left - 1.0
        && bounds.right() <= anchor.right() + 1.0
        && bounds.top >= anchor.top - 1.0
        && bounds.bottom() <= anchor.bottom() + 1.0
}

/// Check whether a fragment sits in the same column as the anchor
fn same_column(fragment: &TextFragment, ctx: &RegionContext<'_>) -> bool {
    match ctx.column_boundary {
        Some(boundary) => {
            (fragment.bounds.center().x < boundary) == (ctx.anchor.center().x < boundary)
        }
        None => true,
    }
}

/// Check whether a fragment's text looks like a table cell
///
/// Short content with a digit or percent sign, or very few words; never
/// trailing prose that ends in stacked sentence terminators.
fn is_cell_like(fragment: &TextFragment, ctx: &RegionContext<'_>) -> bool {
    let text = fragment.text.trim();
    if text.is_empty() || ends_with_multiple_terminators(text) {
        return false;
    }
    let has_numeric = text.chars().any(|c| c.is_ascii_digit()) || text.contains('%');
    has_numeric || fragment.word_count() <= ctx.config.cell_max_words
}

fn detect_table(ctx: &RegionContext<'_>) -> Option<Rect> {
    let anchor = ctx.anchor;
    let candidates: Vec<&TextFragment> = ctx
        .layout
        .fragments
        .iter()
        .filter(|f| f.bounds.top >= anchor.bottom())
        .filter(|f| f.bounds.top - anchor.bottom() <= ctx.config.table_search_radius)
        .filter(|f| same_column(f, ctx))
        .filter(|f| is_cell_like(f, ctx))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let rows = cluster_rows(&candidates);
    let kept = rows_until_spacing_break(&rows, ctx.config.row_spacing_break);
    debug!(
        "table rows: {} candidate, {} kept after spacing analysis",
        rows.len(),
        kept.len()
    );

    let mut bounds = anchor;
    for row in kept {
        bounds = bounds.union(&row.bounds);
    }
    Some(bounds)
}

fn detect_figure(ctx: &RegionContext<'_>) -> Option<Rect> {
    let anchor = ctx.anchor;
    let candidates: Vec<&TextFragment> = ctx
        .layout
        .fragments
        .iter()
        .filter(|f| !anchor_contains(&anchor, &f.bounds))
        .filter(|f| {
            // Captions sit below figure labels, image-adjacent text can sit
            // slightly above; allow a band around the anchor.
            let dy = f.bounds.top - anchor.top;
            dy > -ctx.config.figure_search_radius / 4.0 && dy <= ctx.config.figure_search_radius
        })
        .filter(|f| {
            (f.bounds.center().x - anchor.center().x).abs() <= ctx.config.figure_horizontal_reach
        })
        .filter(|f| same_column(f, ctx))
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let mut bounds = anchor;
    for fragment in candidates {
        bounds = bounds.union(&fragment.bounds);
    }
    Some(bounds)
}

#[derive(Debug, Clone, Copy)]
struct Row {
    top: f32,
    bounds: Rect,
}

/// Cluster cell-like fragments into rows by their top coordinate
fn cluster_rows(candidates: &[&TextFragment]) -> Vec<Row> {
    let mut sorted: Vec<&TextFragment> = candidates.to_vec();
    sorted.sort_by(|a, b| {
        a.bounds
            .top
            .partial_cmp(&b.bounds.top)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rows: Vec<Row> = Vec::new();
    for fragment in sorted {
        let tolerance = (fragment.bounds.height * 0.6).max(2.0);
        match rows.last_mut() {
            Some(row) if (fragment.bounds.top - row.top).abs() <= tolerance => {
                row.bounds = row.bounds.union(&fragment.bounds);
            }
            _ => rows.push(Row {
                top: fragment.bounds.top,
                bounds: fragment.bounds,
            }),
        }
    }
    rows
}

/// Keep rows until the inter-row spacing deviates from its running average
///
/// Table rows are evenly spaced; the first gap that deviates by more than
/// the configured fraction marks the end of the table, bounding the box
/// tightly instead of capturing trailing prose.
fn rows_until_spacing_break(rows: &[Row], break_fraction: f32) -> Vec<Row> {
    if rows.len() <= 2 {
        return rows.to_vec();
    }

    let mut kept = vec![rows[0], rows[1]];
    let mut average_gap = rows[1].top - rows[0].top;
    for pair in rows.windows(2).skip(1) {
        let gap = pair[1].top - pair[0].top;
        if average_gap > 0.0 && (gap - average_gap).abs() > average_gap * break_fraction {
            break;
        }
        kept.push(pair[1]);
        let n = kept.len() as f32 - 1.0;
        average_gap = (average_gap * (n - 1.0) + gap) / n;
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, left: f32, top: f32, width: f32) -> TextFragment {
        TextFragment::new(0, text, Rect::new(left, top, width, 10.0), 10.0)
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_region_kind_from_label() {
        assert_eq!(RegionKind::from_label("Table 3"), RegionKind::Table);
        assert_eq!(RegionKind::from_label("figure 2"), RegionKind::Figure);
        assert_eq!(RegionKind::from_label("Fig. 4a"), RegionKind::Figure);
        assert_eq!(RegionKind::from_label("Algorithm 1"), RegionKind::Generic);
    }

    #[test]
    fn test_structural_table_detection() {
        let mut fragments = vec![frag("Table 1", 50.0, 100.0, 60.0)];
        // Four evenly spaced data rows.
        for i in 0..4 {
            fragments.push(frag("12.5%", 50.0, 120.0 + i as f32 * 18.0, 50.0));
            fragments.push(frag("0.87", 120.0, 120.0 + i as f32 * 18.0, 40.0));
        }
        // Trailing prose far below, with a wide gap.
        fragments.push(frag(
            "The results above demonstrate a consistent trend over baselines.",
            50.0,
            320.0,
            300.0,
        ));
        let layout = PageLayout::new(0, fragments);
        let anchor = Rect::new(50.0, 100.0, 60.0, 10.0);

        let detector = RegionDetector::new(&config());
        let region = detector.detect(&layout, anchor, RegionKind::Table, None).unwrap();

        // Covers the rows but stops before the prose.
        assert!(region.bottom() >= 120.0 + 3.0 * 18.0);
        assert!(region.bottom() < 320.0);
    }

    #[test]
    fn test_table_box_respects_column_boundary() {
        // Two-column page: anchor and rows in the left column, prose in the
        // right column at matching heights.
        let mut fragments = vec![frag("Table 2", 40.0, 100.0, 60.0)];
        for i in 0..3 {
            fragments.push(frag("42", 40.0, 120.0 + i as f32 * 16.0, 30.0));
        }
        for i in 0..4 {
            fragments.push(frag("prose here", 320.0, 90.0 + i as f32 * 16.0, 120.0));
        }
        let layout = PageLayout::new(0, fragments);
        let boundary = layout.column_boundary(30.0).unwrap();
        let anchor = Rect::new(40.0, 100.0, 60.0, 10.0);

        let detector = RegionDetector::new(&config());
        let region = detector.detect(&layout, anchor, RegionKind::Table, None).unwrap();

        assert!(region.right() <= boundary);
    }

    #[test]
    fn test_ocr_fallback_when_no_structure() {
        struct FixedOcr(Rect);
        impl RegionOcr for FixedOcr {
            fn detect_region(&self, _page: u16, _anchor: Rect) -> Option<Rect> {
                Some(self.0)
            }
        }

        // Only the label exists; no cell-like content below.
        let layout = PageLayout::new(0, vec![frag("Table 3", 50.0, 100.0, 60.0)]);
        let anchor = Rect::new(50.0, 100.0, 60.0, 10.0);

        let ocr = FixedOcr(Rect::new(40.0, 95.0, 220.0, 140.0));
        let detector = RegionDetector::new(&config());
        let region = detector
            .detect(&layout, anchor, RegionKind::Table, Some(&ocr))
            .unwrap();
        assert_eq!(region, Rect::new(40.0, 95.0, 220.0, 140.0));
    }

    #[test]
    fn test_zero_area_ocr_falls_through_to_fixed_box() {
        struct ZeroOcr;
        impl RegionOcr for ZeroOcr {
            fn detect_region(&self, _page: u16, _anchor: Rect) -> Option<Rect> {
                Some(Rect::new(10.0, 10.0, 0.0, 0.0))
            }
        }

        let layout = PageLayout::new(0, vec![frag("Table 3", 50.0, 100.0, 60.0)]);
        let anchor = Rect::new(50.0, 100.0, 60.0, 10.0);

        let cfg = config();
        let detector = RegionDetector::new(&cfg);
        let region = detector
            .detect(&layout, anchor, RegionKind::Table, Some(&ZeroOcr))
            .unwrap();

        // The fixed fallback box, anchored at the label.
        assert_eq!(region.left, anchor.left);
        assert_eq!(region.top, anchor.top);
        assert_eq!(region.height, cfg.fallback_table_height);
        assert!(region.width <= cfg.fallback_table_width);
    }

    #[test]
    fn test_figure_fallback_box_dimensions() {
        let layout = PageLayout::new(0, vec![frag("Figure 1", 200.0, 400.0, 70.0)]);
        let anchor = Rect::new(200.0, 400.0, 70.0, 10.0);

        let cfg = config();
        let detector = RegionDetector::new(&cfg);
        let region = detector
            .detect(&layout, anchor, RegionKind::Figure, None)
            .unwrap();

        assert_eq!(region.width, cfg.fallback_figure_width);
        assert_eq!(region.height, cfg.fallback_figure_height);
    }

    #[test]
    fn test_cell_like_filter() {
        let ctx_config = config();
        let layout = PageLayout::new(0, Vec::new());
        let ctx = RegionContext {
            layout: &layout,
            anchor: Rect::new(0.0, 0.0, 10.0, 10.0),
            kind: RegionKind::Table,
            column_boundary: None,
            config: &ctx_config,
        };

        assert!(is_cell_like(&frag("42.5%", 0.0, 0.0, 30.0), &ctx));
        assert!(is_cell_like(&frag("mean error", 0.0, 0.0, 60.0), &ctx));
        assert!(!is_cell_like(&frag("", 0.0, 0.0, 10.0), &ctx));
        assert!(!is_cell_like(
            &frag(
                "This is a long trailing sentence of prose that should not count, etc..",
                0.0,
                0.0,
                300.0
            ),
            &ctx
        ));
    }
}

//! Trait seams to the external rendering collaborator
//!
//! The engine treats the renderer as a black box. It asks for per-page
//! layout snapshots, navigates, and optionally consults an OCR capability
//! for region bounds when structural layout analysis comes up empty.

use crate::fragment::PageLayout;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// One entry of the document outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Section or chapter title
    pub title: String,

    /// Page on which the section starts
    pub page_index: u16,
}

/// Source of per-page layout snapshots
///
/// `page_layout` may return `None` while a page is virtualized off-screen;
/// callers retry with bounded backoff rather than blocking. Layouts are
/// snapshots: a new call after a re-render may return different fragments.
pub trait LayoutProvider {
    /// Total number of pages in the document
    fn page_count(&self) -> u16;

    /// Layout snapshot for a page, or `None` while it is not materialized
    fn page_layout(&self, page_index: u16) -> Option<PageLayout>;

    /// Structured document outline, if the renderer exposes one
    ///
    /// Absence triggers heading-heuristic extraction instead.
    fn outline(&self) -> Option<Vec<OutlineEntry>> {
        None
    }

    /// Navigate the viewport to a page
    fn jump_to_page(&self, page_index: u16);

    /// Bring a page into view without changing the logical current page
    fn scroll_into_view(&self, page_index: u16);
}

/// OCR-assisted region boundary detection
///
/// Consulted when structural layout analysis fails to produce a usable
/// region box. The implementation rasterizes the page region around the
/// anchor and recovers bounds from the raster; a `None` or zero-area result
/// sends the caller to its final heuristic fallback.
pub trait RegionOcr {
    /// Detect the bounds of the region surrounding `anchor_hint`
    fn detect_region(&self, page_index: u16, anchor_hint: Rect) -> Option<Rect>;
}

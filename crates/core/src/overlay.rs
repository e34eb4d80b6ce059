//! Overlay model and idempotent paint/clear
//!
//! The overlay store is the only writer of overlay state. Every overlay
//! carries an identity derived from (page, kind, quantized box); painting a
//! shape that is already live is a no-op, so repeated requests never stack
//! duplicate shapes. Clearing is partitioned: highlight clears never remove
//! circles, and circle clears never remove highlights.

use crate::layers::LayerSource;
use docent_layout::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of painted shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Filled text highlight
    Highlight,

    /// Outlined region circle
    Circle,

    /// Single-word emphasis driven by the semantic stepper
    Word,
}

/// Shape used when painting circle overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleShape {
    Ellipse,
    Rectangle,
}

/// Style attributes carried to the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Shape for circle overlays; ignored for highlights and words
    pub shape: CircleShape,

    /// Outward padding already applied to the bounds, in logical units
    pub padding: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            shape: CircleShape::Ellipse,
            padding: 0.0,
        }
    }
}

/// Identity of an overlay on the rendering surface
///
/// Two overlays with the same key are the same shape on screen; painting
/// the second is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub page_index: u16,
    pub kind: OverlayKind,
    quad: (i32, i32, i32, i32),
}

/// An absolutely-positioned shape painted on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Shape kind
    pub kind: OverlayKind,

    /// Keyword layer that produced this overlay, for partitioned clears;
    /// `None` for circles and words
    pub layer: Option<LayerSource>,

    /// Page the overlay is painted on
    pub page_index: u16,

    /// Painted bounds in logical page units
    pub bounds: Rect,

    /// Style attributes
    pub style: OverlayStyle,
}

impl Overlay {
    /// Create a text highlight overlay
    pub fn highlight(page_index: u16, bounds: Rect, layer: LayerSource) -> Self {
        Self {
            kind: OverlayKind::Highlight,
            layer: Some(layer),
            page_index,
            bounds,
            style: OverlayStyle::default(),
        }
    }

    /// Create a circle overlay, padded outward so the border clears the text
    pub fn circle(page_index: u16, bounds: Rect, shape: CircleShape, padding: f32) -> Self {
        Self {
            kind: OverlayKind::Circle,
            layer: None,
            page_index,
            bounds: bounds.padded(padding),
            style: OverlayStyle { shape, padding },
        }
    }

    /// Create a word-emphasis overlay
    pub fn word(page_index: u16, bounds: Rect) -> Self {
        Self {
            kind: OverlayKind::Word,
            layer: None,
            page_index,
            bounds,
            style: OverlayStyle::default(),
        }
    }

    /// Identity of this overlay on the surface
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            page_index: self.page_index,
            kind: self.kind,
            quad: self.bounds.quantized(),
        }
    }
}

/// Paint/clear sink on the rendering surface
///
/// Implemented by the host around the renderer's absolutely-positioned
/// shape API. The engine only calls it through the overlay store, which
/// guarantees deduplication and partitioned clearing.
pub trait OverlaySurface {
    /// Paint a shape on its page
    fn paint_overlay(&mut self, overlay: &Overlay);

    /// Remove previously painted shapes by identity
    fn remove_overlays(&mut self, keys: &[DedupKey]);
}

/// Tracker of live overlays with idempotent paint and partitioned clears
#[derive(Debug, Default)]
pub struct OverlayStore {
    live: HashMap<DedupKey, Overlay>,
    painted: u64,
    deduplicated: u64,
}

impl OverlayStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Paint an overlay unless an identical one is already live
    ///
    /// Returns `true` when the surface was painted.
    pub fn paint(&mut self, surface: &mut dyn OverlaySurface, overlay: Overlay) -> bool {
        let key = overlay.dedup_key();
        if self.live.contains_key(&key) {
            self.deduplicated += 1;
            return false;
        }
        surface.paint_overlay(&overlay);
        self.live.insert(key, overlay);
        self.painted += 1;
        true
    }

    /// Remove highlight and word overlays; circles stay
    pub fn clear_highlights(&mut self, surface: &mut dyn OverlaySurface) -> usize {
        self.remove_where(surface, |o| {
            matches!(o.kind, OverlayKind::Highlight | OverlayKind::Word)
        })
    }

    /// Remove circle overlays; highlights stay
    pub fn clear_annotations(&mut self, surface: &mut dyn OverlaySurface) -> usize {
        self.remove_where(surface, |o| o.kind == OverlayKind::Circle)
    }

    /// Remove everything: highlights, words, and circles
    pub fn clear_all(&mut self, surface: &mut dyn OverlaySurface) -> usize {
        self.remove_where(surface, |_| true)
    }

    /// Remove overlays belonging to one keyword layer
    pub fn clear_layer(&mut self, surface: &mut dyn OverlaySurface, layer: LayerSource) -> usize {
        self.remove_where(surface, |o| o.layer == Some(layer))
    }

    /// Remove word overlays, optionally restricted to one page
    pub fn clear_words(&mut self, surface: &mut dyn OverlaySurface, page: Option<u16>) -> usize {
        self.remove_where(surface, |o| {
            o.kind == OverlayKind::Word && page.map_or(true, |p| o.page_index == p)
        })
    }

    /// Check whether an overlay with this identity is live
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.live.contains_key(key)
    }

    /// Number of live overlays
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check whether no overlays are live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live overlays, in no particular order
    pub fn live_overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.live.values()
    }

    /// Total overlays painted over the store's lifetime
    pub fn painted_count(&self) -> u64 {
        self.painted
    }

    /// Paint calls skipped because an identical overlay was live
    pub fn deduplicated_count(&self) -> u64 {
        self.deduplicated
    }

    fn remove_where<F>(&mut self, surface: &mut dyn OverlaySurface, predicate: F) -> usize
    where
        F: Fn(&Overlay) -> bool,
    {
        let keys: Vec<DedupKey> = self
            .live
            .iter()
            .filter(|(_, o)| predicate(o))
            .map(|(k, _)| *k)
            .collect();
        if keys.is_empty() {
            return 0;
        }
        surface.remove_overlays(&keys);
        for key in &keys {
            self.live.remove(key);
        }
        keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        paints: Vec<Overlay>,
        removals: Vec<DedupKey>,
    }

    impl OverlaySurface for RecordingSurface {
        fn paint_overlay(&mut self, overlay: &Overlay) {
            self.paints.push(overlay.clone());
        }

        fn remove_overlays(&mut self, keys: &[DedupKey]) {
            self.removals.extend_from_slice(keys);
        }
    }

    fn rect() -> Rect {
        Rect::new(10.0, 20.0, 100.0, 12.0)
    }

    #[test]
    fn test_paint_is_idempotent() {
        let mut store = OverlayStore::new();
        let mut surface = RecordingSurface::default();

        let overlay = Overlay::highlight(0, rect(), LayerSource::Baseline);
        assert!(store.paint(&mut surface, overlay.clone()));
        assert!(!store.paint(&mut surface, overlay));

        assert_eq!(store.len(), 1);
        assert_eq!(surface.paints.len(), 1);
        assert_eq!(store.deduplicated_count(), 1);
    }

    #[test]
    fn test_near_identical_boxes_share_identity() {
        let mut store = OverlayStore::new();
        let mut surface = RecordingSurface::default();

        let a = Overlay::highlight(0, Rect::new(10.1, 20.2, 99.8, 12.1), LayerSource::Quote);
        let b = Overlay::highlight(0, Rect::new(9.9, 19.8, 100.2, 11.9), LayerSource::Quote);
        assert!(store.paint(&mut surface, a));
        assert!(!store.paint(&mut surface, b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_partitioned_clearing() {
        let mut store = OverlayStore::new();
        let mut surface = RecordingSurface::default();

        store.paint(
            &mut surface,
            Overlay::highlight(0, rect(), LayerSource::Quote),
        );
        store.paint(
            &mut surface,
            Overlay::circle(0, Rect::new(50.0, 200.0, 200.0, 100.0), CircleShape::Ellipse, 8.0),
        );

        // Clearing highlights leaves the circle.
        assert_eq!(store.clear_highlights(&mut surface), 1);
        assert_eq!(store.len(), 1);
        assert!(store
            .live_overlays()
            .all(|o| o.kind == OverlayKind::Circle));

        // Clearing annotations removes it.
        assert_eq!(store.clear_annotations(&mut surface), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_layer_is_selective() {
        let mut store = OverlayStore::new();
        let mut surface = RecordingSurface::default();

        store.paint(
            &mut surface,
            Overlay::highlight(0, rect(), LayerSource::Baseline),
        );
        store.paint(
            &mut surface,
            Overlay::highlight(0, Rect::new(10.0, 50.0, 80.0, 12.0), LayerSource::Semantic),
        );
        store.paint(&mut surface, Overlay::word(0, Rect::new(10.0, 50.0, 20.0, 12.0)));

        store.clear_layer(&mut surface, LayerSource::Semantic);
        store.clear_words(&mut surface, None);

        assert_eq!(store.len(), 1);
        assert!(store
            .live_overlays()
            .all(|o| o.layer == Some(LayerSource::Baseline)));
    }

    #[test]
    fn test_circle_padding_expands_bounds() {
        let overlay = Overlay::circle(0, rect(), CircleShape::Rectangle, 8.0);
        assert_eq!(overlay.bounds.left, 2.0);
        assert_eq!(overlay.bounds.top, 12.0);
        assert_eq!(overlay.bounds.right(), 118.0);
        assert_eq!(overlay.style.shape, CircleShape::Rectangle);
    }
}

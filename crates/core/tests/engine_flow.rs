//! End-to-end engine behavior against mock collaborators
//!
//! Exercises the documented engine properties: idempotent baseline
//! resubmission, the layer merge invariant, overlay deduplication, pacing
//! intervals, the sliding semantic window bound, column-constrained region
//! boxes, retry on unavailable layouts, and transcript resets.

use docent_core::{
    AnnotationEngine, CircleShape, DedupKey, EngineCommand, EngineConfig, EngineResponse,
    HighlightCategory, LayerSource, LayoutProvider, Overlay, OverlayKind, OverlaySurface,
    PacingDecision, PageLayout, PhraseSpec, Rect, RegionOcr, RequestMode, RequestState,
    TextFragment,
};
use std::cell::RefCell;
use std::collections::HashMap;

struct MockProvider {
    pages: Vec<PageLayout>,
    // Pages that report unavailable for the first N calls.
    blocked: RefCell<HashMap<u16, u32>>,
    jumps: RefCell<Vec<u16>>,
}

impl MockProvider {
    fn new(pages: Vec<PageLayout>) -> Self {
        Self {
            pages,
            blocked: RefCell::new(HashMap::new()),
            jumps: RefCell::new(Vec::new()),
        }
    }

    fn block_page(self, page_index: u16, times: u32) -> Self {
        self.blocked.borrow_mut().insert(page_index, times);
        self
    }
}

impl LayoutProvider for MockProvider {
    fn page_count(&self) -> u16 {
        self.pages.len() as u16
    }

    fn page_layout(&self, page_index: u16) -> Option<PageLayout> {
        let mut blocked = self.blocked.borrow_mut();
        if let Some(remaining) = blocked.get_mut(&page_index) {
            if *remaining > 0 {
                *remaining -= 1;
                return None;
            }
        }
        self.pages.get(page_index as usize).cloned()
    }

    fn jump_to_page(&self, page_index: u16) {
        self.jumps.borrow_mut().push(page_index);
    }

    fn scroll_into_view(&self, _page_index: u16) {}
}

#[derive(Default)]
struct MockSurface {
    paints: usize,
    removals: usize,
}

impl OverlaySurface for MockSurface {
    fn paint_overlay(&mut self, _overlay: &Overlay) {
        self.paints += 1;
    }

    fn remove_overlays(&mut self, keys: &[DedupKey]) {
        self.removals += keys.len();
    }
}

fn frag(page: u16, text: &str, left: f32, top: f32, width: f32) -> TextFragment {
    TextFragment::new(page, text, Rect::new(left, top, width, 12.0), 10.0)
}

fn prose_page() -> PageLayout {
    PageLayout::new(
        0,
        vec![
            frag(0, "The transformer model scales well.", 50.0, 100.0, 280.0),
            frag(0, "We quote the original claim verbatim here.", 50.0, 120.0, 300.0),
            frag(0, "Ablation shows the attention head matters most.", 50.0, 140.0, 310.0),
        ],
    )
}

fn engine_with(
    pages: Vec<PageLayout>,
) -> AnnotationEngine<MockProvider, MockSurface> {
    AnnotationEngine::new(
        MockProvider::new(pages),
        MockSurface::default(),
        EngineConfig::default(),
    )
}

fn submit(
    engine: &mut AnnotationEngine<MockProvider, MockSurface>,
    keywords: &[&str],
    category: HighlightCategory,
    mode: RequestMode,
    now_ms: u64,
) -> EngineResponse {
    engine.handle(
        EngineCommand::SubmitHighlight {
            keywords: keywords.iter().map(|k| PhraseSpec::new(*k)).collect(),
            category,
            mode,
        },
        now_ms,
    )
}

#[test]
fn baseline_resubmission_is_idempotent() {
    let mut engine = engine_with(vec![prose_page()]);

    let first = submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    assert!(matches!(first, EngineResponse::Completed(_)));
    let count_after_first = engine.overlays().len();
    assert!(count_after_first > 0);

    let second = submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        1_000,
    );
    assert!(matches!(second, EngineResponse::Completed(_)));
    assert_eq!(engine.overlays().len(), count_after_first);
}

#[test]
fn merge_requests_preserve_baseline_overlays() {
    let mut engine = engine_with(vec![prose_page()]);

    submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    let baseline_overlays = |engine: &AnnotationEngine<MockProvider, MockSurface>| {
        engine
            .overlays()
            .live_overlays()
            .filter(|o| o.layer == Some(LayerSource::Baseline))
            .count()
    };
    let before = baseline_overlays(&engine);
    assert!(before > 0);

    submit(
        &mut engine,
        &["original claim"],
        HighlightCategory::Quote,
        RequestMode::Merge,
        1_000,
    );
    assert_eq!(baseline_overlays(&engine), before);
    assert!(engine
        .overlays()
        .live_overlays()
        .any(|o| o.layer == Some(LayerSource::Quote)));
}

#[test]
fn repeated_quote_requests_deduplicate_overlays() {
    let mut engine = engine_with(vec![prose_page()]);

    submit(
        &mut engine,
        &["original claim"],
        HighlightCategory::Quote,
        RequestMode::Merge,
        0,
    );
    let count = engine.overlays().len();

    submit(
        &mut engine,
        &["original claim"],
        HighlightCategory::Quote,
        RequestMode::Merge,
        1_000,
    );
    assert_eq!(engine.overlays().len(), count);
    assert!(engine.overlays().deduplicated_count() > 0);
}

#[test]
fn semantic_fragments_are_paced() {
    let mut engine = engine_with(vec![prose_page()]);
    let fragment = |engine: &mut AnnotationEngine<MockProvider, MockSurface>,
                    text: &str,
                    now: u64| {
        engine.handle(
            EngineCommand::SemanticFragment {
                text: text.to_string(),
                page_hint: Some(0),
                similarity: 0.9,
            },
            now,
        )
    };

    assert_eq!(
        fragment(&mut engine, "attention head matters", 0),
        EngineResponse::Pacing(PacingDecision::Accepted)
    );
    // Identical text 150ms later: duplicate, dropped.
    assert_eq!(
        fragment(&mut engine, "attention head matters", 150),
        EngineResponse::Pacing(PacingDecision::Duplicate)
    );
    // Different text inside the dwell interval: gate closed.
    assert_eq!(
        fragment(&mut engine, "transformer model scales", 500),
        EngineResponse::Pacing(PacingDecision::GateClosed)
    );
    // Different text after the dwell interval: accepted.
    assert_eq!(
        fragment(&mut engine, "transformer model scales", 1_000),
        EngineResponse::Pacing(PacingDecision::Accepted)
    );

    // Low-similarity fragments never reach the gate.
    let response = engine.handle(
        EngineCommand::SemanticFragment {
            text: "unrelated narration".to_string(),
            page_hint: Some(0),
            similarity: 0.3,
        },
        2_500,
    );
    assert_eq!(
        response,
        EngineResponse::Pacing(PacingDecision::LowSimilarity)
    );
}

#[test]
fn semantic_window_stays_bounded() {
    let mut engine = engine_with(vec![prose_page()]);

    for i in 0..8u64 {
        engine.handle(
            EngineCommand::SemanticFragment {
                text: format!("spoken phrase number {i}"),
                page_hint: Some(0),
                similarity: 0.9,
            },
            i * 1_000,
        );
        assert!(engine.layers().semantic_len() <= 5);
    }
    assert_eq!(engine.layers().semantic_len(), 5);
}

#[test]
fn transcript_item_resets_semantic_but_keeps_quotes() {
    let mut engine = engine_with(vec![prose_page()]);

    submit(
        &mut engine,
        &["original claim"],
        HighlightCategory::Quote,
        RequestMode::Merge,
        0,
    );
    engine.handle(
        EngineCommand::SemanticFragment {
            text: "attention head matters".to_string(),
            page_hint: Some(0),
            similarity: 0.9,
        },
        1_000,
    );
    assert!(engine
        .overlays()
        .live_overlays()
        .any(|o| o.layer == Some(LayerSource::Semantic)));
    assert!(engine.layers().semantic_len() > 0);

    engine.handle(EngineCommand::TranscriptItem, 1_500);

    assert_eq!(engine.layers().semantic_len(), 0);
    assert!(engine
        .overlays()
        .live_overlays()
        .all(|o| o.layer != Some(LayerSource::Semantic) && o.kind != OverlayKind::Word));
    // The quote overlay survives the reset.
    assert!(engine
        .overlays()
        .live_overlays()
        .any(|o| o.layer == Some(LayerSource::Quote)));
}

#[test]
fn word_stepper_advances_on_ticks() {
    let mut engine = engine_with(vec![prose_page()]);

    engine.handle(
        EngineCommand::SemanticFragment {
            text: "attention head matters".to_string(),
            page_hint: Some(0),
            similarity: 0.9,
        },
        0,
    );
    // The first word is emphasized immediately on acceptance.
    let word_count = |engine: &AnnotationEngine<MockProvider, MockSurface>| {
        engine
            .overlays()
            .live_overlays()
            .filter(|o| o.kind == OverlayKind::Word)
            .count()
    };
    assert_eq!(word_count(&engine), 1);

    // Dwell 900 => step interval 810; a tick before that does nothing.
    engine.handle(EngineCommand::AudioTick, 400);
    assert_eq!(engine.stats().words_stepped, 0);

    engine.handle(EngineCommand::AudioTick, 850);
    assert_eq!(engine.stats().words_stepped, 1);
    assert_eq!(word_count(&engine), 1); // Exactly one word at a time
}

#[test]
fn clear_scopes_are_partitioned() {
    let page = PageLayout::new(
        0,
        vec![
            frag(0, "Table 1", 50.0, 100.0, 60.0),
            frag(0, "42%", 50.0, 120.0, 30.0),
            frag(0, "17%", 50.0, 138.0, 30.0),
            frag(0, "baseline accuracy", 50.0, 200.0, 140.0),
        ],
    );
    let mut engine = engine_with(vec![page]);

    submit(
        &mut engine,
        &["baseline accuracy"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    assert!(engine.circle_label("Table 1", 1_000).is_some());

    // Clearing highlights keeps the circle.
    engine.handle(EngineCommand::ClearHighlights, 2_000);
    assert!(engine
        .overlays()
        .live_overlays()
        .all(|o| o.kind == OverlayKind::Circle));

    // Clearing annotations removes it.
    engine.handle(EngineCommand::ClearAnnotations, 3_000);
    assert_eq!(engine.overlays().len(), 0);
}

#[test]
fn detected_table_region_respects_columns() {
    // Two-column page: the labeled table lives in the left column.
    let mut fragments = vec![frag(0, "Table 1", 40.0, 100.0, 60.0)];
    for i in 0..3 {
        fragments.push(frag(0, "42%", 40.0, 120.0 + i as f32 * 16.0, 30.0));
    }
    for i in 0..4 {
        fragments.push(frag(0, "right column prose", 320.0, 90.0 + i as f32 * 16.0, 130.0));
    }
    let page = PageLayout::new(0, fragments);
    let boundary = page.column_boundary(30.0).unwrap();
    let mut engine = engine_with(vec![page]);

    let region = engine.circle_label("Table 1", 0).unwrap();
    assert!(region.right() <= boundary);
}

#[test]
fn zero_area_ocr_degrades_to_fixed_fallback() {
    struct ZeroOcr;
    impl RegionOcr for ZeroOcr {
        fn detect_region(&self, _page: u16, _anchor: Rect) -> Option<Rect> {
            Some(Rect::new(10.0, 10.0, 0.0, 0.0))
        }
    }

    // Label with no structural table content below it.
    let page = PageLayout::new(0, vec![frag(0, "Table 3", 50.0, 100.0, 60.0)]);
    let config = EngineConfig::default();
    let mut engine = AnnotationEngine::new(
        MockProvider::new(vec![page]),
        MockSurface::default(),
        config.clone(),
    )
    .with_ocr(Box::new(ZeroOcr));

    let region = engine.circle_label("Table 3", 0).unwrap();
    assert_eq!(region.left, 50.0);
    assert_eq!(region.top, 100.0);
    assert_eq!(region.height, config.fallback_table_height);
    assert!(region.width <= config.fallback_table_width);
}

#[test]
fn unavailable_layout_retries_then_applies() {
    let provider = MockProvider::new(vec![prose_page()]).block_page(0, 2);
    let mut engine = AnnotationEngine::new(
        provider,
        MockSurface::default(),
        EngineConfig::default(),
    );

    let response = submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    // Page 0 is not materialized yet; the request stays queued.
    assert!(matches!(response, EngineResponse::Queued(_)));

    // First retry still blocked, second succeeds.
    engine.handle(EngineCommand::AudioTick, 200);
    engine.handle(EngineCommand::AudioTick, 600);

    let completed = engine.take_completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].state, RequestState::Applied);
    assert!(!completed[0].matches.is_empty());
    assert!(engine.stats().requests_retried >= 2);
}

#[test]
fn exhausted_retries_fail_with_empty_result() {
    // Five refusals: the initial attempt plus every retry fails.
    let provider = MockProvider::new(vec![prose_page()]).block_page(0, 5);
    let mut engine = AnnotationEngine::new(
        provider,
        MockSurface::default(),
        EngineConfig::default(),
    );

    submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    // Drive ticks far past every retry window.
    for i in 1..20u64 {
        engine.handle(EngineCommand::AudioTick, i * 1_000);
    }

    let completed = engine.take_completed();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].state, RequestState::Failed);
    assert!(completed[0].matches.is_empty());
    // The queue keeps serving after the failure.
    let response = submit(
        &mut engine,
        &["ablation"],
        HighlightCategory::Quote,
        RequestMode::Merge,
        100_000,
    );
    assert!(matches!(response, EngineResponse::Completed(_)));
}

#[test]
fn malformed_requests_are_rejected_before_queueing() {
    let mut engine = engine_with(vec![prose_page()]);

    let response = submit(
        &mut engine,
        &["ab"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    assert!(matches!(response, EngineResponse::Rejected(_)));
    assert_eq!(engine.overlays().len(), 0);
}

#[test]
fn navigation_jumps_to_first_match() {
    let page0 = PageLayout::new(0, vec![frag(0, "nothing relevant here", 50.0, 100.0, 200.0)]);
    let mut page1 = prose_page();
    page1.page_index = 1;
    for fragment in &mut page1.fragments {
        fragment.page_index = 1;
    }
    let mut engine = engine_with(vec![page0, page1]);

    submit(
        &mut engine,
        &["transformer model"],
        HighlightCategory::Baseline,
        RequestMode::Replace,
        0,
    );
    assert_eq!(engine.provider().jumps.borrow().as_slice(), &[1]);
}

#[test]
fn circle_section_sets_active_section() {
    let page = PageLayout::new(
        0,
        vec![
            frag(0, "3.2 Ablation Study", 50.0, 100.0, 200.0),
            frag(0, "We remove each component in turn.", 50.0, 130.0, 250.0),
            frag(0, "4 Conclusion", 50.0, 300.0, 160.0),
        ],
    );
    let mut engine = engine_with(vec![page]);

    let region = engine.circle_section("Ablation Study", 0, 0).unwrap();
    assert!(region.top <= 100.0 + 1.0);
    assert!(region.bottom() < 300.0);

    let section = engine.active_section().unwrap();
    assert_eq!(section.page_index, 0);
    assert!(section.title.contains("Ablation"));

    // The circle was painted with the configured shape.
    assert!(engine
        .overlays()
        .live_overlays()
        .any(|o| o.kind == OverlayKind::Circle && o.style.shape == CircleShape::Ellipse));
}

//! Annotation engine facade
//!
//! One engine instance per document session. External events (agent tool
//! calls, transcript deltas, audio ticks) arrive as `EngineCommand` values
//! dispatched through `handle`; the engine classifies them into highlight
//! requests, serializes processing through the request queue, computes
//! target regions against the current layout snapshots, and paints through
//! the overlay store. All shared mutable state (keyword layers, pacing
//! state, the stepper, live overlays) is confined to the instance.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::layers::{KeywordLayers, LayerSource};
use crate::matcher::{IndexedPage, MatchResult, PhraseMatcher};
use crate::normalize::{self, canonicalize, fold_case};
use crate::overlay::{Overlay, OverlayStore, OverlaySurface};
use crate::pacing::{PacingDecision, PacingState, SemanticStepper};
use crate::regions::{RegionDetector, RegionKind};
use crate::sections::{self, Section};
use docent_layout::{LayoutProvider, PageLayout, Rect, RegionOcr};
use docent_scheduler::{
    CircleTarget, HighlightCategory, HighlightRequest, PhraseSpec, QueueConfig, RequestId,
    RequestMode, RequestQueue, RequestState, RetryBackoff,
};
use log::{debug, warn};

/// Commands accepted by the engine
///
/// A tagged-variant command enum replaces the event-bus dispatch of the
/// original system; every entry point funnels through `handle`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Submit keywords for highlighting
    SubmitHighlight {
        keywords: Vec<PhraseSpec>,
        category: HighlightCategory,
        mode: RequestMode,
    },

    /// Circle a printed label such as "Table 3"
    CircleLabel { label: String },

    /// Circle a section heading on a known page
    CircleSection { title: String, page_index: u16 },

    /// A speech-synchronized fragment from the narration stream
    SemanticFragment {
        text: String,
        page_hint: Option<u16>,
        similarity: f32,
    },

    /// Audio clock tick; drives pacing, word stepping, and the queue
    AudioTick,

    /// Update the dwell interval from the external pacing signal
    PaceConfig { dwell_ms: u64 },

    /// A new transcript item (full spoken turn) started
    TranscriptItem,

    /// Remove highlight and word overlays; circles stay
    ClearHighlights,

    /// Remove circle overlays; highlights stay
    ClearAnnotations,
}

/// Direct response to a handled command
#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    /// The request was enqueued; its completion arrives via `take_completed`
    Queued(RequestId),

    /// The request was processed synchronously
    Completed(CompletedRequest),

    /// The request was rejected before queueing
    Rejected(String),

    /// Decision of the semantic pacing gate
    Pacing(PacingDecision),

    /// Command applied; nothing further to report
    Ack,
}

/// Terminal record of a processed request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRequest {
    /// The request this completes
    pub id: RequestId,

    /// `Applied` or `Failed`
    pub state: RequestState,

    /// Matches for the request's own keywords, in document order
    pub matches: Vec<MatchResult>,

    /// Detected region box, for circle requests
    pub region: Option<Rect>,
}

/// Engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Requests processed and applied
    pub requests_applied: u64,

    /// Requests that failed with an empty result
    pub requests_failed: u64,

    /// Retry round-trips for requests suspended on an unavailable layout
    pub requests_retried: u64,

    /// Semantic fragments admitted by the pacing gate
    pub semantic_accepted: u64,

    /// Semantic fragments dropped (gate, duplicate, or low similarity)
    pub semantic_dropped: u64,

    /// Word-level emphasis steps performed
    pub words_stepped: u64,
}

struct ProcessOutcome {
    matches: Vec<MatchResult>,
    region: Option<Rect>,
}

/// The document annotation engine
///
/// Generic over the layout provider and overlay surface so hosts and tests
/// plug in their own collaborators. Single-owner, `&mut self`-driven: the
/// engine holds no threads and performs only short, non-blocking work per
/// command.
pub struct AnnotationEngine<P: LayoutProvider, S: OverlaySurface> {
    provider: P,
    surface: S,
    ocr: Option<Box<dyn RegionOcr>>,
    config: EngineConfig,
    matcher: PhraseMatcher,
    detector: RegionDetector,
    queue: RequestQueue,
    layers: KeywordLayers,
    pacing: PacingState,
    stepper: Option<SemanticStepper>,
    overlays: OverlayStore,
    active_section: Option<Section>,
    completed: Vec<CompletedRequest>,
    stats: EngineStats,
}

impl<P: LayoutProvider, S: OverlaySurface> AnnotationEngine<P, S> {
    /// Create an engine for one document session
    pub fn new(provider: P, surface: S, config: EngineConfig) -> Self {
        let queue = RequestQueue::with_config(QueueConfig {
            settle_delay_ms: config.settle_delay_ms,
            retry: RetryBackoff::new(config.retry_base_delay_ms, config.retry_max_attempts),
        });
        Self {
            provider,
            surface,
            ocr: None,
            matcher: PhraseMatcher::new(&config),
            detector: RegionDetector::new(&config),
            queue,
            layers: KeywordLayers::new(config.quote_cap, config.semantic_window),
            pacing: PacingState::new(&config),
            stepper: None,
            overlays: OverlayStore::new(),
            active_section: None,
            completed: Vec::new(),
            stats: EngineStats::default(),
            config,
        }
    }

    /// Attach the OCR region-detection capability
    pub fn with_ocr(mut self, ocr: Box<dyn RegionOcr>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Dispatch a command at the given host time
    pub fn handle(&mut self, command: EngineCommand, now_ms: u64) -> EngineResponse {
        match command {
            EngineCommand::SubmitHighlight {
                keywords,
                category,
                mode,
            } => self.submit_highlight_request(keywords, category, mode, now_ms),
            EngineCommand::CircleLabel { label } => {
                self.enqueue_and_pump(HighlightRequest::circle_label(label, now_ms), now_ms)
            }
            EngineCommand::CircleSection { title, page_index } => self.enqueue_and_pump(
                HighlightRequest::circle_section(title, page_index, now_ms),
                now_ms,
            ),
            EngineCommand::SemanticFragment {
                text,
                page_hint,
                similarity,
            } => self.on_semantic_fragment(&text, page_hint, similarity, now_ms),
            EngineCommand::AudioTick => self.on_audio_tick(now_ms),
            EngineCommand::PaceConfig { dwell_ms } => {
                self.on_pace_config(dwell_ms);
                EngineResponse::Ack
            }
            EngineCommand::TranscriptItem => {
                self.on_transcript_item();
                EngineResponse::Ack
            }
            EngineCommand::ClearHighlights => {
                self.clear_highlights();
                EngineResponse::Ack
            }
            EngineCommand::ClearAnnotations => {
                self.clear_annotations();
                EngineResponse::Ack
            }
        }
    }

    /// Submit a highlight request
    ///
    /// Unsearchable phrases are filtered out; a request with none left is
    /// rejected before queueing. Semantic submissions route through the
    /// pacing gate like any other narration fragment.
    pub fn submit_highlight_request(
        &mut self,
        keywords: Vec<PhraseSpec>,
        category: HighlightCategory,
        mode: RequestMode,
        now_ms: u64,
    ) -> EngineResponse {
        if category == HighlightCategory::Semantic {
            return match keywords.into_iter().next() {
                Some(phrase) => self.on_semantic_fragment(&phrase.text, None, 1.0, now_ms),
                None => EngineResponse::Rejected(
                    EngineError::MalformedRequest("no keywords".to_string()).to_string(),
                ),
            };
        }

        let keywords = self.searchable_keywords(keywords);
        if keywords.is_empty() {
            return EngineResponse::Rejected(
                EngineError::MalformedRequest("no searchable keywords".to_string()).to_string(),
            );
        }

        let request = match category {
            HighlightCategory::Baseline => HighlightRequest::baseline(keywords, mode, now_ms),
            HighlightCategory::Quote => HighlightRequest::quote(keywords, now_ms),
            HighlightCategory::Circle => {
                HighlightRequest::circle_label(keywords[0].text.clone(), now_ms)
            }
            HighlightCategory::Semantic => unreachable!("handled above"),
        };
        self.enqueue_and_pump(request, now_ms)
    }

    /// Circle a printed label; returns the region box when the request
    /// completed synchronously
    pub fn circle_label(&mut self, label: impl Into<String>, now_ms: u64) -> Option<Rect> {
        match self.handle(
            EngineCommand::CircleLabel {
                label: label.into(),
            },
            now_ms,
        ) {
            EngineResponse::Completed(completed) => completed.region,
            _ => None,
        }
    }

    /// Circle a section heading; returns the region box when the request
    /// completed synchronously
    pub fn circle_section(
        &mut self,
        title: impl Into<String>,
        page_index: u16,
        now_ms: u64,
    ) -> Option<Rect> {
        match self.handle(
            EngineCommand::CircleSection {
                title: title.into(),
                page_index,
            },
            now_ms,
        ) {
            EngineResponse::Completed(completed) => completed.region,
            _ => None,
        }
    }

    /// Offer a speech-synchronized fragment to the pacing gate
    pub fn on_semantic_fragment(
        &mut self,
        text: &str,
        page_hint: Option<u16>,
        similarity: f32,
        now_ms: u64,
    ) -> EngineResponse {
        if similarity < self.config.semantic_similarity_min {
            self.stats.semantic_dropped += 1;
            debug!("semantic fragment below similarity cutoff ({similarity:.2})");
            return EngineResponse::Pacing(PacingDecision::LowSimilarity);
        }

        let normalized: String = canonicalize(text).chars().map(fold_case).collect();
        if !normalize::is_searchable(&normalized) {
            return EngineResponse::Rejected(
                EngineError::MalformedRequest("fragment too short to search".to_string())
                    .to_string(),
            );
        }

        let decision = self.pacing.offer(&normalized, now_ms);
        match decision {
            PacingDecision::Accepted => {
                self.stats.semantic_accepted += 1;
                let request =
                    HighlightRequest::semantic(PhraseSpec::new(text), page_hint, now_ms);
                self.queue.submit(request);
                self.pump(now_ms);
            }
            _ => {
                self.stats.semantic_dropped += 1;
                debug!("semantic fragment dropped: {decision:?}");
            }
        }
        EngineResponse::Pacing(decision)
    }

    /// Advance the engine on an audio clock tick
    ///
    /// Ticks pump the request queue (the deferred-continuation analog) and
    /// drive word-level stepping.
    pub fn on_audio_tick(&mut self, now_ms: u64) -> EngineResponse {
        self.pump(now_ms);
        self.step_words(now_ms);
        EngineResponse::Ack
    }

    /// Update the dwell interval; returns the clamped value applied
    pub fn on_pace_config(&mut self, dwell_ms: u64) -> u64 {
        self.pacing.set_dwell_ms(dwell_ms)
    }

    /// A new transcript item started: reset semantic state
    ///
    /// The stepper and the sliding semantic window reset, and semantic and
    /// word overlays are removed. Baseline and quote layers, and their
    /// painted overlays, survive mid-conversation.
    pub fn on_transcript_item(&mut self) {
        self.stepper = None;
        self.layers.reset_semantic();
        self.overlays
            .clear_layer(&mut self.surface, LayerSource::Semantic);
        self.overlays.clear_words(&mut self.surface, None);
        debug!("transcript item: semantic state reset");
    }

    /// Remove highlight and word overlays; circles stay
    pub fn clear_highlights(&mut self) {
        self.overlays.clear_highlights(&mut self.surface);
    }

    /// Remove circle overlays; highlights stay
    pub fn clear_annotations(&mut self) {
        self.overlays.clear_annotations(&mut self.surface);
    }

    /// Process ready requests until the queue settles
    ///
    /// Serialization lives in the queue: one request is handed out at a
    /// time and the settle delay keeps consecutive paints apart. Hosts call
    /// this implicitly through every command; an explicit call after a
    /// quiet period is also fine.
    pub fn pump(&mut self, now_ms: u64) {
        while let Some((request, attempt)) = self.queue.next_ready(now_ms) {
            let id = request.id;
            match self.process_request(&request, now_ms) {
                Ok(outcome) => {
                    self.queue.complete(id, now_ms, true);
                    self.stats.requests_applied += 1;
                    self.completed.push(CompletedRequest {
                        id,
                        state: RequestState::Applied,
                        matches: outcome.matches,
                        region: outcome.region,
                    });
                }
                Err(EngineError::LayoutUnavailable(page)) => {
                    debug!("request {id} suspended: page {page} not materialized");
                    if self.queue.retry(request, attempt, now_ms) {
                        self.stats.requests_retried += 1;
                    } else {
                        self.stats.requests_failed += 1;
                        self.completed.push(CompletedRequest {
                            id,
                            state: RequestState::Failed,
                            matches: Vec::new(),
                            region: None,
                        });
                    }
                }
                Err(err) => {
                    warn!("request {id} failed: {err}");
                    self.queue.complete(id, now_ms, false);
                    self.stats.requests_failed += 1;
                    self.completed.push(CompletedRequest {
                        id,
                        state: RequestState::Failed,
                        matches: Vec::new(),
                        region: None,
                    });
                }
            }
        }
    }

    /// Drain completions accumulated by asynchronous pumping
    pub fn take_completed(&mut self) -> Vec<CompletedRequest> {
        std::mem::take(&mut self.completed)
    }

    /// Engine counters
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Live overlay state
    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    /// Keyword layer state
    pub fn layers(&self) -> &KeywordLayers {
        &self.layers
    }

    /// The section last circled, constraining semantic search
    pub fn active_section(&self) -> Option<&Section> {
        self.active_section.as_ref()
    }

    /// The layout provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The overlay surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn enqueue_and_pump(&mut self, request: HighlightRequest, now_ms: u64) -> EngineResponse {
        let id = self.queue.submit(request);
        self.pump(now_ms);
        match self.completed.iter().position(|c| c.id == id) {
            Some(pos) => EngineResponse::Completed(self.completed.remove(pos)),
            None => EngineResponse::Queued(id),
        }
    }

    fn searchable_keywords(&self, keywords: Vec<PhraseSpec>) -> Vec<PhraseSpec> {
        keywords
            .into_iter()
            .filter(|k| {
                let searchable = normalize::is_searchable(&canonicalize(&k.text));
                if !searchable {
                    warn!("dropping unsearchable phrase: {:?}", k.text);
                }
                searchable
            })
            .collect()
    }

    fn process_request(
        &mut self,
        request: &HighlightRequest,
        now_ms: u64,
    ) -> Result<ProcessOutcome, EngineError> {
        match request.category {
            HighlightCategory::Baseline => {
                if request.mode == RequestMode::Replace {
                    // A new topic supersedes everything transient, including
                    // in-flight semantic state.
                    self.overlays.clear_all(&mut self.surface);
                    self.layers.reset_semantic();
                    self.stepper = None;
                    self.layers.replace_baseline(request.keywords.clone());
                } else {
                    self.layers.merge_baseline(request.keywords.clone());
                }
                self.apply_layers(request)
            }
            HighlightCategory::Quote => {
                for keyword in &request.keywords {
                    self.layers.push_quote(keyword.clone());
                }
                self.apply_layers(request)
            }
            HighlightCategory::Semantic => self.process_semantic(request, now_ms),
            HighlightCategory::Circle => self.process_circle(request),
        }
    }

    /// Recombine the keyword layers, paint the union, and report matches
    /// for the request's own keywords
    fn apply_layers(&mut self, request: &HighlightRequest) -> Result<ProcessOutcome, EngineError> {
        let layouts = self.available_layouts();
        if layouts.is_empty() {
            return Err(EngineError::LayoutUnavailable(
                request.page_hint.unwrap_or(0),
            ));
        }

        let combined = self.layers.combined();
        let mut request_matches: Vec<MatchResult> = Vec::new();
        for layout in &layouts {
            let index = IndexedPage::build(layout);
            if index.is_empty() {
                continue;
            }
            for (phrase, source) in &combined {
                let matches = self.matcher.find_in_page(&index, phrase);
                for found in &matches {
                    for rect in &found.rects {
                        self.overlays.paint(
                            &mut self.surface,
                            Overlay::highlight(layout.page_index, *rect, *source),
                        );
                    }
                }
                if request
                    .keywords
                    .iter()
                    .any(|k| normalize::normalized_eq(&k.text, &phrase.text))
                {
                    request_matches.extend(matches);
                }
            }
        }

        request_matches.sort_by_key(|m| (m.page_index, m.start_offset));
        if let Some(first) = request_matches.first() {
            self.provider.jump_to_page(first.page_index);
            self.provider.scroll_into_view(first.page_index);
        }
        Ok(ProcessOutcome {
            matches: request_matches,
            region: None,
        })
    }

    fn process_semantic(
        &mut self,
        request: &HighlightRequest,
        now_ms: u64,
    ) -> Result<ProcessOutcome, EngineError> {
        let phrase = request.keywords.first().ok_or_else(|| {
            EngineError::MalformedRequest("semantic request without phrase".to_string())
        })?;
        self.layers.push_semantic(phrase.clone());

        // A hinted page is required; otherwise search the active section
        // first, then the rest of the document.
        let layouts = match request.page_hint {
            Some(page) => vec![self
                .provider
                .page_layout(page)
                .ok_or(EngineError::LayoutUnavailable(page))?],
            None => {
                let layouts = self.semantic_search_order();
                if layouts.is_empty() {
                    return Err(EngineError::LayoutUnavailable(0));
                }
                layouts
            }
        };

        for layout in &layouts {
            let index = IndexedPage::build(layout);
            if index.is_empty() {
                continue;
            }
            let matches = self.matcher.find_in_page(&index, phrase);
            let Some(best) = matches.first() else {
                continue;
            };

            for found in &matches {
                for rect in &found.rects {
                    self.overlays.paint(
                        &mut self.surface,
                        Overlay::highlight(layout.page_index, *rect, LayerSource::Semantic),
                    );
                }
            }

            self.build_stepper(&index, layout.page_index, best, now_ms);
            return Ok(ProcessOutcome {
                matches,
                region: None,
            });
        }

        debug!("semantic phrase not located: {:?}", phrase.text);
        Ok(ProcessOutcome {
            matches: Vec::new(),
            region: None,
        })
    }

    /// Expand a match to its sentence and start word-level stepping there
    fn build_stepper(
        &mut self,
        index: &IndexedPage,
        page_index: u16,
        best: &MatchResult,
        now_ms: u64,
    ) {
        let (start, end) =
            normalize::sentence_bounds(index.chars(), best.start_offset, best.end_offset);
        let mut words = Vec::new();
        let mut boxes = Vec::new();
        for (text, word_start, word_end) in normalize::words_in_range(index.chars(), start, end) {
            if let Some(bounds) =
                Rect::union_of(index.rects_for_span(word_start, word_end))
            {
                words.push(text);
                boxes.push(bounds);
            }
        }
        if words.is_empty() {
            return;
        }

        debug!("stepper over {} word(s) on page {page_index}", words.len());
        self.overlays.clear_words(&mut self.surface, None);
        let stepper = SemanticStepper::new(page_index, words, boxes, now_ms);
        if let Some((_, _, bounds)) = stepper.current() {
            self.overlays
                .paint(&mut self.surface, Overlay::word(page_index, bounds));
        }
        self.stepper = Some(stepper);
    }

    fn step_words(&mut self, now_ms: u64) {
        let step_interval =
            (self.pacing.dwell_ms() as f32 * self.config.word_step_fraction) as u64;

        let mut stepped: Option<(u16, Rect)> = None;
        let mut exhausted_page: Option<u16> = None;
        if let Some(stepper) = self.stepper.as_mut() {
            if stepper.advance(now_ms, step_interval).is_some() {
                if let Some((_, _, bounds)) = stepper.current() {
                    stepped = Some((stepper.page_index(), bounds));
                }
            } else if stepper.is_exhausted() {
                exhausted_page = Some(stepper.page_index());
            }
        }

        if let Some((page, bounds)) = stepped {
            self.overlays.clear_words(&mut self.surface, Some(page));
            self.overlays
                .paint(&mut self.surface, Overlay::word(page, bounds));
            self.stats.words_stepped += 1;
        }
        if let Some(page) = exhausted_page {
            self.stepper = None;
            self.overlays.clear_words(&mut self.surface, Some(page));
        }
    }

    fn process_circle(&mut self, request: &HighlightRequest) -> Result<ProcessOutcome, EngineError> {
        let target = request.circle_target.as_ref().ok_or_else(|| {
            EngineError::MalformedRequest("circle request without target".to_string())
        })?;
        match target {
            CircleTarget::Label(label) => self.circle_by_label(label),
            CircleTarget::Section { title, page_index } => {
                self.circle_by_section(title, *page_index)
            }
        }
    }

    fn circle_by_label(&mut self, label: &str) -> Result<ProcessOutcome, EngineError> {
        let layouts = self.available_layouts();
        if layouts.is_empty() {
            return Err(EngineError::LayoutUnavailable(0));
        }

        let spec = PhraseSpec::new(label);
        for layout in &layouts {
            let index = IndexedPage::build(layout);
            let matches = self.matcher.find_in_page(&index, &spec);
            // Topmost occurrence wins: matches come back in reading order.
            let Some(anchor_match) = matches.first() else {
                continue;
            };
            let Some(anchor) = anchor_match.bounds() else {
                continue;
            };

            let kind = RegionKind::from_label(label);
            let region = self
                .detector
                .detect(layout, anchor, kind, self.ocr.as_deref());
            let Some(region) = region else {
                debug!("{}", EngineError::RegionNotDetected(label.to_string()));
                return Ok(ProcessOutcome {
                    matches: vec![anchor_match.clone()],
                    region: None,
                });
            };

            self.overlays.paint(
                &mut self.surface,
                Overlay::circle(
                    layout.page_index,
                    region,
                    self.config.circle_shape,
                    self.config.circle_padding,
                ),
            );
            self.provider.jump_to_page(layout.page_index);
            self.provider.scroll_into_view(layout.page_index);
            return Ok(ProcessOutcome {
                matches: vec![anchor_match.clone()],
                region: Some(region),
            });
        }

        debug!("label not found on any materialized page: {label:?}");
        Ok(ProcessOutcome {
            matches: Vec::new(),
            region: None,
        })
    }

    fn circle_by_section(
        &mut self,
        title: &str,
        page_index: u16,
    ) -> Result<ProcessOutcome, EngineError> {
        let layout = self
            .provider
            .page_layout(page_index)
            .ok_or(EngineError::LayoutUnavailable(page_index))?;

        let section = self
            .outline_section(title, page_index, &layout)
            .or_else(|| sections::find_section(&layout, title, &self.config));
        let Some(section) = section else {
            debug!("section {title:?} not found on page {page_index}");
            return Ok(ProcessOutcome {
                matches: Vec::new(),
                region: None,
            });
        };

        let Some(region) = section.bounds().or_else(|| layout.content_bounds()) else {
            return Ok(ProcessOutcome {
                matches: Vec::new(),
                region: None,
            });
        };

        self.overlays.paint(
            &mut self.surface,
            Overlay::circle(
                page_index,
                region,
                self.config.circle_shape,
                self.config.circle_padding,
            ),
        );
        self.provider.jump_to_page(page_index);
        self.provider.scroll_into_view(page_index);
        self.active_section = Some(section);
        Ok(ProcessOutcome {
            matches: Vec::new(),
            region: Some(region),
        })
    }

    /// Resolve a section through the renderer's outline, when available
    fn outline_section(
        &self,
        title: &str,
        page_index: u16,
        layout: &PageLayout,
    ) -> Option<Section> {
        let entries = self.provider.outline()?;
        let wanted = canonicalize(title).to_lowercase();
        let entry = entries.iter().find(|e| {
            normalize::normalized_eq(&e.title, title)
                || e.title.to_lowercase().contains(&wanted)
        })?;

        let bounds = sections::find_section(layout, &entry.title, &self.config)
            .and_then(|s| s.bounds())
            .or_else(|| layout.content_bounds())?;
        Some(Section::single(entry.title.clone(), page_index, bounds))
    }

    /// Layouts for every materialized, non-empty page, in document order
    fn available_layouts(&self) -> Vec<PageLayout> {
        (0..self.provider.page_count())
            .filter_map(|p| self.provider.page_layout(p))
            .filter(|layout| !layout.is_empty())
            .collect()
    }

    /// Pages for unhinted semantic search: active section first
    fn semantic_search_order(&self) -> Vec<PageLayout> {
        let mut order: Vec<u16> = Vec::new();
        if let Some(section) = &self.active_section {
            order.extend(section.pages());
        }
        for page in 0..self.provider.page_count() {
            if !order.contains(&page) {
                order.push(page);
            }
        }
        order
            .into_iter()
            .filter_map(|p| self.provider.page_layout(p))
            .filter(|layout| !layout.is_empty())
            .collect()
    }
}

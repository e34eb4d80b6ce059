//! Docent annotation engine
//!
//! Core of the document annotation engine for a voice-driven tutoring
//! agent: tolerant phrase matching over virtualized page layouts, heuristic
//! region detection with an OCR-assisted fallback, serialized highlight
//! requests merged across keyword layers, and semantic highlights paced to
//! an external audio clock.
//!
//! The rendering collaborator stays behind the `LayoutProvider`,
//! `OverlaySurface`, and `RegionOcr` traits; all engine state is transient
//! and owned by one `AnnotationEngine` instance per document session.

pub mod config;
pub mod engine;
pub mod error;
pub mod layers;
pub mod matcher;
pub mod normalize;
pub mod overlay;
pub mod pacing;
pub mod regions;
pub mod sections;

pub use config::{EngineConfig, DEFAULT_DWELL_MS, MAX_DWELL_MS, MIN_DWELL_MS};
pub use engine::{
    AnnotationEngine, CompletedRequest, EngineCommand, EngineResponse, EngineStats,
};
pub use error::EngineError;
pub use layers::{KeywordLayers, LayerSource};
pub use matcher::{IndexedPage, MatchResult, PhraseMatcher};
pub use overlay::{
    CircleShape, DedupKey, Overlay, OverlayKind, OverlayStore, OverlayStyle, OverlaySurface,
};
pub use pacing::{PacingDecision, PacingState, SemanticStepper};
pub use regions::{
    AnchorFallbackStrategy, OcrStrategy, RegionContext, RegionDetector, RegionKind,
    RegionStrategy, StructuralStrategy,
};
pub use sections::{detect_headings, find_section, Heading, Section};

// Collaborator and request types hosts use alongside the engine.
pub use docent_layout::{
    LayoutProvider, OutlineEntry, PageLayout, Point, Rect, RegionOcr, TextFragment,
};
pub use docent_scheduler::{
    HighlightCategory, HighlightRequest, PhraseSpec, RequestId, RequestMode, RequestState,
};

//! From alignment hits to a resistance call.
//!
//! - [`classifier`]: Per-gene threshold classification
//! - [`confidence`]: Resistant and susceptible confidence scores
//! - [`treatment`]: Antibiotic recommendations for resistant samples
//! - [`narrative`]: Optional generated treatment notes
//! - [`engine`]: The [`Analyzer`] that runs the whole pipeline

pub mod classifier;
pub mod confidence;
pub mod engine;
pub mod narrative;
pub mod treatment;

pub use classifier::{Classification, ResistanceClassifier};
pub use engine::{AnalysisParams, Analyzer, DEFAULT_THRESHOLD};
pub use narrative::{ChatCompletionNarrator, NarrativeConfig, NarrativeError, NarrativeGenerator};
pub use treatment::TreatmentAdvisor;

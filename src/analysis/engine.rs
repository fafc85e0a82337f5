use std::path::Path;

use chrono::Utc;

use crate::alignment::{AlignParams, AlignmentEngine, BlastTool};
use crate::config::AnalyzerConfig;
use crate::core::alignment::{AlignmentResult, SequenceRecord};
use crate::core::result::ResistanceAnalysisResult;
use crate::error::AnalysisError;
use crate::observer::AnalysisObserver;
use crate::registry::{GeneIdentifier, GeneRegistry, ReferenceDatabase};

use super::classifier::ResistanceClassifier;
use super::confidence::{resistant_confidence, susceptible_confidence};
use super::narrative::{ChatCompletionNarrator, NarrativeGenerator};
use super::treatment::TreatmentAdvisor;

/// Default generic 0-1 threshold; accepted but not used for classification
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Sample id when there are no alignment results
const UNKNOWN_SAMPLE: &str = "unknown";

/// Per-request parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub align: AlignParams,
    /// Generic threshold; classification uses the per-gene thresholds instead
    pub threshold: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            align: AlignParams::default(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Runs the full pipeline: alignment, classification, confidence, treatment.
///
/// Immutable once built; share it behind an `Arc`.
pub struct Analyzer {
    registry: GeneRegistry,
    engine: AlignmentEngine,
    narrator: Option<Box<dyn NarrativeGenerator>>,
}

impl Analyzer {
    #[must_use]
    pub fn new(registry: GeneRegistry, engine: AlignmentEngine) -> Self {
        Self {
            registry,
            engine,
            narrator: None,
        }
    }

    /// Analyzer over the built-in registry.
    ///
    /// A narrator that cannot be built is logged and left out.
    #[must_use]
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let tool = BlastTool::new(&config.blastn).with_blastdbcmd(&config.blastdbcmd);
        let engine = AlignmentEngine::new(ReferenceDatabase::new(&config.db_dir), tool);
        let analyzer = Self::new(GeneRegistry::builtin(), engine);

        match &config.narrative {
            Some(narrative) => match ChatCompletionNarrator::new(narrative.clone()) {
                Ok(narrator) => analyzer.with_narrator(Box::new(narrator)),
                Err(e) => {
                    tracing::warn!("Narrative generation disabled: {e}");
                    analyzer
                }
            },
            None => analyzer,
        }
    }

    #[must_use]
    pub fn with_narrator(mut self, narrator: Box<dyn NarrativeGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    #[must_use]
    pub fn registry(&self) -> &GeneRegistry {
        &self.registry
    }

    #[must_use]
    pub fn engine(&self) -> &AlignmentEngine {
        &self.engine
    }

    #[must_use]
    pub fn has_narrator(&self) -> bool {
        self.narrator.is_some()
    }

    /// Analyze a query FASTA file.
    ///
    /// # Errors
    ///
    /// Any [`AnalysisError`]; see [`AlignmentEngine::align`] and [`Self::analyze_results`].
    pub fn analyze_file(
        &self,
        path: &Path,
        params: AnalysisParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<ResistanceAnalysisResult, AnalysisError> {
        observer.threshold_ignored(params.threshold);
        let results = self.engine.align_file(path, params.align, observer)?;
        self.analyze_results(&results, observer)
    }

    /// Analyze in-memory query records
    ///
    /// # Errors
    ///
    /// Any [`AnalysisError`]; see [`AlignmentEngine::align`] and [`Self::analyze_results`].
    pub fn analyze_sequences(
        &self,
        queries: &[SequenceRecord],
        params: AnalysisParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<ResistanceAnalysisResult, AnalysisError> {
        observer.threshold_ignored(params.threshold);
        let results = self.engine.align(queries, params.align, observer)?;
        self.analyze_results(&results, observer)
    }

    /// Classify existing alignment results and score them.
    ///
    /// The sample is named after the last result's query. The first result is
    /// the primary one and supplies the query length and hit set for scoring.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Classification`] if an identified gene has no
    /// registry entry.
    pub fn analyze_results(
        &self,
        results: &[AlignmentResult],
        observer: &dyn AnalysisObserver,
    ) -> Result<ResistanceAnalysisResult, AnalysisError> {
        let primary = results.first();
        let sample_id = results
            .last()
            .map_or(UNKNOWN_SAMPLE, |r| r.query_id.as_str())
            .to_string();

        let classification = ResistanceClassifier::new(&self.registry).classify(results, observer);

        let (confidence_score, treatment_recommendations) = if classification.status.is_resistant() {
            let query_length = primary.map_or(0, |r| r.query_length);
            let confidence = resistant_confidence(
                &classification.matching_regions,
                classification.identified_genes.len(),
                query_length,
            );
            let advisor = TreatmentAdvisor::new(&self.registry, self.narrator.as_deref());
            let treatment = advisor.recommend(&classification.identified_genes, observer)?;
            (confidence, Some(treatment))
        } else {
            let identifier = GeneIdentifier::new(&self.registry);
            (susceptible_confidence(primary, &identifier), None)
        };

        observer.analysis_complete(&sample_id, classification.status, confidence_score);

        Ok(ResistanceAnalysisResult {
            sample_id,
            resistance_status: classification.status,
            confidence_score,
            matching_regions: classification.matching_regions,
            identified_genes: classification.identified_genes,
            treatment_recommendations,
            analysis_timestamp: Utc::now(),
        })
    }
}

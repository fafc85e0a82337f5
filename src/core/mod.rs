//! Core data types for resistance gene detection.
//!
//! - [`SequenceRecord`]: A query or reference sequence read from FASTA
//! - [`AlignmentHit`], [`AlignmentResult`]: Raw alignment evidence per query
//! - [`ReferenceGeneEntry`]: A known resistance gene with its calibration threshold
//! - [`MatchingRegion`], [`TreatmentRecommendation`], [`ResistanceAnalysisResult`]:
//!   Classification output
//! - [`ResistanceStatus`], [`ResistanceMechanism`], [`StrategyKind`]: Enumerations
//!
//! ## Coordinates
//!
//! All alignment coordinates are 1-based and inclusive, matching `blastn`
//! tabular output, regardless of which alignment strategy produced them.
//!
//! [`SequenceRecord`]: alignment::SequenceRecord
//! [`AlignmentHit`]: alignment::AlignmentHit
//! [`AlignmentResult`]: alignment::AlignmentResult
//! [`ReferenceGeneEntry`]: gene::ReferenceGeneEntry
//! [`MatchingRegion`]: result::MatchingRegion
//! [`TreatmentRecommendation`]: result::TreatmentRecommendation
//! [`ResistanceAnalysisResult`]: result::ResistanceAnalysisResult
//! [`ResistanceStatus`]: types::ResistanceStatus
//! [`ResistanceMechanism`]: types::ResistanceMechanism
//! [`StrategyKind`]: types::StrategyKind

pub mod alignment;
pub mod gene;
pub mod result;
pub mod types;

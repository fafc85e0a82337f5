//! # amr-caller
//!
//! A library for detecting antibiotic resistance genes in bacterial DNA sequences.
//!
//! A query sequence (a gene, contigs or a whole assembly) is aligned against a curated
//! set of resistance gene references. Hits are attributed to known genes, filtered by
//! per-gene identity thresholds, and turned into a resistant/susceptible call with a
//! calibrated confidence score and antibiotic guidance.
//!
//! ## Features
//!
//! - **Two alignment strategies**: `blastn` against a pre-built index, or an in-process
//!   affine-gap local aligner over the reference FASTA when no index exists
//! - **Automatic fallback**: a failing `blastn` is retried once with the local aligner
//! - **Noisy identifier resolution**: `mecA_X52593.1`, `X52593.1_ermA_variant` and `tetK`
//!   all resolve to registry symbols
//! - **Calibrated confidence**: separate scoring for resistant and susceptible calls
//! - **Treatment guidance**: antibiotics to prefer and avoid, with optional generated notes
//!
//! ## Example
//!
//! ```rust,no_run
//! use amr_caller::analysis::{AnalysisParams, Analyzer};
//! use amr_caller::config::AnalyzerConfig;
//! use amr_caller::observer::TracingObserver;
//! use std::path::Path;
//!
//! let analyzer = Analyzer::from_config(&AnalyzerConfig::new("database/blast_db"));
//! let result = analyzer
//!     .analyze_file(Path::new("isolate.fasta"), AnalysisParams::default(), &TracingObserver)
//!     .unwrap();
//!
//! println!("{}: {} ({:.1}%)", result.sample_id, result.resistance_status, result.confidence_score);
//! for gene in &result.identified_genes {
//!     println!("  {gene}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`alignment`]: Alignment strategies and the engine that picks between them
//! - [`analysis`]: Classification, confidence scoring and treatment advice
//! - [`registry`]: Known resistance genes and the reference database on disk
//! - [`core`]: Core data types for hits, genes and results
//! - [`parsing`]: FASTA and BLAST tabular I/O
//! - [`observer`]: Observability sink injected into the analysis core
//! - [`cli`]: Command-line interface implementation
//! - [`web`]: HTTP API

pub mod alignment;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod observer;
pub mod parsing;
pub mod registry;
pub mod utils;
pub mod web;

// Re-export commonly used types for convenience
pub use alignment::{AlignParams, AlignmentEngine, AlignmentStrategy};
pub use analysis::{AnalysisParams, Analyzer};
pub use config::AnalyzerConfig;
pub use core::alignment::{AlignmentHit, AlignmentResult, SequenceRecord};
pub use core::result::{MatchingRegion, ResistanceAnalysisResult, TreatmentRecommendation};
pub use core::types::*;
pub use error::AnalysisError;
pub use registry::{GeneIdentifier, GeneRegistry};

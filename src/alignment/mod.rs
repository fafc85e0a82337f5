//! Alignment of query sequences against the reference resistance gene set.
//!
//! Two interchangeable strategies sit behind [`AlignmentStrategy`]:
//!
//! - [`AlignmentStrategy::External`]: `blastn` against the pre-built index
//! - [`AlignmentStrategy::Local`]: the in-process [`LocalAligner`] over the raw FASTA
//!
//! [`AlignmentEngine`] picks one per call from what exists on disk, and retries
//! once with the local aligner when the external tool fails.

pub mod external;
pub mod local;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use external::{BlastTool, ExternalToolError};
pub use local::{LocalAligner, MIN_PERCENT_IDENTITY, PLACEHOLDER_EVALUE};

use crate::core::alignment::{AlignmentResult, SequenceRecord};
use crate::core::types::StrategyKind;
use crate::error::AnalysisError;
use crate::observer::AnalysisObserver;
use crate::parsing::fasta::read_fasta_file;
use crate::parsing::ParseError;
use crate::registry::ReferenceDatabase;

/// Default e-value cutoff passed to `blastn`
pub const DEFAULT_EVALUE: f64 = 1e-10;

/// Default number of hits kept per query
pub const DEFAULT_MAX_HITS: usize = 10;

/// Search parameters shared by both strategies.
///
/// The local aligner cannot compute e-values and ignores `evalue`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignParams {
    pub evalue: f64,
    pub max_hits: usize,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            evalue: DEFAULT_EVALUE,
            max_hits: DEFAULT_MAX_HITS,
        }
    }
}

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error(transparent)]
    External(#[from] ExternalToolError),

    #[error("Cannot load reference sequences: {0}")]
    References(#[from] ParseError),
}

/// One way of producing alignment hits
#[derive(Debug, Clone)]
pub enum AlignmentStrategy {
    External { tool: BlastTool, index_prefix: PathBuf },
    Local { aligner: LocalAligner, database: ReferenceDatabase },
}

impl AlignmentStrategy {
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::External { .. } => StrategyKind::External,
            Self::Local { .. } => StrategyKind::Local,
        }
    }

    /// Align every query against the reference set, one result per query in input order
    ///
    /// # Errors
    ///
    /// Returns an error if the external tool fails or the reference FASTA cannot be read.
    pub fn produce(
        &self,
        queries: &[SequenceRecord],
        params: AlignParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<Vec<AlignmentResult>, StrategyError> {
        match self {
            Self::External { tool, index_prefix } => Ok(tool.search(
                queries,
                index_prefix,
                params.evalue,
                params.max_hits,
                observer,
            )?),
            Self::Local { aligner, database } => {
                let references = database.load_sequences()?;
                Ok(aligner.align(queries, &references, params.max_hits))
            }
        }
    }
}

/// Chooses and runs an [`AlignmentStrategy`] for each request
#[derive(Debug, Clone)]
pub struct AlignmentEngine {
    database: ReferenceDatabase,
    tool: BlastTool,
    aligner: LocalAligner,
}

impl AlignmentEngine {
    #[must_use]
    pub fn new(database: ReferenceDatabase, tool: BlastTool) -> Self {
        Self {
            database,
            tool,
            aligner: LocalAligner::new(),
        }
    }

    #[must_use]
    pub fn database(&self) -> &ReferenceDatabase {
        &self.database
    }

    fn external(&self) -> AlignmentStrategy {
        AlignmentStrategy::External {
            tool: self.tool.clone(),
            index_prefix: self.database.index_prefix(),
        }
    }

    fn local(&self) -> AlignmentStrategy {
        AlignmentStrategy::Local {
            aligner: self.aligner.clone(),
            database: self.database.clone(),
        }
    }

    /// Strategy for the current state of the database directory, with the reason
    /// it was chosen; `None` if there is no reference data at all
    #[must_use]
    pub fn select_strategy(&self) -> Option<(AlignmentStrategy, &'static str)> {
        if self.database.has_index() {
            Some((self.external(), "reference index found"))
        } else if self.database.has_fasta() {
            Some((self.local(), "no reference index, aligning against FASTA"))
        } else {
            None
        }
    }

    /// Align in-memory query records.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::InputFormat`] if there are no queries or any query is empty
    /// - [`AnalysisError::ReferenceUnavailable`] if neither index nor FASTA exists
    /// - [`AnalysisError::AlignmentFailure`] if every attempted strategy failed
    pub fn align(
        &self,
        queries: &[SequenceRecord],
        params: AlignParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<Vec<AlignmentResult>, AnalysisError> {
        if queries.is_empty() {
            return Err(AnalysisError::InputFormat(
                "no query sequences provided".to_string(),
            ));
        }
        if let Some(empty) = queries.iter().find(|q| q.is_empty()) {
            return Err(AnalysisError::InputFormat(format!(
                "query sequence '{}' is empty",
                empty.id
            )));
        }

        let Some((strategy, reason)) = self.select_strategy() else {
            return Err(AnalysisError::ReferenceUnavailable(
                self.database.dir().to_path_buf(),
            ));
        };
        observer.strategy_selected(strategy.kind(), reason);

        let (results, used) = match strategy.produce(queries, params, observer) {
            Ok(results) => (results, strategy.kind()),
            Err(e) => {
                observer.strategy_failed(strategy.kind(), &e.to_string());
                let results = self.fall_back(&strategy, &e, queries, params, observer)?;
                (results, StrategyKind::Local)
            }
        };

        for result in &results {
            observer.alignment_complete(&result.query_id, result.hits.len(), used);
        }
        Ok(results)
    }

    /// Single retry with the local aligner after the external tool failed
    fn fall_back(
        &self,
        failed: &AlignmentStrategy,
        cause: &StrategyError,
        queries: &[SequenceRecord],
        params: AlignParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<Vec<AlignmentResult>, AnalysisError> {
        if failed.kind() == StrategyKind::Local {
            return Err(AnalysisError::AlignmentFailure(cause.to_string()));
        }
        if !self.database.has_fasta() {
            return Err(AnalysisError::AlignmentFailure(format!(
                "{cause}; no reference FASTA for the local aligner"
            )));
        }

        let local = self.local();
        observer.strategy_selected(local.kind(), "falling back after blastn failure");
        local.produce(queries, params, observer).map_err(|e| {
            observer.strategy_failed(local.kind(), &e.to_string());
            AnalysisError::AlignmentFailure(format!("{cause}; local aligner: {e}"))
        })
    }

    /// Read a query FASTA (plain or gzipped) and align it
    ///
    /// # Errors
    ///
    /// As [`Self::align`]; an unreadable or empty file is [`AnalysisError::InputFormat`].
    pub fn align_file(
        &self,
        path: &Path,
        params: AlignParams,
        observer: &dyn AnalysisObserver,
    ) -> Result<Vec<AlignmentResult>, AnalysisError> {
        let queries = read_fasta_file(path)?;
        self.align(&queries, params, observer)
    }

    /// Identifiers of every reference sequence.
    ///
    /// Reads the FASTA when present, otherwise asks `blastdbcmd`. Returns an
    /// empty list when neither source is usable.
    #[must_use]
    pub fn reference_ids(&self, observer: &dyn AnalysisObserver) -> Vec<String> {
        if self.database.has_fasta() {
            match self.database.fasta_ids() {
                Ok(ids) => return ids,
                Err(e) => observer.reference_listing_failed("reference FASTA", &e.to_string()),
            }
        }
        if self.database.has_index() {
            match self.tool.list_entries(&self.database.index_prefix()) {
                Ok(ids) => return ids,
                Err(e) => observer.reference_listing_failed("blastdbcmd", &e.to_string()),
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use crate::observer::NullObserver;
    use tempfile::TempDir;

    const GENE: &str = "ATGAAAAAGATAAAAATTGTTCCACTTATTTTAATAGTTGTAGTTGTCGGGTTTGGTATATATTTTTATGCTTCAAAAGATAAAGAAATTAATAATACTATTGATGCAATTGAAGATAAAAATTTCAAACAAGTTTATAAAGATAGCAGTTATATTTCTAAAAGCGATAATGGTGAAGTAGAAATGACTGAACGTCCGATAAAAATATATAATAGTTTAGGCGTTAAAGATATAAACATTCAGGATCGTAAAATAAAAAAAGTATCTAAAAATAAAAAACGAGTAGATGCTCAATATAAAATTAAAACAAACTACGGTAACATTGATCGCAACGTTCAATTTAATTTTGTTAAAGAAGATGGTATGTGGAAGTTAGATTGGGATCATAGCGTCATTATTCCAGGAATGCAGAAAGACCAAAGCATACATATTGAAAATTTAAAATCAGAACGTGGTAAAATTTTAGACCGAAACAATGTGGAATTGGCCAATACAGGAACAGCATATGAGATAGGCATCGTTCCAAAGAATGTATCTAAAAAAGATTATAAAGCAATCGCTAAAGAACTAAGTATTTCTGAAGACTATATCAAACAACAAATGGATCAAAATTGGGTACAAGATGATACCTTCGTTCCACTTAAAACCGTTAAAAAAATGGATGAATATTTAAGTGATTTCGCAAAAAAATTTCATCTTACAACTAATGAAACAGAAAGTCGTAACTATCCTCTAGAAAAAGCGACTTCACATCTATTAGGTTATGTTGGTCCCATTAACTCTGAAGAATTAAAACAAAAAGAATATAAAGGCTATAAAGATGATGCAGTTATTGGTAAAAAGGGACTCGAAAAACTTTACGATAAAAAGCTCCAACATGAAGATGGCTATCGTGTCACAATCGTTGACGATAATAGCAATACAATCGCACATACATTAATAGAGAAAAAGAAAAAAGATGGCAAAGATATTCAACTAACTATTGATGCTAAAGTTCAAAAGAGTATTTATAACAACATGAAAAATGATTATGGCTCAGGTACTGCTATCCACCCTCAAACAGGTGAATTATTAGCACTTGTAAGCACACCTTCATATGACGTCTATCCATTTATGTATGGCATGAGTAACGAAGAATATAATAAATTAACCGAAGATAAAAAAGAACCTCTGCTCAACAAGTTCCAGATTACAACTTCACCAGGTTCAACTCAAAAAATATTAACAGCAATGATTGGGTTAAATAACAAAACATTAGACGATAAAACAAGTTATAAAATCGATGGTAAAGGTTGGCAAAAAGATAAATCTTGGGGTGGTTACAACGTTACAAGATATGAAGTGGTAAATGGTAATATCGACTTAAAACAAGCAATAGAATCATCAGATAACATTTTCTTTGCTAGAGTAGCACTCGAATTAGGCAGTAAGAAATTTGAAAAAGGCATGAAAAAACTAGGTGTTGGTGAAGATATACCAAGTGATTATCCATTTTATAATGCTCAAATTTCAAACAAAAATTTAGATAATGAAATATTATTAGCTGATTCAGGTTACGGACAAGGTGAAATACTGATTAACCCAGTACAGATCCTTTCAATCTATAGCGCATTAGAAAATAATGGCAATATTAACGCACCTCACTTATTAAAAGACACGAAAAACAAAGTTTGGAAGAAAAATATTATTTCCAAAGAAAATATCAATCTATTAACTGATGGTATGCAACAAGTCGTAAATAAAACACATAAAGAAGATATTTATAGATCTTATGCAAACTTAATTGGCAAATCCGGTACTGCAGAACTCAAAATGAAACAAGGAGAAACTGGCAGACAAATTGGGTGGTTTATATCATATGATAAAGATAATCCAAACATGATGATGGCTATTAATGTTAAAGATGTACAAGATAAAGGAATGGCTAGCTACAATGCCAAAATCTCAGGTAAAGTGTATGATGAGCTATATGAGAACGGTAATAAAAAATACGATATAGATGAATAA";

    fn write_reference(dir: &Path) {
        std::fs::write(
            dir.join("resistance_genes.fasta"),
            format!(">mecA_X52593.1\n{GENE}\n"),
        )
        .unwrap();
    }

    fn query() -> Vec<SequenceRecord> {
        let sequence = format!("CCGGCCGGCCGG{GENE}GGCCGGCCGGCC");
        vec![SequenceRecord::new("sample1", sequence.as_bytes())]
    }

    #[test]
    fn test_no_reference_data() {
        let dir = TempDir::new().unwrap();
        let engine = AlignmentEngine::new(ReferenceDatabase::new(dir.path()), BlastTool::default());

        assert!(engine.select_strategy().is_none());
        let err = engine
            .align(&query(), AlignParams::default(), &NullObserver)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ReferenceUnavailable(_)));
        assert!(engine.reference_ids(&NullObserver).is_empty());
    }

    #[test]
    fn test_empty_queries_rejected() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());
        let engine = AlignmentEngine::new(ReferenceDatabase::new(dir.path()), BlastTool::default());

        let err = engine
            .align(&[], AlignParams::default(), &NullObserver)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InputFormat(_)));

        let err = engine
            .align(
                &[SequenceRecord::new("blank", b"")],
                AlignParams::default(),
                &NullObserver,
            )
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InputFormat(_)));
    }

    #[test]
    fn test_local_strategy_without_index() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());
        let engine = AlignmentEngine::new(ReferenceDatabase::new(dir.path()), BlastTool::default());
        let observer = RecordingObserver::default();

        let results = engine
            .align(&query(), AlignParams::default(), &observer)
            .unwrap();
        assert_eq!(observer.events(), vec!["selected:Local"]);
        assert_eq!(results.len(), 1);
        let hit = &results[0].hits[0];
        assert_eq!(hit.subject_id, "mecA_X52593.1");
        assert!((hit.percent_identity - 100.0).abs() < f64::EPSILON);
        assert_eq!(hit.query_start, 13);
        assert_eq!(engine.reference_ids(&NullObserver), vec!["mecA_X52593.1"]);
    }

    #[test]
    fn test_falls_back_when_blastn_missing() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());
        std::fs::write(dir.path().join("resistance_genes.nin"), b"").unwrap();
        let engine = AlignmentEngine::new(
            ReferenceDatabase::new(dir.path()),
            BlastTool::new("/nonexistent/bin/blastn"),
        );
        let observer = RecordingObserver::default();

        let results = engine
            .align(&query(), AlignParams::default(), &observer)
            .unwrap();
        assert_eq!(
            observer.events(),
            vec!["selected:External", "failed:External", "selected:Local"]
        );
        assert_eq!(results[0].hits[0].subject_id, "mecA_X52593.1");
    }

    /// Stand-in `blastn` that reports one hit under a renamed query
    #[cfg(unix)]
    fn renaming_blastn(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("blastn");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             while [ $# -gt 0 ]; do\n\
               if [ \"$1\" = \"-out\" ]; then out=\"$2\"; fi\n\
               shift\n\
             done\n\
             printf 'lcl|sample1\\tmecA_X52593.1\\t100.000\\t2007\\t0\\t0\\t13\\t2019\\t1\\t2007\\t0.0\\t3707\\n' > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[test]
    fn test_falls_back_when_blastn_hits_match_no_query() {
        let dir = TempDir::new().unwrap();
        write_reference(dir.path());
        std::fs::write(dir.path().join("resistance_genes.nin"), b"").unwrap();
        let engine = AlignmentEngine::new(
            ReferenceDatabase::new(dir.path()),
            BlastTool::new(renaming_blastn(dir.path())),
        );
        let observer = RecordingObserver::default();

        let results = engine
            .align(&query(), AlignParams::default(), &observer)
            .unwrap();
        assert_eq!(
            observer.events(),
            vec!["selected:External", "failed:External", "selected:Local"]
        );
        assert_eq!(results[0].query_id, "sample1");
        assert_eq!(results[0].hits[0].subject_id, "mecA_X52593.1");
    }

    #[test]
    fn test_failure_without_fallback_data() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("resistance_genes.nsq"), b"").unwrap();
        let engine = AlignmentEngine::new(
            ReferenceDatabase::new(dir.path()),
            BlastTool::new("/nonexistent/bin/blastn"),
        );

        let err = engine
            .align(&query(), AlignParams::default(), &NullObserver)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::AlignmentFailure(_)));
    }
}

use std::path::PathBuf;

use crate::alignment::external::{DEFAULT_BLASTDBCMD, DEFAULT_BLASTN};
use crate::analysis::narrative::NarrativeConfig;
use crate::registry::reference_db::DEFAULT_DB_DIR;

/// Everything needed to build an [`Analyzer`](crate::analysis::Analyzer)
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Directory holding `resistance_genes.fasta` and/or its blastn index
    pub db_dir: PathBuf,
    pub blastn: PathBuf,
    pub blastdbcmd: PathBuf,
    /// `None` disables generated treatment notes
    pub narrative: Option<NarrativeConfig>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from(DEFAULT_DB_DIR),
            blastn: PathBuf::from(DEFAULT_BLASTN),
            blastdbcmd: PathBuf::from(DEFAULT_BLASTDBCMD),
            narrative: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn new(db_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_dir: db_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_blastn(mut self, blastn: impl Into<PathBuf>) -> Self {
        self.blastn = blastn.into();
        self
    }

    #[must_use]
    pub fn with_blastdbcmd(mut self, blastdbcmd: impl Into<PathBuf>) -> Self {
        self.blastdbcmd = blastdbcmd.into();
        self
    }

    #[must_use]
    pub fn with_narrative(mut self, narrative: Option<NarrativeConfig>) -> Self {
        self.narrative = narrative;
        self
    }
}

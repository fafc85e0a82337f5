//! `blastn` / `blastdbcmd` invocation against the pre-built reference index.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::core::alignment::{AlignmentHit, AlignmentResult, SequenceRecord};
use crate::observer::AnalysisObserver;
use crate::parsing::blast::{parse_blast_file, BLAST_OUTFMT};
use crate::parsing::fasta::write_fasta;
use crate::parsing::ParseError;

/// Default `blastn` executable, resolved through `PATH`
pub const DEFAULT_BLASTN: &str = "blastn";

/// Default `blastdbcmd` executable, resolved through `PATH`
pub const DEFAULT_BLASTDBCMD: &str = "blastdbcmd";

#[derive(Error, Debug)]
pub enum ExternalToolError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Exit {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    /// Every hit named a query that is not in the input
    #[error("blastn hits matched no input query (reported: {})", .0.join(", "))]
    UnmatchedQueries(Vec<String>),

    #[error("Temporary file error: {0}")]
    TempFile(#[from] std::io::Error),

    #[error("Unreadable tool output: {0}")]
    Output(#[from] ParseError),
}

/// Locations of the BLAST+ executables
#[derive(Debug, Clone)]
pub struct BlastTool {
    pub blastn: PathBuf,
    pub blastdbcmd: PathBuf,
}

impl Default for BlastTool {
    fn default() -> Self {
        Self {
            blastn: PathBuf::from(DEFAULT_BLASTN),
            blastdbcmd: PathBuf::from(DEFAULT_BLASTDBCMD),
        }
    }
}

impl BlastTool {
    pub fn new(blastn: impl Into<PathBuf>) -> Self {
        Self {
            blastn: blastn.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_blastdbcmd(mut self, blastdbcmd: impl Into<PathBuf>) -> Self {
        self.blastdbcmd = blastdbcmd.into();
        self
    }

    /// Run `blastn` for all queries in one invocation.
    ///
    /// The query FASTA and the tabular output live in temporary files removed on
    /// every exit path. Results come back one per query in input order; queries
    /// without hits get an empty result.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be spawned, exits non-zero, writes
    /// output that does not parse, or reports hits only for unknown queries.
    pub fn search(
        &self,
        queries: &[SequenceRecord],
        index_prefix: &Path,
        evalue: f64,
        max_hits: usize,
        observer: &dyn AnalysisObserver,
    ) -> Result<Vec<AlignmentResult>, ExternalToolError> {
        let query_file = NamedTempFile::new()?;
        {
            let mut writer = BufWriter::new(query_file.as_file());
            write_fasta(&mut writer, queries)?;
            writer.flush()?;
        }
        let output_file = NamedTempFile::new()?;

        let output = Command::new(&self.blastn)
            .arg("-query")
            .arg(query_file.path())
            .arg("-db")
            .arg(index_prefix)
            .args(["-evalue", &evalue.to_string()])
            .args(["-max_target_seqs", &max_hits.to_string()])
            .args(["-outfmt", BLAST_OUTFMT])
            .arg("-out")
            .arg(output_file.path())
            .output()
            .map_err(|source| ExternalToolError::Spawn {
                tool: self.blastn.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalToolError::Exit {
                tool: self.blastn.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let hits = parse_blast_file(output_file.path())?;
        group_by_query(queries, hits, max_hits, observer)
    }

    /// List every sequence accession in the index via `blastdbcmd`
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be spawned or exits non-zero.
    pub fn list_entries(&self, index_prefix: &Path) -> Result<Vec<String>, ExternalToolError> {
        let output = Command::new(&self.blastdbcmd)
            .arg("-db")
            .arg(index_prefix)
            .args(["-entry", "all", "-outfmt", "%a"])
            .output()
            .map_err(|source| ExternalToolError::Spawn {
                tool: self.blastdbcmd.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExternalToolError::Exit {
                tool: self.blastdbcmd.display().to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Distribute hits to their queries, preserving query order and hit order.
///
/// Hits for query names not in the input are reported to the observer. If no
/// hit matches any input query the output is unusable and this fails.
fn group_by_query(
    queries: &[SequenceRecord],
    hits: Vec<AlignmentHit>,
    max_hits: usize,
    observer: &dyn AnalysisObserver,
) -> Result<Vec<AlignmentResult>, ExternalToolError> {
    let mut results: Vec<AlignmentResult> = queries
        .iter()
        .map(|query| AlignmentResult::new(&query.id, query.len() as u64))
        .collect();
    let mut matched = 0usize;
    let mut unmatched: Vec<(String, usize)> = Vec::new();

    for hit in hits {
        if let Some(result) = results.iter_mut().find(|r| r.query_id == hit.query_id) {
            matched += 1;
            if result.hits.len() < max_hits {
                result.hits.push(hit);
            }
        } else if let Some((_, count)) = unmatched.iter_mut().find(|(id, _)| *id == hit.query_id) {
            *count += 1;
        } else {
            unmatched.push((hit.query_id, 1));
        }
    }

    if matched == 0 && !unmatched.is_empty() {
        return Err(ExternalToolError::UnmatchedQueries(
            unmatched.into_iter().map(|(id, _)| id).collect(),
        ));
    }
    for (query_id, count) in &unmatched {
        observer.hits_dropped(query_id, *count);
    }

    Ok(results)
}

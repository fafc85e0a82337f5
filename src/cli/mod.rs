//! Command-line interface for amr-caller.
//!
//! Available commands:
//!
//! - **analyze**: Call antibiotic resistance for a query FASTA
//! - **align**: Report raw alignment hits against the reference gene set
//! - **genes**: List the known resistance genes and reference records
//! - **serve**: Start the HTTP API
//!
//! ## Usage
//!
//! ```text
//! # Resistance call for an assembly
//! amr-caller analyze isolate.fasta --db-dir database/blast_db
//!
//! # JSON output for scripting
//! amr-caller analyze isolate.fasta --format json
//!
//! # Raw hits
//! amr-caller align isolate.fasta --evalue 1e-20 --max-hits 5 --format tsv
//!
//! # HTTP API
//! amr-caller serve --port 8080
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::alignment::external::DEFAULT_BLASTDBCMD;
use crate::analysis::narrative::{NarrativeConfig, DEFAULT_NARRATIVE_MODEL, DEFAULT_NARRATIVE_URL};
use crate::config::AnalyzerConfig;

pub mod align;
pub mod analyze;
pub mod genes;

#[derive(Parser)]
#[command(name = "amr-caller")]
#[command(version)]
#[command(about = "Detect antibiotic resistance genes in bacterial DNA sequences")]
#[command(
    long_about = "amr-caller aligns a bacterial sequence against a curated set of antibiotic resistance genes and reports:\n- Which resistance genes are present, using per-gene identity thresholds\n- An overall resistant/susceptible call with a calibrated confidence score\n- Antibiotics to prefer and to avoid for resistant samples"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Call antibiotic resistance for a query FASTA
    Analyze(analyze::AnalyzeArgs),

    /// Align a query FASTA against the reference genes
    Align(align::AlignArgs),

    /// List known resistance genes and reference records
    Genes(genes::GenesArgs),

    /// Start the web server
    Serve(ServeArgs),
}

/// Reference database location and alignment tools
#[derive(Args, Clone)]
pub struct DatabaseArgs {
    /// Directory containing resistance_genes.fasta and/or its blastn index
    #[arg(long, env = "BLAST_DB_PATH", default_value = "database/blast_db")]
    pub db_dir: PathBuf,

    /// blastn executable
    #[arg(long, env = "BLASTN_PATH", default_value = "blastn")]
    pub blastn: PathBuf,

    /// blastdbcmd executable, used to list indexed references
    #[arg(long, env = "BLASTDBCMD_PATH", default_value = DEFAULT_BLASTDBCMD)]
    pub blastdbcmd: PathBuf,
}

/// Optional generated treatment notes
#[derive(Args, Clone)]
pub struct NarrativeArgs {
    /// API key for the chat-completions endpoint; notes are canned without it
    #[arg(long, env = "NARRATIVE_API_KEY", hide_env_values = true)]
    pub narrative_api_key: Option<String>,

    /// Chat-completions endpoint
    #[arg(long, env = "NARRATIVE_API_URL", default_value = DEFAULT_NARRATIVE_URL)]
    pub narrative_url: String,

    /// Model name
    #[arg(long, env = "NARRATIVE_MODEL", default_value = DEFAULT_NARRATIVE_MODEL)]
    pub narrative_model: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "20")]
    pub narrative_timeout: u64,
}

impl NarrativeArgs {
    #[must_use]
    pub fn to_config(&self) -> Option<NarrativeConfig> {
        let api_key = self.narrative_api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(NarrativeConfig {
            api_key: api_key.to_string(),
            url: self.narrative_url.clone(),
            model: self.narrative_model.clone(),
            timeout: Duration::from_secs(self.narrative_timeout),
        })
    }
}

/// Library configuration from command-line arguments
#[must_use]
pub fn analyzer_config(database: &DatabaseArgs, narrative: Option<&NarrativeArgs>) -> AnalyzerConfig {
    AnalyzerConfig::new(&database.db_dir)
        .with_blastn(&database.blastn)
        .with_blastdbcmd(&database.blastdbcmd)
        .with_narrative(narrative.and_then(NarrativeArgs::to_config))
}

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub narrative: NarrativeArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::alignment::{AlignParams, AlignmentEngine, BlastTool, DEFAULT_EVALUE, DEFAULT_MAX_HITS};
use crate::cli::{DatabaseArgs, OutputFormat};
use crate::core::alignment::AlignmentResult;
use crate::observer::TracingObserver;
use crate::registry::ReferenceDatabase;
use crate::utils::validation::{validate_evalue, validate_max_hits};

#[derive(Args)]
pub struct AlignArgs {
    /// Query FASTA file (optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// E-value cutoff for blastn (ignored by the local aligner)
    #[arg(long, default_value_t = DEFAULT_EVALUE)]
    pub evalue: f64,

    /// Maximum hits kept per query sequence
    #[arg(long, default_value_t = DEFAULT_MAX_HITS)]
    pub max_hits: usize,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

pub fn run(args: AlignArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let params = AlignParams {
        evalue: validate_evalue(args.evalue)?,
        max_hits: validate_max_hits(args.max_hits)?,
    };

    let tool = BlastTool::new(&args.database.blastn).with_blastdbcmd(&args.database.blastdbcmd);
    let engine = AlignmentEngine::new(ReferenceDatabase::new(&args.database.db_dir), tool);

    let results = engine
        .align_file(&args.input, params, &TracingObserver)
        .with_context(|| format!("Failed to align {}", args.input.display()))?;

    if verbose {
        let total: usize = results.iter().map(|r| r.hits.len()).sum();
        eprintln!("{} queries, {} hits", results.len(), total);
    }

    match format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Tsv => print_tsv(&results),
    }

    Ok(())
}

fn print_text(results: &[AlignmentResult]) {
    for result in results {
        println!("Query: {} ({} bp)", result.query_id, result.query_length);
        println!("{}", "-".repeat(60));

        if result.hits.is_empty() {
            println!("  No hits.\n");
            continue;
        }

        for (i, hit) in result.hits.iter().enumerate() {
            println!(
                "  #{} {}  {:.2}% over {} bp, {} mismatches, {} gap opens",
                i + 1,
                hit.subject_id,
                hit.percent_identity,
                hit.alignment_length,
                hit.mismatches,
                hit.gap_opens,
            );
            println!(
                "     query {}-{}  ref {}-{}  e-value {:.2e}  bit score {:.1}",
                hit.query_start,
                hit.query_end,
                hit.subject_start,
                hit.subject_end,
                hit.evalue,
                hit.bit_score,
            );
        }
        println!();
    }
}

/// BLAST outfmt 6 column order
fn print_tsv(results: &[AlignmentResult]) {
    println!("qseqid\tsseqid\tpident\tlength\tmismatch\tgapopen\tqstart\tqend\tsstart\tsend\tevalue\tbitscore");
    for hit in results.iter().flat_map(|r| &r.hits) {
        println!(
            "{}\t{}\t{:.3}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{:.1}",
            hit.query_id,
            hit.subject_id,
            hit.percent_identity,
            hit.alignment_length,
            hit.mismatches,
            hit.gap_opens,
            hit.query_start,
            hit.query_end,
            hit.subject_start,
            hit.subject_end,
            hit.evalue,
            hit.bit_score,
        );
    }
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::alignment::{AlignParams, DEFAULT_EVALUE, DEFAULT_MAX_HITS};
use crate::analysis::{AnalysisParams, Analyzer, DEFAULT_THRESHOLD};
use crate::cli::{analyzer_config, DatabaseArgs, NarrativeArgs, OutputFormat};
use crate::core::result::ResistanceAnalysisResult;
use crate::observer::TracingObserver;
use crate::utils::validation::{validate_evalue, validate_max_hits, validate_threshold};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Query FASTA file (optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// E-value cutoff for blastn
    #[arg(long, default_value_t = DEFAULT_EVALUE)]
    pub evalue: f64,

    /// Maximum hits kept per query sequence
    #[arg(long, default_value_t = DEFAULT_MAX_HITS)]
    pub max_hits: usize,

    /// Generic score threshold, nominally 0-1 (accepted; genes are called with per-gene thresholds)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    #[command(flatten)]
    pub database: DatabaseArgs,

    #[command(flatten)]
    pub narrative: NarrativeArgs,
}

pub fn run(args: AnalyzeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let params = AnalysisParams {
        align: AlignParams {
            evalue: validate_evalue(args.evalue)?,
            max_hits: validate_max_hits(args.max_hits)?,
        },
        threshold: validate_threshold(args.threshold)?,
    };

    let analyzer = Analyzer::from_config(&analyzer_config(&args.database, Some(&args.narrative)));

    if verbose {
        eprintln!("Reference database: {}", args.database.db_dir.display());
        eprintln!(
            "Narrative notes: {}",
            if analyzer.has_narrator() { "enabled" } else { "disabled" }
        );
    }

    let result = analyzer
        .analyze_file(&args.input, params, &TracingObserver)
        .with_context(|| format!("Failed to analyze {}", args.input.display()))?;

    match format {
        OutputFormat::Text => print_text(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Tsv => print_tsv(&result),
    }

    Ok(())
}

fn print_text(result: &ResistanceAnalysisResult) {
    println!("Resistance Analysis");
    println!("{}", "=".repeat(60));

    println!("\nSample: {}", result.sample_id);
    println!("Status: {}", result.resistance_status);
    println!("Confidence: {:.1}%", result.confidence_score);
    println!(
        "Analyzed: {}",
        result.analysis_timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if result.identified_genes.is_empty() {
        println!("\nNo resistance genes detected.");
        return;
    }

    println!("\nIdentified Genes: {}", result.identified_genes.join(", "));

    println!("\nMatching Regions:");
    for region in &result.matching_regions {
        println!(
            "  {:<6} query {}-{}  ref {}-{}  {:.2}% identity over {} bp  (e-value {:.2e})",
            region.gene_name,
            region.query_start,
            region.query_end,
            region.subject_start,
            region.subject_end,
            region.percent_identity,
            region.alignment_length,
            region.evalue,
        );
    }

    if let Some(treatment) = &result.treatment_recommendations {
        println!("\nTreatment:");
        println!(
            "  Recommended: {}",
            treatment.recommended_antibiotics.join(", ")
        );
        println!(
            "  Avoid: {}",
            treatment
                .avoid_antibiotics
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Notes: {}", treatment.notes);
    }
}

fn print_tsv(result: &ResistanceAnalysisResult) {
    println!("sample_id\tstatus\tconfidence\tgene\tpercent_identity\talignment_length\tevalue\tquery_start\tquery_end");

    if result.matching_regions.is_empty() {
        println!(
            "{}\t{}\t{:.1}\t.\t.\t.\t.\t.\t.",
            result.sample_id, result.resistance_status, result.confidence_score
        );
        return;
    }

    for region in &result.matching_regions {
        println!(
            "{}\t{}\t{:.1}\t{}\t{:.2}\t{}\t{:e}\t{}\t{}",
            result.sample_id,
            result.resistance_status,
            result.confidence_score,
            region.gene_name,
            region.percent_identity,
            region.alignment_length,
            region.evalue,
            region.query_start,
            region.query_end,
        );
    }
}

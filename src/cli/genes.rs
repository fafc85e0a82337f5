use clap::Args;

use crate::alignment::{AlignmentEngine, BlastTool};
use crate::cli::{DatabaseArgs, OutputFormat};
use crate::core::gene::ReferenceGeneEntry;
use crate::observer::TracingObserver;
use crate::registry::{GeneIdentifier, GeneRegistry, ReferenceDatabase};

#[derive(Args)]
pub struct GenesArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Only list the built-in gene table
    #[arg(long)]
    pub registry_only: bool,
}

pub fn run(args: GenesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let registry = GeneRegistry::builtin();

    let references = if args.registry_only {
        Vec::new()
    } else {
        let tool = BlastTool::new(&args.database.blastn).with_blastdbcmd(&args.database.blastdbcmd);
        AlignmentEngine::new(ReferenceDatabase::new(&args.database.db_dir), tool)
            .reference_ids(&TracingObserver)
    };

    if verbose {
        eprintln!(
            "{} registry genes, {} reference records",
            registry.len(),
            references.len()
        );
    }

    let identifier = GeneIdentifier::new(&registry);

    match format {
        OutputFormat::Text => print_text(registry.entries(), &references, &identifier),
        OutputFormat::Json => {
            let resolved: Vec<_> = references
                .iter()
                .map(|id| {
                    serde_json::json!({
                        "id": id,
                        "gene": identifier.resolve_symbol(id),
                        "known": identifier.resolve(id).entry().is_some(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "genes": registry.entries(),
                "reference_records": resolved,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => print_tsv(registry.entries()),
    }

    Ok(())
}

fn print_text(entries: &[ReferenceGeneEntry], references: &[String], identifier: &GeneIdentifier<'_>) {
    println!("Resistance Genes");
    println!("{}", "=".repeat(60));
    println!("{:<8} {:<26} {:>9}  Avoid", "Symbol", "Mechanism", "Threshold");
    for entry in entries {
        println!(
            "{:<8} {:<26} {:>8.1}%  {}",
            entry.symbol,
            entry.mechanism.to_string(),
            entry.significance_threshold,
            entry.cross_resistant_to.join(", ")
        );
    }

    if references.is_empty() {
        return;
    }

    println!("\nReference Records ({})", references.len());
    println!("{}", "-".repeat(60));
    for id in references {
        let resolved = identifier.resolve(id);
        let marker = if resolved.entry().is_some() { "" } else { " (not in registry)" };
        println!("  {:<40} -> {}{}", id, resolved.symbol(), marker);
    }
}

fn print_tsv(entries: &[ReferenceGeneEntry]) {
    println!("symbol\tmechanism\tthreshold\tcross_resistant_to\tdescription");
    for entry in entries {
        println!(
            "{}\t{}\t{:.1}\t{}\t{}",
            entry.symbol,
            entry.mechanism,
            entry.significance_threshold,
            entry.cross_resistant_to.join(","),
            entry.description
        );
    }
}

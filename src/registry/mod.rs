//! Known resistance genes and the reference sequence set.
//!
//! - [`GeneRegistry`]: Fixed table of resistance genes with calibrated identity thresholds
//! - [`GeneIdentifier`]: Resolves noisy reference identifiers to registry symbols
//! - [`ReferenceDatabase`]: Locates the reference FASTA and its `blastn` index
//!
//! ## Built-in Genes
//!
//! | Symbol | Mechanism | Threshold |
//! |--------|-----------|-----------|
//! | mecA   | methicillin resistance | 70% |
//! | mecC   | methicillin resistance | 70% |
//! | vanA   | glycopeptide resistance | 75% |
//! | ermA   | macrolide resistance | 65% |
//! | ermC   | macrolide resistance | 65% |
//! | tetK   | tetracycline efflux | 75% |
//!
//! ## Example
//!
//! ```rust
//! use amr_caller::registry::{GeneIdentifier, GeneRegistry};
//!
//! let registry = GeneRegistry::builtin();
//! let identifier = GeneIdentifier::new(&registry);
//!
//! assert_eq!(identifier.resolve_symbol("mecA_X52593.1"), "mecA");
//! assert_eq!(identifier.resolve_symbol("X52593.1_ermA_variant"), "ermA");
//! ```

pub mod reference_db;
pub mod resolve;
pub mod store;

pub use reference_db::ReferenceDatabase;
pub use resolve::{GeneIdentifier, ResolvedGene};
pub use store::GeneRegistry;

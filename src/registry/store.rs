use std::collections::HashMap;

use thiserror::Error;

use crate::core::gene::ReferenceGeneEntry;
use crate::core::types::ResistanceMechanism;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate gene symbol in registry: {0}")]
    DuplicateSymbol(String),

    #[error("Invalid significance threshold for {symbol}: {threshold}")]
    InvalidThreshold { symbol: String, threshold: f64 },
}

/// Calibrated definitions of the known resistance genes.
///
/// Order matters: gene resolution scans symbols in this order when falling back
/// to substring matching.
const BUILTIN_GENES: &[(&str, &str, ResistanceMechanism, f64, &[&str])] = &[
    (
        "mecA",
        "Methicillin resistance gene (PBP2a) in S. aureus",
        ResistanceMechanism::MethicillinResistance,
        70.0,
        &["methicillin", "oxacillin", "all beta-lactams"],
    ),
    (
        "mecC",
        "Methicillin resistance gene, divergent mecA homologue",
        ResistanceMechanism::MethicillinResistance,
        70.0,
        &["methicillin", "oxacillin", "all beta-lactams"],
    ),
    (
        "vanA",
        "Vancomycin resistance gene",
        ResistanceMechanism::GlycopeptideResistance,
        75.0,
        &["vancomycin"],
    ),
    (
        "ermA",
        "Erythromycin resistance methylase gene",
        ResistanceMechanism::MacrolideResistance,
        65.0,
        &["erythromycin", "clindamycin", "macrolides"],
    ),
    (
        "ermC",
        "Erythromycin resistance methylase gene",
        ResistanceMechanism::MacrolideResistance,
        65.0,
        &["erythromycin", "clindamycin", "macrolides"],
    ),
    (
        "tetK",
        "Tetracycline efflux pump gene",
        ResistanceMechanism::TetracyclineEfflux,
        75.0,
        &["tetracycline"],
    ),
];

/// Read-only table of known resistance genes, indexed by symbol.
///
/// Built once and never mutated; share it by reference.
#[derive(Debug, Clone)]
pub struct GeneRegistry {
    /// Entries in definition order
    entries: Vec<ReferenceGeneEntry>,

    /// Index: lowercase symbol -> position in `entries`
    symbol_to_index: HashMap<String, usize>,
}

impl GeneRegistry {
    /// The built-in resistance gene table
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(BUILTIN_GENES.len()),
            symbol_to_index: HashMap::with_capacity(BUILTIN_GENES.len()),
        };

        for &(symbol, description, mechanism, threshold, antibiotics) in BUILTIN_GENES {
            let entry = ReferenceGeneEntry::new(symbol, description, mechanism, threshold)
                .with_cross_resistance(antibiotics);
            registry.push(entry);
        }

        registry
    }

    /// Build a registry from explicit entries, keeping their order
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateSymbol` if two entries share a symbol
    /// (case-insensitively), or `RegistryError::InvalidThreshold` if a threshold
    /// is outside 0-100.
    pub fn from_entries(entries: Vec<ReferenceGeneEntry>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            entries: Vec::with_capacity(entries.len()),
            symbol_to_index: HashMap::with_capacity(entries.len()),
        };

        for entry in entries {
            if !(0.0..=100.0).contains(&entry.significance_threshold) {
                return Err(RegistryError::InvalidThreshold {
                    symbol: entry.symbol,
                    threshold: entry.significance_threshold,
                });
            }
            if registry.contains(&entry.symbol) {
                return Err(RegistryError::DuplicateSymbol(entry.symbol));
            }
            registry.push(entry);
        }

        Ok(registry)
    }

    fn push(&mut self, entry: ReferenceGeneEntry) {
        self.symbol_to_index
            .insert(entry.symbol.to_lowercase(), self.entries.len());
        self.entries.push(entry);
    }

    /// Look up a gene by symbol (case-insensitive)
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&ReferenceGeneEntry> {
        self.symbol_to_index
            .get(&symbol.to_lowercase())
            .map(|&idx| &self.entries[idx])
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbol_to_index.contains_key(&symbol.to_lowercase())
    }

    /// Entries in definition order
    #[must_use]
    pub fn entries(&self) -> &[ReferenceGeneEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceGeneEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GeneRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

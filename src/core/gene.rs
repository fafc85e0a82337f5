use serde::{Deserialize, Serialize};

use crate::core::types::ResistanceMechanism;

/// A known resistance gene in the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGeneEntry {
    /// Canonical gene symbol (e.g. "mecA")
    pub symbol: String,

    /// Human-readable description
    pub description: String,

    /// Antibiotics this gene confers resistance to
    pub cross_resistant_to: Vec<String>,

    /// Minimum percent identity (0-100) for a hit to count as gene presence
    pub significance_threshold: f64,

    /// Mechanism of resistance
    pub mechanism: ResistanceMechanism,
}

impl ReferenceGeneEntry {
    pub fn new(
        symbol: impl Into<String>,
        description: impl Into<String>,
        mechanism: ResistanceMechanism,
        significance_threshold: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.into(),
            cross_resistant_to: Vec::new(),
            significance_threshold,
            mechanism,
        }
    }

    #[must_use]
    pub fn with_cross_resistance(mut self, antibiotics: &[&str]) -> Self {
        for antibiotic in antibiotics {
            if !self.cross_resistant_to.iter().any(|a| a == antibiotic) {
                self.cross_resistant_to.push((*antibiotic).to_string());
            }
        }
        self
    }

    /// Whether a hit at `percent_identity` counts as presence of this gene.
    /// The threshold is inclusive.
    #[must_use]
    pub fn is_significant(&self, percent_identity: f64) -> bool {
        percent_identity >= self.significance_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let entry = ReferenceGeneEntry::new(
            "vanA",
            "Vancomycin resistance gene",
            ResistanceMechanism::GlycopeptideResistance,
            75.0,
        );
        assert!(entry.is_significant(75.0));
        assert!(entry.is_significant(99.0));
        assert!(!entry.is_significant(74.99));
    }

    #[test]
    fn test_cross_resistance_dedup() {
        let entry = ReferenceGeneEntry::new(
            "ermC",
            "Erythromycin resistance methylase gene",
            ResistanceMechanism::MacrolideResistance,
            65.0,
        )
        .with_cross_resistance(&["erythromycin", "clindamycin", "erythromycin"]);
        assert_eq!(entry.cross_resistant_to, vec!["erythromycin", "clindamycin"]);
    }
}

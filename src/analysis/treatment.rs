use std::collections::BTreeSet;

use crate::core::result::TreatmentRecommendation;
use crate::core::types::ResistanceMechanism;
use crate::error::AnalysisError;
use crate::observer::AnalysisObserver;
use crate::registry::GeneRegistry;

use super::narrative::NarrativeGenerator;

/// First-line options when methicillin resistance is present
const METHICILLIN_RESISTANT_OPTIONS: [&str; 4] = [
    "Vancomycin",
    "Linezolid",
    "Daptomycin",
    "Trimethoprim-sulfamethoxazole",
];

/// Replace vancomycin when glycopeptide resistance is also present
const GLYCOPEPTIDE_ALTERNATIVES: [&str; 2] = ["Dalbavancin", "Telavancin"];

/// Options when no methicillin resistance gene was found
const METHICILLIN_SUSCEPTIBLE_OPTIONS: [&str; 3] = ["Cefazolin", "Oxacillin", "Dicloxacillin"];

pub const CANNED_NOTES: &str = "Automated recommendations based on detected resistance genes.";
pub const NARRATIVE_CONFIDENCE: f64 = 98.0;
pub const CANNED_CONFIDENCE: f64 = 95.0;

/// Maps identified genes to antibiotic guidance
pub struct TreatmentAdvisor<'a> {
    registry: &'a GeneRegistry,
    narrator: Option<&'a dyn NarrativeGenerator>,
}

impl<'a> TreatmentAdvisor<'a> {
    pub fn new(registry: &'a GeneRegistry, narrator: Option<&'a dyn NarrativeGenerator>) -> Self {
        Self { registry, narrator }
    }

    /// Build a recommendation for a resistant sample.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Classification`] if a gene is not in the registry.
    /// Narrative failures are absorbed.
    pub fn recommend(
        &self,
        identified_genes: &[String],
        observer: &dyn AnalysisObserver,
    ) -> Result<TreatmentRecommendation, AnalysisError> {
        let mut avoid_antibiotics = BTreeSet::new();
        let mut mechanisms = Vec::with_capacity(identified_genes.len());

        for gene in identified_genes {
            let entry = self.registry.get(gene).ok_or_else(|| {
                AnalysisError::Classification(format!("gene {gene} is not in the registry"))
            })?;
            avoid_antibiotics.extend(entry.cross_resistant_to.iter().cloned());
            mechanisms.push(entry.mechanism);
        }

        let recommended_antibiotics = recommended_for(&mechanisms);

        let avoid: Vec<String> = avoid_antibiotics.iter().cloned().collect();
        let (notes, confidence) = match self.narrator {
            Some(narrator) => {
                match narrator.generate(identified_genes, &recommended_antibiotics, &avoid) {
                    Ok(text) => (text, NARRATIVE_CONFIDENCE),
                    Err(e) => {
                        observer.narrative_unavailable(&e.to_string());
                        (CANNED_NOTES.to_string(), CANNED_CONFIDENCE)
                    }
                }
            }
            None => {
                observer.narrative_unavailable("no narrative generator configured");
                (CANNED_NOTES.to_string(), CANNED_CONFIDENCE)
            }
        };

        Ok(TreatmentRecommendation {
            recommended_antibiotics,
            avoid_antibiotics,
            notes,
            confidence,
        })
    }
}

fn recommended_for(mechanisms: &[ResistanceMechanism]) -> Vec<String> {
    let has = |mechanism| mechanisms.contains(&mechanism);

    if !has(ResistanceMechanism::MethicillinResistance) {
        return METHICILLIN_SUSCEPTIBLE_OPTIONS.map(String::from).to_vec();
    }

    let mut options: Vec<String> = METHICILLIN_RESISTANT_OPTIONS.map(String::from).to_vec();
    if has(ResistanceMechanism::GlycopeptideResistance) {
        options.retain(|drug| drug != "Vancomycin");
        options.extend(GLYCOPEPTIDE_ALTERNATIVES.map(String::from));
    }
    options
}

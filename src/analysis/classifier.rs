use crate::core::alignment::AlignmentResult;
use crate::core::result::MatchingRegion;
use crate::core::types::ResistanceStatus;
use crate::observer::AnalysisObserver;
use crate::registry::{GeneIdentifier, GeneRegistry};

/// Genes and regions that passed their per-gene thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: ResistanceStatus,
    /// Canonical symbols, first-seen order, no duplicates
    pub identified_genes: Vec<String>,
    /// One region per significant hit, in hit order
    pub matching_regions: Vec<MatchingRegion>,
}

/// Turns alignment hits into a resistance call using per-gene identity thresholds
pub struct ResistanceClassifier<'a> {
    identifier: GeneIdentifier<'a>,
}

impl<'a> ResistanceClassifier<'a> {
    pub fn new(registry: &'a GeneRegistry) -> Self {
        Self {
            identifier: GeneIdentifier::new(registry),
        }
    }

    /// Classify every hit of every result. A hit counts when its subject
    /// resolves to a registry gene and its identity is at least that gene's
    /// threshold.
    pub fn classify(
        &self,
        results: &[AlignmentResult],
        observer: &dyn AnalysisObserver,
    ) -> Classification {
        let mut identified_genes: Vec<String> = Vec::new();
        let mut matching_regions = Vec::new();

        for hit in results.iter().flat_map(|r| &r.hits) {
            let Some(entry) = self.identifier.resolve(&hit.subject_id).entry() else {
                continue;
            };
            if !entry.is_significant(hit.percent_identity) {
                continue;
            }

            if !identified_genes.contains(&entry.symbol) {
                observer.gene_identified(&entry.symbol, hit.percent_identity);
                identified_genes.push(entry.symbol.clone());
            }
            matching_regions.push(MatchingRegion::from_hit(&entry.symbol, hit));
        }

        let status = if identified_genes.is_empty() {
            ResistanceStatus::Susceptible
        } else {
            ResistanceStatus::Resistant
        };

        Classification {
            status,
            identified_genes,
            matching_regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::AlignmentHit;
    use crate::observer::NullObserver;

    fn hit(subject_id: &str, percent_identity: f64) -> AlignmentHit {
        AlignmentHit {
            query_id: "sample".to_string(),
            subject_id: subject_id.to_string(),
            percent_identity,
            alignment_length: 500,
            mismatches: 0,
            gap_opens: 0,
            query_start: 101,
            query_end: 600,
            subject_start: 1,
            subject_end: 500,
            evalue: 1e-100,
            bit_score: 900.0,
        }
    }

    fn result(hits: Vec<AlignmentHit>) -> Vec<AlignmentResult> {
        vec![AlignmentResult::new("sample", 5000).with_hits(hits)]
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let registry = GeneRegistry::builtin();
        let classifier = ResistanceClassifier::new(&registry);

        let at = classifier.classify(&result(vec![hit("vanA_M97297.1", 75.0)]), &NullObserver);
        assert_eq!(at.status, ResistanceStatus::Resistant);
        assert_eq!(at.identified_genes, vec!["vanA"]);

        let below =
            classifier.classify(&result(vec![hit("vanA_M97297.1", 74.99)]), &NullObserver);
        assert_eq!(below.status, ResistanceStatus::Susceptible);
        assert!(below.matching_regions.is_empty());
    }

    #[test]
    fn test_per_gene_thresholds() {
        let registry = GeneRegistry::builtin();
        let classifier = ResistanceClassifier::new(&registry);

        // 66% passes ermA (65) but not tetK (75)
        let classification = classifier.classify(
            &result(vec![hit("tetK_S67449.1", 66.0), hit("ermA_X03216.1", 66.0)]),
            &NullObserver,
        );
        assert_eq!(classification.identified_genes, vec!["ermA"]);
    }

    #[test]
    fn test_dedup_keeps_every_region() {
        let registry = GeneRegistry::builtin();
        let classifier = ResistanceClassifier::new(&registry);

        let classification = classifier.classify(
            &result(vec![
                hit("mecA_X52593.1", 99.0),
                hit("ermC_V01278.1", 98.0),
                hit("MECA_alt", 90.0),
                hit("blaZ_unknown", 100.0),
            ]),
            &NullObserver,
        );
        assert_eq!(classification.identified_genes, vec!["mecA", "ermC"]);
        let names: Vec<&str> = classification
            .matching_regions
            .iter()
            .map(|r| r.gene_name.as_str())
            .collect();
        assert_eq!(names, vec!["mecA", "ermC", "mecA"]);
        for region in &classification.matching_regions {
            assert!(classification.identified_genes.contains(&region.gene_name));
        }
    }

    #[test]
    fn test_hits_across_results() {
        let registry = GeneRegistry::builtin();
        let classifier = ResistanceClassifier::new(&registry);

        let results = vec![
            AlignmentResult::new("contig1", 1000).with_hits(vec![hit("tetK_S67449.1", 99.0)]),
            AlignmentResult::new("contig2", 1000).with_hits(vec![hit("vanA_M97297.1", 99.0)]),
        ];
        let classification = classifier.classify(&results, &NullObserver);
        assert_eq!(classification.identified_genes, vec!["tetK", "vanA"]);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let registry = GeneRegistry::builtin();
        let classifier = ResistanceClassifier::new(&registry);
        let results = result(vec![
            hit("X52593.1_ermA_variant", 80.0),
            hit("mecC_FR821779.1", 71.0),
            hit("vanA_M97297.1", 50.0),
        ]);

        let first = classifier.classify(&results, &NullObserver);
        let second = classifier.classify(&results, &NullObserver);
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_results() {
        let registry = GeneRegistry::builtin();
        let classification = ResistanceClassifier::new(&registry).classify(&[], &NullObserver);
        assert_eq!(classification.status, ResistanceStatus::Susceptible);
        assert!(classification.identified_genes.is_empty());
    }
}

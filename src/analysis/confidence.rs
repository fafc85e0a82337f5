//! Confidence scores (0-100) for resistance calls.
//!
//! Resistant and susceptible calls use separate calibrations. Their ranges
//! overlap on 75-96.

use crate::core::alignment::AlignmentResult;
use crate::core::result::MatchingRegion;
use crate::registry::GeneIdentifier;

pub const RESISTANT_MIN: f64 = 75.0;
pub const RESISTANT_MAX: f64 = 99.5;
pub const SUSCEPTIBLE_MIN: f64 = 65.0;
pub const SUSCEPTIBLE_MAX: f64 = 96.0;

/// Susceptible confidence when the sample produced no hits at all
pub const NO_HITS_CONFIDENCE: f64 = 98.0;

/// `-log10(evalue)` ceiling; also used for an e-value of exactly zero
const MAX_EVALUE_MAGNITUDE: f64 = 200.0;

const COVERAGE_WEIGHT: f64 = 15.0;
const MULTI_GENE_STEP: f64 = 3.0;
const MULTI_GENE_CAP: f64 = 10.0;
const DEDUP_STEP: f64 = 0.3;

/// Evalue cutoffs (exclusive) and their bonuses, strongest first
const EVALUE_BONUSES: [(f64, f64); 3] = [(1e-50, 8.0), (1e-20, 5.0), (1e-10, 3.0)];

const SUSCEPTIBLE_BASE: f64 = 90.0;
const REGISTRY_HIT_PENALTY: f64 = 5.0;
const IDENTITY_PENALTY: f64 = 0.2;
const HIT_COUNT_ALLOWANCE: usize = 5;
const HIT_COUNT_PENALTY_CAP: usize = 10;
const VARIATION_STEP: f64 = 0.4;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn evalue_magnitude(evalue: f64) -> f64 {
    if evalue <= 0.0 {
        MAX_EVALUE_MAGNITUDE
    } else {
        (-evalue.log10()).min(MAX_EVALUE_MAGNITUDE)
    }
}

/// Confidence for a resistant call.
///
/// Identity is averaged over regions weighted by alignment length and e-value
/// magnitude, then adjusted by coverage of the query, number of distinct genes,
/// the best e-value and a small term derived from the summed region lengths.
/// Raising any one region's identity never lowers the score.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn resistant_confidence(
    regions: &[MatchingRegion],
    distinct_genes: usize,
    query_length: u64,
) -> f64 {
    if regions.is_empty() {
        return RESISTANT_MIN;
    }

    let (weighted_identity, total_weight) =
        regions.iter().fold((0.0, 0.0), |(sum, weights), region| {
            let weight =
                region.alignment_length as f64 * evalue_magnitude(region.evalue).max(1.0);
            (sum + region.percent_identity * weight, weights + weight)
        });
    let base = if total_weight > 0.0 {
        weighted_identity / total_weight
    } else {
        0.0
    };

    let longest = regions.iter().map(|r| r.alignment_length).max().unwrap_or(0);
    let coverage_bonus = if query_length == 0 {
        0.0
    } else {
        (longest as f64 / query_length as f64).min(1.0) * COVERAGE_WEIGHT
    };

    let multi_gene_bonus =
        (distinct_genes.saturating_sub(1) as f64 * MULTI_GENE_STEP).min(MULTI_GENE_CAP);

    let best_evalue = regions
        .iter()
        .map(|r| r.evalue)
        .fold(f64::INFINITY, f64::min);
    let evalue_bonus = EVALUE_BONUSES
        .iter()
        .find(|(cutoff, _)| best_evalue < *cutoff)
        .map_or(0.0, |(_, bonus)| *bonus);

    let total_length: u64 = regions.iter().map(|r| r.alignment_length).sum();
    let dedup_term = (total_length % 10) as f64 * DEDUP_STEP;

    round1(
        (base + coverage_bonus + multi_gene_bonus + evalue_bonus + dedup_term)
            .clamp(RESISTANT_MIN, RESISTANT_MAX),
    )
}

/// Confidence for a susceptible call, from the primary alignment result.
///
/// Starts high and drops for hits on registry genes (even sub-threshold ones)
/// and for noisy samples with many hits.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn susceptible_confidence(
    primary: Option<&AlignmentResult>,
    identifier: &GeneIdentifier<'_>,
) -> f64 {
    let Some(result) = primary.filter(|r| !r.hits.is_empty()) else {
        return NO_HITS_CONFIDENCE;
    };

    let registry_identities: Vec<f64> = result
        .hits
        .iter()
        .filter(|hit| identifier.resolve(&hit.subject_id).entry().is_some())
        .map(|hit| hit.percent_identity)
        .collect();
    let max_identity = registry_identities.iter().copied().fold(0.0, f64::max);

    let total_hits = result.hits.len();
    let mut base = SUSCEPTIBLE_BASE;
    base -= registry_identities.len() as f64 * REGISTRY_HIT_PENALTY + max_identity * IDENTITY_PENALTY;
    if total_hits > HIT_COUNT_ALLOWANCE {
        base -= (total_hits - HIT_COUNT_ALLOWANCE).min(HIT_COUNT_PENALTY_CAP) as f64;
    }
    base += (total_hits % 7) as f64 * VARIATION_STEP;

    round1(base.clamp(SUSCEPTIBLE_MIN, SUSCEPTIBLE_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::AlignmentHit;
    use crate::registry::GeneRegistry;

    fn region(gene: &str, percent_identity: f64, alignment_length: u64, evalue: f64) -> MatchingRegion {
        MatchingRegion {
            gene_name: gene.to_string(),
            query_start: 1,
            query_end: alignment_length,
            subject_start: 1,
            subject_end: alignment_length,
            percent_identity,
            alignment_length,
            evalue,
        }
    }

    fn hits(subjects: &[&str], percent_identity: f64) -> AlignmentResult {
        let hits = subjects
            .iter()
            .map(|subject| AlignmentHit {
                query_id: "sample".to_string(),
                subject_id: (*subject).to_string(),
                percent_identity,
                alignment_length: 120,
                mismatches: 10,
                gap_opens: 1,
                query_start: 1,
                query_end: 120,
                subject_start: 1,
                subject_end: 120,
                evalue: 1e-5,
                bit_score: 80.0,
            })
            .collect();
        AlignmentResult::new("sample", 3000).with_hits(hits)
    }

    #[test]
    fn test_evalue_magnitude() {
        assert!((evalue_magnitude(0.0) - 200.0).abs() < f64::EPSILON);
        assert!((evalue_magnitude(1e-300) - 200.0).abs() < f64::EPSILON);
        assert!((evalue_magnitude(1e-10) - 10.0).abs() < 1e-9);
        assert!(evalue_magnitude(0.5) < 1.0);
    }

    #[test]
    fn test_single_strong_meca_hit() {
        let confidence = resistant_confidence(&[region("mecA", 99.8, 2000, 0.0)], 1, 2500);
        assert!((90.0..=99.5).contains(&confidence));
        assert!((confidence - 99.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resistant_floor() {
        // Weak evidence is still reported at the policy floor
        let confidence = resistant_confidence(&[region("ermA", 65.0, 100, 0.01)], 1, 1_000_000);
        assert!((confidence - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resistant_components() {
        // base 80, coverage 300/1000*15 = 4.5, evalue bonus 3 (1e-15), dedup 0
        let confidence = resistant_confidence(&[region("tetK", 80.0, 300, 1e-15)], 1, 1000);
        assert!((confidence - 87.5).abs() < 1e-9);

        // Two genes add 3; lengths sum to 303 so dedup adds 0.9
        let confidence = resistant_confidence(
            &[region("tetK", 80.0, 300, 1e-15), region("ermC", 80.0, 3, 1e-15)],
            2,
            1000,
        );
        assert!((confidence - 91.4).abs() < 1e-9);
    }

    #[test]
    fn test_zero_query_length_has_no_coverage_bonus() {
        let with_length = resistant_confidence(&[region("vanA", 80.0, 500, 1.0)], 1, 500);
        let without = resistant_confidence(&[region("vanA", 80.0, 500, 1.0)], 1, 0);
        assert!((with_length - 95.0).abs() < 1e-9);
        assert!((without - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_resistant_monotone_in_identity() {
        let mut regions = vec![
            region("mecA", 70.0, 800, 1e-30),
            region("vanA", 76.0, 1200, 1e-60),
            region("ermC", 66.0, 400, 0.0),
        ];
        let mut previous = resistant_confidence(&regions, 3, 20_000);
        for step in 1..=30 {
            regions[0].percent_identity = 70.0 + f64::from(step);
            let current = resistant_confidence(&regions, 3, 20_000);
            assert!(current >= previous, "{current} < {previous} at step {step}");
            previous = current;
        }
    }

    #[test]
    fn test_no_hits_is_98() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        let empty = AlignmentResult::new("sample", 3000);
        assert!((susceptible_confidence(Some(&empty), &identifier) - 98.0).abs() < f64::EPSILON);
        assert!((susceptible_confidence(None, &identifier) - 98.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_many_unrelated_hits_lower_confidence() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        let seven = hits(&["h1", "h2", "h3", "h4", "h5", "h6", "h7"], 60.0);
        let two = hits(&["h1", "h2"], 60.0);
        let seven_conf = susceptible_confidence(Some(&seven), &identifier);
        let two_conf = susceptible_confidence(Some(&two), &identifier);

        assert!((seven_conf - 88.0).abs() < 1e-9);
        assert!((two_conf - 90.8).abs() < 1e-9);
        assert!(seven_conf < two_conf);
    }

    #[test]
    fn test_sub_threshold_registry_hits_penalized() {
        let registry = GeneRegistry::builtin();
        let identifier = GeneIdentifier::new(&registry);

        // 90 - (2 * 5 + 60 * 0.2) + 2 * 0.4 = 68.8
        let result = hits(&["vanA_M97297.1", "tetK_S67449.1"], 60.0);
        let confidence = susceptible_confidence(Some(&result), &identifier);
        assert!((confidence - 68.8).abs() < 1e-9);

        // Clamped at the floor
        let result = hits(&["mecA_1", "mecA_2", "mecA_3", "mecA_4"], 69.0);
        assert!((susceptible_confidence(Some(&result), &identifier) - 65.0).abs() < 1e-9);
    }
}

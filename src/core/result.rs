use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::alignment::AlignmentHit;
use crate::core::types::ResistanceStatus;

/// A classifier-confirmed hit attributed to a known resistance gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRegion {
    pub gene_name: String,
    pub query_start: u64,
    pub query_end: u64,
    pub subject_start: u64,
    pub subject_end: u64,
    pub percent_identity: f64,
    pub alignment_length: u64,
    pub evalue: f64,
}

impl MatchingRegion {
    pub fn from_hit(gene_name: impl Into<String>, hit: &AlignmentHit) -> Self {
        Self {
            gene_name: gene_name.into(),
            query_start: hit.query_start,
            query_end: hit.query_end,
            subject_start: hit.subject_start,
            subject_end: hit.subject_end,
            percent_identity: hit.percent_identity,
            alignment_length: hit.alignment_length,
            evalue: hit.evalue,
        }
    }
}

/// Antibiotic guidance attached to resistant results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentRecommendation {
    pub recommended_antibiotics: Vec<String>,
    pub avoid_antibiotics: BTreeSet<String>,
    pub notes: String,
    pub confidence: f64,
}

/// Final record of one resistance analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceAnalysisResult {
    pub sample_id: String,
    pub resistance_status: ResistanceStatus,
    /// Confidence in the call (0-100)
    pub confidence_score: f64,
    pub matching_regions: Vec<MatchingRegion>,
    /// Unique gene symbols in first-seen order
    pub identified_genes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_recommendations: Option<TreatmentRecommendation>,
    pub analysis_timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_hit_copies_coordinates() {
        let hit = AlignmentHit {
            query_id: "sample".to_string(),
            subject_id: "mecA_X52593.1".to_string(),
            percent_identity: 99.8,
            alignment_length: 2000,
            mismatches: 4,
            gap_opens: 0,
            query_start: 101,
            query_end: 2100,
            subject_start: 1,
            subject_end: 2000,
            evalue: 0.0,
            bit_score: 3698.5,
        };
        let region = MatchingRegion::from_hit("mecA", &hit);
        assert_eq!(region.gene_name, "mecA");
        assert_eq!(region.query_start, 101);
        assert_eq!(region.query_end, 2100);
        assert_eq!(region.subject_end, 2000);
        assert_eq!(region.alignment_length, 2000);
        assert!((region.percent_identity - 99.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_susceptible_result_omits_treatment() {
        let result = ResistanceAnalysisResult {
            sample_id: "s1".to_string(),
            resistance_status: ResistanceStatus::Susceptible,
            confidence_score: 98.0,
            matching_regions: Vec::new(),
            identified_genes: Vec::new(),
            treatment_recommendations: None,
            analysis_timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["resistance_status"], "susceptible");
        assert!(json.get("treatment_recommendations").is_none());
    }
}

use serde::{Deserialize, Serialize};

/// A single sequence record (FASTA entry), uppercased on load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// First word of the definition line
    pub id: String,

    /// Residues, uppercase ASCII
    pub sequence: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: &[u8]) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.iter().map(u8::to_ascii_uppercase).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// One local alignment between a query and a reference sequence.
///
/// Coordinates are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentHit {
    pub query_id: String,
    pub subject_id: String,
    pub percent_identity: f64,
    pub alignment_length: u64,
    pub mismatches: u64,
    pub gap_opens: u64,
    pub query_start: u64,
    pub query_end: u64,
    pub subject_start: u64,
    pub subject_end: u64,
    pub evalue: f64,
    pub bit_score: f64,
}

/// All hits for one query sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub query_id: String,
    pub query_length: u64,
    pub hits: Vec<AlignmentHit>,
}

impl AlignmentResult {
    pub fn new(query_id: impl Into<String>, query_length: u64) -> Self {
        Self {
            query_id: query_id.into(),
            query_length,
            hits: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hits(mut self, hits: Vec<AlignmentHit>) -> Self {
        self.hits = hits;
        self
    }

    /// Keep the best `max_hits` hits by percent identity (stable for ties)
    pub fn retain_best(&mut self, max_hits: usize) {
        self.hits
            .sort_by(|a, b| b.percent_identity.total_cmp(&a.percent_identity));
        self.hits.truncate(max_hits);
    }
}

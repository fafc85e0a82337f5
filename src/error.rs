use std::path::PathBuf;

use thiserror::Error;

use crate::parsing::ParseError;

/// Failures of the analysis core.
///
/// Narrative collaborator failures never appear here; the treatment advisor
/// absorbs them.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Empty or unparseable query input
    #[error("Invalid query input: {0}")]
    InputFormat(String),

    /// Every alignment strategy was attempted and none produced output
    #[error("Alignment failed: {0}")]
    AlignmentFailure(String),

    /// Neither the reference index nor the reference FASTA exists
    #[error("No reference data found under {}", .0.display())]
    ReferenceUnavailable(PathBuf),

    /// A gene expected to be in the registry is missing
    #[error("Classification error: {0}")]
    Classification(String),
}

impl AnalysisError {
    /// Short machine-readable name used in API error bodies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputFormat(_) => "input_format",
            Self::AlignmentFailure(_) => "alignment_failure",
            Self::ReferenceUnavailable(_) => "reference_unavailable",
            Self::Classification(_) => "classification_error",
        }
    }
}

impl From<ParseError> for AnalysisError {
    fn from(e: ParseError) -> Self {
        Self::InputFormat(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_becomes_input_format() {
        let err: AnalysisError = ParseError::InvalidFormat("no records".to_string()).into();
        assert!(matches!(err, AnalysisError::InputFormat(_)));
        assert_eq!(err.kind(), "input_format");
    }

    #[test]
    fn test_reference_unavailable_message() {
        let err = AnalysisError::ReferenceUnavailable(PathBuf::from("/data/blast_db"));
        assert_eq!(err.to_string(), "No reference data found under /data/blast_db");
    }
}

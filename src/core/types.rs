use serde::{Deserialize, Serialize};

/// Overall resistance call for a sample
///
/// Only `Resistant` and `Susceptible` are produced by the classifier. The other two
/// variants exist so that stored results from other producers still deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResistanceStatus {
    Resistant,
    Susceptible,
    Intermediate,
    Unknown,
}

impl ResistanceStatus {
    #[must_use]
    pub fn is_resistant(self) -> bool {
        matches!(self, Self::Resistant)
    }
}

impl std::fmt::Display for ResistanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resistant => write!(f, "RESISTANT"),
            Self::Susceptible => write!(f, "SUSCEPTIBLE"),
            Self::Intermediate => write!(f, "INTERMEDIATE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Biological mechanism a reference gene confers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceMechanism {
    /// Altered penicillin-binding protein (PBP2a); MRSA marker
    MethicillinResistance,
    /// D-Ala-D-Lac cell wall precursor; vancomycin resistance
    GlycopeptideResistance,
    /// 23S rRNA methylation; MLS_B resistance
    MacrolideResistance,
    /// Tetracycline efflux pump
    TetracyclineEfflux,
}

impl std::fmt::Display for ResistanceMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MethicillinResistance => write!(f, "methicillin resistance"),
            Self::GlycopeptideResistance => write!(f, "glycopeptide resistance"),
            Self::MacrolideResistance => write!(f, "macrolide resistance"),
            Self::TetracyclineEfflux => write!(f, "tetracycline efflux"),
        }
    }
}

/// Which alignment strategy produced a set of hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// External `blastn` against the pre-built index
    External,
    /// In-process local aligner against the reference FASTA
    Local,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External => write!(f, "blastn"),
            Self::Local => write!(f, "local aligner"),
        }
    }
}

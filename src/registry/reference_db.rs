use std::path::{Path, PathBuf};

use crate::core::alignment::SequenceRecord;
use crate::parsing::fasta::{read_fasta_file, read_fasta_ids};
use crate::parsing::ParseError;

/// Base name of the reference set inside the database directory
pub const REFERENCE_DB_NAME: &str = "resistance_genes";

/// Default database directory
pub const DEFAULT_DB_DIR: &str = "database/blast_db";

/// Extensions of a `makeblastdb` nucleotide index; any one present means indexed
const INDEX_EXTENSIONS: [&str; 3] = ["nin", "nsq", "ndb"];

/// Location of the reference resistance gene set on disk.
///
/// ```text
/// <dir>/resistance_genes.fasta      raw sequences (local aligner)
/// <dir>/resistance_genes.{nin,nsq}  blastn index (external tool)
/// ```
///
/// Both are treated as read-only for the lifetime of a running instance.
#[derive(Debug, Clone)]
pub struct ReferenceDatabase {
    dir: PathBuf,
}

impl ReferenceDatabase {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the raw reference FASTA
    #[must_use]
    pub fn fasta_path(&self) -> PathBuf {
        self.dir.join(format!("{REFERENCE_DB_NAME}.fasta"))
    }

    /// Prefix passed to `blastn -db`
    #[must_use]
    pub fn index_prefix(&self) -> PathBuf {
        self.dir.join(REFERENCE_DB_NAME)
    }

    /// Whether a pre-built blastn index exists
    #[must_use]
    pub fn has_index(&self) -> bool {
        let prefix = self.index_prefix();
        INDEX_EXTENSIONS.iter().any(|ext| {
            let mut path = prefix.clone().into_os_string();
            path.push(".");
            path.push(ext);
            Path::new(&path).exists()
        })
    }

    #[must_use]
    pub fn has_fasta(&self) -> bool {
        self.fasta_path().is_file()
    }

    /// Load every reference sequence from the FASTA
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the FASTA is missing, unreadable or empty.
    pub fn load_sequences(&self) -> Result<Vec<SequenceRecord>, ParseError> {
        read_fasta_file(&self.fasta_path())
    }

    /// Reference record identifiers from the FASTA
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the FASTA is missing, unreadable or empty.
    pub fn fasta_ids(&self) -> Result<Vec<String>, ParseError> {
        read_fasta_ids(&self.fasta_path())
    }
}

impl Default for ReferenceDatabase {
    fn default() -> Self {
        Self::new(DEFAULT_DB_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let db = ReferenceDatabase::new("/data/db");
        assert_eq!(db.fasta_path(), PathBuf::from("/data/db/resistance_genes.fasta"));
        assert_eq!(db.index_prefix(), PathBuf::from("/data/db/resistance_genes"));
    }

    #[test]
    fn test_index_detection() {
        let dir = TempDir::new().unwrap();
        let db = ReferenceDatabase::new(dir.path());
        assert!(!db.has_index());
        assert!(!db.has_fasta());

        std::fs::write(dir.path().join("resistance_genes.nsq"), b"").unwrap();
        assert!(db.has_index());
    }

    #[test]
    fn test_load_sequences() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("resistance_genes.fasta"),
            ">mecA_X52593.1\nACGT\n>vanA_M97297.1\nTTGA\n",
        )
        .unwrap();

        let db = ReferenceDatabase::new(dir.path());
        assert!(db.has_fasta());
        let records = db.load_sequences().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(db.fasta_ids().unwrap(), vec!["mecA_X52593.1", "vanA_M97297.1"]);
    }
}

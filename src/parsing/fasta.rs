//! FASTA reading and writing using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::core::alignment::SequenceRecord;
use crate::parsing::ParseError;
use crate::utils::validation::check_record_limit;

/// Residues per line when writing FASTA
const LINE_WIDTH: usize = 80;

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    if path_str.ends_with(".fa.gz")
        || path_str.ends_with(".fasta.gz")
        || path_str.ends_with(".fna.gz")
        || path_str.ends_with(".fa.bgz")
        || path_str.ends_with(".fasta.bgz")
        || path_str.ends_with(".fna.bgz")
    {
        return true;
    }

    // Check for uncompressed FASTA
    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read every record of a FASTA file.
///
/// Sequences are uppercased. Records with empty sequences are returned as-is;
/// rejecting them is the caller's decision.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no records are found, or
/// `ParseError::TooManyRecords` if the limit is exceeded.
pub fn read_fasta_file(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    let file = std::fs::File::open(path)?;
    if is_gzipped(path) {
        read_fasta(BufReader::new(GzDecoder::new(file)))
    } else {
        read_fasta(BufReader::new(file))
    }
}

/// Read FASTA records from any buffered reader
///
/// # Errors
///
/// Same as [`read_fasta_file`], minus file opening.
pub fn read_fasta<R: BufRead>(reader: R) -> Result<Vec<SequenceRecord>, ParseError> {
    let mut fasta_reader = fasta::io::Reader::new(reader);
    let mut records = Vec::new();

    for result in fasta_reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        // Check record limit for DOS protection
        if check_record_limit(records.len()).is_some() {
            return Err(ParseError::TooManyRecords(records.len()));
        }

        let name = String::from_utf8_lossy(record.name()).to_string();
        records.push(SequenceRecord::new(name, record.sequence().as_ref()));
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA input".to_string(),
        ));
    }

    Ok(records)
}

/// Write records as FASTA, wrapping sequence lines
///
/// # Errors
///
/// Returns `ParseError::Io` if writing fails.
pub fn write_fasta<W: Write>(writer: &mut W, records: &[SequenceRecord]) -> Result<(), ParseError> {
    for record in records {
        writeln!(writer, ">{}", record.id)?;
        for line in record.sequence.chunks(LINE_WIDTH) {
            writer.write_all(line)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// List record identifiers without keeping sequences
///
/// # Errors
///
/// Same as [`read_fasta_file`].
pub fn read_fasta_ids(path: &Path) -> Result<Vec<String>, ParseError> {
    Ok(read_fasta_file(path)?
        .into_iter()
        .map(|record| record.id)
        .collect())
}

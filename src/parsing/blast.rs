//! Parser for `blastn` tabular output (`-outfmt 6`).
//!
//! The column order is fixed by [`BLAST_OUTFMT`], which is also what the external
//! alignment strategy passes to `blastn`:
//!
//! ```text
//! Col  Field     Description
//! 1    qseqid    Query sequence id
//! 2    sseqid    Subject (reference) sequence id
//! 3    pident    Percent identity
//! 4    length    Alignment length (columns, including gaps)
//! 5    mismatch  Number of mismatches
//! 6    gapopen   Number of gap openings
//! 7-8  qstart/qend   Query coordinates (1-based, inclusive)
//! 9-10 sstart/send   Subject coordinates (1-based, inclusive)
//! 11   evalue    Expect value
//! 12   bitscore  Bit score
//! ```

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use crate::core::alignment::AlignmentHit;
use crate::parsing::ParseError;

/// Output format argument passed to `blastn -outfmt`
pub const BLAST_OUTFMT: &str =
    "6 qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore";

const COLUMN_COUNT: usize = 12;

/// Parse a tabular BLAST output file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::InvalidFormat` for malformed lines.
pub fn parse_blast_file(path: &Path) -> Result<Vec<AlignmentHit>, ParseError> {
    let file = std::fs::File::open(path)?;
    parse_blast_tabular(std::io::BufReader::new(file))
}

/// Parse tabular BLAST output from a reader.
///
/// Blank lines and `#` comment lines are skipped. Hits are returned in file order.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 12 columns or a
/// numeric column cannot be parsed.
pub fn parse_blast_tabular<R: BufRead>(reader: R) -> Result<Vec<AlignmentHit>, ParseError> {
    let mut hits = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        hits.push(parse_line(line, line_idx + 1)?);
    }

    Ok(hits)
}

fn parse_line(line: &str, line_number: usize) -> Result<AlignmentHit, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < COLUMN_COUNT {
        return Err(ParseError::InvalidFormat(format!(
            "line {line_number}: expected {COLUMN_COUNT} columns, found {}",
            fields.len()
        )));
    }

    Ok(AlignmentHit {
        query_id: fields[0].to_string(),
        subject_id: fields[1].to_string(),
        percent_identity: field(&fields, 2, "pident", line_number)?,
        alignment_length: field(&fields, 3, "length", line_number)?,
        mismatches: field(&fields, 4, "mismatch", line_number)?,
        gap_opens: field(&fields, 5, "gapopen", line_number)?,
        query_start: field(&fields, 6, "qstart", line_number)?,
        query_end: field(&fields, 7, "qend", line_number)?,
        subject_start: field(&fields, 8, "sstart", line_number)?,
        subject_end: field(&fields, 9, "send", line_number)?,
        evalue: field(&fields, 10, "evalue", line_number)?,
        bit_score: field(&fields, 11, "bitscore", line_number)?,
    })
}

fn field<T: FromStr>(
    fields: &[&str],
    index: usize,
    name: &str,
    line_number: usize,
) -> Result<T, ParseError> {
    fields[index].trim().parse().map_err(|_| {
        ParseError::InvalidFormat(format!(
            "line {line_number}: invalid {name} value '{}'",
            fields[index]
        ))
    })
}

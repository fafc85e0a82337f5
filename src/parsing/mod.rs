//! Readers and writers for sequence and alignment files.
//!
//! - **FASTA** ([`fasta`]): Query and reference sequences, plain or gzip/bgzip compressed
//! - **BLAST tabular** ([`blast`]): `blastn -outfmt 6` hit tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use amr_caller::parsing::fasta::read_fasta_file;
//! use std::path::Path;
//!
//! let records = read_fasta_file(Path::new("sample.fasta")).unwrap();
//! for record in &records {
//!     println!("{}: {} bp", record.id, record.len());
//! }
//! ```

use thiserror::Error;

pub mod blast;
pub mod fasta;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Too many sequences: {0} exceeds maximum allowed")]
    TooManyRecords(usize),
}

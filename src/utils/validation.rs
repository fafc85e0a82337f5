//! Centralized validation and limits.

use std::path::Path;

use crate::parsing::fasta::is_fasta_file;

/// Maximum number of sequences accepted from a single FASTA input (DOS protection)
pub const MAX_RECORDS: usize = 10_000;

/// Upper bound for the per-query hit limit
pub const MAX_HITS_LIMIT: usize = 500;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;
pub const MIN_FILE_CONTENT_SIZE: usize = 1;

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_record_limit(records.len()).is_some() {
///     return Err(...);
/// }
/// records.push(new_record); // Safe to add
/// ```
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many sequences: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
    #[error("File must be in FASTA format (.fasta, .fa, or .fna)")]
    UnsupportedExtension,
    #[error("File content appears malformed or invalid")]
    InvalidFileContent,
    #[error("File content is not FASTA")]
    FormatValidationFailed,
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Validates and sanitizes filenames by:
/// - Checking length limits
/// - Preventing directory traversal (../, ..\\)
/// - Removing potentially dangerous characters
/// - Ensuring filename is not empty after sanitization
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    // Prevent directory traversal attacks
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    // Check for null bytes and other dangerous characters
    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    // Sanitize filename by keeping only safe characters
    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_' || *c == ' ')
        .collect::<String>();

    if sanitized.trim().is_empty() {
        return Err(ValidationError::InvalidFilename);
    }

    // Hidden files are never sequence uploads
    if sanitized.starts_with('.') {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}

/// Validate that uploaded bytes look like FASTA text.
///
/// Checks minimum size, UTF-8, the proportion of non-printable bytes, and that the
/// first non-blank character opens a definition line.
///
/// # Errors
///
/// Returns `ValidationError::InvalidFileContent` for empty, binary or non-UTF-8
/// content and `ValidationError::FormatValidationFailed` when the text is not FASTA.
pub fn validate_fasta_content(content: &[u8]) -> Result<(), ValidationError> {
    if content.len() < MIN_FILE_CONTENT_SIZE {
        return Err(ValidationError::InvalidFileContent);
    }

    let non_printable_count = content
        .iter()
        .filter(|&&b| b < 9 || (b > 13 && b < 32) || b > 126)
        .count();

    // Allow up to 5% non-printable characters
    if content.len() > 100 && non_printable_count > content.len() / 20 {
        return Err(ValidationError::InvalidFileContent);
    }

    let text = std::str::from_utf8(content).map_err(|_| ValidationError::InvalidFileContent)?;

    if !text.trim_start().starts_with('>') {
        return Err(ValidationError::FormatValidationFailed);
    }

    Ok(())
}

/// Comprehensive upload validation combining filename and content checks
///
/// # Errors
///
/// Returns a `ValidationError` if the filename is unsafe, lacks a FASTA extension,
/// or the content is not FASTA text.
pub fn validate_upload(filename: &str, content: &[u8]) -> Result<String, ValidationError> {
    let sanitized = validate_filename(filename)?;

    // Compressed uploads are not accepted over HTTP
    if !is_fasta_file(Path::new(&sanitized))
        || Path::new(&sanitized)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
    {
        return Err(ValidationError::UnsupportedExtension);
    }

    validate_fasta_content(content)?;

    Ok(sanitized)
}

/// Validate the e-value threshold (finite and positive)
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` for non-positive or non-finite values.
pub fn validate_evalue(evalue: f64) -> Result<f64, ValidationError> {
    if evalue.is_finite() && evalue > 0.0 {
        Ok(evalue)
    } else {
        Err(ValidationError::InvalidParameter(format!(
            "evalue must be a positive number, got {evalue}"
        )))
    }
}

/// Validate the per-query hit limit
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` outside `1..=MAX_HITS_LIMIT`.
pub fn validate_max_hits(max_hits: usize) -> Result<usize, ValidationError> {
    if (1..=MAX_HITS_LIMIT).contains(&max_hits) {
        Ok(max_hits)
    } else {
        Err(ValidationError::InvalidParameter(format!(
            "max_hits must be between 1 and {MAX_HITS_LIMIT}, got {max_hits}"
        )))
    }
}

/// Validate the generic threshold.
///
/// Classification never reads it, so any finite value is accepted.
///
/// # Errors
///
/// Returns `ValidationError::InvalidParameter` for NaN or infinity.
pub fn validate_threshold(threshold: f64) -> Result<f64, ValidationError> {
    if threshold.is_finite() {
        Ok(threshold)
    } else {
        Err(ValidationError::InvalidParameter(format!(
            "threshold must be a finite number, got {threshold}"
        )))
    }
}

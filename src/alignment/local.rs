//! In-process local aligner used when the `blastn` index is unavailable.
//!
//! Smith-Waterman with affine gaps (Gotoh): match +2, mismatch -1, gap open -2,
//! gap extend -0.5, where a gap of length `k` costs `2 + 0.5 * (k - 1)`.
//! Scores are kept doubled so all arithmetic stays in integers.
//!
//! The query may be a whole genome, so the alignment is found in three passes:
//!
//! 1. A linear-memory forward pass finds the best score and where it ends.
//! 2. An anchored pass over the reversed prefixes finds where it starts. The query
//!    span is bounded by what the best score allows, so this pass is small.
//! 3. A global alignment with traceback over just that rectangle recovers the
//!    column statistics.
//!
//! E-values cannot be computed here; every hit carries [`PLACEHOLDER_EVALUE`].

use crate::core::alignment::{AlignmentHit, AlignmentResult, SequenceRecord};

// Doubled scores
const MATCH: i32 = 4;
const MISMATCH: i32 = -2;
const GAP_OPEN: i32 = -4;
const GAP_EXTEND: i32 = -1;
const SCORE_SCALE: f64 = 2.0;

const NEG_INF: i32 = i32::MIN / 4;

/// Hits below this percent identity are discarded
pub const MIN_PERCENT_IDENTITY: f64 = 70.0;

/// Reported for every local hit; not a statistical e-value
pub const PLACEHOLDER_EVALUE: f64 = 0.001;

// Traceback cell layout
const SRC_MASK: u8 = 0b11;
const SRC_SUB: u8 = 0;
const SRC_QUERY_GAP: u8 = 1; // consumes query, gap in subject
const SRC_SUBJECT_GAP: u8 = 2; // consumes subject, gap in query
const QUERY_GAP_EXTENDED: u8 = 0b100;
const SUBJECT_GAP_EXTENDED: u8 = 0b1000;

/// The best local alignment between two sequences.
///
/// Ranges are 0-based half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAlignment {
    /// Doubled raw score
    pub score: i32,
    pub query_range: std::ops::Range<usize>,
    pub subject_range: std::ops::Range<usize>,
    /// Alignment columns, gaps included
    pub columns: usize,
    pub identities: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
}

impl LocalAlignment {
    /// Columns pairing two residues; gap columns are excluded
    #[must_use]
    pub fn aligned_columns(&self) -> usize {
        self.identities + self.mismatches
    }

    /// Identities over aligned (gap-free) columns
    #[must_use]
    pub fn percent_identity(&self) -> f64 {
        let aligned = self.aligned_columns();
        if aligned == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.identities as f64 / aligned as f64 * 100.0
        }
    }

    /// Raw score on the +2/-1 scale
    #[must_use]
    pub fn raw_score(&self) -> f64 {
        f64::from(self.score) / SCORE_SCALE
    }

    #[must_use]
    pub fn to_hit(&self, query_id: &str, subject_id: &str) -> AlignmentHit {
        AlignmentHit {
            query_id: query_id.to_string(),
            subject_id: subject_id.to_string(),
            percent_identity: self.percent_identity(),
            alignment_length: self.aligned_columns() as u64,
            mismatches: self.mismatches as u64,
            gap_opens: self.gap_opens as u64,
            query_start: self.query_range.start as u64 + 1,
            query_end: self.query_range.end as u64,
            subject_start: self.subject_range.start as u64 + 1,
            subject_end: self.subject_range.end as u64,
            evalue: PLACEHOLDER_EVALUE,
            bit_score: self.raw_score(),
        }
    }
}

/// Pairwise local aligner over a reference list
#[derive(Debug, Clone)]
pub struct LocalAligner {
    min_percent_identity: f64,
}

impl Default for LocalAligner {
    fn default() -> Self {
        Self {
            min_percent_identity: MIN_PERCENT_IDENTITY,
        }
    }
}

impl LocalAligner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Align every query against every reference.
    ///
    /// Returns one result per query, in input order. Hits are sorted by percent
    /// identity (descending, reference order on ties) and truncated to `max_hits`.
    #[must_use]
    pub fn align(
        &self,
        queries: &[SequenceRecord],
        references: &[SequenceRecord],
        max_hits: usize,
    ) -> Vec<AlignmentResult> {
        queries
            .iter()
            .map(|query| {
                let hits = references
                    .iter()
                    .filter_map(|reference| {
                        let alignment = align_pair(&query.sequence, &reference.sequence)?;
                        (alignment.percent_identity() >= self.min_percent_identity)
                            .then(|| alignment.to_hit(&query.id, &reference.id))
                    })
                    .collect();

                let mut result = AlignmentResult::new(&query.id, query.len() as u64).with_hits(hits);
                result.retain_best(max_hits);
                result
            })
            .collect()
    }
}

fn substitution(a: u8, b: u8) -> i32 {
    if a == b {
        MATCH
    } else {
        MISMATCH
    }
}

/// Cost of a gap of `len` columns
fn gap_cost(len: usize) -> i32 {
    match len {
        0 => 0,
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        _ => GAP_OPEN + GAP_EXTEND * (len as i32 - 1),
    }
}

/// Highest-scoring local alignment, or `None` if nothing scores above zero
#[must_use]
pub fn align_pair(query: &[u8], subject: &[u8]) -> Option<LocalAlignment> {
    if query.is_empty() || subject.is_empty() {
        return None;
    }

    let (score, query_end, subject_end) = best_local_end(query, subject)?;

    // Every query column not paired with a subject residue costs at least one
    // extension, and at most `subject.len()` columns can match
    let max_query_span = subject.len() * (1 + (MATCH / -GAP_EXTEND) as usize);
    let query_window_start = query_end.saturating_sub(max_query_span);

    let (query_offset, subject_start) = anchored_start(
        &query[query_window_start..query_end],
        &subject[..subject_end],
        score,
    )?;
    let query_start = query_window_start + query_offset;

    let mut alignment = global_traceback(
        &query[query_start..query_end],
        &subject[subject_start..subject_end],
    );
    alignment.score = score;
    alignment.query_range = query_start..query_end;
    alignment.subject_range = subject_start..subject_end;
    Some(alignment)
}

/// Forward pass: best local score and its (exclusive) end coordinates
fn best_local_end(query: &[u8], subject: &[u8]) -> Option<(i32, usize, usize)> {
    let n = subject.len();
    let mut h = vec![0i32; n + 1];
    let mut e = vec![NEG_INF; n + 1];
    let mut best = (0, 0, 0);

    for (i, &q) in query.iter().enumerate() {
        let mut diag = 0;
        let mut left = 0;
        let mut f = NEG_INF;

        for j in 1..=n {
            let up = h[j];
            e[j] = (up + GAP_OPEN).max(e[j] + GAP_EXTEND);
            f = (left + GAP_OPEN).max(f + GAP_EXTEND);
            let cell = (diag + substitution(q, subject[j - 1]))
                .max(e[j])
                .max(f)
                .max(0);

            diag = up;
            h[j] = cell;
            left = cell;

            if cell > best.0 {
                best = (cell, i + 1, j);
            }
        }
    }

    (best.0 > 0).then_some(best)
}

/// Reverse pass anchored at the alignment end: walks the reversed prefixes until
/// a cell reaches `target`, which marks the alignment start.
///
/// Returns 0-based start offsets into `query` and `subject`.
fn anchored_start(query: &[u8], subject: &[u8], target: i32) -> Option<(usize, usize)> {
    let m = query.len();
    let n = subject.len();
    let mut h: Vec<i32> = (0..=n).map(gap_cost).collect();
    let mut e = vec![NEG_INF; n + 1];

    for i in 1..=m {
        let q = query[m - i];
        let mut diag = h[0];
        h[0] = gap_cost(i);
        let mut left = h[0];
        let mut f = NEG_INF;

        for j in 1..=n {
            let up = h[j];
            e[j] = (up + GAP_OPEN).max(e[j] + GAP_EXTEND);
            f = (left + GAP_OPEN).max(f + GAP_EXTEND);
            let cell = (diag + substitution(q, subject[n - j])).max(e[j]).max(f);

            diag = up;
            h[j] = cell;
            left = cell;

            if cell == target {
                return Some((m - i, n - j));
            }
        }
    }

    None
}

/// Global affine alignment of two short slices with full traceback
fn global_traceback(query: &[u8], subject: &[u8]) -> LocalAlignment {
    let p = query.len();
    let q = subject.len();
    let width = q + 1;
    let mut trace = vec![0u8; (p + 1) * width];

    let mut h_prev: Vec<i32> = (0..=q).map(gap_cost).collect();
    let mut x_prev = vec![NEG_INF; width];
    for (j, cell) in trace.iter_mut().enumerate().take(width).skip(1) {
        *cell = SRC_SUBJECT_GAP | if j > 1 { SUBJECT_GAP_EXTENDED } else { 0 };
    }

    let mut h_cur = vec![NEG_INF; width];
    let mut x_cur = vec![NEG_INF; width];

    for i in 1..=p {
        h_cur[0] = gap_cost(i);
        x_cur[0] = h_cur[0];
        trace[i * width] = SRC_QUERY_GAP | if i > 1 { QUERY_GAP_EXTENDED } else { 0 };
        let mut y = NEG_INF;

        for j in 1..=q {
            let mut bits = 0u8;

            let x_open = h_prev[j] + GAP_OPEN;
            let x_ext = x_prev[j] + GAP_EXTEND;
            let x = if x_ext > x_open {
                bits |= QUERY_GAP_EXTENDED;
                x_ext
            } else {
                x_open
            };

            let y_open = h_cur[j - 1] + GAP_OPEN;
            let y_ext = y + GAP_EXTEND;
            y = if y_ext > y_open {
                bits |= SUBJECT_GAP_EXTENDED;
                y_ext
            } else {
                y_open
            };

            let m = h_prev[j - 1] + substitution(query[i - 1], subject[j - 1]);
            let (h, src) = if m >= x && m >= y {
                (m, SRC_SUB)
            } else if x >= y {
                (x, SRC_QUERY_GAP)
            } else {
                (y, SRC_SUBJECT_GAP)
            };

            h_cur[j] = h;
            x_cur[j] = x;
            trace[i * width + j] = bits | src;
        }

        std::mem::swap(&mut h_prev, &mut h_cur);
        std::mem::swap(&mut x_prev, &mut x_cur);
    }

    let mut alignment = LocalAlignment {
        score: 0,
        query_range: 0..p,
        subject_range: 0..q,
        columns: 0,
        identities: 0,
        mismatches: 0,
        gap_opens: 0,
    };

    let (mut i, mut j) = (p, q);
    // Matrix the walk is currently in; `None` means the best-of-three
    let mut state: Option<u8> = None;
    let mut previous_gap: Option<u8> = None;

    while i > 0 || j > 0 {
        let cell = trace[i * width + j];
        let current = state.unwrap_or(cell & SRC_MASK);
        alignment.columns += 1;

        match current {
            SRC_SUB => {
                if query[i - 1] == subject[j - 1] {
                    alignment.identities += 1;
                } else {
                    alignment.mismatches += 1;
                }
                i -= 1;
                j -= 1;
                state = None;
                previous_gap = None;
            }
            SRC_QUERY_GAP => {
                if previous_gap != Some(SRC_QUERY_GAP) {
                    alignment.gap_opens += 1;
                }
                previous_gap = Some(SRC_QUERY_GAP);
                state = (cell & QUERY_GAP_EXTENDED != 0).then_some(SRC_QUERY_GAP);
                i -= 1;
            }
            _ => {
                if previous_gap != Some(SRC_SUBJECT_GAP) {
                    alignment.gap_opens += 1;
                }
                previous_gap = Some(SRC_SUBJECT_GAP);
                state = (cell & SUBJECT_GAP_EXTENDED != 0).then_some(SRC_SUBJECT_GAP);
                j -= 1;
            }
        }
    }

    alignment
}
